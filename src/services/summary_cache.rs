//! 分析报告缓存 - 业务能力层
//!
//! 只负责"读写报告缓存"能力，不关心流程
//!
//! ## 失效规则
//!
//! 缓存按 (问题 id, 回答数量) 匹配，回答数量必须严格相等才算命中。
//! 为 4 条回答生成的报告，在出现第 5 条回答后即视为未命中，
//! 保证报告永远不会悄悄落后于可见数据。

use crate::error::{AppError, AppResult};
use crate::models::SummaryRecord;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 分析报告缓存
///
/// 职责：
/// - 每个问题一个缓存文件：`{data_dir}/{id}.summary.json`
/// - 命中要求缓存中的回答数量与查询数量严格相等
/// - 写入时整体覆盖旧条目（先写临时文件再原子改名）
/// - 不调用 LLM，不读取问题记录
#[derive(Clone)]
pub struct SummaryCache {
    data_dir: PathBuf,
}

impl SummaryCache {
    /// 创建新的报告缓存
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// 查询缓存
    ///
    /// # 参数
    /// - `id`: 问题标识
    /// - `answer_count`: 当前回答数量
    ///
    /// # 返回
    /// 回答数量严格相等时返回缓存的报告，否则返回 None
    pub async fn get_cached(&self, id: &str, answer_count: usize) -> AppResult<Option<SummaryRecord>> {
        let path = self.summary_path(id);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("报告缓存不存在 (问题: {})", id);
                return Ok(None);
            }
            Err(e) => return Err(AppError::read_failed(path.display().to_string(), e)),
        };

        let record: SummaryRecord = serde_json::from_str(&content)
            .map_err(|e| AppError::json_parse_failed(path.display().to_string(), e))?;

        if record.answer_count == answer_count {
            debug!("报告缓存命中 (问题: {}, 回答数: {})", id, answer_count);
            Ok(Some(record))
        } else {
            debug!(
                "报告缓存已过期 (问题: {}, 缓存回答数: {}, 当前回答数: {})",
                id, record.answer_count, answer_count
            );
            Ok(None)
        }
    }

    /// 写入缓存，覆盖该问题的旧条目
    pub async fn store(&self, id: &str, answer_count: usize, summary: &str) -> AppResult<SummaryRecord> {
        let record = SummaryRecord::new(id, answer_count, summary);
        let path = self.summary_path(id);

        let json = serde_json::to_string_pretty(&record)?;
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, json)
            .await
            .map_err(|e| AppError::write_failed(tmp_path.display().to_string(), e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| AppError::write_failed(path.display().to_string(), e))?;

        debug!("报告缓存已写入 (问题: {}, 回答数: {})", id, answer_count);
        Ok(record)
    }

    /// 报告缓存文件路径
    fn summary_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.summary.json", id))
    }
}
