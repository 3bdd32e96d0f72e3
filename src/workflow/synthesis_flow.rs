//! 分析报告流程 - 流程层
//!
//! 核心职责：定义"一个问题"的完整分析流程
//!
//! 流程顺序：
//! 1. 读取问题 → 阈值检查（不足 2 条回答不生成）
//! 2. 按当前回答数量查缓存 → 命中直接返回
//! 3. 未命中 → 后台任务调用 LLM → 写缓存 → 返回
//!
//! ## 生命周期
//!
//! 一个问题的报告状态机：`无报告 → 生成中 → 已缓存(n)`，
//! 其中 n 是生成时的回答数量；回答数涨到 m > n 后，按 m 查缓存
//! 必然未命中，下次请求重新进入"生成中"。
//!
//! ## 取消语义
//!
//! LLM 调用和缓存写入放在 `tokio::spawn` 的独立任务里：
//! 调用方中途断开不会中止生成，结果照常写入缓存，
//! 之后的轮询可以直接命中。整个流程不在 LLM 调用期间持有任何锁。

use crate::error::{AppError, AppResult};
use crate::infrastructure::FileStore;
use crate::models::SummaryRecord;
use crate::services::{Summarizer, SummaryCache};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 分析报告流程
///
/// - 编排完整的报告生成流程
/// - 决定何时查缓存、何时调 LLM、何时写缓存
/// - 不持有任何锁跨越 LLM 调用
/// - 只依赖业务能力（services）和存储读接口
#[derive(Clone)]
pub struct SynthesisFlow {
    store: Arc<FileStore>,
    cache: SummaryCache,
    summarizer: Arc<dyn Summarizer>,
    min_answers: usize,
}

impl SynthesisFlow {
    /// 创建新的分析报告流程
    pub fn new(
        store: Arc<FileStore>,
        cache: SummaryCache,
        summarizer: Arc<dyn Summarizer>,
        min_answers: usize,
    ) -> Self {
        Self {
            store,
            cache,
            summarizer,
            min_answers,
        }
    }

    /// 获取或生成分析报告
    ///
    /// # 参数
    /// - `id`: 问题标识
    ///
    /// # 返回
    /// - `Ok(None)`: 回答数量不足阈值，不生成报告
    /// - `Ok(Some(record))`: 缓存命中或生成成功
    /// - `Err(_)`: 问题不存在，或 LLM 调用失败/超时（失败不写缓存，
    ///   下次请求会重新触发生成）
    pub async fn get_or_generate(&self, id: &str) -> AppResult<Option<SummaryRecord>> {
        // 读取问题（不存在则如实报告）
        let question = self.store.get(id).await?;
        let answer_count = question.answer_count();

        // 阈值检查：少于 2 条回答谈不上"模式"，不做任何生成尝试
        if answer_count < self.min_answers {
            debug!(
                "回答数量不足 (问题: {}, 当前: {}, 阈值: {})",
                id, answer_count, self.min_answers
            );
            return Ok(None);
        }

        // 按当前回答数量查缓存，命中则避免一次外部调用
        if let Some(record) = self.cache.get_cached(id, answer_count).await? {
            return Ok(Some(record));
        }

        info!(
            "🔄 开始生成分析报告 (问题: {}, 回答数: {})",
            id, answer_count
        );

        // LLM 调用 + 缓存写入放在独立任务里：调用方断开不会中止生成，
        // 结果照常落缓存，之后的轮询直接命中
        let summarizer = self.summarizer.clone();
        let cache = self.cache.clone();
        let question_id = id.to_string();
        let content = question.content.clone();
        let answers = question.answers.clone();

        let handle = tokio::spawn(async move {
            let summary = summarizer.summarize(&content, &answers).await?;
            let record = cache.store(&question_id, answer_count, &summary).await?;
            Ok::<SummaryRecord, AppError>(record)
        });

        match handle.await {
            Ok(Ok(record)) => {
                info!(
                    "✓ 分析报告已生成并缓存 (问题: {}, 回答数: {})",
                    id, answer_count
                );
                Ok(Some(record))
            }
            Ok(Err(e)) => {
                // 失败不写缓存：单次请求内不重试，客户端重新轮询时再生成
                warn!("⚠️ 分析报告生成失败 (问题: {}): {}", id, e);
                Err(e)
            }
            Err(e) => Err(AppError::Other(format!("报告生成任务异常退出: {}", e))),
        }
    }
}
