//! 文件存储 - 基础设施层
//!
//! 持有唯一的数据目录资源，只暴露"原子读写问题记录"的能力
//!
//! ## 存储布局
//!
//! 每个问题一个 JSON 文件：`{data_dir}/{id}.json`。
//! 分析报告缓存由 `SummaryCache` 管理，存放在同目录的
//! `{id}.summary.json`，本模块枚举时会跳过它们。
//!
//! ## 并发模型
//!
//! - 每个问题 id 对应一把异步锁，写操作串行化（单写者）
//! - 记录携带版本号，写入前在锁内复查磁盘版本，不一致则重试
//! - 所有写入先写临时文件再原子改名，避免读到半成品

use crate::error::{AppError, AppResult};
use crate::models::Question;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tracing::{debug, warn};

/// 单个问题更新的最大重试次数
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// 分析报告缓存文件的后缀（枚举问题时需要跳过）
const SUMMARY_SUFFIX: &str = ".summary.json";

/// 文件存储
///
/// 职责：
/// - 持有唯一的数据目录资源
/// - 暴露 get / create / update / list_ids 能力
/// - 不认识回答校验规则，不处理业务流程
pub struct FileStore {
    data_dir: PathBuf,
    /// 每个问题 id 一把写锁
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl FileStore {
    /// 创建文件存储，数据目录不存在时自动创建
    pub async fn new(data_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let data_dir = data_dir.into();

        fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| AppError::write_failed(data_dir.display().to_string(), e))?;

        Ok(Self {
            data_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// 数据目录路径
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 读取问题记录
    pub async fn get(&self, id: &str) -> AppResult<Question> {
        let path = self.question_path(id);
        read_question(&path, id).await
    }

    /// 创建问题记录，id 已存在时返回 AlreadyExists
    pub async fn create(&self, question: &Question) -> AppResult<()> {
        let lock = self.lock_for(&question.id);
        let _guard = lock.lock().await;

        let path = self.question_path(&question.id);
        if fs::try_exists(&path)
            .await
            .map_err(|e| AppError::read_failed(path.display().to_string(), e))?
        {
            return Err(AppError::already_exists(&question.id));
        }

        write_question_atomic(&path, question).await?;
        debug!("问题记录已创建: {}", question.id);
        Ok(())
    }

    /// 原子更新问题记录
    ///
    /// 在问题级写锁内执行"读取 → 应用变更 → 复查版本 → 写回"，
    /// 两个并发更新的效果都会被保留（后写者先看到前写者的结果）。
    /// 版本复查失败时重试，超过次数返回 Conflict。
    pub async fn update<F>(&self, id: &str, mut apply: F) -> AppResult<Question>
    where
        F: FnMut(&mut Question),
    {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let path = self.question_path(id);

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut question = read_question(&path, id).await?;
            let base_version = question.version;

            apply(&mut question);
            question.version = base_version + 1;

            // 锁内复查磁盘版本：进程内写者已被锁串行化，
            // 这里防住的是锁外的其他写入来源
            let on_disk = read_question(&path, id).await?;
            if on_disk.version != base_version {
                warn!(
                    "检测到版本冲突 (问题: {}, 第 {}/{} 次尝试)",
                    id, attempt, MAX_UPDATE_ATTEMPTS
                );
                continue;
            }

            write_question_atomic(&path, &question).await?;
            debug!("问题记录已更新: {} (版本 {})", id, question.version);
            return Ok(question);
        }

        Err(AppError::conflict(id, MAX_UPDATE_ATTEMPTS))
    }

    /// 枚举已存储的全部问题 id
    pub async fn list_ids(&self) -> AppResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir)
            .await
            .map_err(|e| AppError::read_failed(self.data_dir.display().to_string(), e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::read_failed(self.data_dir.display().to_string(), e))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(SUMMARY_SUFFIX) {
                continue;
            }
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// 问题记录文件路径
    fn question_path(&self, id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", id))
    }

    /// 获取问题级写锁
    fn lock_for(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("锁表不应中毒");
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// 读取并解析问题记录文件
async fn read_question(path: &Path, id: &str) -> AppResult<Question> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found(id));
        }
        Err(e) => return Err(AppError::read_failed(path.display().to_string(), e)),
    };

    serde_json::from_str(&content)
        .map_err(|e| AppError::json_parse_failed(path.display().to_string(), e))
}

/// 先写临时文件再原子改名
async fn write_question_atomic(path: &Path, question: &Question) -> AppResult<()> {
    let json = serde_json::to_string_pretty(question)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, json)
        .await
        .map_err(|e| AppError::write_failed(tmp_path.display().to_string(), e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::write_failed(path.display().to_string(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;

    async fn create_test_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, store) = create_test_store().await;
        let question = Question::new("q_test_01", "团队协作中最大的障碍是什么？");

        store.create(&question).await.unwrap();
        let loaded = store.get("q_test_01").await.unwrap();

        assert_eq!(loaded.id, "q_test_01");
        assert_eq!(loaded.content, "团队协作中最大的障碍是什么？");
        assert!(loaded.answers.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_returns_not_found() {
        let (_dir, store) = create_test_store().await;

        let err = store.get("no_such_id").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let (_dir, store) = create_test_store().await;
        let question = Question::new("q_dup", "重复创建测试");

        store.create(&question).await.unwrap();
        let err = store.create(&question).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Store(crate::error::StoreError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_appends_and_bumps_version() {
        let (_dir, store) = create_test_store().await;
        let question = Question::new("q_upd", "更新测试问题");
        store.create(&question).await.unwrap();

        let updated = store
            .update("q_upd", |q| q.answers.push("第一条回答".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.answer_count(), 1);
        assert_eq!(updated.version, 2);

        // 磁盘上的记录与返回值一致
        let loaded = store.get("q_upd").await.unwrap();
        assert_eq!(loaded.answer_count(), 1);
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn test_update_missing_returns_not_found() {
        let (_dir, store) = create_test_store().await;

        let err = store
            .update("no_such_id", |q| q.answers.push("x".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    /// 并发追加：N 个并发更新全部落盘，无丢失更新
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_updates_no_lost_writes() {
        let (_dir, store) = create_test_store().await;
        let store = Arc::new(store);
        let question = Question::new("q_race", "并发测试问题");
        store.create(&question).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update("q_race", |q| q.answers.push(format!("并发回答 {}", i)))
                    .await
            }));
        }

        for result in join_all(handles).await {
            result.unwrap().unwrap();
        }

        let final_state = store.get("q_race").await.unwrap();
        assert_eq!(final_state.answer_count(), 20);

        // 顺序可以任意交织，但每条回答都必须在
        for i in 0..20 {
            let expected = format!("并发回答 {}", i);
            assert!(
                final_state.answers.contains(&expected),
                "缺少回答: {}",
                expected
            );
        }
    }
}
