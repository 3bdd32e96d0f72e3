//! 问题服务 - 业务能力层
//!
//! 只负责"创建问题 / 追加回答"能力，不关心流程
//!
//! ## 校验规则
//! - 问题内容去除首尾空白后不能为空
//! - 单条回答至少需要 10 个以空白分隔的词（可配置）
//!
//! ## 匿名性
//! 回答是纯文本，不携带任何提交者信息；日志中只出现问题 id
//! 和回答的词数，绝不出现回答内容本身。

use crate::config::Config;
use crate::error::{AppError, AppResult, ValidationError};
use crate::infrastructure::FileStore;
use crate::models::Question;
use crate::utils::logging::truncate_text;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// 问题 id 的字符表（nanoid 风格，64 个符号）
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// 问题 id 长度：12 个符号 × 6 bit = 72 bit 熵
const ID_LENGTH: usize = 12;

/// id 碰撞时的最大重新生成次数
const MAX_ID_ATTEMPTS: usize = 3;

/// 问题服务
///
/// 职责：
/// - 创建问题（生成唯一 id）
/// - 校验并追加回答（通过 FileStore 的原子更新）
/// - 只处理单个 Question
/// - 不关心分析报告的生成与缓存
pub struct QuestionService {
    store: Arc<FileStore>,
    min_answer_words: usize,
}

impl QuestionService {
    /// 创建新的问题服务
    pub fn new(store: Arc<FileStore>, config: &Config) -> Self {
        Self {
            store,
            min_answer_words: config.min_answer_words,
        }
    }

    /// 创建问题
    ///
    /// # 参数
    /// - `content`: 问题内容（去除首尾空白后不能为空）
    ///
    /// # 返回
    /// 返回持久化后的问题记录（回答列表为空）
    pub async fn create_question(&self, content: &str) -> AppResult<Question> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(ValidationError::EmptyQuestionContent));
        }

        // id 碰撞概率可以忽略，但存储层会如实报告 AlreadyExists，
        // 此时换一个 id 重试
        let mut last_err = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let question = Question::new(generate_id(), content);
            match self.store.create(&question).await {
                Ok(()) => {
                    // 问题内容可以进日志（回答内容不行）
                    info!(
                        "✓ 问题已创建: {} (内容: {})",
                        question.id,
                        truncate_text(&question.content, 80)
                    );
                    return Ok(question);
                }
                Err(e) if matches!(&e, AppError::Store(crate::error::StoreError::AlreadyExists { .. })) => {
                    debug!("问题 id 碰撞，重新生成");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::Other("问题 id 生成失败".to_string())))
    }

    /// 查询问题
    pub async fn get_question(&self, id: &str) -> AppResult<Question> {
        self.store.get(id).await
    }

    /// 追加回答
    ///
    /// # 参数
    /// - `id`: 问题标识
    /// - `text`: 回答内容（至少 min_answer_words 个词）
    ///
    /// # 返回
    /// 返回追加后的完整问题记录（包含最新的回答数量）
    pub async fn submit_answer(&self, id: &str, text: &str) -> AppResult<Question> {
        let words = word_count(text);
        if words < self.min_answer_words {
            debug!(
                "回答被拒绝 (问题: {}, 词数: {}/{})",
                id, words, self.min_answer_words
            );
            return Err(AppError::answer_too_short(words, self.min_answer_words));
        }

        let text = text.to_string();
        let updated = self
            .store
            .update(id, |q| q.answers.push(text.clone()))
            .await?;

        info!(
            "✓ 回答已追加 (问题: {}, 词数: {}, 当前回答数: {})",
            id,
            words,
            updated.answer_count()
        );

        Ok(updated)
    }
}

/// 统计以空白分隔的词数
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 生成 nanoid 风格的问题 id
fn generate_id() -> String {
    let mut rng = rand::rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
