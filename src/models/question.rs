use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// 问题记录
///
/// 一个问题由作者创建后内容不再变化，回答列表只追加不删除、不重排。
/// 回答不携带任何作者信息（结构层面保证匿名）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 问题唯一标识（创建时生成，之后不变）
    pub id: String,
    /// 问题内容
    pub content: String,
    /// 回答列表（插入顺序 = 提交顺序，只追加）
    #[serde(default)]
    pub answers: Vec<String>,
    /// 创建时间（RFC 3339 字符串）
    pub created_at: String,
    /// 记录版本号，每次成功更新加一（用于乐观并发控制）
    #[serde(default = "default_version")]
    pub version: u64,
}

fn default_version() -> u64 {
    1
}

impl Question {
    /// 创建新的问题记录（回答列表为空）
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            answers: Vec::new(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: 1,
        }
    }

    /// 当前回答数量
    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }
}

/// 分析报告缓存记录
///
/// 报告只对生成时刻的回答数量有效：之后每追加一条回答，
/// 都会使该报告在新数量下查询缓存时未命中，从而触发重新生成。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// 所属问题标识
    pub question_id: String,
    /// 生成报告时的回答数量
    pub answer_count: usize,
    /// 报告正文
    pub summary: String,
    /// 生成时间（RFC 3339 字符串）
    pub generated_at: String,
}

impl SummaryRecord {
    /// 创建新的报告记录
    pub fn new(question_id: impl Into<String>, answer_count: usize, summary: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer_count,
            summary: summary.into(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_question_starts_empty() {
        let question = Question::new("abc123", "今天的会议有什么可以改进的地方？");
        assert_eq!(question.answer_count(), 0);
        assert_eq!(question.version, 1);
        assert!(!question.created_at.is_empty());
    }

    #[test]
    fn test_legacy_record_without_version_loads() {
        // 早期格式的记录没有 version 字段，加载时应回落到 1
        let json = r#"{
            "id": "V1StGXR8_Z",
            "content": "What should we improve?",
            "answers": ["first answer text"],
            "created_at": "2025-01-15T08:30:00.000Z"
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.version, 1);
        assert_eq!(question.answer_count(), 1);
    }
}
