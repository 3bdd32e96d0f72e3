//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数
//!
//! ## 匿名性约定
//!
//! 日志中只出现问题 id、操作名和数量类信息；
//! 回答内容绝不写入日志。

use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// 日志级别通过 RUST_LOG 环境变量控制，默认 info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_text("短文本", 80), "短文本");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "a".repeat(100);
        let truncated = truncate_text(&long, 80);
        assert_eq!(truncated.chars().count(), 83);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // 多字节字符按字符数截断，不会切在字节中间
        let text = "问".repeat(10);
        let truncated = truncate_text(&text, 5);
        assert_eq!(truncated, format!("{}...", "问".repeat(5)));
    }
}
