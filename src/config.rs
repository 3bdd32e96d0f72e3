use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 问题记录存放目录
    pub data_dir: String,
    /// 批量刷新时的最大并发数
    pub max_concurrent_refresh: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 生成分析报告所需的最少回答数量
    pub min_answers_for_summary: usize,
    /// 单条回答的最少词数
    pub min_answer_words: usize,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// LLM 调用超时（秒）
    pub llm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "data/questions".to_string(),
            max_concurrent_refresh: 4,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            min_answers_for_summary: 2,
            min_answer_words: 10,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4".to_string(),
            llm_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_dir: std::env::var("DATA_DIR").unwrap_or(default.data_dir),
            max_concurrent_refresh: std::env::var("MAX_CONCURRENT_REFRESH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_refresh),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            min_answers_for_summary: std::env::var("MIN_ANSWERS_FOR_SUMMARY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_answers_for_summary),
            min_answer_words: std::env::var("MIN_ANSWER_WORDS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.min_answer_words),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_timeout_secs),
        }
    }

    /// 从 TOML 文件加载配置
    ///
    /// 未出现在文件中的字段使用默认值
    pub async fn from_toml_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;

        Ok(config)
    }
}
