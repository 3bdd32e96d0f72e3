//! LLM 服务 - 业务能力层
//!
//! 只负责"LLM 综合分析"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};

/// 综合分析能力
///
/// 对一个问题的全部回答生成结构化分析报告。
/// 流程层只依赖这个 trait，测试时可以替换为计数/脚本化的实现。
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// 对回答列表生成分析报告
    ///
    /// # 参数
    /// - `question_content`: 原始问题内容
    /// - `answers`: 完整的回答列表（等权、匿名）
    async fn summarize(&self, question_content: &str, answers: &[String]) -> AppResult<String>;
}

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成回答的综合分析报告
/// - 提供通用的 LLM 调用接口
/// - 只处理单个问题的回答列表
/// - 不读写存储，不关心缓存与阈值
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout_secs: u64,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            timeout_secs: config.llm_timeout_secs,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// 这是最基础的 LLM 调用接口，其他所有 LLM 相关功能都应该基于此函数。
    /// 整个调用包在一层超时里；超时或 API 失败都如实返回错误，
    /// 由上层决定是否重试（单次请求内不重试）。
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        // 构建消息列表
        let mut messages = Vec::new();

        // 添加系统消息（如果提供）
        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        // 添加用户消息
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        // 构建请求
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .build()
            .map_err(|e| AppError::llm_api_failed(&self.model_name, e))?;

        // 调用 API（带超时）
        let chat = self.client.chat();
        let call = chat.create(request);
        let response = match tokio::time::timeout(Duration::from_secs(self.timeout_secs), call).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("LLM API 调用失败: {}", e);
                return Err(AppError::llm_api_failed(&self.model_name, e));
            }
            Err(_) => {
                warn!(
                    "LLM API 调用超时 (模型: {}, 超时: {}秒)",
                    self.model_name, self.timeout_secs
                );
                return Err(AppError::llm_timeout(&self.model_name, self.timeout_secs));
            }
        };

        debug!("LLM API 调用成功");

        // 提取响应内容
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AppError::Llm(LlmError::EmptyContent {
                    model: self.model_name.clone(),
                })
            })?;

        Ok(content.trim().to_string())
    }

    /// 构建用于综合分析的消息
    ///
    /// 返回 (user_message, system_message)
    fn build_summary_messages(question_content: &str, answers: &[String]) -> (String, String) {
        // 构建系统消息
        let system_message = "You are an expert analyst skilled at synthesizing qualitative data \
                              and providing structured insights while maintaining anonymity."
            .to_string();

        // 所有回答等权列出，不携带任何提交者信息
        let answer_list = answers
            .iter()
            .map(|a| format!("- {}", a))
            .collect::<Vec<_>>()
            .join("\n");

        // 构建用户消息
        let user_message = format!(
            r#"You are analyzing a collection of anonymous responses to the question: "{}"

Analyze these responses and provide a comprehensive yet concise report structured as follows:

1. CORE SYNTHESIS (2-3 paragraphs)
- Distill the essential message emerging from all responses
- Highlight the primary consensus (if any)
- Note significant divergent viewpoints
- Capture the overall emotional tone

2. PATTERN RECOGNITION
- List the main themes (ordered by frequency)
- Identify recurring keywords or phrases
- Note any surprising or unique perspectives
- Point out any notable gaps in the feedback

3. SENTIMENT BREAKDOWN
- Provide an approximate distribution of sentiments (positive/neutral/negative)
- Include representative quotes (while maintaining anonymity)
- Highlight emotional undertones and intensity levels

4. ACTIONABLE INSIGHTS
- Extract key takeaways
- Identify potential areas for improvement or action
- List specific recommendations based on the feedback

5. META ANALYSIS
- Comment on the quality and depth of the responses
- Note any potential biases or limitations in the feedback
- Suggest follow-up questions if needed

FORMAT GUIDELINES:
- Keep sections clearly labeled
- Use bullet points for clarity
- Include specific examples while maintaining anonymity
- Quantify findings where possible (e.g., "approximately 70% mentioned...")
- Bold key findings and important conclusions

Important notes for analysis:
- Maintain complete anonymity - never include identifying details
- Weight all responses equally unless explicitly noted otherwise
- Acknowledge uncertainty where appropriate
- Focus on patterns rather than individual responses
- Consider both what is said and what is notably absent

The collected responses are:
{}

End your analysis with a single sentence that captures the most important insight or takeaway from all the responses."#,
            question_content, answer_list
        );

        (user_message, system_message)
    }
}

#[async_trait]
impl Summarizer for LlmService {
    async fn summarize(&self, question_content: &str, answers: &[String]) -> AppResult<String> {
        debug!(
            "开始生成分析报告，回答数量: {}, 模型: {}",
            answers.len(),
            self.model_name
        );

        let (user_message, system_message) =
            Self::build_summary_messages(question_content, answers);

        self.send_to_llm(&user_message, Some(&system_message)).await
    }
}
