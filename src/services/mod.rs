pub mod llm_service;
pub mod question_service;
pub mod summary_cache;

pub use llm_service::{LlmService, Summarizer};
pub use question_service::QuestionService;
pub use summary_cache::SummaryCache;
