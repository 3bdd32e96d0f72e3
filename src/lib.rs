//! # Anonymous Answers
//!
//! 一个用于收集匿名回答并生成 AI 综合分析报告的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（数据目录），只暴露能力
//! - `FileStore` - 唯一的问题记录 owner，提供原子读写能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 Question
//! - `QuestionService` - 创建问题 / 追加回答能力
//! - `SummaryCache` - 分析报告缓存能力（按回答数量严格匹配）
//! - `LlmService` - LLM 综合分析能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个问题"的完整分析流程
//! - `SynthesisFlow` - 流程编排（阈值检查 → 缓存查询 → LLM 生成 → 写缓存）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 对外边界操作（创建问题 / 提交回答 / 查询 / 获取报告），
//!   以及批量刷新模式（扫描全部问题并预热缓存）
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::FileStore;
pub use models::{Question, SummaryRecord};
pub use orchestrator::App;
pub use services::{LlmService, QuestionService, Summarizer, SummaryCache};
pub use workflow::SynthesisFlow;
