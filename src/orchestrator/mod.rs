//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层对外暴露系统的四个边界操作（创建问题 / 提交回答 / 查询问题 /
//! 获取分析报告），并提供批量刷新模式作为二进制入口。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (边界操作 + 批量刷新)
//!     ↓
//! workflow::SynthesisFlow (处理单个问题的报告流程)
//!     ↓
//! services (能力层：question / cache / llm)
//!     ↓
//! infrastructure (基础设施：FileStore)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：边界操作只做委托，批量刷新只做调度和统计
//! 2. **资源隔离**：只有编排层负责装配存储与各服务
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：校验规则、缓存规则都在下层

pub mod app;

// 重新导出主要类型
pub use app::App;
