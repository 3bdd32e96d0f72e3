//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：装配存储、问题服务、报告流程
//! 2. **边界操作**：创建问题 / 提交回答 / 查询问题 / 获取分析报告
//! 3. **批量刷新**：扫描全部问题，按并发上限预热报告缓存
//! 4. **全局统计**：汇总批量刷新的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个问题的细节，向下委托 SynthesisFlow
//! - **并发安全**：通过 Semaphore 和 tokio::spawn 实现并发
//! - **可注入能力**：综合分析能力以 `Arc<dyn Summarizer>` 注入，
//!   测试时可替换为脚本化实现

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::FileStore;
use crate::models::Question;
use crate::services::{LlmService, QuestionService, Summarizer, SummaryCache};
use crate::workflow::SynthesisFlow;
use anyhow::Result;
use futures::future::join_all;
use std::fs;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<FileStore>,
    questions: QuestionService,
    synthesis: SynthesisFlow,
}

impl App {
    /// 初始化应用（使用真实的 LLM 服务）
    pub async fn initialize(config: Config) -> Result<Self> {
        let summarizer: Arc<dyn Summarizer> = Arc::new(LlmService::new(&config));
        Self::with_summarizer(config, summarizer).await
    }

    /// 使用注入的综合分析能力初始化应用
    pub async fn with_summarizer(
        config: Config,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        // 创建文件存储（数据目录不存在时自动创建）
        let store = Arc::new(FileStore::new(&config.data_dir).await?);

        let questions = QuestionService::new(store.clone(), &config);
        let cache = SummaryCache::new(&config.data_dir);
        let synthesis = SynthesisFlow::new(
            store.clone(),
            cache,
            summarizer,
            config.min_answers_for_summary,
        );

        Ok(Self {
            config,
            store,
            questions,
            synthesis,
        })
    }

    // ========== 边界操作 ==========

    /// 创建问题
    pub async fn create_question(&self, content: &str) -> AppResult<Question> {
        self.questions.create_question(content).await
    }

    /// 查询问题（含全部回答）
    pub async fn get_question(&self, id: &str) -> AppResult<Question> {
        self.questions.get_question(id).await
    }

    /// 提交回答，返回追加后的完整问题记录
    pub async fn submit_answer(&self, id: &str, content: &str) -> AppResult<Question> {
        self.questions.submit_answer(id, content).await
    }

    /// 获取分析报告
    ///
    /// # 返回
    /// - `Ok(None)`: 回答数量不足，尚无报告
    /// - `Ok(Some(text))`: 缓存命中或生成成功的报告正文
    /// - `Err(_)`: 问题不存在，或外部能力失败（下次调用会重新生成）
    pub async fn get_synthesis(&self, id: &str) -> AppResult<Option<String>> {
        let record = self.synthesis.get_or_generate(id).await?;
        Ok(record.map(|r| r.summary))
    }

    // ========== 批量刷新模式 ==========

    /// 运行批量刷新：扫描全部问题并预热分析报告缓存
    ///
    /// 只预热缓存，不改变任何边界操作的语义；达不到阈值的问题
    /// 直接跳过，单个问题的失败不影响其余问题。
    pub async fn run(&self) -> Result<()> {
        init_log_file(&self.config.output_log_file)?;
        log_startup(&self.config);

        // 扫描全部已存储的问题
        let ids = self.store.list_ids().await?;

        if ids.is_empty() {
            warn!("⚠️ 数据目录中没有问题记录，程序结束");
            return Ok(());
        }

        let total = ids.len();
        log_questions_loaded(total, self.config.max_concurrent_refresh);

        let stats = self.refresh_all(ids).await?;

        print_final_stats(&stats, &self.config);

        Ok(())
    }

    /// 按并发上限刷新全部问题
    async fn refresh_all(&self, ids: Vec<String>) -> Result<RefreshStats> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_refresh));
        let mut stats = RefreshStats {
            total: ids.len(),
            ..Default::default()
        };

        let mut handles = Vec::new();

        for (idx, id) in ids.into_iter().enumerate() {
            let permit = semaphore.clone().acquire_owned().await?;
            let flow = self.synthesis.clone();
            let question_index = idx + 1;
            let verbose = self.config.verbose_logging;

            let handle = tokio::spawn(async move {
                let _permit = permit;
                match flow.get_or_generate(&id).await {
                    Ok(Some(record)) => {
                        info!(
                            "[问题 {}] ✓ 报告就绪 (id: {}, 回答数: {})",
                            question_index, id, record.answer_count
                        );
                        RefreshOutcome::Ready
                    }
                    Ok(None) => {
                        // 详细日志（如果启用）
                        if verbose {
                            info!("[问题 {}] 回答数量不足，跳过 (id: {})", question_index, id);
                        }
                        RefreshOutcome::Skipped
                    }
                    Err(e) => {
                        error!("[问题 {}] ❌ 刷新失败 (id: {}): {}", question_index, id, e);
                        RefreshOutcome::Failed
                    }
                }
            });
            handles.push(handle);
        }

        // 等待全部任务完成
        for result in join_all(handles).await {
            match result {
                Ok(RefreshOutcome::Ready) => stats.ready += 1,
                Ok(RefreshOutcome::Skipped) => stats.skipped += 1,
                Ok(RefreshOutcome::Failed) => stats.failed += 1,
                Err(e) => {
                    error!("刷新任务执行失败: {}", e);
                    stats.failed += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// 单个问题的刷新结果
enum RefreshOutcome {
    Ready,
    Skipped,
    Failed,
}

/// 刷新统计
#[derive(Debug, Default)]
struct RefreshStats {
    ready: usize,
    skipped: usize,
    failed: usize,
    total: usize,
}

// ========== 日志辅助函数 ==========

fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n报告刷新日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 分析报告批量刷新模式");
    info!("📊 最大并发数: {}", config.max_concurrent_refresh);
    info!("📁 数据目录: {}", config.data_dir);
    info!("{}", "=".repeat(60));
}

fn log_questions_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 找到 {} 个问题", total);
    info!("📋 将以最多 {} 个并发的方式刷新\n", max_concurrent);
}

fn print_final_stats(stats: &RefreshStats, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部刷新完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 报告就绪: {}/{}", stats.ready, stats.total);
    info!("⏭️ 回答不足跳过: {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}
