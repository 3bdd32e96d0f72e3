use anonymous_answers::utils::logging;
use anonymous_answers::{App, Config};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化应用并执行批量刷新（扫描全部问题，预热分析报告缓存）
    App::initialize(config).await?.run().await?;

    Ok(())
}
