use anyhow::Result;
use mock_test_engine::app::App;
use mock_test_engine::config::Config;
use mock_test_engine::utils::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    App::initialize(config)?.run().await?;

    Ok(())
}
