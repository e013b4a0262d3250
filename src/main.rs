use anyhow::Result;
use exam_composer::{logger, App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置并初始化日志，配置有误时逐项回退到默认值
    let config = match Config::try_from_env() {
        Ok(config) => {
            logger::init(config.verbose_logging);
            config
        }
        Err(e) => {
            logger::init(false);
            warn!("⚠️ 配置有误: {}", e);
            Config::from_env()
        }
    };

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
