use std::path::Path;

use anyhow::{Context, Result};
use place_crawler::utils::logging;
use place_crawler::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：第一个参数是可选的 TOML 输入文件
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_toml_file(Path::new(&path))
            .with_context(|| format!("无法读取输入文件 {}", path))?,
        None => Config::from_env().context("无法读取环境变量配置")?,
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    config.validate().context("配置校验失败")?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
