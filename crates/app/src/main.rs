mod input;
mod renderer;

use candlefeed_core::common::time::RealTimeProvider;
use candlefeed_core::config::AppConfig;
use candlefeed_market::engine::{ChartEngine, EnginePorts};
use input::Command;
use renderer::ConsoleRenderer;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// # Summary
/// 从可选的 `candlefeed.toml` 与 `CANDLEFEED_` 前缀环境变量加载配置。
///
/// # Logic
/// 1. 文件不存在时跳过。
/// 2. 环境变量覆盖文件，嵌套键用 `__` 分隔（如 `CANDLEFEED_CHART__SEED=7`）。
/// 3. 缺失字段回落到默认值。
fn load_config() -> Result<AppConfig, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name("candlefeed").required(false))
        .add_source(
            config::Environment::with_prefix("CANDLEFEED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
///
/// # Logic
/// 1. 加载配置并初始化日志（stderr，stdout 留给渲染输出）。
/// 2. 实例化渲染端与引擎并启动。
/// 3. 在单线程事件循环上分发 stdin 命令，直到 quit、输入结束或 Ctrl-C。
/// 4. 拆除引擎。
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 配置与日志
    let config = load_config()?;
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();
    info!("candlefeed starting...");

    // 2. 装配引擎
    let renderer = Arc::new(ConsoleRenderer::new(std::io::stdout()));
    let engine = ChartEngine::new(
        &config.chart,
        Arc::new(RealTimeProvider),
        EnginePorts {
            window: renderer.clone(),
            bias: renderer.clone(),
            viewport: renderer,
        },
    )?;
    engine.start()?;
    info!("Engine running. Commands: tap | resize <w> <h> | quit");

    // 3. 事件循环
    let mut lines = input::spawn_reader()?;
    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Tap) => {
                        engine.tap();
                    }
                    Ok(Command::Resize(viewport)) => engine.resize(viewport),
                    Ok(Command::Quit) => break,
                    Err(e) => warn!("{}", e),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutdown signal received");
                break;
            }
        }
    }

    // 4. 拆除
    engine.stop();
    info!("Exiting...");
    Ok(())
}
