// ==========================================
// 学习成果评估系统 - HTTP 服务主入口
// ==========================================
// 技术栈: axum + Rust + SQLite
// ==========================================

use academic_qa::app::{build_router, AppState};
use academic_qa::config::AppConfig;
use academic_qa::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", academic_qa::APP_NAME);
    tracing::info!("系统版本: {}", academic_qa::VERSION);
    tracing::info!("==================================================");

    let config = AppConfig::from_env();
    tracing::info!("使用数据库: {}", config.db_path);

    let app_state = AppState::new(&config).map_err(anyhow::Error::msg)?;
    let router = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("HTTP 服务已启动: {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
