//! Scrum Planner 服务
//!
//! 入口：初始化日志、加载配置、装配协作方并启动 HTTP 服务。
//! 配置文件：config/default.toml，或 PLANNER_CONFIG 指定的文件。

use anyhow::Context;
use scrum_planner::{
    build_state, config::config_path_from_env, config::load_config, create_router, observability,
    Collaborators,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(config_path_from_env()).context("Failed to load config")?;
    let collaborators = Collaborators::from_config(&cfg)
        .await
        .context("Failed to build collaborators")?;

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let state = build_state(cfg, collaborators);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Scrum Planner listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
