use anyhow::Result;
use instadesign_gateway::{build_router, config::GatewayConfig, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = GatewayConfig::from_env()?;
    let addr: std::net::SocketAddr = config.bind.parse()?;
    let app = build_router(AppState::from_config(config));

    tracing::info!(%addr, "instadesign gateway listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
