//! Elecxo Commerce - electronics storefront and back-office

use anyhow::Result;
use elecxo_commerce::{router, AppState, Config, Seed};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let seed = match &config.seed_path {
        Some(path) => Seed::from_path(path)?,
        None => Seed::bundled()?,
    };
    let app = router(AppState::new(&config, seed)?);

    let addr = config.socket_addr();
    tracing::info!(%addr, currency = %config.currency, "Elecxo Commerce listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
