use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use event_booking::{build_rocket, config::Config, connect_store};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,event_booking=debug")),
        )
        .init();

    let config = Config::from_env()?;
    let store = connect_store(&config, "event_booking").await?;
    tracing::info!(store = ?config.store, "starting event booking API");

    let _ = build_rocket(config, store).launch().await?;
    Ok(())
}
