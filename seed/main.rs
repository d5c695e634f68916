use anyhow::Context;
use chrono::{Duration, Utc};
use dotenvy::dotenv;
use event_booking::{
    bootstrap::{ensure_admin, reset_events},
    config::{Config, StoreKind},
    connect_store,
    models::event::EventPayload,
};
use tracing_subscriber::EnvFilter;

fn sample_events() -> Vec<EventPayload> {
    let now = Utc::now();
    let event = |title: &str, description: &str, days: i64, location: &str, capacity: i32, price: f64, category: &str, tags: &[&str]| {
        EventPayload {
            title: title.to_string(),
            description: description.to_string(),
            date: now + Duration::days(days),
            location: location.to_string(),
            capacity,
            price,
            category: Some(category.to_string()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: None,
        }
    };

    vec![
        event(
            "Jazz Night",
            "A night of stellar jazz performances.",
            14,
            "Blue Note Hall",
            200,
            35.0,
            "Music",
            &["jazz", "live"],
        ),
        event(
            "Tech Talk: Async Rust",
            "Speakers walk through building async services.",
            21,
            "Innovation Hub",
            80,
            0.0,
            "Tech",
            &["rust", "talks"],
        ),
        event(
            "Comedy Night",
            "Get ready to laugh out loud with top comedians.",
            30,
            "Downtown Bar",
            120,
            20.0,
            "Comedy",
            &["standup", "live"],
        ),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    if config.store == StoreKind::Memory {
        tracing::warn!("STORE=memory: seeded data disappears when this process exits");
    }
    let store = connect_store(&config, "event_booking_seed").await?;

    let admin_email = config.admin_email.clone().context("ADMIN_EMAIL must be set")?;
    let admin_password = config.admin_password.clone().context("ADMIN_PASSWORD must be set")?;

    let admin = ensure_admin(&store, &admin_email, &admin_password, config.bcrypt_cost).await?;
    let admin_id = admin.id.context("admin user has no id")?;
    reset_events(&store, admin_id, sample_events()).await?;

    tracing::info!("seeding complete");
    Ok(())
}
