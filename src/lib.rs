//! Event discovery and booking API: public listings, sign-in, ticket
//! reservations, and admin management of events, users and bookings.

use std::sync::Arc;

use rocket::{Build, Rocket};

pub mod bootstrap;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;

use config::{Config, StoreKind};
use store::{MemoryStore, MongoStore, SharedStore};

pub async fn connect_store(config: &Config, app_name: &str) -> anyhow::Result<SharedStore> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Mongo => {
            let uri = config
                .mongodb_uri
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("MONGODB_URI must be set"))?;
            let db = db::init_db(uri, app_name).await?;
            tracing::info!(database = %db.name(), "connected to MongoDB");
            let store = MongoStore::new(db);
            store.ensure_indexes().await?;
            Ok(Arc::new(store))
        }
    }
}

pub fn build_rocket(config: Config, store: SharedStore) -> Rocket<Build> {
    rocket::build()
        .manage(config)
        .manage(store)
        .attach(cors::Cors)
        .mount("/api", routes::public::routes())
        .mount("/api/auth", routes::auth::routes())
        .mount("/api/bookings", routes::bookings::routes())
        .mount("/api/admin", routes::admin::routes())
        .register("/", routes::catchers())
}
