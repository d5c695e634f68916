//! First-run data: the administrator account and the sample catalogue
//! loaded by the `seed` binary.

use anyhow::Context;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::filter::EventFilters;
use crate::models::event::{Event, EventPayload};
use crate::models::user::{Role, User};
use crate::routes::auth::normalize_email;
use crate::store::{active_seats, BookingQuery, SharedStore};
use crate::utils::auth::hash_password;

/// Returns the admin account for `email`, creating it when missing.
///
/// The email is normalized the same way sign-in does, so the account can
/// always log in regardless of how `ADMIN_EMAIL` was capitalized.
pub async fn ensure_admin(store: &SharedStore, email: &str, password: &str, cost: u32) -> anyhow::Result<User> {
    let email = normalize_email(email);
    if let Some(existing) = store.find_user_by_email(&email).await? {
        tracing::info!(email = %email, "admin user already exists, skipping creation");
        return Ok(existing);
    }

    let password_hash = hash_password(password, cost)?;
    let admin = store
        .insert_user(User {
            id: None,
            email: email.clone(),
            name: "Administrator".to_string(),
            role: Role::Admin,
            avatar: None,
            password_hash,
            created_at: Utc::now(),
        })
        .await?;
    tracing::info!(email = %email, "admin user created");
    Ok(admin)
}

/// Replaces the catalogue with `samples`, organized by `organizer_id`.
///
/// Events still holding pending or confirmed bookings are kept so no
/// booking is left pointing at a missing event. Returns the inserted events.
pub async fn reset_events(
    store: &SharedStore,
    organizer_id: ObjectId,
    samples: Vec<EventPayload>,
) -> anyhow::Result<Vec<Event>> {
    for event in store.list_events(&EventFilters::default()).await? {
        let Some(id) = event.id else { continue };
        let query = BookingQuery {
            event_id: Some(id),
            ..Default::default()
        };
        let held = active_seats(store.as_ref(), &query).await?;
        if held > 0 {
            tracing::warn!(event_id = %id, title = %event.title, seats = held, "keeping event with active bookings");
            continue;
        }
        store.delete_event(id).await?;
    }

    let mut inserted = Vec::with_capacity(samples.len());
    for payload in samples {
        let event = payload
            .into_event(organizer_id)
            .map_err(anyhow::Error::msg)
            .context("invalid sample event")?;
        let event = store.insert_event(event).await?;
        tracing::info!(title = %event.title, date = %event.date, "sample event added");
        inserted.push(event);
    }
    Ok(inserted)
}
