//! Data access over the document store.
//!
//! Every mutation is a single document write. Nothing here spans records
//! in a transaction, so callers that read-then-write (capacity checks,
//! status transitions) can race with each other.

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::filter::EventFilters;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::event::Event;
use crate::models::user::User;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("database returned no id for inserted {0}")]
    MissingId(&'static str),
    #[error("a record with this {0} already exists")]
    Duplicate(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Narrowing applied when listing bookings. Empty means all bookings.
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub user_id: Option<ObjectId>,
    pub event_id: Option<ObjectId>,
    pub status: Option<BookingStatus>,
}

impl BookingQuery {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.user_id.map_or(true, |id| booking.user_id == id)
            && self.event_id.map_or(true, |id| booking.event_id == id)
            && self.status.map_or(true, |status| booking.status == status)
    }
}

/// Seats held by the pending and confirmed bookings matching `query`.
pub async fn active_seats(store: &dyn Store, query: &BookingQuery) -> StoreResult<i64> {
    let bookings = store.list_bookings(query).await?;
    Ok(bookings
        .iter()
        .filter(|b| b.status.is_active())
        .map(|b| i64::from(b.quantity))
        .sum())
}

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Events sorted by date ascending. Implementations may use `filters`
    /// to narrow the result, but callers still run the full composer.
    async fn list_events(&self, filters: &EventFilters) -> StoreResult<Vec<Event>>;
    async fn get_event(&self, id: ObjectId) -> StoreResult<Option<Event>>;
    async fn insert_event(&self, event: Event) -> StoreResult<Event>;
    /// Full-record replacement. `false` when no event has this id.
    async fn replace_event(&self, id: ObjectId, event: &Event) -> StoreResult<bool>;
    async fn delete_event(&self, id: ObjectId) -> StoreResult<bool>;

    /// Bookings newest first.
    async fn list_bookings(&self, query: &BookingQuery) -> StoreResult<Vec<Booking>>;
    async fn get_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>>;
    async fn insert_booking(&self, booking: Booking) -> StoreResult<Booking>;
    async fn replace_booking(&self, id: ObjectId, booking: &Booking) -> StoreResult<bool>;
    async fn delete_booking(&self, id: ObjectId) -> StoreResult<bool>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn get_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn replace_user(&self, id: ObjectId, user: &User) -> StoreResult<bool>;
    async fn delete_user(&self, id: ObjectId) -> StoreResult<bool>;
}

pub type SharedStore = Arc<dyn Store>;
