use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use serde::de::DeserializeOwned;

use super::{BookingQuery, Store, StoreError, StoreResult};
use crate::filter::EventFilters;
use crate::models::booking::Booking;
use crate::models::event::Event;
use crate::models::user::User;

const EVENTS: &str = "events";
const BOOKINGS: &str = "bookings";
const USERS: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    /// Makes `users.email` unique so concurrent registrations cannot both land.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(email, None).await?;
        Ok(())
    }

    fn events(&self) -> Collection<Event> {
        self.db.collection(EVENTS)
    }

    fn bookings(&self) -> Collection<Booking> {
        self.db.collection(BOOKINGS)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }
}

/// Predicates the database can evaluate: category equality and tag overlap.
/// Dates are stored as RFC 3339 strings, so range checks stay in-process.
pub fn event_query(filters: &EventFilters) -> Document {
    let mut query = Document::new();
    if let Some(category) = &filters.category {
        query.insert("category", category.as_str());
    }
    if let Some(tags) = filters.tags.as_ref().filter(|t| !t.is_empty()) {
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        query.insert("tags", doc! { "$in": tags });
    }
    query
}

pub fn booking_query(query: &BookingQuery) -> Document {
    let mut filter = Document::new();
    if let Some(user_id) = query.user_id {
        filter.insert("user_id", user_id);
    }
    if let Some(event_id) = query.event_id {
        filter.insert("event_id", event_id);
    }
    if let Some(status) = query.status {
        filter.insert("status", status.to_string());
    }
    filter
}

async fn collect<T>(collection: &Collection<T>, filter: Document, options: Option<FindOptions>) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = collection.find(filter, options).await?;
    Ok(cursor.try_collect().await?)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

fn inserted_id(result: mongodb::results::InsertOneResult, kind: &'static str) -> StoreResult<ObjectId> {
    result.inserted_id.as_object_id().ok_or(StoreError::MissingId(kind))
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn list_events(&self, filters: &EventFilters) -> StoreResult<Vec<Event>> {
        let mut events = collect(&self.events(), event_query(filters), None).await?;
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn get_event(&self, id: ObjectId) -> StoreResult<Option<Event>> {
        Ok(self.events().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_event(&self, mut event: Event) -> StoreResult<Event> {
        event.id = None;
        let result = self.events().insert_one(&event, None).await?;
        event.id = Some(inserted_id(result, "event")?);
        Ok(event)
    }

    async fn replace_event(&self, id: ObjectId, event: &Event) -> StoreResult<bool> {
        let mut event = event.clone();
        event.id = Some(id);
        let result = self.events().replace_one(doc! { "_id": id }, &event, None).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_event(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.events().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_bookings(&self, query: &BookingQuery) -> StoreResult<Vec<Booking>> {
        let mut bookings = collect(&self.bookings(), booking_query(query), None).await?;
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }

    async fn get_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_booking(&self, mut booking: Booking) -> StoreResult<Booking> {
        booking.id = None;
        let result = self.bookings().insert_one(&booking, None).await?;
        booking.id = Some(inserted_id(result, "booking")?);
        Ok(booking)
    }

    async fn replace_booking(&self, id: ObjectId, booking: &Booking) -> StoreResult<bool> {
        let mut booking = booking.clone();
        booking.id = Some(id);
        let result = self.bookings().replace_one(doc! { "_id": id }, &booking, None).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_booking(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.bookings().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let options = FindOptions::builder().sort(doc! { "email": 1 }).build();
        collect(&self.users(), doc! {}, Some(options)).await
    }

    async fn get_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn insert_user(&self, mut user: User) -> StoreResult<User> {
        user.id = None;
        let result = self.users().insert_one(&user, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::Duplicate("email")
            } else {
                StoreError::Database(e)
            }
        })?;
        user.id = Some(inserted_id(result, "user")?);
        Ok(user)
    }

    async fn replace_user(&self, id: ObjectId, user: &User) -> StoreResult<bool> {
        let mut user = user.clone();
        user.id = Some(id);
        let result = self.users().replace_one(doc! { "_id": id }, &user, None).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.users().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}
