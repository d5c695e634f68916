use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{BookingQuery, Store, StoreError, StoreResult};
use crate::filter::EventFilters;
use crate::models::booking::Booking;
use crate::models::event::Event;
use crate::models::user::User;

#[derive(Debug, Default)]
struct Collections {
    events: Vec<Event>,
    bookings: Vec<Booking>,
    users: Vec<User>,
}

/// Process-local store for development runs and tests. Contents are lost
/// on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace_by_id<T: Clone>(
    items: &mut [T],
    id: ObjectId,
    id_of: impl Fn(&T) -> Option<ObjectId>,
    value: &T,
    set_id: impl Fn(&mut T, ObjectId),
) -> bool {
    match items.iter_mut().find(|item| id_of(item) == Some(id)) {
        Some(slot) => {
            *slot = value.clone();
            set_id(slot, id);
            true
        }
        None => false,
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: ObjectId, id_of: impl Fn(&T) -> Option<ObjectId>) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != Some(id));
    items.len() != before
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn list_events(&self, _filters: &EventFilters) -> StoreResult<Vec<Event>> {
        let mut events = self.inner.read().await.events.clone();
        events.sort_by_key(|e| e.date);
        Ok(events)
    }

    async fn get_event(&self, id: ObjectId) -> StoreResult<Option<Event>> {
        let inner = self.inner.read().await;
        Ok(inner.events.iter().find(|e| e.id == Some(id)).cloned())
    }

    async fn insert_event(&self, mut event: Event) -> StoreResult<Event> {
        event.id = Some(ObjectId::new());
        self.inner.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn replace_event(&self, id: ObjectId, event: &Event) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(replace_by_id(&mut inner.events, id, |e| e.id, event, |e, id| e.id = Some(id)))
    }

    async fn delete_event(&self, id: ObjectId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(remove_by_id(&mut inner.events, id, |e| e.id))
    }

    async fn list_bookings(&self, query: &BookingQuery) -> StoreResult<Vec<Booking>> {
        let inner = self.inner.read().await;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| query.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
        Ok(bookings)
    }

    async fn get_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.iter().find(|b| b.id == Some(id)).cloned())
    }

    async fn insert_booking(&self, mut booking: Booking) -> StoreResult<Booking> {
        booking.id = Some(ObjectId::new());
        self.inner.write().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn replace_booking(&self, id: ObjectId, booking: &Booking) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(replace_by_id(&mut inner.bookings, id, |b| b.id, booking, |b, id| b.id = Some(id)))
    }

    async fn delete_booking(&self, id: ObjectId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(remove_by_id(&mut inner.bookings, id, |b| b.id))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users = self.inner.read().await.users.clone();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn get_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == Some(id)).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, mut user: User) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        user.id = Some(ObjectId::new());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn replace_user(&self, id: ObjectId, user: &User) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(replace_by_id(&mut inner.users, id, |u| u.id, user, |u, id| u.id = Some(id)))
    }

    async fn delete_user(&self, id: ObjectId) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(remove_by_id(&mut inner.users, id, |u| u.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;
    use chrono::{Duration, TimeZone, Utc};

    fn event(title: &str, day: u32) -> Event {
        Event {
            id: None,
            title: title.into(),
            description: String::new(),
            date: Utc.with_ymd_and_hms(2025, 6, day, 19, 0, 0).unwrap(),
            location: "Hall".into(),
            capacity: 10,
            price: 5.0,
            organizer_id: ObjectId::new(),
            category: None,
            tags: Default::default(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn lists_events_by_date() {
        let store = MemoryStore::new();
        store.insert_event(event("Later", 20)).await.unwrap();
        store.insert_event(event("Sooner", 2)).await.unwrap();

        let events = store.list_events(&EventFilters::default()).await.unwrap();
        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Sooner", "Later"]);
    }

    #[tokio::test]
    async fn replace_keeps_the_id() {
        let store = MemoryStore::new();
        let saved = store.insert_event(event("Draft", 5)).await.unwrap();
        let id = saved.id.unwrap();

        let mut edited = event("Final", 6);
        edited.id = None;
        assert!(store.replace_event(id, &edited).await.unwrap());

        let fetched = store.get_event(id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Final");
        assert_eq!(fetched.id, Some(id));
        assert!(!store.replace_event(ObjectId::new(), &edited).await.unwrap());
    }

    #[tokio::test]
    async fn booking_query_narrows_and_orders_newest_first() {
        let store = MemoryStore::new();
        let event_id = ObjectId::new();
        let user_id = ObjectId::new();

        let mut older = Booking::new(event_id, user_id, 1, 5.0);
        older.booked_at -= Duration::hours(1);
        store.insert_booking(older).await.unwrap();
        store.insert_booking(Booking::new(event_id, user_id, 2, 5.0)).await.unwrap();
        store.insert_booking(Booking::new(ObjectId::new(), user_id, 1, 5.0)).await.unwrap();

        let query = BookingQuery {
            event_id: Some(event_id),
            ..Default::default()
        };
        let bookings = store.list_bookings(&query).await.unwrap();
        assert_eq!(bookings.len(), 2);
        assert_eq!(bookings[0].quantity, 2);

        let cancelled = BookingQuery {
            status: Some(BookingStatus::Cancelled),
            ..Default::default()
        };
        assert!(store.list_bookings(&cancelled).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_user_with_same_email_is_rejected() {
        let store = MemoryStore::new();
        let user = |name: &str| User {
            id: None,
            email: "ana@example.com".into(),
            name: name.into(),
            role: Default::default(),
            avatar: None,
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        store.insert_user(user("first")).await.unwrap();
        let err = store.insert_user(user("second")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn active_seats_skip_cancelled_bookings() {
        let store = MemoryStore::new();
        let event_id = ObjectId::new();
        store.insert_booking(Booking::new(event_id, ObjectId::new(), 2, 1.0)).await.unwrap();
        let mut cancelled = Booking::new(event_id, ObjectId::new(), 5, 1.0);
        cancelled.transition(BookingStatus::Cancelled).unwrap();
        store.insert_booking(cancelled).await.unwrap();

        let query = BookingQuery {
            event_id: Some(event_id),
            ..Default::default()
        };
        assert_eq!(crate::store::active_seats(&store, &query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryStore::new();
        let saved = store.insert_event(event("Gone", 1)).await.unwrap();
        let id = saved.id.unwrap();
        assert!(store.delete_event(id).await.unwrap());
        assert!(!store.delete_event(id).await.unwrap());
    }
}
