use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{delete, get, patch, post, put, routes, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{has_active_bookings, load_booking, parse_id, user_has_active_bookings, EventQuery};
use crate::error::{ApiError, ApiResult};
use crate::filter::{filter_events, EventFilters};
use crate::models::booking::{Booking, BookingStatus, UpdateStatusPayload};
use crate::models::event::{Event, EventPayload};
use crate::models::user::{Role, UpdateUserPayload, UserProfile};
use crate::store::{BookingQuery, SharedStore};
use crate::utils::auth::AdminSession;

// --- Event Management ---

#[get("/events?<query..>")]
pub async fn admin_get_events(
    store: &State<SharedStore>,
    _admin: AdminSession,
    query: EventQuery,
) -> ApiResult<Json<Vec<Event>>> {
    let filters = query.into_filters()?;
    let events = store.list_events(&filters).await?;
    Ok(Json(filter_events(events, &filters)))
}

#[post("/events", data = "<payload>")]
pub async fn create_event(
    store: &State<SharedStore>,
    admin: AdminSession,
    payload: Json<EventPayload>,
) -> ApiResult<Json<Event>> {
    let event = payload
        .into_inner()
        .into_event(admin.0.user_id)
        .map_err(ApiError::Validation)?;
    let event = store.insert_event(event).await?;
    tracing::info!(event_id = ?event.id, admin = %admin.0.email, "event created");
    Ok(Json(event))
}

#[put("/events/<id>", data = "<payload>")]
pub async fn replace_event(
    store: &State<SharedStore>,
    admin: AdminSession,
    id: &str,
    payload: Json<EventPayload>,
) -> ApiResult<Json<Event>> {
    let event_id = parse_id(id, "event")?;
    let existing = store
        .get_event(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event"))?;
    if has_active_bookings(store, event_id).await? {
        return Err(ApiError::Conflict(
            "Events with active bookings cannot be edited".into(),
        ));
    }

    let mut event = payload
        .into_inner()
        .into_event(existing.organizer_id)
        .map_err(ApiError::Validation)?;
    event.id = Some(event_id);
    if !store.replace_event(event_id, &event).await? {
        return Err(ApiError::NotFound("Event"));
    }
    tracing::info!(event_id = %event_id, admin = %admin.0.email, "event replaced");
    Ok(Json(event))
}

#[delete("/events/<id>")]
pub async fn delete_event(store: &State<SharedStore>, admin: AdminSession, id: &str) -> ApiResult<Json<Value>> {
    let event_id = parse_id(id, "event")?;
    if has_active_bookings(store, event_id).await? {
        return Err(ApiError::Conflict(
            "Events with active bookings cannot be deleted".into(),
        ));
    }
    if !store.delete_event(event_id).await? {
        return Err(ApiError::NotFound("Event"));
    }
    tracing::info!(event_id = %event_id, admin = %admin.0.email, "event deleted");
    Ok(Json(json!({ "message": "Event deleted" })))
}

// --- User Management ---

#[get("/users")]
pub async fn get_users(store: &State<SharedStore>, _admin: AdminSession) -> ApiResult<Json<Vec<UserProfile>>> {
    let users = store.list_users().await?;
    Ok(Json(users.iter().map(UserProfile::from).collect()))
}

#[put("/users/<id>", data = "<payload>")]
pub async fn update_user(
    store: &State<SharedStore>,
    admin: AdminSession,
    id: &str,
    payload: Json<UpdateUserPayload>,
) -> ApiResult<Json<UserProfile>> {
    let user_id = parse_id(id, "user")?;
    let payload = payload.into_inner();
    if user_id == admin.0.user_id && payload.role.is_some_and(|role| role != Role::Admin) {
        return Err(ApiError::Conflict("You cannot remove your own admin role".into()));
    }

    let mut user = store
        .get_user(user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    payload.apply(&mut user);
    if !store.replace_user(user_id, &user).await? {
        return Err(ApiError::NotFound("User"));
    }
    tracing::info!(user_id = %user_id, role = %user.role, admin = %admin.0.email, "user updated");
    Ok(Json(UserProfile::from(&user)))
}

#[delete("/users/<id>")]
pub async fn delete_user(store: &State<SharedStore>, admin: AdminSession, id: &str) -> ApiResult<Json<Value>> {
    let user_id = parse_id(id, "user")?;
    if user_id == admin.0.user_id {
        return Err(ApiError::Conflict("You cannot delete your own account".into()));
    }
    if user_has_active_bookings(store, user_id).await? {
        return Err(ApiError::Conflict(
            "Users with active bookings cannot be deleted".into(),
        ));
    }
    if !store.delete_user(user_id).await? {
        return Err(ApiError::NotFound("User"));
    }
    tracing::info!(user_id = %user_id, admin = %admin.0.email, "user deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

// --- Booking Management ---

#[get("/bookings?<status>&<event_id>&<user_id>")]
pub async fn get_bookings(
    store: &State<SharedStore>,
    _admin: AdminSession,
    status: Option<&str>,
    event_id: Option<&str>,
    user_id: Option<&str>,
) -> ApiResult<Json<Vec<Booking>>> {
    let query = BookingQuery {
        status: status
            .map(|s| s.parse::<BookingStatus>().map_err(ApiError::BadRequest))
            .transpose()?,
        event_id: event_id.map(|id| parse_id(id, "event")).transpose()?,
        user_id: user_id.map(|id| parse_id(id, "user")).transpose()?,
    };
    Ok(Json(store.list_bookings(&query).await?))
}

#[patch("/bookings/<id>/status", data = "<payload>")]
pub async fn update_booking_status(
    store: &State<SharedStore>,
    admin: AdminSession,
    id: &str,
    payload: Json<UpdateStatusPayload>,
) -> ApiResult<Json<Booking>> {
    let (booking_id, mut booking) = load_booking(store, id).await?;
    let previous = booking.status;
    booking.transition(payload.status).map_err(ApiError::Conflict)?;
    if !store.replace_booking(booking_id, &booking).await? {
        return Err(ApiError::NotFound("Booking"));
    }
    tracing::info!(
        booking_id = %booking_id,
        from = %previous,
        to = %booking.status,
        admin = %admin.0.email,
        "booking status changed"
    );
    Ok(Json(booking))
}

#[post("/bookings/<id>/check-in")]
pub async fn check_in_booking(store: &State<SharedStore>, admin: AdminSession, id: &str) -> ApiResult<Json<Booking>> {
    let (booking_id, mut booking) = load_booking(store, id).await?;
    booking.check_in(Utc::now()).map_err(ApiError::Conflict)?;
    if !store.replace_booking(booking_id, &booking).await? {
        return Err(ApiError::NotFound("Booking"));
    }
    tracing::info!(booking_id = %booking_id, reference = %booking.reference, admin = %admin.0.email, "checked in");
    Ok(Json(booking))
}

#[delete("/bookings/<id>")]
pub async fn delete_booking(store: &State<SharedStore>, admin: AdminSession, id: &str) -> ApiResult<Json<Value>> {
    let booking_id = parse_id(id, "booking")?;
    if !store.delete_booking(booking_id).await? {
        return Err(ApiError::NotFound("Booking"));
    }
    tracing::info!(booking_id = %booking_id, admin = %admin.0.email, "booking deleted");
    Ok(Json(json!({ "message": "Booking deleted" })))
}

// --- Dashboard ---

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_events: usize,
    pub upcoming_events: usize,
    pub total_users: usize,
    pub bookings: BookingCounts,
    pub tickets_sold: i64,
    pub checked_in: usize,
    pub revenue: f64,
}

pub fn summarize(events: &[Event], users: usize, bookings: &[Booking], now: chrono::DateTime<Utc>) -> DashboardStats {
    let mut counts = BookingCounts::default();
    let mut tickets_sold = 0;
    let mut revenue = 0.0;
    let mut checked_in = 0;
    for booking in bookings {
        match booking.status {
            BookingStatus::Pending => counts.pending += 1,
            BookingStatus::Cancelled => counts.cancelled += 1,
            BookingStatus::Confirmed => {
                counts.confirmed += 1;
                tickets_sold += i64::from(booking.quantity);
                revenue += booking.total_price;
            }
        }
        if booking.checked_in {
            checked_in += 1;
        }
    }

    DashboardStats {
        total_events: events.len(),
        upcoming_events: events.iter().filter(|e| e.date >= now).count(),
        total_users: users,
        bookings: counts,
        tickets_sold,
        checked_in,
        revenue,
    }
}

#[get("/stats")]
pub async fn stats(store: &State<SharedStore>, _admin: AdminSession) -> ApiResult<Json<DashboardStats>> {
    let events = store.list_events(&EventFilters::default()).await?;
    let users = store.list_users().await?;
    let bookings = store.list_bookings(&BookingQuery::default()).await?;
    Ok(Json(summarize(&events, users.len(), &bookings, Utc::now())))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        admin_get_events,
        create_event,
        replace_event,
        delete_event,
        get_users,
        update_user,
        delete_user,
        get_bookings,
        update_booking_status,
        check_in_booking,
        delete_booking,
        stats
    ]
}
