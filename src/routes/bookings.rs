use rocket::serde::json::Json;
use rocket::{get, post, routes, State};

use super::{load_booking, parse_id, seats_taken};
use crate::error::{ApiError, ApiResult, AuthError};
use crate::models::booking::{Booking, BookingStatus, CreateBookingPayload};
use crate::models::user::Role;
use crate::store::{BookingQuery, SharedStore};
use crate::utils::auth::Session;

#[post("/", data = "<payload>")]
pub async fn create_booking(
    store: &State<SharedStore>,
    session: Session,
    payload: Json<CreateBookingPayload>,
) -> ApiResult<Json<Booking>> {
    let event_id = parse_id(&payload.event_id, "event")?;
    if payload.quantity < 1 {
        return Err(ApiError::Validation("Quantity must be at least 1".into()));
    }

    let event = store
        .get_event(event_id)
        .await?
        .ok_or(ApiError::NotFound("Event"))?;

    // Read-then-write without a transaction: concurrent bookers can still
    // overrun capacity.
    let remaining = i64::from(event.capacity) - seats_taken(store, event_id).await?;
    if i64::from(payload.quantity) > remaining {
        return Err(ApiError::Conflict(if remaining > 0 {
            format!("Only {remaining} tickets left for this event")
        } else {
            "This event is sold out".to_string()
        }));
    }

    let booking = Booking::new(event_id, session.user_id, payload.quantity, event.price);
    let booking = store.insert_booking(booking).await?;
    tracing::info!(
        booking_id = ?booking.id,
        event_id = %event_id,
        user = %session.email,
        quantity = booking.quantity,
        "booking created"
    );
    Ok(Json(booking))
}

#[get("/mine")]
pub async fn my_bookings(store: &State<SharedStore>, session: Session) -> ApiResult<Json<Vec<Booking>>> {
    let query = BookingQuery {
        user_id: Some(session.user_id),
        ..Default::default()
    };
    Ok(Json(store.list_bookings(&query).await?))
}

#[post("/<id>/cancel")]
pub async fn cancel_booking(store: &State<SharedStore>, session: Session, id: &str) -> ApiResult<Json<Booking>> {
    let (booking_id, mut booking) = load_booking(store, id).await?;
    if booking.user_id != session.user_id && session.role != Role::Admin {
        return Err(AuthError::Forbidden.into());
    }

    booking.transition(BookingStatus::Cancelled).map_err(ApiError::Conflict)?;
    if !store.replace_booking(booking_id, &booking).await? {
        return Err(ApiError::NotFound("Booking"));
    }
    tracing::info!(booking_id = %booking_id, user = %session.email, "booking cancelled");
    Ok(Json(booking))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![create_booking, my_bookings, cancel_booking]
}
