use std::collections::BTreeSet;

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{catch, catchers, Catcher, FromForm, Request};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult, AuthError, GENERIC_MESSAGE};
use crate::filter::EventFilters;
use crate::models::booking::Booking;
use crate::store::{active_seats, BookingQuery, SharedStore};

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod public;

pub fn parse_id(id: &str, what: &'static str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid {what} ID")))
}

/// Listing query string: `?search=&category=&tags=a,b&tags=c&from=YYYY-MM-DD&to=YYYY-MM-DD`.
#[derive(Debug, Default, FromForm)]
pub struct EventQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    #[field(default = Vec::new())]
    pub tags: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_day(raw: Option<String>, field: &str) -> ApiResult<Option<NaiveDate>> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("`{field}` must be a date like 2025-06-01"))),
    }
}

impl EventQuery {
    pub fn into_filters(self) -> ApiResult<EventFilters> {
        let date_from = parse_day(self.from, "from")?;
        let date_to = parse_day(self.to, "to")?;

        let tags: BTreeSet<String> = self
            .tags
            .iter()
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        Ok(EventFilters {
            search: self.search,
            category: self.category.filter(|c| !c.trim().is_empty()),
            tags: (!tags.is_empty()).then_some(tags),
            date_from,
            date_to,
        })
    }
}

/// Seats held by an event's pending and confirmed bookings.
pub async fn seats_taken(store: &SharedStore, event_id: ObjectId) -> ApiResult<i64> {
    let query = BookingQuery {
        event_id: Some(event_id),
        ..Default::default()
    };
    Ok(active_seats(store.as_ref(), &query).await?)
}

pub async fn has_active_bookings(store: &SharedStore, event_id: ObjectId) -> ApiResult<bool> {
    Ok(seats_taken(store, event_id).await? > 0)
}

pub async fn user_has_active_bookings(store: &SharedStore, user_id: ObjectId) -> ApiResult<bool> {
    let query = BookingQuery {
        user_id: Some(user_id),
        ..Default::default()
    };
    Ok(active_seats(store.as_ref(), &query).await? > 0)
}

pub async fn load_booking(store: &SharedStore, id: &str) -> ApiResult<(ObjectId, Booking)> {
    let booking_id = parse_id(id, "booking")?;
    let booking = store
        .get_booking(booking_id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))?;
    Ok((booking_id, booking))
}

fn error_body(code: &str, message: &str) -> Json<Value> {
    Json(json!({ "code": code, "error": message }))
}

#[catch(400)]
fn bad_request() -> Json<Value> {
    error_body("bad-request", "The request could not be understood")
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    let err = AuthError::Unauthenticated;
    error_body(err.code(), &err.to_string())
}

#[catch(403)]
fn forbidden() -> Json<Value> {
    let err = AuthError::Forbidden;
    error_body(err.code(), &err.to_string())
}

#[catch(404)]
fn not_found() -> Json<Value> {
    error_body("not-found", "Resource not found")
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    error_body("validation", "The request body is invalid")
}

#[catch(default)]
fn fallback(status: Status, request: &Request) -> Json<Value> {
    tracing::warn!(status = status.code, uri = %request.uri(), "unhandled error status");
    error_body("internal", GENERIC_MESSAGE)
}

pub fn catchers() -> Vec<Catcher> {
    catchers![bad_request, unauthorized, forbidden, not_found, unprocessable, fallback]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_splits_comma_separated_tags() {
        let query = EventQuery {
            tags: vec!["jazz, live".into(), "rust".into(), " ".into()],
            ..Default::default()
        };
        let filters = query.into_filters().unwrap();
        let tags: Vec<_> = filters.tags.unwrap().into_iter().collect();
        assert_eq!(tags, vec!["jazz", "live", "rust"]);
    }

    #[test]
    fn query_parses_day_bounds() {
        let query = EventQuery {
            from: Some("2025-06-01".into()),
            to: Some("".into()),
            ..Default::default()
        };
        let filters = query.into_filters().unwrap();
        assert_eq!(filters.date_from, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(filters.date_to, None);
    }

    #[test]
    fn query_rejects_malformed_dates() {
        let query = EventQuery {
            to: Some("06/01/2025".into()),
            ..Default::default()
        };
        assert!(matches!(query.into_filters(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn blank_category_is_ignored() {
        let query = EventQuery {
            category: Some("  ".into()),
            ..Default::default()
        };
        assert!(query.into_filters().unwrap().is_empty());
    }

    #[test]
    fn parse_id_names_the_resource() {
        let err = parse_id("nope", "event").unwrap_err();
        assert_eq!(err.user_message(), "Invalid event ID");
    }
}
