use rocket::serde::json::Json;
use rocket::{get, post, routes, State};
use serde_json::{json, Value};

use super::{parse_id, EventQuery};
use crate::error::{ApiError, ApiResult};
use crate::filter::filter_events;
use crate::models::event::{Event, EventPayload};
use crate::store::SharedStore;
use crate::utils::auth::OrganizerSession;

#[get("/health")]
pub fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[get("/events?<query..>")]
pub async fn get_events(store: &State<SharedStore>, query: EventQuery) -> ApiResult<Json<Vec<Event>>> {
    let filters = query.into_filters()?;
    let events = store.list_events(&filters).await?;
    Ok(Json(filter_events(events, &filters)))
}

#[get("/events/<id>")]
pub async fn get_event(store: &State<SharedStore>, id: &str) -> ApiResult<Json<Event>> {
    let event_id = parse_id(id, "event")?;
    match store.get_event(event_id).await? {
        Some(event) => Ok(Json(event)),
        None => Err(ApiError::NotFound("Event")),
    }
}

#[post("/events", data = "<payload>")]
pub async fn create_event(
    store: &State<SharedStore>,
    organizer: OrganizerSession,
    payload: Json<EventPayload>,
) -> ApiResult<Json<Event>> {
    let event = payload
        .into_inner()
        .into_event(organizer.0.user_id)
        .map_err(ApiError::Validation)?;
    let event = store.insert_event(event).await?;
    tracing::info!(event_id = ?event.id, organizer = %organizer.0.email, "event created");
    Ok(Json(event))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![health, get_events, get_event, create_event]
}
