use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    pub capacity: i32,
    #[serde(default)]
    pub price: f64,
    pub organizer_id: ObjectId,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body accepted when an event is created or replaced.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub capacity: i32,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl EventPayload {
    /// Checks field constraints and builds the record owned by `organizer_id`.
    pub fn into_event(self, organizer_id: ObjectId) -> Result<Event, String> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required".into());
        }
        let location = self.location.trim().to_string();
        if location.is_empty() {
            return Err("Location is required".into());
        }
        if self.capacity < 1 {
            return Err("Capacity must be at least 1".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("Price must be a non-negative number".into());
        }

        let tags = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Event {
            id: None,
            title,
            description: self.description.trim().to_string(),
            date: self.date,
            location,
            capacity: self.capacity,
            price: self.price,
            organizer_id,
            category: non_blank(self.category),
            tags,
            image_url: non_blank(self.image_url),
        })
    }
}
