use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event_id: ObjectId,
    pub user_id: ObjectId,
    pub status: BookingStatus,
    pub quantity: i32,
    pub total_price: f64,
    #[serde(default)]
    pub reference: String,
    pub booked_at: DateTime<Utc>,
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default)]
    pub checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("Unknown booking status `{other}`")),
        }
    }
}

impl BookingStatus {
    /// Cancelled is terminal; re-applying the current status is allowed.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (Confirmed, Confirmed)
                | (Cancelled, Cancelled)
                | (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    /// Whether the booking still holds seats.
    pub fn is_active(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingPayload {
    pub event_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: BookingStatus,
}

impl Booking {
    pub fn new(event_id: ObjectId, user_id: ObjectId, quantity: i32, unit_price: f64) -> Self {
        Booking {
            id: None,
            event_id,
            user_id,
            status: BookingStatus::Pending,
            quantity,
            total_price: unit_price * f64::from(quantity),
            reference: format!("BK-{}", Uuid::new_v4().simple()).to_uppercase(),
            booked_at: Utc::now(),
            checked_in: false,
            checked_in_at: None,
        }
    }

    pub fn transition(&mut self, next: BookingStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!("Cannot change a {} booking to {}", self.status, next));
        }
        self.status = next;
        Ok(())
    }

    pub fn check_in(&mut self, at: DateTime<Utc>) -> Result<(), String> {
        if self.status != BookingStatus::Confirmed {
            return Err(format!("Only confirmed bookings can be checked in (booking is {})", self.status));
        }
        if self.checked_in {
            return Err("Booking is already checked in".into());
        }
        self.checked_in = true;
        self.checked_in_at = Some(at);
        Ok(())
    }
}
