//! Domain model shared across the engine.
//!
//! All interval fields are UTC instants with the invariant `start < end`,
//! checked at the resolver boundary. Ids are opaque strings owned by the
//! storage layer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::recurrence::Recurrence;

/// What a resolved slot means for the resource it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Available,
    Unavailable,
    Reservation,
}

/// One schedulable axis. Aircraft and instructors conflict independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResourceRef {
    Aircraft(String),
    Instructor(String),
}

impl ResourceRef {
    pub fn id(&self) -> &str {
        match self {
            ResourceRef::Aircraft(id) | ResourceRef::Instructor(id) => id,
        }
    }

    /// Whether an availability entry targets this resource. Entries may carry
    /// both ids at once (an instructor-on-aircraft constraint) and then match
    /// either axis.
    pub fn matches_entry(&self, entry: &AvailabilityEntry) -> bool {
        match self {
            ResourceRef::Aircraft(id) => entry.resource_aircraft_id.as_deref() == Some(id),
            ResourceRef::Instructor(id) => entry.resource_user_id.as_deref() == Some(id),
        }
    }

    pub fn matches_reservation(&self, reservation: &Reservation) -> bool {
        match self {
            ResourceRef::Aircraft(id) => reservation.aircraft_id == *id,
            ResourceRef::Instructor(id) => reservation.instructor_id.as_deref() == Some(id),
        }
    }
}

/// A free slot or a block, authored by a resource owner or imported from an
/// external calendar sync.
///
/// For recurring entries the interval is the anchor occurrence: it fixes the
/// wall-clock time of day, and its date is the earliest date that can
/// materialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub id: String,
    pub resource_user_id: Option<String>,
    pub resource_aircraft_id: Option<String>,
    pub slot_type: SlotType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub recurrence: Option<Recurrence>,
    pub reason: Option<String>,
}

impl AvailabilityEntry {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_time >= self.end_time {
            return Err(EngineError::InvalidInterval {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    /// Whether a reservation in this status occupies its resources.
    pub fn blocks_resource(self) -> bool {
        matches!(self, ReservationStatus::Confirmed | ReservationStatus::InProgress)
    }
}

/// A booking. Never recurring, never merged with other intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub aircraft_id: String,
    pub pilot_id: String,
    pub instructor_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
}

/// Geographic position of the club's field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Per-club inputs the engine needs beyond the stored entries: where the
/// field is, which wall clock it runs on, and whether night flights are
/// allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClubContext {
    pub timezone: Tz,
    pub coordinates: Option<Coordinates>,
    pub night_flights_enabled: bool,
}
