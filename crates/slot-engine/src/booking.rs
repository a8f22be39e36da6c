//! Booking conflict checks and slot-grid generation.
//!
//! The conflict check is advisory: at-most-one reservation per (resource,
//! instant) cell is ultimately enforced by the storage layer's exclusion
//! constraint, and callers must re-run the check when a write loses that
//! race. Checks run in a fixed order and return on the first failure —
//! aircraft before instructor before operating hours before past time,
//! matching the priority a dispatcher wants: "is the plane free" first.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::daylight::OperatingWindow;
use crate::error::{EngineError, Result};
use crate::model::ClubContext;
use crate::resolver::ResolvedSlot;
use crate::timegrid::{overlaps, SlotTime};

/// A reservation attempt to validate before it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCandidate {
    pub aircraft_id: String,
    pub instructor_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Why a candidate was refused. Conflicts carry the exact blocking slot so a
/// UI can highlight it, not just say "no".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingDenial {
    AircraftConflict { conflicting: ResolvedSlot },
    InstructorConflict { conflicting: ResolvedSlot },
    OutsideOperatingHours {
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    },
    PastTimeSlot,
}

/// Outcome of a booking check. Denials are expected, user-facing results,
/// not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "denial", rename_all = "snake_case")]
pub enum BookingOutcome {
    Accepted,
    Denied(BookingDenial),
}

impl BookingOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BookingOutcome::Accepted)
    }
}

/// Check a candidate against both resource axes, the operating window, and
/// the clock.
///
/// `aircraft_slots` and `instructor_slots` are the resolved slot lists for
/// the candidate's window on each axis; `window` is the operating window of
/// the candidate's club-local start date. `now` is an explicit input so the
/// check stays a pure function.
///
/// The past-time rule only applies to candidates starting on the current
/// club-local calendar day.
///
/// # Errors
/// `EngineError::MissingResource` for an empty aircraft id and
/// `EngineError::InvalidInterval` for `start >= end` — programmer errors,
/// unlike the typed denials.
pub fn check_booking(
    candidate: &BookingCandidate,
    aircraft_slots: &[ResolvedSlot],
    instructor_slots: &[ResolvedSlot],
    window: &OperatingWindow,
    club: &ClubContext,
    now: DateTime<Utc>,
) -> Result<BookingOutcome> {
    if candidate.aircraft_id.is_empty() {
        return Err(EngineError::MissingResource);
    }
    if candidate.start >= candidate.end {
        return Err(EngineError::InvalidInterval {
            start: candidate.start,
            end: candidate.end,
        });
    }

    if let Some(conflicting) = first_blocking(aircraft_slots, candidate) {
        return Ok(BookingOutcome::Denied(BookingDenial::AircraftConflict {
            conflicting: conflicting.clone(),
        }));
    }

    if candidate.instructor_id.is_some() {
        if let Some(conflicting) = first_blocking(instructor_slots, candidate) {
            return Ok(BookingOutcome::Denied(BookingDenial::InstructorConflict {
                conflicting: conflicting.clone(),
            }));
        }
    }

    if !club.night_flights_enabled
        && !(window.window_start <= candidate.start && candidate.end <= window.window_end)
    {
        return Ok(BookingOutcome::Denied(BookingDenial::OutsideOperatingHours {
            window_start: window.window_start,
            window_end: window.window_end,
        }));
    }

    let today = now.with_timezone(&club.timezone).date_naive();
    let candidate_day = candidate.start.with_timezone(&club.timezone).date_naive();
    if candidate_day == today && candidate.start < now {
        return Ok(BookingOutcome::Denied(BookingDenial::PastTimeSlot));
    }

    Ok(BookingOutcome::Accepted)
}

fn first_blocking<'a>(
    slots: &'a [ResolvedSlot],
    candidate: &BookingCandidate,
) -> Option<&'a ResolvedSlot> {
    slots
        .iter()
        .find(|slot| slot.blocks() && overlaps(slot.start, slot.end, candidate.start, candidate.end))
}

/// Generate the bookable grid for an operating window: every grid point
/// between the window bounds inclusive, as club-local wall-clock times.
///
/// Pure and restartable; recompute per render since the window moves with
/// date and coordinates.
///
/// # Panics
/// Panics if `granularity_minutes` is zero.
pub fn generate_slots(
    window: &OperatingWindow,
    granularity_minutes: u32,
    tz: chrono_tz::Tz,
) -> Vec<SlotTime> {
    assert!(granularity_minutes > 0, "granularity must be positive");
    let step = Duration::minutes(i64::from(granularity_minutes));

    let mut slots = Vec::new();
    let mut instant = window.window_start;
    while instant <= window.window_end {
        let local = instant.with_timezone(&tz);
        slots.push(SlotTime {
            hour: local.hour(),
            minute: local.minute(),
        });
        instant += step;
    }
    slots
}
