//! Availability resolution for a query window.
//!
//! Composes the recurrence expander and the interval merger over materialized
//! inputs: one-off entries pass through, recurring entries expand into their
//! occurrences, externally synced entries collapse per resource, and blocking
//! reservations become synthetic slots. The result is an ordered slot list,
//! deterministic for identical inputs so callers can cache and diff it.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::merge::{merge_intervals, BusyInterval};
use crate::model::{AvailabilityEntry, Reservation, SlotType};
use crate::recurrence::expand_weekly;
use crate::timegrid::overlaps;

/// Reason prefix marking entries imported by a calendar sync. Only these are
/// merge-eligible; locally authored entries keep individual authorship.
pub const EXTERNAL_REASON_PREFIX: &str = "[External]";

/// One resolved slot in a query window.
///
/// Reservation slots keep their reservation id so ownership checks and UI
/// highlighting can point at the exact blocking booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSlot {
    pub slot_type: SlotType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resource_user_id: Option<String>,
    pub resource_aircraft_id: Option<String>,
    pub reason: Option<String>,
    pub reservation_id: Option<String>,
}

impl ResolvedSlot {
    /// Whether this slot blocks a booking on its resource.
    pub fn blocks(&self) -> bool {
        matches!(self.slot_type, SlotType::Unavailable | SlotType::Reservation)
    }
}

/// Resolve the ordered slot list for a query window from materialized rows.
///
/// Read-only and side-effect-free: identical inputs produce byte-identical
/// output. Fetching the rows for the right resources is the caller's job
/// (see [`crate::engine::SchedulingEngine`]).
///
/// # Errors
/// Returns `EngineError::InvalidInterval` for a malformed query range or any
/// entry with `start >= end`.
pub fn resolve_window(
    entries: &[AvailabilityEntry],
    reservations: &[Reservation],
    query_start: DateTime<Utc>,
    query_end: DateTime<Utc>,
    tz: Tz,
) -> Result<Vec<ResolvedSlot>> {
    if query_start >= query_end {
        return Err(EngineError::InvalidInterval {
            start: query_start,
            end: query_end,
        });
    }

    let mut local = Vec::new();
    let mut external = Vec::new();

    for entry in entries {
        entry.validate()?;
        let bucket: &mut Vec<ResolvedSlot> = if entry
            .reason
            .as_deref()
            .is_some_and(|r| r.starts_with(EXTERNAL_REASON_PREFIX))
        {
            &mut external
        } else {
            &mut local
        };

        match &entry.recurrence {
            Some(recurrence) => {
                for occurrence in expand_weekly(
                    recurrence,
                    entry.start_time,
                    entry.end_time,
                    query_start,
                    query_end,
                    tz,
                ) {
                    bucket.push(ResolvedSlot {
                        slot_type: entry.slot_type,
                        start: occurrence.start,
                        end: occurrence.end,
                        resource_user_id: entry.resource_user_id.clone(),
                        resource_aircraft_id: entry.resource_aircraft_id.clone(),
                        reason: entry.reason.clone(),
                        reservation_id: None,
                    });
                }
            }
            None => {
                if overlaps(entry.start_time, entry.end_time, query_start, query_end) {
                    bucket.push(ResolvedSlot {
                        slot_type: entry.slot_type,
                        start: entry.start_time,
                        end: entry.end_time,
                        resource_user_id: entry.resource_user_id.clone(),
                        resource_aircraft_id: entry.resource_aircraft_id.clone(),
                        reason: entry.reason.clone(),
                        reservation_id: None,
                    });
                }
            }
        }
    }

    let mut slots = local;
    slots.extend(merge_external(external)?);

    for reservation in reservations {
        if !reservation.status.blocks_resource() {
            continue;
        }
        if overlaps(
            reservation.start_time,
            reservation.end_time,
            query_start,
            query_end,
        ) {
            slots.push(ResolvedSlot {
                slot_type: SlotType::Reservation,
                start: reservation.start_time,
                end: reservation.end_time,
                resource_user_id: reservation.instructor_id.clone(),
                resource_aircraft_id: Some(reservation.aircraft_id.clone()),
                reason: None,
                reservation_id: Some(reservation.id.clone()),
            });
        }
    }

    // Stable sort: ties keep the deterministic construction order.
    slots.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
    Ok(slots)
}

/// Collapse externally synced slots per resource and slot type, so a noisy
/// sync never floods the planner with stacked duplicates.
fn merge_external(slots: Vec<ResolvedSlot>) -> Result<Vec<ResolvedSlot>> {
    let mut groups: Vec<(GroupKey, Vec<BusyInterval>)> = Vec::new();

    for slot in &slots {
        let key = GroupKey {
            resource_user_id: slot.resource_user_id.clone(),
            resource_aircraft_id: slot.resource_aircraft_id.clone(),
            slot_type: slot.slot_type,
        };
        let interval = BusyInterval::new(slot.start, slot.end, slot.reason.clone());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, intervals)) => intervals.push(interval),
            None => groups.push((key, vec![interval])),
        }
    }

    let mut merged = Vec::new();
    for (key, intervals) in groups {
        for interval in merge_intervals(&intervals)? {
            merged.push(ResolvedSlot {
                slot_type: key.slot_type,
                start: interval.start,
                end: interval.end,
                resource_user_id: key.resource_user_id.clone(),
                resource_aircraft_id: key.resource_aircraft_id.clone(),
                reason: interval.reason,
                reservation_id: None,
            });
        }
    }
    Ok(merged)
}

#[derive(PartialEq, Eq)]
struct GroupKey {
    resource_user_id: Option<String>,
    resource_aircraft_id: Option<String>,
    slot_type: SlotType,
}
