//! Grid-aligned time arithmetic.
//!
//! The booking grid runs on a fixed granularity ([`GRID_MINUTES`]). Everything
//! here is a total function over instants; interval arguments are half-open
//! `[start, end)` throughout the engine, so touching endpoints never overlap.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Booking grid granularity in minutes.
pub const GRID_MINUTES: u32 = 15;

/// Direction to round when snapping an instant onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapDirection {
    Floor,
    Ceil,
}

/// A wall-clock grid point, as rendered in a day planner column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTime {
    pub hour: u32,
    pub minute: u32,
}

/// Round an instant to the nearest grid boundary in the given direction.
///
/// Instants already on the grid are returned unchanged in both directions.
///
/// # Panics
/// Panics if `granularity_minutes` is zero (programmer error, not input data).
pub fn snap_to_grid(
    instant: DateTime<Utc>,
    granularity_minutes: u32,
    direction: SnapDirection,
) -> DateTime<Utc> {
    assert!(granularity_minutes > 0, "granularity must be positive");
    let grid = i64::from(granularity_minutes) * 60;
    let rem = instant.timestamp().rem_euclid(grid);
    match direction {
        SnapDirection::Floor => instant - Duration::seconds(rem),
        SnapDirection::Ceil => {
            if rem == 0 {
                instant
            } else {
                instant + Duration::seconds(grid - rem)
            }
        }
    }
}

/// Half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
///
/// Touching endpoints (one interval ends exactly where the other starts) do
/// not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Half-open containment of an instant in `[window_start, window_end)`.
pub fn contains(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    instant: DateTime<Utc>,
) -> bool {
    window_start <= instant && instant < window_end
}

/// Resolve a club-local wall-clock time to a UTC instant.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant. Local
/// times inside a DST gap are shifted forward an hour, keeping wall-clock
/// semantics for recurring entries.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) => dt.with_timezone(&Utc),
                LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
                // Two adjacent gaps do not occur in the IANA database.
                LocalResult::None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}
