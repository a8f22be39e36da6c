//! Busy-interval merging for externally synced calendars.
//!
//! Sorts intervals by start time and sweeps once, coalescing any pair that
//! overlaps or touches. Touching counts on purpose: back-to-back imports from
//! the same calendar should collapse into one block. The routine is
//! idempotent — merging an already-merged set returns it unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A busy interval with an optional human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reason: Option<String>,
}

impl BusyInterval {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: Option<String>,
    ) -> Self {
        BusyInterval { start, end, reason }
    }
}

/// Merge an unordered set of busy intervals into the minimal sorted
/// non-overlapping equivalent.
///
/// When two intervals coalesce, differing reasons concatenate with `" + "`;
/// an incoming reason identical to the accumulated one is dropped instead of
/// producing `"X + X"`.
///
/// # Errors
/// Returns `EngineError::InvalidInterval` if any input has `start >= end`.
/// Malformed intervals are rejected, never coerced.
pub fn merge_intervals(intervals: &[BusyInterval]) -> Result<Vec<BusyInterval>> {
    for interval in intervals {
        if interval.start >= interval.end {
            return Err(EngineError::InvalidInterval {
                start: interval.start,
                end: interval.end,
            });
        }
    }

    let mut sorted: Vec<BusyInterval> = intervals.to_vec();
    sorted.sort_by_key(|i| (i.start, i.end));

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            // Touching counts as overlapping here.
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
                last.reason = combine_reasons(last.reason.take(), interval.reason);
            }
            _ => merged.push(interval),
        }
    }

    Ok(merged)
}

fn combine_reasons(accumulated: Option<String>, incoming: Option<String>) -> Option<String> {
    match (accumulated, incoming) {
        (Some(acc), Some(inc)) => {
            if acc == inc {
                Some(acc)
            } else {
                Some(format!("{acc} + {inc}"))
            }
        }
        (Some(acc), None) => Some(acc),
        (None, other) => other,
    }
}
