//! Weekly recurrence patterns and their expansion into concrete occurrences.
//!
//! Entries repeat weekly on a fixed set of weekdays until an optional end
//! date. The textual form (`FREQ=WEEKLY;BYDAY=MO,WE`) is the only supported
//! shape, so it is parsed once at the repository boundary by a dedicated
//! parser into [`WeeklyByDay`] rather than with a general RFC 5545 library.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::timegrid::{local_to_utc, overlaps};

/// A closed weekly-by-day recurrence pattern.
///
/// Weekday membership is indexed by `Weekday::num_days_from_monday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyByDay {
    days: [bool; 7],
}

impl WeeklyByDay {
    /// Parse the textual encoding `FREQ=WEEKLY;BYDAY=MO,TU,...`.
    ///
    /// Both segments are required and may appear in either order. An empty
    /// `BYDAY=` list is accepted and expands to no occurrences.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidPattern` for any other shape: a missing
    /// segment, a frequency other than `WEEKLY`, an unknown weekday code, or
    /// an unrecognized key.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut freq_weekly = false;
        let mut days: Option<[bool; 7]> = None;

        for segment in pattern.split(';') {
            let segment = segment.trim();
            let Some((key, value)) = segment.split_once('=') else {
                return Err(EngineError::InvalidPattern(format!(
                    "segment without '=': {segment:?}"
                )));
            };
            match key {
                "FREQ" => {
                    if value != "WEEKLY" {
                        return Err(EngineError::InvalidPattern(format!(
                            "unsupported frequency {value:?}, only WEEKLY is supported"
                        )));
                    }
                    freq_weekly = true;
                }
                "BYDAY" => {
                    let mut set = [false; 7];
                    for code in value.split(',').filter(|c| !c.is_empty()) {
                        let weekday = parse_weekday(code)?;
                        set[weekday.num_days_from_monday() as usize] = true;
                    }
                    days = Some(set);
                }
                other => {
                    return Err(EngineError::InvalidPattern(format!(
                        "unknown key {other:?}"
                    )));
                }
            }
        }

        match (freq_weekly, days) {
            (true, Some(days)) => Ok(WeeklyByDay { days }),
            (false, _) => Err(EngineError::InvalidPattern(
                "missing FREQ=WEEKLY segment".to_string(),
            )),
            (true, None) => Err(EngineError::InvalidPattern(
                "missing BYDAY segment".to_string(),
            )),
        }
    }

    /// Build a pattern directly from a set of weekdays.
    pub fn from_weekdays(weekdays: &[Weekday]) -> Self {
        let mut days = [false; 7];
        for w in weekdays {
            days[w.num_days_from_monday() as usize] = true;
        }
        WeeklyByDay { days }
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn is_empty(&self) -> bool {
        !self.days.iter().any(|&d| d)
    }
}

fn parse_weekday(code: &str) -> Result<Weekday> {
    match code {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(EngineError::InvalidPattern(format!(
            "unknown weekday code {other:?}"
        ))),
    }
}

/// Recurrence settings of an availability entry: the weekly pattern plus an
/// optional inclusive end date (club-local).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub pattern: WeeklyByDay,
    pub end_date: Option<NaiveDate>,
}

/// One materialized instance of a recurring entry on a specific date.
///
/// Derived per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Club-local date the occurrence falls on.
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Expand a weekly recurrence into the occurrences intersecting a query range.
///
/// The anchor interval supplies the wall-clock start time and duration shared
/// by all occurrences; its club-local date is the earliest date that can
/// materialize. Candidate dates cover every club-local day touched by
/// `[query_start, query_end)`, and a synthesized occurrence is kept only when
/// its own interval overlaps the query range — a matching weekday near the
/// boundary can still fall entirely outside it.
///
/// An empty pattern or an end date before the anchor date yields an empty
/// list, not an error.
pub fn expand_weekly(
    recurrence: &Recurrence,
    anchor_start: DateTime<Utc>,
    anchor_end: DateTime<Utc>,
    query_start: DateTime<Utc>,
    query_end: DateTime<Utc>,
    tz: Tz,
) -> Vec<Occurrence> {
    if recurrence.pattern.is_empty() || query_start >= query_end {
        return Vec::new();
    }

    let duration = anchor_end - anchor_start;
    let anchor_local = anchor_start.with_timezone(&tz);
    let anchor_date = anchor_local.date_naive();
    let start_of_day = anchor_local.time();

    let first = query_start.with_timezone(&tz).date_naive();
    let last = query_end.with_timezone(&tz).date_naive();

    let mut occurrences = Vec::new();
    let mut date = first;
    while date <= last {
        if recurrence.pattern.contains(date.weekday())
            && date >= anchor_date
            && recurrence.end_date.is_none_or(|until| date <= until)
        {
            let start = local_to_utc(date.and_time(start_of_day), tz);
            let end = start + duration;
            if overlaps(start, end, query_start, query_end) {
                occurrences.push(Occurrence { date, start, end });
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }

    occurrences
}
