//! Tests for the conflict check and slot-grid generation, driven through the
//! engine facade with an in-memory repository.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use slot_engine::booking::{BookingCandidate, BookingDenial, BookingOutcome};
use slot_engine::engine::{ClubSettingsProvider, EntryRepository, LocationProvider, SchedulingEngine};
use slot_engine::error::Result;
use slot_engine::model::{
    AvailabilityEntry, Coordinates, Reservation, ReservationStatus, ResourceRef, SlotType,
};
use slot_engine::timegrid::SlotTime;

// ── In-memory collaborators ─────────────────────────────────────────────────

#[derive(Default)]
struct InMemoryRepo {
    entries: Vec<AvailabilityEntry>,
    reservations: Vec<Reservation>,
}

impl EntryRepository for InMemoryRepo {
    fn fetch_availability_entries(
        &self,
        resource: &ResourceRef,
        _range_start: DateTime<Utc>,
        _range_end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| resource.matches_entry(e))
            .cloned()
            .collect())
    }

    fn fetch_reservations(
        &self,
        resource: &ResourceRef,
        _range_start: DateTime<Utc>,
        _range_end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| resource.matches_reservation(r))
            .cloned()
            .collect())
    }
}

struct FixedLocation(Option<Coordinates>);

impl LocationProvider for FixedLocation {
    fn coordinates(&self, _club_id: &str) -> Result<Option<Coordinates>> {
        Ok(self.0)
    }
}

struct FixedSettings {
    night_flights: bool,
}

impl ClubSettingsProvider for FixedSettings {
    fn night_flights_enabled(&self, _club_id: &str) -> Result<bool> {
        Ok(self.night_flights)
    }
}

fn engine(
    repo: InMemoryRepo,
    night_flights: bool,
) -> SchedulingEngine<InMemoryRepo, FixedLocation, FixedSettings> {
    SchedulingEngine::new(
        repo,
        FixedLocation(None),
        FixedSettings { night_flights },
        "club-1",
        Tz::UTC,
    )
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

fn aircraft_block(start: DateTime<Utc>, end: DateTime<Utc>) -> AvailabilityEntry {
    AvailabilityEntry {
        id: "block-1".to_string(),
        resource_user_id: None,
        resource_aircraft_id: Some("F-BXYZ".to_string()),
        slot_type: SlotType::Unavailable,
        start_time: start,
        end_time: end,
        recurrence: None,
        reason: Some("Maintenance".to_string()),
    }
}

fn instructor_block(start: DateTime<Utc>, end: DateTime<Utc>) -> AvailabilityEntry {
    AvailabilityEntry {
        id: "block-2".to_string(),
        resource_user_id: Some("instructor-1".to_string()),
        resource_aircraft_id: None,
        slot_type: SlotType::Unavailable,
        start_time: start,
        end_time: end,
        recurrence: None,
        reason: Some("Ground school".to_string()),
    }
}

fn candidate(start: DateTime<Utc>, end: DateTime<Utc>, instructor: Option<&str>) -> BookingCandidate {
    BookingCandidate {
        aircraft_id: "F-BXYZ".to_string(),
        instructor_id: instructor.map(String::from),
        start,
        end,
    }
}

// `now` well before the test day, so the past-time rule stays out of the way.
fn now() -> DateTime<Utc> {
    at(1, 12, 0)
}

// ── Conflict detection ──────────────────────────────────────────────────────

#[test]
fn booking_inside_aircraft_block_is_refused() {
    let repo = InMemoryRepo {
        entries: vec![aircraft_block(at(5, 8, 0), at(5, 12, 0))],
        ..Default::default()
    };
    let engine = engine(repo, false);

    let outcome = engine
        .can_book(&candidate(at(5, 10, 0), at(5, 11, 0), None), now())
        .unwrap();

    match outcome {
        BookingOutcome::Denied(BookingDenial::AircraftConflict { conflicting }) => {
            assert_eq!(conflicting.start, at(5, 8, 0));
            assert_eq!(conflicting.end, at(5, 12, 0));
            assert_eq!(conflicting.reason.as_deref(), Some("Maintenance"));
        }
        other => panic!("expected aircraft conflict, got {other:?}"),
    }
}

#[test]
fn booking_after_the_block_succeeds() {
    let repo = InMemoryRepo {
        entries: vec![aircraft_block(at(5, 8, 0), at(5, 12, 0))],
        ..Default::default()
    };
    let engine = engine(repo, false);

    let outcome = engine
        .can_book(&candidate(at(5, 13, 0), at(5, 14, 0), None), now())
        .unwrap();

    assert!(outcome.is_accepted());
}

#[test]
fn booking_touching_the_block_boundary_succeeds() {
    let repo = InMemoryRepo {
        entries: vec![aircraft_block(at(5, 8, 0), at(5, 12, 0))],
        ..Default::default()
    };
    let engine = engine(repo, false);

    // [12:00, 13:00) touches [08:00, 12:00) — half-open, no overlap.
    let outcome = engine
        .can_book(&candidate(at(5, 12, 0), at(5, 13, 0), None), now())
        .unwrap();

    assert!(outcome.is_accepted());
}

#[test]
fn existing_reservation_blocks_the_aircraft() {
    let repo = InMemoryRepo {
        reservations: vec![Reservation {
            id: "res-1".to_string(),
            aircraft_id: "F-BXYZ".to_string(),
            pilot_id: "pilot-2".to_string(),
            instructor_id: None,
            start_time: at(5, 10, 0),
            end_time: at(5, 11, 0),
            status: ReservationStatus::Confirmed,
        }],
        ..Default::default()
    };
    let engine = engine(repo, false);

    let outcome = engine
        .can_book(&candidate(at(5, 10, 30), at(5, 11, 30), None), now())
        .unwrap();

    match outcome {
        BookingOutcome::Denied(BookingDenial::AircraftConflict { conflicting }) => {
            assert_eq!(conflicting.slot_type, SlotType::Reservation);
            assert_eq!(conflicting.reservation_id.as_deref(), Some("res-1"));
        }
        other => panic!("expected aircraft conflict, got {other:?}"),
    }
}

#[test]
fn instructor_conflict_is_reported_when_aircraft_is_free() {
    let repo = InMemoryRepo {
        entries: vec![instructor_block(at(5, 9, 0), at(5, 12, 0))],
        ..Default::default()
    };
    let engine = engine(repo, false);

    let outcome = engine
        .can_book(&candidate(at(5, 10, 0), at(5, 11, 0), Some("instructor-1")), now())
        .unwrap();

    match outcome {
        BookingOutcome::Denied(BookingDenial::InstructorConflict { conflicting }) => {
            assert_eq!(conflicting.reason.as_deref(), Some("Ground school"));
        }
        other => panic!("expected instructor conflict, got {other:?}"),
    }
}

#[test]
fn aircraft_conflict_wins_when_both_axes_are_blocked() {
    let repo = InMemoryRepo {
        entries: vec![
            aircraft_block(at(5, 8, 0), at(5, 12, 0)),
            instructor_block(at(5, 8, 0), at(5, 12, 0)),
        ],
        ..Default::default()
    };
    let engine = engine(repo, false);

    let outcome = engine
        .can_book(&candidate(at(5, 10, 0), at(5, 11, 0), Some("instructor-1")), now())
        .unwrap();

    assert!(matches!(
        outcome,
        BookingOutcome::Denied(BookingDenial::AircraftConflict { .. })
    ));
}

#[test]
fn available_entries_do_not_block() {
    let mut open_slot = aircraft_block(at(5, 8, 0), at(5, 18, 0));
    open_slot.slot_type = SlotType::Available;
    open_slot.reason = None;
    let repo = InMemoryRepo {
        entries: vec![open_slot],
        ..Default::default()
    };
    let engine = engine(repo, false);

    let outcome = engine
        .can_book(&candidate(at(5, 10, 0), at(5, 11, 0), None), now())
        .unwrap();

    assert!(outcome.is_accepted());
}

// ── Operating hours and clock ───────────────────────────────────────────────

#[test]
fn booking_before_opening_is_outside_operating_hours() {
    let engine = engine(InMemoryRepo::default(), false);

    // Fallback window is [07:00, 18:00).
    let outcome = engine
        .can_book(&candidate(at(5, 5, 0), at(5, 6, 0), None), now())
        .unwrap();

    match outcome {
        BookingOutcome::Denied(BookingDenial::OutsideOperatingHours { window_start, window_end }) => {
            assert_eq!(window_start, at(5, 7, 0));
            assert_eq!(window_end, at(5, 18, 0));
        }
        other => panic!("expected operating-hours denial, got {other:?}"),
    }
}

#[test]
fn booking_running_past_close_is_outside_operating_hours() {
    let engine = engine(InMemoryRepo::default(), false);

    let outcome = engine
        .can_book(&candidate(at(5, 17, 0), at(5, 19, 0), None), now())
        .unwrap();

    assert!(matches!(
        outcome,
        BookingOutcome::Denied(BookingDenial::OutsideOperatingHours { .. })
    ));
}

#[test]
fn booking_ending_exactly_at_close_is_allowed() {
    let engine = engine(InMemoryRepo::default(), false);

    let outcome = engine
        .can_book(&candidate(at(5, 17, 0), at(5, 18, 0), None), now())
        .unwrap();

    assert!(outcome.is_accepted());
}

#[test]
fn night_flights_lift_the_operating_hours_check() {
    let engine = engine(InMemoryRepo::default(), true);

    let outcome = engine
        .can_book(&candidate(at(5, 19, 0), at(5, 20, 0), None), now())
        .unwrap();

    assert!(outcome.is_accepted());
}

#[test]
fn same_day_past_start_is_refused() {
    let engine = engine(InMemoryRepo::default(), false);
    let now = at(5, 12, 0);

    let outcome = engine
        .can_book(&candidate(at(5, 9, 0), at(5, 10, 0), None), now)
        .unwrap();

    assert_eq!(outcome, BookingOutcome::Denied(BookingDenial::PastTimeSlot));
}

#[test]
fn past_rule_applies_only_to_the_current_day() {
    let engine = engine(InMemoryRepo::default(), false);
    let now = at(6, 12, 0);

    // Starts on a previous calendar day: the same-day past rule stays silent.
    let outcome = engine
        .can_book(&candidate(at(5, 9, 0), at(5, 10, 0), None), now)
        .unwrap();

    assert!(outcome.is_accepted());
}

#[test]
fn later_today_is_bookable() {
    let engine = engine(InMemoryRepo::default(), false);
    let now = at(5, 9, 0);

    let outcome = engine
        .can_book(&candidate(at(5, 14, 0), at(5, 15, 0), None), now)
        .unwrap();

    assert!(outcome.is_accepted());
}

// ── Input validation ────────────────────────────────────────────────────────

#[test]
fn empty_aircraft_id_is_a_hard_error() {
    let engine = engine(InMemoryRepo::default(), false);
    let mut bad = candidate(at(5, 10, 0), at(5, 11, 0), None);
    bad.aircraft_id = String::new();

    assert!(engine.can_book(&bad, now()).is_err());
}

#[test]
fn inverted_candidate_interval_is_a_hard_error() {
    let engine = engine(InMemoryRepo::default(), false);
    let bad = candidate(at(5, 11, 0), at(5, 10, 0), None);

    assert!(engine.can_book(&bad, now()).is_err());
}

// ── Slot grid ───────────────────────────────────────────────────────────────

#[test]
fn slot_grid_covers_the_fallback_window_inclusive() {
    let engine = engine(InMemoryRepo::default(), false);
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    let slots = engine.generate_slots(date, 15).unwrap();

    // [07:00, 18:00] at 15-minute steps, both bounds included.
    assert_eq!(slots.len(), 45);
    assert_eq!(slots.first(), Some(&SlotTime { hour: 7, minute: 0 }));
    assert_eq!(slots.last(), Some(&SlotTime { hour: 18, minute: 0 }));
    assert!(slots.windows(2).all(|w| {
        let a = w[0].hour * 60 + w[0].minute;
        let b = w[1].hour * 60 + w[1].minute;
        b == a + 15
    }));
}

#[test]
fn slot_grid_respects_night_flight_extension() {
    let engine = engine(InMemoryRepo::default(), true);
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    let slots = engine.generate_slots(date, 15).unwrap();
    assert_eq!(slots.last(), Some(&SlotTime { hour: 21, minute: 0 }));
}

#[test]
fn slot_grid_supports_other_granularities() {
    let engine = engine(InMemoryRepo::default(), false);
    let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

    let slots = engine.generate_slots(date, 30).unwrap();
    assert_eq!(slots.len(), 23);
}
