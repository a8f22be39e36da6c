//! # slot-engine
//!
//! Deterministic scheduling and availability engine for aeroclub operations.
//!
//! Given availability entries, reservations, and a query window, the engine
//! decides whether a slot is bookable and resolves conflicts among one-off
//! unavailabilities, weekly recurring patterns, externally synced busy
//! periods, and confirmed reservations — across two independent resource
//! axes (aircraft and instructor). Operating hours derive from sunrise and
//! sunset at the club's field, with a configurable night-flight extension.
//!
//! The engine is a pure computation layer: it reads rows through the
//! collaborator traits in [`engine`] and never mutates storage.
//!
//! ## Modules
//!
//! - [`timegrid`] — grid snapping and half-open interval tests
//! - [`recurrence`] — weekly-by-day patterns → concrete occurrences
//! - [`merge`] — collapse externally imported busy intervals
//! - [`daylight`] — sunrise/sunset-derived operating windows
//! - [`resolver`] — entries + reservations → ordered slot list
//! - [`booking`] — conflict checks and slot-grid generation
//! - [`engine`] — collaborator traits and the per-club facade
//! - [`model`] — shared domain types
//! - [`error`] — error types

pub mod booking;
pub mod daylight;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod recurrence;
pub mod resolver;
pub mod timegrid;

pub use booking::{check_booking, generate_slots, BookingCandidate, BookingDenial, BookingOutcome};
pub use daylight::{operating_window, OperatingWindow};
pub use engine::SchedulingEngine;
pub use error::EngineError;
pub use merge::{merge_intervals, BusyInterval};
pub use model::{AvailabilityEntry, ClubContext, Reservation, ResourceRef, SlotType};
pub use recurrence::{expand_weekly, WeeklyByDay};
pub use resolver::{resolve_window, ResolvedSlot};
