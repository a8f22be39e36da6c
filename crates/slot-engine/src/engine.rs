//! Collaborator interfaces and the engine facade.
//!
//! The engine never talks to storage directly: rows come in through
//! [`EntryRepository`], the field position through [`LocationProvider`], and
//! club policy through [`ClubSettingsProvider`]. [`SchedulingEngine`] wires
//! fetch → resolve → check and is otherwise stateless; every method is a pure
//! function of its inputs and whatever the collaborators return at call time.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;

use crate::booking::{check_booking, generate_slots, BookingCandidate, BookingOutcome};
use crate::daylight::{operating_window, OperatingWindow};
use crate::error::Result;
use crate::model::{AvailabilityEntry, ClubContext, Coordinates, Reservation, ResourceRef};
use crate::resolver::{resolve_window, ResolvedSlot};
use crate::timegrid::SlotTime;

/// Storage-side access to availability entries and reservations.
///
/// Implementations fetch rows whose interval overlaps the range for the given
/// resource — including recurring entries whose anchor is at or before the
/// range end and whose end date has not passed. Errors propagate to the
/// caller unchanged; the engine performs no retry.
pub trait EntryRepository {
    fn fetch_availability_entries(
        &self,
        resource: &ResourceRef,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<AvailabilityEntry>>;

    fn fetch_reservations(
        &self,
        resource: &ResourceRef,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>>;
}

/// Where the club's field is, if known.
pub trait LocationProvider {
    fn coordinates(&self, club_id: &str) -> Result<Option<Coordinates>>;
}

/// Club policy switches.
pub trait ClubSettingsProvider {
    fn night_flights_enabled(&self, club_id: &str) -> Result<bool>;
}

/// The scheduling and availability engine for one club.
pub struct SchedulingEngine<R, L, S> {
    repository: R,
    location: L,
    settings: S,
    club_id: String,
    timezone: Tz,
}

impl<R, L, S> SchedulingEngine<R, L, S>
where
    R: EntryRepository,
    L: LocationProvider,
    S: ClubSettingsProvider,
{
    pub fn new(repository: R, location: L, settings: S, club_id: impl Into<String>, timezone: Tz) -> Self {
        SchedulingEngine {
            repository,
            location,
            settings,
            club_id: club_id.into(),
            timezone,
        }
    }

    fn club(&self) -> Result<ClubContext> {
        Ok(ClubContext {
            timezone: self.timezone,
            coordinates: self.location.coordinates(&self.club_id)?,
            night_flights_enabled: self.settings.night_flights_enabled(&self.club_id)?,
        })
    }

    /// Resolve the ordered slot list for a set of resources over a window.
    ///
    /// Entries targeting several of the requested resources at once (an
    /// instructor-on-aircraft constraint fetched via both axes) are counted
    /// once, keyed by id.
    pub fn resolve_availability(
        &self,
        resources: &[ResourceRef],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ResolvedSlot>> {
        let (entries, reservations) = self.fetch_axis_rows(resources, start, end)?;
        resolve_window(&entries, &reservations, start, end, self.timezone)
    }

    /// Advisory booking check over both resource axes.
    ///
    /// The storage layer's exclusion constraint is the authoritative arbiter
    /// under concurrent writers; re-run this after a rejected write to get a
    /// fresh denial reason.
    pub fn can_book(
        &self,
        candidate: &BookingCandidate,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome> {
        let club = self.club()?;

        let aircraft = ResourceRef::Aircraft(candidate.aircraft_id.clone());
        let aircraft_slots =
            self.resolve_availability(std::slice::from_ref(&aircraft), candidate.start, candidate.end)?;

        let instructor_slots = match &candidate.instructor_id {
            Some(id) => {
                let instructor = ResourceRef::Instructor(id.clone());
                self.resolve_availability(std::slice::from_ref(&instructor), candidate.start, candidate.end)?
            }
            None => Vec::new(),
        };

        let start_date = candidate.start.with_timezone(&self.timezone).date_naive();
        let window = operating_window(start_date, &club);

        check_booking(candidate, &aircraft_slots, &instructor_slots, &window, &club, now)
    }

    /// Operating window for a date under current club settings.
    pub fn operating_window(&self, date: NaiveDate) -> Result<OperatingWindow> {
        Ok(operating_window(date, &self.club()?))
    }

    /// Bookable grid points for a date, club-local.
    pub fn generate_slots(&self, date: NaiveDate, granularity_minutes: u32) -> Result<Vec<SlotTime>> {
        let window = self.operating_window(date)?;
        Ok(generate_slots(&window, granularity_minutes, self.timezone))
    }

    fn fetch_axis_rows(
        &self,
        resources: &[ResourceRef],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(Vec<AvailabilityEntry>, Vec<Reservation>)> {
        let mut entries = Vec::new();
        let mut seen_entries: HashSet<String> = HashSet::new();
        let mut reservations = Vec::new();
        let mut seen_reservations: HashSet<String> = HashSet::new();

        for resource in resources {
            for entry in self
                .repository
                .fetch_availability_entries(resource, start, end)?
            {
                if seen_entries.insert(entry.id.clone()) {
                    entries.push(entry);
                }
            }
            for reservation in self.repository.fetch_reservations(resource, start, end)? {
                if seen_reservations.insert(reservation.id.clone()) {
                    reservations.push(reservation);
                }
            }
        }

        Ok((entries, reservations))
    }
}
