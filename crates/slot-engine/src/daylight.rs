//! Aeronautical operating window derived from sunrise and sunset.
//!
//! The legal window for a day runs from 30 minutes before sunrise to
//! 30 minutes after sunset, snapped outward onto the booking grid. With night
//! flights enabled the window additionally extends to fixed wall-clock bounds.
//! Clubs without usable coordinates fall back to fixed bounds entirely —
//! location data is optional, so degraded inputs degrade the window rather
//! than fail the query.
//!
//! Sunrise and sunset come from the standard NOAA solar-position equations,
//! evaluated for the club-local noon of the requested date to avoid
//! day-boundary timezone artifacts.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::ClubContext;
use crate::timegrid::{local_to_utc, snap_to_grid, SnapDirection, GRID_MINUTES};

/// Civil-twilight margin applied on both sides of sunrise/sunset.
pub const TWILIGHT_MARGIN_MINUTES: i64 = 30;

const FALLBACK_OPEN: NaiveTime = NaiveTime::from_hms_opt(7, 0, 0).unwrap();
const FALLBACK_CLOSE: NaiveTime = NaiveTime::from_hms_opt(18, 0, 0).unwrap();
const NIGHT_CLOSE: NaiveTime = NaiveTime::from_hms_opt(21, 0, 0).unwrap();

/// The operating window of one calendar day at one location.
///
/// `day_start`/`day_end` are the daylight bounds used for day/night
/// classification; `window_start`/`window_end` are the bookable bounds, which
/// extend past the daylight bounds when night flights are enabled. All four
/// are grid-aligned. The raw sunrise/sunset instants are kept for display and
/// are `None` when the fixed fallback applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingWindow {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub day_start: DateTime<Utc>,
    pub day_end: DateTime<Utc>,
    pub civil_sunrise: Option<DateTime<Utc>>,
    pub civil_sunset: Option<DateTime<Utc>>,
}

impl OperatingWindow {
    /// Classify an instant as night: before the daylight bounds or past them.
    pub fn is_night(&self, instant: DateTime<Utc>) -> bool {
        instant < self.day_start || instant >= self.day_end
    }

    /// Whether this grid slot is the first night slot after daylight — the
    /// one that gets the single dusk marker in planner UIs.
    pub fn is_first_night_slot(&self, instant: DateTime<Utc>, granularity_minutes: u32) -> bool {
        self.is_night(instant)
            && !self.is_night(instant - Duration::minutes(i64::from(granularity_minutes)))
    }
}

/// Compute the operating window for a date at a club.
///
/// Missing or out-of-range coordinates, and polar dates where the sun never
/// crosses the horizon, all fall back to the fixed bounds: club-local
/// `[07:00, 18:00)`, or `[07:00, 21:00)` with night flights enabled.
pub fn operating_window(date: NaiveDate, club: &ClubContext) -> OperatingWindow {
    let tz = club.timezone;

    let solar = club.coordinates.and_then(|coords| {
        if !coords.is_valid() {
            warn!(
                "coordinates ({}, {}) out of range, using fixed operating bounds",
                coords.latitude, coords.longitude
            );
            return None;
        }
        let solution = sunrise_sunset(date, coords.latitude, coords.longitude, tz);
        if solution.is_none() {
            warn!(
                "no sunrise/sunset on {} at ({}, {}), using fixed operating bounds",
                date, coords.latitude, coords.longitude
            );
        }
        solution
    });

    match solar {
        Some((sunrise, sunset)) => {
            let margin = Duration::minutes(TWILIGHT_MARGIN_MINUTES);
            let day_start = snap_to_grid(sunrise - margin, GRID_MINUTES, SnapDirection::Floor);
            let day_end = snap_to_grid(sunset + margin, GRID_MINUTES, SnapDirection::Ceil);

            let (window_start, window_end) = if club.night_flights_enabled {
                let open = local_to_utc(date.and_time(FALLBACK_OPEN), tz);
                let close = local_to_utc(date.and_time(NIGHT_CLOSE), tz);
                (day_start.min(open), day_end.max(close))
            } else {
                (day_start, day_end)
            };

            OperatingWindow {
                window_start,
                window_end,
                day_start,
                day_end,
                civil_sunrise: Some(sunrise),
                civil_sunset: Some(sunset),
            }
        }
        None => {
            let open = local_to_utc(date.and_time(FALLBACK_OPEN), tz);
            let day_end = local_to_utc(date.and_time(FALLBACK_CLOSE), tz);
            let window_end = if club.night_flights_enabled {
                local_to_utc(date.and_time(NIGHT_CLOSE), tz)
            } else {
                day_end
            };

            OperatingWindow {
                window_start: open,
                window_end,
                day_start: open,
                day_end,
                civil_sunrise: None,
                civil_sunset: None,
            }
        }
    }
}

/// Sunrise and sunset instants for a date at the given position, or `None`
/// when the equation has no solution (midnight sun / polar night).
///
/// NOAA solar-position method: mean solar time and anomaly, equation of
/// center, ecliptic longitude, then the hour angle at the standard
/// -0.833° altitude (refraction plus solar radius).
fn sunrise_sunset(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
    tz: Tz,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let noon = local_to_utc(date.and_time(NaiveTime::from_hms_opt(12, 0, 0)?), tz);
    let julian = noon.timestamp() as f64 / 86_400.0 + 2_440_587.5;

    // Whole days since the J2000 epoch, anchored at the club's local noon.
    let days = (julian - 2_451_545.0 + 0.0009).round();
    let mean_solar_noon = days - longitude / 360.0;

    let mean_anomaly = (357.5291 + 0.985_600_28 * mean_solar_noon).rem_euclid(360.0);
    let center = 1.9148 * sin_deg(mean_anomaly)
        + 0.0200 * sin_deg(2.0 * mean_anomaly)
        + 0.0003 * sin_deg(3.0 * mean_anomaly);
    let ecliptic_longitude = (mean_anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);

    let transit = 2_451_545.0 + mean_solar_noon + 0.0053 * sin_deg(mean_anomaly)
        - 0.0069 * sin_deg(2.0 * ecliptic_longitude);

    let sin_declination = sin_deg(ecliptic_longitude) * sin_deg(23.4397);
    let cos_declination = (1.0 - sin_declination * sin_declination).sqrt();

    let cos_hour_angle = (sin_deg(-0.833) - sin_deg(latitude) * sin_declination)
        / (cos_deg(latitude) * cos_declination);
    if !(-1.0..=1.0).contains(&cos_hour_angle) {
        return None;
    }
    let hour_angle = cos_hour_angle.acos().to_degrees();

    let rise = julian_to_utc(transit - hour_angle / 360.0)?;
    let set = julian_to_utc(transit + hour_angle / 360.0)?;
    Some((rise, set))
}

fn julian_to_utc(julian: f64) -> Option<DateTime<Utc>> {
    let unix_seconds = (julian - 2_440_587.5) * 86_400.0;
    DateTime::<Utc>::from_timestamp(unix_seconds.round() as i64, 0)
}

fn sin_deg(degrees: f64) -> f64 {
    degrees.to_radians().sin()
}

fn cos_deg(degrees: f64) -> f64 {
    degrees.to_radians().cos()
}
