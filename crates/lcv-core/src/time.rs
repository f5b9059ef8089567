//! Julian Date arithmetic and calendar conversions
//!
//! The time axis of every light curve is the Julian Date, a continuous
//! fractional day count. Conversions to and from calendar time are linear
//! offsets from fixed epochs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Julian Date of the J2000.0 epoch (2000-01-01 00:00 UTC).
pub const JD_J2000: f64 = 2_451_544.5;

/// Julian Date of the Unix epoch (1970-01-01 00:00 UTC).
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;

/// Earliest instant accepted anywhere in the pipeline (1800-01-01 00:00 UTC).
pub const JD_EARLIEST: f64 = 2_378_496.5;

/// Seconds per (Julian) day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a UTC date-time to Julian Date.
pub fn jd_from_datetime_utc(datetime_utc: DateTime<Utc>) -> f64 {
    let seconds = datetime_utc.timestamp() as f64
        + f64::from(datetime_utc.timestamp_subsec_millis()) / 1_000.0;
    JD_UNIX_EPOCH + seconds / SECONDS_PER_DAY
}

/// Julian Date of the present moment per the system clock.
pub fn jd_now() -> f64 {
    jd_from_datetime_utc(Utc::now())
}

/// Convert a Julian Date back to a UTC date-time.
///
/// Returns `None` for values that are not finite representable instants.
pub fn datetime_utc_from_jd(jd: f64) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let seconds = (jd - JD_UNIX_EPOCH) * SECONDS_PER_DAY;
    DateTime::<Utc>::from_timestamp_millis((seconds * 1_000.0).round() as i64)
}

/// Seconds since the Unix epoch for a Julian Date, used for calendar axes.
pub fn unix_seconds_from_jd(jd: f64) -> f64 {
    (jd - JD_UNIX_EPOCH) * SECONDS_PER_DAY
}

/// Calendar formats accepted in the time-span entry fields.
const CALENDAR_FORMATS: [&str; 3] = ["%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Parse a user-entered instant: a bare Julian Date number or a calendar date.
///
/// Calendar dates resolve to midnight UTC. Returns `None` when no accepted
/// form matches; range checking is the caller's concern.
pub fn parse_instant(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(jd) = text.parse::<f64>() {
        return jd.is_finite().then_some(jd);
    }
    for format in CALENDAR_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
            return Some(jd_from_datetime_utc(midnight));
        }
    }
    None
}

/// A resolved observation window on the Julian Date axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_jd: f64,
    pub end_jd: f64,
}

impl TimeWindow {
    /// Construct a window; `None` unless `start_jd < end_jd`.
    pub fn new(start_jd: f64, end_jd: f64) -> Option<Self> {
        (start_jd.is_finite() && end_jd.is_finite() && start_jd < end_jd)
            .then_some(Self { start_jd, end_jd })
    }

    /// Width of the window in days.
    pub fn span_days(&self) -> f64 {
        self.end_jd - self.start_jd
    }
}
