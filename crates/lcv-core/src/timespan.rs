//! Reconciliation of the three user-entered time-span fields
//!
//! The days-count, start, and end entries are partially redundant; a fixed
//! precedence turns whichever pair is usable into a concrete [`TimeWindow`].
//! Parsing is pure: each field maps to a tagged three-state value, and the
//! per-field outcome is reported separately for the display layer to color
//! its own labels.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::{self, TimeWindow};

/// Days past "now" an entered instant may still lie and be accepted.
const FUTURE_SLACK_DAYS: f64 = 365.25;

/// Parse state of one entry field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldState {
    /// Parsed and within the accepted range.
    Valid(f64),
    /// Left blank.
    Absent,
    /// Present but unparseable or out of range.
    Invalid,
}

impl FieldState {
    pub fn value(self) -> Option<f64> {
        match self {
            FieldState::Valid(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, FieldState::Valid(_))
    }
}

/// How a field ended up being treated by resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    /// The field's value determines the resolved window.
    Used,
    /// Parsed fine but a higher-precedence pair won.
    ValidUnused,
    /// Blank, unparseable, or out of range.
    Invalid,
}

/// Per-field roles after a resolution attempt; display-layer input only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub days: FieldRole,
    pub start: FieldRole,
    pub end: FieldRole,
}

/// Outcome of reconciling the three fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpanResolution {
    Resolved {
        window: TimeWindow,
        report: FieldReport,
    },
    /// Fields marked [`FieldRole::Invalid`] are what blocks resolution.
    Unresolved { report: FieldReport },
}

impl SpanResolution {
    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            SpanResolution::Resolved { window, .. } => Some(*window),
            SpanResolution::Unresolved { .. } => None,
        }
    }

    pub fn report(&self) -> FieldReport {
        match self {
            SpanResolution::Resolved { report, .. } => *report,
            SpanResolution::Unresolved { report } => *report,
        }
    }
}

/// Parse the days-count entry: a strictly positive number.
pub fn parse_days(text: &str) -> FieldState {
    let text = text.trim();
    if text.is_empty() {
        return FieldState::Absent;
    }
    match text.parse::<f64>() {
        Ok(days) if days.is_finite() && days > 0.0 => FieldState::Valid(days),
        _ => FieldState::Invalid,
    }
}

/// Parse a start/end entry against the accepted instant range.
pub fn parse_instant_field(text: &str, now_jd: f64) -> FieldState {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return FieldState::Absent;
    }
    match time::parse_instant(trimmed) {
        Some(jd) if (time::JD_EARLIEST..=now_jd + FUTURE_SLACK_DAYS).contains(&jd) => {
            FieldState::Valid(jd)
        }
        _ => FieldState::Invalid,
    }
}

/// Resolve the three raw entries against the current clock.
pub fn resolve_span(days: &str, start: &str, end: &str) -> SpanResolution {
    resolve_span_at(days, start, end, time::jd_now())
}

/// Resolution against an explicit "now"; the testable entry point.
///
/// Precedence: start+end beats start+days beats end+days. A start/end pair
/// that does not satisfy `start < end` leaves resolution blocked on both.
pub fn resolve_span_at(days: &str, start: &str, end: &str, now_jd: f64) -> SpanResolution {
    let days_state = parse_days(days);
    let start_state = parse_instant_field(start, now_jd);
    let end_state = parse_instant_field(end, now_jd);

    if let (Some(start_jd), Some(end_jd)) = (start_state.value(), end_state.value()) {
        let report = FieldReport {
            days: unused_role(days_state),
            start: FieldRole::Used,
            end: FieldRole::Used,
        };
        return match TimeWindow::new(start_jd, end_jd) {
            Some(window) => SpanResolution::Resolved { window, report },
            None => {
                debug!(start_jd, end_jd, "start/end pair cannot form a window");
                SpanResolution::Unresolved {
                    report: FieldReport {
                        start: FieldRole::Invalid,
                        end: FieldRole::Invalid,
                        ..report
                    },
                }
            }
        };
    }

    if let (Some(start_jd), Some(num_days)) = (start_state.value(), days_state.value()) {
        let report = FieldReport {
            days: FieldRole::Used,
            start: FieldRole::Used,
            end: unused_role(end_state),
        };
        // num_days > 0, so the window invariant holds by construction.
        if let Some(window) = TimeWindow::new(start_jd, start_jd + num_days) {
            return SpanResolution::Resolved { window, report };
        }
    }

    if let (Some(end_jd), Some(num_days)) = (end_state.value(), days_state.value()) {
        let report = FieldReport {
            days: FieldRole::Used,
            start: unused_role(start_state),
            end: FieldRole::Used,
        };
        if let Some(window) = TimeWindow::new(end_jd - num_days, end_jd) {
            return SpanResolution::Resolved { window, report };
        }
    }

    debug!(
        ?days_state,
        ?start_state,
        ?end_state,
        "time span unresolved"
    );
    SpanResolution::Unresolved {
        report: FieldReport {
            days: unused_role(days_state),
            start: unused_role(start_state),
            end: unused_role(end_state),
        },
    }
}

fn unused_role(state: FieldState) -> FieldRole {
    if state.is_valid() {
        FieldRole::ValidUnused
    } else {
        FieldRole::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A fixed "now" late in 2020, so 2020 calendar dates stay in range.
    const NOW_JD: f64 = 2_459_200.0;

    #[test]
    fn test_start_end_pair_wins_over_days() {
        let resolution = resolve_span_at("999", "01/01/2020", "01/11/2020", NOW_JD);
        let window = resolution.window().expect("both instants valid");
        assert_eq!(window.start_jd, 2_458_849.5);
        assert_eq!(window.end_jd, 2_458_859.5);
        let report = resolution.report();
        assert_eq!(report.days, FieldRole::ValidUnused);
        assert_eq!(report.start, FieldRole::Used);
        assert_eq!(report.end, FieldRole::Used);
    }

    #[test]
    fn test_start_plus_days() {
        let resolution = resolve_span_at("10", "2458849.5", "", NOW_JD);
        let window = resolution.window().expect("start and days valid");
        assert_eq!(window.start_jd, 2_458_849.5);
        assert_eq!(window.end_jd, 2_458_859.5);
        assert_eq!(resolution.report().end, FieldRole::Invalid);
    }

    #[test]
    fn test_end_minus_days() {
        let resolution = resolve_span_at("500", "", "2458849.5", NOW_JD);
        let window = resolution.window().expect("end and days valid");
        assert_eq!(window.end_jd, 2_458_849.5);
        assert_eq!(window.start_jd, 2_458_349.5);
        assert_eq!(resolution.report().start, FieldRole::Invalid);
    }

    #[test]
    fn test_all_unusable_blocks_resolution() {
        let resolution = resolve_span_at("", "nonsense", "-5", NOW_JD);
        assert!(resolution.window().is_none());
        let report = resolution.report();
        assert_eq!(report.days, FieldRole::Invalid);
        assert_eq!(report.start, FieldRole::Invalid);
        assert_eq!(report.end, FieldRole::Invalid);
    }

    #[test]
    fn test_lone_valid_field_is_reported_unused() {
        let resolution = resolve_span_at("", "2458849.5", "", NOW_JD);
        assert!(resolution.window().is_none());
        assert_eq!(resolution.report().start, FieldRole::ValidUnused);
    }

    #[test]
    fn test_reversed_pair_is_unresolved() {
        let resolution = resolve_span_at("", "01/11/2020", "01/01/2020", NOW_JD);
        assert!(resolution.window().is_none());
        let report = resolution.report();
        assert_eq!(report.start, FieldRole::Invalid);
        assert_eq!(report.end, FieldRole::Invalid);
    }

    #[test]
    fn test_days_must_be_strictly_positive() {
        assert_eq!(parse_days("500"), FieldState::Valid(500.0));
        assert_eq!(parse_days("0"), FieldState::Invalid);
        assert_eq!(parse_days("-3"), FieldState::Invalid);
        assert_eq!(parse_days("  "), FieldState::Absent);
        assert_eq!(parse_days("many"), FieldState::Invalid);
    }

    #[test]
    fn test_instant_range_limits() {
        // 1799 is before the accepted minimum; 1800-01-01 itself is in.
        assert_eq!(
            parse_instant_field("01/01/1799", NOW_JD),
            FieldState::Invalid
        );
        assert!(parse_instant_field("01/01/1800", NOW_JD).is_valid());
        // More than a year past "now" is out of range.
        let far_future = format!("{:.5}", NOW_JD + 400.0);
        assert_eq!(parse_instant_field(&far_future, NOW_JD), FieldState::Invalid);
        let near_future = format!("{:.5}", NOW_JD + 300.0);
        assert!(parse_instant_field(&near_future, NOW_JD).is_valid());
    }
}
