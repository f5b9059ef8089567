//! Core functionality for the light-curve pipeline
//!
//! This crate provides the fundamental abstractions shared by the data and
//! plotting layers: Julian-Date time math, time-span resolution, and
//! target navigation.

pub mod navigation;
pub mod time;
pub mod timespan;

// Re-export commonly used types
pub use navigation::TargetNavigator;
pub use time::{jd_from_datetime_utc, jd_now, TimeWindow};
pub use timespan::{
    resolve_span, resolve_span_at, FieldReport, FieldRole, FieldState, SpanResolution,
};
