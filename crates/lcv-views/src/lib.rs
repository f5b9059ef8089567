//! Plot-data shaping for the light-curve pipeline
//!
//! Turns fetched observation tables into renderable series. No drawing
//! happens here; the rendering collaborator redraws from scratch given the
//! shaped output.

pub mod light_curve;

pub use light_curve::{
    build_light_curve, AxisWindow, BandSeries, ErrorBar, LightCurveConfig, LightCurveSeries,
    PlotOutcome, XAxisUnit,
};
