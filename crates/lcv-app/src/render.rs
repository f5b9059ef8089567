//! Renderer contract and the bundled terminal renderer
//!
//! The GUI collaborator implements [`LightCurveRenderer`] and redraws from
//! scratch on every call; nothing here retains plot state between calls.

use lcv_views::{LightCurveSeries, PlotOutcome};

/// Full-redraw rendering seam. No incremental updates.
pub trait LightCurveRenderer {
    fn redraw(&mut self, star_id: &str, outcome: &PlotOutcome);
}

/// Terminal renderer: prints a per-band summary instead of drawing.
pub struct TextRenderer;

impl LightCurveRenderer for TextRenderer {
    fn redraw(&mut self, star_id: &str, outcome: &PlotOutcome) {
        match outcome {
            PlotOutcome::NothingToPlot => {
                println!("No observations found for {star_id} in this date range.");
            }
            PlotOutcome::Series(series) => print_series(star_id, series),
        }
    }
}

fn print_series(star_id: &str, series: &LightCurveSeries) {
    println!("{}", star_id.to_uppercase());
    for band in &series.band_series {
        println!("  band {:<6} {:>5} points", band.band, band.points.len());
    }
    if !series.error_bars.is_empty() {
        println!("  error bars   {:>5}", series.error_bars.len());
    }
    if !series.highlighted.is_empty() {
        println!("  highlighted  {:>5}", series.highlighted.len());
    }
    println!("  x {:.5} .. {:.5}", series.x_bounds.0, series.x_bounds.1);
    println!("  y {:.2} .. {:.2} (magnitude, brighter up)", series.y_bounds.0, series.y_bounds.1);
    println!("  legend: {}", series.legend.join(", "));
}
