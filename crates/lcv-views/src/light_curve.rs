//! Light-curve series construction
//!
//! Shapes a fetched observation table into renderable series: per-band point
//! sets in legend order, an error-bar series, an optional observer-highlight
//! overlay, and axis bounds. Pure shaping with no hidden state; every redraw
//! rebuilds from the table.

use tracing::{debug, warn};

use lcv_core::time::{jd_now, unix_seconds_from_jd, TimeWindow};
use lcv_data::fetch::{COL_BAND, COL_FAINTER_THAN, COL_MAG, COL_OBSERVER, COL_TIME, COL_UNCERT};
use lcv_data::frame::{Column, ColumnTable};

/// Unit of the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxisUnit {
    /// Raw Julian Date.
    JulianDate,
    /// Seconds since the Unix epoch, for calendar-labelled axes.
    CalendarUtc,
}

/// Display flags governing one rebuild.
#[derive(Debug, Clone)]
pub struct LightCurveConfig {
    /// Bands to plot; this order becomes legend order.
    pub bands: Vec<String>,
    pub show_errorbars: bool,
    /// Pass-through for the renderer; shaping ignores it.
    pub show_grid: bool,
    /// Keep upper-limit ("fainter than") observations.
    pub show_less_thans: bool,
    /// Overlay the selected observer's points across all bands.
    pub highlight_observer: bool,
    /// Restrict every band to the selected observer.
    pub plot_observer_only: bool,
    /// Selected observer code; blank disables both observer features.
    pub observer_code: String,
    pub x_axis: XAxisUnit,
}

impl Default for LightCurveConfig {
    fn default() -> Self {
        Self {
            bands: vec!["V".to_string()],
            show_errorbars: true,
            show_grid: true,
            show_less_thans: false,
            highlight_observer: false,
            plot_observer_only: false,
            observer_code: String::new(),
            x_axis: XAxisUnit::JulianDate,
        }
    }
}

/// Requested axis window; either bound may be open.
#[derive(Debug, Clone, Copy)]
pub struct AxisWindow {
    pub start_jd: Option<f64>,
    pub end_jd: Option<f64>,
    /// Day count backing an open start bound.
    pub num_days: f64,
}

impl AxisWindow {
    /// Axis window with both bounds fixed by a resolved fetch window.
    pub fn from_resolved(window: &TimeWindow) -> Self {
        Self {
            start_jd: Some(window.start_jd),
            end_jd: Some(window.end_jd),
            num_days: window.span_days(),
        }
    }
}

/// One band's points, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSeries {
    pub band: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBar {
    pub x: f64,
    pub y: f64,
    pub uncert: f64,
}

/// Everything the renderer needs for a full redraw.
#[derive(Debug, Clone)]
pub struct LightCurveSeries {
    pub band_series: Vec<BandSeries>,
    pub error_bars: Vec<ErrorBar>,
    /// Combined overlay of the highlighted observer's points.
    pub highlighted: Vec<(f64, f64)>,
    /// (low, high).
    pub x_bounds: (f64, f64),
    /// (low, high) with low >= high: smaller magnitudes render toward the
    /// top, the photometric convention.
    pub y_bounds: (f64, f64),
    /// Band labels with a non-empty series, in requested order.
    pub legend: Vec<String>,
    pub show_grid: bool,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone)]
pub enum PlotOutcome {
    /// Empty or unusable data; the shell shows a message instead of a plot.
    NothingToPlot,
    Series(LightCurveSeries),
}

impl PlotOutcome {
    pub fn series(&self) -> Option<&LightCurveSeries> {
        match self {
            PlotOutcome::Series(series) => Some(series),
            PlotOutcome::NothingToPlot => None,
        }
    }
}

/// Shape `table` into renderable series.
pub fn build_light_curve(
    table: &ColumnTable,
    config: &LightCurveConfig,
    window: &AxisWindow,
) -> PlotOutcome {
    if !table.is_valid() || table.row_count() == 0 {
        debug!("nothing to plot: table invalid or empty");
        return PlotOutcome::NothingToPlot;
    }

    let mut working = table.clone();
    // The fetch layer coerces these on the way in; hand-built tables may not
    // have been.
    for name in [COL_TIME, COL_MAG, COL_UNCERT] {
        working.coerce_to_numeric(name);
    }

    // Repair the uncertainty column: unknown or negative becomes zero.
    let clamped: Vec<f64> = match working.column(COL_UNCERT).ok().and_then(Column::number) {
        Some(values) => values
            .iter()
            .map(|&u| if u.is_nan() || u < 0.0 { 0.0 } else { u })
            .collect(),
        None => vec![0.0; working.row_count()],
    };
    working
        .set_column(COL_UNCERT, Column::Number(clamped))
        .expect("uncertainty column built to row length");

    // Drop upper-limit rows unless asked to keep them.
    if !config.show_less_thans {
        if let Some(flags) = working.column(COL_FAINTER_THAN).ok().and_then(Column::text) {
            let keep: Vec<bool> = flags.iter().map(|flag| !is_flagged(flag)).collect();
            if keep.contains(&false) {
                working = working
                    .filter_rows(&keep)
                    .expect("mask built to row length");
            }
        }
    }
    if working.row_count() == 0 {
        debug!("nothing to plot: every row was an upper limit");
        return PlotOutcome::NothingToPlot;
    }

    let Some(times) = working.column(COL_TIME).ok().and_then(Column::number) else {
        warn!("time column missing; cannot shape series");
        return PlotOutcome::NothingToPlot;
    };
    let Some(mags) = working.column(COL_MAG).ok().and_then(Column::number) else {
        warn!("magnitude column missing; cannot shape series");
        return PlotOutcome::NothingToPlot;
    };
    let Some(bands_col) = working.column(COL_BAND).ok().and_then(Column::text) else {
        warn!("band column missing; cannot shape series");
        return PlotOutcome::NothingToPlot;
    };
    let uncerts = working
        .column(COL_UNCERT)
        .ok()
        .and_then(Column::number)
        .unwrap_or(&[]);
    let observers = working.column(COL_OBSERVER).ok().and_then(Column::text);

    let xs: Vec<f64> = times.iter().map(|&jd| to_axis(jd, config.x_axis)).collect();

    let observer = config.observer_code.trim();
    let restrict_observer = config.plot_observer_only && !observer.is_empty();
    let highlight = config.highlight_observer && !observer.is_empty();

    let mut band_series = Vec::new();
    let mut legend = Vec::new();
    let mut highlighted = Vec::new();
    let mut error_bars = Vec::new();
    let mut band_mags = Vec::new();

    for band in &config.bands {
        let mut points = Vec::new();
        for i in 0..working.row_count() {
            if bands_col[i] != *band {
                continue;
            }
            let drawable = xs[i].is_finite() && mags[i].is_finite();
            if drawable {
                band_mags.push(mags[i]);
                // Error bars cover the band-restricted rows, before any
                // observer restriction.
                if config.show_errorbars {
                    error_bars.push(ErrorBar {
                        x: xs[i],
                        y: mags[i],
                        uncert: uncerts.get(i).copied().unwrap_or(0.0),
                    });
                }
            }
            let observer_matches = observers
                .map(|obs| obs[i].trim().eq_ignore_ascii_case(observer))
                .unwrap_or(false);
            if restrict_observer && !observer_matches {
                continue;
            }
            if !drawable {
                continue;
            }
            points.push((xs[i], mags[i]));
            if highlight && observer_matches {
                highlighted.push((xs[i], mags[i]));
            }
        }
        if !points.is_empty() {
            legend.push(band.clone());
            band_series.push(BandSeries {
                band: band.clone(),
                points,
            });
        }
    }

    if band_series.is_empty() {
        debug!("nothing to plot: no requested band has points");
        return PlotOutcome::NothingToPlot;
    }

    let x_high_jd = window.end_jd.unwrap_or_else(jd_now);
    let x_low_jd = window.start_jd.unwrap_or(x_high_jd - window.num_days);
    let x_bounds = (
        to_axis(x_low_jd, config.x_axis),
        to_axis(x_high_jd, config.x_axis),
    );

    PlotOutcome::Series(LightCurveSeries {
        band_series,
        error_bars,
        highlighted,
        x_bounds,
        y_bounds: inverted_bounds(&band_mags),
        legend,
        show_grid: config.show_grid,
    })
}

fn to_axis(jd: f64, unit: XAxisUnit) -> f64 {
    match unit {
        XAxisUnit::JulianDate => jd,
        XAxisUnit::CalendarUtc => unix_seconds_from_jd(jd),
    }
}

/// The upstream upper-limit flag is 0/1.
fn is_flagged(value: &str) -> bool {
    value.trim() == "1"
}

/// Magnitude bounds, inverted so brighter (smaller) values sit at the top.
/// Recomputed from scratch on every rebuild, so repeated calls cannot flip
/// the axis back.
fn inverted_bounds(mags: &[f64]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &mag in mags {
        min = min.min(mag);
        max = max.max(mag);
    }
    (max, min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    /// Rows are (jd, mag, uncert, band, obscode, fainterThan), as text, the
    /// way they come off the wire.
    fn table(rows: &[(&str, &str, &str, &str, &str, &str)]) -> ColumnTable {
        ColumnTable::new(indexmap! {
            COL_TIME.to_string() =>
                Column::from(rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            COL_MAG.to_string() =>
                Column::from(rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            COL_UNCERT.to_string() =>
                Column::from(rows.iter().map(|r| r.2).collect::<Vec<_>>()),
            COL_BAND.to_string() =>
                Column::from(rows.iter().map(|r| r.3).collect::<Vec<_>>()),
            COL_OBSERVER.to_string() =>
                Column::from(rows.iter().map(|r| r.4).collect::<Vec<_>>()),
            COL_FAINTER_THAN.to_string() =>
                Column::from(rows.iter().map(|r| r.5).collect::<Vec<_>>()),
        })
    }

    fn closed_window() -> AxisWindow {
        AxisWindow {
            start_jd: Some(2_458_349.5),
            end_jd: Some(2_458_849.5),
            num_days: 500.0,
        }
    }

    fn config(bands: &[&str]) -> LightCurveConfig {
        LightCurveConfig {
            bands: bands.iter().map(|b| b.to_string()).collect(),
            ..LightCurveConfig::default()
        }
    }

    #[test]
    fn test_empty_table_means_nothing_to_plot() {
        let outcome = build_light_curve(&ColumnTable::invalid(), &config(&["V"]), &closed_window());
        assert!(outcome.series().is_none());
        let outcome = build_light_curve(&table(&[]), &config(&["V"]), &closed_window());
        assert!(outcome.series().is_none());
    }

    #[test]
    fn test_band_partition_and_legend_order() {
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "10.4", "0.02", "B", "DERA", "0"),
            ("2458802.5", "9.2", "0.01", "V", "BXYZ", "0"),
        ]);
        let outcome = build_light_curve(&data, &config(&["B", "V"]), &closed_window());
        let series = outcome.series().unwrap();
        assert_eq!(series.legend, vec!["B", "V"]);
        assert_eq!(series.band_series[0].points.len(), 1);
        assert_eq!(series.band_series[1].points.len(), 2);
        assert_eq!(series.band_series[1].points[0], (2_458_800.5, 9.1));
    }

    #[test]
    fn test_st_tri_scenario() {
        // Three V rows, one flagged as an upper limit, and no R rows at all:
        // exactly one band series with two points, legend lists only V.
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "9.3", "0.02", "V", "DERA", "1"),
            ("2458802.5", "9.2", "0.01", "V", "BXYZ", "0"),
        ]);
        let outcome = build_light_curve(&data, &config(&["V", "R"]), &closed_window());
        let series = outcome.series().unwrap();
        assert_eq!(series.legend, vec!["V"]);
        assert_eq!(series.band_series.len(), 1);
        assert_eq!(series.band_series[0].points.len(), 2);
    }

    #[test]
    fn test_less_thans_kept_on_request() {
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "9.3", "0.02", "V", "DERA", "1"),
        ]);
        let mut cfg = config(&["V"]);
        cfg.show_less_thans = true;
        let outcome = build_light_curve(&data, &cfg, &closed_window());
        assert_eq!(outcome.series().unwrap().band_series[0].points.len(), 2);
    }

    #[test]
    fn test_all_rows_upper_limits_means_nothing_to_plot() {
        let data = table(&[("2458800.5", "9.1", "0.01", "V", "DERA", "1")]);
        let outcome = build_light_curve(&data, &config(&["V"]), &closed_window());
        assert!(outcome.series().is_none());
    }

    #[test]
    fn test_uncertainty_clamping() {
        let data = table(&[
            ("2458800.5", "9.1", "-0.5", "V", "DERA", "0"),
            ("2458801.5", "9.3", "junk", "V", "DERA", "0"),
            ("2458802.5", "9.2", "0.03", "V", "DERA", "0"),
        ]);
        let outcome = build_light_curve(&data, &config(&["V"]), &closed_window());
        let series = outcome.series().unwrap();
        let uncerts: Vec<f64> = series.error_bars.iter().map(|e| e.uncert).collect();
        assert_eq!(uncerts, vec![0.0, 0.0, 0.03]);
    }

    #[test]
    fn test_error_bars_ignore_observer_restriction() {
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "9.3", "0.02", "V", "BXYZ", "0"),
        ]);
        let mut cfg = config(&["V"]);
        cfg.plot_observer_only = true;
        cfg.observer_code = "dera".to_string();
        let outcome = build_light_curve(&data, &cfg, &closed_window());
        let series = outcome.series().unwrap();
        // Observer matching is case-insensitive; only DERA's point survives,
        // but the error bars still cover the whole band.
        assert_eq!(series.band_series[0].points.len(), 1);
        assert_eq!(series.error_bars.len(), 2);
    }

    #[test]
    fn test_highlight_accumulates_across_bands() {
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "10.4", "0.02", "B", "DERA", "0"),
            ("2458802.5", "9.2", "0.01", "V", "BXYZ", "0"),
        ]);
        let mut cfg = config(&["V", "B"]);
        cfg.highlight_observer = true;
        cfg.observer_code = "DERA".to_string();
        let outcome = build_light_curve(&data, &cfg, &closed_window());
        let series = outcome.series().unwrap();
        assert_eq!(series.highlighted.len(), 2);
        // Blank observer selection disables highlighting entirely.
        cfg.observer_code = String::new();
        let outcome = build_light_curve(&data, &cfg, &closed_window());
        assert!(outcome.series().unwrap().highlighted.is_empty());
    }

    #[test]
    fn test_errorbars_can_be_disabled() {
        let data = table(&[("2458800.5", "9.1", "0.01", "V", "DERA", "0")]);
        let mut cfg = config(&["V"]);
        cfg.show_errorbars = false;
        let outcome = build_light_curve(&data, &cfg, &closed_window());
        assert!(outcome.series().unwrap().error_bars.is_empty());
    }

    #[test]
    fn test_y_bounds_inverted_and_idempotent() {
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "10.4", "0.02", "V", "DERA", "0"),
        ]);
        let first = build_light_curve(&data, &config(&["V"]), &closed_window());
        let second = build_light_curve(&data, &config(&["V"]), &closed_window());
        let (first, second) = (first.series().unwrap(), second.series().unwrap());
        assert_eq!(first.y_bounds, (10.4, 9.1));
        assert!(first.y_bounds.0 >= first.y_bounds.1);
        // Rebuilding must not flip the axis again.
        assert_eq!(first.y_bounds, second.y_bounds);
    }

    #[test]
    fn test_x_bounds_follow_window() {
        let data = table(&[("2458800.5", "9.1", "0.01", "V", "DERA", "0")]);
        let outcome = build_light_curve(&data, &config(&["V"]), &closed_window());
        assert_eq!(outcome.series().unwrap().x_bounds, (2_458_349.5, 2_458_849.5));

        // Open start bound backs off by the requested day count.
        let window = AxisWindow {
            start_jd: None,
            end_jd: Some(2_458_849.5),
            num_days: 100.0,
        };
        let outcome = build_light_curve(&data, &config(&["V"]), &window);
        assert_eq!(outcome.series().unwrap().x_bounds, (2_458_749.5, 2_458_849.5));
    }

    #[test]
    fn test_calendar_axis_converts_points_and_bounds() {
        let data = table(&[("2458800.5", "9.1", "0.01", "V", "DERA", "0")]);
        let mut cfg = config(&["V"]);
        cfg.x_axis = XAxisUnit::CalendarUtc;
        let outcome = build_light_curve(&data, &cfg, &closed_window());
        let series = outcome.series().unwrap();
        let expected_x = unix_seconds_from_jd(2_458_800.5);
        assert_eq!(series.band_series[0].points[0].0, expected_x);
        assert_eq!(series.x_bounds.1, unix_seconds_from_jd(2_458_849.5));
    }

    #[test]
    fn test_unparseable_magnitude_rows_are_skipped() {
        let data = table(&[
            ("2458800.5", "9.1", "0.01", "V", "DERA", "0"),
            ("2458801.5", "bad", "0.02", "V", "DERA", "0"),
        ]);
        let outcome = build_light_curve(&data, &config(&["V"]), &closed_window());
        assert_eq!(outcome.series().unwrap().band_series[0].points.len(), 1);
    }
}
