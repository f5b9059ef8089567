//! Headless light-curve pipeline driver
//!
//! Wires the time-span resolver, observation fetcher, and series builder
//! together the way the GUI shell does: one blocking fetch per target, then
//! a full redraw through the renderer seam.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use lcv_core::navigation::TargetNavigator;
use lcv_core::time::jd_now;
use lcv_core::timespan::{resolve_span, SpanResolution};
use lcv_data::fetch::{HttpTransport, ObservationFetcher};
use lcv_data::prefs::{Preferences, KEY_TIME_SPAN_DAYS};
use lcv_data::upload;
use lcv_views::{build_light_curve, AxisWindow, LightCurveConfig, PlotOutcome, XAxisUnit};

mod render;

use render::{LightCurveRenderer, TextRenderer};

const USAGE: &str = "\
usage: lcv-app [options] [STAR_ID]...
  --upload FILE     read target stars from an upload report file
  --days N          day span of the window
  --start DATE      window start (JD, m/d/Y, d-m-Y, or d.m.Y)
  --end DATE        window end (same forms; defaults to now)
  --bands B,V,...   bands to plot, in legend order
  --observer CODE   observer code for highlighting/restriction
  --highlight       overlay the selected observer's points
  --observer-only   plot only the selected observer's points
  --calendar        calendar x axis instead of Julian Date
  --less-thans      keep upper-limit observations
  --no-errorbars    suppress the error-bar series
  --max-obs N       cap the number of observations per star";

struct Options {
    star_ids: Vec<String>,
    upload_file: Option<PathBuf>,
    days: String,
    start: String,
    end: String,
    bands: Option<Vec<String>>,
    observer: Option<String>,
    highlight: bool,
    observer_only: bool,
    calendar_axis: bool,
    show_less_thans: bool,
    no_errorbars: bool,
    max_obs: Option<usize>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        star_ids: Vec::new(),
        upload_file: None,
        days: String::new(),
        start: String::new(),
        end: String::new(),
        bands: None,
        observer: None,
        highlight: false,
        observer_only: false,
        calendar_axis: false,
        show_less_thans: false,
        no_errorbars: false,
        max_obs: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value_of = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} needs a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--upload" => options.upload_file = Some(PathBuf::from(value_of("--upload")?)),
            "--days" => options.days = value_of("--days")?,
            "--start" => options.start = value_of("--start")?,
            "--end" => options.end = value_of("--end")?,
            "--bands" => {
                options.bands = Some(
                    value_of("--bands")?
                        .split(',')
                        .map(|band| band.trim().to_string())
                        .filter(|band| !band.is_empty())
                        .collect(),
                )
            }
            "--observer" => options.observer = Some(value_of("--observer")?),
            "--highlight" => options.highlight = true,
            "--observer-only" => options.observer_only = true,
            "--calendar" => options.calendar_axis = true,
            "--less-thans" => options.show_less_thans = true,
            "--no-errorbars" => options.no_errorbars = true,
            "--max-obs" => {
                options.max_obs = Some(
                    value_of("--max-obs")?
                        .parse()
                        .context("--max-obs needs a whole number")?,
                )
            }
            "--help" | "-h" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            star_id => options.star_ids.push(star_id.to_string()),
        }
    }
    Ok(options)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = parse_args()?;
    let prefs = Preferences::new();

    // The shell pre-fills the day span from preferences and the end field
    // with "now"; mirror that when the caller leaves them open.
    let days = if options.days.is_empty() {
        prefs.get(KEY_TIME_SPAN_DAYS).unwrap_or("500").to_string()
    } else {
        options.days.clone()
    };
    let end = if options.end.is_empty() && options.start.is_empty() {
        format!("{:.5}", jd_now())
    } else {
        options.end.clone()
    };

    let window = match resolve_span(&days, &options.start, &end) {
        SpanResolution::Resolved { window, .. } => window,
        SpanResolution::Unresolved { report } => {
            bail!(
                "time span not resolvable (days: {:?}, start: {:?}, end: {:?})",
                report.days,
                report.start,
                report.end
            );
        }
    };
    info!(
        start_jd = window.start_jd,
        end_jd = window.end_jd,
        "window resolved"
    );

    let mut navigator = TargetNavigator::new();
    if let Some(path) = &options.upload_file {
        let ids = upload::star_ids_from_upload_file(path)
            .with_context(|| format!("reading {}", path.display()))?;
        info!(count = ids.len(), "targets loaded from upload file");
        navigator.add(ids);
    }
    navigator.add(options.star_ids.clone());
    if navigator.is_empty() {
        bail!("no target stars given\n{USAGE}");
    }

    let transport = Arc::new(HttpTransport::new()?);
    let fetcher = ObservationFetcher::new(transport);
    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;

    let config = LightCurveConfig {
        bands: options.bands.clone().unwrap_or_else(|| prefs.band_list()),
        show_errorbars: !options.no_errorbars,
        show_grid: true,
        show_less_thans: options.show_less_thans,
        highlight_observer: options.highlight,
        plot_observer_only: options.observer_only,
        observer_code: options.observer.clone().unwrap_or_default(),
        x_axis: if options.calendar_axis {
            XAxisUnit::CalendarUtc
        } else {
            XAxisUnit::JulianDate
        },
    };
    let axis_window = AxisWindow::from_resolved(&window);
    let mut renderer = TextRenderer;

    // Rewind to the front, then walk every target; a fetch failure on one
    // star must not abort the rest of the run.
    while navigator.go_previous().is_some() {}
    let mut current = navigator.current().map(str::to_string);
    while let Some(star_id) = current {
        match runtime.block_on(fetcher.fetch(&star_id, &window, options.max_obs)) {
            Ok(table) => {
                let outcome = build_light_curve(&table, &config, &axis_window);
                if matches!(outcome, PlotOutcome::NothingToPlot) {
                    info!(star_id = %star_id, "nothing to plot");
                }
                renderer.redraw(&star_id, &outcome);
            }
            Err(err) => {
                error!(star_id = %star_id, %err, "fetch failed");
            }
        }
        current = navigator.go_next().map(str::to_string);
    }
    Ok(())
}
