//! Observation download from the remote variable-star database
//!
//! The delimited API requires the field delimiter to be declared in the
//! query, and a response read with the wrong delimiter comes back as a few
//! garbage columns rather than an error. A short ordered list of candidate
//! delimiters is therefore tried until one yields a structurally sound
//! table. Accepted results are memoized per exact request signature.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use lcv_core::time::TimeWindow;

use crate::cache::{FetchCache, FetchKey};
use crate::frame::{Column, ColumnTable};
use crate::DataError;

/// Delimited-API endpoint.
const VSX_BASE_URL: &str = "https://www.aavso.org/vsx/index.php?view=api.delim";

/// Delimiters tried in order. `,` is excluded: observer-name fields in the
/// upstream schema themselves contain commas.
pub const CANDIDATE_DELIMITERS: [char; 4] = ['$', '`', '^', '%'];

/// Minimum column count of a plausible response; the upstream schema is wide.
const MIN_COLUMNS: usize = 20;

const DEFAULT_CACHE_CAPACITY: usize = 64;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Required columns of a structurally sound response.
pub const COL_TIME: &str = "JD";
pub const COL_MAG: &str = "mag";
pub const COL_UNCERT: &str = "uncert";
pub const COL_BAND: &str = "band";
/// Optional columns the plot layer uses when present.
pub const COL_OBSERVER: &str = "obscode";
pub const COL_FAINTER_THAN: &str = "fainterThan";

/// Make a star id safe to embed in a query URL.
///
/// Literal plus signs must be escaped before spaces become pluses.
pub fn safe_star_id(star_id: &str) -> String {
    star_id.replace('+', "%2B").replace(' ', "+")
}

/// Star-detail page for the shell's browse button.
pub fn vsx_detail_url(star_id: &str) -> String {
    format!(
        "https://www.aavso.org/vsx/index.php?view=results.special&ident={}",
        safe_star_id(star_id)
    )
}

/// Raw-observations page for the shell's browse button.
pub fn webobs_url(star_id: &str) -> String {
    format!(
        "https://app.aavso.org/webobs/results/?star={}&num_results=200",
        safe_star_id(star_id)
    )
}

/// Fixed-precision Julian Date string for query parameters and cache keys.
fn format_jd(jd: f64) -> String {
    format!("{jd:.5}")
}

fn build_query_url(star_id: &str, from_jd: &str, to_jd: &str, delimiter: char) -> String {
    format!(
        "{VSX_BASE_URL}&ident={}&tojd={to_jd}&fromjd={from_jd}&delimiter={delimiter}",
        safe_star_id(star_id)
    )
}

/// Transport seam; tests substitute a scripted implementation.
#[async_trait]
pub trait ObservationTransport: Send + Sync {
    /// Fetch a URL as text. [`DataError::Transport`] is reserved for genuine
    /// connectivity failures; anything else is per-request and the caller
    /// may retry with a different query.
    async fn get_text(&self, url: &str) -> Result<String, DataError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| DataError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ObservationTransport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, DataError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DataError::Structural(format!(
                "HTTP status {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| DataError::Structural(e.to_string()))
    }
}

/// Downloads one star's observations over a time window.
pub struct ObservationFetcher {
    transport: Arc<dyn ObservationTransport>,
    cache: FetchCache,
}

impl ObservationFetcher {
    pub fn new(transport: Arc<dyn ObservationTransport>) -> Self {
        Self::with_cache_capacity(transport, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(transport: Arc<dyn ObservationTransport>, capacity: usize) -> Self {
        Self::with_cache(transport, FetchCache::new(capacity))
    }

    /// Inject a pre-built cache (shared sizing policy, tests).
    pub fn with_cache(transport: Arc<dyn ObservationTransport>, cache: FetchCache) -> Self {
        Self { transport, cache }
    }

    /// Drop all memoized results; the next fetch goes back to the network.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Fetch observations for `star_id` over `window`, optionally truncated
    /// to `max_obs` rows.
    ///
    /// An exact repeat call returns the memoized table without a network
    /// round trip. All delimiters failing validation yields the invalid
    /// table rather than an error; only connectivity failures are fatal.
    pub async fn fetch(
        &self,
        star_id: &str,
        window: &TimeWindow,
        max_obs: Option<usize>,
    ) -> Result<ColumnTable, DataError> {
        let key = FetchKey {
            star_id: star_id.to_string(),
            from_jd: format_jd(window.start_jd),
            to_jd: format_jd(window.end_jd),
            max_obs,
        };
        if let Some(hit) = self.cache.get(&key) {
            debug!(star_id, "fetch served from cache");
            return Ok(hit);
        }

        for delimiter in CANDIDATE_DELIMITERS {
            let url = build_query_url(star_id, &key.from_jd, &key.to_jd, delimiter);
            let body = match self.transport.get_text(&url).await {
                Ok(body) => body,
                Err(DataError::Transport(reason)) => {
                    return Err(DataError::Transport(reason));
                }
                Err(err) => {
                    debug!(%delimiter, %err, "request failed, trying next delimiter");
                    continue;
                }
            };
            let table = match parse_delimited(&body, delimiter) {
                Ok(table) => table,
                Err(err) => {
                    debug!(%delimiter, %err, "response unparseable with this delimiter");
                    continue;
                }
            };
            if let Err(reason) = validate_response(&table) {
                debug!(%delimiter, %reason, "response failed structural validation");
                continue;
            }
            let table = normalize_response(table, max_obs)?;
            if table.row_count() == 0 {
                info!(star_id, "no observations in the requested range");
            } else {
                info!(
                    star_id,
                    rows = table.row_count(),
                    %delimiter,
                    "observations downloaded"
                );
            }
            self.cache.put(key, table.clone());
            return Ok(table);
        }

        warn!(star_id, "all candidate delimiters failed structural validation");
        Ok(ColumnTable::invalid())
    }
}

/// Parse a delimited response body into a text table; first row is the
/// header.
fn parse_delimited(body: &str, delimiter: char) -> Result<ColumnTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::Structural(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(DataError::Structural("empty header row".to_string()));
    }

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Structural(e.to_string()))?;
        if record.len() != headers.len() {
            return Err(DataError::Structural(format!(
                "row width {} does not match header width {}",
                record.len(),
                headers.len()
            )));
        }
        for (i, field) in record.iter().enumerate() {
            columns[i].push(field.trim().to_string());
        }
    }

    Ok(ColumnTable::new(
        headers
            .into_iter()
            .zip(columns.into_iter().map(Column::Text))
            .collect(),
    ))
}

/// Structural validation: wide enough, required columns present, first
/// uncertainty value numeric. A response read with a mismatched delimiter
/// fails one of these long before it can masquerade as data.
fn validate_response(table: &ColumnTable) -> Result<(), String> {
    if !table.is_valid() {
        return Err("no usable columns".to_string());
    }
    if table.column_count() < MIN_COLUMNS {
        return Err(format!("only {} columns", table.column_count()));
    }
    for required in [COL_TIME, COL_MAG, COL_UNCERT, COL_BAND] {
        if !table.has_column(required) {
            return Err(format!("missing required column '{required}'"));
        }
    }
    if table.row_count() > 0 {
        let first = table
            .column(COL_UNCERT)
            .ok()
            .and_then(|c| c.text())
            .and_then(|values| values.first());
        if let Some(value) = first {
            // Blank is fine (normalized to zero later); garbage is not.
            if !value.trim().is_empty() && value.trim().parse::<f64>().is_err() {
                return Err(format!("first uncertainty value '{value}' is not numeric"));
            }
        }
    }
    Ok(())
}

/// Post-validation normalization: optional truncation, blank uncertainties
/// become zero, and the time, magnitude, and uncertainty columns coerce to
/// numbers.
fn normalize_response(
    mut table: ColumnTable,
    max_obs: Option<usize>,
) -> Result<ColumnTable, DataError> {
    if let Some(limit) = max_obs {
        if limit < table.row_count() {
            let keep: Vec<bool> = (0..table.row_count()).map(|i| i < limit).collect();
            table = table.filter_rows(&keep)?;
        }
    }
    if let Some(values) = table.column(COL_UNCERT).ok().and_then(|c| c.text()) {
        let filled: Vec<String> = values
            .iter()
            .map(|v| {
                if v.trim().is_empty() {
                    "0".to_string()
                } else {
                    v.clone()
                }
            })
            .collect();
        table.set_column(COL_UNCERT, Column::Text(filled))?;
    }
    for name in [COL_TIME, COL_MAG, COL_UNCERT] {
        table.coerce_to_numeric(name);
    }
    Ok(table)
}
