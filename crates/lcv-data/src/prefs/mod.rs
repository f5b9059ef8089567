//! User preference storage
//!
//! A flat string key-value set seeded from a static default table. The
//! persistence collaborator round-trips the whole set as JSON; this layer
//! knows nothing about file locations or formats.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const KEY_SHOW_GRID: &str = "show grid";
pub const KEY_SHOW_ERRORBARS: &str = "show errorbars";
pub const KEY_PLOT_IN_JD: &str = "plot in jd";
pub const KEY_PLOT_LESS_THANS: &str = "plot less-thans";
pub const KEY_TIME_SPAN_DAYS: &str = "time span days";
pub const KEY_BANDS: &str = "bands";
pub const KEY_OBSERVER_CODE: &str = "observer code";
pub const KEY_HIGHLIGHT_OBSERVER: &str = "highlight observer code";

static DEFAULTS: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from_iter([
        (KEY_SHOW_GRID, "Yes"),
        (KEY_SHOW_ERRORBARS, "Yes"),
        (KEY_PLOT_IN_JD, "Yes"),
        (KEY_PLOT_LESS_THANS, "No"),
        (KEY_TIME_SPAN_DAYS, "500"),
        (KEY_BANDS, "B,V,R,I,Vis."),
        (KEY_OBSERVER_CODE, ""),
        (KEY_HIGHLIGHT_OBSERVER, "No"),
    ])
});

/// The current preference set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    entries: IndexMap<String, String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            entries: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set an existing key; unknown keys are refused so typos cannot grow
    /// the store.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => {
                debug!(key, "refusing unknown preference key");
                false
            }
        }
    }

    /// New set: this one overlaid with every entry of `newer`.
    pub fn as_updated_by(&self, newer: &Preferences) -> Preferences {
        let mut merged = self.clone();
        for (key, value) in &newer.entries {
            merged.entries.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Numeric accessor; `None` when missing or unparseable.
    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.get(key)?.trim().parse().ok()
    }

    /// Yes/no flag accessor; unrecognized text reads as off.
    pub fn get_flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(str::trim),
            Some(v) if v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("true")
                || v == "1"
        )
    }

    /// The band-selection list, comma-separated in storage.
    pub fn band_list(&self) -> Vec<String> {
        self.get(KEY_BANDS)
            .unwrap_or_default()
            .split(',')
            .map(|band| band.trim().to_string())
            .filter(|band| !band.is_empty())
            .collect()
    }

    /// Serialize for the persistence collaborator.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a stored set; missing keys fall back to their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let loaded: Preferences = serde_json::from_str(text)?;
        Ok(Preferences::default().as_updated_by(&loaded))
    }
}
