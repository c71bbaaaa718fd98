//! Raw config schema and resolved settings

use loglease_util::{default_ship_path, parse_duration, store_path_without_env};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Raw TOML shape, durations as humantime strings. Validated before being
/// resolved into `Settings`.
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub config_version: u32,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub capture: CaptureSection,

    #[serde(default)]
    pub sink: SinkSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    /// Lease store path; defaults to the XDG data dir.
    pub path: Option<PathBuf>,

    /// Change-detection poll interval for the sqlite store.
    pub poll_interval: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchSection {
    /// Wait between watch re-subscription attempts.
    pub retry_interval: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CaptureSection {
    /// Guaranteed-minimum lease duration when none is given on the CLI.
    pub default_guarantee: Option<String>,
}

/// Sink selection.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkSection {
    /// Append NDJSON entries to a local file.
    File { path: Option<PathBuf> },

    /// POST JSON batches to an HTTP endpoint.
    Http { endpoint: String },
}

impl Default for SinkSection {
    fn default() -> Self {
        Self::File { path: None }
    }
}

/// Resolved settings with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: PathBuf,
    pub poll_interval: Duration,
    pub watch_retry: Duration,
    pub default_guarantee: Duration,
    pub sink: SinkTarget,
}

/// Resolved sink target.
#[derive(Debug, Clone)]
pub enum SinkTarget {
    File { path: PathBuf },
    Http { endpoint: String },
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: store_path_without_env(),
            poll_interval: Duration::from_millis(500),
            watch_retry: Duration::from_secs(5),
            default_guarantee: Duration::from_secs(5),
            sink: SinkTarget::File {
                path: default_ship_path(),
            },
        }
    }
}

impl Settings {
    /// Resolve a validated raw config. Duration strings must already have
    /// passed validation.
    pub(crate) fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let parse = |s: &Option<String>, fallback: Duration| {
            s.as_deref()
                .and_then(|s| parse_duration(s).ok())
                .unwrap_or(fallback)
        };

        Self {
            store_path: raw.store.path.unwrap_or(defaults.store_path),
            poll_interval: parse(&raw.store.poll_interval, defaults.poll_interval),
            watch_retry: parse(&raw.watch.retry_interval, defaults.watch_retry),
            default_guarantee: parse(&raw.capture.default_guarantee, defaults.default_guarantee),
            sink: match raw.sink {
                SinkSection::File { path } => SinkTarget::File {
                    path: path.unwrap_or_else(default_ship_path),
                },
                SinkSection::Http { endpoint } => SinkTarget::Http { endpoint },
            },
        }
    }
}
