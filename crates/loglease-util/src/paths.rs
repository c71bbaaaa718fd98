//! Default paths for loglease components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/loglease/config.toml` or `~/.config/loglease/config.toml`
//! - Lease store: `$XDG_DATA_HOME/loglease/leases.db` or `~/.local/share/loglease/leases.db`
//! - File sink: `$XDG_STATE_HOME/loglease/shipped.ndjson` or `~/.local/state/loglease/shipped.ndjson`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const LOGLEASE_CONFIG_ENV: &str = "LOGLEASE_CONFIG";

/// Environment variable for overriding the lease store path
pub const LOGLEASE_STORE_ENV: &str = "LOGLEASE_STORE";

/// Application subdirectory name
const APP_DIR: &str = "loglease";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$LOGLEASE_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/loglease/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/loglease/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(LOGLEASE_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("config.toml")
}

/// Get the default lease store path.
///
/// Order of precedence:
/// 1. `$LOGLEASE_STORE` environment variable (if set)
/// 2. `$XDG_DATA_HOME/loglease/leases.db` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/loglease/leases.db` (fallback)
pub fn default_store_path() -> PathBuf {
    if let Ok(path) = std::env::var(LOGLEASE_STORE_ENV) {
        return PathBuf::from(path);
    }

    store_path_without_env()
}

/// Get the lease store path without checking LOGLEASE_STORE.
/// Used for config defaults where the env var is checked separately.
pub fn store_path_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR).join("leases.db");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR)
            .join("leases.db");
    }

    PathBuf::from("/tmp").join(APP_DIR).join("leases.db")
}

/// Get the default file-sink path (used when no sink is configured).
///
/// Order of precedence:
/// 1. `$XDG_STATE_HOME/loglease/shipped.ndjson` (if XDG_STATE_HOME is set)
/// 2. `~/.local/state/loglease/shipped.ndjson` (fallback)
pub fn default_ship_path() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR).join("shipped.ndjson");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR)
            .join("shipped.ndjson");
    }

    PathBuf::from("/tmp").join(APP_DIR).join("shipped.ndjson")
}
