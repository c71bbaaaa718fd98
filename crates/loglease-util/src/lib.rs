//! Shared utilities for loglease
//!
//! This crate provides:
//! - ID types (LeaseId, SessionId)
//! - Duration helpers (parsing and human-readable formatting)
//! - Default paths for the config file, lease store, and file sink

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
