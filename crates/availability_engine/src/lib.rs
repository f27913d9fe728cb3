//! # Availability Engine
//!
//! This crate aggregates campsite availability for a recreation.gov campground.
//! It normalizes the requested date window, resolves facility and recreation
//! area identifiers, fans out monthly availability requests, and merges them
//! into one calendar that is filtered, sorted and summarized.

/// Status, calendar, window and month types shared across the engine
mod availability_types;
pub use availability_types::*;

/// Process and per-run configuration
mod config;
pub use config::*;

/// Per-run call log and processing notes
mod run_context;
pub use run_context::*;

/// Date window normalization and month enumeration
mod dates;
pub use dates::*;

/// Upstream collaborator trait and wire payloads
mod source;
pub use source::*;

/// HTTP client for recreation.gov and RIDB
mod rec_gov_client;
pub use rec_gov_client::*;

/// Campground to facility / recreation-area resolution
mod identifiers;
pub use identifiers::*;

/// Monthly fan-out and calendar merge
mod merge;
pub use merge::*;

/// Natural site ordering
mod sort;
pub use sort::*;

/// Window, site and status projection into rows
mod filter;
pub use filter::*;

/// Status counts and compact rendering
mod summary;
pub use summary::*;

/// Selection of campsites for the detail fetch
mod detail_selector;
pub use detail_selector::*;

/// Per-run campsite detail cache
mod detail_cache;
pub use detail_cache::*;

/// Aggregation entry point
mod engine;
pub use engine::*;
