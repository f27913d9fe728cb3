//! # Web Handlers for the Availability Service
//!
//! This crate provides the HTTP handlers that turn query parameters into an
//! engine run and serialize the aggregated result.

/// Query, path and error types for availability requests
mod availability_types;
pub use availability_types::*;

/// Handlers for the availability API endpoints
mod availability_handlers;
pub use availability_handlers::*;
