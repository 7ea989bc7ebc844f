//! Shared library for the anime catalog aggregation workspace.
//!
//! This crate provides common functionality used by the aggregator:
//! - Configuration management
//! - Logging infrastructure
//! - The normalized anime data model

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
