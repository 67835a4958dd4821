//! Configuration model for shellforge.
//!
//! This module defines the Config struct that represents an optional
//! `shellforge.yaml`. It supports forward-compatible YAML parsing (unknown
//! fields are ignored), defaults for every field, and validation of values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::MakeBackend;
