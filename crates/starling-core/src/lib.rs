//! # starling-core
//!
//! Core types, settings, and error types for the starling response layer.
//! This crate has no HTTP dependencies and provides the foundation for the
//! other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`settings`] - Response-layer settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{StarlingError, StarlingResult};
pub use settings::{Settings, SETTINGS};
