//! Settings system for starling.
//!
//! This module provides the [`Settings`] struct, which holds the response
//! layer's configuration, and [`LazySettings`], a globally-accessible,
//! lazily-initialized settings instance configured once at process start.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Toggles that can narrow the optional response capabilities at startup.
///
/// A capability is only available when it is both compiled in and enabled
/// here; settings can switch a compiled-in capability off, never on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySettings {
    /// Whether JSON responses may be constructed.
    pub json: bool,
    /// Whether file responses may be constructed.
    pub file: bool,
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        Self {
            json: true,
            file: true,
        }
    }
}

/// The complete set of response-layer settings.
///
/// # Examples
///
/// ```
/// use starling_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.default_charset, "utf-8");
/// assert_eq!(settings.file_chunk_size, 4096);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Responses ────────────────────────────────────────────────────

    /// Charset used to encode text bodies when a response doesn't set one.
    pub default_charset: String,
    /// Number of bytes read per body event by file responses.
    pub file_chunk_size: usize,
    /// Capacity of the channel between a synchronous body producer and the
    /// emitting task.
    pub stream_buffer: usize,
    /// Capability toggles.
    pub capabilities: CapabilitySettings,

    // ── Templates ────────────────────────────────────────────────────

    /// Directories to search for template files.
    pub template_dirs: Vec<PathBuf>,
    /// Whether template output is HTML auto-escaped.
    pub template_autoescape: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The minimum log level (e.g. "debug", "info", "warn", "error").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            default_charset: "utf-8".to_string(),
            file_chunk_size: 4096,
            stream_buffer: 16,
            capabilities: CapabilitySettings::default(),
            template_dirs: Vec::new(),
            template_autoescape: true,
            log_level: "info".to_string(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, or `None` before configuration.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
