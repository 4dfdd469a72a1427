//! Optional response capabilities, resolved once at startup.
//!
//! JSON and file responses are behind the `json` and `file` cargo features.
//! [`Capabilities`] records which of them this process may use; constructors
//! of the gated variants take it as an argument and fail with a
//! configuration error instead of checking features at every call site.

use std::sync::OnceLock;

use starling_core::settings::CapabilitySettings;
use starling_core::{StarlingError, StarlingResult, SETTINGS};

static GLOBAL: OnceLock<Capabilities> = OnceLock::new();

/// An immutable descriptor of the optional response variants available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    json: bool,
    file: bool,
}

/// The process-wide capabilities, see [`Capabilities::global`].
impl Default for Capabilities {
    fn default() -> Self {
        Self::global()
    }
}

impl Capabilities {
    /// Reports what was compiled in.
    pub const fn detect() -> Self {
        Self {
            json: cfg!(feature = "json"),
            file: cfg!(feature = "file"),
        }
    }

    /// Reports what was compiled in and not switched off by settings.
    pub const fn from_settings(settings: &CapabilitySettings) -> Self {
        let compiled = Self::detect();
        Self {
            json: compiled.json && settings.json,
            file: compiled.file && settings.file,
        }
    }

    /// A descriptor with every optional variant unavailable.
    pub const fn none() -> Self {
        Self {
            json: false,
            file: false,
        }
    }

    /// The process-wide descriptor.
    ///
    /// Resolved on first use from the global settings when they are
    /// configured, from the compiled features otherwise; never changes
    /// afterwards.
    pub fn global() -> Self {
        *GLOBAL.get_or_init(|| {
            SETTINGS
                .try_get()
                .map_or_else(Self::detect, |settings| Self::from_settings(&settings.capabilities))
        })
    }

    /// Whether JSON responses are available.
    pub const fn json(&self) -> bool {
        self.json
    }

    /// Whether file responses are available.
    pub const fn file(&self) -> bool {
        self.file
    }

    pub(crate) fn require_json(&self) -> StarlingResult<()> {
        if self.json {
            Ok(())
        } else {
            Err(StarlingError::ConfigurationError(
                "JSON responses are unavailable: the `json` feature is disabled".to_string(),
            ))
        }
    }

    pub(crate) fn require_file(&self) -> StarlingResult<()> {
        if self.file {
            Ok(())
        } else {
            Err(StarlingError::ConfigurationError(
                "file responses are unavailable: the `file` feature is disabled".to_string(),
            ))
        }
    }
}
