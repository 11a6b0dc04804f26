//! Static catalog of GLSL versions, shader stages, language features and the
//! extensions that promote them.
//!
//! Everything in this crate is a pure, process-lifetime table: no I/O, no
//! mutable state. It is the single source of truth for "can target T express
//! feature F?" questions asked by the rewrite engine, and for source-version
//! detection when a shader omits its `#version` directive.

mod detect;
mod extension;
mod feature;
mod version;

pub use detect::{detect_version, parse_driver_string};
pub use extension::{Extension, EXTENSIONS, promoting_extension};
pub use feature::{Feature, feature_available, minimum_version_for};
pub use version::{Stage, Version};

/// Capabilities reported by the host graphics driver, read once at startup.
///
/// The core never talks to the driver itself; callers construct this from
/// whatever `glGetString(GL_SHADING_LANGUAGE_VERSION)` and the extension
/// enumeration returned and hand it to the translator.
#[derive(Debug, Clone)]
pub struct DriverCapabilities {
    pub max_version: Version,
    pub extensions: Vec<String>,
}

impl DriverCapabilities {
    /// Build capabilities from a raw driver version string plus the extension
    /// list. Unparseable version strings fall back to the newest catalogued
    /// version so an exotic driver string never artificially caps targets.
    pub fn from_driver_strings(version: &str, extensions: Vec<String>) -> Self {
        let max_version = parse_driver_string(version).unwrap_or(Version::V460);
        tracing::debug!(
            target: "catalog",
            raw = version,
            resolved = max_version.code(),
            extension_count = extensions.len(),
            "driver_capabilities"
        );
        Self {
            max_version,
            extensions,
        }
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }
}

impl Default for DriverCapabilities {
    fn default() -> Self {
        Self {
            max_version: Version::V460,
            extensions: Vec::new(),
        }
    }
}
