//! `prism.toml` loading. The working directory is checked first, then the
//! platform config dir. Unknown fields are ignored and a malformed file
//! falls back to defaults, so a bad config never blocks translation.

use crate::TranslationOptions;
use anyhow::Result;
use prism_catalog::{Version, parse_driver_string};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
pub struct TranslationSection {
    /// `"3.30"` or `"330"`.
    #[serde(default)]
    pub target_version: Option<String>,
    #[serde(default = "TranslationSection::default_level")]
    pub optimization_level: u8,
    #[serde(default)]
    pub strict: bool,
}

impl TranslationSection {
    const fn default_level() -> u8 {
        1
    }
}

impl Default for TranslationSection {
    fn default() -> Self {
        Self {
            target_version: None,
            optimization_level: Self::default_level(),
            strict: false,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CacheSection {
    #[serde(default = "CacheSection::default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub disk: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl CacheSection {
    const fn default_capacity() -> usize {
        prism_cache::DEFAULT_CAPACITY
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub translation: TranslationSection,
    #[serde(default)]
    pub cache: CacheSection,
}

#[derive(Debug, Default, Clone)]
pub struct Config {
    pub file: ConfigFile,
}

/// Prefer a local `prism.toml`, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("prism.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("prism").join("prism.toml");
    }
    PathBuf::from("prism.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => {
                info!(target: "config", path = %path.display(), "config_loaded");
                Ok(Config { file })
            }
            Err(error) => {
                warn!(target: "config", path = %path.display(), %error, "config_parse_failed");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Translation options with the config's defaults applied.
    pub fn options(&self) -> TranslationOptions {
        let mut options = TranslationOptions::default();
        if let Some(raw) = &self.file.translation.target_version {
            match parse_target(raw) {
                Some(v) => options.target_version = v,
                None => {
                    warn!(target: "config", raw = raw.as_str(), "bad_target_version");
                }
            }
        }
        options.optimization_level = self.file.translation.optimization_level.min(3);
        options.strict = self.file.translation.strict;
        options
    }
}

/// Accepts `"330"`, `"3.30"` and friends.
pub fn parse_target(raw: &str) -> Option<Version> {
    if let Ok(code) = raw.parse::<u16>() {
        return Version::from_code(code);
    }
    parse_driver_string(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_missing() {
        let cfg = load_from(Some(PathBuf::from("__no_such_prism_config__.toml"))).unwrap();
        let options = cfg.options();
        assert_eq!(options.target_version, Version::V330);
        assert_eq!(options.optimization_level, 1);
        assert!(!options.strict);
    }

    #[test]
    fn parses_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            "[translation]\ntarget_version = \"1.50\"\noptimization_level = 2\nstrict = true\n[cache]\ncapacity = 64\ndisk = true\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let options = cfg.options();
        assert_eq!(options.target_version, Version::V150);
        assert_eq!(options.optimization_level, 2);
        assert!(options.strict);
        assert_eq!(cfg.file.cache.capacity, 64);
        assert!(cfg.file.cache.disk);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "this is [ not toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.options().optimization_level, 1);
    }

    #[test]
    fn target_spellings() {
        assert_eq!(parse_target("330"), Some(Version::V330));
        assert_eq!(parse_target("3.30"), Some(Version::V330));
        assert_eq!(parse_target("4.6"), Some(Version::V460));
        assert_eq!(parse_target("nope"), None);
    }

    #[test]
    fn level_is_clamped() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "[translation]\noptimization_level = 9\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.options().optimization_level, 3);
    }
}
