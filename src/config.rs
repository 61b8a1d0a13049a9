//! Compiler configuration.
//!
//! Precedence: explicit file > environment > defaults. Environment variables:
//! - `NEXUSMAP_VALIDATION` (`0`/`false`/`no` disables path validation)
//! - `NEXUSMAP_MAX_PATH_DEPTH`
//! - `NEXUSMAP_MAX_IN_SET`
//! - `NEXUSMAP_LOG_LEVEL`, `NEXUSMAP_LOG_DIR`

use crate::errors::{QueryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_PATH_DEPTH: usize = 32;
pub const DEFAULT_MAX_IN_SET: usize = 1000;
pub const DEFAULT_MAX_SORT_FIELDS: usize = 32;
pub const DEFAULT_MAX_PROJECTION_FIELDS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Resolve and validate field paths against the schema.
    pub validation: bool,
    pub max_path_depth: usize,
    pub max_in_set: usize,
    pub max_sort_fields: usize,
    pub max_projection_fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            validation: true,
            max_path_depth: DEFAULT_MAX_PATH_DEPTH,
            max_in_set: DEFAULT_MAX_IN_SET,
            max_sort_fields: DEFAULT_MAX_SORT_FIELDS,
            max_projection_fields: DEFAULT_MAX_PROJECTION_FIELDS,
            log_level: None,
            log_dir: None,
        }
    }
}

impl CompilerConfig {
    /// # Errors
    /// Returns `QueryError::Config` if the TOML cannot be parsed.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| QueryError::Config(format!("config TOML: {e}")))
    }

    /// Reads a TOML config file. Environment variables fill only the keys the
    /// file does not set.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        let file_cfg = Self::from_toml_str(&s)?;
        let keys: toml::Table =
            toml::from_str(&s).map_err(|e| QueryError::Config(format!("config TOML: {e}")))?;
        Ok(file_cfg.with_overrides(|k| keys.contains_key(k), |k| std::env::var(k).ok()))
    }

    /// Defaults plus environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies every environment variable that is set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|_| false, |k| std::env::var(k).ok())
    }

    fn with_overrides(mut self, pinned: impl Fn(&str) -> bool, get: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str, var: &str| if pinned(key) { None } else { get(var) };
        if let Some(v) = env("validation", "NEXUSMAP_VALIDATION") {
            self.validation = !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Some(n) = env("max_path_depth", "NEXUSMAP_MAX_PATH_DEPTH").and_then(|s| s.parse().ok()) {
            self.max_path_depth = n;
        }
        if let Some(n) = env("max_in_set", "NEXUSMAP_MAX_IN_SET").and_then(|s| s.parse().ok()) {
            self.max_in_set = n;
        }
        if let Some(level) = env("log_level", "NEXUSMAP_LOG_LEVEL") {
            self.log_level = Some(level);
        }
        if let Some(dir) = env("log_dir", "NEXUSMAP_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn toml_partial_keeps_defaults() {
        let cfg = CompilerConfig::from_toml_str("validation = false\nmax_in_set = 5\n").unwrap();
        assert!(!cfg.validation);
        assert_eq!(cfg.max_in_set, 5);
        assert_eq!(cfg.max_path_depth, DEFAULT_MAX_PATH_DEPTH);
    }

    fn env(pairs: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn env_fills_keys_the_file_left_out() {
        let env = env(&[("NEXUSMAP_MAX_IN_SET", "7"), ("NEXUSMAP_MAX_PATH_DEPTH", "4"), ("NEXUSMAP_VALIDATION", "no")]);
        let file_cfg = CompilerConfig { max_in_set: 9, ..CompilerConfig::default() };
        let cfg = file_cfg.with_overrides(|k| k == "max_in_set", |k| env.get(k).map(|s| (*s).to_string()));
        assert_eq!(cfg.max_in_set, 9);
        assert_eq!(cfg.max_path_depth, 4);
        assert!(!cfg.validation);
    }

    #[test]
    fn file_value_equal_to_default_still_wins() {
        let env = env(&[("NEXUSMAP_VALIDATION", "no"), ("NEXUSMAP_MAX_IN_SET", "5")]);
        let cfg = CompilerConfig::default()
            .with_overrides(|k| k == "validation" || k == "max_in_set", |k| env.get(k).map(|s| (*s).to_string()));
        assert!(cfg.validation);
        assert_eq!(cfg.max_in_set, DEFAULT_MAX_IN_SET);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = CompilerConfig::from_toml_str("validation = 3").unwrap_err();
        assert!(matches!(err, QueryError::Config(_)));
    }
}
