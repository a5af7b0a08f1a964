//! Tool locations, counter file extensions and default output names
//!
//! Defaults match a stock grcov + LLVM install. A TOML file may override any
//! subset of keys:
//!
//! ```toml
//! grcov = "/opt/grcov/v0.4.3/grcov"
//! llvm_cov = "llvm-cov-15"
//! timeout_secs = 600
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{CoverageError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// Report generator consuming gcno/gcda pairs
    pub grcov: String,
    /// Profile merge step used by the HTML command
    pub llvm_profdata: String,
    /// Render step used by the HTML command
    pub llvm_cov: String,
    /// Extension of the per-binary definition (notes) file, without the dot
    pub definition_extension: String,
    /// Extension of the per-binary data file, without the dot
    pub data_extension: String,
    pub lcov_filename: String,
    pub profraw_filename: String,
    pub profdata_filename: String,
    pub html_filename: String,
    /// Upper bound on any single external tool run; unbounded when absent
    pub timeout_secs: Option<u64>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            grcov: "grcov".to_string(),
            llvm_profdata: "llvm-profdata".to_string(),
            llvm_cov: "llvm-cov".to_string(),
            definition_extension: "gcno".to_string(),
            data_extension: "gcda".to_string(),
            lcov_filename: "lcov.info".to_string(),
            profraw_filename: "default.profraw".to_string(),
            profdata_filename: "default.profdata".to_string(),
            html_filename: "code_coverage.html".to_string(),
            timeout_secs: None,
        }
    }
}

impl CoverageConfig {
    /// Load overrides from a TOML file; missing keys keep their defaults
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CoverageError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| CoverageError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoverageError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.definition_extension.is_empty() || self.data_extension.is_empty() {
            return Err(CoverageError::Config(
                "counter file extensions must not be empty".to_string(),
            ));
        }
        if self.definition_extension == self.data_extension {
            return Err(CoverageError::Config(format!(
                "definition and data extensions are both '{}'",
                self.data_extension
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(CoverageError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
