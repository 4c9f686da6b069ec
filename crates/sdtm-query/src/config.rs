//! Engine configuration.
//!
//! ```toml
//! project = "P01"
//! folder = "sdtm"
//! as_of = "2024-06-30"
//!
//! [fallbacks]
//! AEENDTC = "ONGOING"
//! CMCAT = "No categories"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::category::{FallbackPolicy, default_fallbacks};
use crate::error::ConfigError;

/// Which dataset a query reads and how placeholders resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Project number, the first part of the dataset schema.
    pub project: String,
    /// Dataset folder within the project (e.g. `sdtm`).
    pub folder: String,
    /// Date an ongoing anchor end resolves to. Defaults to today.
    pub as_of: Option<NaiveDate>,
    /// Sentinel per source field. A table given in the file replaces the
    /// built-in map.
    pub fallbacks: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            folder: "sdtm".to_string(),
            as_of: None,
            fallbacks: default_fallbacks(),
        }
    }
}

impl EngineConfig {
    pub fn new(project: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Dataset schema, `{project}_{folder}` with the folder lower-cased.
    pub fn schema(&self) -> String {
        format!("{}_{}", self.project.trim(), self.folder.trim().to_lowercase())
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        FallbackPolicy::from_map(self.fallbacks.clone())
    }

    /// The configured `as_of` date, or today's local date.
    pub fn reference_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), schema = %config.schema(), "loaded config");
        Ok(config)
    }
}
