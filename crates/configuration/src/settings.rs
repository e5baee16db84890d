use core_types::ColumnLayout;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::ConfigError;

/// The root configuration structure for the entire application.
///
/// Every section is optional; a missing `config.toml` yields the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub columns: ColumnSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where trial data is queried from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite file. When unset, `DATABASE_URL` from the
    /// environment (or `.env`) is used instead.
    pub path: Option<PathBuf>,
}

/// Names of the metadata columns in the `data` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub row_key: String,
    pub trial_id: String,
    pub patient_id: String,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        let layout = ColumnLayout::default();
        Self {
            row_key: layout.row_key,
            trial_id: layout.trial_id,
            patient_id: layout.patient_id,
        }
    }
}

impl ColumnSettings {
    pub fn layout(&self) -> ColumnLayout {
        ColumnLayout {
            row_key: self.row_key.clone(),
            trial_id: self.trial_id.clone(),
            patient_id: self.patient_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Optional log file. Console logging stays on regardless.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            &self.columns.row_key,
            &self.columns.trial_id,
            &self.columns.patient_id,
        ];

        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "metadata column names must not be empty".to_string(),
            ));
        }

        let unique: HashSet<&str> = names.iter().map(|name| name.as_str()).collect();
        if unique.len() != names.len() {
            return Err(ConfigError::ValidationError(format!(
                "metadata column names must be distinct, got {:?}",
                names
            )));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.level must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
