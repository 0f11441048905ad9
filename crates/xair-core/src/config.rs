use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::calibration::{CALIBRATION_MARKER, CALIBRATION_OFFSET_MINUTES};

pub const DEFAULT_INPUT_DIR: &str = "./data";
pub const DEFAULT_OUTPUT_DIR: &str = "./";
pub const DEFAULT_FACTORS_PATH: &str = "./facteurs_de_conversions_C2-C20.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How many output files a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// `xair_<year>.csv`
    #[default]
    Year,
    /// `xair_<year>_<MM>.csv`
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Year => f.write_str("year"),
            Granularity::Month => f.write_str("month"),
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "year" | "yearly" => Ok(Granularity::Year),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(format!("unknown granularity '{other}', expected 'year' or 'month'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    pub marker: String,
    pub offset_minutes: i64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            marker: CALIBRATION_MARKER.to_string(),
            offset_minutes: CALIBRATION_OFFSET_MINUTES,
        }
    }
}

/// Settings for one run. Every field has a default, so a config file only lists overrides.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XairConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub factors: PathBuf,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub granularity: Granularity,
    pub calibration: CalibrationConfig,
}

impl Default for XairConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            factors: PathBuf::from(DEFAULT_FACTORS_PATH),
            year: None,
            month: None,
            granularity: Granularity::default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

impl XairConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: XairConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return Err(ConfigError::Invalid(format!(
                    "month must be between 1 and 12, got {month}"
                )));
            }
        }
        if self.calibration.marker.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "calibration marker must not be empty".to_string(),
            ));
        }
        let offset = self.calibration.offset_minutes;
        if offset < 0 || offset % xair_parser::GRID_MINUTES != 0 {
            return Err(ConfigError::Invalid(format!(
                "calibration offset must be a non-negative multiple of {} minutes, got {offset}",
                xair_parser::GRID_MINUTES
            )));
        }
        Ok(())
    }
}
