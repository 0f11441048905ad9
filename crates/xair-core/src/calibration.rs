use std::path::Path;

use chrono::Duration;
use polars::prelude::PolarsResult;
use xair_parser::InstrumentSeries;

use crate::config::CalibrationConfig;
use crate::frame::shift_timestamps;

/// File-name marker of calibration runs.
pub const CALIBRATION_MARKER: &str = "CAL60";
/// Calibration results are stamped at the end of their window; this moves them to its start.
pub const CALIBRATION_OFFSET_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationCorrector {
    marker: String,
    offset: Duration,
}

impl Default for CalibrationCorrector {
    fn default() -> Self {
        Self::new(
            CALIBRATION_MARKER,
            Duration::minutes(CALIBRATION_OFFSET_MINUTES),
        )
    }
}

impl CalibrationCorrector {
    pub fn new(marker: impl Into<String>, offset: Duration) -> Self {
        Self {
            marker: marker.into(),
            offset,
        }
    }

    pub fn from_config(config: &CalibrationConfig) -> Self {
        Self::new(
            config.marker.clone(),
            Duration::minutes(config.offset_minutes),
        )
    }

    pub fn is_calibration_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().contains(&self.marker))
            .unwrap_or(false)
    }

    /// Shifts the series back by the offset when `path` names a calibration run.
    pub fn apply(&self, path: &Path, series: InstrumentSeries) -> PolarsResult<InstrumentSeries> {
        if self.is_calibration_file(path) {
            self.shift(series)
        } else {
            Ok(series)
        }
    }

    pub fn shift(&self, series: InstrumentSeries) -> PolarsResult<InstrumentSeries> {
        let df = shift_timestamps(series.df, -self.offset.num_minutes())?;
        Ok(InstrumentSeries::new(series.instrument, df))
    }
}
