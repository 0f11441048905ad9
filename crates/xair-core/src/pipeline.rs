//! Per-year, per-month driver: discover -> parse -> calibrate -> convert -> quarter-fill
//! -> dedup -> merge -> clip -> write.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::{debug, info, warn};
use xair_parser::{decode_text, parse_reading_file, InstrumentSeries, InstrumentType};

use crate::calibration::CalibrationCorrector;
use crate::config::{Granularity, XairConfig};
use crate::conversion::ConversionTable;
use crate::dedup::deduplicate;
use crate::discovery::{
    discover_months, discover_years, ensure_directory, instrument_files, month_dir, year_dir,
};
use crate::error::{PipelineError, Result};
use crate::frame::concat_diagonal;
use crate::merge::merge_series;
use crate::month_window::filter_month;
use crate::outputs::{output_file_name, write_csv};
use crate::quarter_fill::quarter_fill;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_processed: usize,
    pub skipped_rows: usize,
    pub months_processed: usize,
    pub rows_written: usize,
    pub outputs: Vec<PathBuf>,
}

pub struct Pipeline<'a> {
    factors: &'a ConversionTable,
    config: &'a XairConfig,
    calibration: CalibrationCorrector,
}

impl<'a> Pipeline<'a> {
    pub fn new(factors: &'a ConversionTable, config: &'a XairConfig) -> Self {
        Self {
            factors,
            config,
            calibration: CalibrationCorrector::from_config(&config.calibration),
        }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let input = &self.config.input;
        let output = &self.config.output;
        ensure_directory(input)?;
        ensure_directory(output)?;

        let mut summary = RunSummary::default();
        for year in discover_years(input, self.config.year)? {
            let months = discover_months(&year_dir(input, year), self.config.month)?;
            info!(year, months = ?months, "processing year");

            match self.config.granularity {
                Granularity::Year => {
                    let mut month_tables = Vec::with_capacity(months.len());
                    for month in months {
                        month_tables.push(self.build_month(year, month, &mut summary)?);
                    }
                    let mut year_table = concat_diagonal(month_tables)?;
                    let path = output.join(output_file_name(year, None));
                    self.write(&mut year_table, path, &mut summary)?;
                }
                Granularity::Month => {
                    for month in months {
                        let mut month_table = self.build_month(year, month, &mut summary)?;
                        let path = output.join(output_file_name(year, Some(month)));
                        self.write(&mut month_table, path, &mut summary)?;
                    }
                }
            }
        }

        info!(
            files = summary.files_processed,
            months = summary.months_processed,
            rows = summary.rows_written,
            "run complete"
        );
        Ok(summary)
    }

    /// Merged, calendar-clipped table of both instruments for one month.
    pub fn build_month(
        &self,
        year: i32,
        month: u32,
        summary: &mut RunSummary,
    ) -> Result<DataFrame> {
        let dir = month_dir(&self.config.input, year, month);
        let mut instruments = Vec::with_capacity(InstrumentType::ALL.len());
        for instrument in InstrumentType::ALL {
            let files = instrument_files(&dir, instrument)?;
            instruments.push(self.build_instrument_series(&files, instrument, summary)?);
        }

        let table = filter_month(merge_series(instruments)?, year, month)?;
        summary.months_processed += 1;
        info!(year, month, rows = table.height(), "month assembled");
        Ok(table)
    }

    /// Processes `files` in the given order and keeps the first row per timestamp.
    pub fn build_instrument_series(
        &self,
        files: &[PathBuf],
        instrument: InstrumentType,
        summary: &mut RunSummary,
    ) -> Result<InstrumentSeries> {
        let mut frames = Vec::with_capacity(files.len());
        for path in files {
            let (series, skipped) = self.process_file(path, instrument)?;
            summary.files_processed += 1;
            summary.skipped_rows += skipped;
            frames.push(series.df);
        }

        let combined = InstrumentSeries::new(instrument, concat_diagonal(frames)?);
        let before = combined.len();
        let deduped = deduplicate(combined)?;
        debug!(
            %instrument,
            before,
            after = deduped.len(),
            "removed duplicate timestamps"
        );
        Ok(deduped)
    }

    /// One raw file through normalization, calibration, conversion and quarter-filling.
    /// Also returns the number of malformed lines that were skipped.
    pub fn process_file(
        &self,
        path: &Path,
        instrument: InstrumentType,
    ) -> Result<(InstrumentSeries, usize)> {
        let bytes = fs::read(path).map_err(|err| PipelineError::io(path, err))?;
        let content = decode_text(&bytes);
        let parsed =
            parse_reading_file(&content, instrument).map_err(|source| PipelineError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if parsed.skipped_rows > 0 {
            warn!(path = %path.display(), skipped = parsed.skipped_rows, "skipped malformed lines");
        }

        let calibrated = self.calibration.apply(path, parsed.series)?;
        let converted = self.factors.apply(calibrated, path)?;
        let filled = quarter_fill(converted)?;
        debug!(path = %path.display(), rows = filled.len(), "processed file");
        Ok((filled, parsed.skipped_rows))
    }

    fn write(&self, table: &mut DataFrame, path: PathBuf, summary: &mut RunSummary) -> Result<()> {
        write_csv(table, &path)?;
        summary.rows_written += table.height();
        summary.outputs.push(path);
        Ok(())
    }
}
