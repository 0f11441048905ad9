use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{col, lit, IntoLazy};
use thiserror::Error;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use xair_parser::{decode_text, InstrumentSeries, VOLUME_COLUMN};

use crate::error::{PipelineError, Result};

#[derive(Debug, Error)]
pub enum ConversionTableError {
    #[error("conversion factor file {} not found", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read conversion factor file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse conversion factor file {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("conversion factor file {} has no header row", path.display())]
    MissingHeader { path: PathBuf },
    #[error("conversion factor file {} line {line}: invalid factor '{value}' for '{compound}'", path.display())]
    InvalidFactor {
        path: PathBuf,
        line: usize,
        compound: String,
        value: String,
    },
    #[error("conversion factor file {} contains no factors", path.display())]
    Empty { path: PathBuf },
}

/// Lookup key shared by factor-file entries and data columns: NFC, trailing `.<digits>`
/// duplicate marker removed, trimmed, lowercase. Interior dots are part of the name.
pub fn normalize_compound(name: &str) -> String {
    let composed: String = name.nfc().collect();
    let trimmed = composed.trim();
    let base = match trimmed.rsplit_once('.') {
        Some((base, suffix))
            if !base.is_empty()
                && !suffix.is_empty()
                && suffix.chars().all(|ch| ch.is_ascii_digit()) =>
        {
            base
        }
        _ => trimmed,
    };
    base.trim().to_lowercase()
}

/// Compound to multiplier lookup, built once per run and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct ConversionTable {
    factors: HashMap<String, f64>,
}

impl ConversionTable {
    pub fn load(path: &Path) -> std::result::Result<Self, ConversionTableError> {
        if !path.is_file() {
            return Err(ConversionTableError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = fs::read(path).map_err(|source| ConversionTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_str(&decode_text(&bytes), path)
    }

    /// Parses factor CSV content. `source` is only used in error messages.
    pub fn from_csv_str(
        content: &str,
        source: &Path,
    ) -> std::result::Result<Self, ConversionTableError> {
        let delimiter = detect_delimiter(content);
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut records = reader.records();

        let header = records
            .next()
            .ok_or_else(|| ConversionTableError::MissingHeader {
                path: source.to_path_buf(),
            })?
            .map_err(|err| ConversionTableError::Csv {
                path: source.to_path_buf(),
                source: err,
            })?;
        let (name_idx, factor_idx) = locate_columns(&header);

        let mut factors = HashMap::new();
        for (row_idx, record) in records.enumerate() {
            let record = record.map_err(|err| ConversionTableError::Csv {
                path: source.to_path_buf(),
                source: err,
            })?;
            let line = row_idx + 2;
            let compound = record.get(name_idx).unwrap_or_default().trim();
            if compound.is_empty() {
                continue;
            }
            let raw = record.get(factor_idx).unwrap_or_default().trim();
            let factor = parse_factor(raw, delimiter).ok_or_else(|| {
                ConversionTableError::InvalidFactor {
                    path: source.to_path_buf(),
                    line,
                    compound: compound.to_string(),
                    value: raw.to_string(),
                }
            })?;

            let key = normalize_compound(compound);
            if factors.contains_key(&key) {
                warn!(compound, line, "duplicate conversion factor ignored");
                continue;
            }
            factors.insert(key, factor);
        }

        if factors.is_empty() {
            return Err(ConversionTableError::Empty {
                path: source.to_path_buf(),
            });
        }
        debug!(count = factors.len(), path = %source.display(), "loaded conversion factors");
        Ok(Self { factors })
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn factor(&self, compound: &str) -> Option<f64> {
        self.factors.get(&normalize_compound(compound)).copied()
    }

    /// Multiplies every compound column by its factor. `Volume` is left as is.
    pub fn apply(&self, series: InstrumentSeries, path: &Path) -> Result<InstrumentSeries> {
        let mut exprs = Vec::new();
        for name in series.value_columns() {
            if name.eq_ignore_ascii_case(VOLUME_COLUMN) {
                continue;
            }
            let factor = self
                .factor(&name)
                .ok_or_else(|| PipelineError::Conversion {
                    compound: name.clone(),
                    path: path.to_path_buf(),
                })?;
            exprs.push((col(name.as_str()) * lit(factor)).alias(name.as_str()));
        }

        if exprs.is_empty() {
            return Ok(series);
        }
        let df = series.df.lazy().with_columns(exprs).collect()?;
        Ok(InstrumentSeries::new(series.instrument, df))
    }
}

fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.contains(';') && !first_line.contains(',') {
        b';'
    } else {
        b','
    }
}

fn locate_columns(header: &csv::StringRecord) -> (usize, usize) {
    let keys: Vec<String> = header.iter().map(header_key).collect();
    let name_idx = keys
        .iter()
        .position(|key| key.starts_with("compos") || key.starts_with("compound"))
        .unwrap_or(0);
    let factor_idx = keys
        .iter()
        .position(|key| key.contains("facteur") || key.contains("factor"))
        .unwrap_or(if name_idx == 0 { 1 } else { 0 });
    (name_idx, factor_idx)
}

fn header_key(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .nfd()
        .filter(|ch| !unicode_normalization::char::is_combining_mark(*ch))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn parse_factor(raw: &str, delimiter: u8) -> Option<f64> {
    let parsed = if delimiter == b';' {
        raw.replace(',', ".").parse::<f64>().ok()
    } else {
        raw.parse::<f64>().ok()
    };
    parsed.filter(|factor| factor.is_finite() && *factor > 0.0)
}
