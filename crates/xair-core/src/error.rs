use std::path::PathBuf;

use thiserror::Error;
use xair_parser::ParserError;

use crate::config::ConfigError;
use crate::conversion::ConversionTableError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Can not find directory {}, please check that it exists and the path syntax", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("No files matching {pattern}")]
    NoFilesFound { pattern: String },

    #[error("No year or month directories found in {}", path.display())]
    EmptyInput { path: PathBuf },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },

    #[error("No conversion factor for compound '{compound}' (in {})", path.display())]
    Conversion { compound: String, path: PathBuf },

    #[error("Invalid month {0}, expected 1-12")]
    InvalidMonth(u32),

    #[error(transparent)]
    ConversionTable(#[from] ConversionTableError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("File I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
