use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use xair_parser::InstrumentType;

use crate::error::{PipelineError, Result};

pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::DirectoryNotFound {
            path: path.to_path_buf(),
        })
    }
}

pub fn year_dir(input_root: &Path, year: i32) -> PathBuf {
    input_root.join(year.to_string())
}

pub fn month_dir(input_root: &Path, year: i32, month: u32) -> PathBuf {
    year_dir(input_root, year).join(format!("{month:02}"))
}

/// Years to process, ascending. A requested year must have its own directory.
pub fn discover_years(input_root: &Path, filter: Option<i32>) -> Result<Vec<i32>> {
    if let Some(year) = filter {
        ensure_directory(&year_dir(input_root, year))?;
        return Ok(vec![year]);
    }

    let years = numeric_subdirectories(input_root)?
        .into_iter()
        .filter_map(|(name, value)| match i32::try_from(value) {
            Ok(year) => Some(year),
            Err(_) => {
                warn!(%name, "ignoring out of range year directory");
                None
            }
        })
        .collect::<Vec<_>>();

    if years.is_empty() {
        return Err(PipelineError::EmptyInput {
            path: input_root.to_path_buf(),
        });
    }
    Ok(years)
}

/// Months to process for one year directory, ascending.
pub fn discover_months(year_dir: &Path, filter: Option<u32>) -> Result<Vec<u32>> {
    if let Some(month) = filter {
        return Ok(vec![month]);
    }

    let months = numeric_subdirectories(year_dir)?
        .into_iter()
        .filter_map(|(name, value)| match u32::try_from(value) {
            Ok(month) if (1..=12).contains(&month) => Some(month),
            _ => {
                warn!(%name, "ignoring directory that is not a month");
                None
            }
        })
        .collect::<Vec<_>>();

    if months.is_empty() {
        return Err(PipelineError::EmptyInput {
            path: year_dir.to_path_buf(),
        });
    }
    Ok(months)
}

/// Export files of one instrument in a month directory, in lexicographic path order.
pub fn instrument_files(month_dir: &Path, instrument: InstrumentType) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*{}",
        Pattern::escape(&month_dir.to_string_lossy()),
        instrument.file_suffix()
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry.map_err(|err| {
            let path = err.path().to_path_buf();
            PipelineError::io(path, std::io::Error::from(err))
        })?;
        if path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(PipelineError::NoFilesFound { pattern });
    }

    files.sort();
    debug!(count = files.len(), %pattern, "discovered instrument files");
    Ok(files)
}

fn numeric_subdirectories(dir: &Path) -> Result<Vec<(String, i64)>> {
    ensure_directory(dir)?;
    let entries = fs::read_dir(dir).map_err(|err| PipelineError::io(dir, err))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| PipelineError::io(dir, err))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        match name.parse::<i64>() {
            Ok(value) => found.push((name, value)),
            Err(_) => debug!(%name, "skipping non-numeric directory"),
        }
    }
    found.sort_by_key(|(_, value)| *value);
    Ok(found)
}
