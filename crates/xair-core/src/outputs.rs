use std::fs::{self, File};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::info;

use crate::error::{PipelineError, Result};

pub const OUTPUT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `xair_<year>.csv`, or `xair_<year>_<MM>.csv` for a single month.
pub fn output_file_name(year: i32, month: Option<u32>) -> String {
    match month {
        Some(month) => format!("xair_{year}_{month:02}.csv"),
        None => format!("xair_{year}.csv"),
    }
}

/// Writes the table as CSV, timestamp column first. The file only appears at `path` once
/// fully written.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let staging = staging_path(path);

    let written = File::create(&staging)
        .map_err(|err| PipelineError::io(&staging, err))
        .and_then(|mut file| {
            CsvWriter::new(&mut file)
                .include_header(true)
                .with_datetime_format(Some(OUTPUT_DATETIME_FORMAT.to_string()))
                .finish(&mut *df)
                .map_err(PipelineError::from)
        });

    if let Err(err) = written {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }

    fs::rename(&staging, path).map_err(|err| PipelineError::io(path, err))?;
    info!(path = %path.display(), rows = df.height(), columns = df.width(), "wrote output");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use polars::prelude::{Column, NamedFrom, Series};
    use xair_parser::timestamp_series;

    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
    }

    fn frame() -> DataFrame {
        let columns: Vec<Column> = vec![
            timestamp_series(&[at("2022-01-15 08:00"), at("2022-01-15 08:15")])
                .unwrap()
                .into(),
            Series::new("Ethane".into(), vec![Some(1.0), Some(2.5)]).into(),
            Series::new("Benzene".into(), vec![Some(-3.0), None]).into(),
        ];
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn names_follow_granularity() {
        assert_eq!(output_file_name(2022, None), "xair_2022.csv");
        assert_eq!(output_file_name(2022, Some(3)), "xair_2022_03.csv");
    }

    #[test]
    fn writes_csv_with_formatted_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(output_file_name(2022, Some(1)));
        write_csv(&mut frame(), &path).unwrap();

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["Sampling date", "Ethane", "Benzene"]
        );

        let rows: Vec<::csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some("2022-01-15 08:00:00"));
        assert_eq!(rows[1].get(2), Some(""));
        assert_eq!(rows[0].get(2).unwrap().parse::<f64>().unwrap(), -3.0);
        assert!(!staging_path(&path).exists());
    }
}
