use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

use crate::formats::GRID_MINUTES;

/// Header of the timestamp column in raw analyzer exports.
pub const TIMESTAMP_COLUMN: &str = "Sampling date";
/// Sampled air volume, carried through unconverted.
pub const VOLUME_COLUMN: &str = "Volume";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstrumentType {
    /// Light hydrocarbons, one reading per 30 minute window.
    C2C6,
    /// Heavy hydrocarbons, one reading per 60 minute window.
    C6C20,
}

impl InstrumentType {
    pub const ALL: [InstrumentType; 2] = [InstrumentType::C2C6, InstrumentType::C6C20];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::C2C6 => "C2-C6",
            InstrumentType::C6C20 => "C6-C20",
        }
    }

    pub fn native_window_minutes(&self) -> i64 {
        match self {
            InstrumentType::C2C6 => 30,
            InstrumentType::C6C20 => 60,
        }
    }

    /// Number of grid slots covered by one native measurement window.
    pub fn quarter_slots(&self) -> usize {
        (self.native_window_minutes() / GRID_MINUTES) as usize
    }

    /// File name suffix used by the analyzer exports, e.g. `C6-C20.Asc`.
    pub fn file_suffix(&self) -> String {
        format!("{}.Asc", self.as_str())
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readings of one instrument: a `Sampling date` column (millisecond datetimes) followed by
/// one `Float64` column per compound.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub instrument: InstrumentType,
    pub df: DataFrame,
}

impl InstrumentSeries {
    pub fn new(instrument: InstrumentType, df: DataFrame) -> Self {
        Self { instrument, df }
    }

    pub fn from_columns(
        instrument: InstrumentType,
        timestamps: &[NaiveDateTime],
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> PolarsResult<Self> {
        let mut cols: Vec<Column> = Vec::with_capacity(columns.len() + 1);
        cols.push(timestamp_series(timestamps)?.into());
        for (name, values) in columns {
            cols.push(Series::new(name.into(), values).into());
        }
        Ok(Self::new(instrument, DataFrame::new(cols)?))
    }

    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names other than the timestamp, in frame order.
    pub fn value_columns(&self) -> Vec<String> {
        value_columns(&self.df)
    }

    pub fn timestamps(&self) -> PolarsResult<Vec<NaiveDateTime>> {
        timestamps(&self.df)
    }

    pub fn values(&self, column: &str) -> PolarsResult<Vec<Option<f64>>> {
        float_values(&self.df, column)
    }
}

#[derive(Debug, Clone)]
pub struct ParsedReadings {
    pub series: InstrumentSeries,
    /// Malformed lines that were dropped while parsing.
    pub skipped_rows: usize,
}

pub fn timestamp_series(timestamps: &[NaiveDateTime]) -> PolarsResult<Series> {
    let millis: Vec<i64> = timestamps
        .iter()
        .map(|timestamp| timestamp.and_utc().timestamp_millis())
        .collect();
    Series::new(TIMESTAMP_COLUMN.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

pub fn value_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != TIMESTAMP_COLUMN)
        .map(|name| name.to_string())
        .collect()
}

pub fn timestamps(df: &DataFrame) -> PolarsResult<Vec<NaiveDateTime>> {
    let millis = df.column(TIMESTAMP_COLUMN)?.cast(&DataType::Int64)?;
    Ok(millis
        .i64()?
        .into_iter()
        .flatten()
        .filter_map(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
        .collect())
}

pub fn float_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(df.column(column)?.f64()?.into_iter().collect())
}
