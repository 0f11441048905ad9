use chrono::NaiveDateTime;
use tracing::warn;

use crate::errors::ParserError;
use crate::model::{InstrumentSeries, InstrumentType, ParsedReadings, TIMESTAMP_COLUMN};
use crate::registry::ReadingParser;

use super::{clean_header, parse_timestamp, parse_value, round_to_grid};

/// Tab-delimited `.Asc` export written by the VOC analyzers.
pub struct AscParser {
    instrument: InstrumentType,
}

impl AscParser {
    const NAME: &'static str = "ASC";

    pub fn new(instrument: InstrumentType) -> Self {
        Self { instrument }
    }
}

impl ReadingParser for AscParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedReadings, ParserError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut records = reader.records();

        let header = records
            .next()
            .ok_or(ParserError::EmptyFile { parser: Self::NAME })?
            .map_err(|err| ParserError::Csv {
                parser: Self::NAME,
                source: err,
            })?;

        let names = clean_header(&header);
        let timestamp_idx = names
            .iter()
            .position(|name| {
                name.as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(TIMESTAMP_COLUMN))
            })
            .ok_or(ParserError::MissingColumn {
                parser: Self::NAME,
                column: TIMESTAMP_COLUMN,
            })?;

        let value_columns: Vec<(usize, String)> = names
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != timestamp_idx)
            .filter_map(|(idx, name)| name.clone().map(|name| (idx, name)))
            .collect();

        let mut timestamps: Vec<NaiveDateTime> = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); value_columns.len()];
        let mut skipped_rows = 0usize;

        for (row_idx, record) in records.enumerate() {
            let record = record.map_err(|err| ParserError::Csv {
                parser: Self::NAME,
                source: err,
            })?;
            let line_index = row_idx + 2;

            if record.len() > header.len() {
                warn!(
                    line_index,
                    fields = record.len(),
                    expected = header.len(),
                    "skipping line with too many fields"
                );
                skipped_rows += 1;
                continue;
            }

            let raw_timestamp = record.get(timestamp_idx).unwrap_or("").trim();
            if raw_timestamp.is_empty() {
                warn!(line_index, "skipping line without a sampling date");
                skipped_rows += 1;
                continue;
            }

            let parsed = parse_timestamp(Self::NAME, raw_timestamp, line_index)?;
            let timestamp = round_to_grid(parsed).ok_or_else(|| ParserError::DataRow {
                parser: Self::NAME,
                line_index,
                message: format!("timestamp '{raw_timestamp}' is out of range"),
            })?;

            timestamps.push(timestamp);
            for ((idx, _), column) in value_columns.iter().zip(values.iter_mut()) {
                column.push(record.get(*idx).and_then(parse_value));
            }
        }

        let columns = value_columns
            .into_iter()
            .map(|(_, name)| name)
            .zip(values)
            .collect();
        let series = InstrumentSeries::from_columns(self.instrument, &timestamps, columns)
            .map_err(|err| ParserError::Validation {
                parser: Self::NAME,
                message: format!("failed to build readings dataframe: {err}"),
            })?;

        Ok(ParsedReadings {
            series,
            skipped_rows,
        })
    }
}
