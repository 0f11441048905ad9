use polars::prelude::{PolarsResult, UniqueKeepStrategy};
use xair_parser::{InstrumentSeries, TIMESTAMP_COLUMN};

use crate::frame::sort_by_timestamp;

/// Keeps the first row per timestamp in processing order, then orders rows by timestamp.
pub fn deduplicate(series: InstrumentSeries) -> PolarsResult<InstrumentSeries> {
    let sorted = sort_by_timestamp(&series.df)?;
    let subset = [TIMESTAMP_COLUMN.to_string()];
    let df = sorted.unique_stable(Some(subset.as_slice()), UniqueKeepStrategy::First, None)?;
    Ok(InstrumentSeries::new(series.instrument, df))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use xair_parser::InstrumentType;

    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
    }

    fn series(rows: &[(&str, f64)]) -> InstrumentSeries {
        let stamps: Vec<NaiveDateTime> = rows.iter().map(|(ts, _)| at(ts)).collect();
        let values = rows.iter().map(|(_, value)| Some(*value)).collect();
        InstrumentSeries::from_columns(
            InstrumentType::C2C6,
            &stamps,
            vec![("Ethane".into(), values)],
        )
        .unwrap()
    }

    #[test]
    fn first_row_wins() {
        let deduped = deduplicate(series(&[
            ("2022-01-15 08:30", 1.0),
            ("2022-01-15 08:00", 2.0),
            ("2022-01-15 08:30", 3.0),
            ("2022-01-15 08:00", 4.0),
        ]))
        .unwrap();
        assert_eq!(
            deduped.timestamps().unwrap(),
            vec![at("2022-01-15 08:00"), at("2022-01-15 08:30")]
        );
        assert_eq!(deduped.values("Ethane").unwrap(), vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn is_idempotent() {
        let once = deduplicate(series(&[
            ("2022-01-15 09:00", 1.0),
            ("2022-01-15 08:00", 2.0),
            ("2022-01-15 09:00", 3.0),
        ]))
        .unwrap();
        let twice = deduplicate(once.clone()).unwrap();
        assert!(once.df.equals_missing(&twice.df));
        assert_eq!(twice.len(), 2);
    }
}
