use std::collections::HashMap;

use polars::prelude::*;
use xair_parser::{InstrumentSeries, TIMESTAMP_COLUMN};

/// Aligns instrument series side by side on their timestamps.
///
/// Columns keep the order of `series`. A column name carried by more than one instrument
/// (typically `Volume`) is labelled `<name> (<instrument>)`. Timestamps missing from one
/// series leave that series' cells empty.
pub fn merge_series(series: Vec<InstrumentSeries>) -> PolarsResult<DataFrame> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for item in &series {
        for name in item.value_columns() {
            *occurrences.entry(name).or_insert(0) += 1;
        }
    }

    let mut merged: Option<LazyFrame> = None;
    for item in series {
        let names = item.value_columns();
        let mut df = item.df;
        for name in names {
            if occurrences.get(&name).copied().unwrap_or(0) > 1 {
                let label = format!("{name} ({})", item.instrument);
                df.rename(&name, label.into())?;
            }
        }

        merged = Some(match merged {
            None => df.lazy(),
            Some(acc) => acc.join(
                df.lazy(),
                [col(TIMESTAMP_COLUMN)],
                [col(TIMESTAMP_COLUMN)],
                JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
            ),
        });
    }

    match merged {
        Some(lf) => lf
            .sort([TIMESTAMP_COLUMN], SortMultipleOptions::default())
            .collect(),
        None => Ok(DataFrame::empty()),
    }
}
