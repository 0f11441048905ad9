use chrono::NaiveDateTime;
use polars::prelude::*;
use xair_parser::TIMESTAMP_COLUMN;

fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// Literal comparable with the `Sampling date` column.
pub fn timestamp_lit(timestamp: NaiveDateTime) -> Expr {
    lit(timestamp.and_utc().timestamp_millis()).cast(timestamp_dtype())
}

/// Moves every timestamp by `minutes`, leaving the value columns untouched.
pub fn shift_timestamps(df: DataFrame, minutes: i64) -> PolarsResult<DataFrame> {
    df.lazy()
        .with_column(
            (col(TIMESTAMP_COLUMN).cast(DataType::Int64) + lit(minutes * 60_000))
                .cast(timestamp_dtype())
                .alias(TIMESTAMP_COLUMN),
        )
        .collect()
}

/// Stacks frames in order under the union of their columns; cells of absent columns are null.
pub fn concat_diagonal(mut frames: Vec<DataFrame>) -> PolarsResult<DataFrame> {
    match frames.len() {
        0 => Ok(DataFrame::empty()),
        1 => Ok(frames.remove(0)),
        _ => {
            let lazy: Vec<LazyFrame> = frames.into_iter().map(|df| df.lazy()).collect();
            concat_lf_diagonal(lazy, UnionArgs::default())?.collect()
        }
    }
}

/// Stable sort on the timestamp column.
pub fn sort_by_timestamp(df: &DataFrame) -> PolarsResult<DataFrame> {
    df.sort(
        [TIMESTAMP_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )
}
