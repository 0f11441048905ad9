use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::{col, DataFrame, IntoLazy};
use xair_parser::TIMESTAMP_COLUMN;

use crate::error::{PipelineError, Result};
use crate::frame::timestamp_lit;

/// Inclusive bounds of a calendar month: first day 00:00:00 to last day 23:59:59.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(PipelineError::InvalidMonth(month))?;
    let last = last_day_of_month(first).ok_or(PipelineError::InvalidMonth(month))?;
    let end = last
        .and_hms_opt(23, 59, 59)
        .ok_or(PipelineError::InvalidMonth(month))?;
    Ok((first.and_time(NaiveTime::MIN), end))
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let next_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next_first?.pred_opt()
}

/// Drops every row outside the calendar month.
pub fn filter_month(df: DataFrame, year: i32, month: u32) -> Result<DataFrame> {
    let (start, end) = month_bounds(year, month)?;
    let clipped = df
        .lazy()
        .filter(
            col(TIMESTAMP_COLUMN)
                .gt_eq(timestamp_lit(start))
                .and(col(TIMESTAMP_COLUMN).lt_eq(timestamp_lit(end))),
        )
        .collect()?;
    Ok(clipped)
}
