use polars::prelude::PolarsResult;
use xair_parser::{InstrumentSeries, GRID_MINUTES};

use crate::frame::{shift_timestamps, sort_by_timestamp};

/// Replicates every reading onto each grid slot of its measurement window.
///
/// `C2-C6` readings gain one copy 15 minutes later, `C6-C20` readings three copies at
/// +15, +30 and +45 minutes. Copies carry the original values unchanged. The result is
/// sorted by timestamp; at equal timestamps original readings come before copies, and
/// otherwise the input order is kept.
pub fn quarter_fill(series: InstrumentSeries) -> PolarsResult<InstrumentSeries> {
    let mut filled = series.df.clone();
    for slot in 1..series.instrument.quarter_slots() {
        let copy = shift_timestamps(series.df.clone(), GRID_MINUTES * slot as i64)?;
        filled.vstack_mut(&copy)?;
    }
    Ok(InstrumentSeries::new(
        series.instrument,
        sort_by_timestamp(&filled)?,
    ))
}
