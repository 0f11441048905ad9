pub mod errors;
pub mod formats;
pub mod model;
mod registry;

pub use errors::ParserError;
pub use formats::{decode_text, round_to_grid, AscParser, GRID_MINUTES};
pub use model::{
    float_values, timestamp_series, timestamps, value_columns, InstrumentSeries, InstrumentType,
    ParsedReadings, TIMESTAMP_COLUMN, VOLUME_COLUMN,
};
pub use registry::{parse_reading_file, ReadingParser};

#[cfg(test)]
mod tests;
