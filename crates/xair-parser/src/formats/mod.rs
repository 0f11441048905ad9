mod asc;
mod common;

pub use asc::AscParser;
pub use common::{decode_text, round_to_grid, GRID_MINUTES};

pub(crate) use common::{clean_header, parse_timestamp, parse_value};
