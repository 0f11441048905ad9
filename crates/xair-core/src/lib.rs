pub mod calibration;
pub mod config;
pub mod conversion;
pub mod dedup;
pub mod discovery;
pub mod error;
pub mod frame;
pub mod merge;
pub mod month_window;
pub mod outputs;
pub mod pipeline;
pub mod quarter_fill;

pub use error::{PipelineError, Result};
