use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("{parser} file is empty")]
    EmptyFile { parser: &'static str },

    #[error("{parser} header is missing required column '{column}'")]
    MissingColumn {
        parser: &'static str,
        column: &'static str,
    },

    #[error("{parser} CSV error: {source}")]
    Csv {
        parser: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{parser} data row {line_index} invalid: {message}")]
    DataRow {
        parser: &'static str,
        line_index: usize,
        message: String,
    },

    #[error("{parser} validation failed: {message}")]
    Validation {
        parser: &'static str,
        message: String,
    },
}
