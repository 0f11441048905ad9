use crate::errors::ParserError;
use crate::formats::AscParser;
use crate::model::{InstrumentType, ParsedReadings};

pub trait ReadingParser {
    fn name(&self) -> &'static str;
    fn parse(&self, content: &str) -> Result<ParsedReadings, ParserError>;
}

/// Parses the content of one raw analyzer export for the given instrument.
pub fn parse_reading_file(
    content: &str,
    instrument: InstrumentType,
) -> Result<ParsedReadings, ParserError> {
    AscParser::new(instrument).parse(content)
}
