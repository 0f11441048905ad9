use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::decode_text;
use crate::errors::ParserError;
use crate::model::InstrumentType;
use crate::parse_reading_file;

fn fixture_bytes(path: &str) -> Vec<u8> {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn fixture(path: &str) -> String {
    decode_text(&fixture_bytes(path)).into_owned()
}

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").expect("timestamp")
}

#[test]
fn parses_coarse_instrument_file() {
    let content = fixture("2022_01_15_C6-C20.Asc");
    let parsed = parse_reading_file(&content, InstrumentType::C6C20).expect("C6-C20 parse failed");
    let series = &parsed.series;

    assert_eq!(series.instrument, InstrumentType::C6C20);
    assert_eq!(series.value_columns(), vec!["Benzene", "Toluene", "Volume"]);
    assert_eq!(series.len(), 3);
    assert_eq!(parsed.skipped_rows, 1);

    assert_eq!(
        series.timestamps().expect("timestamps"),
        vec![
            at("2022-01-15 08:00"),
            at("2022-01-15 09:00"),
            at("2022-01-15 10:00"),
        ]
    );

    assert_eq!(
        series.values("Benzene").expect("benzene"),
        vec![Some(1.5), Some(1.0), None]
    );
    assert_eq!(series.values("Toluene").expect("toluene")[1], Some(-0.5));
    assert_eq!(series.values("Volume").expect("volume")[2], Some(10.0));
}

#[test]
fn parses_fine_instrument_file() {
    let content = fixture("2022_01_15_C2-C6.Asc");
    let parsed = parse_reading_file(&content, InstrumentType::C2C6).expect("C2-C6 parse failed");
    let series = &parsed.series;

    assert_eq!(series.value_columns(), vec!["Ethane", "Propane", "Volume"]);
    assert_eq!(parsed.skipped_rows, 0);
    assert_eq!(series.timestamps().expect("timestamps")[2], at("2022-01-15 09:00"));
    assert_eq!(series.values("Propane").expect("propane")[1], None);
    assert_eq!(series.values("Ethane").expect("ethane")[2], Some(1.5));
}

#[test]
fn timestamp_column_is_a_millisecond_datetime() {
    let content = fixture("2022_01_15_C2-C6.Asc");
    let parsed = parse_reading_file(&content, InstrumentType::C2C6).expect("C2-C6 parse failed");
    let column = parsed.series.df.column("Sampling date").expect("timestamp column");
    assert_eq!(
        column.dtype(),
        &polars::prelude::DataType::Datetime(polars::prelude::TimeUnit::Milliseconds, None)
    );
}

#[test]
fn latin1_headers_keep_their_accents() {
    let content = fixture("latin1_C2-C6.Asc");
    let parsed = parse_reading_file(&content, InstrumentType::C2C6).expect("latin-1 parse failed");
    assert_eq!(
        parsed.series.value_columns(),
        vec!["Ethylène", "Propane", "Volume"]
    );
    assert_eq!(parsed.series.values("Ethylène").expect("ethylene"), vec![Some(0.5)]);
}

#[test]
fn missing_sampling_date_column_is_an_error() {
    let content = fixture("missing_date_C2-C6.Asc");
    let err = parse_reading_file(&content, InstrumentType::C2C6).unwrap_err();
    assert!(matches!(
        err,
        ParserError::MissingColumn {
            column: "Sampling date",
            ..
        }
    ));
}

#[test]
fn unparseable_sampling_date_is_an_error() {
    let content = fixture("bad_date_C2-C6.Asc");
    let err = parse_reading_file(&content, InstrumentType::C2C6).unwrap_err();
    match err {
        ParserError::DataRow { line_index, .. } => assert_eq!(line_index, 2),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn empty_content_is_an_error() {
    let err = parse_reading_file("", InstrumentType::C2C6).unwrap_err();
    assert!(matches!(err, ParserError::EmptyFile { .. }));
}

#[test]
fn header_only_file_yields_empty_series() {
    let parsed = parse_reading_file("Sampling date\tEthane\n", InstrumentType::C2C6)
        .expect("header only parse failed");
    assert!(parsed.series.is_empty());
    assert_eq!(parsed.series.value_columns(), vec!["Ethane"]);
}

#[test]
fn short_lines_pad_missing_cells() {
    let content = "Sampling date\tEthane\tPropane\n2022-01-15 08:00\t1.0\n";
    let parsed = parse_reading_file(content, InstrumentType::C2C6).expect("parse failed");
    assert_eq!(parsed.series.values("Ethane").expect("ethane"), vec![Some(1.0)]);
    assert_eq!(parsed.series.values("Propane").expect("propane"), vec![None]);
}

#[test]
fn instrument_types_describe_their_cadence() {
    assert_eq!(InstrumentType::C2C6.quarter_slots(), 2);
    assert_eq!(InstrumentType::C6C20.quarter_slots(), 4);
    assert_eq!(InstrumentType::C6C20.file_suffix(), "C6-C20.Asc");
    assert_eq!(InstrumentType::C2C6.to_string(), "C2-C6");
}
