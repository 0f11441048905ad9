use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use csv::StringRecord;

use crate::errors::ParserError;

/// Spacing of the canonical sampling grid.
pub const GRID_MINUTES: i64 = 15;

const GRID_MICROS: i64 = GRID_MINUTES * 60 * 1_000_000;

/// Rounds to the nearest grid point; exact ties go to the even quarter index. `None` when
/// the rounded value falls outside the representable range.
pub fn round_to_grid(timestamp: NaiveDateTime) -> Option<NaiveDateTime> {
    let micros = timestamp.and_utc().timestamp_micros();
    let quotient = micros.div_euclid(GRID_MICROS);
    let remainder = micros.rem_euclid(GRID_MICROS);

    let round_up = match (remainder * 2).cmp(&GRID_MICROS) {
        Ordering::Less => false,
        Ordering::Greater => true,
        Ordering::Equal => quotient.rem_euclid(2) != 0,
    };

    let floor = timestamp.checked_sub_signed(Duration::microseconds(remainder))?;
    if round_up {
        floor.checked_add_signed(Duration::minutes(GRID_MINUTES))
    } else {
        Some(floor)
    }
}

/// Text of a raw export: UTF-8 when valid, Latin-1 otherwise.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

pub(crate) fn parse_timestamp(
    parser: &'static str,
    value: &str,
    line_index: usize,
) -> Result<NaiveDateTime, ParserError> {
    static FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%d-%m-%Y %H:%M:%S",
        "%d-%m-%Y %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
    ];
    let trimmed = value.trim();
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    Err(ParserError::DataRow {
        parser,
        line_index,
        message: format!("invalid timestamp '{trimmed}'"),
    })
}

/// Measured values are not validated: anything unreadable is simply missing.
pub(crate) fn parse_value(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("nan") {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
}

/// Column names to keep, `None` for placeholder columns. Repeated names get `.1`, `.2`, ...
pub(crate) fn clean_header(header: &StringRecord) -> Vec<Option<String>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .map(|raw| {
            let name = raw.trim_start_matches('\u{feff}').trim();
            if is_placeholder(name) {
                return None;
            }
            let count = seen.entry(name.to_string()).or_insert(0);
            let unique = if *count == 0 {
                name.to_string()
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            Some(unique)
        })
        .collect()
}

fn is_placeholder(name: &str) -> bool {
    name.is_empty() || name.starts_with("Unnamed")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn rounded(value: &str) -> NaiveDateTime {
        round_to_grid(at(value)).unwrap()
    }

    #[test]
    fn rounds_to_nearest_quarter() {
        assert_eq!(rounded("2022-01-15 08:07:00"), at("2022-01-15 08:00:00"));
        assert_eq!(rounded("2022-01-15 08:08:00"), at("2022-01-15 08:15:00"));
        assert_eq!(rounded("2022-01-15 23:53:00"), at("2022-01-16 00:00:00"));
        assert_eq!(rounded("2022-01-15 08:30:00"), at("2022-01-15 08:30:00"));
        assert_eq!(rounded("1969-12-31 23:52:00"), at("1969-12-31 23:45:00"));
    }

    #[test]
    fn ties_round_half_to_even() {
        assert_eq!(rounded("2022-01-15 08:07:30"), at("2022-01-15 08:00:00"));
        assert_eq!(rounded("2022-01-15 08:22:30"), at("2022-01-15 08:30:00"));
        assert_eq!(rounded("2022-01-15 08:37:30"), at("2022-01-15 08:30:00"));
        assert_eq!(rounded("2022-01-15 08:52:30"), at("2022-01-15 09:00:00"));
    }

    #[test]
    fn rounding_past_the_calendar_limit_is_none() {
        assert_eq!(round_to_grid(NaiveDateTime::MAX), None);
    }

    #[test]
    fn decodes_utf8_and_falls_back_to_latin1() {
        assert_eq!(decode_text("Ethylène".as_bytes()), "Ethylène");
        assert_eq!(decode_text(b"Ethyl\xe8ne"), "Ethylène");
        assert_eq!(decode_text(b"Compos\xe9\tFacteur"), "Composé\tFacteur");
    }

    #[test]
    fn accepts_iso_and_day_first_timestamps() {
        let expected = at("2022-01-15 08:07:00");
        for value in [
            "2022-01-15 08:07:00",
            "2022-01-15 08:07",
            "2022-01-15T08:07:00",
            "15/01/2022 08:07:00",
            "15/01/2022 08:07",
            "15.01.2022 08:07",
        ] {
            assert_eq!(parse_timestamp("TEST", value, 1).unwrap(), expected, "{value}");
        }
        assert!(parse_timestamp("TEST", "not a date", 7).is_err());
    }

    #[test]
    fn parses_values_leniently() {
        assert_eq!(parse_value(" 1.5 "), Some(1.5));
        assert_eq!(parse_value("-0,25"), Some(-0.25));
        assert_eq!(parse_value("NaN"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("n/a"), None);
    }

    #[test]
    fn header_drops_placeholders_and_suffixes_duplicates() {
        let header = StringRecord::from(vec!["Sampling date", "Benzene", "", "Benzene", "Unnamed: 4"]);
        assert_eq!(
            clean_header(&header),
            vec![
                Some("Sampling date".to_string()),
                Some("Benzene".to_string()),
                None,
                Some("Benzene.1".to_string()),
                None,
            ]
        );
    }
}
