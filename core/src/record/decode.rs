//! Line decoder for the firmware's `adc,voltage,light[,status]` format.

use crate::record::{LightStatus, Record};
use std::num::IntErrorKind;

/// Why a line could not be turned into a [`Record`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("expected at least 3 fields, found {found}")]
    MissingFields { found: usize },
    #[error("field `{field}` is not numeric: {value:?}")]
    NotNumeric { field: &'static str, value: String },
    #[error("field `{field}` overflows its type: {value:?}")]
    Overflow { field: &'static str, value: String },
    #[error("field `{field}` is not a finite number: {value:?}")]
    NonFinite { field: &'static str, value: String },
    #[error("line is not valid UTF-8")]
    Encoding,
    #[error("line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },
}

/// Decodes one line, stamping the record with `timestamp`.
///
/// Fields beyond the fourth are ignored. A status field that is not an
/// integer, or an integer outside the firmware table, decodes as
/// [`LightStatus::Unknown`]; an empty status field means no status.
pub fn decode_line(line: &str, timestamp: f64) -> Result<Record, DecodeError> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(DecodeError::MissingFields {
            found: fields.len(),
        });
    }

    let adc = parse_adc(fields[0])?;
    let voltage = parse_decimal("voltage", fields[1])?;
    let light_percent = parse_decimal("light", fields[2])?;
    let status = fields.get(3).and_then(|raw| parse_status(raw));

    Ok(Record {
        adc,
        voltage,
        light_percent,
        status,
        timestamp,
    })
}

fn parse_adc(raw: &str) -> Result<u16, DecodeError> {
    raw.parse::<u16>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => DecodeError::Overflow {
            field: "adc",
            value: raw.to_string(),
        },
        _ => DecodeError::NotNumeric {
            field: "adc",
            value: raw.to_string(),
        },
    })
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, DecodeError> {
    let value = raw.parse::<f64>().map_err(|_| DecodeError::NotNumeric {
        field,
        value: raw.to_string(),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DecodeError::NonFinite {
            field,
            value: raw.to_string(),
        })
    }
}

fn parse_status(raw: &str) -> Option<LightStatus> {
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.parse::<i64>()
            .map(LightStatus::from_code)
            .unwrap_or(LightStatus::Unknown),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_three_field_line() {
        let record = decode_line("123,1.23,45.6", 2.5).unwrap();
        assert_eq!(record, Record::new(123, 1.23, 45.6, 2.5));
        assert_eq!(record.status, None);
    }

    #[test]
    fn two_fields_are_rejected() {
        assert_eq!(
            decode_line("123,1.23", 0.0),
            Err(DecodeError::MissingFields { found: 2 })
        );
    }

    #[test]
    fn decodes_status_field() {
        let record = decode_line("4095,3.30,100.0,3", 1.0).unwrap();
        assert_eq!(record.status, Some(LightStatus::Bright));
    }

    #[test]
    fn unknown_and_garbled_status_codes_map_to_unknown() {
        assert_eq!(
            decode_line("1,0.1,1.0,9", 0.0).unwrap().status,
            Some(LightStatus::Unknown)
        );
        assert_eq!(
            decode_line("1,0.1,1.0,dim", 0.0).unwrap().status,
            Some(LightStatus::Unknown)
        );
        assert_eq!(decode_line("1,0.1,1.0,", 0.0).unwrap().status, None);
    }

    #[test]
    fn tolerates_whitespace_and_carriage_returns() {
        let record = decode_line("  812 , 0.65 ,19.8 , 0\r", 0.0).unwrap();
        assert_eq!(record.adc, 812);
        assert_eq!(record.status, Some(LightStatus::Dark));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record = decode_line("10,0.01,0.2,0,extra,fields", 0.0).unwrap();
        assert_eq!(record.adc, 10);
    }

    #[test]
    fn non_numeric_required_field_is_rejected() {
        assert!(matches!(
            decode_line("ADC:12,0.1,3.0", 0.0),
            Err(DecodeError::NotNumeric { field: "adc", .. })
        ));
        assert!(matches!(
            decode_line("12,,3.0", 0.0),
            Err(DecodeError::NotNumeric {
                field: "voltage",
                ..
            })
        ));
        assert!(matches!(
            decode_line("12,0.1,-", 0.0),
            Err(DecodeError::NotNumeric { field: "light", .. })
        ));
    }

    #[test]
    fn adc_overflow_is_rejected() {
        assert!(matches!(
            decode_line("70000,1.0,1.0", 0.0),
            Err(DecodeError::Overflow { field: "adc", .. })
        ));
    }

    #[test]
    fn negative_adc_is_not_numeric() {
        assert!(matches!(
            decode_line("-5,1.0,1.0", 0.0),
            Err(DecodeError::NotNumeric { field: "adc", .. })
        ));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(matches!(
            decode_line("1,NaN,1.0", 0.0),
            Err(DecodeError::NonFinite {
                field: "voltage",
                ..
            })
        ));
        assert!(matches!(
            decode_line("1,1.0,inf", 0.0),
            Err(DecodeError::NonFinite { field: "light", .. })
        ));
    }

    #[test]
    fn out_of_range_values_still_decode() {
        let record = decode_line("4096,3.5,101.0", 0.0).unwrap();
        assert_eq!(record.adc, 4096);
        assert_eq!(record.out_of_range_channels().count(), 3);
    }
}
