// src/acquisition/protocol.rs
//! Text line protocol for incoming samples

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::constants::acquisition::LINE_PREFIX;

/// One parsed sample line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EmgFrame {
    /// Reference limb only, sent during calibration
    Reference(f64),
    Paired { reference: f64, affected: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("missing '{}' prefix", LINE_PREFIX)]
    MissingPrefix,

    #[error("expected one or two values, got {0}")]
    FieldCount(usize),

    #[error("invalid sample value '{0}'")]
    InvalidValue(String),
}

/// Parse `EMG:<ref>` or `EMG:<ref>,<affected>`
///
/// Surrounding whitespace and the line terminator are ignored.
pub fn parse_line(line: &str) -> Result<EmgFrame, ProtocolError> {
    let payload = line
        .trim()
        .strip_prefix(LINE_PREFIX)
        .ok_or(ProtocolError::MissingPrefix)?;

    let fields: Vec<&str> = payload.split(',').map(str::trim).collect();
    let values = fields
        .iter()
        .map(|field| parse_value(field))
        .collect::<Result<Vec<f64>, _>>()?;

    match values.as_slice() {
        [reference] => Ok(EmgFrame::Reference(*reference)),
        [reference, affected] => Ok(EmgFrame::Paired {
            reference: *reference,
            affected: *affected,
        }),
        other => Err(ProtocolError::FieldCount(other.len())),
    }
}

fn parse_value(field: &str) -> Result<f64, ProtocolError> {
    match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ProtocolError::InvalidValue(field.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value() {
        assert_eq!(parse_line("EMG:0.125\n"), Ok(EmgFrame::Reference(0.125)));
    }

    #[test]
    fn test_paired_values() {
        assert_eq!(
            parse_line("EMG:0.1, -0.2\r\n"),
            Ok(EmgFrame::Paired {
                reference: 0.1,
                affected: -0.2
            })
        );
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(parse_line("ACK"), Err(ProtocolError::MissingPrefix));
        assert_eq!(parse_line("EMG:1,2,3"), Err(ProtocolError::FieldCount(3)));
        assert_eq!(
            parse_line("EMG:abc"),
            Err(ProtocolError::InvalidValue("abc".to_string()))
        );
        assert!(parse_line("EMG:").is_err());
        assert!(parse_line("EMG:NaN").is_err());
    }
}
