//! # Equipment Interface
//!
//! This module defines the datagram payloads exchanged with equipment. All payloads are ASCII
//! comma separated values, the helpers in this module implement the field grammar shared by them.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod cam;
pub mod fc;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when parsing a single CSV field.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("Expected a number, found {0:?}")]
    InvalidNumber(String),

    #[error("Expected a boolean, found {0:?}")]
    InvalidBool(String),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Split a payload into its trimmed comma separated fields.
///
/// Returns `None` if the payload is not UTF-8 or is empty after trimming.
pub fn split_fields(payload: &[u8]) -> Option<Vec<&str>> {
    let s = std::str::from_utf8(payload).ok()?.trim();

    if s.is_empty() {
        return None
    }

    Some(s.split(',').map(str::trim).collect())
}

/// Parse a floating point field.
pub fn parse_f64(field: &str) -> Result<f64, FieldError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| FieldError::InvalidNumber(field.to_string()))
}

/// Parse a boolean from the common telemetry encodings.
///
/// Accepts (case-insensitive) `1, true, yes, y, t` and `0, false, no, n, f`. Anything else which
/// parses as a number is true if it is non-zero.
pub fn parse_bool_loose(field: &str) -> Result<bool, FieldError> {
    let norm = field.trim().to_ascii_lowercase();

    match norm.as_str() {
        "1" | "true" | "yes" | "y" | "t" => Ok(true),
        "0" | "false" | "no" | "n" | "f" => Ok(false),
        _ => norm
            .parse::<f64>()
            .map(|v| v != 0.0)
            .map_err(|_| FieldError::InvalidBool(field.to_string()))
    }
}
