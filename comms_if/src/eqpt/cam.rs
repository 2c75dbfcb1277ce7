//! # Camera Equipment Communications Module
//!
//! The camera pipeline reports one anchor detection per datagram. Two payload layouts are
//! accepted:
//!
//! - `detected,confidence,cx,cy,size`
//! - `timestamp,detected,confidence,cx,cy,size`
//!
//! Bearings `cx` and `cy` are normalised offsets from the image centre in `[-1, 1]`, `size` is the
//! normalised apparent size in `[0, 1]` (larger is closer).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{parse_bool_loose, parse_f64, split_fields, FieldError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single camera-derived reading of the anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorObservation {
    /// Time of the observation in seconds.
    pub timestamp_s: f64,

    /// True if the anchor was detected in the frame.
    pub detected: bool,

    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,

    /// Horizontal bearing, positive right.
    pub cx: f64,

    /// Vertical bearing, positive down.
    pub cy: f64,

    /// Apparent size.
    pub size: f64,
}

/// A decoded observation datagram.
///
/// The timestamp is only present in the six field layout. It is on the sender's clock, so the
/// receiver stamps every observation with its own time and keeps this one for reference only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorDatagram {
    pub timestamp_s: Option<f64>,
    pub detected: bool,
    pub confidence: f64,
    pub cx: f64,
    pub cy: f64,
    pub size: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons an observation datagram could not be decoded.
#[derive(Debug, Error, PartialEq)]
pub enum ObsDecodeError {
    #[error("Empty or non UTF-8 payload")]
    EmptyPayload,

    #[error("Expected 5 or 6 fields, got {0}")]
    WrongFieldCount(usize),

    #[error("Invalid {0} field: {1}")]
    InvalidField(&'static str, FieldError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AnchorObservation {
    /// An observation reporting that nothing was seen at the given time.
    pub fn not_detected(timestamp_s: f64) -> Self {
        Self {
            timestamp_s,
            ..Default::default()
        }
    }
}

impl AnchorDatagram {
    /// Decode a datagram payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ObsDecodeError> {
        let fields = split_fields(payload).ok_or(ObsDecodeError::EmptyPayload)?;

        let (timestamp_s, rest) = match fields.len() {
            5 => (None, &fields[..]),
            6 => (
                Some(parse_f64(fields[0])
                    .map_err(|e| ObsDecodeError::InvalidField("timestamp", e))?),
                &fields[1..]
            ),
            n => return Err(ObsDecodeError::WrongFieldCount(n))
        };

        let num = |name: &'static str, field: &str| {
            parse_f64(field).map_err(|e| ObsDecodeError::InvalidField(name, e))
        };

        Ok(Self {
            timestamp_s,
            detected: parse_bool_loose(rest[0])
                .map_err(|e| ObsDecodeError::InvalidField("detected", e))?,
            confidence: num("confidence", rest[1])?,
            cx: num("cx", rest[2])?,
            cy: num("cy", rest[3])?,
            size: num("size", rest[4])?,
        })
    }

    /// Encode the datagram into its wire payload.
    pub fn to_payload(&self) -> String {
        let body = format!(
            "{},{:.4},{:.4},{:.4},{:.4}",
            if self.detected { 1 } else { 0 },
            self.confidence,
            self.cx,
            self.cy,
            self.size
        );

        match self.timestamp_s {
            Some(t) => format!("{:.4},{}", t, body),
            None => body
        }
    }

    /// Convert into an observation stamped with the receiver's `receive_time_s`.
    pub fn into_observation(self, receive_time_s: f64) -> AnchorObservation {
        AnchorObservation {
            timestamp_s: receive_time_s,
            detected: self.detected,
            confidence: self.confidence,
            cx: self.cx,
            cy: self.cy,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_five_field_payload() {
        let d = AnchorDatagram::from_payload(b"true,0.9,-0.25,0.1,0.4\n").unwrap();
        assert_eq!(d.timestamp_s, None);
        assert!(d.detected);
        assert_eq!(d.confidence, 0.9);
        assert_eq!(d.cx, -0.25);
        assert_eq!(d.cy, 0.1);
        assert_eq!(d.size, 0.4);

        let obs = d.into_observation(12.5);
        assert_eq!(obs.timestamp_s, 12.5);
    }

    #[test]
    fn test_six_field_payload() {
        let d = AnchorDatagram::from_payload(b"3.25, no, 0.1, 0, 0, 0").unwrap();
        assert_eq!(d.timestamp_s, Some(3.25));
        assert!(!d.detected);
        assert_eq!(d.into_observation(99.0).timestamp_s, 99.0);
    }

    #[test]
    fn test_bad_payloads() {
        assert_eq!(AnchorDatagram::from_payload(b""), Err(ObsDecodeError::EmptyPayload));
        assert_eq!(
            AnchorDatagram::from_payload(b"1,0.9,0.1,0.2"),
            Err(ObsDecodeError::WrongFieldCount(4))
        );
        assert_eq!(
            AnchorDatagram::from_payload(b"1,2,3,4,5,6,7"),
            Err(ObsDecodeError::WrongFieldCount(7))
        );
        assert!(matches!(
            AnchorDatagram::from_payload(b"1,high,0.1,0.2,0.3"),
            Err(ObsDecodeError::InvalidField("confidence", _))
        ));
        assert!(matches!(
            AnchorDatagram::from_payload(b"perhaps,0.5,0.1,0.2,0.3"),
            Err(ObsDecodeError::InvalidField("detected", _))
        ));
    }

    #[test]
    fn test_payload_encoding() {
        let d = AnchorDatagram {
            timestamp_s: Some(1.5),
            detected: true,
            confidence: 0.8,
            cx: -0.1,
            cy: 0.05,
            size: 0.3,
        };
        assert_eq!(d.to_payload(), "1.5000,1,0.8000,-0.1000,0.0500,0.3000");
        assert_eq!(AnchorDatagram::from_payload(d.to_payload().as_bytes()), Ok(d));
    }
}
