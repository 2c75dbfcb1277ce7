//! # Flight Controller Equipment Communications Module
//!
//! Body commands are sent to the flight controller as `yaw,vertical,forward,MODE`, each number
//! formatted to four decimal places and `MODE` being the symbolic mode name.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt, str::FromStr};
use thiserror::Error;

use super::{parse_f64, split_fields, FieldError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Abstract three axis command for the vehicle body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyCommand {
    /// Time the command was produced, in seconds.
    pub timestamp_s: f64,

    /// Mode which produced the command.
    pub mode: Mode,

    /// Yaw demand in `[-1, 1]`, positive turns right.
    pub yaw: f64,

    /// Vertical demand in `[-1, 1]`, positive climbs.
    pub vertical: f64,

    /// Forward demand in `[0, 1]`.
    pub forward: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Navigation modes.
///
/// Names are parsed case-insensitively and serialised as `SCREAMING_SNAKE_CASE`, which is also
/// the form used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Mode {
    /// Sweep yaw looking for the anchor.
    Search,

    /// Keep the anchor centred while creeping forward.
    Track,

    /// Anchor centred, advance towards it.
    Approach,

    /// Anchor centred and close, hold the terminal capture command.
    Capture,

    /// Fly a fixed open-loop command.
    FlyStraight,

    /// Yaw-only correction without forward motion.
    LateralOnly,
}

/// Errors produced when decoding a command datagram.
#[derive(Debug, Error, PartialEq)]
pub enum CmdDecodeError {
    #[error("Empty or non UTF-8 payload")]
    EmptyPayload,

    #[error("Expected 4 fields, got {0}")]
    WrongFieldCount(usize),

    #[error("Invalid {0} field: {1}")]
    InvalidField(&'static str, FieldError),

    #[error(transparent)]
    InvalidMode(#[from] ParseModeError),
}

/// An unrecognised mode name.
#[derive(Debug, Error, PartialEq)]
#[error("Unknown mode {0:?}")]
pub struct ParseModeError(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Mode {
    /// All modes in definition order.
    pub const ALL: [Mode; 6] = [
        Mode::Search,
        Mode::Track,
        Mode::Approach,
        Mode::Capture,
        Mode::FlyStraight,
        Mode::LateralOnly,
    ];

    /// The symbolic name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Search => "SEARCH",
            Mode::Track => "TRACK",
            Mode::Approach => "APPROACH",
            Mode::Capture => "CAPTURE",
            Mode::FlyStraight => "FLY_STRAIGHT",
            Mode::LateralOnly => "LATERAL_ONLY",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase();

        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == norm)
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

impl TryFrom<String> for Mode {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl BodyCommand {
    /// Encode the command into its wire payload.
    pub fn to_payload(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{}",
            self.yaw, self.vertical, self.forward, self.mode
        )
    }

    /// Decode a command payload, stamping it with the given time.
    pub fn from_payload(payload: &[u8], timestamp_s: f64) -> Result<Self, CmdDecodeError> {
        let fields = split_fields(payload).ok_or(CmdDecodeError::EmptyPayload)?;

        if fields.len() != 4 {
            return Err(CmdDecodeError::WrongFieldCount(fields.len()))
        }

        let num = |name: &'static str, field: &str| {
            parse_f64(field).map_err(|e| CmdDecodeError::InvalidField(name, e))
        };

        Ok(Self {
            timestamp_s,
            yaw: num("yaw", fields[0])?,
            vertical: num("vertical", fields[1])?,
            forward: num("forward", fields[2])?,
            mode: fields[3].parse()?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eqpt::cam::AnchorDatagram;

    #[test]
    fn test_mode_names() {
        for m in Mode::ALL.iter() {
            assert_eq!(m.to_string().parse::<Mode>(), Ok(*m));
        }
        assert_eq!(" fly_straight ".parse::<Mode>(), Ok(Mode::FlyStraight));
        assert_eq!("Lateral_Only".parse::<Mode>(), Ok(Mode::LateralOnly));
        assert_eq!("STOP".parse::<Mode>(), Err(ParseModeError("STOP".into())));
    }

    #[test]
    fn test_command_payload() {
        let cmd = BodyCommand {
            timestamp_s: 4.0,
            mode: Mode::Approach,
            yaw: -0.123456,
            vertical: 0.5,
            forward: 1.0,
        };
        assert_eq!(cmd.to_payload(), "-0.1235,0.5000,1.0000,APPROACH");

        let back = BodyCommand::from_payload(cmd.to_payload().as_bytes(), 4.0).unwrap();
        assert_eq!(back.mode, Mode::Approach);
        assert_eq!(back.yaw, -0.1235);
        assert_eq!(back.vertical, 0.5);
        assert_eq!(back.forward, 1.0);
    }

    /// The numeric fields of a command survive being read back through the observation grammar.
    #[test]
    fn test_command_through_observation_grammar() {
        let cmd = BodyCommand {
            timestamp_s: 0.0,
            mode: Mode::Track,
            yaw: 0.987654,
            vertical: -0.333333,
            forward: 0.1,
        };
        let payload = cmd.to_payload();
        let numbers: Vec<&str> = payload.split(',').take(3).collect();

        // Companion observation: detected, then yaw/vertical/forward as confidence/cx/cy
        let obs_payload = format!("1,{},{},{},0", numbers[0], numbers[1], numbers[2]);
        let d = AnchorDatagram::from_payload(obs_payload.as_bytes()).unwrap();

        assert!((d.confidence - cmd.yaw).abs() <= 0.5e-4);
        assert!((d.cx - cmd.vertical).abs() <= 0.5e-4);
        assert!((d.cy - cmd.forward).abs() <= 0.5e-4);
    }

    #[test]
    fn test_bad_command_payloads() {
        assert_eq!(
            BodyCommand::from_payload(b"0,0,0", 0.0),
            Err(CmdDecodeError::WrongFieldCount(3))
        );
        assert!(matches!(
            BodyCommand::from_payload(b"0,0,0,HOVER", 0.0),
            Err(CmdDecodeError::InvalidMode(_))
        ));
    }
}
