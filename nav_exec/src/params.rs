//! # Navigation Executable Parameters
//!
//! This module provides parameters for the navigation executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use comms_if::net::NetParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the executable, loaded from `nav_exec.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavExecParams {

    /// Number of control cycles per second.
    pub cycle_frequency_hz: f64,

    /// Stop the loop after this many seconds, run until shut down if `None`.
    #[serde(default)]
    pub max_run_s: Option<f64>,

    #[serde(default)]
    pub log: LogParams,

    #[serde(default)]
    pub archive: ArchiveParams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogParams {
    /// Log the observation, state and command of every cycle at debug level.
    #[serde(default)]
    pub cycle_trace: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveParams {
    /// Write a CSV record of every cycle into the session archive.
    #[serde(default)]
    pub enabled: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The cycle frequency must be positive and finite, found {0} Hz")]
    InvalidCycleFrequency(f64),

    #[error("The maximum run time must be positive and finite, found {0} s")]
    InvalidMaxRunTime(f64),

    #[error("No observation endpoint was given")]
    NoObsEndpoint,

    #[error("The observation receive timeout must be at least 1 ms")]
    ZeroRecvTimeout,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavExecParams {
    fn default() -> Self {
        Self {
            cycle_frequency_hz: 20.0,
            max_run_s: None,
            log: LogParams::default(),
            archive: ArchiveParams::default(),
        }
    }
}

impl NavExecParams {
    /// Target period of one cycle in seconds.
    pub fn cycle_period_s(&self) -> f64 {
        1.0 / self.cycle_frequency_hz
    }

    /// Check the executable and network parameters before starting the loop.
    pub fn validate(&self, net: &NetParams) -> Result<(), ParamsError> {
        if !(self.cycle_frequency_hz > 0.0) || !self.cycle_frequency_hz.is_finite() {
            return Err(ParamsError::InvalidCycleFrequency(self.cycle_frequency_hz))
        }

        if let Some(t) = self.max_run_s {
            if !(t > 0.0) || !t.is_finite() {
                return Err(ParamsError::InvalidMaxRunTime(t))
            }
        }

        if net.obs_endpoint.trim().is_empty() {
            return Err(ParamsError::NoObsEndpoint)
        }

        if net.obs_recv_timeout_ms == 0 {
            return Err(ParamsError::ZeroRecvTimeout)
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn net() -> NetParams {
        NetParams {
            obs_endpoint: "0.0.0.0:5005".into(),
            obs_read_buffer: 2048,
            obs_recv_timeout_ms: 100,
            cmd_endpoint: "127.0.0.1:5006".into(),
        }
    }

    #[test]
    fn test_validate() {
        let params = NavExecParams::default();
        assert_eq!(params.validate(&net()), Ok(()));
        assert!((params.cycle_period_s() - 0.05).abs() < 1e-12);

        for &hz in [0.0, -5.0, f64::NAN, f64::INFINITY].iter() {
            let p = NavExecParams { cycle_frequency_hz: hz, ..Default::default() };
            assert!(matches!(p.validate(&net()), Err(ParamsError::InvalidCycleFrequency(_))));
        }

        let p = NavExecParams { max_run_s: Some(0.0), ..Default::default() };
        assert_eq!(p.validate(&net()), Err(ParamsError::InvalidMaxRunTime(0.0)));

        let p = NavExecParams { max_run_s: Some(f64::INFINITY), ..Default::default() };
        assert!(matches!(p.validate(&net()), Err(ParamsError::InvalidMaxRunTime(_))));

        // Accepted, the loop duration saturates instead of overflowing
        let p = NavExecParams { max_run_s: Some(1e20), ..Default::default() };
        assert_eq!(p.validate(&net()), Ok(()));
        assert_eq!(
            p.max_run_s.map(util::time::seconds_to_std_duration),
            Some(std::time::Duration::MAX)
        );

        let no_obs = NetParams { obs_endpoint: "  ".into(), ..net() };
        assert_eq!(params.validate(&no_obs), Err(ParamsError::NoObsEndpoint));

        let no_timeout = NetParams { obs_recv_timeout_ms: 0, ..net() };
        assert_eq!(params.validate(&no_timeout), Err(ParamsError::ZeroRecvTimeout));
    }

    #[test]
    fn test_deserialise() {
        let p: NavExecParams = util::params::from_toml_str(
            "cycle_frequency_hz = 10.0\n\n[log]\ncycle_trace = true\n"
        ).unwrap();

        assert_eq!(p.cycle_frequency_hz, 10.0);
        assert_eq!(p.max_run_s, None);
        assert!(p.log.cycle_trace);
        assert!(!p.archive.enabled);
    }

    #[test]
    fn test_shipped_params() {
        use crate::{nav_ctrl::NavCtrlParams, tracker::TrackerParams};

        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../params");

        let net: NetParams = util::params::load_from_dir(&dir, "net.toml").unwrap();
        let exec: NavExecParams = util::params::load_from_dir(&dir, "nav_exec.toml").unwrap();
        let tracker: TrackerParams = util::params::load_from_dir(&dir, "tracker.toml").unwrap();
        let ctrl: NavCtrlParams = util::params::load_from_dir(&dir, "nav_ctrl.toml").unwrap();

        assert_eq!(exec.validate(&net), Ok(()));
        assert_eq!(tracker.validate(), Ok(()));
        assert!(ctrl.validate().is_ok());
        assert_eq!(ctrl.mode_override, None);
    }
}
