//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the datagram formats spoken
//! with the camera (anchor observations) and with the flight controller (body commands), and the
//! UDP endpoint helpers used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Datagram definitions for equipment (camera and flight controller)
pub mod eqpt;

/// Network module
pub mod net;
