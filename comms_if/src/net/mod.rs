//! # Network Module
//!
//! This module provides the UDP endpoint abstractions used to carry the equipment datagrams.
//! Links are connectionless and best-effort: a listener binds to its endpoint and receives with a
//! timeout so the owning thread can notice shutdown requests, a sender connects to its endpoint
//! and never blocks on transmission.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    time::Duration,
};

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default size of the receive buffer, larger datagrams are truncated.
pub const DEFAULT_READ_BUFFER: usize = 2048;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from `net.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint (`host:port`) on which observation datagrams are received.
    pub obs_endpoint: String,

    /// Size of the observation receive buffer in bytes.
    #[serde(default = "default_read_buffer")]
    pub obs_read_buffer: usize,

    /// Receive timeout of the observation socket in milliseconds. Bounds how long the receiving
    /// thread takes to notice a shutdown.
    #[serde(default = "default_recv_timeout_ms")]
    pub obs_recv_timeout_ms: u64,

    /// Endpoint (`host:port`) to which commands are sent. Empty disables command output.
    #[serde(default)]
    pub cmd_endpoint: String,
}

/// Represents options which can be set on a UDP socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketOptions {
    /// Maximum time a receive blocks before returning `WouldBlock`/`TimedOut`. `None` blocks
    /// forever.
    pub recv_timeout: Option<Duration>,

    /// Put the socket in non-blocking mode, sends which would block return immediately.
    pub nonblocking: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Endpoint {0:?} could not be resolved: {1}")]
    InvalidEndpoint(String, std::io::Error),

    #[error("Endpoint {0:?} did not resolve to any address")]
    NoAddress(String),

    #[error("Could not bind to {0:?}: {1}")]
    BindError(String, std::io::Error),

    #[error("Could not connect to {0:?}: {1}")]
    ConnectError(String, std::io::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &UdpSocket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_read_timeout, self.recv_timeout),
            (set_nonblocking, self.nonblocking)
        );

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Resolve an endpoint string into its first socket address.
pub fn resolve(endpoint: &str) -> Result<SocketAddr, NetError> {
    endpoint
        .to_socket_addrs()
        .map_err(|e| NetError::InvalidEndpoint(endpoint.into(), e))?
        .next()
        .ok_or_else(|| NetError::NoAddress(endpoint.into()))
}

/// Bind a UDP socket to the endpoint for receiving datagrams.
pub fn bind_listener(endpoint: &str, options: SocketOptions) -> Result<UdpSocket, NetError> {
    let addr = resolve(endpoint)?;

    let socket = UdpSocket::bind(addr)
        .map_err(|e| NetError::BindError(endpoint.into(), e))?;

    options.set(&socket)?;

    debug!("Listening on {}", addr);

    Ok(socket)
}

/// Create a UDP socket connected to the endpoint for sending datagrams.
///
/// The local side is bound to an ephemeral port of the same address family.
pub fn connect_sender(endpoint: &str, options: SocketOptions) -> Result<UdpSocket, NetError> {
    let addr = resolve(endpoint)?;

    let local: SocketAddr = match addr {
        SocketAddr::V4(_) => ([0u8; 4], 0).into(),
        SocketAddr::V6(_) => ([0u16; 8], 0).into(),
    };

    let socket = UdpSocket::bind(local)
        .map_err(|e| NetError::BindError(local.to_string(), e))?;
    socket.connect(addr)
        .map_err(|e| NetError::ConnectError(endpoint.into(), e))?;

    options.set(&socket)?;

    debug!("Sending to {} from {:?}", addr, socket.local_addr().ok());

    Ok(socket)
}

fn default_read_buffer() -> usize {
    DEFAULT_READ_BUFFER
}

fn default_recv_timeout_ms() -> u64 {
    100
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_loopback_link() {
        let listener = bind_listener(
            "127.0.0.1:0",
            SocketOptions { recv_timeout: Some(Duration::from_secs(2)), nonblocking: false }
        ).unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let sender = connect_sender(
            &endpoint,
            SocketOptions { nonblocking: true, ..Default::default() }
        ).unwrap();
        sender.send(b"hello").unwrap();

        let mut buf = [0u8; 16];
        let (n, _) = listener.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_bad_endpoints() {
        assert!(matches!(resolve("not an endpoint"), Err(NetError::InvalidEndpoint(..))));
        assert!(matches!(
            bind_listener("127.0.0.1", SocketOptions::default()),
            Err(NetError::InvalidEndpoint(..))
        ));
    }
}
