//! # Command Client
//!
//! Sends one [`BodyCommand`] datagram per cycle to the flight controller link. Sending is
//! best-effort: the socket is non-blocking and a datagram which cannot be sent straight away is
//! dropped, the next cycle will produce a fresher command anyway.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{io::ErrorKind, net::UdpSocket};
use log::{info, trace, warn};

use comms_if::{
    eqpt::fc::BodyCommand,
    net::{self, NetError, SocketOptions}
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct CmdClient {
    socket: UdpSocket,

    /// Number of consecutive failed sends.
    num_failed: u64,

    /// Number of commands sent since the client was created.
    num_sent: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdClientError {
    #[error("Could not open the command socket: {0}")]
    SocketError(#[from] NetError),
}

/// Outcome of sending a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Sent,

    /// The datagram was dropped without an error, the socket was busy or nobody was listening.
    Dropped,

    /// The send failed.
    Failed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdClient {
    /// Connect a non-blocking sender to the command endpoint.
    pub fn new(endpoint: &str) -> Result<Self, CmdClientError> {
        let socket = net::connect_sender(
            endpoint, 
            SocketOptions {
                nonblocking: true,
                ..Default::default()
            }
        )?;

        info!("CmdClient sending to {}", endpoint);

        Ok(Self {
            socket,
            num_failed: 0,
            num_sent: 0,
        })
    }

    /// Send a command, never blocking.
    pub fn send(&mut self, cmd: &BodyCommand) -> SendStatus {
        let payload = cmd.to_payload();

        let status = match self.socket.send(payload.as_bytes()) {
            Ok(_) => SendStatus::Sent,
            Err(e) if matches!(
                e.kind(), 
                ErrorKind::WouldBlock | ErrorKind::ConnectionRefused
            ) => {
                trace!("Command dropped: {}", e);
                SendStatus::Dropped
            },
            Err(e) => {
                if self.num_failed == 0 {
                    warn!("Could not send command: {}", e);
                }
                SendStatus::Failed
            }
        };

        match status {
            SendStatus::Failed => self.num_failed += 1,
            _ => {
                if self.num_failed > 0 {
                    info!("Command link recovered after {} failed sends", self.num_failed);
                    self.num_failed = 0;
                }
                if status == SendStatus::Sent {
                    self.num_sent += 1;
                }
            }
        }

        status
    }

    /// Number of commands sent successfully.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }

    /// Number of consecutive failed sends.
    pub fn num_failed(&self) -> u64 {
        self.num_failed
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;
    use comms_if::eqpt::fc::Mode;

    #[test]
    fn test_send_command() {
        let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
        listener.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();

        let mut client = CmdClient::new(&endpoint).unwrap();
        let cmd = BodyCommand {
            timestamp_s: 1.0,
            mode: Mode::Approach,
            yaw: -0.12345,
            vertical: 0.5,
            forward: 0.25,
        };
        assert_eq!(client.send(&cmd), SendStatus::Sent);
        assert_eq!(client.num_sent(), 1);

        let mut buf = [0u8; 64];
        let n = listener.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"-0.1235,0.5000,0.2500,APPROACH");
    }

    #[test]
    fn test_send_without_listener() {
        // Bind then drop to get a port nobody is listening on
        let endpoint = {
            let s = UdpSocket::bind("127.0.0.1:0").unwrap();
            s.local_addr().unwrap().to_string()
        };

        let mut client = CmdClient::new(&endpoint).unwrap();
        let cmd = BodyCommand {
            timestamp_s: 0.0,
            mode: Mode::Search,
            yaw: 0.0,
            vertical: 0.0,
            forward: 0.0,
        };

        for _ in 0..3 {
            assert_ne!(client.send(&cmd), SendStatus::Failed);
        }
        assert_eq!(client.num_failed(), 0);
    }
}
