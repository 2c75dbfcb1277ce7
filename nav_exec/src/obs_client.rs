//! # Observation Client
//!
//! The ObsClient receives anchor observation datagrams from the camera pipeline on a background
//! thread and publishes the latest one into an [`ObsMailbox`]. The mailbox holds a single slot, a
//! newer datagram always overwrites an older one, and a sequence number which is incremented on
//! every publish so that the control loop can tell whether anything new arrived since it last
//! looked.
//!
//! Malformed datagrams are dropped by the background thread and never reach the mailbox.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    net::{SocketAddr, UdpSocket},
    sync::{Arc, RwLock, atomic::{AtomicBool, Ordering}},
    thread::{self, JoinHandle},
    time::Duration,
    io::ErrorKind,
};
use log::{error, info, trace};

use comms_if::{
    eqpt::cam::AnchorDatagram,
    net::{self, NetError, NetParams, SocketOptions}
};
use crate::nav_loop::Shutdown;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Single slot holding the latest observation datagram.
#[derive(Debug, Default)]
pub struct ObsMailbox {
    slot: RwLock<MailboxSlot>,
}

/// Contents of the mailbox at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MailboxSlot {
    /// Latest datagram, `None` until the first one arrives.
    pub latest: Option<AnchorDatagram>,

    /// Number of datagrams published so far.
    pub seq: u64,
}

pub struct ObsClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    mailbox: Arc<ObsMailbox>,
    local_addr: SocketAddr,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ObsClientError {
    #[error("Could not open the observation socket: {0}")]
    SocketError(#[from] NetError),

    #[error("Could not get the local address of the observation socket: {0}")]
    LocalAddrError(std::io::Error),

    #[error("Could not start the observation thread: {0}")]
    ThreadError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ObsMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new datagram, returning the new sequence number.
    pub fn publish(&self, datagram: AnchorDatagram) -> u64 {
        // The slot is plain data, so a panic while holding the lock cannot leave it inconsistent
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());

        slot.latest = Some(datagram);
        slot.seq = slot.seq.wrapping_add(1);

        slot.seq
    }

    /// Copy the current contents of the slot.
    pub fn snapshot(&self) -> MailboxSlot {
        *self.slot.read().unwrap_or_else(|e| e.into_inner())
    }
}

impl ObsClient {
    /// Bind the observation socket and start the background thread.
    ///
    /// The thread runs until [`ObsClient::stop`] is called or `shutdown` is requested.
    pub fn start(params: &NetParams, shutdown: &Shutdown) -> Result<Self, ObsClientError> {
        let socket = net::bind_listener(
            &params.obs_endpoint, 
            SocketOptions {
                recv_timeout: Some(Duration::from_millis(params.obs_recv_timeout_ms.max(1))),
                nonblocking: false
            }
        )?;

        let local_addr = socket.local_addr()
            .map_err(ObsClientError::LocalAddrError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let mailbox = Arc::new(ObsMailbox::new());

        let bg_run_clone = bg_run.clone();
        let shutdown_clone = shutdown.clone();
        let mailbox_clone = mailbox.clone();
        let read_buffer = params.obs_read_buffer.max(1);

        let bg_jh = thread::Builder::new()
            .name("obs_client".into())
            .spawn(move || bg_thread(
                socket, 
                read_buffer, 
                bg_run_clone, 
                shutdown_clone, 
                mailbox_clone
            ))
            .map_err(ObsClientError::ThreadError)?;

        info!("ObsClient listening on {}", local_addr);

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            mailbox,
            local_addr
        })
    }

    /// The mailbox the client publishes into.
    pub fn mailbox(&self) -> Arc<ObsMailbox> {
        self.mailbox.clone()
    }

    /// Address the observation socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the background thread and wait for it to exit.
    ///
    /// The thread notices the request within one receive timeout.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("ObsClient background thread panicked");
            }
        }
    }
}

impl Drop for ObsClient {
    fn drop(&mut self) {
        self.stop();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, publishes every valid datagram received into the mailbox.
fn bg_thread(
    socket: UdpSocket,
    read_buffer: usize,
    run: Arc<AtomicBool>,
    shutdown: Shutdown,
    mailbox: Arc<ObsMailbox>
) {
    let mut buf = vec![0u8; read_buffer];

    while run.load(Ordering::Relaxed) && !shutdown.is_requested() {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            // Reported on some platforms after a send to a closed port, harmless for a listener
            Err(e) if e.kind() == ErrorKind::ConnectionReset => continue,
            Err(e) => {
                error!("Error receiving observation datagram: {}", e);
                break
            }
        };

        match AnchorDatagram::from_payload(&buf[..len]) {
            Ok(d) => {
                mailbox.publish(d);
            },
            Err(e) => trace!("Discarding datagram from {}: {}", from, e)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Instant;

    fn loopback_params() -> NetParams {
        NetParams {
            obs_endpoint: "127.0.0.1:0".into(),
            obs_read_buffer: 256,
            obs_recv_timeout_ms: 20,
            cmd_endpoint: String::new(),
        }
    }

    /// Wait until the mailbox sequence reaches `seq`.
    fn wait_for_seq(mailbox: &ObsMailbox, seq: u64) -> MailboxSlot {
        let start = Instant::now();
        loop {
            let slot = mailbox.snapshot();
            if slot.seq >= seq || start.elapsed() > Duration::from_secs(2) {
                return slot
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_mailbox_overwrites() {
        let mailbox = ObsMailbox::new();
        assert_eq!(mailbox.snapshot(), MailboxSlot::default());

        let mut d = AnchorDatagram::from_payload(b"1,0.9,0.1,0.2,0.3").unwrap();
        assert_eq!(mailbox.publish(d), 1);
        d.cx = -0.5;
        assert_eq!(mailbox.publish(d), 2);

        let slot = mailbox.snapshot();
        assert_eq!(slot.seq, 2);
        assert_eq!(slot.latest.unwrap().cx, -0.5);
    }

    #[test]
    fn test_receive_and_discard() {
        let mut client = ObsClient::start(&loopback_params(), &Shutdown::new()).unwrap();
        let mailbox = client.mailbox();

        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = client.local_addr();

        sender.send_to(b"12.5,1,0.8,0.1,-0.1,0.2", target).unwrap();
        let slot = wait_for_seq(&mailbox, 1);
        assert_eq!(slot.seq, 1);
        assert_eq!(slot.latest.unwrap().timestamp_s, Some(12.5));

        // Malformed datagrams never reach the mailbox
        sender.send_to(b"", target).unwrap();
        sender.send_to(b"1,2,3", target).unwrap();
        sender.send_to(b"maybe,0.8,0.1,-0.1,0.2", target).unwrap();
        sender.send_to(b"0,0.0,0.0,0.0,0.0", target).unwrap();

        let slot = wait_for_seq(&mailbox, 2);
        assert_eq!(slot.seq, 2);
        let latest = slot.latest.unwrap();
        assert!(!latest.detected);
        assert_eq!(latest.timestamp_s, None);

        client.stop();
        assert!(client.bg_jh.is_none());
    }

    #[test]
    fn test_shutdown_stops_thread() {
        let shutdown = Shutdown::new();
        let client = ObsClient::start(&loopback_params(), &shutdown).unwrap();

        shutdown.request();

        let start = Instant::now();
        while !client.bg_jh.as_ref().map_or(true, |jh| jh.is_finished()) {
            assert!(start.elapsed() < Duration::from_secs(2));
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_bind_failure() {
        let params = NetParams {
            obs_endpoint: "not-an-endpoint".into(),
            ..loopback_params()
        };
        assert!(matches!(
            ObsClient::start(&params, &Shutdown::new()), 
            Err(ObsClientError::SocketError(_))
        ));
    }
}
