//! # Transport Layer
//!
//! Reliable, ordered frame delivery between two peers.
//!
//! ## Design
//!
//! ```text
//!            send(frame)                          LinkEvent::Frame
//! PeerSync ──────────────▶ Transport ══ wire ══▶ reader ──────────▶ channel ──▶ PeerSync
//!                              │
//!                          shutdown() ─────────────────────────────▶ LinkEvent::Closed
//! ```
//!
//! - Outbound frames go straight through [`Transport::send`]
//! - Inbound frames, errors and the close notification arrive in order on a
//!   crossbeam channel, so a relay thread or the update tick can consume them
//! - After `shutdown()` every send returns [`NetError::Disconnected`]

pub mod local;
pub mod tcp;

use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::error::{NetError, NetResult};

/// Something that happened on the inbound half of a link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// One complete frame.
    Frame(Vec<u8>),
    /// The stream failed; no more frames will follow.
    Error(NetError),
    /// The stream was closed by either side; no more frames will follow.
    Closed,
}

/// Outbound half of a link.
pub trait Transport: Send + Sync {
    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Disconnected`] after shutdown and
    /// [`NetError::Transport`] if the write fails.
    fn send(&self, frame: &[u8]) -> NetResult<()>;

    /// Closes the link in both directions. Idempotent.
    fn shutdown(&self);

    /// Human readable description of the other end.
    fn peer(&self) -> String;
}

/// A connected link: the outbound transport plus the inbound event stream.
pub struct Link {
    transport: Arc<dyn Transport>,
    events: Receiver<LinkEvent>,
}

impl Link {
    /// Pairs a transport with its inbound stream.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, events: Receiver<LinkEvent>) -> Self {
        Self { transport, events }
    }

    /// Outbound half.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Inbound events.
    #[must_use]
    pub const fn events(&self) -> &Receiver<LinkEvent> {
        &self.events
    }

    /// Splits into both halves.
    #[must_use]
    pub fn into_parts(self) -> (Arc<dyn Transport>, Receiver<LinkEvent>) {
        (self.transport, self.events)
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("peer", &self.transport.peer())
            .field("pending", &self.events.len())
            .finish()
    }
}
