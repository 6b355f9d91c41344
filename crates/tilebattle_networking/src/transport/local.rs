//! In-process linked pair.
//!
//! Frames are handed straight to the other side's channel, so a send is
//! visible to the peer as soon as it returns. Used by tests and by a host
//! and guest running in the same process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Sender};

use super::{Link, LinkEvent, Transport};
use crate::error::{NetError, NetResult};

/// One end of an in-process pair.
pub struct LocalTransport {
    name: &'static str,
    to_peer: Sender<LinkEvent>,
    to_self: Sender<LinkEvent>,
    /// Shared by both ends: closing either closes the pair.
    closed: Arc<AtomicBool>,
}

impl Transport for LocalTransport {
    fn send(&self, frame: &[u8]) -> NetResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(NetError::Disconnected);
        }
        self.to_peer
            .send(LinkEvent::Frame(frame.to_vec()))
            .map_err(|_| NetError::Disconnected)
    }

    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("Local link closed by {} side", self.name);
        // A dropped receiver just means nobody is listening any more
        let _ = self.to_self.send(LinkEvent::Closed);
        let _ = self.to_peer.send(LinkEvent::Closed);
    }

    fn peer(&self) -> String {
        let other = if self.name == "a" { "b" } else { "a" };
        format!("local:{other}")
    }
}

/// Creates two linked ends.
#[must_use]
pub fn pair() -> (Link, Link) {
    let (a_tx, a_rx) = unbounded();
    let (b_tx, b_rx) = unbounded();
    let closed = Arc::new(AtomicBool::new(false));

    let a = LocalTransport {
        name: "a",
        to_peer: b_tx.clone(),
        to_self: a_tx.clone(),
        closed: Arc::clone(&closed),
    };
    let b = LocalTransport {
        name: "b",
        to_peer: a_tx,
        to_self: b_tx,
        closed,
    };

    (Link::new(Arc::new(a), a_rx), Link::new(Arc::new(b), b_rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_cross_over() {
        let (a, b) = pair();
        a.transport().send(b"ping").unwrap();
        b.transport().send(b"pong").unwrap();

        assert_eq!(b.events().try_recv().unwrap(), LinkEvent::Frame(b"ping".to_vec()));
        assert_eq!(a.events().try_recv().unwrap(), LinkEvent::Frame(b"pong".to_vec()));
    }

    #[test]
    fn test_shutdown_closes_both_ends() {
        let (a, b) = pair();
        b.transport().shutdown();
        b.transport().shutdown();

        assert_eq!(a.events().try_recv().unwrap(), LinkEvent::Closed);
        assert_eq!(b.events().try_recv().unwrap(), LinkEvent::Closed);
        assert!(a.events().try_recv().is_err());
        assert_eq!(a.transport().send(b"late"), Err(NetError::Disconnected));
        assert_eq!(a.transport().peer(), "local:b");
    }
}
