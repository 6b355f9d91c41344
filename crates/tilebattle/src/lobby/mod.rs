//! # Lobbies
//!
//! Getting two players into a [`DuelMatch`](crate::duel::DuelMatch).
//!
//! ```text
//! HostLobby                                   JoinLobby
//!   listen(port)                                join("1.2.3.4")
//!   tick(): accept ◀──────── TCP ──────────────   connect (200 ms timeout)
//!           PlayerData ──────────────────────▶    tick(): "Waiting for "host" to start the game..."
//!           ◀──────────────────── PlayerData
//!   start_match() ── HostStartGame ─────────▶     tick() -> Some(DuelMatch)
//!   -> DuelMatch
//! ```
//!
//! Both lobbies are driven by the caller's update loop and never block.
//! Inbound frames are handled by a relay thread from the moment the link
//! is up; the relay is handed over to the match.

mod host;
mod join;

pub use host::HostLobby;
pub use join::JoinLobby;

use std::sync::Arc;

use tilebattle_networking::{PeerSync, RelayHandle};

/// A connected peer and the thread delivering its frames.
struct Connection {
    sync: Arc<PeerSync>,
    relay: RelayHandle,
}

impl Connection {
    fn close(self) {
        self.sync.leave();
        self.relay.stop();
    }
}
