//! # TILEBATTLE Networking
//!
//! Two peers, each running its own game, each holding a mirror of the
//! other's.
//!
//! ## Architecture
//!
//! - **Protocol**: JSON envelopes tagged `PlayerData`, `GameData`,
//!   `EventData` or `RequestData`
//! - **Transport**: length-prefixed TCP, or an in-process pair
//! - **Synchronization**: whole-state replication, last write wins
//!
//! ## Authority Model
//!
//! ```text
//! HOST                                GUEST
//!   |--- PlayerData(version, name) --->|
//!   |<-- PlayerData(version, name) ----|
//!   |--- HostStartGame --------------->|
//!   |<-- ScreenLoaded -----------------|
//!   |--- GameData + RequestData ------>|
//!   |<-- GameData ---------------------|
//!   |       ... GameData after every local move ...
//! ```
//!
//! Each side is the only writer of its own session. Nothing the peer sends
//! can touch it; incoming snapshots only replace the mirror.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use tilebattle_core::Game;
//! use tilebattle_networking::{local, PeerSync, Role, SyncConfig, SyncState};
//!
//! let (a, b) = local::pair();
//! let host = PeerSync::new(Role::Host, a, Arc::new(Mutex::new(Game::new(1))), SyncConfig::default());
//! let guest = PeerSync::new(Role::Guest, b, Arc::new(Mutex::new(Game::new(2))), SyncConfig::default());
//!
//! host.connected().unwrap();
//! guest.connected().unwrap();
//! host.poll();
//! guest.poll();
//! assert_eq!(host.state(), SyncState::AwaitingPeerReady);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod protocol;
pub mod sync;
pub mod transport;

// Re-exports for convenience
pub use error::{NetError, NetResult};
pub use protocol::{
    parse_message, Event, EventData, GameData, Message, MessageType, Packet, Payload, PlayerData,
    RequestData,
};
pub use sync::{PeerSync, RelayHandle, Role, SyncConfig, SyncEvent, SyncState};
pub use transport::tcp::{self, TcpHost};
pub use transport::{local, Link, LinkEvent, Transport};
