//! # Peer Synchronizer
//!
//! Keeps a read-only mirror of the opponent's game in step with the
//! opponent's own session, by whole-state replication.
//!
//! ## State Machine
//!
//! ```text
//!             PlayerData (version ok)          ScreenLoaded
//! Connecting ─────────────────────▶ AwaitingPeerReady ─────────────▶ Synchronized
//!     │                                   │                              │
//!     └──────────── version mismatch / error / close / leave() ──────────┴──▶ Disconnected
//! ```
//!
//! ## Convergence
//!
//! Both sides send `ScreenLoaded` once their match screen is up. Whoever
//! receives it answers with its own `GameData` and a `RequestData{GameData}`,
//! so each side holds the other's snapshot no matter which `ScreenLoaded`
//! arrives first. After that, every local move is followed by
//! [`PeerSync::broadcast_game`]. The mirror is last-write-wins.
//!
//! ## Threading
//!
//! Inbound events are handled either by [`PeerSync::poll`] on the caller's
//! thread or by a relay thread from [`PeerSync::spawn_relay`]. Outbound sends
//! happen on whichever thread calls them. The mirror is an `Arc` swapped under
//! a short lock, so readers see the old or the new snapshot, never a mix.

mod relay;

pub use relay::RelayHandle;

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tilebattle_core::{Game, GameSnapshot};
use tilebattle_shared::{TileBattleConfig, PROTOCOL_VERSION};

use crate::error::{NetError, NetResult};
use crate::protocol::{
    Event, EventData, GameData, MessageType, Packet, Payload, PlayerData, RequestData,
};
use crate::transport::{Link, LinkEvent, Transport};

/// Which end of the link we are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Accepted the connection; starts the match.
    Host,
    /// Dialled the host.
    Guest,
}

/// Synchronizer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Link up, waiting for the peer's `PlayerData`.
    Connecting,
    /// Peer identified, waiting for its `ScreenLoaded`.
    AwaitingPeerReady,
    /// Snapshots are flowing.
    Synchronized,
    /// Terminal. No automatic reconnection.
    Disconnected,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::Connecting
    }
}

/// Notifications for the front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// The peer identified itself with a compatible version.
    PeerJoined {
        /// Peer's display name.
        username: String,
    },
    /// The peer changed its display name.
    PeerRenamed {
        /// New display name.
        username: String,
    },
    /// The peer runs another protocol version; the link is closed.
    IncompatibleVersions {
        /// Peer's version.
        peer: String,
        /// Our version.
        local: String,
    },
    /// The peer's match screen is up; snapshots are being exchanged.
    PeerReady,
    /// The mirror was replaced.
    OpponentUpdated,
    /// The host started the match.
    MatchStarted,
    /// The link went away. `None` for a clean close by the peer.
    ConnectionLost {
        /// What went wrong, if anything.
        reason: Option<NetError>,
    },
}

/// Local identity announced to the peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Display name.
    pub username: String,
    /// Protocol version; the peer must announce the same.
    pub version: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            username: tilebattle_shared::constants::DEFAULT_USERNAME.to_string(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }
}

impl From<&TileBattleConfig> for SyncConfig {
    fn from(config: &TileBattleConfig) -> Self {
        Self {
            username: config.player.username.clone(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }
}

/// One side of a two-peer match.
pub struct PeerSync {
    role: Role,
    transport: Arc<dyn Transport>,
    inbound: Receiver<LinkEvent>,
    local: Arc<Mutex<Game>>,
    mirror: Mutex<Option<Arc<GameSnapshot>>>,
    state: Mutex<SyncState>,
    username: Mutex<String>,
    peer_name: Mutex<Option<String>>,
    version: String,
    events_tx: Sender<SyncEvent>,
    events_rx: Receiver<SyncEvent>,
}

impl PeerSync {
    /// Wraps a connected link. Starts in [`SyncState::Connecting`]; call
    /// [`Self::connected`] to introduce ourselves.
    #[must_use]
    pub fn new(role: Role, link: Link, local: Arc<Mutex<Game>>, config: SyncConfig) -> Self {
        let (transport, inbound) = link.into_parts();
        let (events_tx, events_rx) = unbounded();
        Self {
            role,
            transport,
            inbound,
            local,
            mirror: Mutex::new(None),
            state: Mutex::new(SyncState::Connecting),
            username: Mutex::new(config.username),
            peer_name: Mutex::new(None),
            version: config.version,
            events_tx,
            events_rx,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Our role.
    #[inline]
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// True until the link is gone.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() != SyncState::Disconnected
    }

    /// Peer's display name, once known.
    #[must_use]
    pub fn peer_name(&self) -> Option<String> {
        self.peer_name.lock().clone()
    }

    /// Our display name.
    #[must_use]
    pub fn username(&self) -> String {
        self.username.lock().clone()
    }

    /// Description of the other end of the link.
    #[must_use]
    pub fn peer_addr(&self) -> String {
        self.transport.peer()
    }

    /// Latest opponent snapshot, if any has arrived.
    #[must_use]
    pub fn mirror(&self) -> Option<Arc<GameSnapshot>> {
        self.mirror.lock().clone()
    }

    /// The local session this synchronizer broadcasts.
    #[must_use]
    pub fn local(&self) -> &Arc<Mutex<Game>> {
        &self.local
    }

    /// Receiver of front-end notifications.
    #[must_use]
    pub fn events(&self) -> Receiver<SyncEvent> {
        self.events_rx.clone()
    }

    /// Drains pending notifications.
    #[must_use]
    pub fn drain_events(&self) -> Vec<SyncEvent> {
        self.events_rx.try_iter().collect()
    }

    // =========================================================================
    // Outbound
    // =========================================================================

    /// Introduces ourselves. Call once the link is up.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Disconnected`] if the link is gone, or the send
    /// error.
    pub fn connected(&self) -> NetResult<()> {
        tracing::info!(
            "Connected to {} as {:?}, sending player data",
            self.transport.peer(),
            self.role
        );
        self.send_player_data()
    }

    /// Tells the peer our match screen is up.
    ///
    /// # Errors
    ///
    /// See [`Self::connected`].
    pub fn screen_loaded(&self) -> NetResult<()> {
        self.send(&EventData {
            event: Event::ScreenLoaded,
        })
    }

    /// Sends the full local snapshot. Call after every local move.
    ///
    /// # Errors
    ///
    /// See [`Self::connected`].
    pub fn broadcast_game(&self) -> NetResult<()> {
        self.send_game_data()
    }

    /// Tells the guest the match has begun.
    ///
    /// # Errors
    ///
    /// See [`Self::connected`].
    pub fn start_match(&self) -> NetResult<()> {
        if self.role != Role::Host {
            tracing::warn!("Guest sent HostStartGame");
        }
        self.send(&EventData {
            event: Event::HostStartGame,
        })
    }

    /// Changes our display name and re-announces it.
    ///
    /// # Errors
    ///
    /// See [`Self::connected`].
    pub fn set_username(&self, username: impl Into<String>) -> NetResult<()> {
        *self.username.lock() = username.into();
        self.send_player_data()
    }

    /// Leaves the match and closes the link.
    pub fn leave(&self) {
        if self.transition(SyncState::Disconnected) {
            tracing::info!("Leaving match with {}", self.transport.peer());
        }
        self.transport.shutdown();
    }

    fn send_player_data(&self) -> NetResult<()> {
        let data = PlayerData {
            version: self.version.clone(),
            username: self.username(),
        };
        self.send(&data)
    }

    fn send_game_data(&self) -> NetResult<()> {
        let game = self.local.lock().snapshot();
        self.send(&GameData { game })
    }

    fn send<P: Payload>(&self, payload: &P) -> NetResult<()> {
        if !self.is_connected() {
            return Err(NetError::Disconnected);
        }
        let bytes = payload.serialise()?;
        if let Err(e) = self.transport.send(&bytes) {
            tracing::warn!("Failed to send {} to {}: {}", P::KIND, self.transport.peer(), e);
            if e != NetError::Disconnected {
                self.lose_connection(Some(e.clone()));
            }
            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // Inbound
    // =========================================================================

    /// Handles every pending link event on the calling thread. Returns the
    /// number of events handled.
    pub fn poll(&self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.inbound.try_recv() {
            handled += 1;
            if !self.handle_link_event(event) {
                break;
            }
        }
        handled
    }

    /// Starts a relay thread that handles inbound events until the link
    /// closes or the returned handle is stopped.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if the thread cannot be spawned.
    pub fn spawn_relay(self: &Arc<Self>) -> NetResult<RelayHandle> {
        relay::spawn(Arc::clone(self))
    }

    /// Handles one link event. Returns false once the link is finished.
    pub fn handle_link_event(&self, event: LinkEvent) -> bool {
        match event {
            LinkEvent::Frame(bytes) => {
                if let Err(e) = self.handle_frame(&bytes) {
                    tracing::warn!("Failed to handle data from {}: {}", self.transport.peer(), e);
                }
                self.is_connected()
            }
            LinkEvent::Error(e) => {
                self.lose_connection(Some(e));
                false
            }
            LinkEvent::Closed => {
                self.lose_connection(None);
                false
            }
        }
    }

    /// Decodes and applies one frame.
    ///
    /// Malformed or unknown messages are rejected without touching any
    /// state.
    ///
    /// # Errors
    ///
    /// Returns the decode error, [`NetError::ProtocolVersionMismatch`], or
    /// the error of a reply that could not be sent.
    pub fn handle_frame(&self, bytes: &[u8]) -> NetResult<()> {
        if !self.is_connected() {
            return Err(NetError::Disconnected);
        }
        match Packet::decode(bytes)? {
            Packet::Player(data) => self.on_player_data(data),
            Packet::Game(data) => {
                self.on_game_data(data.game);
                Ok(())
            }
            Packet::Event(data) => self.on_event(data.event),
            Packet::Request(data) => self.on_request(data.request),
        }
    }

    fn on_player_data(&self, data: PlayerData) -> NetResult<()> {
        if data.version != self.version {
            let err = NetError::ProtocolVersionMismatch {
                peer: data.version.clone(),
                local: self.version.clone(),
            };
            tracing::warn!("Rejecting {}: {}", self.transport.peer(), err);
            self.transition(SyncState::Disconnected);
            self.transport.shutdown();
            self.emit(SyncEvent::IncompatibleVersions {
                peer: data.version,
                local: self.version.clone(),
            });
            return Err(err);
        }

        let first = self.peer_name.lock().replace(data.username.clone()).is_none();
        if first {
            tracing::info!("Peer joined: {}", data.username);
            self.advance(SyncState::Connecting, SyncState::AwaitingPeerReady);
            self.emit(SyncEvent::PeerJoined {
                username: data.username,
            });
        } else {
            tracing::debug!("Peer renamed to {}", data.username);
            self.emit(SyncEvent::PeerRenamed {
                username: data.username,
            });
        }
        Ok(())
    }

    fn on_game_data(&self, snapshot: GameSnapshot) {
        *self.mirror.lock() = Some(Arc::new(snapshot));
        self.emit(SyncEvent::OpponentUpdated);
    }

    fn on_event(&self, event: Event) -> NetResult<()> {
        match event {
            Event::ScreenLoaded => {
                tracing::debug!("Peer screen loaded, exchanging game data");
                self.send_game_data()?;
                self.send(&RequestData {
                    request: MessageType::GameData,
                })?;
                self.advance_to_synchronized();
                self.emit(SyncEvent::PeerReady);
            }
            Event::HostStartGame => {
                tracing::info!("Host started the match");
                self.emit(SyncEvent::MatchStarted);
            }
        }
        Ok(())
    }

    fn on_request(&self, request: MessageType) -> NetResult<()> {
        match request {
            MessageType::GameData => self.send_game_data(),
            MessageType::PlayerData => self.send_player_data(),
            other => {
                tracing::debug!("Ignoring request for {}", other);
                Ok(())
            }
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Sets the state. Returns false if we were already there.
    fn transition(&self, next: SyncState) -> bool {
        let mut state = self.state.lock();
        if *state == next {
            return false;
        }
        tracing::debug!("Sync state {:?} -> {:?}", *state, next);
        *state = next;
        true
    }

    /// Moves `from -> to` only if currently in `from`.
    fn advance(&self, from: SyncState, to: SyncState) {
        let mut state = self.state.lock();
        if *state == from {
            tracing::debug!("Sync state {:?} -> {:?}", from, to);
            *state = to;
        }
    }

    fn advance_to_synchronized(&self) {
        let mut state = self.state.lock();
        if *state != SyncState::Disconnected && *state != SyncState::Synchronized {
            tracing::debug!("Sync state {:?} -> Synchronized", *state);
            *state = SyncState::Synchronized;
        }
    }

    fn lose_connection(&self, reason: Option<NetError>) {
        if !self.transition(SyncState::Disconnected) {
            return;
        }
        match &reason {
            Some(e) => tracing::warn!("Lost connection with {}: {}", self.transport.peer(), e),
            None => tracing::info!("{} closed the connection", self.transport.peer()),
        }
        self.transport.shutdown();
        self.emit(SyncEvent::ConnectionLost { reason });
    }

    fn emit(&self, event: SyncEvent) {
        // We hold a receiver ourselves, so this cannot fail
        let _ = self.events_tx.send(event);
    }
}

impl std::fmt::Debug for PeerSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSync")
            .field("role", &self.role)
            .field("state", &self.state())
            .field("peer", &self.transport.peer())
            .field("peer_name", &self.peer_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::local;

    fn peer(role: Role, link: Link, name: &str) -> PeerSync {
        let game = Arc::new(Mutex::new(Game::new(1)));
        let config = SyncConfig {
            username: name.into(),
            ..SyncConfig::default()
        };
        PeerSync::new(role, link, game, config)
    }

    #[test]
    fn test_starts_connecting() {
        let (a, _b) = local::pair();
        let sync = peer(Role::Host, a, "host");
        assert_eq!(sync.state(), SyncState::Connecting);
        assert_eq!(SyncState::default(), SyncState::Connecting);
        assert!(sync.mirror().is_none());
    }

    #[test]
    fn test_player_data_joins_then_renames() {
        let (a, _b) = local::pair();
        let sync = peer(Role::Host, a, "host");
        let join = PlayerData {
            version: PROTOCOL_VERSION.into(),
            username: "guest".into(),
        };

        sync.handle_frame(&join.serialise().unwrap()).unwrap();
        assert_eq!(sync.state(), SyncState::AwaitingPeerReady);

        let rename = PlayerData {
            username: "guest2".into(),
            ..join
        };
        sync.handle_frame(&rename.serialise().unwrap()).unwrap();

        assert_eq!(sync.state(), SyncState::AwaitingPeerReady);
        assert_eq!(sync.peer_name().as_deref(), Some("guest2"));
        assert_eq!(
            sync.drain_events(),
            vec![
                SyncEvent::PeerJoined { username: "guest".into() },
                SyncEvent::PeerRenamed { username: "guest2".into() },
            ]
        );
    }

    #[test]
    fn test_older_version_rejected() {
        let (a, _b) = local::pair();
        let game = Arc::new(Mutex::new(Game::new(4)));
        let sync = PeerSync::new(
            Role::Host,
            a,
            Arc::clone(&game),
            SyncConfig {
                username: "host".into(),
                version: "1.1".into(),
            },
        );
        let before = game.lock().snapshot();
        let old = PlayerData {
            version: "1.0".into(),
            username: "guest".into(),
        };

        assert_eq!(
            sync.handle_frame(&old.serialise().unwrap()),
            Err(NetError::ProtocolVersionMismatch {
                peer: "1.0".into(),
                local: "1.1".into(),
            })
        );
        assert_eq!(sync.state(), SyncState::Disconnected);
        assert_eq!(game.lock().snapshot(), before);
    }

    #[test]
    fn test_unknown_request_is_ignored() {
        let (a, b) = local::pair();
        let sync = peer(Role::Guest, a, "guest");
        let request = RequestData {
            request: MessageType::EventData,
        };

        sync.handle_frame(&request.serialise().unwrap()).unwrap();
        assert!(b.events().try_recv().is_err());
        assert!(sync.is_connected());
    }

    #[test]
    fn test_request_player_data_answers() {
        let (a, b) = local::pair();
        let sync = peer(Role::Guest, a, "guest");
        let request = RequestData {
            request: MessageType::PlayerData,
        };

        sync.handle_frame(&request.serialise().unwrap()).unwrap();
        let LinkEvent::Frame(bytes) = b.events().try_recv().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(
            Packet::decode(&bytes).unwrap(),
            Packet::Player(PlayerData {
                version: PROTOCOL_VERSION.into(),
                username: "guest".into(),
            })
        );
    }

    #[test]
    fn test_leave_is_terminal() {
        let (a, _b) = local::pair();
        let sync = peer(Role::Host, a, "host");
        sync.leave();
        sync.leave();

        assert_eq!(sync.state(), SyncState::Disconnected);
        assert_eq!(sync.broadcast_game(), Err(NetError::Disconnected));
        // Our own Closed notification produces no event after leave()
        sync.poll();
        assert!(sync.drain_events().is_empty());
    }
}
