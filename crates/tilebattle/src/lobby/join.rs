//! Guest side: dial a host, wait for it to start the match.
//!
//! The join action is "armed" while no connection is pending. A failed dial
//! or a lost connection re-arms it, so the player can simply try again.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tilebattle_core::Game;
use tilebattle_networking::{tcp, NetResult, PeerSync, Role, SyncConfig, SyncEvent};
use tilebattle_shared::TileBattleConfig;

use super::Connection;
use crate::duel::DuelMatch;
use crate::status::{StatusLine, WaitingAnimation};
use crate::store::{Store, LAST_HOST_KEY};

/// Join screen on the guest machine.
pub struct JoinLobby {
    config: TileBattleConfig,
    store: Store,
    status: StatusLine,
    username: String,
    host: Option<Connection>,
    waiting: Option<WaitingAnimation>,
}

impl JoinLobby {
    /// Creates an armed join screen.
    #[must_use]
    pub fn new(config: TileBattleConfig, store: Store) -> Self {
        let username = config.player.username.clone();
        Self {
            config,
            store,
            status: StatusLine::new(),
            username,
            host: None,
            waiting: None,
        }
    }

    /// Host address used last time, if any.
    #[must_use]
    pub fn last_host(&self) -> Option<String> {
        match self.store.read_string(LAST_HOST_KEY) {
            Ok(host) => host.filter(|h| !h.trim().is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read last host address: {}", e);
                None
            }
        }
    }

    /// Status line text source.
    #[must_use]
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// True while a new join attempt is allowed.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.host.is_none()
    }

    /// Name the host announced, once known.
    #[must_use]
    pub fn host_name(&self) -> Option<String> {
        self.host.as_ref().and_then(|host| host.sync.peer_name())
    }

    /// Changes our display name, re-announcing it to a connected host.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        if let Some(host) = &self.host {
            if let Err(e) = host.sync.set_username(self.username.clone()) {
                tracing::warn!("Failed to send username update to host: {}", e);
            }
        }
    }

    /// Dials `host` (`ip`, `name` or `addr:port`) and introduces ourselves.
    ///
    /// The address is remembered for next time. Ignored while a connection
    /// is already pending.
    ///
    /// # Errors
    ///
    /// Returns [`tilebattle_networking::NetError::ConnectFailure`] if the host
    /// cannot be reached within the connect timeout. The status line shows
    /// the failure and the join action stays armed.
    pub fn join(&mut self, host: &str) -> NetResult<()> {
        if !self.is_armed() {
            tracing::debug!("Join ignored, already connected");
            return Ok(());
        }

        let host = host.trim();
        if let Err(e) = self.store.save_bytes(LAST_HOST_KEY, host.as_bytes()) {
            tracing::warn!("Failed to save host address: {}", e);
        }

        match self.dial(host) {
            Ok(connection) => {
                self.host = Some(connection);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to join game: {}", e);
                self.status
                    .show_for("Failed to connect to host", self.config.connect_fail_clear());
                Err(e)
            }
        }
    }

    fn dial(&self, host: &str) -> NetResult<Connection> {
        let addr = match host.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(_) => tcp::resolve(host, self.config.network.port)?,
        };
        let link = tcp::connect(addr, self.config.connect_timeout())?;

        let game = Arc::new(Mutex::new(Game::from_entropy()));
        let config = SyncConfig {
            username: self.username.clone(),
            ..SyncConfig::from(&self.config)
        };
        let sync = Arc::new(PeerSync::new(Role::Guest, link, game, config));
        let relay = sync.spawn_relay()?;
        let connection = Connection { sync, relay };

        if let Err(e) = connection.sync.connected() {
            connection.close();
            return Err(e);
        }
        Ok(connection)
    }

    /// Handles host notifications. Returns the match once the host starts
    /// it.
    pub fn tick(&mut self) -> Option<DuelMatch> {
        let events = self.host.as_ref()?.sync.events();
        while let Ok(event) = events.try_recv() {
            match event {
                SyncEvent::PeerJoined { username } | SyncEvent::PeerRenamed { username } => {
                    self.stop_waiting();
                    self.waiting = Some(self.status.animate_waiting(
                        format!("Waiting for \"{username}\" to start the game"),
                        self.config.waiting_dots_interval(),
                    ));
                }
                SyncEvent::MatchStarted => {
                    self.stop_waiting();
                    self.status.clear();
                    let Connection { sync, relay } = self.host.take()?;
                    return Some(DuelMatch::with_capacity(
                        sync,
                        Some(relay),
                        self.config.game.move_queue_capacity,
                    ));
                }
                SyncEvent::IncompatibleVersions { peer, local } => {
                    tracing::warn!("Host runs version {}, we run {}", peer, local);
                    self.disconnect("Incompatible versions with host");
                    return None;
                }
                SyncEvent::ConnectionLost { .. } => {
                    self.disconnect("Lost connection with host");
                    return None;
                }
                other => tracing::debug!("Join event: {:?}", other),
            }
        }
        None
    }

    /// Leaves the host and re-arms the join action.
    pub fn cancel(&mut self) {
        self.stop_waiting();
        if let Some(host) = self.host.take() {
            host.close();
        }
    }

    fn disconnect(&mut self, message: &str) {
        self.cancel();
        self.status.show_for(message, self.config.status_clear());
    }

    fn stop_waiting(&mut self) {
        if let Some(waiting) = self.waiting.take() {
            waiting.stop();
        }
    }
}

impl Drop for JoinLobby {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for JoinLobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinLobby")
            .field("armed", &self.is_armed())
            .field("host", &self.host_name())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
