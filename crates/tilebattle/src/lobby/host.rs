//! Host side: accept one guest, then start the match.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use parking_lot::Mutex;
use tilebattle_core::Game;
use tilebattle_networking::{NetError, NetResult, PeerSync, Role, SyncConfig, SyncEvent, TcpHost};
use tilebattle_shared::TileBattleConfig;

use super::Connection;
use crate::duel::DuelMatch;
use crate::status::StatusLine;

/// Waiting room on the hosting machine.
pub struct HostLobby {
    config: TileBattleConfig,
    listener: TcpHost,
    guest: Option<Connection>,
    username: String,
    status: StatusLine,
}

impl HostLobby {
    /// Listens on every interface at the configured port.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if the port cannot be bound.
    pub fn open(config: TileBattleConfig) -> NetResult<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.network.port));
        Self::open_on(config, addr)
    }

    /// Listens on `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if the address cannot be bound.
    pub fn open_on(config: TileBattleConfig, addr: impl ToSocketAddrs) -> NetResult<Self> {
        let listener = TcpHost::listen(addr)?;
        let username = config.player.username.clone();
        Ok(Self {
            config,
            listener,
            guest: None,
            username,
            status: StatusLine::new(),
        })
    }

    /// Address guests should dial.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Status line text source.
    #[must_use]
    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Name of the guest, once it has introduced itself.
    #[must_use]
    pub fn guest_name(&self) -> Option<String> {
        self.guest.as_ref().and_then(|guest| guest.sync.peer_name())
    }

    /// True once a compatible guest has joined.
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.guest
            .as_ref()
            .is_some_and(|guest| guest.sync.is_connected() && guest.sync.peer_name().is_some())
    }

    /// Changes our display name, re-announcing it to a connected guest.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        if let Some(guest) = &self.guest {
            if let Err(e) = guest.sync.set_username(self.username.clone()) {
                tracing::warn!("Failed to send username update to guest: {}", e);
            }
        }
    }

    /// Accepts a waiting guest and handles guest notifications.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Transport`] if the listener fails. A guest that
    /// misbehaves only costs its own connection.
    pub fn tick(&mut self) -> NetResult<()> {
        if self.guest.is_none() {
            if let Some(link) = self.listener.try_accept()? {
                self.admit(link)?;
            }
        }

        let Some(guest) = &self.guest else {
            return Ok(());
        };
        let events = guest.sync.events();
        while let Ok(event) = events.try_recv() {
            match event {
                SyncEvent::PeerJoined { username } | SyncEvent::PeerRenamed { username } => {
                    self.status.set(format!("\"{username}\" has joined"));
                }
                SyncEvent::IncompatibleVersions { peer, .. } => {
                    tracing::warn!("Guest runs incompatible version {}", peer);
                    self.drop_guest("Incompatible versions with guest");
                    break;
                }
                SyncEvent::ConnectionLost { .. } => {
                    self.drop_guest("Lost connection with guest");
                    break;
                }
                other => tracing::debug!("Lobby event: {:?}", other),
            }
        }
        Ok(())
    }

    /// Tells the guest the match has begun and hands the connection over.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Disconnected`] if no guest has joined, or the send
    /// error.
    pub fn start_match(&mut self) -> NetResult<DuelMatch> {
        if !self.can_start() {
            return Err(NetError::Disconnected);
        }
        let Some(guest) = self.guest.take() else {
            return Err(NetError::Disconnected);
        };
        if let Err(e) = guest.sync.start_match() {
            guest.close();
            self.status.show_for("Lost connection with guest", self.config.status_clear());
            return Err(e);
        }
        self.status.clear();

        let Connection { sync, relay } = guest;
        Ok(DuelMatch::with_capacity(
            sync,
            Some(relay),
            self.config.game.move_queue_capacity,
        ))
    }

    fn admit(&mut self, link: tilebattle_networking::Link) -> NetResult<()> {
        let game = Arc::new(Mutex::new(Game::from_entropy()));
        let config = SyncConfig {
            username: self.username.clone(),
            ..SyncConfig::from(&self.config)
        };
        let sync = Arc::new(PeerSync::new(Role::Host, link, game, config));
        let relay = sync.spawn_relay()?;

        if let Err(e) = sync.connected() {
            tracing::warn!("Failed to greet guest: {}", e);
            Connection { sync, relay }.close();
            return Ok(());
        }
        self.guest = Some(Connection { sync, relay });
        Ok(())
    }

    fn drop_guest(&mut self, message: &str) {
        if let Some(guest) = self.guest.take() {
            guest.close();
        }
        self.status.show_for(message, self.config.status_clear());
    }

    /// Disconnects any guest.
    pub fn close(&mut self) {
        if let Some(guest) = self.guest.take() {
            guest.close();
        }
    }
}

impl Drop for HostLobby {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for HostLobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLobby")
            .field("local_addr", &self.local_addr())
            .field("guest", &self.guest_name())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
