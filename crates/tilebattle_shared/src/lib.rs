//! # TILEBATTLE Shared
//!
//! Constants and configuration used by both peers.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - the grid engine (`tilebattle_core`)
//! - sockets or threads
//!
//! If you need game types, put them in `tilebattle_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;

pub use config::{ConfigError, ConfigResult, GameConfig, NetworkConfig, PlayerConfig, TileBattleConfig};
pub use constants::{
    APP_PORT, CONNECT_TIMEOUT, HOST_BIND, MAX_FRAME_SIZE, MOVE_QUEUE_CAPACITY, PROTOCOL_VERSION,
};
