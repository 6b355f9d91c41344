//! # TILEBATTLE
//!
//! Front-end logic for solo and head-to-head 2048, driven one update tick at
//! a time. Nothing here draws; presentation reads the accessors each frame.
//!
//! ## Screens
//!
//! ```text
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │  SoloGame    │      │  HostLobby   │─────>│              │
//! │              │      │              │      │  DuelMatch   │
//! │  keys ─> Game│      │  JoinLobby   │─────>│              │
//! └──────┬───────┘      └──────┬───────┘      └──────────────┘
//!        │                     │
//!        └──────> Store <──────┘   solo save, last host address
//! ```
//!
//! ## Modules
//!
//! - `solo`: direct moves, save on exit
//! - `duel`: queued moves, combined win/lose
//! - `lobby`: host and join flows
//! - `status`: transient status text and the waiting animation
//! - `store`: file-backed key-value blobs
//! - `input`: key bindings

#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod duel;
pub mod input;
pub mod lobby;
pub mod solo;
pub mod status;
pub mod store;

// Re-export the building blocks
pub use tilebattle_core as core;
pub use tilebattle_networking as networking;
pub use tilebattle_shared as shared;

// Re-export commonly used types
pub use duel::{DuelMatch, DuelView, MatchOutcome};
pub use input::Key;
pub use lobby::{HostLobby, JoinLobby};
pub use solo::SoloGame;
pub use status::{StatusLine, WaitingAnimation};
pub use store::{Store, StoreError, StoreResult, LAST_HOST_KEY, SOLO_SAVE_KEY};
