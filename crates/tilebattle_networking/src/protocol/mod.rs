//! # Message Protocol
//!
//! JSON envelopes exchanged between the two peers.
//!
//! ## Message Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ {"type": <tag>, "content": <payload>}                        │
//! ├──────────────┬───────────────────────────────────────────────┤
//! │ PlayerData   │ {"version": "0.1.0", "username": "alice"}     │
//! │ GameData     │ {"game": <GameSnapshot>}                      │
//! │ EventData    │ {"event": "ScreenLoaded" | "HostStartGame"}   │
//! │ RequestData  │ {"request": <tag>}                            │
//! └──────────────┴───────────────────────────────────────────────┘
//! ```
//!
//! Decoding never panics: bad bytes or content are
//! [`NetError::MalformedMessage`](crate::NetError::MalformedMessage), an
//! unknown tag is
//! [`NetError::UnsupportedMessageType`](crate::NetError::UnsupportedMessageType).
//! Version compatibility is checked by the synchronizer, not here.

mod message;
mod payloads;

pub use message::{parse_message, Message, MessageType};
pub use payloads::{Event, EventData, GameData, Packet, Payload, PlayerData, RequestData};
