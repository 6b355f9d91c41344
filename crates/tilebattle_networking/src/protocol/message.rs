//! Message envelope and type tags.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NetError, NetResult};

/// Type tag carried in every envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Username and protocol version.
    PlayerData,
    /// Full game snapshot.
    GameData,
    /// A one-off event.
    EventData,
    /// Ask the peer for its current payload of some type.
    RequestData,
}

impl MessageType {
    /// All known tags.
    pub const ALL: [Self; 4] = [
        Self::PlayerData,
        Self::GameData,
        Self::EventData,
        Self::RequestData,
    ];

    /// Wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayerData => "PlayerData",
            Self::GameData => "GameData",
            Self::EventData => "EventData",
            Self::RequestData => "RequestData",
        }
    }

    /// Looks up a wire tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope as it appears on the wire.
///
/// ```text
/// {"type": "GameData", "content": { ... }}
/// ```
#[derive(Serialize, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) content: Value,
}

/// A parsed envelope whose content has not been decoded yet.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Type tag.
    pub kind: MessageType,
    /// Undecoded content.
    pub content: Value,
}

/// Parses the envelope of a frame.
///
/// # Errors
///
/// Returns [`NetError::MalformedMessage`] if the bytes are not an envelope
/// and [`NetError::UnsupportedMessageType`] for an unknown type tag.
pub fn parse_message(bytes: &[u8]) -> NetResult<Message> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| NetError::MalformedMessage(e.to_string()))?;
    let kind = MessageType::from_tag(&envelope.kind)
        .ok_or_else(|| NetError::UnsupportedMessageType(envelope.kind.clone()))?;
    Ok(Message {
        kind,
        content: envelope.content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let msg = parse_message(br#"{"type":"EventData","content":{"event":"ScreenLoaded"}}"#).unwrap();
        assert_eq!(msg.kind, MessageType::EventData);
        assert_eq!(msg.content["event"], "ScreenLoaded");
    }

    #[test]
    fn test_unknown_tag() {
        let err = parse_message(br#"{"type":"Chat","content":{}}"#).unwrap_err();
        assert_eq!(err, NetError::UnsupportedMessageType("Chat".into()));
    }

    #[test]
    fn test_garbage_is_malformed() {
        for bytes in [&b""[..], b"not json", b"{\"type\":1}", b"{\"content\":{}}", &[0xff, 0x00]] {
            assert!(matches!(
                parse_message(bytes),
                Err(NetError::MalformedMessage(_))
            ));
        }
    }

    #[test]
    fn test_tags_round_trip() {
        for kind in MessageType::ALL {
            assert_eq!(MessageType::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageType::from_tag("gamedata"), None);
    }
}
