//! Typed message contents.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tilebattle_core::GameSnapshot;

use super::message::{parse_message, Envelope, Message, MessageType};
use crate::error::{NetError, NetResult};

/// Content that can be wrapped in an envelope.
pub trait Payload: Serialize + DeserializeOwned {
    /// Type tag written into the envelope.
    const KIND: MessageType;

    /// Encodes `self` as a complete envelope.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::MalformedMessage`] if the content cannot be
    /// represented as JSON.
    fn serialise(&self) -> NetResult<Vec<u8>> {
        let content =
            serde_json::to_value(self).map_err(|e| NetError::MalformedMessage(e.to_string()))?;
        let envelope = Envelope {
            kind: Self::KIND.as_str().to_string(),
            content,
        };
        serde_json::to_vec(&envelope).map_err(|e| NetError::MalformedMessage(e.to_string()))
    }

    /// Decodes the content of an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::MalformedMessage`] if the content does not match.
    fn parse(content: Value) -> NetResult<Self> {
        serde_json::from_value(content)
            .map_err(|e| NetError::MalformedMessage(format!("{}: {e}", Self::KIND)))
    }
}

/// Who is on the other end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    /// Protocol version; must match exactly.
    pub version: String,
    /// Display name.
    pub username: String,
}

impl Payload for PlayerData {
    const KIND: MessageType = MessageType::PlayerData;
}

/// Sender's whole game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    /// Snapshot of the sender's session.
    pub game: GameSnapshot,
}

impl Payload for GameData {
    const KIND: MessageType = MessageType::GameData;
}

/// One-off notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// The sender's match screen is up and it can exchange state.
    ScreenLoaded,
    /// The host started the match.
    HostStartGame,
}

/// Wrapper for an [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// The event.
    pub event: Event,
}

impl Payload for EventData {
    const KIND: MessageType = MessageType::EventData;
}

/// Ask the peer to send its current payload of `request`'s type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    /// Requested type.
    pub request: MessageType,
}

impl Payload for RequestData {
    const KIND: MessageType = MessageType::RequestData;

    /// Decodes the content, telling an unknown requested kind apart from a
    /// malformed body.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::UnsupportedMessageType`] if `request` names a
    /// kind this build does not know, [`NetError::MalformedMessage`] if the
    /// content has the wrong shape.
    fn parse(content: Value) -> NetResult<Self> {
        #[derive(Deserialize)]
        struct Raw {
            request: String,
        }

        let raw: Raw = serde_json::from_value(content)
            .map_err(|e| NetError::MalformedMessage(format!("{}: {e}", Self::KIND)))?;
        let request = MessageType::from_tag(&raw.request)
            .ok_or(NetError::UnsupportedMessageType(raw.request))?;
        Ok(Self { request })
    }
}

/// A fully decoded message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Packet {
    /// Player data.
    Player(PlayerData),
    /// Game snapshot.
    Game(Box<GameData>),
    /// Event.
    Event(EventData),
    /// Data request.
    Request(RequestData),
}

impl Packet {
    /// Parses and decodes a frame in one go.
    ///
    /// # Errors
    ///
    /// See [`parse_message`] and [`Message::decode`].
    pub fn decode(bytes: &[u8]) -> NetResult<Self> {
        parse_message(bytes)?.decode()
    }

    /// Encodes the packet as a complete envelope.
    ///
    /// # Errors
    ///
    /// See [`Payload::serialise`].
    pub fn serialise(&self) -> NetResult<Vec<u8>> {
        match self {
            Self::Player(data) => data.serialise(),
            Self::Game(data) => data.serialise(),
            Self::Event(data) => data.serialise(),
            Self::Request(data) => data.serialise(),
        }
    }

    /// Type tag of the packet.
    #[must_use]
    pub const fn kind(&self) -> MessageType {
        match self {
            Self::Player(_) => MessageType::PlayerData,
            Self::Game(_) => MessageType::GameData,
            Self::Event(_) => MessageType::EventData,
            Self::Request(_) => MessageType::RequestData,
        }
    }
}

impl Message {
    /// Decodes the content according to the type tag.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::MalformedMessage`] if the content does not match
    /// the tag.
    pub fn decode(self) -> NetResult<Packet> {
        Ok(match self.kind {
            MessageType::PlayerData => Packet::Player(PlayerData::parse(self.content)?),
            MessageType::GameData => Packet::Game(Box::new(GameData::parse(self.content)?)),
            MessageType::EventData => Packet::Event(EventData::parse(self.content)?),
            MessageType::RequestData => Packet::Request(RequestData::parse(self.content)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilebattle_core::{Direction, Game};

    #[test]
    fn test_player_data_round_trip() {
        let data = PlayerData {
            version: "1.2.3".into(),
            username: "alice \"the\" tiler".into(),
        };
        let bytes = data.serialise().unwrap();
        assert_eq!(Packet::decode(&bytes).unwrap(), Packet::Player(data));
    }

    #[test]
    fn test_game_data_round_trip() {
        let mut game = Game::new(8);
        game.execute_move(Direction::Down);
        let data = GameData { game: game.snapshot() };

        let msg = parse_message(&data.serialise().unwrap()).unwrap();
        assert_eq!(msg.kind, MessageType::GameData);
        assert_eq!(GameData::parse(msg.content).unwrap(), data);
    }

    #[test]
    fn test_event_and_request_wire_shape() {
        let bytes = EventData { event: Event::HostStartGame }.serialise().unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "EventData");
        assert_eq!(json["content"]["event"], "HostStartGame");

        let bytes = RequestData { request: MessageType::GameData }.serialise().unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["content"]["request"], "GameData");
    }

    #[test]
    fn test_content_mismatch_is_malformed() {
        let bytes = br#"{"type":"PlayerData","content":{"event":"ScreenLoaded"}}"#;
        assert!(matches!(Packet::decode(bytes), Err(NetError::MalformedMessage(_))));

        let bytes = br#"{"type":"EventData","content":{"event":"Surrender"}}"#;
        assert!(matches!(Packet::decode(bytes), Err(NetError::MalformedMessage(_))));
    }

    #[test]
    fn test_unknown_requested_kind_is_unsupported() {
        let bytes = br#"{"type":"RequestData","content":{"request":"Chat"}}"#;
        assert_eq!(
            Packet::decode(bytes),
            Err(NetError::UnsupportedMessageType("Chat".into()))
        );

        // A body of the wrong shape is still malformed
        let bytes = br#"{"type":"RequestData","content":{"request":7}}"#;
        assert!(matches!(Packet::decode(bytes), Err(NetError::MalformedMessage(_))));
    }

    #[test]
    fn test_packet_kind_matches_envelope() {
        let packet = Packet::Request(RequestData { request: MessageType::PlayerData });
        let msg = parse_message(&packet.serialise().unwrap()).unwrap();
        assert_eq!(msg.kind, packet.kind());
    }
}
