//! Packet types for the Engine.IO protocol.
//!
//! A packet is the unit of logical communication: a type drawn from the
//! seven canonical names plus an optional text or binary payload.
//! Packets are immutable values; encoding and decoding always produce
//! new ones.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload of the parser-error sentinel.
pub const PARSER_ERROR_DATA: &str = "parser error";

/// Packet type identifiers.
///
/// The seven wire variants map to the single-digit codes 0..=6. The
/// `Error` variant is reserved for the parser-error sentinel and has no
/// wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacketType {
    Open,
    Close,
    Ping,
    Pong,
    Message,
    Upgrade,
    Noop,
    Error,
}

impl PacketType {
    /// Get the single-digit wire code, or `None` for [`PacketType::Error`].
    #[must_use]
    pub fn code(self) -> Option<u8> {
        match self {
            PacketType::Open => Some(0),
            PacketType::Close => Some(1),
            PacketType::Ping => Some(2),
            PacketType::Pong => Some(3),
            PacketType::Message => Some(4),
            PacketType::Upgrade => Some(5),
            PacketType::Noop => Some(6),
            PacketType::Error => None,
        }
    }

    /// Look up a packet type by its wire code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PacketType::Open),
            1 => Some(PacketType::Close),
            2 => Some(PacketType::Ping),
            3 => Some(PacketType::Pong),
            4 => Some(PacketType::Message),
            5 => Some(PacketType::Upgrade),
            6 => Some(PacketType::Noop),
            _ => None,
        }
    }

    /// Look up a packet type by its ASCII digit, as it appears in text
    /// wire fragments.
    #[must_use]
    pub fn from_digit(digit: char) -> Option<Self> {
        digit
            .to_digit(10)
            .and_then(|code| u8::try_from(code).ok())
            .and_then(Self::from_code)
    }

    /// Get the ASCII digit for text wire fragments, or `None` for
    /// [`PacketType::Error`].
    #[must_use]
    pub fn digit(self) -> Option<char> {
        self.code().map(|code| char::from(b'0' + code))
    }

    /// Get the canonical packet-type name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PacketType::Open => "open",
            PacketType::Close => "close",
            PacketType::Ping => "ping",
            PacketType::Pong => "pong",
            PacketType::Message => "message",
            PacketType::Upgrade => "upgrade",
            PacketType::Noop => "noop",
            PacketType::Error => "error",
        }
    }

    /// Look up a packet type by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open" => Some(PacketType::Open),
            "close" => Some(PacketType::Close),
            "ping" => Some(PacketType::Ping),
            "pong" => Some(PacketType::Pong),
            "message" => Some(PacketType::Message),
            "upgrade" => Some(PacketType::Upgrade),
            "noop" => Some(PacketType::Noop),
            "error" => Some(PacketType::Error),
            _ => None,
        }
    }
}

impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Packet payload: text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketData {
    /// Textual payload.
    Text(String),
    /// Binary payload.
    Binary(Bytes),
}

impl PacketData {
    /// Get the payload as text, if textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PacketData::Text(text) => Some(text),
            PacketData::Binary(_) => None,
        }
    }

    /// Get the payload as raw bytes, if binary.
    #[must_use]
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            PacketData::Text(_) => None,
            PacketData::Binary(bytes) => Some(bytes),
        }
    }
}

impl From<String> for PacketData {
    fn from(text: String) -> Self {
        PacketData::Text(text)
    }
}

impl From<&str> for PacketData {
    fn from(text: &str) -> Self {
        PacketData::Text(text.to_owned())
    }
}

impl From<Bytes> for PacketData {
    fn from(bytes: Bytes) -> Self {
        PacketData::Binary(bytes)
    }
}

impl From<Vec<u8>> for PacketData {
    fn from(bytes: Vec<u8>) -> Self {
        PacketData::Binary(Bytes::from(bytes))
    }
}

/// A protocol packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// The packet type.
    #[serde(rename = "type")]
    pub packet_type: PacketType,
    /// Optional payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PacketData>,
}

impl Packet {
    /// Create a packet without data.
    #[must_use]
    pub fn new(packet_type: PacketType) -> Self {
        Self {
            packet_type,
            data: None,
        }
    }

    /// Create a packet with a payload.
    #[must_use]
    pub fn with_data(packet_type: PacketType, data: impl Into<PacketData>) -> Self {
        Self {
            packet_type,
            data: Some(data.into()),
        }
    }

    /// Create a packet from an ordered collection of displayable values,
    /// joined with `,` into a textual payload.
    #[must_use]
    pub fn from_values<I>(packet_type: PacketType, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let joined = values
            .into_iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self::with_data(packet_type, joined)
    }

    /// Create a new Open packet, typically carrying the handshake JSON.
    #[must_use]
    pub fn open(data: impl Into<PacketData>) -> Self {
        Self::with_data(PacketType::Open, data)
    }

    /// Create a new Close packet.
    #[must_use]
    pub fn close() -> Self {
        Self::new(PacketType::Close)
    }

    /// Create a new Ping packet.
    #[must_use]
    pub fn ping() -> Self {
        Self::new(PacketType::Ping)
    }

    /// Create a new Pong packet.
    #[must_use]
    pub fn pong() -> Self {
        Self::new(PacketType::Pong)
    }

    /// Create a new Message packet.
    #[must_use]
    pub fn message(data: impl Into<PacketData>) -> Self {
        Self::with_data(PacketType::Message, data)
    }

    /// Create a new Upgrade packet.
    #[must_use]
    pub fn upgrade() -> Self {
        Self::new(PacketType::Upgrade)
    }

    /// Create a new Noop packet.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(PacketType::Noop)
    }

    /// The parser-error sentinel returned for every wire-level decode
    /// failure.
    #[must_use]
    pub fn parser_error() -> Self {
        Self::with_data(PacketType::Error, PARSER_ERROR_DATA)
    }

    /// Check whether this packet is the parser-error sentinel. Both
    /// fields participate, so a decoded packet that merely has the
    /// error type does not match.
    #[must_use]
    pub fn is_parser_error(&self) -> bool {
        self.packet_type == PacketType::Error
            && matches!(&self.data, Some(PacketData::Text(text)) if text == PARSER_ERROR_DATA)
    }

    /// Get the payload as text, if present and textual.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.data.as_ref().and_then(PacketData::as_text)
    }
}
