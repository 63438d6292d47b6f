//! Codec for single Engine.IO packets.
//!
//! Encoding turns a [`Packet`] into its wire fragment; decoding turns a
//! wire fragment back into a [`Packet`]. Wire-level decode failures are
//! never surfaced as `Err`: they return the parser-error sentinel
//! ([`Packet::parser_error`]) so callers handle protocol violations the
//! same way as any other decoded value.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use eio_utf8::{Mode, Utf8Error};
use thiserror::Error;

use crate::packet::{Packet, PacketData, PacketType};

/// The wire fragment of a single packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// Text form: type digit followed by data, or `'b'` + digit +
    /// base64 for the text-safe binary fallback.
    Text(String),
    /// Binary form: type code byte followed by raw data bytes.
    Binary(Bytes),
}

impl Encoded {
    /// Get the fragment as text, if textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Encoded::Text(text) => Some(text),
            Encoded::Binary(_) => None,
        }
    }

    /// Get the fragment as raw bytes, if binary.
    #[must_use]
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Encoded::Text(_) => None,
            Encoded::Binary(bytes) => Some(bytes),
        }
    }
}

/// Errors raised for encode misuse. Unlike wire errors these fail fast
/// at the call site: they indicate a bug in the caller, not malformed
/// input from a peer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The packet type has no wire code (only [`PacketType::Error`]).
    #[error("packet type {0} has no wire code")]
    UnknownPacketType(PacketType),

    /// UTF-8 encoding of the payload failed.
    #[error("utf8 encoding failed: {0}")]
    Utf8(#[from] Utf8Error),
}

/// Encode a packet into its wire fragment.
///
/// Binary data is emitted raw when `supports_binary` is set and falls
/// back to `'b'` + digit + base64 otherwise. Textual data is optionally
/// passed through lenient UTF-8 encoding when `utf8_encode` is set.
///
/// # Errors
///
/// Returns [`EncodeError::UnknownPacketType`] when the packet carries
/// the valueless `Error` type.
pub fn encode_packet(
    packet: &Packet,
    supports_binary: bool,
    utf8_encode: bool,
) -> Result<Encoded, EncodeError> {
    let packet_type = packet.packet_type;
    let code = packet_type
        .code()
        .ok_or(EncodeError::UnknownPacketType(packet_type))?;
    let digit = char::from(b'0' + code);

    match &packet.data {
        Some(PacketData::Binary(bytes)) => {
            if supports_binary {
                let mut buf = BytesMut::with_capacity(1 + bytes.len());
                buf.put_u8(code);
                buf.extend_from_slice(bytes);
                Ok(Encoded::Binary(buf.freeze()))
            } else {
                let mut message = String::with_capacity(2 + bytes.len() * 4 / 3 + 4);
                message.push('b');
                message.push(digit);
                BASE64.encode_string(bytes, &mut message);
                Ok(Encoded::Text(message))
            }
        }
        Some(PacketData::Text(text)) => {
            let body = if utf8_encode {
                eio_utf8::encode_str(text, Mode::Lenient)?
            } else {
                text.clone()
            };
            let mut message = String::with_capacity(1 + body.len());
            message.push(digit);
            message.push_str(&body);
            Ok(Encoded::Text(message))
        }
        None => Ok(Encoded::Text(digit.to_string())),
    }
}

/// Decode a text wire fragment into a packet.
///
/// Any wire-level failure (empty input, unknown type digit, invalid
/// UTF-8) yields the parser-error sentinel.
#[must_use]
pub fn decode_packet(data: &str, utf8_decode: bool) -> Packet {
    let Some(first) = data.chars().next() else {
        return Packet::parser_error();
    };

    if first == 'b' {
        return decode_base64_packet(&data[1..]);
    }

    let decoded;
    let data = if utf8_decode {
        match eio_utf8::decode_str(data, Mode::Lenient) {
            Ok(text) => {
                decoded = text;
                decoded.as_str()
            }
            Err(err) => {
                tracing::debug!(%err, "packet rejected: invalid utf8");
                return Packet::parser_error();
            }
        }
    } else {
        data
    };

    // The leading character must be one of the seven type digits.
    let Some(first) = data.chars().next() else {
        return Packet::parser_error();
    };
    let Some(packet_type) = PacketType::from_digit(first) else {
        return Packet::parser_error();
    };

    let remainder = &data[1..];
    if remainder.is_empty() {
        Packet::new(packet_type)
    } else {
        Packet::with_data(packet_type, remainder)
    }
}

/// Decode a `'b'`-prefixed base64 fragment (without the leading `'b'`).
///
/// Compatibility quirk carried over from existing peers: the remainder
/// is re-encoded to base64 and returned as textual data, rather than
/// being decoded to raw bytes. Confirm against the peer before changing
/// this.
fn decode_base64_packet(msg: &str) -> Packet {
    let Some(first) = msg.chars().next() else {
        return Packet::parser_error();
    };
    let Some(packet_type) = PacketType::from_digit(first) else {
        return Packet::parser_error();
    };

    Packet::with_data(packet_type, BASE64.encode(&msg.as_bytes()[1..]))
}

/// Decode a binary wire fragment into a packet.
///
/// The first byte is the type code, the rest is the binary payload. An
/// empty input or an out-of-range code yields the parser-error sentinel.
#[must_use]
pub fn decode_packet_binary(data: &[u8]) -> Packet {
    let Some((&code, rest)) = data.split_first() else {
        return Packet::parser_error();
    };
    let Some(packet_type) = PacketType::from_code(code) else {
        return Packet::parser_error();
    };

    Packet::with_data(packet_type, Bytes::copy_from_slice(rest))
}
