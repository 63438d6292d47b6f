//! # eio-parser
//!
//! Packet and payload codec for the Engine.IO wire protocol, revision 3.
//!
//! The codec turns typed logical packets into transport-ready text or
//! binary fragments and back, and multiplexes packet sequences into a
//! single framed payload for transports that cannot deliver discrete
//! messages (HTTP long-polling, chiefly). It is synchronous and does no
//! I/O; transports feed it bytes and consume [`Packet`] values.
//!
//! Wire-level decode failures are reported as the parser-error sentinel
//! packet `{type: error, data: "parser error"}` rather than as `Err`,
//! so a caller iterating decoded packets branches on
//! [`Packet::is_parser_error`] like on any other decoded value.
//!
//! ## Example
//!
//! ```rust
//! use eio_parser::{decode_payload, encode_payload, Packet};
//!
//! let payload = encode_payload(&[Packet::message("hello"), Packet::ping()]).unwrap();
//!
//! let mut packets = Vec::new();
//! decode_payload(&payload, |packet, cursor, total| {
//!     let is_last = cursor + 1 == total;
//!     packets.push((packet, is_last));
//!     true // keep scanning
//! });
//!
//! assert_eq!(packets[0].0, Packet::message("hello"));
//! assert!(packets[1].1);
//! ```

pub mod codec;
pub mod packet;
pub mod payload;

pub use codec::{decode_packet, decode_packet_binary, encode_packet, EncodeError, Encoded};
pub use packet::{Packet, PacketData, PacketType, PARSER_ERROR_DATA};
pub use payload::{
    decode_payload, decode_payload_binary, encode_payload, encode_payload_binary,
};

/// Engine.IO protocol revision implemented by this codec.
pub const PROTOCOL: u8 = 3;
