//! # eio-utf8
//!
//! UTF-8 transcoder for the Engine.IO wire codec.
//!
//! Engine.IO peers on JavaScript-shaped runtimes exchange text as
//! sequences of UTF-16 code units, where astral characters are surrogate
//! pairs and lone surrogates can occur. This crate transcodes between
//! that code-unit view and UTF-8 bytes with the exact semantics shared
//! across Engine.IO implementations:
//!
//! - Surrogate pairs combine into a single scalar `>= 0x10000`.
//! - Lone surrogates are rejected in [`Mode::Strict`] and replaced with
//!   U+FFFD in [`Mode::Lenient`].
//! - Structurally invalid byte sequences (bad continuation bytes,
//!   overlong encodings, truncation, out-of-range scalars) are rejected
//!   in both modes.
//!
//! ## Example
//!
//! ```rust
//! use eio_utf8::{decode, encode, Mode};
//!
//! let units: Vec<u16> = "€".encode_utf16().collect();
//! let bytes = encode(&units, Mode::Lenient).unwrap();
//! assert_eq!(bytes, [0xE2, 0x82, 0xAC]);
//! assert_eq!(decode(&bytes, Mode::Lenient).unwrap(), units);
//! ```

pub mod codec;
pub mod surrogate;

pub use codec::{decode, decode_str, encode, encode_str, Mode, Utf8Error};
pub use surrogate::{scalars_from_units, units_from_scalars};
