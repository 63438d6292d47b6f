//! UTF-8 encoding and decoding over code-unit sequences.
//!
//! The encoder walks combined scalar values and emits 1/2/3/4-byte
//! sequences at the standard boundaries; the decoder classifies each
//! lead byte by its high bits and validates every continuation byte.
//! Surrogate-range scalars are the only place [`Mode`] matters: both
//! modes reject structurally broken byte sequences.

use thiserror::Error;

use crate::surrogate::{scalars_from_units, units_from_scalars};

/// UTF-8 validation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Reject surrogate-range scalars with [`Utf8Error::InvalidScalarValue`].
    Strict,
    /// Replace surrogate-range scalars with U+FFFD.
    Lenient,
}

/// Transcoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Utf8Error {
    /// A surrogate-range scalar was encountered in strict mode.
    #[error("lone surrogate U+{0:04X} is not a scalar value")]
    InvalidScalarValue(u32),

    /// A byte inside a multi-byte sequence did not match `10xxxxxx`.
    #[error("invalid continuation byte at offset {0}")]
    InvalidContinuationByte(usize),

    /// A multi-byte sequence decoded below its minimum scalar value.
    #[error("overlong encoding at offset {0}")]
    Overlong(usize),

    /// The input ended in the middle of a multi-byte sequence.
    #[error("truncated sequence at offset {0}")]
    TruncatedSequence(usize),

    /// The lead byte or decoded scalar was outside every valid range.
    #[error("invalid UTF-8 at offset {0}")]
    InvalidUtf8(usize),
}

fn check_scalar_value(scalar: u32, mode: Mode) -> Result<u32, Utf8Error> {
    if (0xD800..=0xDFFF).contains(&scalar) {
        return match mode {
            Mode::Strict => Err(Utf8Error::InvalidScalarValue(scalar)),
            Mode::Lenient => Ok(0xFFFD),
        };
    }
    Ok(scalar)
}

/// Encode a sequence of UTF-16-style code units into UTF-8 bytes.
///
/// Surrogate pairs are combined before encoding; a lone surrogate is
/// rejected or substituted according to `mode`.
///
/// # Errors
///
/// Returns [`Utf8Error::InvalidScalarValue`] for a lone surrogate in
/// [`Mode::Strict`].
pub fn encode(units: &[u16], mode: Mode) -> Result<Vec<u8>, Utf8Error> {
    let scalars = scalars_from_units(units);
    let mut bytes = Vec::with_capacity(units.len());
    for &scalar in &scalars {
        encode_scalar(scalar, mode, &mut bytes)?;
    }
    Ok(bytes)
}

fn encode_scalar(scalar: u32, mode: Mode, out: &mut Vec<u8>) -> Result<(), Utf8Error> {
    if scalar < 0x80 {
        // 1-byte sequence
        out.push(scalar as u8);
    } else if scalar < 0x800 {
        // 2-byte sequence
        out.push((((scalar >> 6) & 0x1F) | 0xC0) as u8);
        out.push(((scalar & 0x3F) | 0x80) as u8);
    } else if scalar < 0x10000 {
        // 3-byte sequence, the only range where surrogates can appear
        let scalar = check_scalar_value(scalar, mode)?;
        out.push((((scalar >> 12) & 0x0F) | 0xE0) as u8);
        out.push((((scalar >> 6) & 0x3F) | 0x80) as u8);
        out.push(((scalar & 0x3F) | 0x80) as u8);
    } else {
        // 4-byte sequence; pair combination caps scalars at 0x10FFFF
        out.push((((scalar >> 18) & 0x07) | 0xF0) as u8);
        out.push((((scalar >> 12) & 0x3F) | 0x80) as u8);
        out.push((((scalar >> 6) & 0x3F) | 0x80) as u8);
        out.push(((scalar & 0x3F) | 0x80) as u8);
    }
    Ok(())
}

/// Per-call decode state. The cursor lives on the stack of the caller,
/// so concurrent decodes are fully independent.
struct Decoder<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, index: 0 }
    }

    fn read_continuation_byte(&mut self) -> Result<u32, Utf8Error> {
        let Some(&byte) = self.bytes.get(self.index) else {
            return Err(Utf8Error::TruncatedSequence(self.index));
        };
        self.index += 1;

        if byte & 0xC0 == 0x80 {
            Ok(u32::from(byte & 0x3F))
        } else {
            Err(Utf8Error::InvalidContinuationByte(self.index - 1))
        }
    }

    /// Decode the next scalar, or `None` at end of input.
    fn decode_scalar(&mut self, mode: Mode) -> Result<Option<u32>, Utf8Error> {
        let start = self.index;
        let Some(&byte1) = self.bytes.get(self.index) else {
            return Ok(None);
        };
        self.index += 1;
        let byte1 = u32::from(byte1);

        // 1-byte sequence (no continuation bytes)
        if byte1 & 0x80 == 0 {
            return Ok(Some(byte1));
        }

        // 2-byte sequence
        if byte1 & 0xE0 == 0xC0 {
            let byte2 = self.read_continuation_byte()?;
            let scalar = ((byte1 & 0x1F) << 6) | byte2;
            return if scalar >= 0x80 {
                Ok(Some(scalar))
            } else {
                Err(Utf8Error::Overlong(start))
            };
        }

        // 3-byte sequence (may carry unpaired surrogates)
        if byte1 & 0xF0 == 0xE0 {
            let byte2 = self.read_continuation_byte()?;
            let byte3 = self.read_continuation_byte()?;
            let scalar = ((byte1 & 0x0F) << 12) | (byte2 << 6) | byte3;
            if scalar < 0x800 {
                return Err(Utf8Error::Overlong(start));
            }
            return Ok(Some(check_scalar_value(scalar, mode)?));
        }

        // 4-byte sequence
        if byte1 & 0xF8 == 0xF0 {
            let byte2 = self.read_continuation_byte()?;
            let byte3 = self.read_continuation_byte()?;
            let byte4 = self.read_continuation_byte()?;
            let scalar = ((byte1 & 0x07) << 18) | (byte2 << 12) | (byte3 << 6) | byte4;
            if (0x10000..=0x10FFFF).contains(&scalar) {
                return Ok(Some(scalar));
            }
        }

        Err(Utf8Error::InvalidUtf8(start))
    }
}

/// Decode UTF-8 bytes into a sequence of UTF-16-style code units.
///
/// # Errors
///
/// Returns the structural error matching the first invalid sequence, or
/// [`Utf8Error::InvalidScalarValue`] for a surrogate-range scalar in
/// [`Mode::Strict`].
pub fn decode(bytes: &[u8], mode: Mode) -> Result<Vec<u16>, Utf8Error> {
    let mut decoder = Decoder::new(bytes);
    let mut scalars = Vec::with_capacity(bytes.len());
    while let Some(scalar) = decoder.decode_scalar(mode)? {
        scalars.push(scalar);
    }
    Ok(units_from_scalars(&scalars))
}

/// Encode a string's code units, returning a byte string: each char of
/// the result is in `U+0000..=U+00FF` and stands for one UTF-8 byte.
///
/// This is the text-safe carrier the packet codec puts on the wire when
/// UTF-8 encoding is requested.
///
/// # Errors
///
/// Propagates [`encode`] errors; inputs that originate from `&str`
/// contain no lone surrogates and cannot fail.
pub fn encode_str(text: &str, mode: Mode) -> Result<String, Utf8Error> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let bytes = encode(&units, mode)?;
    Ok(bytes.into_iter().map(char::from).collect())
}

/// Decode a byte string (each char standing for one byte, high bits
/// masked off) back into text.
///
/// # Errors
///
/// Propagates [`decode`] errors.
pub fn decode_str(text: &str, mode: Mode) -> Result<String, Utf8Error> {
    let bytes: Vec<u8> = text.chars().map(|c| (c as u32 & 0xFF) as u8).collect();
    let units = decode(&bytes, mode)?;
    // The decoder never emits lone surrogates, so this conversion is
    // infallible in practice.
    String::from_utf16(&units).map_err(|_| Utf8Error::InvalidUtf8(0))
}
