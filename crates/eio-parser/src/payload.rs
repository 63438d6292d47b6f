//! Payload multiplexing for transports without native message
//! boundaries.
//!
//! A payload is an ordered concatenation of wire fragments, each
//! preceded by a length header so the decoder can recover boundaries
//! without scanning for a delimiter that could collide with payload
//! content. Text framing is `"<length>:<fragment>"` repeated; binary
//! framing is a marker byte, the length as reversed digit-value bytes,
//! a `0xFF` separator, and the fragment bytes.
//!
//! Decoding streams each recovered packet to a caller-supplied consumer
//! `FnMut(Packet, usize, usize) -> bool`, invoked synchronously and in
//! order; returning `false` stops the scan. The caller detects the last
//! packet via `cursor + 1 == total`. On the first malformed input the
//! decoder invokes the consumer exactly once with the parser-error
//! sentinel and `(0, 1)`, then scans no further: a one-byte shift would
//! desynchronize every following length header.

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{decode_packet, decode_packet_binary, encode_packet, EncodeError, Encoded};
use crate::packet::Packet;

/// Separator terminating the length digits in binary framing.
const BINARY_LENGTH_SEPARATOR: u8 = 0xFF;

/// Encode an ordered sequence of packets into a text payload.
///
/// Each packet is encoded without binary support and without UTF-8
/// encoding; binary data therefore travels in its base64 fallback form.
/// The length header counts characters of the fragment, matching peers
/// that measure string length in code units. An empty
/// sequence encodes to the sentinel `"0:"`.
///
/// # Errors
///
/// Propagates [`EncodeError`] from packet encoding.
pub fn encode_payload(packets: &[Packet]) -> Result<String, EncodeError> {
    if packets.is_empty() {
        return Ok("0:".to_owned());
    }

    let mut payload = String::new();
    for packet in packets {
        match encode_packet(packet, false, false)? {
            Encoded::Text(fragment) => {
                let length = fragment.chars().count();
                payload.push_str(&length.to_string());
                payload.push(':');
                payload.push_str(&fragment);
            }
            Encoded::Binary(_) => unreachable!("text framing never requests binary fragments"),
        }
    }
    Ok(payload)
}

/// Decode a text payload, streaming each packet to `on_packet`.
///
/// `on_packet` receives `(packet, cursor, total)` where `cursor` is the
/// character offset of the last character of the fragment and `total`
/// is the character length of the input. Returning `false` stops the
/// scan. Zero-length fragments are skipped without a callback, which is
/// how the empty-payload sentinel `"0:"` round-trips.
pub fn decode_payload<F>(data: &str, mut on_packet: F)
where
    F: FnMut(Packet, usize, usize) -> bool,
{
    if data.is_empty() {
        tracing::debug!("payload rejected: empty input");
        on_packet(Packet::parser_error(), 0, 1);
        return;
    }

    let chars: Vec<char> = data.chars().collect();
    let total = chars.len();
    let mut length = String::new();
    let mut i = 0;

    while i < total {
        let chr = chars[i];

        if chr != ':' {
            length.push(chr);
            i += 1;
            continue;
        }

        let Some(n) = parse_length(&length) else {
            tracing::debug!(token = %length, "payload rejected: bad length token");
            on_packet(Packet::parser_error(), 0, 1);
            return;
        };

        // Exactly n characters must follow the ':'.
        if n > total - (i + 1) {
            tracing::debug!(expected = n, "payload rejected: truncated fragment");
            on_packet(Packet::parser_error(), 0, 1);
            return;
        }

        if n > 0 {
            let fragment: String = chars[i + 1..i + 1 + n].iter().collect();
            let packet = decode_packet(&fragment, false);

            if packet.is_parser_error() {
                // An engineered error frame must not masquerade as a
                // decoded parser error.
                tracing::debug!("payload rejected: malformed fragment");
                on_packet(Packet::parser_error(), 0, 1);
                return;
            }

            if !on_packet(packet, i + n, total) {
                return;
            }
        }

        i += n + 1;
        length.clear();
    }

    if !length.is_empty() {
        tracing::debug!(token = %length, "payload rejected: unterminated length token");
        on_packet(Packet::parser_error(), 0, 1);
    }
}

/// Parse a length token: non-empty, all ASCII digits.
fn parse_length(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Encode an ordered sequence of packets into a binary payload.
///
/// Each packet is encoded with binary support. The frame layout per
/// fragment is: marker byte (`0` for a text-origin fragment, `1` for a
/// binary-origin fragment), the fragment byte length as a reversed
/// sequence of digit-value bytes, a `0xFF` separator, then the fragment
/// bytes. Text-origin fragments travel as their UTF-8 bytes.
///
/// # Errors
///
/// Propagates [`EncodeError`] from packet encoding.
pub fn encode_payload_binary(packets: &[Packet]) -> Result<Bytes, EncodeError> {
    let mut payload = BytesMut::new();

    for packet in packets {
        let (marker, fragment) = match encode_packet(packet, true, false)? {
            Encoded::Text(text) => (0u8, Bytes::from(text.into_bytes())),
            Encoded::Binary(bytes) => (1u8, bytes),
        };

        payload.put_u8(marker);

        // Least-significant digit first; the decoder reverses before
        // parsing. Fragments always carry at least the type byte.
        let mut remaining = fragment.len();
        while remaining > 0 {
            payload.put_u8((remaining % 10) as u8);
            remaining /= 10;
        }
        payload.put_u8(BINARY_LENGTH_SEPARATOR);
        payload.extend_from_slice(&fragment);
    }

    Ok(payload.freeze())
}

/// Decode a binary payload, streaming each packet to `on_packet`.
///
/// `on_packet` receives `(packet, index, count)` where `index` is the
/// zero-based fragment index and `count` the number of fragments, so
/// `index + 1 == count` marks the last packet. Returning `false` stops
/// the dispatch. Any malformed framing or fragment invokes the consumer
/// exactly once with the parser-error sentinel and `(0, 1)`.
pub fn decode_payload_binary<F>(data: &[u8], mut on_packet: F)
where
    F: FnMut(Packet, usize, usize) -> bool,
{
    let mut fragments: Vec<(bool, &[u8])> = Vec::new();
    let mut rest = data;

    while let Some((&marker, after_marker)) = rest.split_first() {
        if marker > 1 {
            tracing::debug!(marker, "binary payload rejected: unknown marker");
            on_packet(Packet::parser_error(), 0, 1);
            return;
        }

        let mut digits: Vec<u8> = Vec::new();
        let mut cursor = 0;
        let separator = loop {
            match after_marker.get(cursor) {
                Some(&BINARY_LENGTH_SEPARATOR) => break cursor,
                Some(&digit) if digit <= 9 => {
                    digits.push(digit);
                    cursor += 1;
                }
                _ => {
                    tracing::debug!("binary payload rejected: bad length digits");
                    on_packet(Packet::parser_error(), 0, 1);
                    return;
                }
            }
        };

        let Some(n) = parse_reversed_digits(&digits) else {
            tracing::debug!("binary payload rejected: bad length token");
            on_packet(Packet::parser_error(), 0, 1);
            return;
        };

        let body = &after_marker[separator + 1..];
        let Some(fragment) = body.get(..n) else {
            tracing::debug!(expected = n, "binary payload rejected: truncated fragment");
            on_packet(Packet::parser_error(), 0, 1);
            return;
        };

        fragments.push((marker == 1, fragment));
        rest = &body[n..];
    }

    let count = fragments.len();
    for (index, (is_binary, fragment)) in fragments.into_iter().enumerate() {
        let packet = if is_binary {
            decode_packet_binary(fragment)
        } else {
            match std::str::from_utf8(fragment) {
                Ok(text) => decode_packet(text, false),
                Err(_) => {
                    tracing::debug!("binary payload rejected: non-utf8 text fragment");
                    on_packet(Packet::parser_error(), 0, 1);
                    return;
                }
            }
        };

        if packet.is_parser_error() {
            tracing::debug!("binary payload rejected: malformed fragment");
            on_packet(Packet::parser_error(), 0, 1);
            return;
        }

        if !on_packet(packet, index, count) {
            return;
        }
    }
}

/// Parse length digits stored least-significant first.
fn parse_reversed_digits(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    let mut value: usize = 0;
    for &digit in digits.iter().rev() {
        value = value
            .checked_mul(10)?
            .checked_add(usize::from(digit))?;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketType;

    /// Collect `(packet, is_last)` pairs from a text payload decode.
    fn collect(data: &str) -> Vec<(Packet, bool)> {
        let mut seen = Vec::new();
        decode_payload(data, |packet, cursor, total| {
            seen.push((packet, cursor + 1 == total));
            true
        });
        seen
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(encode_payload(&[]).unwrap(), "0:");
    }

    #[test]
    fn test_decode_empty_payload_sentinel() {
        // "0:" carries a zero-length fragment: no callback at all.
        assert_eq!(collect("0:"), vec![]);
    }

    #[test]
    fn test_encode_dataless_packets() {
        let packets = [Packet::ping(), Packet::pong()];
        assert_eq!(encode_payload(&packets).unwrap(), "1:21:3");
    }

    #[test]
    fn test_length_counts_characters() {
        let packets = [Packet::message("€€€"), Packet::message("α")];
        assert_eq!(encode_payload(&packets).unwrap(), "4:4€€€2:4α");
    }

    #[test]
    fn test_decode_single_packet_is_last() {
        let payload = encode_payload(&[Packet::message("a")]).unwrap();
        assert_eq!(payload, "2:4a");
        assert_eq!(collect(&payload), vec![(Packet::message("a"), true)]);
    }

    #[test]
    fn test_roundtrip_preserves_order_and_is_last() {
        let packets = vec![
            Packet::message("a"),
            Packet::message("€€€"),
            Packet::ping(),
        ];
        let payload = encode_payload(&packets).unwrap();

        let seen = collect(&payload);
        assert_eq!(seen.len(), packets.len());
        for (index, (packet, is_last)) in seen.iter().enumerate() {
            assert_eq!(packet, &packets[index]);
            assert_eq!(*is_last, index + 1 == packets.len());
        }
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let payload = encode_payload(&[Packet::ping(), Packet::pong(), Packet::noop()]).unwrap();
        let mut cursors = Vec::new();
        decode_payload(&payload, |_, cursor, _| {
            cursors.push(cursor);
            true
        });
        assert_eq!(cursors.len(), 3);
        assert!(cursors.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_consumer_can_stop_early() {
        let payload = encode_payload(&[Packet::ping(), Packet::pong(), Packet::noop()]).unwrap();
        let mut calls = 0;
        decode_payload(&payload, |_, _, _| {
            calls += 1;
            false
        });
        assert_eq!(calls, 1);
    }

    /// Assert a payload aborts with exactly one sentinel callback,
    /// reported as last.
    fn assert_aborts(data: &str) {
        let seen = collect(data);
        assert_eq!(seen, vec![(Packet::parser_error(), true)], "input: {data:?}");
    }

    #[test]
    fn test_decode_err_on_bad_format() {
        assert_aborts("1!");
        assert_aborts("");
        assert_aborts("))");
    }

    #[test]
    fn test_decode_err_on_bad_payload_length() {
        assert_aborts("1:");
    }

    #[test]
    fn test_decode_err_on_bad_packet() {
        assert_aborts("3:99:");
        assert_aborts("1:aa:");
        assert_aborts("1:a2:b");
    }

    #[test]
    fn test_abort_after_delivered_packets() {
        // A malformed fragment behind a valid one: the valid packet is
        // delivered, then the scan aborts with the sentinel.
        let seen = collect("2:4a1::");
        assert_eq!(
            seen,
            vec![(Packet::message("a"), false), (Packet::parser_error(), true)]
        );
    }

    #[test]
    fn test_abort_reports_zero_cursor() {
        let mut calls = 0;
        decode_payload("1!", |packet, cursor, total| {
            calls += 1;
            assert!(packet.is_parser_error());
            assert_eq!((cursor, total), (0, 1));
            true
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_binary_payload_layout() {
        let packets = [Packet::message(vec![1u8, 2, 3]), Packet::message("hello")];
        let payload = encode_payload_binary(&packets).unwrap();
        assert_eq!(
            &payload[..],
            [
                1, 4, 0xFF, 4, 1, 2, 3, // binary fragment, length 4
                0, 6, 0xFF, b'4', b'h', b'e', b'l', b'l', b'o', // text fragment
            ]
        );
    }

    #[test]
    fn test_binary_length_digits_are_reversed() {
        // Fragment "4aaaaaaaaaaa" is 12 bytes: digits 2 then 1.
        let payload = encode_payload_binary(&[Packet::message("aaaaaaaaaaa")]).unwrap();
        assert_eq!(&payload[..4], [0, 2, 1, 0xFF]);
    }

    fn collect_binary(data: &[u8]) -> Vec<(Packet, bool)> {
        let mut seen = Vec::new();
        decode_payload_binary(data, |packet, index, count| {
            seen.push((packet, index + 1 == count));
            true
        });
        seen
    }

    #[test]
    fn test_binary_roundtrip() {
        let packets = vec![
            Packet::message("firstBuffer"),
            Packet::message(vec![0u8, 0xFF, 7]),
            Packet::ping(),
            Packet::message("secondBuffer"),
        ];
        let payload = encode_payload_binary(&packets).unwrap();

        let seen = collect_binary(&payload);
        assert_eq!(seen.len(), packets.len());
        for (index, (packet, is_last)) in seen.iter().enumerate() {
            assert_eq!(*is_last, index + 1 == packets.len());
            assert_eq!(packet.packet_type, packets[index].packet_type);
        }
        // Text-origin fragments come back textual, binary-origin raw.
        assert_eq!(seen[0].0.text(), Some("firstBuffer"));
        assert_eq!(
            seen[1].0.data.as_ref().and_then(|d| d.as_binary()).map(|b| &b[..]),
            Some(&[0u8, 0xFF, 7][..])
        );
        assert_eq!(seen[3].0.text(), Some("secondBuffer"));
    }

    #[test]
    fn test_binary_decode_empty_input_is_silent() {
        assert_eq!(collect_binary(&[]), vec![]);
    }

    fn assert_binary_aborts(data: &[u8]) {
        let seen = collect_binary(data);
        assert_eq!(seen, vec![(Packet::parser_error(), true)], "input: {data:?}");
    }

    #[test]
    fn test_binary_decode_err_on_malformed_framing() {
        // Unknown marker.
        assert_binary_aborts(&[2, 1, 0xFF, 4]);
        // Length digit out of range.
        assert_binary_aborts(&[0, 42, 0xFF, 4]);
        // Missing separator.
        assert_binary_aborts(&[0, 1, 4]);
        // Empty length.
        assert_binary_aborts(&[0, 0xFF, 4]);
        // Truncated fragment.
        assert_binary_aborts(&[0, 3, 0xFF, b'4', b'a']);
    }

    #[test]
    fn test_binary_decode_err_on_bad_fragment() {
        // Type code 9 is not a packet type.
        assert_binary_aborts(&[1, 1, 0xFF, 9]);
        // Marker says text but the bytes are not UTF-8.
        assert_binary_aborts(&[0, 2, 0xFF, b'4', 0xFE]);
    }

    #[test]
    fn test_binary_consumer_can_stop_early() {
        let payload =
            encode_payload_binary(&[Packet::ping(), Packet::pong(), Packet::noop()]).unwrap();
        let mut calls = 0;
        decode_payload_binary(&payload, |_, _, _| {
            calls += 1;
            false
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_text_and_binary_framing_disagree_on_purpose() {
        // The same packet list has a text rendering (base64 fallback)
        // and a binary rendering (raw bytes).
        let packets = [Packet::message(vec![1u8, 2, 3])];
        assert_eq!(encode_payload(&packets).unwrap(), "6:b4AQID");
        let binary = encode_payload_binary(&packets).unwrap();
        assert_eq!(&binary[..], [1, 4, 0xFF, 4, 1, 2, 3]);
    }

    #[test]
    fn test_decode_payload_type_sequence() {
        let payload = encode_payload(&[Packet::message("a"), Packet::ping()]).unwrap();
        let seen = collect(&payload);
        assert_eq!(seen[0].0.packet_type, PacketType::Message);
        assert!(!seen[0].1);
        assert_eq!(seen[1].0.packet_type, PacketType::Ping);
        assert!(seen[1].1);
    }
}
