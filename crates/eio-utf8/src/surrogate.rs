//! Surrogate-pair arithmetic between UTF-16-style code units and
//! Unicode scalar values.
//!
//! These are the ucs2 halves of the transcoder: combining a high/low
//! surrogate pair into one scalar `>= 0x10000` and splitting such a
//! scalar back into its pair. Lone surrogates pass through unchanged in
//! both directions.

/// Combine UTF-16-style code units into scalar values.
///
/// A high surrogate (`0xD800..=0xDBFF`) immediately followed by a low
/// surrogate (`0xDC00..=0xDFFF`) combines into one scalar. An unmatched
/// high surrogate is emitted alone, and the unit that followed it is
/// reprocessed as the start of the next step.
#[must_use]
pub fn scalars_from_units(units: &[u16]) -> Vec<u32> {
    let mut output = Vec::with_capacity(units.len());
    let mut counter = 0;

    while counter < units.len() {
        let value = u32::from(units[counter]);
        counter += 1;

        if (0xD800..=0xDBFF).contains(&value) && counter < units.len() {
            let extra = u32::from(units[counter]);
            if extra & 0xFC00 == 0xDC00 {
                output.push(((value & 0x3FF) << 10) + (extra & 0x3FF) + 0x10000);
                counter += 1;
            } else {
                // Unmatched surrogate; only this code unit is consumed, in
                // case the next unit is the high surrogate of a valid pair.
                output.push(value);
            }
        } else {
            output.push(value);
        }
    }

    output
}

/// Split scalar values back into UTF-16-style code units.
///
/// Scalars above `0xFFFF` become surrogate pairs; everything else maps
/// to a single unit, including scalars in the surrogate range.
#[must_use]
pub fn units_from_scalars(scalars: &[u32]) -> Vec<u16> {
    let mut output = Vec::with_capacity(scalars.len());

    for &scalar in scalars {
        if scalar > 0xFFFF {
            let value = scalar - 0x10000;
            output.push((((value >> 10) & 0x3FF) | 0xD800) as u16);
            output.push((0xDC00 | (value & 0x3FF)) as u16);
        } else {
            output.push(scalar as u16);
        }
    }

    output
}
