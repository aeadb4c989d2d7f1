//! Decoder for Google's encoded polyline format (precision 1e5).

use fleetdash_core::Coordinates;

/// Decodes an encoded polyline into points.
///
/// Returns `None` when the input is truncated or contains bytes outside the
/// format's alphabet.
#[must_use]
pub fn decode_polyline(encoded: &str) -> Option<Vec<Coordinates>> {
    let bytes = encoded.as_bytes();
    let mut index = 0usize;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::new();

    while index < bytes.len() {
        lat += next_delta(bytes, &mut index)?;
        lng += next_delta(bytes, &mut index)?;
        #[allow(clippy::cast_precision_loss)]
        points.push(Coordinates::new(lat as f64 / 1e5, lng as f64 / 1e5)?);
    }

    Some(points)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    loop {
        let byte = i64::from(*bytes.get(*index)?) - 63;
        *index += 1;
        if !(0..64).contains(&byte) || shift > 60 {
            return None;
        }
        result |= (byte & 0x1f) << shift;
        shift += 5;
        if byte < 0x20 {
            break;
        }
    }
    Some(if result & 1 == 0 {
        result >> 1
    } else {
        !(result >> 1)
    })
}
