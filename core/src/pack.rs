use std::f32::consts::FRAC_1_SQRT_2;

use crate::math::Quat;
use crate::pieces::PIECE_COUNT;

pub const PACKED_LEN: usize = PIECE_COUNT * 4;

/// The seven component values a snapped orientation can take. Composing only
/// 90°-multiple rotations about the principal axes keeps every quaternion
/// component on this alphabet, which is what makes the one-digit-per-float
/// encoding exact.
pub const QUAT_ALPHABET: [f32; 7] = [
    0.0,
    0.5,
    FRAC_1_SQRT_2,
    1.0,
    -0.5,
    -FRAC_1_SQRT_2,
    -1.0,
];

/// Index of the alphabet value closest to `value`. Matching by distance
/// rather than equality absorbs the f32 drift that repeated quaternion
/// multiplication accumulates.
pub fn nearest_symbol(value: f32) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (index, symbol) in QUAT_ALPHABET.iter().enumerate() {
        let distance = (value - symbol).abs();
        if distance < best_distance {
            best_distance = distance;
            best = index;
        }
    }
    best
}

pub fn quantize(value: f32) -> f32 {
    QUAT_ALPHABET[nearest_symbol(value)]
}

/// Clamps every component to the nearest alphabet value. Commits run through
/// this so the snapped-state invariant holds exactly.
pub fn quantize_quat(q: Quat) -> Quat {
    Quat::new(quantize(q.x), quantize(q.y), quantize(q.z), quantize(q.w))
}

/// Value for one packed digit. Unrecognized symbols decode as zero rather
/// than failing the message.
pub fn symbol_value(symbol: char) -> f32 {
    match symbol {
        '0' => 0.0,
        '1' => 0.5,
        '2' => FRAC_1_SQRT_2,
        '3' => 1.0,
        '4' => -0.5,
        '5' => -FRAC_1_SQRT_2,
        '6' => -1.0,
        _ => 0.0,
    }
}

/// Packs orientations into one digit per component, `'0'..='6'`. 26 pieces
/// yield the fixed 104-character wire string.
pub fn pack_orientations(orientations: &[Quat]) -> String {
    let mut packed = String::with_capacity(orientations.len() * 4);
    for q in orientations {
        for component in [q.x, q.y, q.z, q.w] {
            packed.push((b'0' + nearest_symbol(component) as u8) as char);
        }
    }
    packed
}

/// Exact inverse of `pack_orientations` for strings over the alphabet.
/// Anything that is not 104 symbols long is rejected.
pub fn unpack_orientations(packed: &str) -> Option<Vec<Quat>> {
    let values: Vec<f32> = packed.chars().map(symbol_value).collect();
    if values.len() != PACKED_LEN {
        log::warn!(
            "packed orientations rejected: {} symbols, expected {}",
            values.len(),
            PACKED_LEN
        );
        return None;
    }
    let mut orientations = Vec::with_capacity(PIECE_COUNT);
    for chunk in values.chunks_exact(4) {
        orientations.push(Quat::new(chunk[0], chunk[1], chunk[2], chunk[3]));
    }
    Some(orientations)
}
