use crate::moves::ScriptedMove;

pub fn splitmix32(mut value: u32) -> u32 {
    value = value.wrapping_add(0x9E37_79B9);
    let mut z = value;
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

fn rand_below(seed: u32, salt: u32, bound: u32) -> u32 {
    splitmix32(seed ^ splitmix32(salt)) % bound
}

/// Deterministic scramble sequence for `seed`: `count` face turns with no
/// face repeated back to back, each a quarter turn either way or a half turn.
pub fn scramble_moves(seed: u32, count: usize) -> Vec<ScriptedMove> {
    let mut moves = Vec::with_capacity(count);
    let mut previous_face = usize::MAX;
    for index in 0..count {
        let salt = index as u32 * 3;
        let mut face = rand_below(seed, salt, 6) as usize;
        if face == previous_face {
            face = (face + 1 + rand_below(seed, salt + 1, 5) as usize) % 6;
        }
        previous_face = face;
        let steps = match rand_below(seed, salt + 2, 3) {
            0 => -1,
            1 => 1,
            _ => 2,
        };
        moves.push(ScriptedMove { face, steps });
    }
    moves
}
