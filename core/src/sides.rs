use crate::math::Vec3;
use crate::pieces::PieceStore;

pub const FACE_COUNT: usize = 6;
pub const SIDE_COUNT: usize = 12;

// Strict membership drives committed turns; loose membership only widens the
// hover/grab zone so an imprecise hand can still target a face.
pub const STRICT_LIMIT: f32 = 0.3;
pub const LOOSE_LIMIT: f32 = -0.1;
pub const HOVER_CONFIDENCE_DEFAULT: f32 = 0.6;

/// Outward normals for faces 0–5: ±X, ±Y, ±Z.
pub const FACE_NORMALS: [Vec3; FACE_COUNT] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(-1.0, 0.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, -1.0, 0.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, -1.0),
];

pub fn face_of(side: usize) -> usize {
    side % FACE_COUNT
}

pub fn face_normal(side: usize) -> Vec3 {
    FACE_NORMALS[face_of(side)]
}

/// Piece indices currently belonging to `side`, evaluated from live
/// orientation. Sides 0–5 apply the strict test, 6–11 the loose one.
pub fn side_members(store: &PieceStore, side: usize) -> Vec<usize> {
    let normal = face_normal(side);
    let limit = if side < FACE_COUNT {
        STRICT_LIMIT
    } else {
        LOOSE_LIMIT
    };
    let mut members = Vec::new();
    for index in 0..store.positions.len() {
        let Some(current) = store.current_position(index) else {
            continue;
        };
        if current.dot(normal) > limit {
            members.push(index);
        }
    }
    members
}

/// The pieces a committed turn of `face` must rotate.
pub fn turn_members(store: &PieceStore, face: usize) -> Vec<usize> {
    side_members(store, face_of(face))
}

/// The widened grab-zone set for `face`, center slab included.
pub fn hover_members(store: &PieceStore, face: usize) -> Vec<usize> {
    side_members(store, face_of(face) + FACE_COUNT)
}

/// Scores a cube-local point against the six face normals and returns the
/// best face when its projection exceeds `confidence`; otherwise keeps
/// `fallback` (the side of an in-progress turn, typically).
pub fn best_side(local_point: Vec3, confidence: f32, fallback: Option<usize>) -> Option<usize> {
    let direction = local_point.normalized();
    let mut best = None;
    let mut best_score = confidence;
    for (face, normal) in FACE_NORMALS.iter().enumerate() {
        let score = direction.dot(*normal);
        if score > best_score {
            best_score = score;
            best = Some(face);
        }
    }
    best.or(fallback)
}
