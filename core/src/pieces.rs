use crate::math::{Quat, Vec3};

pub const PIECE_COUNT: usize = 26;

/// Flat storage for the 26 cube pieces. Positions are set once at
/// construction and never move; a turn is expressed entirely through the
/// orientation, which rotates the piece about the cube center.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceStore {
    pub positions: Vec<Vec3>,
    pub orientations: Vec<Quat>,
}

impl PieceStore {
    /// Builds the solved cube: the 3×3×3 grid walked x-major with the center
    /// slot skipped, every orientation at identity. Every peer constructs the
    /// identical store, so packed payloads need no index negotiation.
    pub fn solved() -> Self {
        let mut positions = Vec::with_capacity(PIECE_COUNT);
        for x in -1i32..=1 {
            for y in -1i32..=1 {
                for z in -1i32..=1 {
                    if x == 0 && y == 0 && z == 0 {
                        continue;
                    }
                    positions.push(Vec3::new(x as f32, y as f32, z as f32));
                }
            }
        }
        Self {
            positions,
            orientations: vec![Quat::IDENTITY; PIECE_COUNT],
        }
    }

    /// Where the piece currently sits in cube-local space: its fixed position
    /// rotated by its live orientation.
    pub fn current_position(&self, index: usize) -> Option<Vec3> {
        let position = self.positions.get(index)?;
        let orientation = self.orientations.get(index)?;
        Some(orientation.rotate(*position))
    }

    pub fn snapshot(&self) -> Vec<Quat> {
        self.orientations.clone()
    }

    pub fn is_solved(&self, epsilon: f32) -> bool {
        self.orientations
            .iter()
            .all(|q| q.approx_eq(Quat::IDENTITY, epsilon))
    }
}

impl Default for PieceStore {
    fn default() -> Self {
        Self::solved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_store_has_26_pieces_and_no_center() {
        let store = PieceStore::solved();
        assert_eq!(store.positions.len(), PIECE_COUNT);
        assert_eq!(store.orientations.len(), PIECE_COUNT);
        assert!(!store.positions.contains(&Vec3::ZERO));
        assert!(store.is_solved(1e-6));
    }

    #[test]
    fn current_position_tracks_orientation() {
        let mut store = PieceStore::solved();
        let index = store
            .positions
            .iter()
            .position(|p| *p == Vec3::new(1.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(store.current_position(index), Some(Vec3::new(1.0, 1.0, 1.0)));
        store.orientations[index] =
            Quat::from_axis_angle(Vec3::X, std::f32::consts::FRAC_PI_2);
        let moved = store.current_position(index).unwrap();
        assert!((moved - Vec3::new(1.0, -1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn out_of_range_index_is_none() {
        let store = PieceStore::solved();
        assert_eq!(store.current_position(PIECE_COUNT), None);
    }
}
