use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI, TAU};

use crate::math::{Quat, Vec3};
use crate::sides::face_normal;

pub const TURN_STEP_DEG: f32 = 90.0;
pub const SNAP_TOLERANCE_DEFAULT_DEG: f32 = 10.0;

/// Everything a turn needs from the moment the second hand grabs: which side,
/// which pieces, and the reference frames the angle is measured against.
/// `start_orientations` is the full store snapshot at turn start; per-frame
/// rotation is applied to it rather than to live values, so repeated
/// application cannot drift.
#[derive(Clone, Debug)]
pub struct TurnDescriptor {
    pub side: usize,
    pub members: Vec<usize>,
    pub start_orientations: Vec<Quat>,
    pub start_forward: Vec3,
    pub sign_axis: Vec3,
    pub start_angle: f32,
    pub angle: f32,
}

impl TurnDescriptor {
    pub fn new(
        side: usize,
        members: Vec<usize>,
        start_orientations: Vec<Quat>,
        start_forward: Vec3,
        sign_axis: Vec3,
        start_angle: f32,
    ) -> Self {
        Self {
            side,
            members,
            start_orientations,
            start_forward,
            sign_axis,
            start_angle,
            angle: start_angle,
        }
    }

    /// Re-anchors the angle measurement on a regrab: the accumulated angle is
    /// folded into `start_angle` and the hand frames are captured fresh, so
    /// the turn resumes exactly where the previous hand left it.
    pub fn rebase(&mut self, start_forward: Vec3, sign_axis: Vec3) {
        self.start_forward = start_forward;
        self.sign_axis = sign_axis;
        self.start_angle = self.angle;
    }
}

/// Signed angle from `from` to `to` about `axis`, in `[-PI, PI]`. The axis is
/// the first hand's right vector at turn start, which keeps the sign stable
/// no matter how the hands cross.
pub fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    from.cross(to).dot(axis.normalized()).atan2(from.dot(to))
}

/// Shifts `candidate` by whole turns until it lands within a half turn of
/// `reference`. Keeps the accumulated angle continuous while the raw
/// measurement wraps at ±PI.
pub fn unwrap_near(candidate: f32, reference: f32) -> f32 {
    let mut value = candidate;
    while value - reference > PI {
        value -= TAU;
    }
    while reference - value > PI {
        value += TAU;
    }
    value
}

pub fn nearest_quarter(angle: f32) -> f32 {
    (angle / FRAC_PI_2).round() * FRAC_PI_2
}

pub fn quarter_steps(angle: f32) -> i32 {
    (angle / FRAC_PI_2).round() as i32
}

pub fn within_snap(angle: f32, tolerance_rad: f32) -> bool {
    (angle - nearest_quarter(angle)).abs() <= tolerance_rad
}

/// Exact quarter-turn quaternion about the outward normal of `side`. The
/// half-angle components come straight from the quantization alphabet, so a
/// commit built from this table keeps the snapped-state invariant exact.
pub fn quarter_quat(side: usize, steps: i32) -> Quat {
    let normal = face_normal(side);
    let (sin, cos) = match steps.rem_euclid(4) {
        0 => (0.0, 1.0),
        1 => (FRAC_1_SQRT_2, FRAC_1_SQRT_2),
        2 => (1.0, 0.0),
        _ => (FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    };
    Quat::new(normal.x * sin, normal.y * sin, normal.z * sin, cos)
}

pub fn free_quat(side: usize, angle: f32) -> Quat {
    Quat::from_axis_angle(face_normal(side), angle)
}

/// The per-frame candidate rotation: snapped to the nearest quarter when the
/// angle is within tolerance of one, the raw angle otherwise.
pub fn turn_quat(side: usize, angle: f32, tolerance_rad: f32) -> Quat {
    if within_snap(angle, tolerance_rad) {
        quarter_quat(side, quarter_steps(angle))
    } else {
        free_quat(side, angle)
    }
}
