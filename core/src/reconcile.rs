use crate::math::Quat;

pub const RECONCILE_WINDOW_SECS: f32 = 0.3;

/// Blends a start snapshot toward a target snapshot over a fixed duration,
/// writing straight into the live orientation buffer each step. A duration of
/// zero degenerates to an instant snap on the first step. The finishing step
/// writes the exact target values, never an interpolation residue.
#[derive(Clone, Debug)]
pub struct Reconciler {
    start: Vec<Quat>,
    target: Vec<Quat>,
    duration: f32,
    elapsed: f32,
}

impl Reconciler {
    pub fn new(start: Vec<Quat>, target: Vec<Quat>, duration: f32) -> Self {
        Self {
            start,
            target,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn step(&mut self, dt: f32, orientations: &mut [Quat]) {
        self.elapsed += dt.max(0.0);
        let progress = if self.duration <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        };
        if progress >= 1.0 {
            for (slot, target) in orientations.iter_mut().zip(self.target.iter()) {
                *slot = *target;
            }
            return;
        }
        for (index, slot) in orientations.iter_mut().enumerate() {
            let (Some(start), Some(target)) = (self.start.get(index), self.target.get(index))
            else {
                continue;
            };
            *slot = start.slerp(*target, progress);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn target(&self) -> &[Quat] {
        &self.target
    }
}
