// src/capo.rs - Transpose offset and the two ways a deployment can drive it
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmarks::{PoseLandmarks, LEFT_WRIST, NOSE, RIGHT_WRIST};

pub const CAPO_MIN: i8 = -12;
pub const CAPO_MAX: i8 = 12;

/// Semitone offset added to every emitted pitch, kept within one octave either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capo(i8);

impl Capo {
    pub fn new(value: i8) -> Self {
        Self(value.clamp(CAPO_MIN, CAPO_MAX))
    }

    pub fn value(self) -> i8 {
        self.0
    }

    pub fn increment(&mut self) -> bool {
        self.shift(1)
    }

    pub fn decrement(&mut self) -> bool {
        self.shift(-1)
    }

    /// Returns whether the value actually changed.
    pub fn shift(&mut self, delta: i8) -> bool {
        let next = Self::new(self.0.saturating_add(delta));
        let changed = next != *self;
        *self = next;
        changed
    }

    /// Apply to a pitch, staying inside the MIDI range.
    pub fn apply(self, pitch: u8) -> u8 {
        (i16::from(pitch) + i16::from(self.0)).clamp(0, 127) as u8
    }
}

/// Which source is allowed to move the capo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapoPolicy {
    /// Only explicit increment/decrement calls.
    #[default]
    Manual,
    /// Periodic pose check: raising a wrist above the nose moves the capo.
    PoseAuto,
}

/// Samples the pose once every `interval` frames and nudges the capo.
#[derive(Debug, Clone)]
pub struct PoseCapoAdjuster {
    interval: u64,
}

impl PoseCapoAdjuster {
    pub fn new(interval: u64) -> Self {
        Self { interval: interval.max(1) }
    }

    /// Right wrist above the nose raises by one, left wrist lowers by one.
    /// Both or neither leaves it alone. Image y grows downwards.
    pub fn delta(pose: &PoseLandmarks) -> i8 {
        let Some(nose_y) = pose.get(NOSE).and_then(|lm| lm.y()) else {
            return 0;
        };
        let above = |index| {
            pose.get(index)
                .and_then(|lm| lm.y())
                .map_or(false, |y| y < nose_y)
        };

        match (above(RIGHT_WRIST), above(LEFT_WRIST)) {
            (true, false) => 1,
            (false, true) => -1,
            _ => 0,
        }
    }

    /// Returns whether the capo moved this frame.
    pub fn update(&self, frame: u64, pose: &PoseLandmarks, capo: &mut Capo) -> bool {
        if pose.is_empty() || frame % self.interval != 0 {
            return false;
        }
        let delta = Self::delta(pose);
        if delta == 0 {
            return false;
        }
        let changed = capo.shift(delta);
        if changed {
            debug!("Pose capo adjust {:+} -> {}", delta, capo.value());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LandmarkSet};

    fn pose(right_wrist_y: f64, left_wrist_y: f64) -> PoseLandmarks {
        let mut points = vec![None; 33];
        points[NOSE] = Some(Landmark::new(320.0, 100.0, 0.0));
        points[LEFT_WRIST] = Some(Landmark::new(200.0, left_wrist_y, 0.0));
        points[RIGHT_WRIST] = Some(Landmark::new(440.0, right_wrist_y, 0.0));
        LandmarkSet(points)
    }

    #[test]
    fn clamps_to_one_octave() {
        let mut capo = Capo::default();
        for _ in 0..25 {
            capo.increment();
        }
        assert_eq!(capo.value(), 12);
        assert!(!capo.increment());

        let mut capo = Capo::default();
        for _ in 0..25 {
            capo.decrement();
        }
        assert_eq!(capo.value(), -12);
        assert_eq!(Capo::new(100).value(), 12);
    }

    #[test]
    fn apply_stays_in_midi_range() {
        assert_eq!(Capo::new(2).apply(48), 50);
        assert_eq!(Capo::new(-12).apply(5), 0);
        assert_eq!(Capo::new(12).apply(120), 127);
    }

    #[test]
    fn wrist_above_nose_moves_capo() {
        assert_eq!(PoseCapoAdjuster::delta(&pose(50.0, 300.0)), 1);
        assert_eq!(PoseCapoAdjuster::delta(&pose(300.0, 50.0)), -1);
        assert_eq!(PoseCapoAdjuster::delta(&pose(50.0, 50.0)), 0);
        assert_eq!(PoseCapoAdjuster::delta(&pose(300.0, 300.0)), 0);
        assert_eq!(PoseCapoAdjuster::delta(&LandmarkSet::default()), 0);
    }

    #[test]
    fn adjuster_only_samples_on_interval() {
        let adjuster = PoseCapoAdjuster::new(30);
        let raised = pose(50.0, 300.0);
        let mut capo = Capo::default();

        for frame in 1..30 {
            assert!(!adjuster.update(frame, &raised, &mut capo));
        }
        assert!(adjuster.update(30, &raised, &mut capo));
        assert!(adjuster.update(60, &raised, &mut capo));
        assert_eq!(capo.value(), 2);
    }
}
