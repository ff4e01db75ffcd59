// src/strum.rs - Arm-swing strum detection from shoulder/elbow/wrist pose landmarks
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{angle_between, map_range, vector_from};
use crate::landmarks::{PoseLandmarks, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrumAction {
    Idle,
    Up,
    Down,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrumDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrumConfig {
    pub window: usize,
    /// Mean per-frame elbow angle change (degrees) that counts as a swing.
    pub angle_threshold: f64,
    /// Wrist must be this far right of the shoulder (px) for a down stroke.
    pub down_displacement: f64,
    /// ...and this far left (px, negative) for an up stroke.
    pub up_displacement: f64,
    /// |diff| range mapped onto `duration_range`.
    pub speed_range: (f64, f64),
    /// Per-string spacing in ms, slow swing first.
    pub duration_range: (f64, f64),
}

impl Default for StrumConfig {
    fn default() -> Self {
        Self {
            window: 6,
            angle_threshold: 3.0,
            down_displacement: 5.0,
            up_displacement: -15.0,
            speed_range: (3.0, 15.0),
            duration_range: (125.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrumStroke {
    pub direction: StrumDirection,
    pub per_note_ms: f64,
    pub diff_angle: f64,
}

pub struct StrumDetector {
    config: StrumConfig,
    angles: VecDeque<f64>,
    last_action: StrumAction,
}

impl StrumDetector {
    pub fn new(config: StrumConfig) -> Self {
        Self {
            angles: VecDeque::with_capacity(config.window),
            config,
            last_action: StrumAction::Idle,
        }
    }

    /// Last stroke that actually sounded; never `Stop`.
    pub fn last_action(&self) -> StrumAction {
        self.last_action
    }

    /// Record that `stroke` was played. Debounce only compares against
    /// confirmed strokes, so a swing with nothing to strum is not remembered.
    pub fn confirm(&mut self, stroke: &StrumStroke) {
        self.last_action = match stroke.direction {
            StrumDirection::Up => StrumAction::Up,
            StrumDirection::Down => StrumAction::Down,
        };
    }

    pub fn window_len(&self) -> usize {
        self.angles.len()
    }

    /// Elbow angle and wrist displacement, if the arm is fully visible in frame.
    pub fn arm_sample(pose: &PoseLandmarks, frame_height: f64) -> Option<(f64, f64)> {
        let shoulder = pose.get(RIGHT_SHOULDER)?;
        let elbow = pose.get(RIGHT_ELBOW)?;
        let wrist = pose.get(RIGHT_WRIST)?;

        let wrist_y = wrist.y()?;
        if !(0.0..=frame_height).contains(&wrist_y) {
            return None;
        }

        let angle = angle_between(&vector_from(shoulder, elbow), &vector_from(wrist, elbow));
        let displacement = wrist.x()? - shoulder.x()?;
        Some((angle, displacement))
    }

    pub fn process_pose(&mut self, pose: &PoseLandmarks, frame_height: f64) -> Option<StrumStroke> {
        let (angle, displacement) = Self::arm_sample(pose, frame_height)?;
        self.push(angle, displacement)
    }

    /// Feed one elbow-angle sample. Returns a stroke when the swing direction
    /// differs from the last confirmed stroke; the caller confirms it once played.
    pub fn push(&mut self, angle: f64, displacement: f64) -> Option<StrumStroke> {
        self.angles.push_back(angle);
        while self.angles.len() > self.config.window {
            self.angles.pop_front();
        }
        if self.angles.len() < self.config.window {
            return None;
        }

        let deltas = self.angles.len() - 1;
        let diff_angle = self
            .angles
            .iter()
            .zip(self.angles.iter().skip(1))
            .map(|(prev, next)| next - prev)
            .sum::<f64>()
            / deltas as f64;

        let action = if diff_angle > self.config.angle_threshold
            && displacement > self.config.down_displacement
        {
            StrumAction::Down
        } else if diff_angle < -self.config.angle_threshold
            && displacement < self.config.up_displacement
        {
            StrumAction::Up
        } else {
            StrumAction::Stop
        };

        if action == StrumAction::Stop {
            self.angles.clear();
            return None;
        }
        self.angles.pop_front();

        if action == self.last_action {
            return None;
        }

        let (slow, fast) = self.config.duration_range;
        let per_note_ms = map_range(
            diff_angle.abs(),
            self.config.speed_range.0,
            self.config.speed_range.1,
            slow,
            fast,
        );
        let direction = match action {
            StrumAction::Up => StrumDirection::Up,
            _ => StrumDirection::Down,
        };
        debug!("Strum {:?} diff={:.2} spacing={:.1}ms", direction, diff_angle, per_note_ms);

        Some(StrumStroke { direction, per_note_ms, diff_angle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LandmarkSet};

    fn feed(detector: &mut StrumDetector, angles: &[f64], displacement: f64) -> Vec<StrumStroke> {
        let mut strokes = Vec::new();
        for &a in angles {
            if let Some(stroke) = detector.push(a, displacement) {
                detector.confirm(&stroke);
                strokes.push(stroke);
            }
        }
        strokes
    }

    #[test]
    fn needs_full_window() {
        let mut detector = StrumDetector::new(StrumConfig::default());
        assert!(feed(&mut detector, &[0.0, 10.0, 20.0, 30.0, 40.0], 50.0).is_empty());
        assert_eq!(detector.window_len(), 5);
    }

    #[test]
    fn down_stroke_fires_once() {
        let mut detector = StrumDetector::new(StrumConfig::default());
        let strokes = feed(&mut detector, &[0.0, 9.0, 18.0, 27.0, 36.0, 45.0, 54.0, 63.0], 50.0);

        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].direction, StrumDirection::Down);
        assert!((strokes[0].diff_angle - 9.0).abs() < 1e-9);
        assert!((strokes[0].per_note_ms - 63.0).abs() < 1e-9);
        assert_eq!(detector.last_action(), StrumAction::Down);
        assert_eq!(detector.window_len(), 5);
    }

    #[test]
    fn up_stroke_needs_wrist_left_of_shoulder() {
        let mut detector = StrumDetector::new(StrumConfig::default());
        let falling = [60.0, 50.0, 40.0, 30.0, 20.0, 10.0];
        assert!(feed(&mut detector, &falling, -10.0).is_empty());
        // The Stop reset cleared the window.
        assert_eq!(detector.window_len(), 0);

        let strokes = feed(&mut detector, &falling, -20.0);
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].direction, StrumDirection::Up);
        assert_eq!(strokes[0].per_note_ms, 125.0 + (10.0 - 3.0) * (1.0 - 125.0) / 12.0);
    }

    #[test]
    fn alternating_strokes_each_fire() {
        let mut detector = StrumDetector::new(StrumConfig::default());
        let down = feed(&mut detector, &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0], 30.0);
        // The first sample reverses the swing, which reads as Stop and resets the window.
        let up = feed(&mut detector, &[80.0, 60.0, 40.0, 20.0, 0.0, -20.0, -40.0], -30.0);
        assert_eq!(down.len(), 1);
        assert_eq!(up.len(), 1);
        // Very fast swing clamps to the shortest spacing.
        assert_eq!(down[0].per_note_ms, 1.0);
    }

    #[test]
    fn arm_sample_requires_wrist_in_frame() {
        let mut points = vec![None; 33];
        points[RIGHT_SHOULDER] = Some(Landmark::new(300.0, 200.0, 0.0));
        points[RIGHT_ELBOW] = Some(Landmark::new(300.0, 300.0, 0.0));
        points[RIGHT_WRIST] = Some(Landmark::new(400.0, 300.0, 0.0));
        let pose = LandmarkSet(points.clone());

        let (angle, displacement) = StrumDetector::arm_sample(&pose, 480.0).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
        assert_eq!(displacement, 100.0);

        points[RIGHT_WRIST] = Some(Landmark::new(400.0, 500.0, 0.0));
        assert!(StrumDetector::arm_sample(&LandmarkSet(points.clone()), 480.0).is_none());

        points[RIGHT_ELBOW] = None;
        assert!(StrumDetector::arm_sample(&LandmarkSet(points), 480.0).is_none());
    }

    #[test]
    fn unconfirmed_stroke_is_offered_again() {
        let mut detector = StrumDetector::new(StrumConfig::default());
        let swing = [0.0, 9.0, 18.0, 27.0, 36.0, 45.0, 54.0];

        let offered: Vec<StrumStroke> = swing.iter().filter_map(|&a| detector.push(a, 50.0)).collect();
        assert_eq!(offered.len(), 2);
        assert_eq!(detector.last_action(), StrumAction::Idle);

        detector.confirm(&offered[1]);
        assert_eq!(detector.last_action(), StrumAction::Down);
        assert!(detector.push(63.0, 50.0).is_none());
    }
}
