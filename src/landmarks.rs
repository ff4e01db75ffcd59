// src/landmarks.rs - Per-frame landmark containers as delivered by the tracker
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Hand landmark indices (21-point hand model)
pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

pub const HAND_LANDMARK_COUNT: usize = 21;

// Pose landmark indices (33-point body model, only the ones we read)
pub const NOSE: usize = 0;
pub const RIGHT_SHOULDER: usize = 12;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;

pub const POSE_LANDMARK_COUNT: usize = 33;

/// One tracked point. Coordinates arrive as a plain list so that short or
/// partial entries from the tracker survive deserialization and can be
/// rejected where they are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Landmark(pub Vec<f64>);

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(vec![x, y, z])
    }

    pub fn x(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn y(&self) -> Option<f64> {
        self.0.get(1).copied()
    }

    /// The (x, y) projection, if the landmark carries at least two coordinates.
    pub fn planar(&self) -> Option<Vector2<f64>> {
        match (self.x(), self.y()) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Vector2::new(x, y)),
            _ => None,
        }
    }
}

/// Ordered landmark list for one hand or one body. Empty means "not detected".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet(pub Vec<Option<Landmark>>);

pub type HandLandmarks = LandmarkSet;
pub type PoseLandmarks = LandmarkSet;

impl LandmarkSet {
    pub fn from_points(points: &[[f64; 3]]) -> Self {
        Self(
            points
                .iter()
                .map(|p| Some(Landmark::new(p[0], p[1], p[2])))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index).and_then(|lm| lm.as_ref())
    }

    /// Planar position of a landmark, `None` when absent or malformed.
    pub fn point(&self, index: usize) -> Option<Vector2<f64>> {
        self.get(index).and_then(Landmark::planar)
    }
}

/// Everything the tracker produced for one video frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkFrame {
    #[serde(alias = "Left")]
    pub left: HandLandmarks,
    #[serde(alias = "Right")]
    pub right: HandLandmarks,
    pub pose: PoseLandmarks,
}

impl LandmarkFrame {
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty() && self.pose.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_tolerates_short_and_null_entries() {
        let json = r#"{"Left": [[1.0, 2.0, 0.0], [3.0], null], "pose": []}"#;
        let frame: LandmarkFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.left.len(), 3);
        assert_eq!(frame.left.point(0), Some(Vector2::new(1.0, 2.0)));
        assert_eq!(frame.left.point(1), None);
        assert_eq!(frame.left.point(2), None);
        assert_eq!(frame.left.point(99), None);
        assert!(frame.right.is_empty());
        assert!(frame.pose.is_empty());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let lm = Landmark(vec![f64::NAN, 1.0]);
        assert!(lm.planar().is_none());
    }
}
