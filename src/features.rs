// src/features.rs - Hand feature vectors for the chord classifier and finger state for plucking
use std::collections::BTreeSet;

use tracing::debug;

use crate::geometry::{angle_between, distance, vector_from};
use crate::landmarks::*;

pub const DISTANCE_FEATURES: usize = 22;
pub const ANGLE_FEATURES: usize = 5;
pub const FEATURE_LEN: usize = DISTANCE_FEATURES + ANGLE_FEATURES;

/// Input order the classifier was trained on. Do not reorder.
pub type FeatureVector = Vec<f64>;

/// Landmark pairs whose distances feed the classifier, in training order.
pub const DISTANCE_PAIRS: [(usize, usize); DISTANCE_FEATURES] = [
    // fingertips to wrist
    (WRIST, THUMB_TIP),
    (WRIST, INDEX_TIP),
    (WRIST, MIDDLE_TIP),
    (WRIST, RING_TIP),
    (WRIST, PINKY_TIP),
    // thumb tip to the other tips
    (THUMB_TIP, INDEX_TIP),
    (THUMB_TIP, MIDDLE_TIP),
    (THUMB_TIP, RING_TIP),
    (THUMB_TIP, PINKY_TIP),
    // neighbouring tips
    (INDEX_TIP, MIDDLE_TIP),
    (MIDDLE_TIP, RING_TIP),
    (RING_TIP, PINKY_TIP),
    // each tip to its own knuckle
    (THUMB_MCP, THUMB_TIP),
    (INDEX_MCP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_TIP),
    (RING_MCP, RING_TIP),
    (PINKY_MCP, PINKY_TIP),
    // palm spread
    (INDEX_MCP, MIDDLE_MCP),
    (MIDDLE_MCP, RING_MCP),
    (RING_MCP, PINKY_MCP),
    (WRIST, INDEX_MCP),
    (WRIST, PINKY_MCP),
];

/// (base, middle, tip) joints per finger: thumb, index, middle, ring, pinky.
pub const FINGER_JOINTS: [(usize, usize, usize); ANGLE_FEATURES] = [
    (THUMB_MCP, THUMB_IP, THUMB_TIP),
    (INDEX_MCP, INDEX_PIP, INDEX_TIP),
    (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP),
    (RING_MCP, RING_PIP, RING_TIP),
    (PINKY_MCP, PINKY_PIP, PINKY_TIP),
];

pub const PINKY: usize = 4;

/// Flexion (degrees) a finger must exceed to count as active.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PluckThresholds(pub [f64; ANGLE_FEATURES]);

impl Default for PluckThresholds {
    fn default() -> Self {
        // The pinky never curls as far in a relaxed plucking hand.
        Self([25.0, 25.0, 25.0, 25.0, 50.0])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluckState {
    pub active: BTreeSet<usize>,
    /// Flexion per finger in degrees, 0 = straight.
    pub angles: [f64; ANGLE_FEATURES],
}

impl PluckState {
    pub fn is_vetoed(&self) -> bool {
        self.active.contains(&PINKY)
    }
}

/// Angle at each finger's middle joint; a straight finger reads ~180°.
///
/// `None` if any joint is missing, since the classifier cannot use a partial vector.
pub fn joint_angles(hand: &HandLandmarks) -> Option<[f64; ANGLE_FEATURES]> {
    let mut angles = [0.0; ANGLE_FEATURES];
    for (slot, &(base, middle, tip)) in angles.iter_mut().zip(FINGER_JOINTS.iter()) {
        let (base, middle, tip) = (hand.get(base)?, hand.get(middle)?, hand.get(tip)?);
        *slot = angle_between(&vector_from(base, middle), &vector_from(tip, middle));
    }
    Some(angles)
}

pub fn extract_chord_features(hand: &HandLandmarks) -> Option<FeatureVector> {
    if hand.len() < HAND_LANDMARK_COUNT {
        debug!("Hand has {} landmarks, skipping chord features", hand.len());
        return None;
    }

    let reference = distance(&hand.point(INDEX_DIP)?, &hand.point(INDEX_TIP)?);
    if reference <= f64::EPSILON {
        debug!("Degenerate reference distance, skipping chord features");
        return None;
    }

    let mut features = Vec::with_capacity(FEATURE_LEN);
    for &(a, b) in &DISTANCE_PAIRS {
        features.push(distance(&hand.point(a)?, &hand.point(b)?) / reference);
    }
    features.extend_from_slice(&joint_angles(hand)?);

    Some(features)
}

pub fn extract_pluck_state(hand: &HandLandmarks, thresholds: &PluckThresholds) -> Option<PluckState> {
    let angles = joint_angles(hand)?.map(|a| 180.0 - a);
    let active = angles
        .iter()
        .zip(thresholds.0.iter())
        .enumerate()
        .filter(|(_, (angle, threshold))| angle > threshold)
        .map(|(finger, _)| finger)
        .collect();

    Some(PluckState { active, angles })
}
