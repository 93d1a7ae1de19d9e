//! Rule-based gesture classifier
//!
//! Deterministic: the same pair of frames always yields the same label. The
//! only state is the previous frame's landmarks, used for motion gestures.

use std::time::Instant;

use super::rules::classify_pose;
use super::{Classification, Finger, FingerReading, FingerSet, GestureLabel};
use crate::config::ClassifierConfig;
use crate::landmarks::{
    Landmark, LandmarkSet, INDEX_DIP, INDEX_TIP, MIDDLE_DIP, MIDDLE_TIP, PINKY_DIP, PINKY_TIP,
    RING_DIP, RING_TIP,
};

/// Upper bound on swipe confidence
const SWIPE_MAX_CONFIDENCE: f32 = 0.9;
/// Swipe confidence per unit of horizontal travel
const SWIPE_CONFIDENCE_GAIN: f32 = 10.0;
/// Upper bound on pointing-down confidence
const POINT_DOWN_MAX_CONFIDENCE: f32 = 0.85;
/// Pointing-down confidence per unit of vertical travel
const POINT_DOWN_CONFIDENCE_GAIN: f32 = 8.0;

/// (finger, tip index, joint index) for the four counted fingers
const FINGER_JOINTS: [(Finger, usize, usize); 4] = [
    (Finger::Index, INDEX_TIP, INDEX_DIP),
    (Finger::Middle, MIDDLE_TIP, MIDDLE_DIP),
    (Finger::Ring, RING_TIP, RING_DIP),
    (Finger::Pinky, PINKY_TIP, PINKY_DIP),
];

/// Count extended fingers, thumb excluded
///
/// A finger is extended when its tip sits higher in the image (smaller y)
/// than the joint below it by more than `margin`.
pub fn count_extended_fingers(landmarks: &LandmarkSet, margin: f32) -> FingerReading {
    let fingers: FingerSet = FINGER_JOINTS
        .iter()
        .filter(|(_, tip, joint)| landmarks.y(*tip) < landmarks.y(*joint) - margin)
        .map(|(finger, _, _)| *finger)
        .collect();

    FingerReading {
        count: fingers.len() as u8,
        fingers,
    }
}

/// Classify a frame against an optional previous frame
///
/// Returns `(label, confidence, extended_count)`. Pure; the caller owns the
/// previous-frame memory.
pub fn classify_frame(
    config: &ClassifierConfig,
    current: &LandmarkSet,
    previous: Option<&LandmarkSet>,
) -> (GestureLabel, f32, u8) {
    let reading = count_extended_fingers(current, config.extension_margin);
    let (label, confidence) = previous
        .and_then(|prev| motion_gesture(config, current, prev, reading.count))
        .unwrap_or_else(|| classify_pose(&reading, config));

    (label, confidence, reading.count)
}

/// Motion gesture from the centroid shift between two frames, if any
fn motion_gesture(
    config: &ClassifierConfig,
    current: &LandmarkSet,
    previous: &LandmarkSet,
    extended_count: u8,
) -> Option<(GestureLabel, f32)> {
    let (cx, cy) = current.centroid();
    let (px, py) = previous.centroid();
    let dx = cx - px;
    let dy = cy - py;

    if dx.abs() > config.swipe_min_dx && dy.abs() < config.swipe_max_dy {
        let label = if dx > 0.0 {
            GestureLabel::SwipeRight
        } else {
            GestureLabel::SwipeLeft
        };
        let confidence = (dx.abs() * SWIPE_CONFIDENCE_GAIN).min(SWIPE_MAX_CONFIDENCE);
        return Some((label, confidence));
    }

    if dy.abs() > config.point_down_min_dy && extended_count == 1 && dy > 0.0 {
        let confidence = (dy.abs() * POINT_DOWN_CONFIDENCE_GAIN).min(POINT_DOWN_MAX_CONFIDENCE);
        return Some((GestureLabel::PointingDown, confidence));
    }

    None
}

/// Classifier with a single-slot memory of the previous frame
#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    config: ClassifierConfig,
    previous: Option<LandmarkSet>,
}

impl GestureClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            previous: None,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether a previous frame is remembered
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Classify a validated frame and remember it as the previous frame
    pub fn classify(&mut self, current: LandmarkSet, now: Instant) -> Classification {
        let (label, confidence, extended_count) =
            classify_frame(&self.config, &current, self.previous.as_ref());
        self.previous = Some(current);

        Classification {
            label,
            confidence,
            extended_count,
            timestamp: now,
        }
    }

    /// Classify raw keypoints, failing safe on invalid input
    ///
    /// An invalid set yields the "no gesture" outcome and leaves the
    /// previous-frame memory untouched.
    pub fn classify_points(&mut self, points: &[Landmark], now: Instant) -> Classification {
        match LandmarkSet::from_slice(points) {
            Ok(set) => self.classify(set, now),
            Err(e) => {
                tracing::debug!("Ignoring invalid landmark set: {}", e);
                Classification::none(now)
            }
        }
    }

    /// Forget the previous frame
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
