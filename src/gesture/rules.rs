//! Static pose decision table
//!
//! Rows are evaluated top to bottom and the first matching row wins. The rows
//! are disjoint for the default open-palm threshold; lower thresholds make
//! `open_palm` shadow the rows below it.

use super::{Finger, FingerReading, GestureLabel};
use crate::config::ClassifierConfig;

/// One row of the pose table
#[derive(Debug, Clone, Copy)]
pub struct PoseRule {
    pub label: GestureLabel,
    pub confidence: f32,
    pub matches: fn(&FingerReading, &ClassifierConfig) -> bool,
}

pub const OPEN_PALM_CONFIDENCE: f32 = 0.9;
pub const CLOSED_FIST_CONFIDENCE: f32 = 0.25;
pub const POINTING_UP_CONFIDENCE: f32 = 0.45;
pub const THUMBS_UP_CONFIDENCE: f32 = 0.8;
pub const PINKY_UP_CONFIDENCE: f32 = 0.45;
pub const PEACE_SIGN_CONFIDENCE: f32 = 0.85;

/// The ordered pose table
pub const POSE_RULES: [PoseRule; 6] = [
    PoseRule {
        label: GestureLabel::OpenPalm,
        confidence: OPEN_PALM_CONFIDENCE,
        matches: is_open_palm,
    },
    PoseRule {
        label: GestureLabel::ClosedFist,
        confidence: CLOSED_FIST_CONFIDENCE,
        matches: is_closed_fist,
    },
    PoseRule {
        label: GestureLabel::PointingUp,
        confidence: POINTING_UP_CONFIDENCE,
        matches: is_pointing_up,
    },
    // The thumb is never counted as extended, so this row is currently
    // unreachable from landmark input.
    PoseRule {
        label: GestureLabel::ThumbsUp,
        confidence: THUMBS_UP_CONFIDENCE,
        matches: is_thumbs_up,
    },
    PoseRule {
        label: GestureLabel::PinkyUp,
        confidence: PINKY_UP_CONFIDENCE,
        matches: is_pinky_up,
    },
    PoseRule {
        label: GestureLabel::PeaceSign,
        confidence: PEACE_SIGN_CONFIDENCE,
        matches: is_peace_sign,
    },
];

fn is_open_palm(reading: &FingerReading, config: &ClassifierConfig) -> bool {
    reading.count >= config.open_palm_min_fingers
}

fn is_closed_fist(reading: &FingerReading, _config: &ClassifierConfig) -> bool {
    reading.count == 0
}

fn is_pointing_up(reading: &FingerReading, _config: &ClassifierConfig) -> bool {
    single_finger(reading, Finger::Index)
}

fn is_thumbs_up(reading: &FingerReading, _config: &ClassifierConfig) -> bool {
    single_finger(reading, Finger::Thumb)
}

fn is_pinky_up(reading: &FingerReading, _config: &ClassifierConfig) -> bool {
    single_finger(reading, Finger::Pinky)
}

fn is_peace_sign(reading: &FingerReading, _config: &ClassifierConfig) -> bool {
    single_finger(reading, Finger::Middle)
}

fn single_finger(reading: &FingerReading, finger: Finger) -> bool {
    reading.count == 1 && reading.fingers.contains(finger)
}

/// Look up the static pose for a finger reading
///
/// Returns `(GestureLabel::None, 0.0)` when no row matches.
pub fn classify_pose(reading: &FingerReading, config: &ClassifierConfig) -> (GestureLabel, f32) {
    POSE_RULES
        .iter()
        .find(|rule| (rule.matches)(reading, config))
        .map(|rule| (rule.label, rule.confidence))
        .unwrap_or((GestureLabel::None, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::FingerSet;

    fn reading(fingers: &[Finger]) -> FingerReading {
        let set: FingerSet = fingers.iter().copied().collect();
        FingerReading {
            count: fingers.iter().filter(|f| **f != Finger::Thumb).count() as u8,
            fingers: set,
        }
    }

    #[test]
    fn test_open_palm_regardless_of_which_fingers() {
        let config = ClassifierConfig::default();
        let all = reading(&[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky]);
        assert_eq!(classify_pose(&all, &config), (GestureLabel::OpenPalm, 0.9));

        let three = ClassifierConfig {
            open_palm_min_fingers: 3,
            ..Default::default()
        };
        for fingers in [
            [Finger::Index, Finger::Middle, Finger::Ring],
            [Finger::Middle, Finger::Ring, Finger::Pinky],
            [Finger::Index, Finger::Ring, Finger::Pinky],
        ] {
            assert_eq!(
                classify_pose(&reading(&fingers), &three).0,
                GestureLabel::OpenPalm
            );
        }
    }

    #[test]
    fn test_three_fingers_is_none_with_default_threshold() {
        let config = ClassifierConfig::default();
        let three = reading(&[Finger::Index, Finger::Middle, Finger::Ring]);
        assert_eq!(classify_pose(&three, &config), (GestureLabel::None, 0.0));
    }

    #[test]
    fn test_closed_fist() {
        let config = ClassifierConfig::default();
        assert_eq!(
            classify_pose(&reading(&[]), &config),
            (GestureLabel::ClosedFist, 0.25)
        );
    }

    #[test]
    fn test_single_finger_rows() {
        let config = ClassifierConfig::default();
        assert_eq!(
            classify_pose(&reading(&[Finger::Index]), &config),
            (GestureLabel::PointingUp, 0.45)
        );
        assert_eq!(
            classify_pose(&reading(&[Finger::Pinky]), &config),
            (GestureLabel::PinkyUp, 0.45)
        );
        assert_eq!(
            classify_pose(&reading(&[Finger::Middle]), &config),
            (GestureLabel::PeaceSign, 0.85)
        );
        // A lone ring finger has no row
        assert_eq!(
            classify_pose(&reading(&[Finger::Ring]), &config),
            (GestureLabel::None, 0.0)
        );
    }

    #[test]
    fn test_two_fingers_is_none() {
        let config = ClassifierConfig::default();
        let two = reading(&[Finger::Index, Finger::Middle]);
        assert_eq!(classify_pose(&two, &config).0, GestureLabel::None);
    }

    #[test]
    fn test_first_match_wins() {
        // With a threshold of 1 every single finger is an open palm
        let config = ClassifierConfig {
            open_palm_min_fingers: 1,
            ..Default::default()
        };
        assert_eq!(
            classify_pose(&reading(&[Finger::Index]), &config).0,
            GestureLabel::OpenPalm
        );
    }

    #[test]
    fn test_thumbs_up_row_matches_synthetic_reading() {
        let config = ClassifierConfig::default();
        let mut fingers = FingerSet::empty();
        fingers.insert(Finger::Thumb);
        let thumb = FingerReading { count: 1, fingers };
        assert_eq!(
            classify_pose(&thumb, &config),
            (GestureLabel::ThumbsUp, 0.8)
        );
    }
}
