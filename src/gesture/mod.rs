//! Gesture classification
//!
//! Turns one frame's hand landmarks into a named gesture with a confidence
//! score. Classification runs in two stages:
//!
//! 1. **Static pose** - count the extended fingers and look the result up in
//!    an ordered rule table ([`rules::POSE_RULES`]), first match wins.
//! 2. **Motion override** - if the previous frame's hand is known, a large
//!    centroid shift replaces the static pose with a swipe or pointing-down
//!    gesture.
//!
//! ```text
//!  landmarks ──► finger count ──► pose table ──┐
//!      │                                       ├──► Classification
//!      └──► centroid Δ vs previous ──► motion ─┘   (motion wins)
//! ```

pub mod classifier;
pub mod rules;

pub use classifier::{count_extended_fingers, GestureClassifier};
pub use rules::{PoseRule, POSE_RULES};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Recognised gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    #[default]
    None,
    OpenPalm,
    ClosedFist,
    PointingUp,
    PointingDown,
    ThumbsUp,
    PinkyUp,
    PeaceSign,
    SwipeLeft,
    SwipeRight,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenPalm => "open_palm",
            Self::ClosedFist => "closed_fist",
            Self::PointingUp => "pointing_up",
            Self::PointingDown => "pointing_down",
            Self::ThumbsUp => "thumbs_up",
            Self::PinkyUp => "pinky_up",
            Self::PeaceSign => "peace_sign",
            Self::SwipeLeft => "swipe_left",
            Self::SwipeRight => "swipe_right",
        }
    }

    /// Whether this label comes from hand motion rather than a pose
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Self::SwipeLeft | Self::SwipeRight | Self::PointingDown
        )
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A digit of the hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    fn bit(self) -> u8 {
        match self {
            Finger::Thumb => 1 << 0,
            Finger::Index => 1 << 1,
            Finger::Middle => 1 << 2,
            Finger::Ring => 1 << 3,
            Finger::Pinky => 1 << 4,
        }
    }
}

/// Set of extended fingers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerSet(u8);

impl FingerSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, finger: Finger) {
        self.0 |= finger.bit();
    }

    pub fn contains(&self, finger: Finger) -> bool {
        self.0 & finger.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Finger> for FingerSet {
    fn from_iter<I: IntoIterator<Item = Finger>>(iter: I) -> Self {
        let mut set = FingerSet::empty();
        for finger in iter {
            set.insert(finger);
        }
        set
    }
}

/// Result of the finger-extension pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FingerReading {
    /// Extended non-thumb fingers, 0..=4
    pub count: u8,
    pub fingers: FingerSet,
}

/// One frame's classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: GestureLabel,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Extended fingers, thumb excluded
    pub extended_count: u8,
    pub timestamp: Instant,
}

impl Classification {
    /// The "no gesture" outcome
    pub fn none(timestamp: Instant) -> Self {
        Self {
            label: GestureLabel::None,
            confidence: 0.0,
            extended_count: 0,
            timestamp,
        }
    }
}
