//! Hand landmark data model
//!
//! A hand is described by 21 keypoints in normalised image coordinates
//! (`[0, 1]` on each axis, y growing downwards) in the fixed order produced by
//! the external hand-tracking model: wrist first, then four joints per digit
//! from thumb to pinky, fingertip last.

use serde::{Deserialize, Serialize};

/// Number of keypoints in one hand observation
pub const LANDMARK_COUNT: usize = 21;

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

/// A single keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Relative depth; absent for 2-D trackers
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Errors raised when validating a landmark set
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("Expected at least {expected} landmarks, got {actual}")]
    TooFewPoints { expected: usize, actual: usize },

    #[error("Landmark {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// A validated set of hand keypoints for one frame
///
/// Construction guarantees every named index is in range, so accessors never
/// panic. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Validate and wrap a frame's keypoints
    pub fn new(points: Vec<Landmark>) -> Result<Self, LandmarkError> {
        if points.len() < LANDMARK_COUNT {
            return Err(LandmarkError::TooFewPoints {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }

        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(LandmarkError::NonFinite { index });
        }

        Ok(Self { points })
    }

    /// Validate a borrowed slice, copying it
    pub fn from_slice(points: &[Landmark]) -> Result<Self, LandmarkError> {
        Self::new(points.to_vec())
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean position of all keypoints (x, y)
    pub fn centroid(&self) -> (f32, f32) {
        let n = self.points.len() as f32;
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        (sum_x / n, sum_y / n)
    }

    /// Vertical coordinate of a keypoint known to be in range
    pub(crate) fn y(&self, index: usize) -> f32 {
        self.points[index].y
    }
}
