//! Gesture session
//!
//! Owns every piece of per-run state: the classifier's previous-frame memory,
//! the rolling history, the trigger gate and the counters. One session is
//! evaluated once per frame from a single thread; hosts that share it across
//! threads wrap the whole session in one mutex.

use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

use crate::command::PresentationCommand;
use crate::config::{ClassifierConfig, Config, TriggerConfig};
use crate::gesture::{Classification, GestureClassifier, GestureLabel};
use crate::landmarks::{Landmark, LandmarkSet};
use crate::stats::{SessionStats, StatsSnapshot};
use crate::trigger::{GateDecision, RollingHistory, SuppressReason, TriggerGate, TriggerWindow};

/// Per-frame telemetry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub hand_present: bool,
    pub label: GestureLabel,
    pub confidence: f32,
    pub extended_count: u8,
    /// Window open after this frame
    pub armed: bool,
    pub just_armed: bool,
    pub window_expired: bool,
    pub command: Option<PresentationCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppressed: Option<SuppressReason>,
}

/// One run of the controller
#[derive(Debug)]
pub struct GestureSession {
    id: Uuid,
    classifier: GestureClassifier,
    history: RollingHistory,
    gate: TriggerGate,
    stats: SessionStats,
}

impl GestureSession {
    /// Create a session from the full application config
    pub fn new(config: &Config, now: Instant) -> Self {
        Self::with_configs(config.classifier.clone(), config.trigger.clone(), now)
    }

    pub fn with_configs(
        classifier: ClassifierConfig,
        trigger: TriggerConfig,
        now: Instant,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::info!(
            "Session {} started (open palm >= {} fingers, window {:.1}s, cooldown {:.1}s)",
            id,
            classifier.open_palm_min_fingers,
            trigger.window_secs,
            trigger.cooldown_secs
        );

        Self {
            id,
            history: RollingHistory::new(trigger.history_capacity),
            classifier: GestureClassifier::new(classifier),
            gate: TriggerGate::new(trigger),
            stats: SessionStats::new(now),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_armed(&self) -> bool {
        self.gate.is_armed()
    }

    pub fn window(&self) -> TriggerWindow {
        self.gate.window()
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn gate(&self) -> &TriggerGate {
        &self.gate
    }

    pub fn stats(&self, now: Instant) -> StatsSnapshot {
        self.stats.snapshot(now)
    }

    /// Evaluate one frame
    ///
    /// `None` means no hand was detected. A hand whose landmark set is
    /// invalid is handled the same way: the frame reads as "none", is not
    /// remembered in the history, and leaves the window and cooldown alone.
    pub fn evaluate(&mut self, landmarks: Option<&[Landmark]>, now: Instant) -> FrameReport {
        let set = match landmarks.map(LandmarkSet::from_slice) {
            Some(Ok(set)) => Some(set),
            Some(Err(e)) => {
                tracing::warn!("Skipping invalid landmark set: {}", e);
                self.stats.record_invalid();
                None
            }
            None => None,
        };

        match set {
            Some(set) => self.evaluate_hand(set, now),
            None => {
                self.stats.record_frame(false);
                self.no_hand_report()
            }
        }
    }

    fn evaluate_hand(&mut self, set: LandmarkSet, now: Instant) -> FrameReport {
        self.stats.record_frame(true);

        let classification = self.classifier.classify(set, now);
        self.history.push(classification);
        let decision = self.gate.evaluate(&classification, &self.history);

        if decision.command.is_some() {
            self.stats.record_command();
        }

        report_for(&classification, decision)
    }

    fn no_hand_report(&self) -> FrameReport {
        FrameReport {
            hand_present: false,
            label: GestureLabel::None,
            confidence: 0.0,
            extended_count: 0,
            armed: self.gate.is_armed(),
            just_armed: false,
            window_expired: false,
            command: None,
            suppressed: None,
        }
    }

    /// Clear the window, the history and the previous-frame memory together
    pub fn reset(&mut self) {
        self.gate.reset();
        self.history.clear();
        self.classifier.reset();
        self.stats.record_reset();
        tracing::info!("Session {} reset", self.id);
    }
}

fn report_for(classification: &Classification, decision: GateDecision) -> FrameReport {
    FrameReport {
        hand_present: true,
        label: classification.label,
        confidence: classification.confidence,
        extended_count: classification.extended_count,
        armed: decision.armed,
        just_armed: decision.just_armed,
        window_expired: decision.window_expired,
        command: decision.command,
        suppressed: decision.suppressed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LANDMARK_COUNT;
    use std::time::Duration;

    fn session(now: Instant) -> GestureSession {
        GestureSession::new(&Config::default(), now)
    }

    /// All fingertips curled below their joints
    fn fist_points() -> Vec<Landmark> {
        let mut points = vec![Landmark::new(0.5, 0.6); LANDMARK_COUNT];
        for tip in [8, 12, 16, 20] {
            points[tip].y = 0.65;
        }
        points
    }

    fn index_up_points() -> Vec<Landmark> {
        let mut points = fist_points();
        points[8].y = 0.4;
        points
    }

    fn feed(s: &mut GestureSession, points: Vec<Landmark>, at: Instant) -> FrameReport {
        s.evaluate(Some(points.as_slice()), at)
    }

    #[test]
    fn test_no_hand_frame() {
        let now = Instant::now();
        let mut s = session(now);
        let report = s.evaluate(None, now);
        assert!(!report.hand_present);
        assert_eq!(report.label, GestureLabel::None);
        assert_eq!(report.extended_count, 0);
        assert!(s.history().is_empty());
        assert_eq!(s.stats(now).frames_processed, 1);
    }

    #[test]
    fn test_invalid_frame_is_not_a_fist() {
        let now = Instant::now();
        let mut s = session(now);
        let short = vec![Landmark::new(0.5, 0.5); 4];
        let report = s.evaluate(Some(short.as_slice()), now);
        assert!(!report.hand_present);
        assert!(s.history().is_empty());

        // An invalid frame must not satisfy the fist-then-lift pattern
        let lift = feed(&mut s, index_up_points(), now + Duration::from_millis(50));
        assert!(!lift.armed);
        assert_eq!(s.stats(now).invalid_frames, 1);
    }

    #[test]
    fn test_fist_then_lift_arms_session() {
        let now = Instant::now();
        let mut s = session(now);
        let fist = feed(&mut s, fist_points(), now);
        assert_eq!(fist.label, GestureLabel::ClosedFist);

        let lift = feed(&mut s, index_up_points(), now + Duration::from_millis(100));
        assert_eq!(lift.label, GestureLabel::PointingUp);
        assert!(lift.just_armed);
        assert!(s.is_armed());
    }

    #[test]
    fn test_no_hand_keeps_window() {
        let now = Instant::now();
        let mut s = session(now);
        feed(&mut s, fist_points(), now);
        feed(&mut s, index_up_points(), now + Duration::from_millis(100));

        // Well past the window, but no hand means no window evaluation
        let report = s.evaluate(None, now + Duration::from_secs(10));
        assert!(report.armed);
        assert!(s.is_armed());
    }

    #[test]
    fn test_reset_clears_everything() {
        let now = Instant::now();
        let mut s = session(now);
        feed(&mut s, fist_points(), now);
        feed(&mut s, index_up_points(), now + Duration::from_millis(100));
        assert!(s.is_armed());

        s.reset();
        assert!(!s.is_armed());
        assert!(s.history().is_empty());
        assert!(!s.classifier().has_previous());
        assert_eq!(s.stats(now).resets, 1);
    }
}
