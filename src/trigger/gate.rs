//! Finger-lift trigger gate
//!
//! Commands fire only inside a short window opened by an intentional
//! "fist, then raise a finger" motion, and never faster than the cooldown.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::history::RollingHistory;
use crate::command::PresentationCommand;
use crate::config::TriggerConfig;
use crate::gesture::{Classification, GestureLabel};

/// Arming window state
///
/// `armed_at` only exists while armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerWindow {
    #[default]
    Idle,
    Armed { armed_at: Instant },
}

impl TriggerWindow {
    pub fn is_armed(&self) -> bool {
        matches!(self, TriggerWindow::Armed { .. })
    }

    pub fn armed_at(&self) -> Option<Instant> {
        match self {
            TriggerWindow::Idle => None,
            TriggerWindow::Armed { armed_at } => Some(*armed_at),
        }
    }
}

/// Why an evaluated frame did not fire a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    /// Window not open
    Idle,
    /// Confidence at or below the fire threshold
    LowConfidence,
    /// Gesture has no command
    Unmapped,
    /// Last command too recent
    Cooldown,
}

/// Outcome of one gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateDecision {
    /// Window state after this frame
    pub armed: bool,
    /// Window opened on this frame
    pub just_armed: bool,
    /// Window timed out on this frame
    pub window_expired: bool,
    /// Command authorised on this frame
    pub command: Option<PresentationCommand>,
    pub suppressed: Option<SuppressReason>,
}

/// Time elapsed from `earlier` to `now`; `None` if the clock ran backwards
fn elapsed(now: Instant, earlier: Instant) -> Option<Duration> {
    now.checked_duration_since(earlier)
}

/// Arm-then-act gate with a global cooldown
#[derive(Debug, Clone)]
pub struct TriggerGate {
    config: TriggerConfig,
    window: TriggerWindow,
    /// Latest command time seen; never moves backwards
    last_command_at: Option<Instant>,
    /// Time the cooldown is measured from. Equal to `last_command_at` until
    /// the clock jumps backwards, after which it is rebased on the next fire.
    cooldown_from: Option<Instant>,
}

impl TriggerGate {
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            window: TriggerWindow::Idle,
            last_command_at: None,
            cooldown_from: None,
        }
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn window(&self) -> TriggerWindow {
        self.window
    }

    pub fn is_armed(&self) -> bool {
        self.window.is_armed()
    }

    pub fn last_command_at(&self) -> Option<Instant> {
        self.last_command_at
    }

    /// Advance the arming window for the current frame
    ///
    /// Returns whether the window is open afterwards.
    pub fn check_trigger(&mut self, current: &Classification, history: &RollingHistory) -> bool {
        self.update_window(current, history);
        self.window.is_armed()
    }

    /// Returns (just_armed, expired)
    fn update_window(
        &mut self,
        current: &Classification,
        history: &RollingHistory,
    ) -> (bool, bool) {
        let now = current.timestamp;
        let mut just_armed = false;
        let mut expired = false;

        if !self.window.is_armed()
            && current.label == GestureLabel::PointingUp
            && current.extended_count > 0
            && history.contains_closed_hand()
        {
            self.window = TriggerWindow::Armed { armed_at: now };
            just_armed = true;
            tracing::info!(
                "Finger lift detected, gesture window open for {:.1}s",
                self.config.window_secs
            );
        }

        if let TriggerWindow::Armed { armed_at } = self.window {
            let within = matches!(elapsed(now, armed_at), Some(d) if d <= self.config.window());
            if !within {
                self.window = TriggerWindow::Idle;
                expired = true;
                tracing::info!("Gesture window expired, lift a finger to reopen");
            }
        }

        (just_armed, expired)
    }

    /// Whether the cooldown since the last command has passed at `now`
    ///
    /// A timestamp earlier than the last command means the clock was reset.
    /// That counts as elapsed once; the fire that follows rebases the
    /// cooldown onto the new clock.
    pub fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.cooldown_from {
            None => true,
            Some(last) => match elapsed(now, last) {
                Some(d) => d >= self.config.cooldown(),
                None => true,
            },
        }
    }

    /// Run the window check and the firing rules for one frame
    pub fn evaluate(
        &mut self,
        current: &Classification,
        history: &RollingHistory,
    ) -> GateDecision {
        let (just_armed, window_expired) = self.update_window(current, history);
        let mut decision = GateDecision {
            armed: self.window.is_armed(),
            just_armed,
            window_expired,
            command: None,
            suppressed: None,
        };

        match self.authorise(current) {
            Ok(command) => {
                self.record_fire(command, current.timestamp);
                decision.command = Some(command);
                decision.armed = self.window.is_armed();
            }
            Err(reason) => {
                if reason != SuppressReason::Idle {
                    tracing::debug!(
                        "Suppressed {} ({:.2}): {:?}",
                        current.label,
                        current.confidence,
                        reason
                    );
                }
                decision.suppressed = Some(reason);
            }
        }

        decision
    }

    fn authorise(&self, current: &Classification) -> Result<PresentationCommand, SuppressReason> {
        if !self.window.is_armed() {
            return Err(SuppressReason::Idle);
        }
        if current.confidence <= self.config.fire_threshold {
            return Err(SuppressReason::LowConfidence);
        }
        let command =
            PresentationCommand::for_gesture(current.label).ok_or(SuppressReason::Unmapped)?;
        if !self.cooldown_elapsed(current.timestamp) {
            return Err(SuppressReason::Cooldown);
        }
        Ok(command)
    }

    fn record_fire(&mut self, command: PresentationCommand, now: Instant) {
        if matches!(self.cooldown_from, Some(from) if from > now) {
            tracing::warn!("Clock went backwards, rebasing the command cooldown");
        }
        self.cooldown_from = Some(now);
        self.last_command_at = Some(match self.last_command_at {
            Some(last) if last > now => last,
            _ => now,
        });

        if self.config.consume_on_fire {
            self.window = TriggerWindow::Idle;
        }

        tracing::info!("Command fired: {}", command.description());
    }

    /// Close the window
    ///
    /// The cooldown timestamp survives a reset.
    pub fn reset(&mut self) {
        self.window = TriggerWindow::Idle;
    }
}

impl Default for TriggerGate {
    fn default() -> Self {
        Self::new(TriggerConfig::default())
    }
}
