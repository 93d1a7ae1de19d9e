//! Cumulative counters for one controller run

use serde::Serialize;
use std::time::{Duration, Instant};

/// Frame and command counters
#[derive(Debug, Clone)]
pub struct SessionStats {
    started_at: Instant,
    frames_processed: u64,
    hands_detected: u64,
    invalid_frames: u64,
    commands_fired: u64,
    resets: u64,
}

/// Point-in-time copy of the counters with derived rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub hands_detected: u64,
    pub invalid_frames: u64,
    pub commands_fired: u64,
    pub resets: u64,
    pub runtime_secs: f64,
    pub fps: f64,
    /// Commands per processed frame, as a percentage
    pub command_rate: f64,
}

impl SessionStats {
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            frames_processed: 0,
            hands_detected: 0,
            invalid_frames: 0,
            commands_fired: 0,
            resets: 0,
        }
    }

    pub fn record_frame(&mut self, hand_present: bool) {
        self.frames_processed += 1;
        if hand_present {
            self.hands_detected += 1;
        }
    }

    pub fn record_invalid(&mut self) {
        self.invalid_frames += 1;
    }

    pub fn record_command(&mut self) {
        self.commands_fired += 1;
    }

    pub fn record_reset(&mut self) {
        self.resets += 1;
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn commands_fired(&self) -> u64 {
        self.commands_fired
    }

    /// Counters and rates as of `now`
    pub fn snapshot(&self, now: Instant) -> StatsSnapshot {
        let runtime = now
            .checked_duration_since(self.started_at)
            .unwrap_or(Duration::ZERO)
            .as_secs_f64();
        let fps = if runtime > 0.0 {
            self.frames_processed as f64 / runtime
        } else {
            0.0
        };
        let command_rate = if self.frames_processed > 0 {
            self.commands_fired as f64 / self.frames_processed as f64 * 100.0
        } else {
            0.0
        };

        StatsSnapshot {
            frames_processed: self.frames_processed,
            hands_detected: self.hands_detected,
            invalid_frames: self.invalid_frames,
            commands_fired: self.commands_fired,
            resets: self.resets,
            runtime_secs: runtime,
            fps,
            command_rate,
        }
    }
}

impl StatsSnapshot {
    /// Multi-line report for the end of a run
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Total frames: {}", self.frames_processed),
            format!("Frames with a hand: {}", self.hands_detected),
            format!("Commands fired: {}", self.commands_fired),
            format!("Runtime: {:.1} seconds", self.runtime_secs),
        ];
        if self.invalid_frames > 0 {
            lines.push(format!("Invalid frames skipped: {}", self.invalid_frames));
        }
        if self.frames_processed > 0 {
            lines.push(format!("Command rate: {:.2}%", self.command_rate));
        }
        lines.join("\n")
    }
}
