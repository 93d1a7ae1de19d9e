//! Trigger gating
//!
//! Decides whether a classified gesture may fire a presentation command.
//!
//! ## States
//!
//! ```text
//!            fist in history, then pointing_up
//!  ┌──────┐ ─────────────────────────────────► ┌───────┐
//!  │ IDLE │                                     │ ARMED │──┐ confident gesture
//!  └──────┘ ◄───────────────────────────────── └───────┘◄─┘ + cooldown passed
//!              window elapsed / reset                         => command
//! ```
//!
//! A fired command leaves the window open unless
//! [`TriggerConfig::consume_on_fire`](crate::config::TriggerConfig) is set.

pub mod gate;
pub mod history;

pub use gate::{GateDecision, SuppressReason, TriggerGate, TriggerWindow};
pub use history::{RollingHistory, DEFAULT_HISTORY_CAPACITY};
