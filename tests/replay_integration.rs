//! Landmark stream replay tests for PalmDeck.
//!
//! Feeds recorded JSON Lines streams through the reader, a channel and the
//! controller, and checks which commands reach the sink.

use palmdeck_lib::command::{KeyChord, PresentationCommand};
use palmdeck_lib::config::Config;
use palmdeck_lib::controller::Controller;
use palmdeck_lib::dispatch::{CommandSink, DispatchError};
use palmdeck_lib::input::{FrameReader, InputEvent, StreamClock};
use palmdeck_lib::landmarks::{Landmark, INDEX_TIP, LANDMARK_COUNT, MIDDLE_TIP};
use palmdeck_lib::session::FrameReport;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

// =============================================================================
// Helper Functions
// =============================================================================

/// Sink that remembers what it was asked to send
#[derive(Clone, Default)]
struct RecordingSink {
    sent: Arc<Mutex<Vec<(PresentationCommand, String)>>>,
}

impl RecordingSink {
    fn commands(&self) -> Vec<PresentationCommand> {
        self.sent
            .lock()
            .expect("sink lock poisoned")
            .iter()
            .map(|(command, _)| *command)
            .collect()
    }
}

impl CommandSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn dispatch(
        &mut self,
        command: PresentationCommand,
        chord: &KeyChord,
    ) -> Result<(), DispatchError> {
        self.sent
            .lock()
            .expect("sink lock poisoned")
            .push((command, chord.to_string()));
        Ok(())
    }
}

fn hand(raised: &[usize], dx: f32) -> Vec<Landmark> {
    let mut points = vec![Landmark::new(0.5 + dx, 0.6); LANDMARK_COUNT];
    for tip in [8, 12, 16, 20] {
        points[tip].y = if raised.contains(&tip) { 0.4 } else { 0.65 };
    }
    points
}

fn frame_line(t: f64, landmarks: Option<Vec<Landmark>>) -> String {
    let event = InputEvent::Frame {
        t: Some(t),
        landmarks,
    };
    serde_json::to_string(&event).expect("Failed to serialise frame")
}

/// Fist, lift, peace sign, then a swipe right
fn presenter_stream() -> String {
    [
        frame_line(0.0, None),
        frame_line(0.1, Some(hand(&[], 0.0))),
        frame_line(0.2, Some(hand(&[INDEX_TIP], 0.0))),
        frame_line(0.5, Some(hand(&[MIDDLE_TIP], 0.0))),
        frame_line(1.6, Some(hand(&[MIDDLE_TIP], 0.1))),
    ]
    .join("\n")
}

fn replay(input: String, config: &Config) -> (Vec<FrameReport>, RecordingSink, Controller) {
    let base = Instant::now();
    let sink = RecordingSink::default();
    let mut controller =
        Controller::new(config, Box::new(sink.clone()), base).expect("Failed to build controller");
    let clock = StreamClock::new(base);

    let (tx, rx) = crossbeam_channel::bounded(4);
    let reader = thread::spawn(move || {
        for event in FrameReader::new(Cursor::new(input)).flatten() {
            tx.send(event).expect("Controller hung up");
        }
    });

    let mut reports = Vec::new();
    controller.run(&rx, &clock, |report| reports.push(report.clone()));
    reader.join().expect("Reader thread panicked");

    (reports, sink, controller)
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_presenter_stream_fires_commands() {
    let (reports, sink, _) = replay(presenter_stream(), &Config::default());

    assert_eq!(reports.len(), 5);
    assert!(!reports[0].hand_present);
    assert!(reports[2].just_armed);
    assert_eq!(
        sink.commands(),
        vec![PresentationCommand::TogglePointer, PresentationCommand::Next]
    );
}

#[test]
fn test_bindings_reach_the_sink() {
    let mut config = Config::default();
    config.bindings.toggle_pointer = "ctrl+l".to_string();

    let (_, sink, _) = replay(presenter_stream(), &config);

    let sent = sink.sent.lock().expect("sink lock poisoned").clone();
    assert_eq!(sent[0], (PresentationCommand::TogglePointer, "ctrl+l".to_string()));
    assert_eq!(sent[1], (PresentationCommand::Next, "right".to_string()));
}

#[test]
fn test_malformed_lines_are_skipped() {
    let mut lines: Vec<String> = presenter_stream().lines().map(str::to_string).collect();
    lines.insert(1, "{\"type\":\"frame\",\"landmarks\":[{\"x\":\"oops\"}]}".to_string());
    lines.insert(3, "garbage".to_string());
    lines.insert(4, String::new());

    let (reports, sink, _) = replay(lines.join("\n"), &Config::default());

    assert_eq!(reports.len(), 5);
    assert_eq!(sink.commands().len(), 2);
}

#[test]
fn test_reset_event_cancels_window() {
    let stream = [
        frame_line(0.0, Some(hand(&[], 0.0))),
        frame_line(0.1, Some(hand(&[INDEX_TIP], 0.0))),
        r#"{"type":"reset","t":0.2}"#.to_string(),
        frame_line(0.5, Some(hand(&[MIDDLE_TIP], 0.0))),
    ]
    .join("\n");

    let (reports, sink, controller) = replay(stream, &Config::default());

    assert_eq!(reports.len(), 3);
    assert!(!reports[2].armed);
    assert!(sink.commands().is_empty());
    assert_eq!(controller.stats(Instant::now()).resets, 1);
}

#[test]
fn test_one_shot_stream_fires_once() {
    let mut config = Config::default();
    config.trigger.consume_on_fire = true;

    let (_, sink, _) = replay(presenter_stream(), &config);

    assert_eq!(sink.commands(), vec![PresentationCommand::TogglePointer]);
}

#[test]
fn test_stats_after_replay() {
    let (_, _, controller) = replay(presenter_stream(), &Config::default());

    let stats = controller.stats(Instant::now());
    assert_eq!(stats.frames_processed, 5);
    assert_eq!(stats.hands_detected, 4);
    assert_eq!(stats.commands_fired, 2);
    assert!(stats.summary().contains("Commands fired: 2"));
}
