//! Frame-driven runner
//!
//! Glues the input stream, the gesture session and a command sink together.
//! Frames arrive on a single-consumer channel and are evaluated strictly one
//! at a time.

use crossbeam_channel::Receiver;
use std::collections::HashMap;
use std::time::Instant;

use crate::command::{KeyChord, PresentationCommand};
use crate::config::{Config, ConfigError};
use crate::dispatch::CommandSink;
use crate::input::{InputEvent, StreamClock};
use crate::landmarks::Landmark;
use crate::session::{FrameReport, GestureSession};
use crate::stats::StatsSnapshot;

/// Owns a session and delivers its commands
pub struct Controller {
    session: GestureSession,
    sink: Box<dyn CommandSink>,
    chords: HashMap<PresentationCommand, KeyChord>,
    dispatch_failures: u64,
}

impl Controller {
    /// Build a controller, rejecting invalid key bindings up front
    pub fn new(
        config: &Config,
        sink: Box<dyn CommandSink>,
        now: Instant,
    ) -> Result<Self, ConfigError> {
        let chords = PresentationCommand::ALL
            .into_iter()
            .map(|command| Ok((command, config.bindings.chord(command)?)))
            .collect::<Result<HashMap<_, _>, ConfigError>>()?;

        tracing::info!("Dispatching commands via {}", sink.name());

        Ok(Self {
            session: GestureSession::new(config, now),
            sink,
            chords,
            dispatch_failures: 0,
        })
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures
    }

    pub fn stats(&self, now: Instant) -> StatsSnapshot {
        self.session.stats(now)
    }

    /// Evaluate one frame and dispatch any command it authorises
    pub fn process_frame(&mut self, landmarks: Option<&[Landmark]>, now: Instant) -> FrameReport {
        let report = self.session.evaluate(landmarks, now);
        if let Some(command) = report.command {
            self.deliver(command);
        }
        report
    }

    fn deliver(&mut self, command: PresentationCommand) {
        let Some(chord) = self.chords.get(&command) else {
            tracing::warn!("No key binding for {}", command);
            return;
        };

        if let Err(e) = self.sink.dispatch(command, chord) {
            self.dispatch_failures += 1;
            tracing::warn!("Failed to dispatch {}: {}", command, e);
        }
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Route one stream event
    ///
    /// Returns the frame report for frames, `None` for resets.
    pub fn handle(&mut self, event: InputEvent, clock: &StreamClock) -> Option<FrameReport> {
        let now = clock.instant_for(event.timestamp());
        match event {
            InputEvent::Frame { landmarks, .. } => {
                Some(self.process_frame(landmarks.as_deref(), now))
            }
            InputEvent::Reset { .. } => {
                self.reset();
                None
            }
        }
    }

    /// Drain a channel of events until every sender is gone
    pub fn run<F>(&mut self, events: &Receiver<InputEvent>, clock: &StreamClock, mut on_report: F)
    where
        F: FnMut(&FrameReport),
    {
        for event in events.iter() {
            if let Some(report) = self.handle(event, clock) {
                on_report(&report);
            }
        }
        tracing::debug!("Input channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchError, LogSink};
    use crate::landmarks::LANDMARK_COUNT;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Rc<RefCell<Vec<(PresentationCommand, String)>>>,
        fail: bool,
    }

    impl CommandSink for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn dispatch(
            &mut self,
            command: PresentationCommand,
            chord: &KeyChord,
        ) -> Result<(), DispatchError> {
            if self.fail {
                return Err(DispatchError::Unavailable("test".to_string()));
            }
            self.sent.borrow_mut().push((command, chord.to_string()));
            Ok(())
        }
    }

    fn hand(tips_up: &[usize], dx: f32) -> Vec<Landmark> {
        let mut points = vec![Landmark::new(0.5 + dx, 0.6); LANDMARK_COUNT];
        for tip in [8, 12, 16, 20] {
            points[tip].y = if tips_up.contains(&tip) { 0.4 } else { 0.65 };
        }
        points
    }

    /// fist, lift, then a swipe right
    fn drive(controller: &mut Controller, base: Instant) -> Vec<FrameReport> {
        let frames = [
            (hand(&[], 0.0), 0.0),
            (hand(&[8], 0.0), 0.1),
            (hand(&[8], 0.1), 0.2),
        ];
        frames
            .iter()
            .map(|(points, t)| {
                let now = base + Duration::from_secs_f64(*t);
                controller.process_frame(Some(points.as_slice()), now)
            })
            .collect()
    }

    #[test]
    fn test_swipe_dispatches_bound_chord() {
        let base = Instant::now();
        let recorder = Recorder::default();
        let sent = recorder.sent.clone();
        let mut controller =
            Controller::new(&Config::default(), Box::new(recorder), base).unwrap();

        let reports = drive(&mut controller, base);
        assert!(reports[1].just_armed);
        assert_eq!(reports[2].command, Some(PresentationCommand::Next));
        assert_eq!(
            sent.borrow().as_slice(),
            &[(PresentationCommand::Next, "right".to_string())]
        );
    }

    #[test]
    fn test_dispatch_failure_is_not_fatal() {
        let base = Instant::now();
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut controller =
            Controller::new(&Config::default(), Box::new(recorder), base).unwrap();

        let reports = drive(&mut controller, base);
        assert_eq!(reports[2].command, Some(PresentationCommand::Next));
        assert_eq!(controller.dispatch_failures(), 1);
        assert_eq!(controller.stats(base).commands_fired, 1);
    }

    #[test]
    fn test_invalid_binding_rejected() {
        let mut config = Config::default();
        config.bindings.next = "hyper+right".to_string();
        let result = Controller::new(&config, Box::new(LogSink::new()), Instant::now());
        assert!(matches!(result, Err(ConfigError::Binding { command: "next", .. })));
    }

    #[test]
    fn test_reset_event_disarms() {
        let base = Instant::now();
        let clock = StreamClock::new(base);
        let mut controller =
            Controller::new(&Config::default(), Box::new(LogSink::new()), base).unwrap();

        controller.handle(
            InputEvent::Frame {
                t: Some(0.0),
                landmarks: Some(hand(&[], 0.0)),
            },
            &clock,
        );
        let lift = controller.handle(
            InputEvent::Frame {
                t: Some(0.1),
                landmarks: Some(hand(&[8], 0.0)),
            },
            &clock,
        );
        assert!(lift.unwrap().armed);

        assert!(controller
            .handle(InputEvent::Reset { t: Some(0.2) }, &clock)
            .is_none());
        assert!(!controller.session().is_armed());
        assert!(controller.session().history().is_empty());
    }

    #[test]
    fn test_run_drains_channel() {
        let base = Instant::now();
        let clock = StreamClock::new(base);
        let mut controller =
            Controller::new(&Config::default(), Box::new(LogSink::new()), base).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        for i in 0..3 {
            tx.send(InputEvent::Frame {
                t: Some(i as f64 * 0.1),
                landmarks: None,
            })
            .unwrap();
        }
        tx.send(InputEvent::Reset { t: None }).unwrap();
        drop(tx);

        let mut seen = 0;
        controller.run(&rx, &clock, |_| seen += 1);
        assert_eq!(seen, 3);
        assert_eq!(controller.stats(base).frames_processed, 3);
        assert_eq!(controller.stats(base).resets, 1);
    }
}
