//! Landmark stream input
//!
//! The hand tracker feeds the controller JSON Lines, one event per line:
//!
//! ```text
//! {"type":"frame","t":0.033,"landmarks":[{"x":0.51,"y":0.62}, ...]}
//! {"type":"frame","t":0.066,"landmarks":null}
//! {"type":"reset"}
//! ```
//!
//! `t` is seconds since the start of the stream. Without it the frame is
//! stamped with the live monotonic clock on arrival.

use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::time::{Duration, Instant};

use crate::landmarks::Landmark;

/// One line of the input stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// A camera frame; `landmarks` is absent when no hand was detected
    Frame {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        t: Option<f64>,
        #[serde(default)]
        landmarks: Option<Vec<Landmark>>,
    },
    /// User-requested reset
    Reset {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        t: Option<f64>,
    },
}

impl InputEvent {
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            InputEvent::Frame { t, .. } | InputEvent::Reset { t } => *t,
        }
    }
}

/// Errors raised while reading the stream
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl InputError {
    /// Whether reading can continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, InputError::Parse { .. })
    }
}

/// Iterator over the events of a JSON Lines stream
///
/// Blank lines are skipped. A malformed line yields an error and reading
/// continues with the next line; an I/O error ends the stream.
pub struct FrameReader<R> {
    reader: R,
    line: usize,
    buf: String,
    finished: bool,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
            finished: false,
        }
    }

    /// Number of lines consumed so far
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<InputEvent, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {
                    self.line += 1;
                    let trimmed = self.buf.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|source| {
                        InputError::Parse {
                            line: self.line,
                            source,
                        }
                    }));
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(InputError::Io(e)));
                }
            }
        }
    }
}

/// Maps stream seconds onto the monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct StreamClock {
    base: Instant,
}

impl StreamClock {
    pub fn new(base: Instant) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Instant {
        self.base
    }

    /// Instant for a stream timestamp, or now when the event carries none
    ///
    /// Negative offsets land before the base so that out-of-order input
    /// reaches the session as a backwards clock rather than being hidden.
    pub fn instant_for(&self, t: Option<f64>) -> Instant {
        let Some(secs) = t else {
            return Instant::now();
        };

        match Duration::try_from_secs_f64(secs.abs()) {
            Ok(offset) if secs >= 0.0 => self.base.checked_add(offset).unwrap_or(self.base),
            Ok(offset) => self.base.checked_sub(offset).unwrap_or(self.base),
            Err(_) => {
                tracing::warn!("Ignoring unusable timestamp {}", secs);
                self.base
            }
        }
    }
}
