//! Audio/UI cue sinks.
//!
//! The tracker announces session milestones and pace feedback through a
//! [`CueSink`]. Sinks are fire-and-forget: an error is logged by the caller and
//! never changes session state.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::CueError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    ChallengeStart,
    ChallengeSuccess,
    ChallengeFail,
    SpeedWarning,
    SpeedGood,
}

pub trait CueSink: Send + Sync {
    fn emit(&self, cue: Cue) -> Result<(), CueError>;
}

/// Writes every cue to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCueSink;

impl CueSink for LoggingCueSink {
    fn emit(&self, cue: Cue) -> Result<(), CueError> {
        info!(?cue, "cue");
        Ok(())
    }
}

/// Remembers emitted cues in order.
#[derive(Debug, Default)]
pub struct RecordingCueSink {
    cues: Mutex<Vec<Cue>>,
}

impl RecordingCueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        self.cues.lock().clone()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues.lock().iter().filter(|c| **c == cue).count()
    }

    pub fn clear(&self) {
        self.cues.lock().clear();
    }
}

impl CueSink for RecordingCueSink {
    fn emit(&self, cue: Cue) -> Result<(), CueError> {
        self.cues.lock().push(cue);
        Ok(())
    }
}

/// Forwards cues to an inner sink while sound is enabled.
pub struct ToggleCueSink<S> {
    inner: S,
    enabled: AtomicBool,
}

impl<S: CueSink> ToggleCueSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: CueSink> CueSink for ToggleCueSink<S> {
    fn emit(&self, cue: Cue) -> Result<(), CueError> {
        if self.is_enabled() {
            self.inner.emit(cue)
        } else {
            Ok(())
        }
    }
}
