//! Quest session tracking for joggers.
//!
//! A runner accepts a [`Quest`](models::Quest) with distance, time and pace targets.
//! The [`SessionTracker`](tracker::SessionTracker) then consumes GPS fixes from a
//! [`LocationSource`](location::LocationSource), keeps live distance, speed and elapsed
//! time, emits pace feedback cues, and finally evaluates the attempt into a
//! [`ChallengeResult`](models::ChallengeResult).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use journey::prelude::*;
//!
//! let catalog = StaticCatalog::builtin();
//! let tracker = SessionTracker::new(TrackerConfig::default(), Arc::new(LoggingCueSink));
//!
//! let simulator = SimulatedLocationSource::new(SimulationConfig::default());
//! simulator.start(2.5);
//!
//! tracker.start_by_id(&catalog, "easy_jogger1");
//! tracker.follow(simulator.fix_stream());
//! // ... later
//! let quest = catalog.get("easy_jogger1").unwrap();
//! let result = tracker.complete(&quest);
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod cues;
pub mod errors;
pub mod feedback;
pub mod format;
pub mod geo_math;
pub mod location;
pub mod models;
pub mod outcome;
pub mod tracker;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::catalog::{QuestCatalog, StaticCatalog};
    pub use crate::clock::{Clock, ManualClock, MonotonicClock};
    pub use crate::config::{FeedbackConfig, LiveSourceConfig, SimulationConfig, TrackerConfig};
    pub use crate::cues::{Cue, CueSink, LoggingCueSink, RecordingCueSink, ToggleCueSink};
    pub use crate::feedback::PaceSignal;
    pub use crate::format::{format_distance, format_elapsed, format_speed};
    pub use crate::location::{
        DEFAULT_LOCATION, FixStream, LiveLocationSource, LocationService, LocationSource,
        PositionProvider, ReplayLocationSource, SimulatedLocationSource,
    };
    pub use crate::models::{
        ChallengeResult, Coordinate, LocationFix, Quest, QuestCategory, QuestTargets, Session,
    };
    pub use crate::outcome::Evaluation;
    pub use crate::tracker::{SessionTracker, StartOutcome};
    pub use std::sync::Arc;
}
