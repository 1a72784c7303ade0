//! Test fixtures for journey.
//!
//! This crate provides runner profiles, synthetic GPS routes and quest fixtures
//! to drive the session tracker in unit and end-to-end tests.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let quest = QuestBuilder::jogger().build();
//! let fixes = RouteBuilder::new()
//!     .distance_km(1.05)
//!     .runner(RunnerProfile::recreational())
//!     .gps_jitter(3.0)
//!     .build(&mut rng);
//! ```

pub mod profiles;
pub mod quests;
pub mod routes;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::profiles::RunnerProfile;
    pub use crate::quests::QuestBuilder;
    pub use crate::routes::{RouteBuilder, RouteConfig, RoutePattern};
}
