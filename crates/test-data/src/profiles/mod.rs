//! Runner pace profiles.
//!
//! Profiles define realistic jogging speeds. Route builders use them to
//! produce timestamps and reported speeds.

mod runner;

pub use runner::RunnerProfile;
