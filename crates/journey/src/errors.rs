use thiserror::Error;

/// Failures while loading or validating a quest catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid quest {id:?}: {reason}")]
    InvalidQuest { id: String, reason: String },

    #[error("Duplicate quest id: {0}")]
    DuplicateId(String),
}

/// Failures reported by a positioning provider.
///
/// These never escape a location source; they are logged and turned into "no fix".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Timed out waiting for a fresh fix")]
    Timeout,

    #[error("Positioning unavailable")]
    Unavailable,

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Failure of an audio cue sink. Logged by the tracker and otherwise ignored.
#[derive(Error, Debug)]
#[error("Cue sink error: {0}")]
pub struct CueError(pub String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failures while loading a route for replay.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX parse error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("Route has no points")]
    Empty,
}
