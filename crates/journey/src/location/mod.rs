//! Sources of GPS fixes.
//!
//! Three interchangeable implementations share the [`LocationSource`] capability:
//! - [`LiveLocationSource`]: wraps a platform [`PositionProvider`]
//! - [`SimulatedLocationSource`]: synthetic runner walking a jittered path
//! - [`ReplayLocationSource`]: plays back a fixed route or GPX track
//!
//! [`LocationService`] switches between the live source and the simulator.
//! Environment failures never escape a source. They are logged and surface as
//! "no fix" or an empty stream.

mod live;
mod replay;
mod service;
mod simulated;

pub use live::{LiveLocationSource, PositionProvider};
pub use replay::{ReplayLocationSource, test_route};
pub use service::LocationService;
pub use simulated::SimulatedLocationSource;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::mpsc;

use crate::models::{Coordinate, LocationFix};

/// Fallback position (Gummersbach) when no fix is available.
pub const DEFAULT_LOCATION: Coordinate = Coordinate::new(51.0269, 7.5636);

/// A lazy, possibly infinite sequence of fixes. Dropping it ends the subscription.
pub type FixStream = BoxStream<'static, LocationFix>;

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Whether positioning is permitted. Has no side effects.
    fn has_permission(&self) -> bool;

    /// The most recent usable fix, or `None` when none can be obtained in time.
    async fn current_fix(&self) -> Option<LocationFix>;

    /// Continuous fixes until the stream is dropped or the source stops.
    fn fix_stream(&self) -> FixStream;
}

/// Adapts a channel receiver into a [`FixStream`].
pub(crate) fn receiver_stream(rx: mpsc::Receiver<LocationFix>) -> FixStream {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|fix| (fix, rx)) }).boxed()
}
