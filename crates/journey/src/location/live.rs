//! Live positioning through a platform provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use super::{FixStream, LocationSource, receiver_stream};
use crate::clock::Clock;
use crate::config::LiveSourceConfig;
use crate::errors::LocationError;
use crate::models::LocationFix;

/// The platform positioning API.
#[async_trait]
pub trait PositionProvider: Send + Sync + 'static {
    fn permission_granted(&self) -> bool;

    /// The last fix the platform knows about, if any.
    async fn last_known(&self) -> Result<Option<LocationFix>, LocationError>;

    /// Requests one fresh high-accuracy fix. May wait indefinitely.
    async fn request_fix(&self) -> Result<Option<LocationFix>, LocationError>;

    /// Starts continuous updates at roughly `interval`.
    ///
    /// The subscription ends when the receiver is dropped.
    fn subscribe(&self, interval: Duration) -> Result<mpsc::Receiver<LocationFix>, LocationError>;
}

/// [`LocationSource`] backed by a [`PositionProvider`].
pub struct LiveLocationSource<P> {
    provider: Arc<P>,
    clock: Arc<dyn Clock>,
    config: LiveSourceConfig,
}

impl<P: PositionProvider> LiveLocationSource<P> {
    pub fn new(provider: Arc<P>, clock: Arc<dyn Clock>, config: LiveSourceConfig) -> Self {
        Self {
            provider,
            clock,
            config,
        }
    }

    async fn fresh_fix(&self) -> Option<LocationFix> {
        let request = self.provider.request_fix();
        match tokio::time::timeout(self.config.fresh_fix_timeout(), request).await {
            Ok(Ok(Some(fix))) => {
                debug!(lat = fix.lat, lon = fix.lon, "Fresh fix received");
                Some(fix)
            }
            Ok(Ok(None)) => {
                debug!("Provider returned no fresh fix");
                None
            }
            Ok(Err(e)) => {
                warn!("Fresh fix request failed: {e}");
                None
            }
            Err(_) => {
                warn!("{}", LocationError::Timeout);
                None
            }
        }
    }

    fn is_fresh(&self, fix: &LocationFix) -> bool {
        let age_ms = self.clock.now_millis() - fix.timestamp_ms;
        age_ms < self.config.staleness_ms as i64
    }
}

#[async_trait]
impl<P: PositionProvider> LocationSource for LiveLocationSource<P> {
    fn has_permission(&self) -> bool {
        self.provider.permission_granted()
    }

    #[instrument(skip(self))]
    async fn current_fix(&self) -> Option<LocationFix> {
        if !self.has_permission() {
            warn!("{}", LocationError::PermissionDenied);
            return None;
        }

        let last = match self.provider.last_known().await {
            Ok(last) => last,
            Err(e) => {
                warn!("Could not read last known fix: {e}");
                None
            }
        };

        match last {
            Some(fix) if self.is_fresh(&fix) => {
                debug!("Using cached fix");
                Some(fix)
            }
            _ => {
                debug!("Last known fix missing or stale, requesting a fresh one");
                self.fresh_fix().await
            }
        }
    }

    fn fix_stream(&self) -> FixStream {
        if !self.has_permission() {
            warn!("{}", LocationError::PermissionDenied);
            return stream::empty().boxed();
        }

        match self.provider.subscribe(self.config.stream_interval()) {
            Ok(rx) => receiver_stream(rx),
            Err(e) => {
                warn!("Could not subscribe to location updates: {e}");
                stream::empty().boxed()
            }
        }
    }
}
