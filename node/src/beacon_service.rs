//! Runs a [`NonceBroadcastEmitter`] on its own task until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{error, info, Instrument};

use proxima_beacon::{
    AdvertisementPayload, Advertiser, BeaconError, NonceBroadcastEmitter, NonceSource, RadioState,
};

use crate::metrics::EngineMetrics;
use crate::shutdown::ShutdownSignal;
use crate::tracing_spans;
use crate::NodeError;

pub struct BeaconService<A, R> {
    emitter: NonceBroadcastEmitter<A, R>,
    metrics: Arc<EngineMetrics>,
}

impl<A: Advertiser, R: NonceSource> BeaconService<A, R> {
    pub fn new(emitter: NonceBroadcastEmitter<A, R>, metrics: Arc<EngineMetrics>) -> Self {
        Self { emitter, metrics }
    }

    /// Advertise until shutdown. Returns the number of rotations performed.
    ///
    /// A random-source or radio failure stops advertising and ends the
    /// service with that error.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<u64, NodeError> {
        let span = tracing_spans::beacon_span(self.emitter.marker());
        async move {
            let epoch = Instant::now();
            self.emitter.start(0)?;
            self.metrics.beacon_rotations.inc();

            loop {
                let Some(deadline) = self.emitter.next_deadline() else {
                    break;
                };
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => break,
                    _ = sleep_until(epoch + Duration::from_millis(deadline)) => {
                        let now_ms = epoch.elapsed().as_millis() as u64;
                        match self.emitter.poll(now_ms) {
                            Ok(Some(_)) => self.metrics.beacon_rotations.inc(),
                            Ok(None) => {}
                            Err(e) => {
                                error!(error = %e, "beacon rotation failed; stopping");
                                self.emitter.stop();
                                return Err(e.into());
                            }
                        }
                    }
                }
            }

            self.emitter.stop();
            info!(rotations = self.emitter.rotations(), "beacon service ended");
            Ok(self.emitter.rotations())
        }
        .instrument(span)
        .await
    }
}

/// Advertiser for hosts without a radio driver: logs every payload it is
/// asked to put on air.
#[derive(Debug, Default)]
pub struct LoggingAdvertiser {
    active: Option<AdvertisementPayload>,
}

impl LoggingAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&AdvertisementPayload> {
        self.active.as_ref()
    }
}

impl Advertiser for LoggingAdvertiser {
    fn state(&self) -> RadioState {
        RadioState::PoweredOn
    }

    fn start_advertising(&mut self, payload: &AdvertisementPayload) -> Result<(), BeaconError> {
        if self.active.is_some() {
            return Err(BeaconError::Advertise(
                "previous advertisement still active".into(),
            ));
        }
        info!(
            local_name = %payload.local_name,
            service_uuid = %payload.service_uuid(),
            "advertisement on air"
        );
        self.active = Some(payload.clone());
        Ok(())
    }

    fn stop_advertising(&mut self) {
        if let Some(payload) = self.active.take() {
            info!(service_uuid = %payload.service_uuid(), "advertisement off air");
        }
    }
}
