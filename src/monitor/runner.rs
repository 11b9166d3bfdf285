//! The poll loop

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::composer::NotificationComposer;
use super::detector::{Detection, StateDetector};
use super::dispatcher::NotificationDispatcher;
use super::metrics::OutageMetrics;
use crate::config::MonitorConfig;
use crate::data::{Action, MonitorEvent};
use crate::notify::NotificationTransport;
use crate::storage::TimeSeriesGateway;

/// What one cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(Detection),
    Notified(MonitorEvent),
}

/// Polls for power changes and announces them.
///
/// Holds no state between cycles: the notification log is read back every
/// tick, so a restarted monitor picks up where the last one stopped.
pub struct Monitor {
    detector: StateDetector,
    composer: NotificationComposer,
    dispatcher: NotificationDispatcher,
    poll_interval: Duration,
}

impl Monitor {
    pub fn new(
        config: &MonitorConfig,
        gateway: Arc<dyn TimeSeriesGateway>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self {
            detector: StateDetector::new(Arc::clone(&gateway)),
            composer: NotificationComposer::new(
                OutageMetrics::new(Arc::clone(&gateway)),
                config.timezone,
            ),
            dispatcher: NotificationDispatcher::new(transport, gateway, config.call_timeout),
            poll_interval: config.poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run a single detect/compose/dispatch cycle to completion
    pub async fn tick(&self) -> CycleOutcome {
        let detection = self.detector.poll().await;

        let transition = match detection.action {
            Action::Skip => {
                if detection.observed_state() != detection.acknowledged_state() {
                    tracing::debug!(
                        observed = %detection.observed_state(),
                        acknowledged = %detection.acknowledged_state(),
                        "Ignoring change with a missing status"
                    );
                }
                return CycleOutcome::Skipped(detection);
            }
            Action::Notify(transition) => transition,
        };

        tracing::info!(
            observed = %detection.observed_state(),
            acknowledged = %detection.acknowledged_state(),
            "Status change detected"
        );

        let content = self.composer.compose(transition).await;
        let event = self.dispatcher.dispatch(content, transition).await;
        CycleOutcome::Notified(event)
    }

    /// Tick every poll interval until `shutdown` is cancelled.
    ///
    /// A cycle in progress always finishes, including its append, before the
    /// next one starts or the loop exits. Returns the number of cycles run.
    pub async fn run(&self, shutdown: CancellationToken) -> u64 {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0u64;

        tracing::info!(
            interval_ms = self.poll_interval.as_millis() as u64,
            "Power monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!(cycles, "Power monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                    cycles += 1;
                }
            }
        }

        cycles
    }
}
