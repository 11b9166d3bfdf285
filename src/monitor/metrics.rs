//! Outage statistics derived from the notification log

use std::sync::Arc;
use std::time::Duration;

use crate::storage::TimeSeriesGateway;

/// Lookbacks reported in power-lost messages
pub const OUTAGE_WINDOWS: [Duration; 3] = [
    Duration::from_secs(6 * 3600),
    Duration::from_secs(12 * 3600),
    Duration::from_secs(24 * 3600),
];

/// Outages within one lookback, including the one being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutageWindow {
    pub lookback: Duration,
    pub count: u64,
}

pub struct OutageMetrics {
    gateway: Arc<dyn TimeSeriesGateway>,
}

impl OutageMetrics {
    pub fn new(gateway: Arc<dyn TimeSeriesGateway>) -> Self {
        Self { gateway }
    }

    /// Count outages for each lookback, in the order given.
    ///
    /// Must run before the current outage is appended: every count includes
    /// it (+1). A failed count degrades to 1.
    pub async fn summarize(&self, lookbacks: &[Duration]) -> Vec<OutageWindow> {
        let mut windows = Vec::with_capacity(lookbacks.len());

        for &lookback in lookbacks {
            let count = match self.gateway.count_down_events(lookback).await {
                Ok(previous) => previous.saturating_add(1),
                Err(e) => {
                    tracing::error!(
                        lookback_secs = lookback.as_secs(),
                        error = %e,
                        "Outage count failed"
                    );
                    1
                }
            };
            windows.push(OutageWindow { lookback, count });
        }

        windows
    }

    /// Time since the newest event, e.g. `1h2m3s`
    pub async fn elapsed_since_last_event(&self) -> Option<String> {
        match self.gateway.time_since_last_event().await {
            Ok(elapsed) => elapsed.map(format_elapsed),
            Err(e) => {
                tracing::error!(error = %e, "Last event lookup failed");
                None
            }
        }
    }
}

/// Whole-second duration in `1h2m3s` form
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DispatchOutcome, MonitorEvent, PowerState};
    use crate::storage::MemoryGateway;
    use chrono::Utc;

    fn down_event() -> MonitorEvent {
        MonitorEvent::new(
            PowerState::Down,
            "down",
            DispatchOutcome::Delivered { id: 7 },
        )
    }

    #[tokio::test]
    async fn test_summarize_adds_current_outage() {
        let gateway = Arc::new(MemoryGateway::new());
        let now = Utc::now();
        gateway.insert_event_at(down_event(), now - chrono::Duration::hours(3));
        gateway.insert_event_at(down_event(), now - chrono::Duration::hours(10));
        gateway.insert_event_at(down_event(), now - chrono::Duration::hours(23));

        let metrics = OutageMetrics::new(gateway);
        let counts: Vec<u64> = metrics
            .summarize(&OUTAGE_WINDOWS)
            .await
            .iter()
            .map(|w| w.count)
            .collect();

        assert_eq!(counts, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn test_summarize_preserves_order() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.insert_event_at(down_event(), Utc::now() - chrono::Duration::hours(8));

        let metrics = OutageMetrics::new(gateway);
        let lookbacks = [OUTAGE_WINDOWS[2], OUTAGE_WINDOWS[0], OUTAGE_WINDOWS[1]];
        let windows = metrics.summarize(&lookbacks).await;

        assert_eq!(windows.len(), 3);
        let returned: Vec<Duration> = windows.iter().map(|w| w.lookback).collect();
        assert_eq!(returned, lookbacks.to_vec());
        assert_eq!(windows[0].count, 2);
        assert_eq!(windows[1].count, 1);
        assert_eq!(windows[2].count, 2);
    }

    #[tokio::test]
    async fn test_summarize_floor_when_store_fails() {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.set_fail_reads(true);

        let metrics = OutageMetrics::new(gateway);
        let windows = metrics.summarize(&OUTAGE_WINDOWS).await;

        assert_eq!(windows.len(), OUTAGE_WINDOWS.len());
        assert!(windows.iter().all(|w| w.count == 1));
        assert!(metrics.summarize(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_elapsed_since_last_event() {
        let gateway = Arc::new(MemoryGateway::new());
        let metrics = OutageMetrics::new(Arc::clone(&gateway) as Arc<dyn TimeSeriesGateway>);
        assert_eq!(metrics.elapsed_since_last_event().await, None);

        gateway.insert_event_at(down_event(), Utc::now() - chrono::Duration::seconds(3725));
        let elapsed = metrics.elapsed_since_last_event().await.unwrap();
        assert!(elapsed.starts_with("1h2m"), "unexpected {}", elapsed);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(400)), "0s");
        assert_eq!(format_elapsed(Duration::from_secs(45)), "45s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m5s");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 12)), "3h0m12s");
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "59s");
    }
}
