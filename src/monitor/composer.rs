//! Message bodies for power transitions
//!
//! The layout is stable: old messages stored in the notification log are
//! compared against new ones, so the wording and timestamp format stay fixed.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::metrics::{OutageMetrics, OutageWindow, OUTAGE_WINDOWS};
use crate::data::Transition;
use crate::storage::flux::duration_literal;

/// RFC 1123 with the zone abbreviation, e.g. `Sun, 18 Oct 2026 14:03:05 IST`
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

pub struct NotificationComposer {
    metrics: OutageMetrics,
    timezone: Tz,
}

impl NotificationComposer {
    pub fn new(metrics: OutageMetrics, timezone: Tz) -> Self {
        Self { metrics, timezone }
    }

    pub async fn compose(&self, transition: Transition) -> String {
        self.compose_at(transition, Utc::now()).await
    }

    /// Build the message as if detected at `now`
    pub async fn compose_at(&self, transition: Transition, now: DateTime<Utc>) -> String {
        let timestamp = format_timestamp(now, self.timezone);

        match transition {
            Transition::Up => {
                let duration = self.metrics.elapsed_since_last_event().await;
                power_up_message(&timestamp, duration.as_deref())
            }
            Transition::Down => {
                let windows = self.metrics.summarize(&OUTAGE_WINDOWS).await;
                power_down_message(&timestamp, &windows)
            }
        }
    }
}

pub fn format_timestamp(at: DateTime<Utc>, timezone: Tz) -> String {
    at.with_timezone(&timezone)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

fn power_up_message(timestamp: &str, outage_duration: Option<&str>) -> String {
    let mut content = format!(
        "Power Status: live 🟢\nDetection Timestamp: {}",
        timestamp
    );
    if let Some(duration) = outage_duration {
        content.push_str(&format!("\nOutage Duration: {}", duration));
    }
    content
}

fn power_down_message(timestamp: &str, windows: &[OutageWindow]) -> String {
    let labels: Vec<String> = windows.iter().map(|w| duration_literal(w.lookback)).collect();
    let counts: Vec<String> = windows.iter().map(|w| w.count.to_string()).collect();

    format!(
        "Power Status: down 🔴\nDetection Timestamp: {}\nOutages in last {}: {}",
        timestamp,
        labels.join(","),
        counts.join(",")
    )
}
