//! Narrow view of the time-series store used by the monitor

use std::time::Duration;

use async_trait::async_trait;

use crate::data::{MonitorEvent, Signal};

/// Read/append access to sensor readings and the notification log.
///
/// Implementations report failures through [`GatewayError`]; the monitor
/// logs them and carries on as if the result were empty.
#[async_trait]
pub trait TimeSeriesGateway: Send + Sync {
    /// Most recent sensor reading inside the recency window
    async fn last_sensor_state(&self) -> Result<Option<Signal>, GatewayError>;

    /// Most recent notified state within the last day
    async fn last_acknowledged_state(&self) -> Result<Option<Signal>, GatewayError>;

    /// Number of `down` events recorded in `[now - lookback, now]`
    async fn count_down_events(&self, lookback: Duration) -> Result<u64, GatewayError>;

    /// Time elapsed since the newest event of any status
    async fn time_since_last_event(&self) -> Result<Option<Duration>, GatewayError>;

    /// Append one event to the notification log
    async fn append_event(&self, event: &MonitorEvent) -> Result<(), GatewayError>;
}

/// Store access errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(timeout)
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}
