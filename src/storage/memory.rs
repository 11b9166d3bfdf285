//! In-process gateway holding readings and events in memory

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::gateway::{GatewayError, TimeSeriesGateway};
use crate::data::{MonitorEvent, PowerState, Signal};

/// Event as stored, with the write time the store assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub recorded_at: DateTime<Utc>,
    pub event: MonitorEvent,
}

/// Gateway keeping everything in memory.
///
/// Mirrors the windows the InfluxDB queries use, and can be told to fail
/// reads or writes to exercise degraded paths.
pub struct MemoryGateway {
    readings: RwLock<Vec<Signal>>,
    events: RwLock<Vec<StoredEvent>>,
    sensor_window: Duration,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::with_sensor_window(Duration::from_secs(2))
    }

    pub fn with_sensor_window(sensor_window: Duration) -> Self {
        Self {
            readings: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            sensor_window,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Record a sensor reading taken now
    pub fn record_reading(&self, state: PowerState) {
        self.record_reading_at(state, Utc::now());
    }

    pub fn record_reading_at(&self, state: PowerState, at: DateTime<Utc>) {
        self.readings.write().push(Signal::new(state, at));
    }

    /// Seed the notification log with an event written at `at`
    pub fn insert_event_at(&self, event: MonitorEvent, at: DateTime<Utc>) {
        self.events.write().push(StoredEvent {
            recorded_at: at,
            event,
        });
    }

    /// All stored events, oldest first
    pub fn events(&self) -> Vec<StoredEvent> {
        let mut events = self.events.read().clone();
        events.sort_by_key(|e| e.recorded_at);
        events
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<(), GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn newest_event_since(&self, since: DateTime<Utc>) -> Option<StoredEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.recorded_at >= since)
            .max_by_key(|e| e.recorded_at)
            .cloned()
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn since(lookback: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(lookback)
        .ok()
        .and_then(|lookback| Utc::now().checked_sub_signed(lookback))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl TimeSeriesGateway for MemoryGateway {
    async fn last_sensor_state(&self) -> Result<Option<Signal>, GatewayError> {
        self.check_reads()?;
        let since = since(self.sensor_window);

        Ok(self
            .readings
            .read()
            .iter()
            .filter(|s| s.observed_at >= since)
            .max_by_key(|s| s.observed_at)
            .cloned())
    }

    async fn last_acknowledged_state(&self) -> Result<Option<Signal>, GatewayError> {
        self.check_reads()?;

        Ok(self
            .newest_event_since(since(Duration::from_secs(24 * 3600)))
            .map(|e| Signal::new(e.event.status, e.recorded_at)))
    }

    async fn count_down_events(&self, lookback: Duration) -> Result<u64, GatewayError> {
        self.check_reads()?;
        let since = since(lookback);

        let count = self
            .events
            .read()
            .iter()
            .filter(|e| e.recorded_at >= since && e.event.status == PowerState::Down)
            .count();
        Ok(count as u64)
    }

    async fn time_since_last_event(&self) -> Result<Option<Duration>, GatewayError> {
        self.check_reads()?;

        Ok(self
            .newest_event_since(DateTime::<Utc>::MIN_UTC)
            .map(|e| (Utc::now() - e.recorded_at).to_std().unwrap_or(Duration::ZERO)))
    }

    async fn append_event(&self, event: &MonitorEvent) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("writes disabled".to_string()));
        }
        self.insert_event_at(event.clone(), Utc::now());
        Ok(())
    }
}
