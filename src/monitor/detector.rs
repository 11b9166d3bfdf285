//! Status change detection

use std::sync::Arc;

use crate::data::{Action, PowerState, Signal, Transition};
use crate::storage::TimeSeriesGateway;

/// Decide what to do given the observed and last notified state
pub fn detect(observed: PowerState, acknowledged: PowerState) -> Action {
    match (observed, acknowledged) {
        // Never act on partial data
        (PowerState::Unknown, _) | (_, PowerState::Unknown) => Action::Skip,
        (o, a) if o == a => Action::Skip,
        (PowerState::Live, _) => Action::Notify(Transition::Up),
        (PowerState::Down, _) => Action::Notify(Transition::Down),
    }
}

/// Both signals read in one cycle and the resulting action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub observed: Option<Signal>,
    pub acknowledged: Option<Signal>,
    pub action: Action,
}

impl Detection {
    pub fn observed_state(&self) -> PowerState {
        state_of(&self.observed)
    }

    pub fn acknowledged_state(&self) -> PowerState {
        state_of(&self.acknowledged)
    }
}

fn state_of(signal: &Option<Signal>) -> PowerState {
    signal
        .as_ref()
        .map(|s| s.state)
        .unwrap_or(PowerState::Unknown)
}

/// Reads the sensor and the notification log, then applies [`detect`]
pub struct StateDetector {
    gateway: Arc<dyn TimeSeriesGateway>,
}

impl StateDetector {
    pub fn new(gateway: Arc<dyn TimeSeriesGateway>) -> Self {
        Self { gateway }
    }

    /// Fresh reads every call; store errors count as no signal
    pub async fn poll(&self) -> Detection {
        let observed = match self.gateway.last_sensor_state().await {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(error = %e, "Sensor state query failed");
                None
            }
        };

        let acknowledged = match self.gateway.last_acknowledged_state().await {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(error = %e, "Acknowledged state query failed");
                None
            }
        };

        let action = detect(state_of(&observed), state_of(&acknowledged));

        Detection {
            observed,
            acknowledged,
            action,
        }
    }
}
