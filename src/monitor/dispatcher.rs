//! Sends messages and records every attempt

use std::sync::Arc;
use std::time::Duration;

use crate::data::{DispatchOutcome, MonitorEvent, Transition};
use crate::notify::{NotificationTransport, TransportError};
use crate::storage::TimeSeriesGateway;

pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
    gateway: Arc<dyn TimeSeriesGateway>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Arc<dyn NotificationTransport>,
        gateway: Arc<dyn TimeSeriesGateway>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            gateway,
            timeout,
        }
    }

    /// Post `content` once and append exactly one event describing the attempt.
    ///
    /// Neither a transport failure nor a failed append is retried; both are
    /// logged and the event is returned either way.
    pub async fn dispatch(&self, content: String, transition: Transition) -> MonitorEvent {
        let status = transition.state();

        let result = match tokio::time::timeout(self.timeout, self.transport.post(&content)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        };

        let outcome = match result {
            Ok(id) => {
                tracing::info!(status = %status, message_id = id, "Notification sent");
                DispatchOutcome::Delivered { id }
            }
            Err(e) => {
                tracing::error!(status = %status, error = %e, "Failed to send notification");
                DispatchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let event = MonitorEvent::new(status, content, outcome);

        if let Err(e) = self.gateway.append_event(&event).await {
            tracing::error!(
                status = %status,
                error = %e,
                "Failed to record notification event"
            );
        }

        event
    }
}
