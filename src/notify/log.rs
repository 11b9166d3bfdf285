//! Dry-run transport that only logs

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use super::transport::{NotificationTransport, TransportError};

/// Logs each message through tracing instead of posting it.
/// Ids are handed out sequentially starting at 1.
#[derive(Debug, Default)]
pub struct LogTransport {
    next_id: AtomicU64,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn post(&self, text: &str) -> Result<u64, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::warn!(message_id = id, "Notification (dry run): {}", text);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_transport_ids() {
        let transport = LogTransport::new();
        assert_eq!(transport.post("first").await.unwrap(), 1);
        assert_eq!(transport.post("second").await.unwrap(), 2);
    }
}
