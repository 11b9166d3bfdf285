use async_trait::async_trait;

/// Somewhere a status message can be posted
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Post `text`, returning the provider-assigned message id
    async fn post(&self, text: &str) -> Result<u64, TransportError>;
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("Credential check failed: {0}")]
    Credentials(String),
}
