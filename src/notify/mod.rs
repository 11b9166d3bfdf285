//! Notification transports
//!
//! - Twitter API v2 with OAuth 1.0a user credentials
//! - Log-only transport for dry runs

pub mod log;
pub mod oauth;
pub mod transport;
pub mod twitter;

pub use log::LogTransport;
pub use oauth::OAuthSigner;
pub use transport::{NotificationTransport, TransportError};
pub use twitter::{TwitterClient, TwitterUser};
