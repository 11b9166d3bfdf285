//! Powerwatch: mains power monitor
//!
//! Watches a power sensor's `status` readings in InfluxDB and announces every
//! change between `live` and `down`. Each announcement attempt, delivered or
//! not, is written back to a notification log in the same store; that log is
//! the only record of what was last announced.
//!
//! # Components
//!
//! - **Storage**: [`storage::TimeSeriesGateway`] with InfluxDB and in-memory backends
//! - **Detection**: [`monitor::detect`] compares observed and acknowledged state
//! - **Metrics**: outage counts over 6h/12h/24h and time since the last event
//! - **Composition**: fixed-format messages with zone-aware timestamps
//! - **Dispatch**: [`notify::NotificationTransport`] (Twitter or log-only), always recorded
//! - **Loop**: [`monitor::Monitor`] ticks on a fixed interval until cancelled
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use powerwatch::config::MonitorConfig;
//! use powerwatch::monitor::Monitor;
//! use powerwatch::notify::LogTransport;
//! use powerwatch::storage::MemoryGateway;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig::from_env()?;
//! let monitor = Monitor::new(
//!     &config,
//!     Arc::new(MemoryGateway::new()),
//!     Arc::new(LogTransport::new()),
//! );
//! let outcome = monitor.tick().await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod monitor;
pub mod notify;
pub mod storage;

// Re-export commonly used types
pub use config::{ConfigError, MonitorConfig};
pub use data::{Action, DispatchOutcome, MonitorEvent, PowerState, Transition};
pub use monitor::{detect, CycleOutcome, Monitor};
pub use storage::{GatewayError, TimeSeriesGateway};
