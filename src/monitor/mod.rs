//! Power change detection and notification bookkeeping
//!
//! Each cycle reads the sensor and the notification log, decides whether the
//! state changed since the last announcement, and if so composes, sends and
//! records a message.

pub mod composer;
pub mod detector;
pub mod dispatcher;
pub mod metrics;
pub mod runner;

pub use composer::NotificationComposer;
pub use detector::{detect, Detection, StateDetector};
pub use dispatcher::NotificationDispatcher;
pub use metrics::{format_elapsed, OutageMetrics, OutageWindow, OUTAGE_WINDOWS};
pub use runner::{CycleOutcome, Monitor};
