pub mod event;
pub mod state;

pub use event::{DispatchOutcome, MonitorEvent, UNSENT_ID};
pub use state::{Action, PowerState, Signal, Transition};
