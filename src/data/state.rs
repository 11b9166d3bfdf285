use std::fmt;

use chrono::{DateTime, Utc};

/// Mains power state as written by the sensor and by the notification log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    Live,
    Down,
    /// No recent reading, or a stored value we do not recognise
    Unknown,
}

impl PowerState {
    /// Parse a stored `status` value. Anything other than `live`/`down` is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "live" => PowerState::Live,
            "down" => PowerState::Down,
            _ => PowerState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::Live => "live",
            PowerState::Down => "down",
            PowerState::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PowerState::Unknown)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status point read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub state: PowerState,
    pub observed_at: DateTime<Utc>,
}

impl Signal {
    pub fn new(state: PowerState, observed_at: DateTime<Utc>) -> Self {
        Self { state, observed_at }
    }
}

/// Direction of a detected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Power came back
    Up,
    /// Power was lost
    Down,
}

impl Transition {
    /// The state that gets recorded once this transition is announced
    pub fn state(&self) -> PowerState {
        match self {
            Transition::Up => PowerState::Live,
            Transition::Down => PowerState::Down,
        }
    }
}

/// Outcome of one detection cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Skip,
    Notify(Transition),
}
