//! Notification log records

use super::state::PowerState;

/// Id written in place of a provider id when nothing was posted
pub const UNSENT_ID: i64 = -1;

/// Result of handing a message to the notification transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Provider accepted the message and assigned it an id
    Delivered { id: u64 },
    /// Nothing was posted
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn external_id(&self) -> Option<u64> {
        match self {
            DispatchOutcome::Delivered { id } => Some(*id),
            DispatchOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Delivered { .. } => None,
            DispatchOutcome::Failed { reason } => Some(reason),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }

    /// Wire form of the id field: provider id, or `-1` when nothing was posted
    pub fn wire_id(&self) -> i64 {
        match self {
            DispatchOutcome::Delivered { id } => i64::try_from(*id).unwrap_or(UNSENT_ID),
            DispatchOutcome::Failed { .. } => UNSENT_ID,
        }
    }
}

/// One notification attempt, successful or not. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub status: PowerState,
    pub content: String,
    pub outcome: DispatchOutcome,
}

impl MonitorEvent {
    pub fn new(status: PowerState, content: impl Into<String>, outcome: DispatchOutcome) -> Self {
        Self {
            status,
            content: content.into(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_uses_sentinel() {
        let outcome = DispatchOutcome::Failed {
            reason: "403 Forbidden".to_string(),
        };
        assert_eq!(outcome.wire_id(), UNSENT_ID);
        assert_eq!(outcome.external_id(), None);
        assert_eq!(outcome.error(), Some("403 Forbidden"));
    }

    #[test]
    fn test_delivered_outcome() {
        let outcome = DispatchOutcome::Delivered {
            id: 1580661436132757506,
        };
        assert!(outcome.is_delivered());
        assert_eq!(outcome.wire_id(), 1580661436132757506);
        assert_eq!(outcome.error(), None);
    }
}
