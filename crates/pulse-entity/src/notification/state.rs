//! Notification pipeline state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pulse_core::error::AppError;

/// Pipeline position of a notification.
///
/// Transitions are monotonic: pending → sent → delivered → read.
/// `Failed` is reachable only from `Pending` or `Sent`. `Read` is
/// terminal; a recipient marking a failed record as read is the one
/// permitted exit from `Failed` (the read-flag invariant wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    #[default]
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl NotificationState {
    /// The wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    /// Whether `self → next` is a legal transition.
    pub fn can_transition(self, next: NotificationState) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Sent)
                | (Self::Pending, Self::Delivered)
                | (Self::Pending, Self::Read)
                | (Self::Pending, Self::Failed)
                | (Self::Sent, Self::Delivered)
                | (Self::Sent, Self::Read)
                | (Self::Sent, Self::Failed)
                | (Self::Delivered, Self::Read)
                | (Self::Failed, Self::Read)
        )
    }

    /// Whether no further delivery work will happen in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Read | Self::Failed)
    }
}

impl fmt::Display for NotificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            other => Err(AppError::validation(format!("Unknown state: '{other}'"))),
        }
    }
}

impl TryFrom<String> for NotificationState {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_is_terminal() {
        for next in [
            NotificationState::Pending,
            NotificationState::Sent,
            NotificationState::Delivered,
            NotificationState::Failed,
        ] {
            assert!(!NotificationState::Read.can_transition(next));
        }
    }

    #[test]
    fn failed_only_from_pending_or_sent() {
        assert!(NotificationState::Pending.can_transition(NotificationState::Failed));
        assert!(NotificationState::Sent.can_transition(NotificationState::Failed));
        assert!(!NotificationState::Delivered.can_transition(NotificationState::Failed));
        assert!(!NotificationState::Read.can_transition(NotificationState::Failed));
    }
}
