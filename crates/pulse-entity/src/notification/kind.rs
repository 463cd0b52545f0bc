//! The closed notification category enumeration.
//!
//! The set of kinds is part of the external contract: unknown values are
//! rejected at the ingress boundary, and new variants are added only via
//! a contract change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pulse_core::error::AppError;

/// Notification category.
///
/// Kinds are display categories only; no behavior branches on them
/// outside filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Message,
    Match,
    Like,
    SuperLike,
    Rizz,
    Connection,
    System,
    Promotional,
    Reminder,
    Update,
    Alert,
    Warning,
    Error,
    Success,
    Info,
    Achievement,
    Event,
    Social,
    Payment,
    Security,
    Maintenance,
    DateRequest,
    DateAccepted,
    DateDeclined,
    DateCanceled,
    DateReminder,
}

impl NotificationKind {
    /// All kinds, in declaration order.
    pub const ALL: [NotificationKind; 26] = [
        Self::Message,
        Self::Match,
        Self::Like,
        Self::SuperLike,
        Self::Rizz,
        Self::Connection,
        Self::System,
        Self::Promotional,
        Self::Reminder,
        Self::Update,
        Self::Alert,
        Self::Warning,
        Self::Error,
        Self::Success,
        Self::Info,
        Self::Achievement,
        Self::Event,
        Self::Social,
        Self::Payment,
        Self::Security,
        Self::Maintenance,
        Self::DateRequest,
        Self::DateAccepted,
        Self::DateDeclined,
        Self::DateCanceled,
        Self::DateReminder,
    ];

    /// The wire/storage representation (kebab-case).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Match => "match",
            Self::Like => "like",
            Self::SuperLike => "super-like",
            Self::Rizz => "rizz",
            Self::Connection => "connection",
            Self::System => "system",
            Self::Promotional => "promotional",
            Self::Reminder => "reminder",
            Self::Update => "update",
            Self::Alert => "alert",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
            Self::Info => "info",
            Self::Achievement => "achievement",
            Self::Event => "event",
            Self::Social => "social",
            Self::Payment => "payment",
            Self::Security => "security",
            Self::Maintenance => "maintenance",
            Self::DateRequest => "date-request",
            Self::DateAccepted => "date-accepted",
            Self::DateDeclined => "date-declined",
            Self::DateCanceled => "date-canceled",
            Self::DateReminder => "date-reminder",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown notification type: '{s}'")))
    }
}

impl TryFrom<String> for NotificationKind {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, AppError> {
        value.parse()
    }
}
