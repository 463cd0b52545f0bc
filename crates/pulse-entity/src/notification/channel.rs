//! Delivery channels and per-channel delivery bookkeeping.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pulse_core::error::AppError;

/// A delivery mechanism for notifications.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Push,
    Email,
    Inapp,
    Socket,
}

impl Channel {
    /// Stable dispatch order used by the delivery engine.
    pub const DISPATCH_ORDER: [Channel; 4] =
        [Self::Push, Self::Email, Self::Inapp, Self::Socket];

    /// The wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::Inapp => "inapp",
            Self::Socket => "socket",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "email" => Ok(Self::Email),
            "inapp" => Ok(Self::Inapp),
            "socket" => Ok(Self::Socket),
            other => Err(AppError::validation(format!("Unknown channel: '{other}'"))),
        }
    }
}

/// Delivery bookkeeping for a single channel of a single notification.
///
/// Mutated only through the store's atomic read-modify-write; the
/// delivery engine never holds an authoritative in-memory copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDelivery {
    /// Whether this channel was requested for the notification.
    pub enabled: bool,
    /// Whether the adapter accepted the dispatch.
    #[serde(default)]
    pub dispatched: bool,
    /// When the adapter accepted the dispatch.
    #[serde(default)]
    pub dispatched_at: Option<DateTime<Utc>>,
    /// Whether delivery to the recipient was confirmed.
    #[serde(default)]
    pub acknowledged: bool,
    /// Last dispatch error, transient or permanent.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Total dispatch attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// When the most recent attempt ran. Drives retry spacing.
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Set on permanent vendor rejection; stops retries early.
    #[serde(default)]
    pub exhausted: bool,
}

impl ChannelDelivery {
    /// Fresh bookkeeping for an enabled channel.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            dispatched: false,
            dispatched_at: None,
            acknowledged: false,
            last_error: None,
            attempts: 0,
            last_attempt_at: None,
            exhausted: false,
        }
    }

    /// Whether no further dispatch attempts will be made for this channel.
    pub fn is_terminal(&self, max_attempts: u32) -> bool {
        self.dispatched || self.exhausted || self.attempts >= max_attempts
    }

    /// Apply a single dispatch outcome to this channel's bookkeeping.
    pub fn apply(&mut self, outcome: &DeliveryOutcome, now: DateTime<Utc>) {
        self.attempts += 1;
        self.last_attempt_at = Some(now);
        match outcome {
            DeliveryOutcome::Accepted => {
                self.dispatched = true;
                self.dispatched_at = Some(now);
                self.last_error = None;
            }
            DeliveryOutcome::Delivered => {
                self.dispatched = true;
                self.dispatched_at.get_or_insert(now);
                self.acknowledged = true;
                self.last_error = None;
            }
            DeliveryOutcome::Transient(reason) => {
                self.last_error = Some(reason.clone());
            }
            DeliveryOutcome::Permanent(reason) => {
                self.last_error = Some(reason.clone());
                self.exhausted = true;
            }
        }
    }
}

/// Result of one adapter dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The vendor accepted the dispatch; delivery confirmation is pending.
    Accepted,
    /// The payload demonstrably reached the recipient (e.g. a live socket).
    Delivered,
    /// A retryable failure: vendor 5xx, timeout, no live session.
    Transient(String),
    /// A non-retryable failure: the channel is done for this record.
    Permanent(String),
}

impl DeliveryOutcome {
    /// Whether this outcome should schedule a retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
