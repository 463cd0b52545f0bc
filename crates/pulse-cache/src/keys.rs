//! Cache key builders for all Pulse cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses. Every recipient-scoped key
//! starts with the same `pulse:notif:<recipient>` stem so one pattern
//! delete invalidates all of a recipient's cached reads.

use uuid::Uuid;

/// Prefix applied to all Pulse cache keys.
const PREFIX: &str = "pulse";

/// Cache key for a paginated notification list query.
///
/// `filter_token` and `sort_token` must encode every predicate that
/// affects the result, so distinct queries never share an entry.
pub fn notification_list(
    recipient_id: Uuid,
    filter_token: &str,
    sort_token: &str,
    limit: i64,
    offset: i64,
) -> String {
    format!("{PREFIX}:notif:{recipient_id}:list:{filter_token}:{sort_token}:l{limit}:o{offset}")
}

/// Cache key for a recipient's unread count. `kind_token` is the kind's
/// wire name, or `"*"` when the count spans all kinds.
pub fn unread_count(recipient_id: Uuid, kind_token: &str) -> String {
    format!("{PREFIX}:notif:{recipient_id}:unread:{kind_token}")
}

/// Cache key for a recipient's grouped-by-kind summary. `options_token`
/// must encode every option affecting the result.
pub fn grouped_summary(recipient_id: Uuid, options_token: &str) -> String {
    format!("{PREFIX}:notif:{recipient_id}:grouped:{options_token}")
}

/// Pattern matching every cached read for one recipient.
pub fn recipient_pattern(recipient_id: Uuid) -> String {
    format!("{PREFIX}:notif:{recipient_id}:*")
}
