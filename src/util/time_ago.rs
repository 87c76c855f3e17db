//! Coarse relative time labels for post cards.

use time::OffsetDateTime;

/// Label such as "Just now", "5m ago", "3h ago" or "2d ago". Instants in the future read "Just now".
pub fn time_ago(created_at: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = now - created_at;
    let minutes = elapsed.whole_minutes();
    let hours = elapsed.whole_hours();
    let days = elapsed.whole_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}
