//! Chat-history records and display helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use rcommon::ChatId;
use rprovider::Role;

/// Title given to a chat at creation, before the first user query promotes
/// its own text into the title.
pub const DEFAULT_CHAT_TITLE: &str = "New chat";

/// Assistant greeting seeded into every new chat.
pub const WELCOME_MESSAGE: &str = "Hello! How can I help you?";

/// Titles are capped at this many characters on rename.
pub const TITLE_MAX_CHARS: usize = 100;

/// A promoted title keeps this many characters of the first user query.
pub const PROMOTED_TITLE_CHARS: usize = 50;

pub const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: ChatId,
    pub title: String,
    /// Human-readable recency label for the chat's last activity.
    pub last_activity: String,
    pub created_at_secs: i64,
    pub message_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub role: Role,
    pub content: String,
    pub timestamp_secs: i64,
}

pub(crate) fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}

pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Renders the recency label shown next to each chat in the list view.
pub fn relative_time_label(then_secs: i64, now_secs: i64) -> String {
    let elapsed = (now_secs - then_secs).max(0);
    let days = elapsed / 86_400;

    if days == 0 {
        let hours = elapsed / 3_600;
        if hours == 0 {
            let minutes = elapsed / 60;
            if minutes == 0 {
                return "Just now".to_string();
            }
            return format!("{minutes} minutes ago");
        }
        return format!("{hours} hours ago");
    }

    if days == 1 {
        return "Yesterday".to_string();
    }

    if days < 7 {
        return format!("{days} days ago");
    }

    let (year, month, day) = civil_from_unix(then_secs);
    format!("{day:02}/{month:02}/{year:04}")
}

// Days-to-civil conversion (proleptic Gregorian), enough to render a date
// for week-old chats without pulling in a calendar dependency.
fn civil_from_unix(secs: i64) -> (i64, u32, u32) {
    let days = secs.div_euclid(86_400);
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = if month <= 2 { year + 1 } else { year };
    (year, month, day)
}
