//! Small convenience constructors for common types.

use std::path::PathBuf;

use rhistory::HistoryBackendConfig;

use crate::{Message, Role, SessionId, UserId};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::new(Role::System, content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::new(Role::User, content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::new(Role::Assistant, content)
}

pub fn tool_message(content: impl Into<String>) -> Message {
    Message::new(Role::Tool, content)
}

pub fn user(id: i64) -> UserId {
    UserId::new(id)
}

pub fn session_for(user: UserId) -> SessionId {
    SessionId::for_user(user)
}

/// Parses a history backend selector such as `memory`, `sqlite`, or
/// `sqlite:/var/lib/remedy/history.db`.
pub fn parse_history_backend(value: &str) -> Option<HistoryBackendConfig> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "memory" | "in-memory" | "inmemory" => Some(HistoryBackendConfig::InMemory),
        "sqlite" => Some(HistoryBackendConfig::default()),
        _ => value.strip_prefix("sqlite:").map(|path| {
            HistoryBackendConfig::Sqlite {
                path: PathBuf::from(path),
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_helpers_apply_expected_roles() {
        assert_eq!(system_message("a").role, Role::System);
        assert_eq!(user_message("b").role, Role::User);
        assert_eq!(assistant_message("c").role, Role::Assistant);
        assert_eq!(tool_message("d").role, Role::Tool);
    }

    #[test]
    fn user_and_session_helpers_agree() {
        let id = user(42);
        assert_eq!(session_for(id).as_str(), "sess-42");
    }

    #[test]
    fn parse_history_backend_supports_aliases_and_paths() {
        assert_eq!(
            parse_history_backend("memory"),
            Some(HistoryBackendConfig::InMemory)
        );
        assert_eq!(
            parse_history_backend("In-Memory"),
            Some(HistoryBackendConfig::InMemory)
        );
        assert_eq!(
            parse_history_backend("sqlite:/tmp/history.db"),
            Some(HistoryBackendConfig::Sqlite {
                path: PathBuf::from("/tmp/history.db")
            })
        );
        assert!(parse_history_backend("sqlite").is_some());
        assert_eq!(parse_history_backend("postgres"), None);
    }
}
