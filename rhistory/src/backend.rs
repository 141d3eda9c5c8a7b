//! History backend trait and in-memory backend implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rcommon::{BoxFuture, ChatId, UserId};
use rprovider::Role;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::HistoryError;
use crate::types::{
    ChatSummary, DEFAULT_CHAT_TITLE, PROMOTED_TITLE_CHARS, StoredMessage, TITLE_MAX_CHARS,
    WELCOME_MESSAGE, now_unix_secs, relative_time_label, truncate_chars,
};

pub use crate::backends::sqlite::SqliteHistoryBackend;

/// Durable store of per-user chats. Every operation that addresses an
/// existing chat is ownership-checked: a chat id paired with the wrong user
/// behaves as if the chat did not exist.
pub trait HistoryBackend: Send + Sync {
    /// Creates a chat seeded with the assistant welcome message and returns
    /// its id.
    fn create_chat(&self, user_id: UserId) -> BoxFuture<'_, Result<ChatId, HistoryError>>;

    /// Lists up to `limit` of the user's chats, most recently updated first.
    fn list_chats(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ChatSummary>, HistoryError>>;

    /// Full message transcript of one chat, or `None` when the chat does
    /// not exist or belongs to another user.
    fn chat_messages<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
    ) -> BoxFuture<'a, Result<Option<Vec<StoredMessage>>, HistoryError>>;

    /// Appends a message and bumps the chat's update time. Returns `false`
    /// when the chat is missing or owned by another user.
    fn append_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
        role: Role,
        content: &'a str,
    ) -> BoxFuture<'a, Result<bool, HistoryError>>;

    /// Renames the chat, truncating the title to [`TITLE_MAX_CHARS`].
    fn rename_chat<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
        title: &'a str,
    ) -> BoxFuture<'a, Result<bool, HistoryError>>;

    fn delete_chat<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
    ) -> BoxFuture<'a, Result<bool, HistoryError>>;

    /// Appends the user query and, when it is the chat's first user message
    /// (welcome message plus this query), promotes its leading
    /// [`PROMOTED_TITLE_CHARS`] characters into the chat title.
    fn record_user_query<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
        query: &'a str,
    ) -> BoxFuture<'a, Result<bool, HistoryError>> {
        Box::pin(async move {
            if !self
                .append_message(chat_id, user_id, Role::User, query)
                .await?
            {
                return Ok(false);
            }

            if let Some(messages) = self.chat_messages(chat_id, user_id).await?
                && messages.len() == 2
            {
                let title = truncate_chars(query, PROMOTED_TITLE_CHARS);
                self.rename_chat(chat_id, user_id, &title).await?;
            }

            Ok(true)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryBackendConfig {
    Sqlite { path: PathBuf },
    InMemory,
}

impl Default for HistoryBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_history_backend(
    config: HistoryBackendConfig,
) -> Result<Arc<dyn HistoryBackend>, HistoryError> {
    match config {
        HistoryBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteHistoryBackend::new(path)?)),
        HistoryBackendConfig::InMemory => Ok(Arc::new(InMemoryHistoryBackend::new())),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryBackend {
    chats: Mutex<HashMap<ChatId, ChatRecord>>,
    next_id: Mutex<u64>,
}

#[derive(Debug, Clone)]
struct ChatRecord {
    user_id: UserId,
    title: String,
    created_at_secs: i64,
    updated_at_secs: i64,
    messages: Vec<StoredMessage>,
}

impl InMemoryHistoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn chats_mut(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ChatId, ChatRecord>>, HistoryError> {
        self.chats
            .lock()
            .map_err(|_| HistoryError::storage("history backend lock poisoned"))
    }

    fn allocate_id(&self) -> Result<ChatId, HistoryError> {
        let mut next_id = self
            .next_id
            .lock()
            .map_err(|_| HistoryError::storage("history backend lock poisoned"))?;
        *next_id += 1;
        Ok(ChatId::new(format!("chat-{next_id}")))
    }
}

impl HistoryBackend for InMemoryHistoryBackend {
    fn create_chat(&self, user_id: UserId) -> BoxFuture<'_, Result<ChatId, HistoryError>> {
        Box::pin(async move {
            let chat_id = self.allocate_id()?;
            let now = now_unix_secs();
            let record = ChatRecord {
                user_id,
                title: DEFAULT_CHAT_TITLE.to_string(),
                created_at_secs: now,
                updated_at_secs: now,
                messages: vec![StoredMessage {
                    role: Role::Assistant,
                    content: WELCOME_MESSAGE.to_string(),
                    timestamp_secs: now,
                }],
            };

            self.chats_mut()?.insert(chat_id.clone(), record);
            Ok(chat_id)
        })
    }

    fn list_chats(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ChatSummary>, HistoryError>> {
        Box::pin(async move {
            let now = now_unix_secs();
            let chats = self.chats_mut()?;

            let mut owned: Vec<(&ChatId, &ChatRecord)> = chats
                .iter()
                .filter(|(_, record)| record.user_id == user_id)
                .collect();
            owned.sort_by(|(_, a), (_, b)| b.updated_at_secs.cmp(&a.updated_at_secs));

            Ok(owned
                .into_iter()
                .take(limit)
                .map(|(id, record)| ChatSummary {
                    id: id.clone(),
                    title: record.title.clone(),
                    last_activity: relative_time_label(record.updated_at_secs, now),
                    created_at_secs: record.created_at_secs,
                    message_count: record.messages.len(),
                })
                .collect())
        })
    }

    fn chat_messages<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
    ) -> BoxFuture<'a, Result<Option<Vec<StoredMessage>>, HistoryError>> {
        Box::pin(async move {
            let chats = self.chats_mut()?;
            Ok(chats
                .get(chat_id)
                .filter(|record| record.user_id == user_id)
                .map(|record| record.messages.clone()))
        })
    }

    fn append_message<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
        role: Role,
        content: &'a str,
    ) -> BoxFuture<'a, Result<bool, HistoryError>> {
        Box::pin(async move {
            let now = now_unix_secs();
            let mut chats = self.chats_mut()?;

            let Some(record) = chats
                .get_mut(chat_id)
                .filter(|record| record.user_id == user_id)
            else {
                return Ok(false);
            };

            record.messages.push(StoredMessage {
                role,
                content: content.to_string(),
                timestamp_secs: now,
            });
            record.updated_at_secs = now;
            Ok(true)
        })
    }

    fn rename_chat<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
        title: &'a str,
    ) -> BoxFuture<'a, Result<bool, HistoryError>> {
        Box::pin(async move {
            let now = now_unix_secs();
            let mut chats = self.chats_mut()?;

            let Some(record) = chats
                .get_mut(chat_id)
                .filter(|record| record.user_id == user_id)
            else {
                return Ok(false);
            };

            record.title = truncate_chars(title, TITLE_MAX_CHARS);
            record.updated_at_secs = now;
            Ok(true)
        })
    }

    fn delete_chat<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
    ) -> BoxFuture<'a, Result<bool, HistoryError>> {
        Box::pin(async move {
            let mut chats = self.chats_mut()?;
            let owned = chats
                .get(chat_id)
                .is_some_and(|record| record.user_id == user_id);
            if owned {
                chats.remove(chat_id);
            }
            Ok(owned)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_chats_start_with_the_welcome_message() {
        let backend = InMemoryHistoryBackend::new();
        let chat_id = backend.create_chat(UserId::new(1)).await.expect("create");

        let messages = backend
            .chat_messages(&chat_id, UserId::new(1))
            .await
            .expect("messages")
            .expect("chat exists");

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
    }

    #[tokio::test]
    async fn ownership_is_enforced_on_every_operation() {
        let backend = InMemoryHistoryBackend::new();
        let chat_id = backend.create_chat(UserId::new(1)).await.expect("create");

        let other = UserId::new(2);
        assert!(
            backend
                .chat_messages(&chat_id, other)
                .await
                .expect("messages")
                .is_none()
        );
        assert!(
            !backend
                .append_message(&chat_id, other, Role::User, "hi")
                .await
                .expect("append")
        );
        assert!(!backend.rename_chat(&chat_id, other, "x").await.expect("rename"));
        assert!(!backend.delete_chat(&chat_id, other).await.expect("delete"));

        // Still intact for the owner.
        assert!(
            backend
                .chat_messages(&chat_id, UserId::new(1))
                .await
                .expect("messages")
                .is_some()
        );
    }

    #[tokio::test]
    async fn the_first_user_query_promotes_the_title() {
        let backend = InMemoryHistoryBackend::new();
        let user = UserId::new(3);
        let chat_id = backend.create_chat(user).await.expect("create");

        let long_query = "a".repeat(80);
        assert!(
            backend
                .record_user_query(&chat_id, user, &long_query)
                .await
                .expect("record")
        );

        let chats = backend.list_chats(user, 10).await.expect("list");
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title, "a".repeat(PROMOTED_TITLE_CHARS));
        assert_eq!(chats[0].message_count, 2);

        // A second query leaves the promoted title alone.
        backend
            .record_user_query(&chat_id, user, "different question")
            .await
            .expect("record");
        let chats = backend.list_chats(user, 10).await.expect("list");
        assert_eq!(chats[0].title, "a".repeat(PROMOTED_TITLE_CHARS));
    }

    #[tokio::test]
    async fn rename_caps_titles_at_one_hundred_characters() {
        let backend = InMemoryHistoryBackend::new();
        let user = UserId::new(4);
        let chat_id = backend.create_chat(user).await.expect("create");

        let long_title = "t".repeat(150);
        assert!(
            backend
                .rename_chat(&chat_id, user, &long_title)
                .await
                .expect("rename")
        );

        let chats = backend.list_chats(user, 10).await.expect("list");
        assert_eq!(chats[0].title.chars().count(), TITLE_MAX_CHARS);
    }

    #[tokio::test]
    async fn listing_orders_by_most_recent_update() {
        let backend = InMemoryHistoryBackend::new();
        let user = UserId::new(5);
        let first = backend.create_chat(user).await.expect("create");
        let second = backend.create_chat(user).await.expect("create");

        // Touch the first chat so it outranks the second.
        {
            let mut chats = backend.chats_mut().expect("lock");
            chats.get_mut(&first).expect("first").updated_at_secs += 10;
            let second_record = chats.get_mut(&second).expect("second");
            second_record.updated_at_secs -= 10;
        }

        let listed = backend.list_chats(user, 10).await.expect("list");
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[1].id, second);

        let limited = backend.list_chats(user, 1).await.expect("list");
        assert_eq!(limited.len(), 1);
    }
}
