use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rcommon::{BoxFuture, ChatId, UserId};
use rprovider::Role;
use rusqlite::{Connection, OptionalExtension, params};

use crate::backend::HistoryBackend;
use crate::error::HistoryError;
use crate::types::{
    ChatSummary, DEFAULT_CHAT_TITLE, StoredMessage, TITLE_MAX_CHARS, WELCOME_MESSAGE,
    now_unix_secs, relative_time_label, truncate_chars,
};

#[derive(Debug)]
pub struct SqliteHistoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteHistoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                HistoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            HistoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, HistoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            HistoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, HistoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                HistoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, HistoryError> {
        self.connection
            .lock()
            .map_err(|_| HistoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), HistoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                created_at_secs INTEGER NOT NULL,
                updated_at_secs INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chats_user_updated
            ON chats(user_id, updated_at_secs DESC);

            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at_secs INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_messages_chat_id
            ON chat_messages(chat_id, id);
            ",
        )
        .map_err(|error| {
            HistoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    fn insert_message(
        conn: &Connection,
        chat_row_id: i64,
        role: Role,
        content: &str,
        now: i64,
    ) -> Result<(), HistoryError> {
        conn.execute(
            "
            INSERT INTO chat_messages (chat_id, role, content, created_at_secs)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![chat_row_id, role.as_str(), content, now],
        )
        .map_err(|error| HistoryError::storage(format!("failed to write message row: {error}")))?;
        Ok(())
    }

    /// Bumps the chat's update time iff the chat exists and belongs to the
    /// user; doubles as the ownership check for writes.
    fn touch_owned_chat(
        conn: &Connection,
        chat_row_id: i64,
        user_id: UserId,
        now: i64,
    ) -> Result<bool, HistoryError> {
        let updated = conn
            .execute(
                "UPDATE chats SET updated_at_secs = ?1 WHERE id = ?2 AND user_id = ?3",
                params![now, chat_row_id, user_id.as_i64()],
            )
            .map_err(|error| {
                HistoryError::storage(format!("failed to touch chat row: {error}"))
            })?;
        Ok(updated > 0)
    }
}

impl HistoryBackend for SqliteHistoryBackend {
    fn create_chat(&self, user_id: UserId) -> BoxFuture<'_, Result<ChatId, HistoryError>> {
        Box::pin(async move {
            let now = now_unix_secs();
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO chats (user_id, title, created_at_secs, updated_at_secs)
                VALUES (?1, ?2, ?3, ?4)
                ",
                params![user_id.as_i64(), DEFAULT_CHAT_TITLE, now, now],
            )
            .map_err(|error| {
                HistoryError::storage(format!("failed to insert chat row: {error}"))
            })?;

            let chat_row_id = conn.last_insert_rowid();
            Self::insert_message(&conn, chat_row_id, Role::Assistant, WELCOME_MESSAGE, now)?;
            Ok(ChatId::new(chat_row_id.to_string()))
        })
    }

    fn list_chats(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ChatSummary>, HistoryError>> {
        Box::pin(async move {
            let now = now_unix_secs();
            let conn = self.connection()?;
            let mut statement = conn
                .prepare(
                    "
                    SELECT
                        c.id,
                        c.title,
                        c.created_at_secs,
                        c.updated_at_secs,
                        (SELECT COUNT(*) FROM chat_messages m WHERE m.chat_id = c.id)
                    FROM chats c
                    WHERE c.user_id = ?1
                    ORDER BY c.updated_at_secs DESC, c.id DESC
                    LIMIT ?2
                    ",
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to prepare chat listing: {error}"))
                })?;

            let rows = statement
                .query_map(params![user_id.as_i64(), limit as i64], |row| {
                    let id: i64 = row.get(0)?;
                    let title: String = row.get(1)?;
                    let created_at_secs: i64 = row.get(2)?;
                    let updated_at_secs: i64 = row.get(3)?;
                    let message_count: i64 = row.get(4)?;
                    Ok(ChatSummary {
                        id: ChatId::new(id.to_string()),
                        title,
                        last_activity: relative_time_label(updated_at_secs, now),
                        created_at_secs,
                        message_count: message_count as usize,
                    })
                })
                .map_err(|error| {
                    HistoryError::storage(format!("failed to query chat listing: {error}"))
                })?;

            let mut chats = Vec::new();
            for row in rows {
                chats.push(row.map_err(|error| {
                    HistoryError::storage(format!("failed to read chat row: {error}"))
                })?);
            }
            Ok(chats)
        })
    }

    fn chat_messages<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
    ) -> BoxFuture<'a, Result<Option<Vec<StoredMessage>>, HistoryError>> {
        Box::pin(async move {
            let Some(chat_row_id) = parse_chat_row_id(chat_id) else {
                return Ok(None);
            };

            let conn = self.connection()?;
            let owned = conn
                .query_row(
                    "SELECT 1 FROM chats WHERE id = ?1 AND user_id = ?2 LIMIT 1",
                    params![chat_row_id, user_id.as_i64()],
                    |_| Ok(true),
                )
                .optional()
                .map_err(|error| {
                    HistoryError::storage(format!("failed to check chat ownership: {error}"))
                })?
                .unwrap_or(false);

            if !owned {
                return Ok(None);
            }

            let mut statement = conn
                .prepare(
                    "
                    SELECT role, content, created_at_secs
                    FROM chat_messages
                    WHERE chat_id = ?1
                    ORDER BY id ASC
                    ",
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to prepare message query: {error}"))
                })?;

            let rows = statement
                .query_map(params![chat_row_id], |row| {
                    let role: String = row.get(0)?;
                    let content: String = row.get(1)?;
                    let timestamp_secs: i64 = row.get(2)?;
                    Ok((role, content, timestamp_secs))
                })
                .map_err(|error| {
                    HistoryError::storage(format!("failed to query messages: {error}"))
                })?;

            let mut messages = Vec::new();
            for row in rows {
                let (role, content, timestamp_secs) = row.map_err(|error| {
                    HistoryError::storage(format!("failed to read message row: {error}"))
                })?;
                messages.push(StoredMessage {
                    role: role_from_str(&role)?,
                    content,
                    timestamp_secs,
                });
            }
            Ok(Some(messages))
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
            let Some(chat_row_id) = parse_chat_row_id(chat_id) else {
                return Ok(false);
            };

            let now = now_unix_secs();
            let conn = self.connection()?;
            if !Self::touch_owned_chat(&conn, chat_row_id, user_id, now)? {
                return Ok(false);
            }

            Self::insert_message(&conn, chat_row_id, role, content, now)?;
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
            let Some(chat_row_id) = parse_chat_row_id(chat_id) else {
                return Ok(false);
            };

            let title = truncate_chars(title, TITLE_MAX_CHARS);
            let now = now_unix_secs();
            let conn = self.connection()?;
            let updated = conn
                .execute(
                    "
                    UPDATE chats SET title = ?1, updated_at_secs = ?2
                    WHERE id = ?3 AND user_id = ?4
                    ",
                    params![title, now, chat_row_id, user_id.as_i64()],
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to rename chat: {error}"))
                })?;
            Ok(updated > 0)
        })
    }

    fn delete_chat<'a>(
        &'a self,
        chat_id: &'a ChatId,
        user_id: UserId,
    ) -> BoxFuture<'a, Result<bool, HistoryError>> {
        Box::pin(async move {
            let Some(chat_row_id) = parse_chat_row_id(chat_id) else {
                return Ok(false);
            };

            let conn = self.connection()?;
            let deleted = conn
                .execute(
                    "DELETE FROM chats WHERE id = ?1 AND user_id = ?2",
                    params![chat_row_id, user_id.as_i64()],
                )
                .map_err(|error| {
                    HistoryError::storage(format!("failed to delete chat: {error}"))
                })?;

            if deleted == 0 {
                return Ok(false);
            }

            conn.execute(
                "DELETE FROM chat_messages WHERE chat_id = ?1",
                params![chat_row_id],
            )
            .map_err(|error| {
                HistoryError::storage(format!("failed to delete chat messages: {error}"))
            })?;
            Ok(true)
        })
    }
}

fn parse_chat_row_id(chat_id: &ChatId) -> Option<i64> {
    chat_id.as_str().parse::<i64>().ok()
}

fn role_from_str(value: &str) -> Result<Role, HistoryError> {
    match value {
        "system" => Ok(Role::System),
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        "tool" => Ok(Role::Tool),
        other => Err(HistoryError::storage(format!(
            "unknown message role in storage: {other}"
        ))),
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("RHISTORY_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".remedy").join("rhistory.sqlite3");
    }

    PathBuf::from("rhistory.sqlite3")
}

#[cfg(test)]
mod tests {
    use crate::types::{PROMOTED_TITLE_CHARS, WELCOME_MESSAGE};

    use super::*;

    fn backend() -> SqliteHistoryBackend {
        SqliteHistoryBackend::new_in_memory().expect("backend should open")
    }

    #[tokio::test]
    async fn chats_round_trip_through_sqlite() {
        let backend = backend();
        let user = UserId::new(1);

        let chat_id = backend.create_chat(user).await.expect("create");
        backend
            .append_message(&chat_id, user, Role::User, "headache for 3 days")
            .await
            .expect("append");
        backend
            .append_message(&chat_id, user, Role::Assistant, "It could be...")
            .await
            .expect("append");

        let messages = backend
            .chat_messages(&chat_id, user)
            .await
            .expect("messages")
            .expect("chat exists");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);

        let chats = backend.list_chats(user, 10).await.expect("list");
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].message_count, 3);
        assert_eq!(chats[0].last_activity, "Just now");
    }

    #[tokio::test]
    async fn other_users_cannot_see_or_mutate_a_chat() {
        let backend = backend();
        let owner = UserId::new(1);
        let intruder = UserId::new(2);
        let chat_id = backend.create_chat(owner).await.expect("create");

        assert!(
            backend
                .chat_messages(&chat_id, intruder)
                .await
                .expect("messages")
                .is_none()
        );
        assert!(
            !backend
                .append_message(&chat_id, intruder, Role::User, "hi")
                .await
                .expect("append")
        );
        assert!(
            !backend
                .delete_chat(&chat_id, intruder)
                .await
                .expect("delete")
        );
        assert!(backend.list_chats(intruder, 10).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn first_query_promotion_truncates_to_fifty_characters() {
        let backend = backend();
        let user = UserId::new(3);
        let chat_id = backend.create_chat(user).await.expect("create");

        let query = "q".repeat(75);
        assert!(
            backend
                .record_user_query(&chat_id, user, &query)
                .await
                .expect("record")
        );

        let chats = backend.list_chats(user, 10).await.expect("list");
        assert_eq!(chats[0].title, "q".repeat(PROMOTED_TITLE_CHARS));
    }

    #[tokio::test]
    async fn deleting_a_chat_removes_its_messages() {
        let backend = backend();
        let user = UserId::new(4);
        let chat_id = backend.create_chat(user).await.expect("create");

        assert!(backend.delete_chat(&chat_id, user).await.expect("delete"));
        assert!(
            backend
                .chat_messages(&chat_id, user)
                .await
                .expect("messages")
                .is_none()
        );
        assert!(backend.list_chats(user, 10).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn malformed_chat_ids_behave_as_missing() {
        let backend = backend();
        let user = UserId::new(5);
        let bogus = ChatId::from("not-a-row-id");

        assert!(
            backend
                .chat_messages(&bogus, user)
                .await
                .expect("messages")
                .is_none()
        );
        assert!(
            !backend
                .append_message(&bogus, user, Role::User, "hi")
                .await
                .expect("append")
        );
        assert!(!backend.delete_chat(&bogus, user).await.expect("delete"));
    }
}
