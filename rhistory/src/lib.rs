//! Durable chat-history storage: per-user chats with titles, transcripts,
//! and recency labels, behind a backend trait with in-memory and SQLite
//! implementations.
//!
//! ```rust
//! use rhistory::{HistoryBackendConfig, create_history_backend};
//!
//! let backend = create_history_backend(HistoryBackendConfig::InMemory).unwrap();
//! let _ = backend;
//! ```

mod backend;
mod backends;
mod error;
mod types;

pub use backend::{
    HistoryBackend, HistoryBackendConfig, InMemoryHistoryBackend, SqliteHistoryBackend,
    create_history_backend,
};
pub use error::{HistoryError, HistoryErrorKind};
pub use types::{
    ChatSummary, DEFAULT_CHAT_TITLE, DEFAULT_LIST_LIMIT, PROMOTED_TITLE_CHARS, StoredMessage,
    TITLE_MAX_CHARS, WELCOME_MESSAGE, relative_time_label,
};

pub mod prelude {
    pub use crate::backend::{
        HistoryBackend, HistoryBackendConfig, InMemoryHistoryBackend, SqliteHistoryBackend,
        create_history_backend,
    };
    pub use crate::error::{HistoryError, HistoryErrorKind};
    pub use crate::types::{
        ChatSummary, DEFAULT_CHAT_TITLE, DEFAULT_LIST_LIMIT, PROMOTED_TITLE_CHARS, StoredMessage,
        TITLE_MAX_CHARS, WELCOME_MESSAGE, relative_time_label,
    };
}
