//! Shared newtypes and future aliases for the remedy workspace crates.
//!
//! ```rust
//! use rcommon::{MetadataMap, SessionId, UserId};
//!
//! let user = UserId::new(42);
//! let session = SessionId::for_user(user);
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "clinic-a".to_string());
//!
//! assert_eq!(user.as_i64(), 42);
//! assert_eq!(session.as_str(), "sess-42");
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use rcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Identifier newtypes shared across the workspace.
    //!
    //! ```rust
    //! use rcommon::{ChatId, SessionId, TraceId, UserId};
    //!
    //! let user = UserId::from(7);
    //! let session = SessionId::for_user(user);
    //! let chat = ChatId::new("chat-7-1700000000-1");
    //! let trace = TraceId::from("trace-7");
    //!
    //! assert_eq!(session.to_string(), "sess-7");
    //! assert_eq!(chat.as_str(), "chat-7-1700000000-1");
    //! assert_eq!(trace.as_str(), "trace-7");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    /// Opaque caller identity. Requests arrive keyed by this value and all
    /// per-user state (session, memory context) is indexed by it.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct UserId(i64);

    impl UserId {
        pub fn new(value: i64) -> Self {
            Self(value)
        }

        pub fn as_i64(&self) -> i64 {
            self.0
        }
    }

    impl Display for UserId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl From<i64> for UserId {
        fn from(value: i64) -> Self {
            Self(value)
        }
    }

    /// Logical conversation-session identifier. One per user for the
    /// lifetime of the process.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn for_user(user: UserId) -> Self {
            Self(format!("sess-{user}"))
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    /// Durable chat-history document identifier.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct ChatId(String);

    impl ChatId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for ChatId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ChatId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ChatId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub use context::{ChatId, MetadataMap, SessionId, TraceId, UserId};
pub use future::BoxFuture;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_for_user_is_deterministic() {
        let user = UserId::new(42);
        assert_eq!(SessionId::for_user(user), SessionId::for_user(user));
        assert_eq!(SessionId::for_user(user).as_str(), "sess-42");
    }

    #[test]
    fn ids_round_trip_through_display() {
        assert_eq!(UserId::from(-3).to_string(), "-3");
        assert_eq!(ChatId::from("chat-1").to_string(), "chat-1");
        assert_eq!(TraceId::new("t1").to_string(), "t1");
    }
}
