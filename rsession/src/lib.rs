//! Per-user session registry and conversational memory contexts.
//!
//! ```rust
//! use rcommon::UserId;
//! use rsession::SessionRegistry;
//!
//! let registry = SessionRegistry::new();
//! let session = registry.get_or_create(UserId::new(42)).unwrap();
//! assert_eq!(session.session_id.as_str(), "sess-42");
//! ```

mod context;
mod error;
mod registry;

pub mod prelude {
    pub use crate::{MemoryContext, SessionError, SessionErrorKind, SessionRegistry, UserSession};
}

pub use context::MemoryContext;
pub use error::{SessionError, SessionErrorKind};
pub use registry::{SessionRegistry, UserSession};
