//! Conversation core for the remedy assistant: the agent loop that drives a
//! model provider and its tools, the orchestrator that wraps each turn in a
//! retry-with-rotation attempt loop, and the framer that maps turn events
//! onto the client wire format.
//!
//! ```rust
//! use rchat::{DONE_SENTINEL, FramedEvent};
//!
//! let frame = FramedEvent::done();
//! assert_eq!(frame.text, DONE_SENTINEL);
//! assert!(frame.is_terminal());
//! ```

mod error;
mod framer;
mod hooks;
mod orchestrator;
mod runner;
mod types;

pub use error::{ChatError, ChatErrorKind};
pub use framer::{DONE_SENTINEL, FrameStatus, FramedEvent, FramedStream, StreamFramer};
pub use hooks::{NoopTurnHooks, TurnHooks};
pub use orchestrator::ConversationOrchestrator;
pub use runner::{AgentLoop, AgentRunner};
pub use types::{ChatEvent, ChatStream, FragmentStream, TurnResult};

pub mod prelude {
    pub use crate::error::{ChatError, ChatErrorKind};
    pub use crate::framer::{DONE_SENTINEL, FrameStatus, FramedEvent, FramedStream, StreamFramer};
    pub use crate::hooks::{NoopTurnHooks, TurnHooks};
    pub use crate::orchestrator::ConversationOrchestrator;
    pub use crate::runner::{AgentLoop, AgentRunner};
    pub use crate::types::{ChatEvent, ChatStream, FragmentStream, TurnResult};
}
