//! Turn result and chat event types shared by the runner and orchestrator.

use std::pin::Pin;

use futures_core::Stream;
use rcommon::{SessionId, UserId};

use crate::ChatError;

/// Outcome of one fully-delivered turn: the accumulated assistant text and
/// how many attempts the orchestrator spent producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub full_text: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Fragment(String),
    TurnComplete(TurnResult),
}

/// Raw assistant-text fragments produced by an [`crate::AgentRunner`].
pub type FragmentStream<'a> = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send + 'a>>;

/// Orchestrated turn events: zero or more fragments, then one terminal
/// `TurnComplete` on success. Failures surface as the stream's error item.
pub type ChatStream<'a> = Pin<Box<dyn Stream<Item = Result<ChatEvent, ChatError>> + Send + 'a>>;
