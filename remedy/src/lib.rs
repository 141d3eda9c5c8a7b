//! Unified facade over the remedy workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the core remedy crates and provides the configuration and
//! wiring layer that assembles a complete assistant runtime: credential
//! pool, provider, tools, sessions, orchestrator, framer, embedder, and
//! chat history.

mod macros;

pub mod config;
pub mod prelude;
pub mod providers;
pub mod runtime;
pub mod util;

pub use rchat;
pub use rcommon;
pub use rhistory;
pub use robserve;
pub use rprovider;
pub use rsession;
pub use rtooling;

pub use rchat::{
    AgentLoop, AgentRunner, ChatError, ChatErrorKind, ChatEvent, ChatStream,
    ConversationOrchestrator, DONE_SENTINEL, FrameStatus, FramedEvent, FramedStream,
    FragmentStream, NoopTurnHooks, StreamFramer, TurnHooks, TurnResult,
};
pub use rcommon::{BoxFuture, ChatId, MetadataMap, SessionId, TraceId, UserId};
pub use rhistory::{
    ChatSummary, DEFAULT_CHAT_TITLE, DEFAULT_LIST_LIMIT, HistoryBackend, HistoryBackendConfig,
    HistoryError, HistoryErrorKind, InMemoryHistoryBackend, PROMOTED_TITLE_CHARS,
    SqliteHistoryBackend, StoredMessage, TITLE_MAX_CHARS, WELCOME_MESSAGE,
    create_history_backend, relative_time_label,
};
pub use robserve::{
    MetricsObservabilityHooks, SafeCredentialHooks, SafeRetryHooks, SafeToolHooks, SafeTurnHooks,
    TracingObservabilityHooks,
};
pub use rprovider::{
    BoxedEventStream, CredentialHooks, CredentialPool, Embedder, EmbedderFactory, Message,
    ModelEventStream, ModelProvider, ModelRequest, ModelResponse, NoopCredentialHooks,
    NoopRetryHooks, NoopSleeper, OutputItem, ProviderError, ProviderErrorKind, ProviderFuture,
    ProviderId, RetryHooks, RetryPolicy, Role, RotatingEmbedder, SecretString, Sleeper,
    StopReason, StreamEvent, TimerSleeper, TokenUsage, ToolCall, ToolDefinition, ToolResult,
    VecEventStream, execute_with_retry, is_quota_signature,
};
pub use rsession::{MemoryContext, SessionError, SessionErrorKind, SessionRegistry, UserSession};
pub use rtooling::{
    DefaultToolRuntime, FunctionTool, KnowledgeSearch, KnowledgeSearchTool,
    NoopToolRuntimeHooks, Tool, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolExecutionResult, ToolFuture, ToolRegistry, ToolRuntime, ToolRuntimeHooks, WebSearch,
    WebSearchTool,
};

pub use config::{
    API_KEYS_ENV, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL, MODEL_ENV, RemedyConfig,
};
pub use providers::{build_gemini_provider, build_rotating_embedder, default_http_client};
pub use runtime::{AssistantRuntime, AssistantRuntimeBuilder, build_runtime};
pub use util::{
    assistant_message, parse_history_backend, session_for, system_message, tool_message, user,
    user_message,
};

#[cfg(test)]
mod tests {
    use crate::Role;

    #[test]
    fn rd_msg_macro_creates_expected_message() {
        let message = crate::rd_msg!(user => "hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn rd_messages_macro_builds_message_vector() {
        let messages = crate::rd_messages![
            system => "You are a careful medical assistant.",
            user => "I have had a headache for three days.",
        ];

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn rd_keys_macro_builds_a_pool_key_list() {
        let keys = crate::rd_keys!["key-a", "key-b"];
        assert_eq!(keys, vec!["key-a".to_string(), "key-b".to_string()]);
    }
}
