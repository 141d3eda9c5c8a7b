//! Common imports for most remedy applications.

pub use crate::{
    assistant_message, build_runtime, parse_history_backend, session_for, system_message,
    tool_message, user, user_message,
};
pub use crate::{
    AssistantRuntime, AssistantRuntimeBuilder, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL,
    RemedyConfig, build_gemini_provider, build_rotating_embedder, default_http_client,
};
pub use crate::{rd_keys, rd_messages, rd_msg};
pub use crate::{
    AgentLoop, AgentRunner, BoxFuture, ChatError, ChatErrorKind, ChatEvent, ChatId, ChatStream,
    ChatSummary, ConversationOrchestrator, CredentialPool, DONE_SENTINEL, DefaultToolRuntime,
    Embedder, EmbedderFactory, FrameStatus, FramedEvent, FramedStream, FragmentStream,
    HistoryBackend, HistoryBackendConfig, HistoryError, InMemoryHistoryBackend,
    KnowledgeSearch, KnowledgeSearchTool, MemoryContext, Message, ModelProvider, ModelRequest,
    ModelResponse, ProviderError, ProviderErrorKind, ProviderId, RetryPolicy, Role,
    RotatingEmbedder, SessionId, SessionRegistry, SqliteHistoryBackend, StoredMessage,
    StreamEvent, StreamFramer, Tool, ToolCall, ToolDefinition, ToolError, ToolExecutionContext,
    ToolExecutionResult, ToolRegistry, ToolRuntime, TurnHooks, TurnResult, UserId, UserSession,
    WebSearch, WebSearchTool, create_history_backend,
};
