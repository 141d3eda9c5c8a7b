//! Upstream provider layer: error taxonomy, credential rotation, retry
//! policies, streaming contracts, and the Gemini adapter.
//!
//! ```rust
//! use rprovider::{CredentialPool, RetryPolicy, is_quota_signature};
//! use std::time::Duration;
//!
//! let pool = CredentialPool::new(vec!["key-a".into(), "key-b".into()]).unwrap();
//! let policy = RetryPolicy::fixed(5, Duration::from_secs(5));
//!
//! assert_eq!(pool.len(), 2);
//! assert_eq!(policy.max_attempts, 5);
//! assert!(is_quota_signature("quota exceeded"));
//! ```

mod adapters;
mod credentials;
mod embedding;
mod error;
mod model;
mod provider;
mod resilience;
mod stream;

pub mod prelude {
    pub use crate::{
        CredentialHooks, CredentialPool, Embedder, EmbedderFactory, Message, ModelProvider,
        ModelRequest, ModelResponse, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId,
        RetryHooks, RetryPolicy, Role, RotatingEmbedder, Sleeper, StreamEvent, ToolCall,
        ToolDefinition, ToolResult, is_quota_signature,
    };
}

pub use credentials::{CredentialHooks, CredentialPool, NoopCredentialHooks, SecretString};
pub use embedding::{Embedder, EmbedderFactory, RotatingEmbedder};
pub use error::{ProviderError, ProviderErrorKind, is_quota_signature};
pub use model::{
    Message, ModelRequest, ModelResponse, OutputItem, ProviderId, Role, StopReason, TokenUsage,
    ToolCall, ToolDefinition, ToolResult,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use resilience::{
    NoopRetryHooks, NoopSleeper, RetryHooks, RetryPolicy, Sleeper, TimerSleeper,
    execute_with_retry,
};
pub use stream::{BoxedEventStream, ModelEventStream, StreamEvent, VecEventStream};

#[cfg(feature = "provider-gemini")]
pub use adapters::gemini;
