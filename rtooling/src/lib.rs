//! Tool registry and execution runtime for the assistant.
//!
//! Tools are registered by name, resolved from model tool calls, and executed
//! with per-user context attached. The built-in retrieval tools wrap a
//! knowledge-base searcher and a web searcher behind the [`Tool`] contract.
//!
//! ```rust
//! use rtooling::ToolRegistry;
//!
//! let registry = ToolRegistry::new();
//! assert!(registry.is_empty());
//! ```

mod error;
mod hooks;
mod registry;
mod runtime;
mod search;
mod tool;
mod types;

pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use registry::ToolRegistry;
pub use runtime::{DefaultToolRuntime, ToolRuntime};
pub use search::{KnowledgeSearch, KnowledgeSearchTool, WebSearch, WebSearchTool};
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::{ToolExecutionContext, ToolExecutionResult};

pub mod prelude {
    pub use crate::error::{ToolError, ToolErrorKind};
    pub use crate::hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
    pub use crate::registry::ToolRegistry;
    pub use crate::runtime::{DefaultToolRuntime, ToolRuntime};
    pub use crate::search::{KnowledgeSearch, KnowledgeSearchTool, WebSearch, WebSearchTool};
    pub use crate::tool::{FunctionTool, Tool, ToolFuture};
    pub use crate::types::{ToolExecutionContext, ToolExecutionResult};
}
