//! Production-friendly observability hooks for retries, credential rotation,
//! tool execution, and turn orchestration.
//!
//! ```rust
//! use robserve::{MetricsObservabilityHooks, SafeTurnHooks, TracingObservabilityHooks};
//!
//! let _turn_hooks = SafeTurnHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeCredentialHooks, SafeRetryHooks, SafeToolHooks, SafeTurnHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeCredentialHooks, SafeRetryHooks, SafeToolHooks,
        SafeTurnHooks, TracingObservabilityHooks,
    };
}
