//! Tracing-based observability hooks for retries, credential rotation, tool
//! execution, and turn orchestration.
//!
//! ```rust
//! use robserve::TracingObservabilityHooks;
//! use rchat::TurnHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use rchat::{ChatError, TurnHooks};
use rcommon::UserId;
use rprovider::{CredentialHooks, ProviderError, RetryHooks};
use rtooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl RetryHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "retry",
            event = "attempt_start",
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "retry",
            event = "retry_scheduled",
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, operation: &str, attempts: u32) {
        tracing::info!(phase = "retry", event = "success", operation, attempts);
    }

    fn on_failure(&self, operation: &str, attempts: u32, error: &ProviderError) {
        tracing::error!(
            phase = "retry",
            event = "failure",
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl CredentialHooks for TracingObservabilityHooks {
    fn on_rotation(&self, previous_index: usize, active_index: usize, pool_size: usize) {
        tracing::info!(
            phase = "credentials",
            event = "rotation",
            previous_index,
            active_index,
            pool_size
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, tool_call: &rprovider::ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            user_id = %context.user_id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str())
        );
    }

    fn on_execution_success(
        &self,
        tool_call: &rprovider::ToolCall,
        context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            user_id = %context.user_id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        tool_call: &rprovider::ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            user_id = %context.user_id,
            session_id = %context.session_id,
            trace_id = context.trace_id.as_ref().map(|id| id.as_str()),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl TurnHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, user_id: UserId, attempt: u32) {
        tracing::info!(
            phase = "turn",
            event = "attempt_start",
            user_id = %user_id,
            attempt
        );
    }

    fn on_retry_scheduled(&self, user_id: UserId, attempt: u32, delay: Duration, error: &ChatError) {
        tracing::warn!(
            phase = "turn",
            event = "retry_scheduled",
            user_id = %user_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }

    fn on_turn_complete(&self, user_id: UserId, attempts: u32) {
        tracing::info!(
            phase = "turn",
            event = "turn_complete",
            user_id = %user_id,
            attempts
        );
    }

    fn on_turn_failed(&self, user_id: UserId, attempts: u32, error: &ChatError) {
        tracing::error!(
            phase = "turn",
            event = "turn_failed",
            user_id = %user_id,
            attempts,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
