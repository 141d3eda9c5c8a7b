//! Metrics-based observability hooks for retries, credential rotation, tool
//! execution, and turn orchestration.
//!
//! ```rust
//! use robserve::MetricsObservabilityHooks;
//! use rprovider::RetryHooks;
//!
//! fn accepts_retry_hooks(_hooks: &dyn RetryHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_retry_hooks(&hooks);
//! ```

use std::time::Duration;

use rchat::{ChatError, TurnHooks};
use rcommon::UserId;
use rprovider::{CredentialHooks, ProviderError, RetryHooks};
use rtooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl RetryHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, operation: &str, _attempt: u32) {
        metrics::counter!(
            "remedy_retry_attempt_start_total",
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "remedy_retry_scheduled_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "remedy_retry_delay_seconds",
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, operation: &str, attempts: u32) {
        metrics::counter!(
            "remedy_retry_success_total",
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "remedy_retry_attempts_per_success",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, operation: &str, attempts: u32, error: &ProviderError) {
        metrics::counter!(
            "remedy_retry_failure_total",
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "remedy_retry_attempts_per_failure",
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl CredentialHooks for MetricsObservabilityHooks {
    fn on_rotation(&self, _previous_index: usize, active_index: usize, _pool_size: usize) {
        metrics::counter!("remedy_credential_rotation_total").increment(1);
        metrics::gauge!("remedy_credential_active_index").set(active_index as f64);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, tool_call: &rprovider::ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "remedy_tool_execution_start_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        tool_call: &rprovider::ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "remedy_tool_execution_success_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "remedy_tool_execution_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        tool_call: &rprovider::ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "remedy_tool_execution_failure_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "remedy_tool_execution_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl TurnHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, _user_id: UserId, _attempt: u32) {
        metrics::counter!("remedy_turn_attempt_start_total").increment(1);
    }

    fn on_retry_scheduled(
        &self,
        _user_id: UserId,
        _attempt: u32,
        delay: Duration,
        error: &ChatError,
    ) {
        metrics::counter!(
            "remedy_turn_retry_scheduled_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("remedy_turn_retry_delay_seconds").record(delay.as_secs_f64());
    }

    fn on_turn_complete(&self, _user_id: UserId, attempts: u32) {
        metrics::counter!("remedy_turn_complete_total").increment(1);
        metrics::histogram!("remedy_turn_attempts_per_success").record(attempts as f64);
    }

    fn on_turn_failed(&self, _user_id: UserId, attempts: u32, error: &ChatError) {
        metrics::counter!(
            "remedy_turn_failed_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("remedy_turn_attempts_per_failure").record(attempts as f64);
    }
}
