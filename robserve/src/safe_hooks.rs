use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use rchat::{ChatError, TurnHooks};
use rcommon::UserId;
use rprovider::{CredentialHooks, ProviderError, RetryHooks};
use rtooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

pub struct SafeRetryHooks<H> {
    inner: H,
}

impl<H> SafeRetryHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> RetryHooks for SafeRetryHooks<H>
where
    H: RetryHooks,
{
    fn on_attempt_start(&self, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_retry_scheduled(operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_success(operation, attempts)));
    }

    fn on_failure(&self, operation: &str, attempts: u32, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(operation, attempts, error)
        }));
    }
}

pub struct SafeCredentialHooks<H> {
    inner: H,
}

impl<H> SafeCredentialHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> CredentialHooks for SafeCredentialHooks<H>
where
    H: CredentialHooks,
{
    fn on_rotation(&self, previous_index: usize, active_index: usize, pool_size: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_rotation(previous_index, active_index, pool_size)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, tool_call: &rprovider::ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(tool_call, context)
        }));
    }

    fn on_execution_success(
        &self,
        tool_call: &rprovider::ToolCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(tool_call, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        tool_call: &rprovider::ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(tool_call, context, error, elapsed)
        }));
    }
}

pub struct SafeTurnHooks<H> {
    inner: H,
}

impl<H> SafeTurnHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TurnHooks for SafeTurnHooks<H>
where
    H: TurnHooks,
{
    fn on_attempt_start(&self, user_id: UserId, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(user_id, attempt)
        }));
    }

    fn on_retry_scheduled(&self, user_id: UserId, attempt: u32, delay: Duration, error: &ChatError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_retry_scheduled(user_id, attempt, delay, error)
        }));
    }

    fn on_turn_complete(&self, user_id: UserId, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_complete(user_id, attempts)
        }));
    }

    fn on_turn_failed(&self, user_id: UserId, attempts: u32, error: &ChatError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_failed(user_id, attempts, error)
        }));
    }
}
