//! Operational hooks reported by the orchestrator's attempt loop.

use std::time::Duration;

use rcommon::UserId;

use crate::ChatError;

pub trait TurnHooks: Send + Sync {
    fn on_attempt_start(&self, _user_id: UserId, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _user_id: UserId,
        _attempt: u32,
        _delay: Duration,
        _error: &ChatError,
    ) {
    }

    fn on_turn_complete(&self, _user_id: UserId, _attempts: u32) {}

    fn on_turn_failed(&self, _user_id: UserId, _attempts: u32, _error: &ChatError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnHooks;

impl TurnHooks for NoopTurnHooks {}
