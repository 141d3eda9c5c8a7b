//! Per-user conversational memory.

use std::sync::Mutex;

use rprovider::{Message, Role};

use crate::SessionError;

/// Transcript-backed memory for one user. Owned exclusively by that user's
/// session and mutated only during that user's turns. Concurrent turns from
/// the same user share this context; writes interleave last-write-wins with
/// no per-turn isolation.
#[derive(Debug, Default)]
pub struct MemoryContext {
    transcript: Mutex<Vec<Message>>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, role: Role, content: impl Into<String>) -> Result<(), SessionError> {
        self.transcript_mut()?.push(Message::new(role, content));
        Ok(())
    }

    pub fn record_exchange(
        &self,
        user_input: impl Into<String>,
        assistant_output: impl Into<String>,
    ) -> Result<(), SessionError> {
        let mut transcript = self.transcript_mut()?;
        transcript.push(Message::new(Role::User, user_input));
        transcript.push(Message::new(Role::Assistant, assistant_output));
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Vec<Message>, SessionError> {
        Ok(self.transcript_mut()?.clone())
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.transcript_mut()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.transcript_mut()?.is_empty())
    }

    fn transcript_mut(&self) -> Result<std::sync::MutexGuard<'_, Vec<Message>>, SessionError> {
        self.transcript
            .lock()
            .map_err(|_| SessionError::context("memory context lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_exchange_appends_user_then_assistant() {
        let context = MemoryContext::new();
        context
            .record_exchange("headache for 3 days", "It could be...")
            .expect("record should work");

        let transcript = context.snapshot().expect("snapshot");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
        assert_eq!(transcript[1].content, "It could be...");
    }

    #[test]
    fn snapshot_is_a_copy_not_a_view() {
        let context = MemoryContext::new();
        context.record(Role::User, "first").expect("record");

        let before = context.snapshot().expect("snapshot");
        context.record(Role::User, "second").expect("record");

        assert_eq!(before.len(), 1);
        assert_eq!(context.len().expect("len"), 2);
    }
}
