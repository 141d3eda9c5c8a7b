//! Process-wide registry mapping user identities to their sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rcommon::{SessionId, UserId};

use crate::{MemoryContext, SessionError};

/// One user's conversational session: a stable session identifier plus the
/// memory context consulted and updated across that user's turns.
#[derive(Debug)]
pub struct UserSession {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub memory: MemoryContext,
}

impl UserSession {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            session_id: SessionId::for_user(user_id),
            memory: MemoryContext::new(),
        }
    }
}

#[derive(Debug)]
struct SessionEntry {
    session: Arc<UserSession>,
    last_used: u64,
}

/// Lazily-created, per-user session cache.
///
/// Sessions are created on first contact and reused afterward; nothing
/// evicts them by default, so the registry grows with the distinct-user
/// count until process exit. `with_capacity` opts into bounded-LRU
/// eviction instead. Two tasks racing on the same new user id may both
/// construct a session; the first registration wins and the loser's
/// construction is discarded, which costs one wasted allocation and
/// nothing else.
#[derive(Debug)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<UserId, SessionEntry>>,
    capacity: Option<usize>,
    clock: Mutex<u64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: None,
            clock: Mutex::new(0),
        }
    }

    /// Bounded variant: keeps at most `capacity` sessions, evicting the
    /// least-recently-used one to admit a new user.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: Some(capacity.max(1)),
            clock: Mutex::new(0),
        }
    }

    pub fn get_or_create(&self, user_id: UserId) -> Result<Arc<UserSession>, SessionError> {
        let stamp = self.tick()?;
        let mut entries = self.entries_mut()?;

        if let Some(capacity) = self.capacity
            && !entries.contains_key(&user_id)
            && entries.len() >= capacity
        {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        let entry = entries.entry(user_id).or_insert_with(|| SessionEntry {
            session: Arc::new(UserSession::new(user_id)),
            last_used: stamp,
        });
        entry.last_used = stamp;
        Ok(Arc::clone(&entry.session))
    }

    pub fn evict(&self, user_id: UserId) -> Result<bool, SessionError> {
        Ok(self.entries_mut()?.remove(&user_id).is_some())
    }

    pub fn contains(&self, user_id: UserId) -> Result<bool, SessionError> {
        Ok(self.entries_mut()?.contains_key(&user_id))
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.entries_mut()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.entries_mut()?.is_empty())
    }

    fn tick(&self) -> Result<u64, SessionError> {
        let mut clock = self
            .clock
            .lock()
            .map_err(|_| SessionError::registry("session registry clock poisoned"))?;
        *clock += 1;
        Ok(*clock)
    }

    fn entries_mut(&self) -> Result<MutexGuard<'_, HashMap<UserId, SessionEntry>>, SessionError> {
        self.entries
            .lock()
            .map_err(|_| SessionError::registry("session registry lock poisoned"))
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_users_get_distinct_contexts() {
        let registry = SessionRegistry::new();
        let a = registry.get_or_create(UserId::new(1)).expect("session a");
        let b = registry.get_or_create(UserId::new(2)).expect("session b");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn repeated_calls_return_the_identical_session() {
        let registry = SessionRegistry::new();
        let first = registry.get_or_create(UserId::new(42)).expect("session");
        first
            .memory
            .record(rprovider::Role::User, "remember me")
            .expect("record");

        let second = registry.get_or_create(UserId::new(42)).expect("session");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.memory.len().expect("len"), 1);
        assert_eq!(second.session_id.as_str(), "sess-42");
    }

    #[test]
    fn evict_removes_only_the_named_user() {
        let registry = SessionRegistry::new();
        registry.get_or_create(UserId::new(1)).expect("session");
        registry.get_or_create(UserId::new(2)).expect("session");

        assert!(registry.evict(UserId::new(1)).expect("evict"));
        assert!(!registry.evict(UserId::new(1)).expect("evict"));
        assert!(registry.contains(UserId::new(2)).expect("contains"));
        assert_eq!(registry.len().expect("len"), 1);
    }

    #[test]
    fn unbounded_registry_never_evicts() {
        let registry = SessionRegistry::new();
        for id in 0..100 {
            registry.get_or_create(UserId::new(id)).expect("session");
        }
        assert_eq!(registry.len().expect("len"), 100);
    }

    #[test]
    fn bounded_registry_evicts_least_recently_used() {
        let registry = SessionRegistry::with_capacity(2);
        registry.get_or_create(UserId::new(1)).expect("session");
        registry.get_or_create(UserId::new(2)).expect("session");

        // Touch user 1 so user 2 becomes the eviction candidate.
        registry.get_or_create(UserId::new(1)).expect("session");
        registry.get_or_create(UserId::new(3)).expect("session");

        assert!(registry.contains(UserId::new(1)).expect("contains"));
        assert!(!registry.contains(UserId::new(2)).expect("contains"));
        assert!(registry.contains(UserId::new(3)).expect("contains"));
    }
}
