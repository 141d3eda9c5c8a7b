//! Credential ring with in-memory secrets and cursor rotation.
//!
//! ```rust
//! use rprovider::CredentialPool;
//!
//! let pool = CredentialPool::new(vec!["key-a".into(), "key-b".into()]).unwrap();
//! assert_eq!(pool.active_index().unwrap(), 0);
//! pool.rotate().unwrap();
//! assert_eq!(pool.active_index().unwrap(), 1);
//! pool.rotate().unwrap();
//! assert_eq!(pool.active_index().unwrap(), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use crate::ProviderError;

/// API key storage that never appears in debug output and is zeroed on drop.
#[derive(PartialEq, Eq)]
pub struct SecretString {
    value: String,
}

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        unsafe {
            self.value.as_mut_vec().fill(0);
        }
    }
}

/// Lifecycle notifications for credential rotation. Implementations must be
/// cheap; they run inline on the rotating task.
pub trait CredentialHooks: Send + Sync {
    fn on_rotation(&self, _previous_index: usize, _active_index: usize, _pool_size: usize) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCredentialHooks;

impl CredentialHooks for NoopCredentialHooks {}

/// Ordered ring of interchangeable upstream API keys.
///
/// Rotation is deliberately decoupled from any failing call: callers rotate
/// and then retry on their own schedule. With a single-entry pool a rotation
/// wraps back to the same key, so rotation never guarantees a different
/// usable credential, only the next one in ring order. The cursor is shared
/// by every in-flight turn; concurrent rotations interleave arbitrarily and
/// the pool only promises eventual rotation, not exact-order rotation.
pub struct CredentialPool {
    keys: Vec<SecretString>,
    cursor: Mutex<usize>,
    hooks: Arc<dyn CredentialHooks>,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Result<Self, ProviderError> {
        Self::with_hooks(keys, Arc::new(NoopCredentialHooks))
    }

    pub fn with_hooks(
        keys: Vec<String>,
        hooks: Arc<dyn CredentialHooks>,
    ) -> Result<Self, ProviderError> {
        if keys.is_empty() {
            return Err(ProviderError::authentication(
                "credential pool must not be empty",
            ));
        }

        let keys: Vec<SecretString> = keys.into_iter().map(SecretString::new).collect();
        if keys.iter().any(SecretString::is_empty) {
            return Err(ProviderError::authentication(
                "credential pool entries must not be empty",
            ));
        }

        Ok(Self {
            keys,
            cursor: Mutex::new(0),
            hooks,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn active_index(&self) -> Result<usize, ProviderError> {
        Ok(*self.cursor()?)
    }

    /// Exposes the active credential to `f` without cloning the secret.
    pub fn current<R>(&self, f: impl FnOnce(&str) -> R) -> Result<R, ProviderError> {
        let index = *self.cursor()?;
        Ok(f(self.keys[index].expose()))
    }

    /// Advances the cursor one position with wrap-around and returns the new
    /// active index.
    pub fn rotate(&self) -> Result<usize, ProviderError> {
        let mut cursor = self.cursor()?;
        let previous = *cursor;
        *cursor = (previous + 1) % self.keys.len();
        let active = *cursor;
        drop(cursor);

        self.hooks.on_rotation(previous, active, self.keys.len());
        Ok(active)
    }

    fn cursor(&self) -> Result<MutexGuard<'_, usize>, ProviderError> {
        self.cursor
            .lock()
            .map_err(|_| ProviderError::other("credential pool lock poisoned"))
    }
}

impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPool")
            .field("keys", &format!("[{} REDACTED]", self.keys.len()))
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn construction_rejects_empty_pool_and_empty_entries() {
        let err = CredentialPool::new(Vec::new()).expect_err("empty pool must fail");
        assert_eq!(err.kind, crate::ProviderErrorKind::Authentication);

        let err = CredentialPool::new(vec!["key".into(), String::new()])
            .expect_err("empty entry must fail");
        assert_eq!(err.kind, crate::ProviderErrorKind::Authentication);
    }

    #[test]
    fn rotation_is_cyclic_over_the_pool() {
        let pool = CredentialPool::new(vec!["a".into(), "b".into(), "c".into()])
            .expect("pool should build");

        for k in 1..=7 {
            let index = pool.rotate().expect("rotate should work");
            assert_eq!(index, k % 3);
        }
        assert_eq!(pool.active_index().expect("index"), 1);
    }

    #[test]
    fn single_credential_pool_rotates_to_itself() {
        let pool = CredentialPool::new(vec!["only".into()]).expect("pool should build");
        assert_eq!(pool.rotate().expect("rotate"), 0);
        assert_eq!(pool.rotate().expect("rotate"), 0);
        pool.current(|key| assert_eq!(key, "only")).expect("current");
    }

    #[test]
    fn current_tracks_the_cursor() {
        let pool =
            CredentialPool::new(vec!["first".into(), "second".into()]).expect("pool should build");
        assert_eq!(pool.current(str::to_string).expect("current"), "first");
        pool.rotate().expect("rotate");
        assert_eq!(pool.current(str::to_string).expect("current"), "second");
    }

    #[test]
    fn rotation_reports_hook_events() {
        #[derive(Default)]
        struct Recorder {
            events: Mutex<Vec<(usize, usize, usize)>>,
        }

        impl CredentialHooks for Recorder {
            fn on_rotation(&self, previous: usize, active: usize, size: usize) {
                self.events
                    .lock()
                    .expect("events lock")
                    .push((previous, active, size));
            }
        }

        let recorder = Arc::new(Recorder::default());
        let pool = CredentialPool::with_hooks(vec!["a".into(), "b".into()], recorder.clone())
            .expect("pool should build");

        pool.rotate().expect("rotate");
        pool.rotate().expect("rotate");

        let events = recorder.events.lock().expect("events lock").clone();
        assert_eq!(events, vec![(0, 1, 2), (1, 0, 2)]);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let pool = CredentialPool::new(vec!["super-secret".into()]).expect("pool should build");
        let rendered = format!("{pool:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));

        let secret = SecretString::new("hidden");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
    }
}
