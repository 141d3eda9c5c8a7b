//! Embedding client contracts and the credential-rotating wrapper.
//!
//! The embedding path carries its own retry domain, tuned separately from
//! the turn orchestrator: 4 attempts with exponential backoff from 40 time
//! units capped at 60. Unlike the orchestrator, it only rotates credentials
//! when the error text carries the quota signature; other failures re-raise
//! untouched so backoff still applies.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    CredentialPool, ProviderError, ProviderFuture, RetryHooks, RetryPolicy, Sleeper, TimerSleeper,
    execute_with_retry, is_quota_signature, resilience::NoopRetryHooks,
};

pub trait Embedder: Send + Sync {
    fn embed_query<'a>(
        &'a self,
        text: &'a str,
    ) -> ProviderFuture<'a, Result<Vec<f32>, ProviderError>>;

    fn embed_documents<'a>(
        &'a self,
        texts: &'a [String],
    ) -> ProviderFuture<'a, Result<Vec<Vec<f32>>, ProviderError>>;
}

/// Builds a concrete embedder bound to one API key. The rotating wrapper
/// rebuilds through this after every credential rotation.
pub trait EmbedderFactory: Send + Sync {
    fn build(&self, api_key: &str) -> Arc<dyn Embedder>;
}

impl<F> EmbedderFactory for F
where
    F: Fn(&str) -> Arc<dyn Embedder> + Send + Sync,
{
    fn build(&self, api_key: &str) -> Arc<dyn Embedder> {
        self(api_key)
    }
}

pub struct RotatingEmbedder {
    pool: Arc<CredentialPool>,
    factory: Arc<dyn EmbedderFactory>,
    inner: Mutex<Arc<dyn Embedder>>,
    policy: RetryPolicy,
    hooks: Arc<dyn RetryHooks>,
    sleeper: Arc<dyn Sleeper>,
}

impl RotatingEmbedder {
    pub fn new(
        pool: Arc<CredentialPool>,
        factory: Arc<dyn EmbedderFactory>,
    ) -> Result<Self, ProviderError> {
        let inner = pool.current(|key| factory.build(key))?;
        Ok(Self {
            pool,
            factory,
            inner: Mutex::new(inner),
            policy: RetryPolicy::exponential(4, Duration::from_secs(40), Duration::from_secs(60)),
            hooks: Arc::new(NoopRetryHooks),
            sleeper: Arc::new(TimerSleeper),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RetryHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        execute_with_retry(
            "embed_query",
            &self.policy,
            self.hooks.as_ref(),
            &self.sleeper,
            |_| async move {
                let embedder = self.active_embedder()?;
                match embedder.embed_query(text).await {
                    Ok(vector) => Ok(vector),
                    Err(error) => {
                        self.rotate_on_quota(&error)?;
                        Err(error)
                    }
                }
            },
        )
        .await
    }

    pub async fn embed_documents(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        execute_with_retry(
            "embed_documents",
            &self.policy,
            self.hooks.as_ref(),
            &self.sleeper,
            |_| async move {
                let embedder = self.active_embedder()?;
                match embedder.embed_documents(texts).await {
                    Ok(vectors) => Ok(vectors),
                    Err(error) => {
                        self.rotate_on_quota(&error)?;
                        Err(error)
                    }
                }
            },
        )
        .await
    }

    fn active_embedder(&self) -> Result<Arc<dyn Embedder>, ProviderError> {
        self.inner
            .lock()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| ProviderError::other("rotating embedder lock poisoned"))
    }

    /// Rotates and rebinds the inner embedder when the failure carries the
    /// quota signature. The error is always re-raised by the caller so the
    /// retry executor's backoff applies either way.
    fn rotate_on_quota(&self, error: &ProviderError) -> Result<(), ProviderError> {
        if !is_quota_signature(&error.message) {
            return Ok(());
        }

        self.pool.rotate()?;
        let rebuilt = self.pool.current(|key| self.factory.build(key))?;
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| ProviderError::other("rotating embedder lock poisoned"))?;
        *inner = rebuilt;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{NoopSleeper, ProviderErrorKind};

    struct ScriptedEmbedder {
        api_key: String,
        calls: Arc<AtomicU32>,
        failures_before_success: u32,
        error_message: String,
    }

    impl Embedder for ScriptedEmbedder {
        fn embed_query<'a>(
            &'a self,
            text: &'a str,
        ) -> ProviderFuture<'a, Result<Vec<f32>, ProviderError>> {
            Box::pin(async move {
                let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call <= self.failures_before_success {
                    Err(ProviderError::classify(self.error_message.clone()))
                } else {
                    Ok(vec![text.len() as f32, self.api_key.len() as f32])
                }
            })
        }

        fn embed_documents<'a>(
            &'a self,
            texts: &'a [String],
        ) -> ProviderFuture<'a, Result<Vec<Vec<f32>>, ProviderError>> {
            Box::pin(async move { Ok(texts.iter().map(|t| vec![t.len() as f32]).collect()) })
        }
    }

    fn scripted_factory(
        calls: Arc<AtomicU32>,
        failures_before_success: u32,
        error_message: &str,
    ) -> Arc<dyn EmbedderFactory> {
        let error_message = error_message.to_string();
        Arc::new(move |api_key: &str| {
            Arc::new(ScriptedEmbedder {
                api_key: api_key.to_string(),
                calls: Arc::clone(&calls),
                failures_before_success,
                error_message: error_message.clone(),
            }) as Arc<dyn Embedder>
        })
    }

    #[tokio::test]
    async fn quota_error_rotates_key_and_retry_succeeds() {
        let pool = Arc::new(
            CredentialPool::new(vec!["key-a".into(), "key-b".into()]).expect("pool should build"),
        );
        let calls = Arc::new(AtomicU32::new(0));
        let embedder = RotatingEmbedder::new(
            Arc::clone(&pool),
            scripted_factory(Arc::clone(&calls), 1, "429 quota exceeded"),
        )
        .expect("embedder should build")
        .with_sleeper(Arc::new(NoopSleeper));

        let vector = embedder.embed_query("hi").await.expect("should succeed");
        assert_eq!(vector.len(), 2);
        assert_eq!(pool.active_index().expect("index"), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_quota_error_retries_without_rotating() {
        let pool = Arc::new(
            CredentialPool::new(vec!["key-a".into(), "key-b".into()]).expect("pool should build"),
        );
        let calls = Arc::new(AtomicU32::new(0));
        let embedder = RotatingEmbedder::new(
            Arc::clone(&pool),
            scripted_factory(Arc::clone(&calls), 2, "connection reset"),
        )
        .expect("embedder should build")
        .with_sleeper(Arc::new(NoopSleeper));

        embedder.embed_query("hi").await.expect("should succeed");
        assert_eq!(pool.active_index().expect("index"), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_surfaces_the_error() {
        let pool =
            Arc::new(CredentialPool::new(vec!["key-a".into()]).expect("pool should build"));
        let calls = Arc::new(AtomicU32::new(0));
        let embedder = RotatingEmbedder::new(
            Arc::clone(&pool),
            scripted_factory(Arc::clone(&calls), u32::MAX, "quota exhausted"),
        )
        .expect("embedder should build")
        .with_policy(RetryPolicy::exponential(
            4,
            Duration::from_millis(1),
            Duration::from_millis(2),
        ))
        .with_sleeper(Arc::new(NoopSleeper));

        let error = embedder.embed_query("hi").await.expect_err("should fail");
        assert_eq!(error.kind, ProviderErrorKind::QuotaExceeded);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
