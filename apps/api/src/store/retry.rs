use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{error, warn};
use uuid::Uuid;

use super::{StoreError, VersionStore};
use crate::models::resume::{Document, ResumeRecord, StoredVersion, VersionFilter, VersionType};

/// Backoff schedule for transient store failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each time after that.
    pub base_delay: Duration,
    /// Upper bound of random jitter per retry, scaled by the attempt number.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1));
        let jitter_cap = self.jitter.as_millis() as u64 * u64::from(attempt);
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_cap)
        };
        exp + Duration::from_millis(jitter)
    }
}

/// Decorates any store with the transient-failure retry policy.
/// Non-transient failures pass straight through.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: VersionStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        resume_id: Option<Uuid>,
        mut call: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let id = resume_id.map(|id| id.to_string()).unwrap_or_default();

        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        resume_id = %id,
                        operation,
                        attempt,
                        "Store call failed ({e}), retrying in {}ms",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        resume_id = %id,
                        operation,
                        attempt,
                        "Store call failed: {e}"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl<S: VersionStore> VersionStore for RetryingStore<S> {
    async fn create_resume(&self, raw_text: &str) -> Result<Uuid, StoreError> {
        self.run("create_resume", None, || self.inner.create_resume(raw_text))
            .await
    }

    async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError> {
        self.run("get_resume", Some(id), || self.inner.get_resume(id))
            .await
    }

    async fn save_version(
        &self,
        id: Uuid,
        document: &Document,
        version_type: VersionType,
    ) -> Result<(), StoreError> {
        self.run("save_version", Some(id), || {
            self.inner.save_version(id, document, version_type)
        })
        .await
    }

    async fn latest_version(
        &self,
        id: Uuid,
        filter: VersionFilter,
    ) -> Result<Option<StoredVersion>, StoreError> {
        self.run("latest_version", Some(id), || {
            self.inner.latest_version(id, filter)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryVersionStore, TransientKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `save_version` with a DNS error until `failures` calls have been made.
    struct FlakyStore {
        inner: MemoryVersionStore,
        failures: u32,
        calls: AtomicU32,
        error: fn() -> StoreError,
    }

    impl FlakyStore {
        fn new(failures: u32, error: fn() -> StoreError) -> Self {
            Self {
                inner: MemoryVersionStore::new(),
                failures,
                calls: AtomicU32::new(0),
                error,
            }
        }
    }

    fn dns_failure() -> StoreError {
        StoreError::Transient {
            kind: TransientKind::NameResolution,
            message: "failed to lookup address information".into(),
        }
    }

    fn integrity_failure() -> StoreError {
        StoreError::Integrity("violates foreign key constraint".into())
    }

    #[async_trait]
    impl VersionStore for FlakyStore {
        async fn create_resume(&self, raw_text: &str) -> Result<Uuid, StoreError> {
            self.inner.create_resume(raw_text).await
        }

        async fn get_resume(&self, id: Uuid) -> Result<Option<ResumeRecord>, StoreError> {
            self.inner.get_resume(id).await
        }

        async fn save_version(
            &self,
            id: Uuid,
            document: &Document,
            version_type: VersionType,
        ) -> Result<(), StoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                return Err((self.error)());
            }
            self.inner.save_version(id, document, version_type).await
        }

        async fn latest_version(
            &self,
            id: Uuid,
            filter: VersionFilter,
        ) -> Result<Option<StoredVersion>, StoreError> {
            self.inner.latest_version(id, filter).await
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            jitter: Duration::ZERO,
        }
    }

    #[test]
    fn test_delay_doubles_without_jitter() {
        let p = policy();
        assert_eq!(p.delay_for(1), Duration::from_millis(200));
        assert_eq!(p.delay_for(2), Duration::from_millis(400));
        assert_eq!(p.delay_for(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let p = RetryPolicy::default();
        for attempt in 1..=4 {
            let d = p.delay_for(attempt);
            let floor = p.base_delay * 2u32.pow(attempt - 1);
            assert!(d >= floor);
            assert!(d <= floor + p.jitter * attempt);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dns_failures_retried_until_success() {
        let store = RetryingStore::new(FlakyStore::new(2, dns_failure), policy());
        let id = store.create_resume("raw").await.unwrap();

        store
            .save_version(id, &Document::default(), VersionType::Improved)
            .await
            .unwrap();

        // two failures + one success
        assert_eq!(store.inner.calls.load(Ordering::SeqCst), 3);
        assert!(store
            .latest_version(id, VersionFilter::Latest)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let store = RetryingStore::new(FlakyStore::new(10, dns_failure), policy());
        let id = store.create_resume("raw").await.unwrap();

        let err = store
            .save_version(id, &Document::default(), VersionType::Improved)
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(store.inner.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_integrity_errors_are_not_retried() {
        let store = RetryingStore::new(FlakyStore::new(10, integrity_failure), policy());
        let id = store.create_resume("raw").await.unwrap();

        let err = store
            .save_version(id, &Document::default(), VersionType::Improved)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Integrity(_)));
        assert_eq!(store.inner.calls.load(Ordering::SeqCst), 1);
    }
}
