//! Per-identity sliding-window admission control.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kubegate_core::{AppError, AppResult, CallerIdentity};
use tracing::warn;

/// Window parameters for the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Admissions allowed within one window.
    pub max_admissions: u32,
    /// Window length in seconds.
    pub window_seconds: i64,
}

impl Default for RateLimitRule {
    fn default() -> Self {
        Self {
            max_admissions: 10,
            window_seconds: 60,
        }
    }
}

/// Port for the admission store.
///
/// `now` is injected so the sliding window is deterministic under test.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Prunes the identity's window, then admits and records the attempt if
    /// the count is below the limit. A denied attempt is not recorded.
    async fn admit(
        &self,
        identity: &str,
        max_admissions: u32,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Drops identities with no admissions inside the window. Returns how
    /// many identities were removed.
    async fn sweep(&self, window_seconds: i64, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Application service enforcing the admission rule.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
    rule: RateLimitRule,
}

impl RateLimitService {
    /// Creates a limiter over a repository with the given rule.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>, rule: RateLimitRule) -> Self {
        Self { repository, rule }
    }

    /// Admits the identity or returns [`AppError::RateLimited`].
    pub async fn admit(&self, identity: &CallerIdentity) -> AppResult<()> {
        let admitted = self
            .repository
            .admit(
                identity.as_str(),
                self.rule.max_admissions,
                self.rule.window_seconds,
                Utc::now(),
            )
            .await?;

        if admitted {
            Ok(())
        } else {
            warn!(identity = %identity, "rate limit exceeded");
            Err(AppError::RateLimited(
                "rate limit exceeded, try again later".to_owned(),
            ))
        }
    }

    /// Evicts idle identities from the store.
    pub async fn sweep(&self) -> AppResult<u64> {
        self.repository
            .sweep(self.rule.window_seconds, Utc::now())
            .await
    }

    /// The window length, for scheduling sweeps.
    #[must_use]
    pub fn window_seconds(&self) -> i64 {
        self.rule.window_seconds
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use kubegate_core::{AppError, AppResult, CallerIdentity};
    use tokio::sync::Mutex;

    use super::{RateLimitRepository, RateLimitRule, RateLimitService};

    struct FakeRepository {
        admitted: bool,
        calls: Mutex<Vec<(String, u32, i64)>>,
    }

    #[async_trait]
    impl RateLimitRepository for FakeRepository {
        async fn admit(
            &self,
            identity: &str,
            max_admissions: u32,
            window_seconds: i64,
            _now: DateTime<Utc>,
        ) -> AppResult<bool> {
            self.calls
                .lock()
                .await
                .push((identity.to_owned(), max_admissions, window_seconds));
            Ok(self.admitted)
        }

        async fn sweep(&self, _window_seconds: i64, _now: DateTime<Utc>) -> AppResult<u64> {
            Ok(2)
        }
    }

    #[tokio::test]
    async fn admitted_identity_passes_with_rule_parameters() {
        let repository = Arc::new(FakeRepository {
            admitted: true,
            calls: Mutex::new(Vec::new()),
        });
        let service = RateLimitService::new(repository.clone(), RateLimitRule::default());

        let result = service.admit(&CallerIdentity::new("10.0.0.1")).await;
        assert!(result.is_ok());

        let calls = repository.calls.lock().await;
        assert_eq!(calls.as_slice(), &[("10.0.0.1".to_owned(), 10, 60)]);
    }

    #[tokio::test]
    async fn denied_identity_maps_to_rate_limited() {
        let repository = Arc::new(FakeRepository {
            admitted: false,
            calls: Mutex::new(Vec::new()),
        });
        let service = RateLimitService::new(repository, RateLimitRule::default());

        let result = service.admit(&CallerIdentity::new("10.0.0.1")).await;
        assert!(matches!(result, Err(AppError::RateLimited(_))));
    }

    #[tokio::test]
    async fn sweep_reports_evictions() {
        let repository = Arc::new(FakeRepository {
            admitted: true,
            calls: Mutex::new(Vec::new()),
        });
        let service = RateLimitService::new(repository, RateLimitRule::default());

        let evicted = service.sweep().await.unwrap_or_else(|_| unreachable!());
        assert_eq!(evicted, 2);
    }
}
