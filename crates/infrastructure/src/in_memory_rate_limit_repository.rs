//! In-process sliding-window admission store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use kubegate_application::RateLimitRepository;
use kubegate_core::AppResult;
use tokio::sync::Mutex;

/// Per-identity admission timestamps behind one async mutex.
///
/// Suited to a single-process deployment; swap in a shared store behind the
/// same port for multi-instance setups.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    admissions: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn admit(
        &self,
        identity: &str,
        max_admissions: u32,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let cutoff = now - TimeDelta::seconds(window_seconds);
        let mut admissions = self.admissions.lock().await;
        let entry = admissions.entry(identity.to_owned()).or_default();

        entry.retain(|stamp| *stamp > cutoff);
        if entry.len() >= max_admissions as usize {
            // A rejected attempt does not consume window capacity.
            return Ok(false);
        }

        entry.push(now);
        Ok(true)
    }

    async fn sweep(&self, window_seconds: i64, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - TimeDelta::seconds(window_seconds);
        let mut admissions = self.admissions.lock().await;
        let before = admissions.len();
        admissions.retain(|_, stamps| stamps.iter().any(|stamp| *stamp > cutoff));
        Ok((before - admissions.len()) as u64)
    }
}
