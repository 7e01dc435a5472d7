//! Windowed rate limiting per scope key
//!
//! Each scope key owns one window. The first use opens it, uses are counted
//! until `max_per_window` is reached, and the first use after the window has
//! elapsed opens a fresh one. This is a resetting window, not an exact sliding
//! log of timestamps.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::core::models::RequestScope;

/// Mutable accounting for one scope key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub window_start: Instant,
    pub uses: u32,
}

/// Where entries live. Injected into [`RateLimiter`].
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<RateLimitEntry>;

    async fn set(&self, key: &str, entry: RateLimitEntry);

    /// Drop entries whose window opened more than `max_idle` before `now`.
    /// Returns how many were removed.
    async fn sweep(&self, now: Instant, max_idle: Duration) -> usize;

    async fn len(&self) -> usize;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: RwLock<HashMap<String, RateLimitEntry>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.read().await.get(key).copied()
    }

    async fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn sweep(&self, now: Instant, max_idle: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.window_start) <= max_idle);
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Limits supplied by the caller on every check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Window length in milliseconds
    pub window_ms: u64,
    pub max_per_window: u32,
    /// Count per user across all channels instead of per user, channel and guild
    pub by_user: bool,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_ms: 60 * 1000,
            max_per_window: 3,
            by_user: false,
        }
    }
}

impl RateLimitPolicy {
    pub fn new(window: Duration, max_per_window: u32, by_user: bool) -> Self {
        Self {
            window_ms: window.as_millis() as u64,
            max_per_window,
            by_user,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Result of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitResponse {
    pub is_rate_limited: bool,
    /// Only set when rate limited
    pub time_until_next_use: Option<Duration>,
    /// Not set for privileged scopes
    pub uses_left: Option<u32>,
}

impl RateLimitResponse {
    fn bypassed() -> Self {
        Self {
            is_rate_limited: false,
            time_until_next_use: None,
            uses_left: None,
        }
    }
}

/// Rate limiter mechanism. Holds no policy of its own.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    // Serializes the get/modify/set sequence across tasks
    gate: Mutex<()>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()))
    }
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    /// Key partitioning the accounting for `key` under `policy`
    pub fn scope_key(key: &str, scope: &RequestScope, policy: &RateLimitPolicy) -> String {
        if policy.by_user {
            format!("{}:{}", scope.user_id, key)
        } else {
            format!(
                "{}:{}:{}:{}",
                scope.guild_id.as_deref().unwrap_or("dm"),
                scope.channel_id,
                scope.user_id,
                key
            )
        }
    }

    pub async fn rate_limit(
        &self,
        key: &str,
        scope: &RequestScope,
        policy: &RateLimitPolicy,
    ) -> RateLimitResponse {
        self.rate_limit_at(key, scope, policy, Instant::now()).await
    }

    /// Count one use at `now`, or reject it without counting
    pub async fn rate_limit_at(
        &self,
        key: &str,
        scope: &RequestScope,
        policy: &RateLimitPolicy,
        now: Instant,
    ) -> RateLimitResponse {
        if scope.privileged {
            debug!("Rate limit bypassed for privileged user {}", scope.user_id);
            return RateLimitResponse::bypassed();
        }

        let map_key = Self::scope_key(key, scope, policy);
        let window = policy.window();

        let _guard = self.gate.lock().await;

        let mut entry = match self.store.get(&map_key).await {
            Some(entry) if now.saturating_duration_since(entry.window_start) > window => {
                RateLimitEntry {
                    window_start: now,
                    uses: 0,
                }
            }
            Some(entry) => entry,
            None => RateLimitEntry {
                window_start: now,
                uses: 0,
            },
        };

        if entry.uses + 1 > policy.max_per_window {
            info!(
                "Rate limited {} in {} for {}",
                scope.user_id, scope.channel_id, key
            );

            // Keep the entry so a fresh/expired window is still recorded
            self.store.set(&map_key, entry).await;

            return RateLimitResponse {
                is_rate_limited: true,
                time_until_next_use: Some((entry.window_start + window).saturating_duration_since(now)),
                uses_left: Some(0),
            };
        }

        entry.uses += 1;
        self.store.set(&map_key, entry).await;

        RateLimitResponse {
            is_rate_limited: false,
            time_until_next_use: None,
            uses_left: Some(policy.max_per_window - entry.uses),
        }
    }

    /// Evict entries idle for longer than `max_idle`
    pub async fn sweep(&self, max_idle: Duration) -> usize {
        self.sweep_at(Instant::now(), max_idle).await
    }

    pub async fn sweep_at(&self, now: Instant, max_idle: Duration) -> usize {
        let _guard = self.gate.lock().await;
        let removed = self.store.sweep(now, max_idle).await;
        if removed > 0 {
            debug!("Evicted {} idle rate limit entries", removed);
        }
        removed
    }

    pub async fn tracked_keys(&self) -> usize {
        self.store.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> RequestScope {
        RequestScope::new("user-1", "channel-1").in_guild("guild-1")
    }

    #[tokio::test]
    async fn test_window_scenario() {
        let limiter = RateLimiter::default();
        let policy = RateLimitPolicy::new(Duration::from_millis(1000), 2, false);
        let t0 = Instant::now();
        let s = scope();

        let first = limiter.rate_limit_at("cmd", &s, &policy, t0).await;
        assert!(!first.is_rate_limited);
        assert_eq!(first.uses_left, Some(1));

        let second = limiter
            .rate_limit_at("cmd", &s, &policy, t0 + Duration::from_millis(200))
            .await;
        assert!(!second.is_rate_limited);
        assert_eq!(second.uses_left, Some(0));

        let third = limiter
            .rate_limit_at("cmd", &s, &policy, t0 + Duration::from_millis(600))
            .await;
        assert!(third.is_rate_limited);
        assert_eq!(third.time_until_next_use, Some(Duration::from_millis(400)));
        assert_eq!(third.uses_left, Some(0));

        let after = limiter
            .rate_limit_at("cmd", &s, &policy, t0 + Duration::from_millis(1500))
            .await;
        assert!(!after.is_rate_limited);
        assert_eq!(after.uses_left, Some(1));
    }

    #[tokio::test]
    async fn test_rejection_does_not_count() {
        let store = Arc::new(InMemoryRateLimitStore::new());
        let limiter = RateLimiter::new(store.clone());
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 1, true);
        let t0 = Instant::now();
        let s = scope();

        assert!(!limiter.rate_limit_at("k", &s, &policy, t0).await.is_rate_limited);
        assert!(limiter.rate_limit_at("k", &s, &policy, t0).await.is_rate_limited);
        assert!(limiter.rate_limit_at("k", &s, &policy, t0).await.is_rate_limited);

        let entry = store.get("user-1:k").await.unwrap();
        assert_eq!(entry.uses, 1);
        assert_eq!(entry.window_start, t0);
    }

    #[tokio::test]
    async fn test_privileged_bypass() {
        let limiter = RateLimiter::default();
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 1, false);
        let moderator = scope().privileged(true);

        for _ in 0..10 {
            let response = limiter.rate_limit("cmd", &moderator, &policy).await;
            assert!(!response.is_rate_limited);
            assert_eq!(response.uses_left, None);
        }
        assert_eq!(limiter.tracked_keys().await, 0);
    }

    #[tokio::test]
    async fn test_scope_keys() {
        let s = scope();
        let per_user = RateLimitPolicy::new(Duration::from_secs(1), 1, true);
        let per_channel = RateLimitPolicy::new(Duration::from_secs(1), 1, false);

        assert_eq!(RateLimiter::scope_key("k", &s, &per_user), "user-1:k");
        assert_eq!(
            RateLimiter::scope_key("k", &s, &per_channel),
            "guild-1:channel-1:user-1:k"
        );

        let dm = RequestScope::new("user-1", "dm-channel");
        assert_eq!(
            RateLimiter::scope_key("k", &dm, &per_channel),
            "dm:dm-channel:user-1:k"
        );
    }

    #[tokio::test]
    async fn test_channels_counted_separately_unless_by_user() {
        let limiter = RateLimiter::default();
        let t0 = Instant::now();
        let here = RequestScope::new("u", "a");
        let there = RequestScope::new("u", "b");

        let per_channel = RateLimitPolicy::new(Duration::from_secs(60), 1, false);
        assert!(!limiter.rate_limit_at("cheap", &here, &per_channel, t0).await.is_rate_limited);
        assert!(!limiter.rate_limit_at("cheap", &there, &per_channel, t0).await.is_rate_limited);

        let per_user = RateLimitPolicy::new(Duration::from_secs(60), 1, true);
        assert!(!limiter.rate_limit_at("paid", &here, &per_user, t0).await.is_rate_limited);
        assert!(limiter.rate_limit_at("paid", &there, &per_user, t0).await.is_rate_limited);
    }

    #[tokio::test]
    async fn test_sweep_evicts_idle_entries() {
        let limiter = RateLimiter::default();
        let policy = RateLimitPolicy::default();
        let t0 = Instant::now();

        limiter
            .rate_limit_at("k", &RequestScope::new("old", "c"), &policy, t0)
            .await;
        limiter
            .rate_limit_at(
                "k",
                &RequestScope::new("new", "c"),
                &policy,
                t0 + Duration::from_secs(50),
            )
            .await;
        assert_eq!(limiter.tracked_keys().await, 2);

        let removed = limiter
            .sweep_at(t0 + Duration::from_secs(70), Duration::from_secs(60))
            .await;
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_callers_share_one_window() {
        let limiter = Arc::new(RateLimiter::default());
        let policy = RateLimitPolicy::new(Duration::from_secs(60), 3, true);

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move {
                    let s = RequestScope::new("user-1", format!("channel-{}", i));
                    limiter.rate_limit("cmd", &s, &policy).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if !handle.await.unwrap().is_rate_limited {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}
