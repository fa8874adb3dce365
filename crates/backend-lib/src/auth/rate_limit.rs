// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Sliding-window rate limiting for authentication endpoints.
//!
//! Counters live behind the [`CounterStore`] trait so a single-instance
//! deployment uses the in-process map while a multi-instance deployment can
//! inject a store backed by an external key-value service.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long an idle counter is kept before the sweep drops it
const COUNTER_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Request budget for one route class
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum number of requests inside the window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Storage backend for sliding-window counters
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record a hit for `key` if fewer than `max` hits landed inside the last
    /// `window`. Returns true when the hit was admitted; a rejected hit is
    /// not recorded.
    async fn try_record(&self, key: &str, max: u32, window: Duration) -> bool;

    /// Seconds until the oldest hit inside the window falls out of it
    async fn retry_after(&self, key: &str, window: Duration) -> u64;

    /// Drop entries that have been idle longer than `retention`
    async fn sweep(&self, retention: Duration);
}

/// In-process counter store, one timestamp list per client key
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    hits: DashMap<String, Vec<Instant>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self {
            hits: DashMap::new(),
        }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn try_record(&self, key: &str, max: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut entry = self.hits.entry(key.to_string()).or_default();

        // Trim hits that have slid out of the window
        entry.retain(|hit| now.duration_since(*hit) < window);

        if entry.len() >= max as usize {
            return false;
        }

        entry.push(now);
        true
    }

    async fn retry_after(&self, key: &str, window: Duration) -> u64 {
        let now = Instant::now();
        if let Some(entry) = self.hits.get(key) {
            if let Some(oldest) = entry
                .iter()
                .filter(|hit| now.duration_since(**hit) < window)
                .min()
            {
                let elapsed = now.duration_since(*oldest);
                return window.saturating_sub(elapsed).as_secs().max(1);
            }
        }
        0
    }

    async fn sweep(&self, retention: Duration) {
        let now = Instant::now();
        self.hits.retain(|_, hits| {
            hits.iter()
                .any(|hit| now.duration_since(*hit) < retention)
        });
    }
}

/// Sliding-window rate limiter over an injected counter store
#[derive(Clone)]
pub struct SlidingWindowLimiter {
    store: Arc<dyn CounterStore>,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryCounterStore::new()))
    }
}

impl SlidingWindowLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Check whether a request from `key` fits inside the policy's window.
    /// The first request from a new key is always allowed.
    pub async fn allow(&self, key: &str, policy: RateLimitPolicy) -> bool {
        self.store
            .try_record(key, policy.max_requests, policy.window())
            .await
    }

    /// Seconds the client should wait before retrying
    pub async fn retry_after(&self, key: &str, policy: RateLimitPolicy) -> u64 {
        self.store.retry_after(key, policy.window()).await
    }

    /// Spawn the periodic sweep that bounds counter memory
    pub fn start_sweeper(&self, interval: Duration) {
        let store = self.store.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                store.sweep(COUNTER_RETENTION).await;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_POLICY: RateLimitPolicy = RateLimitPolicy {
        max_requests: 5,
        window_secs: 300,
    };

    #[tokio::test]
    async fn test_first_request_always_allowed() {
        let limiter = SlidingWindowLimiter::default();
        assert!(limiter.allow("ip:127.0.0.1", LOGIN_POLICY).await);
    }

    #[tokio::test]
    async fn test_sixth_request_in_window_rejected() {
        let limiter = SlidingWindowLimiter::default();

        for _ in 0..5 {
            assert!(limiter.allow("ip:127.0.0.2", LOGIN_POLICY).await);
        }

        assert!(!limiter.allow("ip:127.0.0.2", LOGIN_POLICY).await);
        // Rejections are not recorded, so the count stays at the cap
        assert!(!limiter.allow("ip:127.0.0.2", LOGIN_POLICY).await);
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = SlidingWindowLimiter::default();
        let policy = RateLimitPolicy {
            max_requests: 2,
            window_secs: 1,
        };

        assert!(limiter.allow("ip:127.0.0.3", policy).await);
        assert!(limiter.allow("ip:127.0.0.3", policy).await);
        assert!(!limiter.allow("ip:127.0.0.3", policy).await);

        // After the window elapses, requests succeed again
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(limiter.allow("ip:127.0.0.3", policy).await);
    }

    #[tokio::test]
    async fn test_keys_tracked_separately() {
        let limiter = SlidingWindowLimiter::default();

        for _ in 0..5 {
            assert!(limiter.allow("ip:192.168.0.1", LOGIN_POLICY).await);
        }
        assert!(!limiter.allow("ip:192.168.0.1", LOGIN_POLICY).await);

        // A different client key is unaffected
        assert!(limiter.allow("ip:192.168.0.2", LOGIN_POLICY).await);
    }

    #[tokio::test]
    async fn test_retry_after_reported() {
        let limiter = SlidingWindowLimiter::default();

        for _ in 0..5 {
            limiter.allow("ip:127.0.0.4", LOGIN_POLICY).await;
        }
        assert!(!limiter.allow("ip:127.0.0.4", LOGIN_POLICY).await);

        let retry_after = limiter.retry_after("ip:127.0.0.4", LOGIN_POLICY).await;
        assert!(retry_after >= 1);
        assert!(retry_after <= LOGIN_POLICY.window_secs);
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_entries() {
        let store = Arc::new(InMemoryCounterStore::new());
        let limiter = SlidingWindowLimiter::new(store.clone());

        limiter.allow("ip:127.0.0.5", LOGIN_POLICY).await;
        assert_eq!(store.hits.len(), 1);

        // Everything is younger than the retention here, nothing is dropped
        store.sweep(COUNTER_RETENTION).await;
        assert_eq!(store.hits.len(), 1);

        // With zero retention every entry is idle
        store.sweep(Duration::from_secs(0)).await;
        assert_eq!(store.hits.len(), 0);
    }
}
