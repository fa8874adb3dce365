// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `CuraGenie` auth service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthService, CounterStore, DefaultAuth, InMemoryCounterStore, SlidingWindowLimiter};
use crate::config::Settings;
use crate::storage::UserStore;

/// How often the background sweep runs
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Credential store
    pub store: Arc<dyn UserStore>,
    /// Rate limiter
    pub limiter: Arc<SlidingWindowLimiter>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create application state with the in-process counter store
    pub fn new(store: Arc<dyn UserStore>, settings: Settings) -> Self {
        Self::with_counter_store(store, settings, Arc::new(InMemoryCounterStore::new()))
    }

    /// Create application state with an injected counter store, for
    /// deployments that share rate-limit counters across instances
    pub fn with_counter_store(
        store: Arc<dyn UserStore>,
        settings: Settings,
        counters: Arc<dyn CounterStore>,
    ) -> Self {
        let settings = Arc::new(settings);
        let auth = Arc::new(DefaultAuth::new(store.clone(), settings.clone()));
        let limiter = Arc::new(SlidingWindowLimiter::new(counters));

        Self {
            auth,
            store,
            limiter,
            settings,
        }
    }

    /// Spawn the periodic cleanup of rate-limit counters and expired token
    /// rows. Call once from the server entry point.
    pub fn start_sweeper(&self) {
        self.limiter.start_sweeper(SWEEP_INTERVAL);

        let store = self.store.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SWEEP_INTERVAL).await;
                if let Err(err) = store.sweep_expired(chrono::Utc::now()).await {
                    tracing::warn!(error = %err, "token sweep failed");
                }
            }
        });
    }
}
