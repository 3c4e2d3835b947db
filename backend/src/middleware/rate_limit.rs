use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::models::user::AuthIdentity;
use crate::state::AppState;

const PERIODIC_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);
const DEFAULT_CLEANUP_THRESHOLD: usize = 10_000;

#[derive(Debug, Default)]
struct RateLimitWindow {
    requests: VecDeque<Instant>,
}

#[derive(Debug)]
struct LimiterStore {
    windows: HashMap<String, RateLimitWindow>,
    last_cleanup_at: Instant,
}

/// Sliding-window request budget per caller identity.
///
/// Held in the application state; every router built from a fresh state gets
/// its own counters.
#[derive(Debug)]
pub struct UserRateLimiter {
    max_requests: u32,
    window: Duration,
    cleanup_threshold: usize,
    store: Mutex<LimiterStore>,
}

impl UserRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_cleanup_threshold(max_requests, window, DEFAULT_CLEANUP_THRESHOLD)
    }

    pub fn with_cleanup_threshold(
        max_requests: u32,
        window: Duration,
        cleanup_threshold: usize,
    ) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: window.max(Duration::from_secs(1)),
            cleanup_threshold: cleanup_threshold.max(1),
            store: Mutex::new(LimiterStore {
                windows: HashMap::new(),
                last_cleanup_at: Instant::now(),
            }),
        }
    }

    /// Records a request for `key` at `now`. Returns the seconds to wait when
    /// the budget is exhausted.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());

        if should_cleanup(
            store.windows.len(),
            self.cleanup_threshold,
            now,
            store.last_cleanup_at,
        ) {
            let window = self.window;
            store.windows.retain(|_, entry| {
                prune_expired_requests(entry, now, window);
                !entry.requests.is_empty()
            });
            store.last_cleanup_at = now;
        }

        let entry = store.windows.entry(key.to_string()).or_default();
        prune_expired_requests(entry, now, self.window);

        if entry.requests.len() >= self.max_requests as usize {
            let retry_after = entry
                .requests
                .front()
                .map(|oldest| {
                    self.window
                        .saturating_sub(now.duration_since(*oldest))
                        .as_secs()
                        .max(1)
                })
                .unwrap_or(1);
            return Err(retry_after);
        }

        entry.requests.push_back(now);
        Ok(())
    }

    pub fn tracked_keys(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .windows
            .len()
    }
}

fn should_cleanup(store_len: usize, threshold: usize, now: Instant, last_cleanup_at: Instant) -> bool {
    store_len > threshold || now.duration_since(last_cleanup_at) >= PERIODIC_CLEANUP_INTERVAL
}

fn prune_expired_requests(entry: &mut RateLimitWindow, now: Instant, window: Duration) {
    while let Some(oldest) = entry.requests.front() {
        if now.duration_since(*oldest) >= window {
            entry.requests.pop_front();
        } else {
            break;
        }
    }
}

/// Applies the per-identity budget. Must run after the auth middleware.
pub async fn user_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = request
        .extensions()
        .get::<AuthIdentity>()
        .map(|identity| identity.external_id.clone())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    if let Err(retry_after) = state.rate_limiter.check(&key, Instant::now()) {
        tracing::warn!(retry_after, "Rate limit exceeded");
        return Err(AppError::TooManyRequests { retry_after });
    }

    Ok(next.run(request).await)
}
