// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for authentication attempts.
//!
//! One token bucket per client key. A bucket starts full with `burst` tokens
//! and refills continuously at `refill_per_sec`, computed from the time since
//! it was last touched. Each admitted request spends one token; a rejected
//! request spends nothing.

use dashmap::DashMap;
use metrics::gauge;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::config::RateLimitSettings;
use crate::metrics::LIMITER_BUCKETS;

/// Per-key bucket state
#[derive(Debug, Clone)]
struct Bucket {
    /// Tokens currently available, fractional between refills
    tokens: f64,
    /// Time of the last refill computation
    last_refill: Instant,
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Rejected; one token will be available after `retry_after_secs`
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

/// Token-bucket rate limiter keyed by client identity
#[derive(Debug, Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, Bucket>>,
    /// Tokens added per second (r)
    refill_per_sec: f64,
    /// Bucket capacity (b)
    burst: f64,
    /// Minimum idle time before a bucket may be dropped
    idle_ttl: Duration,
}

impl RateLimiter {
    /// Create a limiter with rate `refill_per_sec` and capacity `burst`
    pub fn new(refill_per_sec: f64, burst: u32, idle_ttl: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            refill_per_sec,
            burst: f64::from(burst),
            idle_ttl,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.refill_per_sec,
            settings.burst,
            Duration::from_secs(settings.idle_ttl_secs),
        )
    }

    /// Admit or reject one request for `key`
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// `true` if the request for `key` is admitted
    pub fn allow(&self, key: &str) -> bool {
        self.check(key).is_allowed()
    }

    /// [`RateLimiter::check`] against an explicit clock reading
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        // the entry guard holds the shard lock, so the refill and the spend
        // are atomic with respect to other callers on the same key
        let mut bucket = self.buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.burst,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.burst);
        bucket.last_refill = bucket.last_refill.max(now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateLimitDecision::Allowed
        } else {
            let wait = (1.0 - bucket.tokens) / self.refill_per_sec;
            RateLimitDecision::Limited {
                retry_after_secs: wait.ceil().max(1.0) as u64,
            }
        }
    }

    /// [`RateLimiter::allow`] against an explicit clock reading
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        self.check_at(key, now).is_allowed()
    }

    /// Idle time after which a bucket is full again and can be forgotten.
    ///
    /// Saturates at [`Duration::MAX`] when a full refill is unrepresentable.
    pub fn eviction_age(&self) -> Duration {
        let refill_time = Duration::try_from_secs_f64(self.burst / self.refill_per_sec)
            .unwrap_or(Duration::MAX);
        self.idle_ttl.max(refill_time)
    }

    /// Drop buckets idle for at least [`RateLimiter::eviction_age`]
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&self, now: Instant) -> usize {
        let max_idle = self.eviction_age();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < max_idle);
        before.saturating_sub(self.buckets.len())
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Run [`RateLimiter::cleanup`] every `interval` until the task is aborted
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.cleanup();
                gauge!(LIMITER_BUCKETS).set(limiter.tracked_keys() as f64);
                if removed > 0 {
                    tracing::debug!(removed, "evicted idle rate limit buckets");
                }
            }
        })
    }
}
