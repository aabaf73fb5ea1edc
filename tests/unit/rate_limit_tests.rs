// ==============================
// tests/unit/rate_limit_tests.rs
// ==============================
//! This test suite is designed to validate the functionality of the token-bucket `RateLimiter`
use gatekeeper_lib::auth::{RateLimitDecision, RateLimiter};
use gatekeeper_lib::config::RateLimitSettings;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

fn burst_of_five() -> RateLimiter {
    RateLimiter::from_settings(&RateLimitSettings {
        refill_per_sec: 1.0,
        burst: 5,
        ..RateLimitSettings::default()
    })
}

#[test]
fn test_fresh_key_gets_full_burst() {
    let limiter = burst_of_five();

    for i in 0..5 {
        assert!(limiter.allow("127.0.0.1"), "request {i} should pass");
    }
    assert!(!limiter.allow("127.0.0.1"));
}

#[tokio::test]
async fn test_allows_again_after_refill() {
    let limiter = RateLimiter::new(20.0, 5, Duration::from_secs(60));

    for _ in 0..5 {
        assert!(limiter.allow("k"));
    }
    assert!(!limiter.allow("k"));

    // one token every 50ms
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(limiter.allow("k"));
}

#[test]
fn test_limited_reports_retry_after() {
    let limiter = RateLimiter::new(0.25, 1, Duration::from_secs(60));
    let now = Instant::now();

    assert!(limiter.allow_at("k", now));
    assert_eq!(
        limiter.check_at("k", now),
        RateLimitDecision::Limited { retry_after_secs: 4 }
    );
}

#[test]
fn test_concurrent_callers_share_one_bucket() {
    let limiter = burst_of_five();
    let now = Instant::now();
    let admitted = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..10 {
                    if limiter.allow_at("shared", now) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), 5);
}

#[test]
fn test_idle_buckets_are_evicted() {
    let limiter = RateLimiter::new(1.0, 5, Duration::from_secs(30));
    let start = Instant::now();

    limiter.allow_at("a", start);
    limiter.allow_at("b", start);
    assert_eq!(limiter.tracked_keys(), 2);

    assert_eq!(limiter.cleanup_at(start + Duration::from_secs(10)), 0);
    assert_eq!(limiter.cleanup_at(start + Duration::from_secs(30)), 2);
    assert_eq!(limiter.tracked_keys(), 0);

    // an evicted key starts over with a full bucket
    for _ in 0..5 {
        assert!(limiter.allow_at("a", start + Duration::from_secs(31)));
    }
}
