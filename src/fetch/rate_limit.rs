// src/fetch/rate_limit.rs
// =============================================================================
// Per-domain rate limiting.
//
// Every domain gets its own slot: an async mutex around the instant of the
// last request we dispatched to it. Callers for the same domain queue up on
// that mutex (so they are serialized and spaced by `interval`), while callers
// for different domains never touch each other's slot.
//
// Time comes from a `Clock` so tests can swap in a fake one and check the
// spacing without actually sleeping.
//
// Rust concepts:
// - Arc: Shared ownership of a slot between concurrent callers
// - tokio::sync::Mutex: A lock that can be held across .await
// - Trait objects: `Arc<dyn Clock>` to inject the time source
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// Source of "now" and of waiting
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// The real clock, backed by tokio's timer
#[derive(Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

type Slot = Arc<AsyncMutex<Option<Instant>>>;

pub struct RateLimiter {
    interval: Duration,
    clock: Arc<dyn Clock>,
    // The outer std mutex only guards the map lookup; it is never held
    // across an await.
    slots: Mutex<HashMap<String, Slot>>,
}

impl RateLimiter {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        RateLimiter {
            interval,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request to `domain` is allowed, then records and
    /// returns the dispatch instant.
    pub async fn acquire(&self, domain: &str) -> Instant {
        let slot = self.slot(domain);
        let mut last = slot.lock().await;

        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!(domain, wait_ms = wait.as_millis() as u64, "Rate limiting");
                self.clock.sleep(wait).await;
            }
        }

        let now = self.clock.now();
        *last = Some(now);
        now
    }

    fn slot(&self, domain: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(None)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A clock that only moves when someone sleeps on it
    struct FakeClock {
        start: Instant,
        offset: Mutex<Duration>,
    }

    impl FakeClock {
        fn new() -> Self {
            FakeClock {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            *self.offset.lock().unwrap() += duration;
        }
    }

    fn limiter(clock: Arc<FakeClock>) -> RateLimiter {
        RateLimiter::new(Duration::from_secs(1), clock)
    }

    #[tokio::test]
    async fn test_same_domain_is_spaced_by_interval() {
        let clock = Arc::new(FakeClock::new());
        let limiter = limiter(clock.clone());

        let first = limiter.acquire("docs.example.com").await;
        let second = limiter.acquire("docs.example.com").await;
        let third = limiter.acquire("docs.example.com").await;

        assert!(second.duration_since(first) >= Duration::from_secs(1));
        assert!(third.duration_since(second) >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_different_domains_do_not_wait() {
        let clock = Arc::new(FakeClock::new());
        let limiter = limiter(clock.clone());

        let a = limiter.acquire("a.example.com").await;
        let b = limiter.acquire("b.example.com").await;
        let c = limiter.acquire("c.example.com").await;

        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_serialized_per_domain() {
        let clock = Arc::new(FakeClock::new());
        let limiter = Arc::new(limiter(clock.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire("same.example.com").await })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();

        for pair in stamps.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(1));
        }
    }

    #[tokio::test]
    async fn test_no_wait_once_interval_has_passed() {
        let clock = Arc::new(FakeClock::new());
        let limiter = limiter(clock.clone());

        let first = limiter.acquire("x.example.com").await;
        clock.sleep(Duration::from_secs(5)).await;
        let second = limiter.acquire("x.example.com").await;

        assert_eq!(second.duration_since(first), Duration::from_secs(5));
    }
}
