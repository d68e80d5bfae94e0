//! AIMD concurrency controller

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};

/// Errors that can tell the controller a provider is rate limiting.
pub trait RateLimitAware {
    fn is_rate_limit(&self) -> bool;
}

/// Bounds and starting point for the adaptive limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub initial: usize,
    pub min: usize,
    pub max: usize,
    /// Minimum spacing between two decreases
    pub cooldown: Duration,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            initial: 4,
            min: 1,
            max: 16,
            cooldown: Duration::from_secs(5),
        }
    }
}

impl ConcurrencyConfig {
    pub fn new(initial: usize, min: usize, max: usize, cooldown: Duration) -> Self {
        Self {
            initial,
            min,
            max,
            cooldown,
        }
    }

    /// Clamp bounds so `1 <= min <= initial <= max`.
    fn normalized(self) -> Self {
        let min = self.min.max(1);
        let max = self.max.max(min);
        Self {
            initial: self.initial.clamp(min, max),
            min,
            max,
            cooldown: self.cooldown,
        }
    }
}

/// Point-in-time view of the controller counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub current_concurrency: usize,
    pub current_running: usize,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug)]
struct ControllerState {
    limit: usize,
    running: usize,
    last_decrease: Option<Instant>,
}

/// Additive-increase / multiplicative-decrease admission control.
///
/// The counters are private; callers go through [`acquire`](Self::acquire),
/// [`run`](Self::run) and [`notify_rate_limit`](Self::notify_rate_limit).
/// A halving applies to new admissions immediately, while work already
/// admitted keeps its slot. The reported concurrency is therefore
/// `max(limit, running)`, which keeps `running <= concurrency` observable at
/// every instant.
#[derive(Debug)]
pub struct AdaptiveConcurrencyController {
    config: ConcurrencyConfig,
    state: Mutex<ControllerState>,
    released: Notify,
}

impl AdaptiveConcurrencyController {
    pub fn new(config: ConcurrencyConfig) -> Self {
        let config = config.normalized();
        Self {
            config,
            state: Mutex::new(ControllerState {
                limit: config.initial,
                running: 0,
                last_decrease: None,
            }),
            released: Notify::new(),
        }
    }

    pub fn config(&self) -> &ConcurrencyConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_concurrency(&self) -> usize {
        let state = self.lock();
        state.limit.max(state.running)
    }

    pub fn current_running(&self) -> usize {
        self.lock().running
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let state = self.lock();
        ControllerSnapshot {
            current_concurrency: state.limit.max(state.running),
            current_running: state.running,
            min: self.config.min,
            max: self.config.max,
        }
    }

    /// Wait until `running < limit`, then take a slot.
    pub async fn acquire(&self) -> ConcurrencyPermit<'_> {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            // Register before checking so a release between check and await is not lost
            notified.as_mut().enable();
            {
                let mut state = self.lock();
                if state.running < state.limit {
                    state.running += 1;
                    return ConcurrencyPermit {
                        controller: self,
                        succeeded: false,
                    };
                }
            }
            notified.await;
        }
    }

    /// Halve the limit, floored at `min`.
    ///
    /// Returns `false` when the call falls inside the cooldown window of the
    /// previous decrease and was ignored.
    pub fn notify_rate_limit(&self) -> bool {
        let mut state = self.lock();
        let now = Instant::now();
        let cooling = state
            .last_decrease
            .is_some_and(|last| now.duration_since(last) < self.config.cooldown);
        if cooling {
            debug!(limit = state.limit, "Rate limit signal ignored during cooldown");
            return false;
        }
        let previous = state.limit;
        state.limit = (state.limit / 2).max(self.config.min);
        state.last_decrease = Some(now);
        info!(from = previous, to = state.limit, "Rate limited, reducing concurrency");
        true
    }

    /// Run `op` inside a slot.
    ///
    /// Success raises the limit by one. A rate-limit error triggers
    /// [`notify_rate_limit`](Self::notify_rate_limit) after the slot is
    /// released; every error is returned unchanged.
    pub async fn run<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitAware,
    {
        let permit = self.acquire().await;
        match op().await {
            Ok(value) => {
                permit.succeed();
                Ok(value)
            }
            Err(e) => {
                drop(permit);
                if e.is_rate_limit() {
                    self.notify_rate_limit();
                }
                Err(e)
            }
        }
    }

    fn release(&self, succeeded: bool) {
        {
            let mut state = self.lock();
            state.running = state.running.saturating_sub(1);
            if succeeded && state.limit < self.config.max {
                state.limit += 1;
            }
        }
        self.released.notify_waiters();
    }
}

/// A held slot. Dropping it releases the slot without adjusting the limit.
#[must_use = "dropping the permit releases the slot immediately"]
pub struct ConcurrencyPermit<'a> {
    controller: &'a AdaptiveConcurrencyController,
    succeeded: bool,
}

impl ConcurrencyPermit<'_> {
    /// Release the slot and record a success.
    pub fn succeed(mut self) {
        self.succeeded = true;
    }
}

impl Drop for ConcurrencyPermit<'_> {
    fn drop(&mut self) {
        self.controller.release(self.succeeded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestError {
        rate_limited: bool,
    }

    impl RateLimitAware for TestError {
        fn is_rate_limit(&self) -> bool {
            self.rate_limited
        }
    }

    fn controller(initial: usize, min: usize, max: usize) -> AdaptiveConcurrencyController {
        AdaptiveConcurrencyController::new(ConcurrencyConfig::new(
            initial,
            min,
            max,
            Duration::from_secs(10),
        ))
    }

    #[tokio::test]
    async fn test_successes_increase_limit_capped_at_max() {
        let c = controller(2, 1, 6);
        for _ in 0..3 {
            let r: Result<(), TestError> = c.run(|| async { Ok(()) }).await;
            assert!(r.is_ok());
        }
        assert_eq!(c.current_concurrency(), 5);
        for _ in 0..5 {
            let _: Result<(), TestError> = c.run(|| async { Ok(()) }).await;
        }
        assert_eq!(c.current_concurrency(), 6);
        assert_eq!(c.current_running(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_halves_with_cooldown() {
        let c = controller(16, 3, 32);
        assert!(c.notify_rate_limit());
        assert_eq!(c.current_concurrency(), 8);

        // Within cooldown: no effect
        assert!(!c.notify_rate_limit());
        assert_eq!(c.current_concurrency(), 8);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(c.notify_rate_limit());
        assert_eq!(c.current_concurrency(), 4);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(c.notify_rate_limit());
        assert_eq!(c.current_concurrency(), 3);
    }

    #[tokio::test]
    async fn test_failure_releases_without_increase() {
        let c = controller(2, 1, 8);
        let r: Result<(), TestError> = c
            .run(|| async { Err(TestError { rate_limited: false }) })
            .await;
        assert!(r.is_err());
        assert_eq!(c.current_running(), 0);
        assert_eq!(c.current_concurrency(), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_error_propagates_and_decreases() {
        let c = controller(8, 1, 8);
        let r: Result<(), TestError> = c
            .run(|| async { Err(TestError { rate_limited: true }) })
            .await;
        assert!(r.unwrap_err().rate_limited);
        assert_eq!(c.current_running(), 0);
        assert_eq!(c.current_concurrency(), 4);
    }

    #[tokio::test]
    async fn test_running_never_exceeds_concurrency_under_load() {
        let c = Arc::new(controller(2, 1, 2));
        let peak = Arc::new(AtomicUsize::new(0));
        let violations = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let c = Arc::clone(&c);
            let peak = Arc::clone(&peak);
            let violations = Arc::clone(&violations);
            handles.push(tokio::spawn(async move {
                let inner = Arc::clone(&c);
                let _: Result<(), TestError> = c
                    .run(|| async move {
                        let snapshot = inner.snapshot();
                        if snapshot.current_running > snapshot.current_concurrency {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                        peak.fetch_max(snapshot.current_running, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok(())
                    })
                    .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(violations.load(Ordering::SeqCst), 0);
        assert_eq!(c.current_running(), 0);
    }

    #[tokio::test]
    async fn test_halving_below_running_reports_running() {
        let c = controller(4, 1, 4);
        let p1 = c.acquire().await;
        let p2 = c.acquire().await;
        let p3 = c.acquire().await;
        c.notify_rate_limit();
        let snapshot = c.snapshot();
        assert_eq!(snapshot.current_running, 3);
        assert_eq!(snapshot.current_concurrency, 3);
        drop(p1);
        drop(p2);
        drop(p3);
        assert_eq!(c.current_concurrency(), 2);
    }

    #[tokio::test]
    async fn test_waiter_is_admitted_after_release() {
        let c = Arc::new(controller(1, 1, 1));
        let first = c.acquire().await;

        let waiter = {
            let c = Arc::clone(&c);
            tokio::spawn(async move {
                let permit = c.acquire().await;
                permit.succeed();
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        first.succeed();
        waiter.await.unwrap();
        assert_eq!(c.current_running(), 0);
    }

    #[test]
    fn test_config_normalized() {
        let c = AdaptiveConcurrencyController::new(ConcurrencyConfig::new(
            50,
            0,
            8,
            Duration::ZERO,
        ));
        assert_eq!(c.config().min, 1);
        assert_eq!(c.current_concurrency(), 8);
    }
}
