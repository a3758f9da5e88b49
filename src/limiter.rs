//! Token budget for generation requests.
//!
//! A [`TokenBudget`] admits at most `limit` tokens per fixed window. The window resets lazily: the
//! first reservation after the window has elapsed starts a new one, under the same lock that
//! records the spend. Time comes from an injected [`Clock`] so tests never sleep.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Source of time for the budget.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock; `sleep` blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when told to. Sleeping advances it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("request of {requested} tokens exceeds the limit of {limit} per window")]
    ExceedsLimit { requested: u64, limit: u64 },
    #[error("token budget exhausted; window resets in {retry_after:?}")]
    Exhausted { retry_after: Duration },
}

#[derive(Debug)]
struct Window {
    start: Instant,
    used: u64,
}

/// Shared token budget; clone the surrounding `Arc` to share it.
pub struct TokenBudget {
    limit: u64,
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<Window>,
}

impl std::fmt::Debug for TokenBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBudget")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("used", &self.lock().used)
            .finish()
    }
}

impl TokenBudget {
    pub fn new(limit: u64, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self {
            limit,
            window,
            clock,
            state: Mutex::new(Window { start, used: 0 }),
        }
    }

    /// Budget on the wall clock.
    pub fn system(limit: u64, window: Duration) -> Self {
        Self::new(limit, window, Arc::new(SystemClock))
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Tokens spent in the current window.
    pub fn used(&self) -> u64 {
        let mut state = self.lock();
        self.roll(&mut state);
        state.used
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn roll(&self, state: &mut Window) {
        let now = self.clock.now();
        if now.duration_since(state.start) >= self.window {
            state.start = now;
            state.used = 0;
        }
    }

    /// Spend `tokens` now, or report how long until the window resets.
    pub fn try_reserve(&self, tokens: u64) -> Result<(), BudgetError> {
        if tokens > self.limit {
            return Err(BudgetError::ExceedsLimit {
                requested: tokens,
                limit: self.limit,
            });
        }
        let mut state = self.lock();
        self.roll(&mut state);
        if state.used + tokens <= self.limit {
            state.used += tokens;
            return Ok(());
        }
        let elapsed = self.clock.now().duration_since(state.start);
        Err(BudgetError::Exhausted {
            retry_after: self.window.saturating_sub(elapsed),
        })
    }

    /// Spend `tokens`, sleeping on the clock until the budget admits them.
    pub fn reserve(&self, tokens: u64) -> Result<(), BudgetError> {
        loop {
            match self.try_reserve(tokens) {
                Err(BudgetError::Exhausted { retry_after }) => {
                    tracing::info!(?retry_after, tokens, "token budget exhausted; waiting");
                    self.clock.sleep(retry_after.max(Duration::from_millis(1)));
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(limit: u64) -> (Arc<ManualClock>, TokenBudget) {
        let clock = Arc::new(ManualClock::new());
        let budget = TokenBudget::new(limit, Duration::from_secs(60), clock.clone());
        (clock, budget)
    }

    #[test]
    fn test_reservations_within_window() {
        let (clock, budget) = budget(100);
        assert!(budget.try_reserve(60).is_ok());
        assert!(budget.try_reserve(40).is_ok());
        clock.advance(Duration::from_secs(15));
        assert_eq!(
            budget.try_reserve(1),
            Err(BudgetError::Exhausted {
                retry_after: Duration::from_secs(45)
            })
        );
        assert_eq!(budget.used(), 100);
    }

    #[test]
    fn test_window_resets_lazily() {
        let (clock, budget) = budget(100);
        assert!(budget.try_reserve(100).is_ok());
        clock.advance(Duration::from_secs(60));
        assert_eq!(budget.used(), 0);
        assert!(budget.try_reserve(100).is_ok());
    }

    #[test]
    fn test_reserve_waits_on_the_clock() {
        let (clock, budget) = budget(10);
        let start = clock.now();
        budget.reserve(8).unwrap();
        budget.reserve(8).unwrap();
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(60));
    }

    #[test]
    fn test_oversized_requests_fail() {
        let (_, budget) = budget(10);
        assert_eq!(
            budget.reserve(11),
            Err(BudgetError::ExceedsLimit {
                requested: 11,
                limit: 10
            })
        );
    }

    #[test]
    fn test_budget_is_shared_across_threads() {
        let (_, budget) = budget(1000);
        let budget = Arc::new(budget);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let budget = Arc::clone(&budget);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        budget.try_reserve(5).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(budget.used(), 200);
    }
}
