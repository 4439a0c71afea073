//! Process-wide token-bucket rate limiter.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

struct BucketState {
    tokens: u64,
    last_refill: Instant,
}

/// Token bucket with burst capacity `2 × qps` and whole-second refill steps
/// of `qps` tokens computed from elapsed wall time. `qps == 0` or the
/// disabled flag means 100% pass-through.
pub struct TokenBucket {
    enabled: bool,
    qps: u64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(enabled: bool, qps: u64) -> Self {
        Self {
            enabled,
            qps,
            state: Mutex::new(BucketState {
                // Start full: a fresh process accepts its burst allowance.
                tokens: qps.saturating_mul(2),
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        if !self.enabled || self.qps == 0 {
            return true;
        }

        let mut state = self.state.lock();
        let elapsed = state.last_refill.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let refill = elapsed.as_secs() * self.qps;
            state.tokens = (state.tokens + refill).min(self.qps * 2);
            state.last_refill = Instant::now();
        }

        if state.tokens > 0 {
            state.tokens -= 1;
            true
        } else {
            false
        }
    }
}
