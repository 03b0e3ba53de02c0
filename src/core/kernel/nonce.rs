use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Wall clock in milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// Source of request nonces for one credential set.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Millisecond nonces that strictly increase even when requests are issued
/// within the same millisecond or the clock steps backwards.
///
/// `offset_ms` shifts the clock reading for exchanges whose server time is
/// known to differ; skew is otherwise not corrected.
pub struct MonotonicNonce<C: Clock = SystemClock> {
    clock: C,
    offset_ms: i64,
    last: AtomicU64,
}

impl MonotonicNonce<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MonotonicNonce<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MonotonicNonce<C> {
    pub const fn with_clock(clock: C) -> Self {
        Self {
            clock,
            offset_ms: 0,
            last: AtomicU64::new(0),
        }
    }

    pub const fn with_offset(mut self, offset_ms: i64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    fn reading(&self) -> u64 {
        self.clock.now_millis().saturating_add_signed(self.offset_ms)
    }
}

impl<C: Clock> NonceSource for MonotonicNonce<C> {
    fn next_nonce(&self) -> u64 {
        let now = self.reading();
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }
}

impl<C: Clock> std::fmt::Debug for MonotonicNonce<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonotonicNonce")
            .field("offset_ms", &self.offset_ms)
            .field("last", &self.last.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Always the same nonce; for reproducible signatures in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u64);

impl NonceSource for FixedNonce {
    fn next_nonce(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_strictly_increasing_with_frozen_clock() {
        let nonce = MonotonicNonce::with_clock(FixedClock(1_000));
        assert_eq!(nonce.next_nonce(), 1_000);
        assert_eq!(nonce.next_nonce(), 1_001);
        assert_eq!(nonce.next_nonce(), 1_002);
    }

    #[test]
    fn test_offset_applied() {
        let nonce = MonotonicNonce::with_clock(FixedClock(1_000)).with_offset(-250);
        assert_eq!(nonce.next_nonce(), 750);
    }

    #[tokio::test]
    async fn test_concurrent_issuance_never_repeats() {
        let nonce = Arc::new(MonotonicNonce::with_clock(FixedClock(5)));
        let tasks = (0..64).map(|_| {
            let nonce = Arc::clone(&nonce);
            tokio::spawn(async move { (0..50).map(|_| nonce.next_nonce()).collect::<Vec<_>>() })
        });
        let results = futures::future::join_all(tasks).await;

        let mut seen = HashSet::new();
        for batch in results {
            for value in batch.unwrap() {
                assert!(seen.insert(value), "nonce {} issued twice", value);
            }
        }
        assert_eq!(seen.len(), 64 * 50);
    }
}
