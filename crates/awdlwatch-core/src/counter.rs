//! Intervention counter.
//!
//! Counts how many times the engine forced the target interface back down.
//! Incremented only by the enforcement loop, once per successful corrective
//! write; read and reset from any caller thread. Lives for the process,
//! nothing is persisted.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic count of corrective actions, resettable.
#[derive(Debug, Default)]
pub struct InterventionCounter {
    count: AtomicU64,
}

impl InterventionCounter {
    pub fn new() -> Self {
        Self { count: AtomicU64::new(0) }
    }

    /// Record one corrective action. Never called for a reconciliation that
    /// found the interface already in the desired state.
    #[inline]
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Current count.
    #[inline]
    pub fn read(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_and_read() {
        let c = InterventionCounter::new();
        assert_eq!(c.read(), 0);

        c.increment();
        c.increment();
        assert_eq!(c.read(), 2);
    }

    #[test]
    fn test_reset() {
        let c = InterventionCounter::new();
        c.increment();
        c.reset();
        assert_eq!(c.read(), 0);
    }

    #[test]
    fn test_concurrent_increment() {
        let c = Arc::new(InterventionCounter::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.increment();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.read(), 4000);
    }
}
