//! Per-part mutual exclusion for serial allocation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One lock per part number, created on first use.
///
/// Entries are never removed; the map stays as large as the set of part
/// numbers printed, which the parts catalog bounds.
///
/// Holding a part's lock from counter read to counter write means no two
/// allocations in this process can observe the same `next`.
#[derive(Debug, Default)]
pub struct PartLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PartLocks {
    /// No locks yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `part_number`.
    pub fn with_part<R>(&self, part_number: &str, f: impl FnOnce() -> R) -> R {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(part_number.to_string()).or_default())
        };
        // The guarded value is `()`, so a poisoned lock carries no bad state.
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_part_is_exclusive() {
        let locks = Arc::new(PartLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    locks.with_part("PN-1", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_parts_do_not_block_each_other() {
        let locks = PartLocks::new();
        let out = locks.with_part("A", || locks.with_part("B", || 42));
        assert_eq!(out, 42);
    }
}
