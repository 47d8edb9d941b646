use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gatewatch_types::PersonId;
use parking_lot::Mutex;

use crate::AccessError;

/// Per-person locks for scan verification.
/// Scans of different persons run concurrently.
/// Scans of the same person are serialized, with a bounded wait.
pub struct PersonLocks {
    /// Per-person mutexes
    locks: Mutex<HashMap<PersonId, Arc<Mutex<()>>>>,
    /// Longest a caller waits for a person's lock
    timeout: Duration,
}

impl PersonLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Get or create the lock for a specific person.
    fn person_lock(&self, person: &PersonId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(person.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `f` while holding `person`'s lock.
    ///
    /// Fails with [`AccessError::Contention`] if the lock is not acquired
    /// within the timeout; `f` is not run in that case.
    pub fn run_exclusive<F, R>(&self, person: &PersonId, f: F) -> Result<R, AccessError>
    where
        F: FnOnce() -> R,
    {
        let lock = self.person_lock(person);
        let result = match lock.try_lock_for(self.timeout) {
            Some(_guard) => Some(f()),
            None => None,
        };
        drop(lock);
        self.release(person);
        result.ok_or_else(|| {
            tracing::warn!(
                person = %person,
                timeout_ms = self.timeout.as_millis() as u64,
                "person lock not acquired in time"
            );
            AccessError::Contention(person.clone())
        })
    }

    /// Drop the table entry for `person` if nobody else holds or awaits it.
    fn release(&self, person: &PersonId) {
        let mut locks = self.locks.lock();
        if locks
            .get(person)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(person);
        }
    }

    /// Number of persons with a scan in flight or waiting.
    #[cfg(test)]
    fn active_persons(&self) -> usize {
        self.locks.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Barrier;
    use std::time::Instant;

    #[test]
    fn test_basic_run() {
        let locks = PersonLocks::new(Duration::from_millis(100));
        let result = locks.run_exclusive(&PersonId::from("p"), || 42).unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_different_persons_run_in_parallel() {
        let locks = Arc::new(PersonLocks::new(Duration::from_secs(1)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let l = Arc::clone(&locks);
                std::thread::spawn(move || {
                    l.run_exclusive(&PersonId::new(format!("person_{i}")), || {
                        std::thread::sleep(Duration::from_millis(50));
                        i
                    })
                    .unwrap()
                })
            })
            .collect();

        let mut results: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let elapsed = start.elapsed();
        // All four should run in parallel, so total time should be
        // close to 50ms, not 200ms. Allow generous margin.
        assert!(
            elapsed < Duration::from_millis(180),
            "Expected parallel execution, took {elapsed:?}"
        );
        results.sort();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_same_person_serialized() {
        let locks = Arc::new(PersonLocks::new(Duration::from_secs(5)));
        let inside = Arc::new(AtomicU64::new(0));
        let max_seen = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let l = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                std::thread::spawn(move || {
                    l.run_exclusive(&PersonId::from("same"), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                    .unwrap()
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_times_out_with_contention() {
        let locks = Arc::new(PersonLocks::new(Duration::from_millis(20)));
        let barrier = Arc::new(Barrier::new(2));

        let holder = {
            let l = Arc::clone(&locks);
            let b = Arc::clone(&barrier);
            std::thread::spawn(move || {
                l.run_exclusive(&PersonId::from("p"), || {
                    b.wait();
                    std::thread::sleep(Duration::from_millis(200));
                })
                .unwrap()
            })
        };

        barrier.wait();
        let ran = AtomicU64::new(0);
        let result = locks.run_exclusive(&PersonId::from("p"), || {
            ran.fetch_add(1, Ordering::SeqCst);
        });
        assert!(matches!(result, Err(AccessError::Contention(_))));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        holder.join().unwrap();
    }

    #[test]
    fn test_idle_locks_are_released() {
        let locks = PersonLocks::new(Duration::from_millis(100));
        locks.run_exclusive(&PersonId::from("a"), || ()).unwrap();
        locks.run_exclusive(&PersonId::from("b"), || ()).unwrap();
        assert_eq!(locks.active_persons(), 0);
    }
}
