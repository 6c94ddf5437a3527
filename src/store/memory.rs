//! In-process store used by the test suite. Single mutex per map is plenty:
//! contention is not what these tests measure.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{CounterStore, QueueStore, StoreError};

#[derive(Debug)]
struct CounterEntry {
    value: i64,
    expires_at: Option<Instant>,
}

impl CounterEntry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// Implements both store traits in memory, with lazily-enforced TTLs and
/// pop/push operation counters so tests can assert the cost bounds of the
/// drain protocol.
#[derive(Debug, Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, CounterEntry>>,
    queues: Mutex<HashMap<String, VecDeque<String>>>,
    enqueues: AtomicU64,
    dequeues: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total enqueue operations performed so far.
    pub fn enqueue_ops(&self) -> u64 {
        self.enqueues.load(Ordering::SeqCst)
    }

    /// Total dequeue operations performed so far (empty pops included).
    pub fn dequeue_ops(&self) -> u64 {
        self.dequeues.load(Ordering::SeqCst)
    }

    pub fn reset_ops(&self) {
        self.enqueues.store(0, Ordering::SeqCst);
        self.dequeues.store(0, Ordering::SeqCst);
    }

    /// Drop every counter and queue.
    pub fn clear(&self) {
        self.counters.lock().expect("store lock poisoned").clear();
        self.queues.lock().expect("store lock poisoned").clear();
    }

    fn add(&self, key: &str, n: i64) -> i64 {
        let mut counters = self.counters.lock().expect("store lock poisoned");
        if counters.get(key).is_some_and(CounterEntry::expired) {
            counters.remove(key);
        }
        let entry = counters.entry(key.to_string()).or_insert(CounterEntry {
            value: 0,
            expires_at: None,
        });
        entry.value += n;
        entry.value
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.add(key, 1))
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.add(key, -1))
    }

    async fn increment_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        Ok(self.add(key, n))
    }

    async fn decrement_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        Ok(self.add(key, -n))
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let counters = self.counters.lock().expect("store lock poisoned");
        Ok(counters
            .get(key)
            .filter(|e| !e.expired())
            .map(|e| e.value))
    }

    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError> {
        let mut counters = self.counters.lock().expect("store lock poisoned");
        if counters.get(key).is_some_and(CounterEntry::expired) {
            counters.remove(key);
        }
        if counters.contains_key(key) {
            return Ok(false);
        }
        counters.insert(
            key.to_string(),
            CounterEntry {
                value,
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn get_and_set(&self, key: &str, value: i64) -> Result<Option<i64>, StoreError> {
        let mut counters = self.counters.lock().expect("store lock poisoned");
        if counters.get(key).is_some_and(CounterEntry::expired) {
            counters.remove(key);
        }
        // As in Redis, a plain SET discards any existing expiry.
        let previous = counters.insert(
            key.to_string(),
            CounterEntry {
                value,
                expires_at: None,
            },
        );
        Ok(previous.map(|e| e.value))
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut counters = self.counters.lock().expect("store lock poisoned");
        if let Some(entry) = counters.get_mut(key).filter(|e| !e.expired()) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.counters
            .lock()
            .expect("store lock poisoned")
            .remove(key);
        Ok(())
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let counters = self.counters.lock().expect("store lock poisoned");
        Ok(counters
            .get(key)
            .filter(|e| !e.expired())
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()).as_secs()))
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn enqueue(&self, queue: &str, payload: &str) -> Result<(), StoreError> {
        self.enqueues.fetch_add(1, Ordering::SeqCst);
        let mut queues = self.queues.lock().expect("store lock poisoned");
        queues
            .entry(queue.to_string())
            .or_default()
            .push_back(payload.to_string());
        Ok(())
    }

    async fn dequeue_head(&self, queue: &str) -> Result<Option<String>, StoreError> {
        self.dequeues.fetch_add(1, Ordering::SeqCst);
        let mut queues = self.queues.lock().expect("store lock poisoned");
        Ok(queues.get_mut(queue).and_then(VecDeque::pop_front))
    }

    async fn length(&self, queue: &str) -> Result<u64, StoreError> {
        let queues = self.queues.lock().expect("store lock poisoned");
        Ok(queues.get(queue).map_or(0, |q| q.len() as u64))
    }
}
