//! Interfaces over the external shared stores. Correctness of admission rests
//! entirely on these primitives being atomic across worker processes; the
//! core never caches values between calls.

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Store failures are surfaced to the caller as-is; retry policy belongs to
/// the surrounding worker, not this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Shared atomic counters. Increment/decrement return the post-operation
/// value; keys are created implicitly at zero.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;
    async fn decrement(&self, key: &str) -> Result<i64, StoreError>;
    async fn increment_by(&self, key: &str, n: i64) -> Result<i64, StoreError>;
    async fn decrement_by(&self, key: &str, n: i64) -> Result<i64, StoreError>;
    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError>;
    /// Returns true if the key was absent and has been set.
    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError>;
    async fn get_and_set(&self, key: &str, value: i64) -> Result<Option<i64>, StoreError>;
    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    /// Remaining TTL, `None` when the key is absent or has no expiry.
    async fn time_to_live(&self, key: &str) -> Result<Option<u64>, StoreError>;
}

/// Shared FIFO lists holding encoded job envelopes.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append to the tail of `queue`.
    async fn enqueue(&self, queue: &str, payload: &str) -> Result<(), StoreError>;
    /// Pop the head of `queue`, `None` when empty.
    async fn dequeue_head(&self, queue: &str) -> Result<Option<String>, StoreError>;
    async fn length(&self, queue: &str) -> Result<u64, StoreError>;
}
