//! Redis-backed store. Counter keys are used verbatim; queue lists live under
//! `queue:<name>`, the layout existing deployments already use, so this layer
//! can sit in front of queues that were populated by other tooling.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::{CounterStore, QueueStore, StoreError};

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and wrap a multiplexed connection manager; the manager
    /// reconnects on its own, individual command failures still surface.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        debug!(url, "connected to redis");
        Ok(Self { conn })
    }

    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn queue_key(queue: &str) -> String {
        format!("queue:{}", queue)
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1i64).await?)
    }

    async fn decrement(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.decr(key, 1i64).await?)
    }

    async fn increment_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, n).await?)
    }

    async fn decrement_by(&self, key: &str, n: i64) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.decr(key, n).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set_if_absent(&self, key: &str, value: i64) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.set_nx(key, value).await?)
    }

    async fn get_and_set(&self, key: &str, value: i64) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.getset(key, value).await?)
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: bool = conn.expire(key, seconds as i64).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn.clone();
        // TTL replies -2 for a missing key and -1 for a key with no expiry.
        let ttl: i64 = conn.ttl(key).await?;
        Ok(if ttl >= 0 { Some(ttl as u64) } else { None })
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    async fn enqueue(&self, queue: &str, payload: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.rpush(Self::queue_key(queue), payload).await?;
        Ok(())
    }

    async fn dequeue_head(&self, queue: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.lpop(Self::queue_key(queue), None).await?)
    }

    async fn length(&self, queue: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let len: i64 = conn.llen(Self::queue_key(queue)).await?;
        Ok(len.max(0) as u64)
    }
}
