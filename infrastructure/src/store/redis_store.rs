//! Redis implementation of the queue store.
//!
//! Separate orchestrator processes coordinate through one Redis server. Plain
//! commands share a multiplexed connection. `BLMOVE` parks its connection
//! until an item arrives, so blocking claims take a dedicated connection from
//! a small idle pool instead. The two compound operations run as one Lua
//! script each, which Redis executes atomically.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError, Script};
use std::collections::HashMap;
use std::time::Duration;
use swarm_application::{QueueStore, StoreError, Subscription};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

/// Remove one `ARGV[1]` from list `KEYS[1]`; only if found, push `ARGV[2]`
/// onto the head of `KEYS[2]`.
const REMOVE_THEN_PUSH: &str = r"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) == 1 then
    redis.call('LPUSH', KEYS[2], ARGV[2])
    return 1
end
return 0
";

/// Map a client error onto the port's error kinds.
///
/// `key` and `expected` describe the command, for `WRONGTYPE` replies.
fn store_error(error: RedisError, key: &str, expected: &'static str) -> StoreError {
    if error.code() == Some("WRONGTYPE") {
        StoreError::WrongType {
            key: key.to_string(),
            expected,
        }
    } else if error.is_timeout() {
        StoreError::Timeout
    } else if error.is_connection_refusal() || error.is_connection_dropped() || error.is_io_error()
    {
        StoreError::ConnectionError(error.to_string())
    } else {
        StoreError::Other(error.to_string())
    }
}

fn millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Queue store backed by a Redis server
pub struct RedisQueueStore {
    client: Client,
    connection: MultiplexedConnection,
    idle_blocking: Mutex<Vec<MultiplexedConnection>>,
    conditional_push: Script,
}

impl RedisQueueStore {
    /// Connect to `url` (`redis://host:port/db` or `rediss://...`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)
            .map_err(|e| StoreError::Other(format!("invalid store url: {e}")))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| store_error(e, "", "connection"))?;

        info!(addr = %client.get_connection_info().addr, "Connected to Redis");
        Ok(Self {
            client,
            connection,
            idle_blocking: Mutex::new(Vec::new()),
            conditional_push: Script::new(REMOVE_THEN_PUSH),
        })
    }

    fn conn(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    async fn blocking_connection(&self) -> Result<MultiplexedConnection, StoreError> {
        if let Some(conn) = self.idle_blocking.lock().await.pop() {
            return Ok(conn);
        }
        debug!("Opening connection for blocking claims");
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| store_error(e, "", "connection"))
    }

    async fn remove_then_push(
        &self,
        src: &str,
        item: &str,
        dst: &str,
        payload: &str,
    ) -> Result<bool, StoreError> {
        let moved: i64 = self
            .conditional_push
            .key(src)
            .key(dst)
            .arg(item)
            .arg(payload)
            .invoke_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, src, "list"))?;
        Ok(moved == 1)
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn push(&self, list: &str, item: &str) -> Result<usize, StoreError> {
        redis::cmd("LPUSH")
            .arg(list)
            .arg(item)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, list, "list"))
    }

    async fn blocking_move(
        &self,
        src: &str,
        dst: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        // A zero timeout would block forever
        if timeout.is_zero() {
            return self.move_one(src, dst).await;
        }

        let mut conn = self.blocking_connection().await?;
        let moved: Option<String> = redis::cmd("BLMOVE")
            .arg(src)
            .arg(dst)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(timeout.as_secs_f64())
            .query_async(&mut conn)
            .await
            .map_err(|e| store_error(e, src, "list"))?;

        // Only healthy connections go back to the pool
        self.idle_blocking.lock().await.push(conn);
        Ok(moved)
    }

    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<String>, StoreError> {
        redis::cmd("LMOVE")
            .arg(src)
            .arg(dst)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, src, "list"))
    }

    async fn range(&self, list: &str) -> Result<Vec<String>, StoreError> {
        redis::cmd("LRANGE")
            .arg(list)
            .arg(0)
            .arg(-1)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, list, "list"))
    }

    async fn len(&self, list: &str) -> Result<usize, StoreError> {
        redis::cmd("LLEN")
            .arg(list)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, list, "list"))
    }

    async fn requeue(&self, src: &str, item: &str, dst: &str) -> Result<bool, StoreError> {
        self.remove_then_push(src, item, dst, item).await
    }

    async fn commit(
        &self,
        processing: &str,
        item: &str,
        dest: &str,
        record: &str,
    ) -> Result<bool, StoreError> {
        self.remove_then_push(processing, item, dest, record).await
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        let _added: i64 = cmd
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "hash"))?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "hash"))
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let removed: i64 = redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "hash"))?;
        Ok(removed > 0)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "any"))?;
        Ok(removed > 0)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis(ttl))
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "string"))?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let applied: i64 = redis::cmd("PEXPIRE")
            .arg(key)
            .arg(millis(ttl))
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "any"))?;
        Ok(applied == 1)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, key, "string"))
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let added: i64 = redis::cmd("SADD")
            .arg(set)
            .arg(member)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, set, "set"))?;
        Ok(added == 1)
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let removed: i64 = redis::cmd("SREM")
            .arg(set)
            .arg(member)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, set, "set"))?;
        Ok(removed == 1)
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        redis::cmd("SMEMBERS")
            .arg(set)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, set, "set"))
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<usize, StoreError> {
        redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut self.conn())
            .await
            .map_err(|e| store_error(e, channel, "channel"))
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| store_error(e, channel, "channel"))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| store_error(e, channel, "channel"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let name = channel.to_string();
        tokio::spawn(async move {
            let mut messages = pubsub.into_on_message();
            while let Some(message) = messages.next().await {
                match message.get_payload::<String>() {
                    Ok(payload) => {
                        if tx.send(payload).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(channel = %name, error = %e, "Unreadable message"),
                }
            }
            debug!(channel = %name, "Subscription ended");
        });

        Ok(Subscription::new(rx))
    }
}
