//! Queue store port
//!
//! The shared store is the only coordination channel between orchestrator
//! instances. It is modeled on a Redis-like server: lists used as queues,
//! hashes, sets, expiring keys, and publish/subscribe.
//!
//! # List conventions
//!
//! [`QueueStore::push`] adds at the head of a list and every move takes from
//! the tail, so a list behaves as a FIFO queue.
//!
//! # Atomicity
//!
//! Each method is a single indivisible operation against the store. The
//! compound operations ([`QueueStore::requeue`], [`QueueStore::commit`]) are
//! where a networked implementation would use a transaction or script.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Wrong type for key {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl StoreError {
    /// Errors the task loop retries after a backoff. Anything else stops
    /// the instance.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::ConnectionError(_) | StoreError::Timeout)
    }
}

/// Messages received on a subscribed channel.
pub struct Subscription {
    pub receiver: mpsc::UnboundedReceiver<String>,
}

impl Subscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<String>) -> Self {
        Self { receiver }
    }

    /// Next message, or `None` once the store drops the channel.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// A message already waiting, without blocking.
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// Shared store used for task queues and instance coordination.
///
/// Implementations live in the infrastructure layer.
#[async_trait]
pub trait QueueStore: Send + Sync {
    // ==================== Lists ====================

    /// Push `item` onto the head of `list`. Returns the new length.
    async fn push(&self, list: &str, item: &str) -> Result<usize, StoreError>;

    /// Move the tail of `src` onto the head of `dst`, waiting up to `timeout`
    /// for `src` to become non-empty.
    async fn blocking_move(
        &self,
        src: &str,
        dst: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError>;

    /// Move the tail of `src` onto the head of `dst` without waiting.
    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<String>, StoreError>;

    /// All items from head to tail.
    async fn range(&self, list: &str) -> Result<Vec<String>, StoreError>;

    async fn len(&self, list: &str) -> Result<usize, StoreError>;

    /// Remove `item` from `src` and, only if it was there, push it onto `dst`.
    async fn requeue(&self, src: &str, item: &str, dst: &str) -> Result<bool, StoreError>;

    /// Remove `item` from `processing` and, only if it was there, push
    /// `record` onto `dest`. Returns whether the record was pushed.
    async fn commit(
        &self,
        processing: &str,
        item: &str,
        dest: &str,
        record: &str,
    ) -> Result<bool, StoreError>;

    // ==================== Hashes ====================

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// Every field of the hash; empty if the key does not exist.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    // ==================== Keys ====================

    /// Delete a key of any type. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Set a string key that expires after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Expire a key of any type after `ttl`. Returns whether it existed.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Read a string key; expired keys read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    // ==================== Sets ====================

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    async fn set_remove(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError>;

    // ==================== Pub/Sub ====================

    /// Publish to every current subscriber. Returns how many received it.
    async fn publish(&self, channel: &str, message: &str) -> Result<usize, StoreError>;

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError>;
}
