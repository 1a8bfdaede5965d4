//! In-process implementation of the queue store.
//!
//! Keys are typed like a Redis keyspace: a key holds a list, hash, set or
//! string, and using it as another type is a [`StoreError::WrongType`].
//! Emptied lists, hashes and sets are removed. Any key may carry an expiry,
//! purged whenever the keyspace is locked. Deadlines use
//! `tokio::time::Instant` so tests can drive them with a paused clock.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use swarm_application::{QueueStore, StoreError, Subscription};
use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug)]
enum Value {
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
    Set(BTreeSet<String>),
    Str(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::List(_) => "list",
            Value::Hash(_) => "hash",
            Value::Set(_) => "set",
            Value::Str(_) => "string",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Value::List(l) => l.is_empty(),
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::Str(_) => false,
        }
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

#[derive(Default)]
struct Keyspace {
    keys: HashMap<String, Value>,
    deadlines: HashMap<String, Instant>,
    channels: HashMap<String, Vec<mpsc::UnboundedSender<String>>>,
}

impl Keyspace {
    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            trace!(key = %key, "Key expired");
            self.remove_key(&key);
        }
    }

    fn remove_key(&mut self, key: &str) -> bool {
        self.deadlines.remove(key);
        self.keys.remove(key).is_some()
    }

    fn drop_if_empty(&mut self, key: &str) {
        if self.keys.get(key).is_some_and(Value::is_empty) {
            self.remove_key(key);
        }
    }

    fn list(&self, key: &str) -> Result<Option<&VecDeque<String>>, StoreError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::List(l)) => Ok(Some(l)),
            Some(_) => Err(wrong_type(key, "list")),
        }
    }

    fn list_mut(&mut self, key: &str) -> Result<&mut VecDeque<String>, StoreError> {
        match self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()))
        {
            Value::List(l) => Ok(l),
            _ => Err(wrong_type(key, "list")),
        }
    }

    fn hash(&self, key: &str) -> Result<Option<&HashMap<String, String>>, StoreError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Hash(h)) => Ok(Some(h)),
            Some(_) => Err(wrong_type(key, "hash")),
        }
    }

    fn hash_mut(&mut self, key: &str) -> Result<&mut HashMap<String, String>, StoreError> {
        match self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(h) => Ok(h),
            _ => Err(wrong_type(key, "hash")),
        }
    }

    fn set(&self, key: &str) -> Result<Option<&BTreeSet<String>>, StoreError> {
        match self.keys.get(key) {
            None => Ok(None),
            Some(Value::Set(s)) => Ok(Some(s)),
            Some(_) => Err(wrong_type(key, "set")),
        }
    }

    fn set_mut(&mut self, key: &str) -> Result<&mut BTreeSet<String>, StoreError> {
        match self
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()))
        {
            Value::Set(s) => Ok(s),
            _ => Err(wrong_type(key, "set")),
        }
    }

    /// Type-check both lists before touching either.
    fn check_lists(&self, a: &str, b: &str) -> Result<(), StoreError> {
        self.list(a)?;
        self.list(b)?;
        Ok(())
    }

    fn pop_tail(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        if self.list(key)?.is_none() {
            return Ok(None);
        }
        let item = self.list_mut(key)?.pop_back();
        self.drop_if_empty(key);
        Ok(item)
    }

    fn push_head(&mut self, key: &str, item: String) -> Result<usize, StoreError> {
        let list = self.list_mut(key)?;
        list.push_front(item);
        Ok(list.len())
    }

    fn remove_one(&mut self, key: &str, item: &str) -> Result<usize, StoreError> {
        let Some(list) = self.list(key)? else {
            return Ok(0);
        };
        let Some(pos) = list.iter().position(|i| i == item) else {
            return Ok(0);
        };
        self.list_mut(key)?.remove(pos);
        self.drop_if_empty(key);
        Ok(1)
    }

    fn move_tail(&mut self, src: &str, dst: &str) -> Result<Option<String>, StoreError> {
        self.check_lists(src, dst)?;
        let Some(item) = self.pop_tail(src)? else {
            return Ok(None);
        };
        self.push_head(dst, item.clone())?;
        Ok(Some(item))
    }
}

/// Queue store held entirely in memory
///
/// Every operation takes one lock for its whole duration, which is what
/// makes the compound operations atomic. The lock is never held across an
/// `.await`.
#[derive(Default)]
pub struct InMemoryQueueStore {
    keyspace: Mutex<Keyspace>,
    /// Woken whenever an item lands on any list.
    pushed: Notify,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Keyspace>, StoreError> {
        let mut keyspace = self
            .keyspace
            .lock()
            .map_err(|_| StoreError::Other("store lock poisoned".to_string()))?;
        keyspace.purge_expired(Instant::now());
        Ok(keyspace)
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn push(&self, list: &str, item: &str) -> Result<usize, StoreError> {
        let len = self.lock()?.push_head(list, item.to_string())?;
        self.pushed.notify_waiters();
        Ok(len)
    }

    async fn blocking_move(
        &self,
        src: &str,
        dst: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register interest before checking, so a push between the check
            // and the wait is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let moved = self.lock()?.move_tail(src, dst)?;
            if let Some(item) = moved {
                trace!(src, dst, "Moved item");
                return Ok(Some(item));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<String>, StoreError> {
        let item = self.lock()?.move_tail(src, dst)?;
        if item.is_some() {
            self.pushed.notify_waiters();
        }
        Ok(item)
    }

    async fn range(&self, list: &str) -> Result<Vec<String>, StoreError> {
        let keyspace = self.lock()?;
        Ok(keyspace
            .list(list)?
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn len(&self, list: &str) -> Result<usize, StoreError> {
        Ok(self.lock()?.list(list)?.map_or(0, VecDeque::len))
    }

    async fn requeue(&self, src: &str, item: &str, dst: &str) -> Result<bool, StoreError> {
        {
            let mut keyspace = self.lock()?;
            keyspace.check_lists(src, dst)?;
            if keyspace.remove_one(src, item)? == 0 {
                return Ok(false);
            }
            keyspace.push_head(dst, item.to_string())?;
        }
        self.pushed.notify_waiters();
        Ok(true)
    }

    async fn commit(
        &self,
        processing: &str,
        item: &str,
        dest: &str,
        record: &str,
    ) -> Result<bool, StoreError> {
        {
            let mut keyspace = self.lock()?;
            keyspace.check_lists(processing, dest)?;
            if keyspace.remove_one(processing, item)? == 0 {
                return Ok(false);
            }
            keyspace.push_head(dest, record.to_string())?;
        }
        self.pushed.notify_waiters();
        Ok(true)
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut keyspace = self.lock()?;
        let hash = keyspace.hash_mut(key)?;
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        keyspace.drop_if_empty(key);
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self.lock()?.hash(key)?.cloned().unwrap_or_default())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut keyspace = self.lock()?;
        if keyspace.hash(key)?.is_none() {
            return Ok(false);
        }
        let removed = keyspace.hash_mut(key)?.remove(field).is_some();
        keyspace.drop_if_empty(key);
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove_key(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut keyspace = self.lock()?;
        if let Some(existing) = keyspace.keys.get(key)
            && !matches!(existing, Value::Str(_))
        {
            return Err(wrong_type(key, "string"));
        }
        keyspace
            .keys
            .insert(key.to_string(), Value::Str(value.to_string()));
        keyspace
            .deadlines
            .insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut keyspace = self.lock()?;
        if !keyspace.keys.contains_key(key) {
            return Ok(false);
        }
        keyspace
            .deadlines
            .insert(key.to_string(), Instant::now() + ttl);
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let keyspace = self.lock()?;
        match keyspace.keys.get(key) {
            None => Ok(None),
            Some(Value::Str(value)) => Ok(Some(value.clone())),
            Some(other) => {
                trace!(key, found = other.type_name(), "GET on non-string key");
                Err(wrong_type(key, "string"))
            }
        }
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.set_mut(set)?.insert(member.to_string()))
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut keyspace = self.lock()?;
        if keyspace.set(set)?.is_none() {
            return Ok(false);
        }
        let removed = keyspace.set_mut(set)?.remove(member);
        keyspace.drop_if_empty(set);
        Ok(removed)
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()?
            .set(set)?
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<usize, StoreError> {
        let mut keyspace = self.lock()?;
        let Some(subscribers) = keyspace.channels.get_mut(channel) else {
            return Ok(0);
        };
        subscribers.retain(|tx| tx.send(message.to_string()).is_ok());
        Ok(subscribers.len())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock()?
            .channels
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_push_and_move_are_fifo() {
        let store = InMemoryQueueStore::new();
        store.push("q", "a").await.unwrap();
        store.push("q", "b").await.unwrap();
        store.push("q", "c").await.unwrap();

        assert_eq!(store.move_one("q", "p").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.move_one("q", "p").await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.range("p").await.unwrap(), vec!["b", "a"]);
        assert_eq!(store.len("q").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blocking_move_times_out_on_empty() {
        let store = InMemoryQueueStore::new();
        let moved = store
            .blocking_move("empty", "dst", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(moved.is_none());
        assert_eq!(store.len("dst").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blocking_move_wakes_on_push() {
        let store = Arc::new(InMemoryQueueStore::new());
        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .blocking_move("q", "dst", Duration::from_secs(5))
                    .await
                    .unwrap()
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.push("q", "job").await.unwrap();

        assert_eq!(waiter.await.unwrap().as_deref(), Some("job"));
        assert_eq!(store.range("dst").await.unwrap(), vec!["job"]);
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_share_an_item() {
        let store = Arc::new(InMemoryQueueStore::new());
        for i in 0..50 {
            store.push("pending", &format!("task-{i}")).await.unwrap();
        }

        let mut handles = Vec::new();
        for worker in 0..5 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let dst = format!("processing:{worker}");
                while store
                    .blocking_move("pending", &dst, Duration::from_millis(5))
                    .await
                    .unwrap()
                    .is_some()
                {}
                store.range(&dst).await.unwrap()
            }));
        }

        let mut claimed = Vec::new();
        for handle in handles {
            claimed.extend(handle.await.unwrap());
        }
        claimed.sort();
        claimed.dedup();
        assert_eq!(claimed.len(), 50);
    }

    #[tokio::test]
    async fn test_commit_requires_ownership() {
        let store = InMemoryQueueStore::new();
        store.push("processing", "task").await.unwrap();

        assert!(store.commit("processing", "task", "done", "record").await.unwrap());
        assert_eq!(store.range("done").await.unwrap(), vec!["record"]);

        // Already removed: nothing pushed the second time
        assert!(!store.commit("processing", "task", "done", "record").await.unwrap());
        assert_eq!(store.len("done").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_requeue_only_moves_present_item() {
        let store = InMemoryQueueStore::new();
        store.push("processing", "task").await.unwrap();
        assert!(store.requeue("processing", "task", "pending").await.unwrap());
        assert!(!store.requeue("processing", "task", "pending").await.unwrap());
        assert_eq!(store.range("pending").await.unwrap(), vec!["task"]);
    }

    #[tokio::test]
    async fn test_wrong_type_is_reported() {
        let store = InMemoryQueueStore::new();
        store.set_add("s", "member").await.unwrap();
        let err = store.push("s", "item").await.unwrap_err();
        assert!(matches!(err, StoreError::WrongType { expected: "list", .. }));
        assert!(store.get("s").await.is_err());
    }

    #[tokio::test]
    async fn test_hash_and_set_operations() {
        let store = InMemoryQueueStore::new();
        store
            .hash_set("h", &[("a".into(), "1".into()), ("b".into(), "2".into())])
            .await
            .unwrap();
        assert!(store.hash_delete("h", "a").await.unwrap());
        assert!(!store.hash_delete("h", "a").await.unwrap());
        assert_eq!(store.hash_get_all("h").await.unwrap().len(), 1);

        assert!(store.set_add("s", "x").await.unwrap());
        assert!(!store.set_add("s", "x").await.unwrap());
        assert_eq!(store.set_members("s").await.unwrap(), vec!["x"]);
        assert!(store.set_remove("s", "x").await.unwrap());
        assert!(store.set_members("s").await.unwrap().is_empty());
        assert!(store.delete("h").await.unwrap());
        assert!(store.hash_get_all("h").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let store = InMemoryQueueStore::new();
        store
            .set_with_ttl("lease", "alive", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(store.get("lease").await.unwrap().as_deref(), Some("alive"));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(store.get("lease").await.unwrap().is_none());
        assert!(!store.delete("lease").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_applies_to_hashes() {
        let store = InMemoryQueueStore::new();
        assert!(!store.expire("missing", Duration::from_secs(5)).await.unwrap());

        store
            .hash_set("orchestrators:a", &[("status".into(), "stopped".into())])
            .await
            .unwrap();
        assert!(store.expire("orchestrators:a", Duration::from_secs(5)).await.unwrap());

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.hash_get_all("orchestrators:a").await.unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.hash_get_all("orchestrators:a").await.unwrap().is_empty());

        // A recreated key does not inherit the old deadline
        store
            .hash_set("orchestrators:a", &[("status".into(), "active".into())])
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.hash_get_all("orchestrators:a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let store = InMemoryQueueStore::new();
        assert_eq!(store.publish("ch", "nobody").await.unwrap(), 0);

        let mut a = store.subscribe("ch").await.unwrap();
        let b = store.subscribe("ch").await.unwrap();
        assert_eq!(store.publish("ch", "hello").await.unwrap(), 2);
        assert_eq!(a.recv().await.as_deref(), Some("hello"));

        drop(b);
        assert_eq!(store.publish("ch", "again").await.unwrap(), 1);
    }
}
