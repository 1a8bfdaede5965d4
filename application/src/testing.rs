//! In-process store for use case tests.
//!
//! Keys never expire on their own; tests call [`FakeStore::lapse`] instead,
//! and [`FakeStore::ttl`] shows what `expire` was asked for.
//! `blocking_move` sleeps briefly on an empty list so that loops under test
//! yield to the runtime.

use crate::ports::queue_store::{QueueStore, StoreError, Subscription};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct State {
    lists: HashMap<String, VecDeque<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
    strings: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
    ttls: HashMap<String, Duration>,
    claim_failures: VecDeque<StoreError>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<String>>>,
}

impl State {
    fn pop_tail(&mut self, list: &str) -> Option<String> {
        self.lists.get_mut(list).and_then(|l| l.pop_back())
    }

    fn push_head(&mut self, list: &str, item: String) -> usize {
        let l = self.lists.entry(list.to_string()).or_default();
        l.push_front(item);
        l.len()
    }

    fn remove_one(&mut self, list: &str, item: &str) -> usize {
        let Some(l) = self.lists.get_mut(list) else {
            return 0;
        };
        match l.iter().position(|i| i == item) {
            Some(pos) => {
                l.remove(pos);
                1
            }
            None => 0,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<State>,
}

impl FakeStore {
    /// Drop a string key as if its TTL had run out.
    pub(crate) fn lapse(&self, key: &str) {
        self.state.lock().unwrap().strings.remove(key);
    }

    /// Expiry last requested for `key`.
    pub(crate) fn ttl(&self, key: &str) -> Option<Duration> {
        self.state.lock().unwrap().ttls.get(key).copied()
    }

    /// Make the next claims fail with these errors, one per call.
    pub(crate) fn fail_claims(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.state.lock().unwrap().claim_failures.extend(errors);
    }

    fn exists(state: &State, key: &str) -> bool {
        state.lists.contains_key(key)
            || state.hashes.contains_key(key)
            || state.strings.contains_key(key)
            || state.sets.contains_key(key)
    }
}

#[async_trait]
impl QueueStore for FakeStore {
    async fn push(&self, list: &str, item: &str) -> Result<usize, StoreError> {
        Ok(self.state.lock().unwrap().push_head(list, item.to_string()))
    }

    async fn blocking_move(
        &self,
        src: &str,
        dst: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let failure = self.state.lock().unwrap().claim_failures.pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        if let Some(item) = self.move_one(src, dst).await? {
            return Ok(Some(item));
        }
        tokio::time::sleep(timeout.min(Duration::from_millis(5))).await;
        Ok(None)
    }

    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let item = state.pop_tail(src);
        if let Some(item) = &item {
            state.push_head(dst, item.clone());
        }
        Ok(item)
    }

    async fn range(&self, list: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .lists
            .get(list)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn len(&self, list: &str) -> Result<usize, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.lists.get(list).map_or(0, |l| l.len()))
    }

    async fn requeue(&self, src: &str, item: &str, dst: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.remove_one(src, item) == 0 {
            return Ok(false);
        }
        state.push_head(dst, item.to_string());
        Ok(true)
    }

    async fn commit(
        &self,
        processing: &str,
        item: &str,
        dest: &str,
        record: &str,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.remove_one(processing, item) == 0 {
            return Ok(false);
        }
        state.push_head(dest, record.to_string());
        Ok(true)
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let hash = state.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(hash) = state.hashes.get_mut(key) else {
            return Ok(false);
        };
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            state.hashes.remove(key);
        }
        Ok(removed)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        let existed = state.lists.remove(key).is_some()
            | state.hashes.remove(key).is_some()
            | state.strings.remove(key).is_some()
            | state.sets.remove(key).is_some();
        state.ttls.remove(key);
        Ok(existed)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        if !Self::exists(&state, key) {
            return Ok(false);
        }
        state.ttls.insert(key.to_string(), ttl);
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().unwrap().strings.get(key).cloned())
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_remove(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.sets.get_mut(set).is_some_and(|s| s.remove(member)))
    }

    async fn set_members(&self, set: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sets
            .get(set)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<usize, StoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(subscribers) = state.subscribers.get_mut(channel) else {
            return Ok(0);
        };
        subscribers.retain(|tx| tx.send(message.to_string()).is_ok());
        Ok(subscribers.len())
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        state
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(Subscription::new(rx))
    }
}
