//! Queue store adapters
//!
//! Both implement the [`QueueStore`](swarm_application::QueueStore) port.
//! [`RedisQueueStore`] lets orchestrator processes on any host share one
//! queue. [`InMemoryQueueStore`] keeps everything inside one process, where
//! instances sharing an `Arc` of it coordinate exactly as separate processes
//! would through Redis.

mod memory;
mod redis_store;

pub use memory::InMemoryQueueStore;
pub use redis_store::RedisQueueStore;
