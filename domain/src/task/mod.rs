//! Task records as they travel through the queues.

mod entities;
mod value_objects;

pub use entities::{FailureRecord, Task, TaskResult, TerminalRecord};
pub use value_objects::TaskId;
