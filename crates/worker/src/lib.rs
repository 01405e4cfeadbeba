//! Worker pool primitives for batched field enrichment.
//!
//! The pool runs a batch of borrowed tasks across a fixed set of named
//! threads and blocks the submitter until every task in the batch reported
//! an outcome. Admission is bounded: once `workers + backlog` tasks are in
//! flight pool-wide, further submissions run inline on the submitting thread.

mod class;
mod config;
mod panic;
mod pool;

pub use class::Placement;
pub use config::PoolConfig;
pub use panic::panic_message;
pub use pool::{ExecutionPool, PoolError, Task, TaskOutcome};
