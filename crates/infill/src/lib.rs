//! Object enrichment engine.
//!
//! Types describe their *fillable* fields once, in a static
//! [`TypeDescriptor`] (usually generated by `#[derive(Enrich)]`). At runtime
//! [`Enricher::enrich`] scans an object, resolves a selection key for every
//! fillable field, dispatches each field to its [`FillHandler`], and cascades
//! into filled values that are themselves enrichable.
//!
//! # Execution model
//!
//! - The fields of the top-level object are filled concurrently on a bounded
//!   [`ExecutionPool`]; the call blocks until all of them finished.
//! - Cascades run sequentially on the thread of the task that filled the
//!   parent field, depth-first in declaration order.
//! - One [`ContextStore`] is shared by everything spawned from one top-level
//!   call and dropped when the call returns.
//! - Per-field failures never abort siblings; they are logged and reported in
//!   the returned [`EnrichReport`].
//!
//! ```ignore
//! #[derive(Enrich)]
//! struct Account {
//!     #[enrich(rename = "userId")]
//!     user_id: Option<String>,
//!     #[fill(key = "userId", handler = AuthorityHandler)]
//!     role: Option<Authority>,
//! }
//!
//! let report = infill::enrich(&mut account)?;
//! assert!(report.is_complete());
//! ```

extern crate self as infill;

mod collector;
mod config;
mod context;
mod descriptor;
mod dispatch;
mod error;
mod executor;
mod handler;
mod inspect;
mod key;
mod registry;
mod report;
mod resolve;

#[cfg(test)]
mod testing;

pub use collector::{TaskCollector, TaskLabel};
pub use config::EnrichConfig;
pub use context::ContextStore;
pub use descriptor::{Enrich, FillMarking, FillSlot, FillTarget, FillableField, HandlerType, TypeDescriptor};
pub use dispatch::dispatch;
pub use error::{ConfigError, EnrichError, FillError};
pub use executor::{Enricher, enrich, enrich_with_context};
pub use handler::{FillHandler, FillMetadata};
pub use infill_macro::Enrich;
pub use infill_worker::{ExecutionPool, PoolConfig};
pub use inspect::{FillTask, inspect, scan, task_at};
pub use key::{AsSelectionKey, SelectionKey};
pub use registry::HandlerRegistry;
pub use report::{EnrichReport, FieldOutcome, FillStatus, SkipReason};
pub use resolve::{read_source, resolve, settle};
