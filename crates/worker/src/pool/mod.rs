use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::{Placement, PoolConfig, panic_message};

/// One unit of batch work. Tasks may borrow from the submitter's stack.
pub type Task<'s, T> = Box<dyn FnOnce() -> T + Send + 's>;

/// Errors raised while setting up a pool.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
	#[error("failed to build worker pool: {0}")]
	Build(String),
}

/// Observed result of one task in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
	/// The task returned normally.
	Completed(T),
	/// The task panicked; the payload message is kept.
	Panicked(String),
}

impl<T> TaskOutcome<T> {
	/// Converts into a `Result`, panics becoming `Err(message)`.
	pub fn into_result(self) -> Result<T, String> {
		match self {
			Self::Completed(value) => Ok(value),
			Self::Panicked(msg) => Err(msg),
		}
	}
}

/// Fixed-size worker pool with a bounded backlog and caller-runs overflow.
///
/// # Invariants
///
/// - At most [`PoolConfig::capacity`] tasks are admitted pool-wide at once.
/// - [`Self::run_batch`] returns only after every task of that batch finished.
/// - No task is dropped: overflow runs on the submitting thread.
pub struct ExecutionPool {
	inner: rayon::ThreadPool,
	config: PoolConfig,
	in_flight: AtomicUsize,
}

impl std::fmt::Debug for ExecutionPool {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ExecutionPool")
			.field("config", &self.config)
			.field("in_flight", &self.in_flight.load(Ordering::Relaxed))
			.finish()
	}
}

static GLOBAL_POOL: OnceLock<Result<Arc<ExecutionPool>, PoolError>> = OnceLock::new();

impl ExecutionPool {
	/// Builds a pool with its own worker threads.
	pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
		let prefix = config.thread_name.clone();
		let inner = rayon::ThreadPoolBuilder::new()
			.num_threads(config.effective_workers())
			.thread_name(move |idx| format!("{prefix}-{idx}"))
			.build()
			.map_err(|err| PoolError::Build(err.to_string()))?;
		tracing::debug!(
			workers = config.effective_workers(),
			backlog = config.backlog,
			"infill.pool.built"
		);
		Ok(Self {
			inner,
			config,
			in_flight: AtomicUsize::new(0),
		})
	}

	/// Returns the process-wide pool, building it with `config` on first use.
	///
	/// Later calls return the existing pool and ignore `config`.
	pub fn init_global(config: PoolConfig) -> Result<Arc<Self>, PoolError> {
		GLOBAL_POOL.get_or_init(|| Self::new(config).map(Arc::new)).clone()
	}

	/// Returns the process-wide pool, building it with defaults on first use.
	pub fn global() -> Result<Arc<Self>, PoolError> {
		Self::init_global(PoolConfig::default())
	}

	pub fn config(&self) -> &PoolConfig {
		&self.config
	}

	/// Tasks currently admitted to the worker threads.
	pub fn in_flight(&self) -> usize {
		self.in_flight.load(Ordering::Acquire)
	}

	/// Runs every task and blocks until all of them finished.
	///
	/// Outcomes are returned in submission order. Panics are caught per task.
	pub fn run_batch<'s, T>(&self, tasks: Vec<Task<'s, T>>) -> Vec<TaskOutcome<T>>
	where
		T: Send + 's,
	{
		let total = tasks.len();
		if total == 0 {
			return Vec::new();
		}

		let mut slots: Vec<Option<TaskOutcome<T>>> = std::iter::repeat_with(|| None).take(total).collect();
		let mut inline = 0usize;

		self.inner.in_place_scope(|scope| {
			for (idx, (task, slot)) in tasks.into_iter().zip(slots.iter_mut()).enumerate() {
				let placement = if self.try_admit() { Placement::Pooled } else { Placement::Inline };
				tracing::trace!(task = idx, placement = placement.as_str(), in_flight = self.in_flight(), "infill.pool.submit");
				match placement {
					Placement::Pooled => scope.spawn(move |_| {
						*slot = Some(run_guarded(task));
						self.release();
					}),
					Placement::Inline => {
						inline += 1;
						*slot = Some(run_guarded(task));
					}
				}
			}
		});

		tracing::debug!(total, inline, "infill.pool.joined");
		slots
			.into_iter()
			.map(|slot| slot.unwrap_or_else(|| TaskOutcome::Panicked("task finished without reporting".to_string())))
			.collect()
	}

	fn try_admit(&self) -> bool {
		let capacity = self.config.capacity();
		self.in_flight
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < capacity).then_some(n + 1))
			.is_ok()
	}

	fn release(&self) {
		self.in_flight.fetch_sub(1, Ordering::AcqRel);
	}
}

fn run_guarded<T>(task: Task<'_, T>) -> TaskOutcome<T> {
	match catch_unwind(AssertUnwindSafe(task)) {
		Ok(value) => TaskOutcome::Completed(value),
		Err(payload) => {
			let msg = panic_message(payload.as_ref());
			tracing::warn!(panic = %msg, "infill.pool.task_panicked");
			TaskOutcome::Panicked(msg)
		}
	}
}
