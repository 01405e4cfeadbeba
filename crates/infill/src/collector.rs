use infill_worker::Task;

use crate::FieldOutcome;

/// Identifies a collected task in logs and in the report, even if the task
/// itself panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLabel {
	pub path: String,
	pub host: &'static str,
	pub handler: &'static str,
}

/// Pending fill tasks of one top-level call.
///
/// Lives on the caller's stack, so concurrent calls never share one. Tasks
/// not handed to the pool are discarded on drop, including during unwinding.
pub struct TaskCollector<'a> {
	labels: Vec<TaskLabel>,
	tasks: Vec<Task<'a, Vec<FieldOutcome>>>,
}

impl<'a> TaskCollector<'a> {
	pub fn new() -> Self {
		Self {
			labels: Vec::new(),
			tasks: Vec::new(),
		}
	}

	pub fn push(&mut self, label: TaskLabel, task: Task<'a, Vec<FieldOutcome>>) {
		tracing::trace!(path = %label.path, handler = label.handler, "infill.collector.push");
		self.labels.push(label);
		self.tasks.push(task);
	}

	pub fn len(&self) -> usize {
		self.tasks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}

	/// Takes every collected task, leaving the collector empty.
	pub fn drain(&mut self) -> (Vec<TaskLabel>, Vec<Task<'a, Vec<FieldOutcome>>>) {
		(std::mem::take(&mut self.labels), std::mem::take(&mut self.tasks))
	}
}

impl Default for TaskCollector<'_> {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for TaskCollector<'_> {
	fn drop(&mut self) {
		if !self.tasks.is_empty() {
			tracing::debug!(discarded = self.tasks.len(), "infill.collector.discarded");
			self.tasks.clear();
			self.labels.clear();
		}
	}
}
