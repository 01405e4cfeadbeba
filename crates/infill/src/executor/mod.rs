//! Top-level enrichment executor.
//!
//! # Role
//!
//! Orchestrates one call: scan the target, resolve every top-level key into
//! the call's [`ContextStore`], collect one task per fillable field, run the
//! batch on the [`ExecutionPool`] and join, then drop the context.
//!
//! # Invariants
//!
//! - Only the fields of the top-level object are filled in parallel.
//! - A task finishes its whole cascade, sequentially and depth-first, before
//!   it reports completion.
//! - Top-level keys are all read before any field is written.
//! - Inside a cascade, each field's key is read and resolved right before
//!   that field is filled, so values written or published by earlier
//!   siblings are visible.
//! - Call-scoped state (tasks, context) is owned by the call frame and never
//!   outlives it.

use std::sync::{Arc, OnceLock};

use infill_worker::{ExecutionPool, TaskOutcome};

use crate::{
	ContextStore, Enrich, EnrichConfig, EnrichError, EnrichReport, FieldOutcome, FillError, FillStatus, FillTask, HandlerRegistry,
	SelectionKey, SkipReason, TaskCollector, TaskLabel, dispatch, scan, task_at,
};

/// Runs enrichment calls against one handler registry and one pool.
#[derive(Debug, Clone)]
pub struct Enricher {
	registry: Arc<HandlerRegistry>,
	pool: Arc<ExecutionPool>,
	config: EnrichConfig,
}

static GLOBAL_ENRICHER: OnceLock<Result<Enricher, EnrichError>> = OnceLock::new();

impl Enricher {
	/// Builds an enricher with a private registry and pool.
	pub fn new(config: EnrichConfig) -> Result<Self, EnrichError> {
		let pool = ExecutionPool::new(config.pool.clone())?;
		Ok(Self::from_parts(Arc::new(HandlerRegistry::new()), Arc::new(pool), config))
	}

	/// Builds an enricher with a private registry and pool from a TOML
	/// document (see [`EnrichConfig`]).
	pub fn from_toml_str(input: &str) -> Result<Self, EnrichError> {
		Self::new(EnrichConfig::from_toml_str(input)?)
	}

	/// Builds an enricher over shared parts.
	///
	/// `config.pool` is ignored; the pool keeps the shape it was built with.
	pub fn from_parts(registry: Arc<HandlerRegistry>, pool: Arc<ExecutionPool>, config: EnrichConfig) -> Self {
		Self { registry, pool, config }
	}

	/// Returns the process-wide enricher, building it with `config` on first use.
	///
	/// Later calls return the existing enricher and ignore `config`.
	pub fn init_global(config: EnrichConfig) -> Result<&'static Self, EnrichError> {
		let global = GLOBAL_ENRICHER.get_or_init(|| {
			let pool = ExecutionPool::init_global(config.pool.clone())?;
			Ok(Self::from_parts(HandlerRegistry::global(), pool, config))
		});
		match global {
			Ok(enricher) => Ok(enricher),
			Err(err) => Err(err.clone()),
		}
	}

	/// Returns the process-wide enricher, building it with defaults on first use.
	pub fn global() -> Result<&'static Self, EnrichError> {
		Self::init_global(EnrichConfig::default())
	}

	pub fn registry(&self) -> &HandlerRegistry {
		&self.registry
	}

	pub fn pool(&self) -> &ExecutionPool {
		&self.pool
	}

	pub fn config(&self) -> &EnrichConfig {
		&self.config
	}

	/// Fills every fillable field of `target`, cascading into enrichable values.
	///
	/// Blocks until all fields, including nested cascades, are done. Field
	/// failures are logged and reported, never returned as errors.
	pub fn enrich(&self, target: &mut dyn Enrich) -> EnrichReport {
		self.enrich_in(target, ContextStore::new())
	}

	/// Like [`Self::enrich`], with the context store pre-populated by `seed`.
	pub fn enrich_with_context<I, K, V>(&self, target: &mut dyn Enrich, seed: I) -> EnrichReport
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<SelectionKey>,
	{
		self.enrich_in(target, ContextStore::with_seed(seed))
	}

	fn enrich_in(&self, target: &mut dyn Enrich, context: ContextStore) -> EnrichReport {
		let host = target.descriptor().type_name;
		let _span = tracing::debug_span!("infill.enrich", host).entered();

		let context = &context;
		let mut collector = TaskCollector::new();
		for mut task in scan(target, context, None) {
			// Top-level keys are settled before any task runs; siblings then
			// only read what the parent published.
			task.resolve(context);
			let label = TaskLabel {
				path: task.path().to_string(),
				host,
				handler: task.field().marking.handler.name(),
			};
			collector.push(label, Box::new(move || self.run_task(task, context)));
		}
		tracing::debug!(tasks = collector.len(), "infill.enrich.collected");

		let (labels, tasks) = collector.drain();
		let outcomes = self.pool.run_batch(tasks);

		let mut report = EnrichReport::default();
		for (label, outcome) in labels.into_iter().zip(outcomes) {
			match outcome {
				TaskOutcome::Completed(fields) => report.extend(fields),
				TaskOutcome::Panicked(message) => report.extend([FieldOutcome {
					path: label.path,
					host: label.host,
					handler: label.handler,
					status: FillStatus::Failed(FillError::Panicked {
						handler: label.handler,
						message,
					}),
				}]),
			}
		}
		report.set_context(context.snapshot());
		tracing::debug!(
			filled = report.filled_count(),
			failed = report.failures().count(),
			"infill.enrich.joined"
		);
		report
	}

	/// Body of one top-level task: fill the field, then its whole cascade.
	fn run_task(&self, task: FillTask<'_>, context: &ContextStore) -> Vec<FieldOutcome> {
		let mut outcomes = Vec::new();
		self.fill(task, context, 0, &mut outcomes);
		outcomes
	}

	fn fill(&self, task: FillTask<'_>, context: &ContextStore, depth: usize, outcomes: &mut Vec<FieldOutcome>) {
		let host = task.host().type_name;
		let handler = task.field().marking.handler.name();
		let (mut metadata, path) = task.into_metadata(context);

		let status = match dispatch(&self.registry, &mut metadata) {
			Ok(()) if metadata.is_filled() => FillStatus::Filled,
			Ok(()) => FillStatus::Skipped(SkipReason::LeftEmpty),
			Err(err) => FillStatus::Failed(err),
		};
		tracing::trace!(path = %path, ?status, "infill.fill.done");
		outcomes.push(FieldOutcome {
			path: path.clone(),
			host,
			handler,
			status,
		});

		// Whatever the field now holds decides the cascade, even when the
		// handler failed after writing.
		if let Some(child) = metadata.into_slot().cascade_target() {
			self.cascade(child, context, &path, depth + 1, outcomes);
		}
	}

	fn cascade(&self, target: &mut dyn Enrich, context: &ContextStore, parent: &str, depth: usize, outcomes: &mut Vec<FieldOutcome>) {
		let descriptor = target.descriptor();
		if depth > self.config.max_cascade_depth {
			tracing::warn!(
				host = descriptor.type_name,
				path = parent,
				limit = self.config.max_cascade_depth,
				"infill.cascade.depth_limit"
			);
			outcomes.extend(descriptor.fields.iter().map(|field| FieldOutcome {
				path: format!("{parent}.{}", field.name),
				host: descriptor.type_name,
				handler: field.marking.handler.name(),
				status: FillStatus::Skipped(SkipReason::DepthLimit),
			}));
			return;
		}

		tracing::trace!(host = descriptor.type_name, path = parent, depth, "infill.cascade.enter");
		// Each key is read right before its field is filled, so a sibling
		// filled earlier can supply it.
		for index in 0..descriptor.fields.len() {
			if let Some(task) = task_at(&mut *target, index, Some(parent)) {
				self.fill(task, context, depth, outcomes);
			}
		}
	}
}

/// Enriches `target` with the process-wide [`Enricher`].
///
/// Only fails if the process-wide pool cannot be built.
pub fn enrich<T: Enrich>(target: &mut T) -> Result<EnrichReport, EnrichError> {
	Ok(Enricher::global()?.enrich(target))
}

/// Enriches `target` with the process-wide [`Enricher`] and a seeded context.
pub fn enrich_with_context<T, I, K, V>(target: &mut T, seed: I) -> Result<EnrichReport, EnrichError>
where
	T: Enrich,
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<SelectionKey>,
{
	Ok(Enricher::global()?.enrich_with_context(target, seed))
}
