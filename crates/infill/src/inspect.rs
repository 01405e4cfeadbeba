//! Field inspection: which fields of an object are fillable, and how to
//! reach them.

use crate::{ContextStore, Enrich, FillMetadata, FillSlot, FillableField, SelectionKey, TypeDescriptor, read_source, settle};

/// Fillable fields of `target`'s runtime type, in declaration order.
pub fn inspect(target: &dyn Enrich) -> &'static [FillableField] {
	target.descriptor().fields
}

#[derive(Debug)]
enum Selection {
	/// Host's own value, not yet reconciled with the context.
	Pending(Option<SelectionKey>),
	Resolved(Option<SelectionKey>),
}

/// One fillable field of one object, ready to be dispatched.
pub struct FillTask<'a> {
	host: &'static TypeDescriptor,
	field: &'static FillableField,
	slot: &'a mut dyn FillSlot,
	selection: Selection,
	path: String,
}

impl<'a> FillTask<'a> {
	pub fn host(&self) -> &'static TypeDescriptor {
		self.host
	}

	pub fn field(&self) -> &'static FillableField {
		self.field
	}

	/// Dotted path from the top-level object, e.g. `role.authority`.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn is_resolved(&self) -> bool {
		matches!(self.selection, Selection::Resolved(_))
	}

	/// Reconciles the host's value with `context`. Idempotent.
	pub fn resolve(&mut self, context: &ContextStore) -> Option<&SelectionKey> {
		if let Selection::Pending(source) = &mut self.selection {
			let key = settle(&self.field.marking, source.take(), context);
			self.selection = Selection::Resolved(key);
		}
		match &self.selection {
			Selection::Resolved(key) => key.as_ref(),
			Selection::Pending(_) => None,
		}
	}

	/// Resolves if needed and turns the task into handler metadata plus its path.
	pub fn into_metadata(mut self, context: &ContextStore) -> (FillMetadata<'a>, String) {
		self.resolve(context);
		let key = match self.selection {
			Selection::Resolved(key) | Selection::Pending(key) => key,
		};
		(FillMetadata::new(self.host, self.field, self.slot, key), self.path)
	}
}

impl std::fmt::Debug for FillTask<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FillTask")
			.field("path", &self.path)
			.field("handler", &self.field.marking.handler)
			.field("selection", &self.selection)
			.finish()
	}
}

fn field_path(parent: Option<&str>, field: &FillableField) -> String {
	match parent {
		Some(parent) => format!("{parent}.{}", field.name),
		None => field.name.to_string(),
	}
}

/// Builds the task for the fillable field at `index`, reading the host's key
/// value now.
///
/// Used for cascades, where a field filled earlier may be the key source of
/// a later one. Returns `None` if `index` is out of range or the type yields
/// no slot for it.
pub fn task_at<'a>(target: &'a mut dyn Enrich, index: usize, parent: Option<&str>) -> Option<FillTask<'a>> {
	let host = target.descriptor();
	let field = host.fields.get(index)?;
	let source = read_source(&field.marking, &*target);
	let Some(slot) = target.fill_slot(index) else {
		tracing::warn!(host = host.type_name, field = field.name, "infill.inspect.slot_missing");
		return None;
	};
	Some(FillTask {
		host,
		field,
		slot,
		selection: Selection::Pending(source),
		path: field_path(parent, field),
	})
}

/// Inspects `target` and returns one unresolved task per fillable field.
///
/// Every key value on the host is read up front, before any field is
/// written. Reconciling them with the context is left to
/// [`FillTask::resolve`] so callers decide when earlier fills become visible.
pub fn scan<'a>(target: &'a mut dyn Enrich, context: &ContextStore, parent: Option<&str>) -> Vec<FillTask<'a>> {
	let host = target.descriptor();
	let sources: Vec<Option<SelectionKey>> = host.fields.iter().map(|field| read_source(&field.marking, &*target)).collect();
	let slots = target.fill_slots();

	if slots.len() != host.fields.len() {
		tracing::warn!(
			host = host.type_name,
			declared = host.fields.len(),
			slots = slots.len(),
			"infill.inspect.slot_mismatch"
		);
	}
	tracing::trace!(host = host.type_name, fields = host.fields.len(), context = context.len(), "infill.inspect.scan");

	host.fields
		.iter()
		.zip(sources)
		.zip(slots)
		.map(|((field, source), slot)| FillTask {
			host,
			field,
			slot,
			selection: Selection::Pending(source),
			path: field_path(parent, field),
		})
		.collect()
}
