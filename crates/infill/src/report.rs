use std::collections::BTreeMap;

use crate::{FillError, SelectionKey};

/// Why a field was left without a value although nothing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	/// The handler ran and chose not to write (e.g. no data for the key).
	LeftEmpty,
	/// The cascade that would have reached this field exceeded the depth limit.
	DepthLimit,
}

/// Result of one field fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillStatus {
	Filled,
	Skipped(SkipReason),
	Failed(FillError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
	/// Dotted path from the top-level object.
	pub path: String,
	/// Type owning the field.
	pub host: &'static str,
	pub handler: &'static str,
	pub status: FillStatus,
}

/// Everything one top-level call did, field by field.
///
/// Outcomes of one top-level field are followed by the outcomes of its
/// cascade, depth-first. Top-level fields appear in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
	outcomes: Vec<FieldOutcome>,
	context: BTreeMap<String, SelectionKey>,
}

impl EnrichReport {
	pub(crate) fn extend(&mut self, outcomes: impl IntoIterator<Item = FieldOutcome>) {
		self.outcomes.extend(outcomes);
	}

	pub(crate) fn set_context(&mut self, context: BTreeMap<String, SelectionKey>) {
		self.context = context;
	}

	pub fn outcomes(&self) -> &[FieldOutcome] {
		&self.outcomes
	}

	/// Outcome for the field at `path`, e.g. `"role.authority"`.
	pub fn outcome(&self, path: &str) -> Option<&FieldOutcome> {
		self.outcomes.iter().find(|o| o.path == path)
	}

	/// Paths in report order.
	pub fn paths(&self) -> Vec<&str> {
		self.outcomes.iter().map(|o| o.path.as_str()).collect()
	}

	/// `true` when no field failed. Skipped fields do not count as failures.
	pub fn is_complete(&self) -> bool {
		self.failures().next().is_none()
	}

	pub fn failures(&self) -> impl Iterator<Item = &FieldOutcome> {
		self.outcomes.iter().filter(|o| matches!(o.status, FillStatus::Failed(_)))
	}

	pub fn filled_count(&self) -> usize {
		self.outcomes.iter().filter(|o| o.status == FillStatus::Filled).count()
	}

	/// Context store contents at the end of the call.
	pub fn context(&self) -> &BTreeMap<String, SelectionKey> {
		&self.context
	}
}
