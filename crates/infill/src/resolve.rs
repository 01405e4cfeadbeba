//! Selection-key resolution.
//!
//! A key comes from the host object's own field named by the marking's
//! parameter key. When that field is missing or empty, the call's
//! [`ContextStore`] supplies whatever an ancestor or earlier field published
//! under the same name. Keys found on the host are published for later fills.

use crate::{ContextStore, Enrich, FillMarking, SelectionKey};

/// Computes the selection key for `marking` on `host`.
pub fn resolve(marking: &FillMarking, host: &dyn Enrich, context: &ContextStore) -> Option<SelectionKey> {
	settle(marking, read_source(marking, host), context)
}

/// Reads the host's own value for the marking's parameter key.
///
/// A present-but-empty field is indistinguishable from a missing one.
pub fn read_source(marking: &FillMarking, host: &dyn Enrich) -> Option<SelectionKey> {
	host.source_value(marking.parameter_key)
}

/// Completes resolution given the host's own value.
pub fn settle(marking: &FillMarking, source: Option<SelectionKey>, context: &ContextStore) -> Option<SelectionKey> {
	let key = marking.parameter_key;
	match source {
		Some(value) => {
			tracing::trace!(key, value = %value, "infill.resolve.host");
			context.insert(key, value.clone());
			Some(value)
		}
		None => {
			let inherited = context.get(key);
			tracing::trace!(key, found = inherited.is_some(), "infill.resolve.context");
			inherited
		}
	}
}
