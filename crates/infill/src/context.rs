use std::collections::BTreeMap;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::SelectionKey;

/// Parameter values resolved during one top-level call.
///
/// Shared by reference between all sibling tasks and cascades of that call.
/// Keys are case-sensitive. Entries are added or overwritten but never
/// removed while the call runs; the whole store is dropped with the call.
#[derive(Debug, Default)]
pub struct ContextStore {
	entries: RwLock<FxHashMap<String, SelectionKey>>,
}

impl ContextStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store pre-populated with `seed`.
	pub fn with_seed<I, K, V>(seed: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<SelectionKey>,
	{
		let entries = seed.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
		Self {
			entries: RwLock::new(entries),
		}
	}

	pub fn get(&self, key: &str) -> Option<SelectionKey> {
		self.entries.read().get(key).cloned()
	}

	/// Writes `value` under `key`, returning the previous value.
	pub fn insert(&self, key: impl Into<String>, value: SelectionKey) -> Option<SelectionKey> {
		self.entries.write().insert(key.into(), value)
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Sorted copy of the current entries.
	pub fn snapshot(&self) -> BTreeMap<String, SelectionKey> {
		self.entries.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn keys_are_case_sensitive() {
		let store = ContextStore::new();
		store.insert("userId", SelectionKey::from("2"));
		assert_eq!(store.get("userId"), Some(SelectionKey::from("2")));
		assert_eq!(store.get("userid"), None);
	}

	#[test]
	fn insert_overwrites_and_reports_previous() {
		let store = ContextStore::with_seed([("userId", "1")]);
		let previous = store.insert("userId", SelectionKey::Int(2));
		assert_eq!(previous, Some(SelectionKey::from("1")));
		assert_eq!(store.get("userId"), Some(SelectionKey::Int(2)));
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn concurrent_writers_on_distinct_keys_all_land() {
		let store = ContextStore::new();
		std::thread::scope(|s| {
			for i in 0..8i64 {
				let store = &store;
				s.spawn(move || {
					store.insert(format!("k{i}"), SelectionKey::Int(i));
					assert_eq!(store.get(&format!("k{i}")), Some(SelectionKey::Int(i)));
				});
			}
		});
		assert_eq!(store.snapshot().len(), 8);
	}
}
