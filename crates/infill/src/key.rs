//! Selection keys and the field types that can supply them.
//!
//! A key is whatever a handler needs to find the value for one field: a
//! numeric id, a code, a flag. Keys are compared exactly; `"2"` and `2` are
//! different context entries, though [`SelectionKey::as_id`] reads both as
//! the same id.

use std::fmt;

/// Lookup value handed to a [`FillHandler`](crate::FillHandler).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectionKey {
	Bool(bool),
	Int(i64),
	Str(String),
}

impl SelectionKey {
	/// Numeric id, also parsed from string keys like `"42"`.
	pub fn as_id(&self) -> Option<i64> {
		match self {
			Self::Int(id) => Some(*id),
			Self::Str(text) => text.trim().parse().ok(),
			Self::Bool(_) => None,
		}
	}

	/// Textual key. Integer keys are not stringified; use `to_string` for that.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(text) => Some(text),
			_ => None,
		}
	}

	pub fn as_flag(&self) -> Option<bool> {
		match self {
			Self::Bool(flag) => Some(*flag),
			_ => None,
		}
	}
}

impl fmt::Display for SelectionKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(flag) => write!(f, "{flag}"),
			Self::Int(id) => write!(f, "{id}"),
			Self::Str(text) => f.write_str(text),
		}
	}
}

impl From<bool> for SelectionKey {
	fn from(flag: bool) -> Self {
		Self::Bool(flag)
	}
}

impl From<i64> for SelectionKey {
	fn from(id: i64) -> Self {
		Self::Int(id)
	}
}

impl From<String> for SelectionKey {
	fn from(text: String) -> Self {
		Self::Str(text)
	}
}

impl From<&str> for SelectionKey {
	fn from(text: &str) -> Self {
		Self::Str(text.to_string())
	}
}

/// Field types that can act as a selection-key source on a host object.
///
/// `None` means "absent", which the resolver treats the same as a missing
/// field.
pub trait AsSelectionKey {
	fn as_selection_key(&self) -> Option<SelectionKey>;
}

impl AsSelectionKey for SelectionKey {
	fn as_selection_key(&self) -> Option<SelectionKey> {
		Some(self.clone())
	}
}

impl AsSelectionKey for String {
	fn as_selection_key(&self) -> Option<SelectionKey> {
		Some(SelectionKey::Str(self.clone()))
	}
}

impl AsSelectionKey for str {
	fn as_selection_key(&self) -> Option<SelectionKey> {
		Some(SelectionKey::Str(self.to_string()))
	}
}

impl AsSelectionKey for bool {
	fn as_selection_key(&self) -> Option<SelectionKey> {
		Some(SelectionKey::Bool(*self))
	}
}

impl<T: AsSelectionKey + ?Sized> AsSelectionKey for &T {
	fn as_selection_key(&self) -> Option<SelectionKey> {
		(**self).as_selection_key()
	}
}

impl<T: AsSelectionKey> AsSelectionKey for Option<T> {
	fn as_selection_key(&self) -> Option<SelectionKey> {
		self.as_ref().and_then(AsSelectionKey::as_selection_key)
	}
}

macro_rules! lossless_int_keys {
	($($ty:ty),*) => {
		$(
			impl AsSelectionKey for $ty {
				fn as_selection_key(&self) -> Option<SelectionKey> {
					Some(SelectionKey::Int(i64::from(*self)))
				}
			}
		)*
	};
}

lossless_int_keys!(i8, i16, i32, i64, u8, u16, u32);

// Values beyond i64 keep their exact digits as a string key.
macro_rules! wide_int_keys {
	($($ty:ty),*) => {
		$(
			impl AsSelectionKey for $ty {
				fn as_selection_key(&self) -> Option<SelectionKey> {
					Some(i64::try_from(*self).map_or_else(|_| SelectionKey::Str(self.to_string()), SelectionKey::Int))
				}
			}
		)*
	};
}

wide_int_keys!(u64, usize, isize);

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn option_none_is_absent() {
		let missing: Option<String> = None;
		assert_eq!(missing.as_selection_key(), None);
		assert_eq!(Some("2".to_string()).as_selection_key(), Some(SelectionKey::from("2")));
	}

	#[test]
	fn integers_widen_to_int_keys() {
		assert_eq!(7u32.as_selection_key(), Some(SelectionKey::Int(7)));
		assert_eq!((-3i8).as_selection_key(), Some(SelectionKey::Int(-3)));
		assert_eq!(u64::MAX.as_selection_key(), Some(SelectionKey::Str(u64::MAX.to_string())));
	}

	#[test]
	fn numeric_strings_read_as_ids() {
		assert_eq!(SelectionKey::from("42").as_id(), Some(42));
		assert_eq!(SelectionKey::Int(42).as_id(), Some(42));
		assert_eq!(SelectionKey::from("admin").as_id(), None);
		assert_eq!(SelectionKey::Bool(true).as_id(), None);
	}

	#[test]
	fn string_and_int_keys_stay_distinct() {
		assert_ne!(SelectionKey::from("42"), SelectionKey::Int(42));
		assert_eq!(SelectionKey::Int(42).as_str(), None);
		assert_eq!(SelectionKey::Int(42).to_string(), "42");
		assert_eq!(SelectionKey::Bool(false).as_flag(), Some(false));
	}
}
