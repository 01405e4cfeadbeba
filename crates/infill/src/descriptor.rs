//! Static per-type descriptors and the traits that expose them.
//!
//! # Role
//!
//! A [`TypeDescriptor`] is built once per type (a `static` emitted by
//! `#[derive(Enrich)]`) and lists the type's fillable fields in declaration
//! order. [`Enrich`] hands the descriptor out at runtime together with
//! read access to selection-key sources and write access to the fillable
//! fields themselves.
//!
//! # Invariants
//!
//! - `Enrich::fill_slots` yields exactly one slot per `TypeDescriptor::fields`
//!   entry, in the same order.
//! - Whether a value cascades is decided by its runtime type through
//!   [`FillTarget::as_enrich`], never by the declared field type.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::{FillError, FillHandler, SelectionKey};

/// Static description of one enrichable type.
#[derive(Debug)]
pub struct TypeDescriptor {
	/// Type name used in logs and reports.
	pub type_name: &'static str,
	/// Whether values of this type cascade when written into a fillable field.
	pub enrichable: bool,
	/// Fillable fields in declaration order.
	pub fields: &'static [FillableField],
}

/// One fillable field of a type.
#[derive(Debug)]
pub struct FillableField {
	pub name: &'static str,
	pub marking: FillMarking,
}

/// Declarative marking attached to a fillable field.
#[derive(Debug, Clone, Copy)]
pub struct FillMarking {
	/// Names the host field or context entry supplying the selection key.
	pub parameter_key: &'static str,
	/// Handler responsible for the field.
	pub handler: HandlerType,
}

/// Identity and constructor of a [`FillHandler`] implementation.
///
/// Function pointers keep this usable inside `static` descriptors.
#[derive(Clone, Copy)]
pub struct HandlerType {
	type_id: fn() -> TypeId,
	type_name: fn() -> &'static str,
	construct: fn() -> anyhow::Result<Arc<dyn FillHandler>>,
}

impl fmt::Debug for HandlerType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("HandlerType").field(&self.name()).finish()
	}
}

impl PartialEq for HandlerType {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for HandlerType {}

impl HandlerType {
	pub const fn of<H: FillHandler>() -> Self {
		Self {
			type_id: TypeId::of::<H>,
			type_name: std::any::type_name::<H>,
			construct: construct_handler::<H>,
		}
	}

	pub fn id(&self) -> TypeId {
		(self.type_id)()
	}

	pub fn name(&self) -> &'static str {
		(self.type_name)()
	}

	pub(crate) fn construct(&self) -> anyhow::Result<Arc<dyn FillHandler>> {
		(self.construct)()
	}
}

fn construct_handler<H: FillHandler>() -> anyhow::Result<Arc<dyn FillHandler>> {
	Ok(Arc::new(H::construct()?))
}

/// An object whose fillable fields can be discovered and written.
///
/// Normally derived; see `infill_macro::Enrich`. Hand-written impls must keep
/// `fill_slots` aligned with `descriptor().fields`.
pub trait Enrich {
	/// Descriptor of the runtime type.
	fn descriptor(&self) -> &'static TypeDescriptor;

	/// Reads the plain field exposed under `name`, if any.
	fn source_value(&self, name: &str) -> Option<SelectionKey>;

	/// Splits the object into one write handle per fillable field.
	fn fill_slots(&mut self) -> Vec<&mut dyn FillSlot>;

	/// Write handle for the fillable field at `index` in `descriptor().fields`.
	fn fill_slot(&mut self, index: usize) -> Option<&mut dyn FillSlot> {
		self.fill_slots().into_iter().nth(index)
	}
}

/// Write-capable handle onto one fillable field.
pub trait FillSlot: Send {
	/// Name of the value type the slot accepts.
	fn value_type(&self) -> &'static str;

	/// Whether the slot currently holds a value.
	fn is_filled(&self) -> bool;

	/// Stores `value`, failing if it is not of the slot's value type.
	fn put(&mut self, value: Box<dyn Any + Send>) -> Result<(), FillError>;

	/// The current value as an enrichable object, if its runtime type is one.
	fn cascade_target(&mut self) -> Option<&mut dyn Enrich>;
}

impl<V: FillTarget> FillSlot for Option<V> {
	fn value_type(&self) -> &'static str {
		std::any::type_name::<V>()
	}

	fn is_filled(&self) -> bool {
		self.is_some()
	}

	fn put(&mut self, value: Box<dyn Any + Send>) -> Result<(), FillError> {
		let value = value.downcast::<V>().map_err(|_| FillError::FieldType {
			expected: std::any::type_name::<V>(),
		})?;
		*self = Some(*value);
		Ok(())
	}

	fn cascade_target(&mut self) -> Option<&mut dyn Enrich> {
		self.as_mut().and_then(FillTarget::as_enrich)
	}
}

/// Value types that may be written into a fillable field.
///
/// The default answers "not enrichable". `#[derive(Enrich)]` implements it
/// according to `#[enrich(enrichable)]`.
pub trait FillTarget: Any + Send {
	fn as_enrich(&mut self) -> Option<&mut dyn Enrich> {
		None
	}
}

impl<T: FillTarget + ?Sized> FillTarget for Box<T> {
	fn as_enrich(&mut self) -> Option<&mut dyn Enrich> {
		(**self).as_enrich()
	}
}

impl<T: Send + 'static> FillTarget for Vec<T> {}

macro_rules! plain_fill_targets {
	($($ty:ty),*) => {
		$(impl FillTarget for $ty {})*
	};
}

plain_fill_targets!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String, SelectionKey);

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{Authority, AuthorityHandler, Role};

	#[test]
	fn option_slot_rejects_foreign_types() {
		let mut slot: Option<Authority> = None;
		let err = slot.put(Box::new("not an authority")).unwrap_err();
		assert!(matches!(err, FillError::FieldType { expected } if expected.ends_with("Authority")));
		assert!(!slot.is_filled());

		slot.put(Box::new(Authority { level: 7 })).unwrap();
		assert_eq!(slot, Some(Authority { level: 7 }));
	}

	#[test]
	fn cascade_follows_runtime_type() {
		let mut plain: Option<Authority> = Some(Authority { level: 1 });
		assert!(plain.cascade_target().is_none());

		let mut role: Option<Role> = Some(Role::named("admin"));
		let target = role.cascade_target().expect("role is enrichable");
		assert_eq!(target.descriptor().type_name, "Role");

		let mut empty: Option<Role> = None;
		assert!(empty.cascade_target().is_none());
	}

	#[test]
	fn handler_types_compare_by_identity() {
		let a = HandlerType::of::<AuthorityHandler>();
		let b = HandlerType::of::<AuthorityHandler>();
		assert_eq!(a, b);
		assert!(a.name().ends_with("AuthorityHandler"));
	}
}
