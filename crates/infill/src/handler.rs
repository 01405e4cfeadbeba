use std::any::Any;

use crate::{FillError, FillMarking, FillSlot, FillableField, SelectionKey, TypeDescriptor};

/// Turns a selection key into a value and writes it into the field.
///
/// One instance per implementing type is created and cached for the lifetime
/// of the registry, and shared by concurrent calls. Implementations must not
/// keep per-object state; everything about the field being filled travels in
/// [`FillMetadata`].
pub trait FillHandler: Send + Sync + 'static {
	/// Builds the shared instance on first use.
	fn construct() -> anyhow::Result<Self>
	where
		Self: Sized;

	/// Fills `metadata`'s field. The selection key may be absent.
	fn fill(&self, metadata: &mut FillMetadata<'_>) -> anyhow::Result<()>;
}

/// Everything a handler needs to fill one field of one object.
///
/// Created per field per call and owned by the task filling it.
pub struct FillMetadata<'a> {
	host: &'static TypeDescriptor,
	field: &'static FillableField,
	slot: &'a mut dyn FillSlot,
	selection_key: Option<SelectionKey>,
}

impl<'a> FillMetadata<'a> {
	pub(crate) fn new(
		host: &'static TypeDescriptor,
		field: &'static FillableField,
		slot: &'a mut dyn FillSlot,
		selection_key: Option<SelectionKey>,
	) -> Self {
		Self {
			host,
			field,
			slot,
			selection_key,
		}
	}

	/// Type name of the object owning the field.
	pub fn host_type(&self) -> &'static str {
		self.host.type_name
	}

	pub fn field_name(&self) -> &'static str {
		self.field.name
	}

	pub fn marking(&self) -> &'static FillMarking {
		&self.field.marking
	}

	pub fn selection_key(&self) -> Option<&SelectionKey> {
		self.selection_key.as_ref()
	}

	/// Writes `value` into the field, replacing any previous value.
	pub fn set<V: Any + Send>(&mut self, value: V) -> Result<(), FillError> {
		self.slot.put(Box::new(value))
	}

	pub fn is_filled(&self) -> bool {
		self.slot.is_filled()
	}

	/// Name of the value type the field accepts.
	pub fn value_type(&self) -> &'static str {
		self.slot.value_type()
	}

	pub(crate) fn into_slot(self) -> &'a mut dyn FillSlot {
		self.slot
	}
}

impl std::fmt::Debug for FillMetadata<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FillMetadata")
			.field("host", &self.host.type_name)
			.field("field", &self.field.name)
			.field("selection_key", &self.selection_key)
			.field("filled", &self.slot.is_filled())
			.finish()
	}
}
