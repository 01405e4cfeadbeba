//! Procedural macros for infill.
//!
//! Provides `#[derive(Enrich)]`, which builds the static per-type descriptor
//! table consumed by the enrichment executor.

use proc_macro::TokenStream;

/// Enrich derive macro implementation.
mod enrich;

/// Derives `infill::Enrich` and `infill::FillTarget` for a struct with named fields.
///
/// ```ignore
/// #[derive(Enrich)]
/// #[enrich(enrichable)]
/// pub struct User {
///     #[enrich(rename = "userId")]
///     user_id: Option<String>,
///     #[fill(key = "userId", handler = RoleHandler)]
///     role: Option<Role>,
/// }
/// ```
///
/// # Attributes
///
/// Type level:
/// - `#[enrich(enrichable)]` - Marks values of this type for cascade when they
///   are written into another object's fillable field.
///
/// Field level:
/// - `#[fill(key = "...", handler = Path)]` - Fillable field. The field type
///   must implement `infill::FillSlot` (usually `Option<V>`).
/// - `#[enrich(rename = "...")]` - Exposes the field as a selection-key source
///   under another name. Allowed on fillable fields as well.
///
/// Only fields whose (renamed) name matches one of this type's fill keys are
/// readable as selection-key sources; their types must implement
/// `infill::AsSelectionKey`. A fillable field qualifies too, so a value filled
/// earlier in a cascade can key a later sibling.
#[proc_macro_derive(Enrich, attributes(enrich, fill))]
pub fn derive_enrich(input: TokenStream) -> TokenStream {
	enrich::derive_enrich(input)
}
