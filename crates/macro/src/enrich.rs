//! `#[derive(Enrich)]` implementation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Path, parse_macro_input};

/// One `#[fill(...)]` field.
struct FillField {
	ident: Ident,
	key: LitStr,
	handler: Path,
}

/// One field, addressable by name as a selection-key source.
struct SourceField {
	ident: Ident,
	name: String,
}

pub fn derive_enrich(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
	let name = &input.ident;

	if !input.generics.params.is_empty() {
		return Err(syn::Error::new_spanned(
			&input.generics,
			"Enrich cannot be derived for generic types: descriptors are per-type statics",
		));
	}

	let Data::Struct(data) = &input.data else {
		return Err(syn::Error::new_spanned(input, "Enrich can only be derived for structs"));
	};
	let Fields::Named(named) = &data.fields else {
		return Err(syn::Error::new_spanned(&data.fields, "Enrich requires named fields"));
	};

	let enrichable = parse_type_attrs(input)?;

	let mut fills = Vec::new();
	let mut sources = Vec::new();
	for field in &named.named {
		let Some(ident) = field.ident.clone() else {
			continue;
		};
		let name = parse_rename_attr(field)?.unwrap_or_else(|| ident.to_string());
		if let Some(fill) = parse_fill_attr(field, &ident)? {
			fills.push(fill);
		}
		// Fillable fields are sources too: a filled sibling may key a later one.
		sources.push(SourceField { ident, name });
	}

	// Only fields named by some fill key are readable; other field types are
	// never required to convert into selection keys.
	sources.retain(|source| fills.iter().any(|fill| fill.key.value() == source.name));

	let type_name = name.to_string();
	let descriptor_fields = fills.iter().map(|fill| {
		let field_name = fill.ident.to_string();
		let key = &fill.key;
		let handler = &fill.handler;
		quote! {
			::infill::FillableField {
				name: #field_name,
				marking: ::infill::FillMarking {
					parameter_key: #key,
					handler: ::infill::HandlerType::of::<#handler>(),
				},
			}
		}
	});
	let source_arms = sources.iter().map(|source| {
		let ident = &source.ident;
		let key = &source.name;
		quote! {
			#key => ::infill::AsSelectionKey::as_selection_key(&self.#ident),
		}
	});
	let slot_exprs = fills.iter().map(|fill| {
		let ident = &fill.ident;
		quote! { &mut self.#ident as &mut dyn ::infill::FillSlot }
	});
	let as_enrich = if enrichable {
		quote! { ::core::option::Option::Some(self) }
	} else {
		quote! { ::core::option::Option::None }
	};

	Ok(quote! {
		impl ::infill::Enrich for #name {
			fn descriptor(&self) -> &'static ::infill::TypeDescriptor {
				static DESCRIPTOR: ::infill::TypeDescriptor = ::infill::TypeDescriptor {
					type_name: #type_name,
					enrichable: #enrichable,
					fields: &[#(#descriptor_fields),*],
				};
				&DESCRIPTOR
			}

			#[allow(clippy::match_single_binding)]
			fn source_value(&self, name: &str) -> ::core::option::Option<::infill::SelectionKey> {
				match name {
					#(#source_arms)*
					_ => ::core::option::Option::None,
				}
			}

			fn fill_slots(&mut self) -> ::std::vec::Vec<&mut dyn ::infill::FillSlot> {
				::std::vec![#(#slot_exprs),*]
			}
		}

		impl ::infill::FillTarget for #name {
			fn as_enrich(&mut self) -> ::core::option::Option<&mut dyn ::infill::Enrich> {
				#as_enrich
			}
		}
	})
}

/// Parses `#[enrich(enrichable)]` on the type.
fn parse_type_attrs(input: &DeriveInput) -> syn::Result<bool> {
	let mut enrichable = false;
	for attr in input.attrs.iter().filter(|a| a.path().is_ident("enrich")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("enrichable") {
				enrichable = true;
				Ok(())
			} else {
				Err(meta.error("unknown enrich attribute; expected `enrichable`"))
			}
		})?;
	}
	Ok(enrichable)
}

/// Parses `#[fill(key = "...", handler = Path)]` on a field.
fn parse_fill_attr(field: &syn::Field, ident: &Ident) -> syn::Result<Option<FillField>> {
	let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("fill")) else {
		return Ok(None);
	};

	let mut key: Option<LitStr> = None;
	let mut handler: Option<Path> = None;
	attr.parse_nested_meta(|meta| {
		if meta.path.is_ident("key") {
			key = Some(meta.value()?.parse()?);
			Ok(())
		} else if meta.path.is_ident("handler") {
			handler = Some(meta.value()?.parse()?);
			Ok(())
		} else {
			Err(meta.error("unknown fill attribute; expected `key` or `handler`"))
		}
	})?;

	let Some(key) = key else {
		return Err(syn::Error::new_spanned(attr, "missing required 'key' attribute"));
	};
	if key.value().is_empty() {
		return Err(syn::Error::new_spanned(&key, "fill key must not be empty"));
	}
	let Some(handler) = handler else {
		return Err(syn::Error::new_spanned(attr, "missing required 'handler' attribute"));
	};

	Ok(Some(FillField {
		ident: ident.clone(),
		key,
		handler,
	}))
}

/// Parses `#[enrich(rename = "...")]` on any field.
fn parse_rename_attr(field: &syn::Field) -> syn::Result<Option<String>> {
	let mut rename = None;
	for attr in field.attrs.iter().filter(|a| a.path().is_ident("enrich")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("rename") {
				let value: LitStr = meta.value()?.parse()?;
				rename = Some(value.value());
				Ok(())
			} else {
				Err(meta.error("unknown enrich field attribute; expected `rename`"))
			}
		})?;
	}
	Ok(rename)
}
