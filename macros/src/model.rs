use darling::{ast::NestedMeta, FromMeta};
use proc_macro2::{TokenStream, TokenTree};
use quote::{quote, ToTokens};
use syn::{Attribute, Fields, GenericArgument, ItemStruct, Meta, PathArguments, Type};

#[derive(FromMeta)]
struct ModelArgs {
	update: syn::Ident,
}

pub fn from_input(
	args: proc_macro::TokenStream,
	input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
	let args = match NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match ModelArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let mut item = syn::parse_macro_input!(input as ItemStruct);

	match expand(&args, &mut item) {
		Ok(tokens) => tokens.into(),
		Err(e) => e.into_compile_error().into(),
	}
}

fn expand(args: &ModelArgs, item: &mut ItemStruct) -> syn::Result<TokenStream> {
	let Fields::Named(fields) = &mut item.fields else {
		return Err(syn::Error::new_spanned(
			&item.ident,
			"#[model] requires a struct with named fields",
		));
	};

	let mut update_fields = Vec::with_capacity(fields.named.len());

	for field in &mut fields.named {
		let skip = has_skip_update(&field.attrs)? || is_serde_skipped(&field.attrs);

		// `#[model(..)]` is only meaningful to this macro
		field.attrs.retain(|attr| !attr.path().is_ident("model"));

		if skip {
			continue;
		}

		let ident = &field.ident;
		let vis = &field.vis;
		let attrs = &field.attrs;
		let ty = &field.ty;
		let ty = if is_option(ty) {
			ty.to_token_stream()
		} else {
			quote!(Option<#ty>)
		};

		update_fields.push(quote! {
			#(#attrs)*
			#vis #ident: #ty,
		});
	}

	let attrs = item
		.attrs
		.iter()
		.filter(|attr| !attr.path().is_ident("doc"));
	let vis = &item.vis;
	let generics = &item.generics;
	let update_ident = &args.update;
	let doc = format!(
		" Partial update of [`{}`]. Absent fields keep their current value.",
		item.ident
	);

	Ok(quote! {
		#item

		#[doc = #doc]
		#(#attrs)*
		#vis struct #update_ident #generics {
			#(#update_fields)*
		}
	})
}

fn has_skip_update(attrs: &[Attribute]) -> syn::Result<bool> {
	let mut skip = false;

	for attr in attrs.iter().filter(|attr| attr.path().is_ident("model")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("skip_update") {
				skip = true;
				Ok(())
			} else {
				Err(meta.error("expected `skip_update`"))
			}
		})?;
	}

	Ok(skip)
}

/// Fields with `#[serde(skip_deserializing)]` or `#[serde(skip)]` are never
/// client input, so they have no place in an update either.
fn is_serde_skipped(attrs: &[Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}

fn is_option(ty: &Type) -> bool {
	let Type::Path(path) = ty else {
		return false;
	};

	path.path.segments.last().is_some_and(|segment| {
		segment.ident == "Option"
			&& matches!(
				&segment.arguments,
				PathArguments::AngleBracketed(args)
					if matches!(args.args.first(), Some(GenericArgument::Type(_)))
			)
	})
}
