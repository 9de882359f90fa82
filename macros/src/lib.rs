mod model;
mod route;

use proc_macro::TokenStream;

/// Generates an `aide` documentation function for a handler, named after the
/// handler with a `_docs` suffix.
///
/// The first line of the doc comment becomes the summary, the remaining lines
/// the description. The operation id is the handler's name.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Derives a partial update input from a create input.
///
/// `#[model(update = "UpdatePost")]` on `CreatePost` emits `UpdatePost` with
/// every field made optional. Fields that are already `Option<T>` stay
/// `Option<T>`, fields marked `#[model(skip_update)]` or
/// `#[serde(skip_deserializing)]` are left out.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
