#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every VPMS crate.
//!
//! * [`vpms_error`] turns a named-field enum into a `thiserror` error with a
//!   `.context(...)` extension trait.
//! * [`api_model`] and [`api_handler`] keep DTOs and Axum handlers consistent with
//!   the generated `OpenAPI` document.
//! * [`vpms_slice`] wraps feature state into an `Arc` handle registered in the kernel.
//! * [`main`] boots the tuned Tokio runtime (re-exported by `vpms-runtime`).
//!
//! Doc examples are `ignore`d because they reference downstream crates.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the tuned Tokio runtime.
///
/// Transforms an `async fn main` returning a `Result` into a synchronous `fn main`
/// that builds the runtime and blocks on the original body.
///
/// # Arguments
///
/// * `high_performance` - server profile (larger stacks, long keep-alive).
/// * `memory_efficient` - half the workers, small stacks.
/// * `default` - auto-detected worker count.
///
/// # Examples
///
/// ```rust,ignore
/// #[vpms_runtime::main(high_performance)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Defines an API data transfer object.
///
/// # Injected Behaviors
///
/// * **Derives**: `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` unless already present.
/// * **Serde Policy**: `rename_all = "snake_case"` by default, matching the public JSON
///   contract of the parking API, and `deny_unknown_fields` unless disabled.
///
/// # Arguments
///
/// * `rename_all = "camelCase"` - overrides the rename policy.
/// * `deny_unknown_fields = false` - accepts unknown fields.
///
/// # Example
///
/// ```rust,ignore
/// use vpms_derive::api_model;
///
/// #[api_model(deny_unknown_fields = false)]
/// pub struct LotView {
///     pub id: i64,
///     pub name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Registers an Axum handler with `utoipa::path`.
///
/// Accepts the regular `utoipa::path` arguments (`get`, `post`, `path = "..."`,
/// `params(...)`, `request_body = ...`, `responses(...)`, `tag = ...`).
///
/// # Example
///
/// ```rust,ignore
/// use vpms_derive::api_handler;
///
/// #[api_handler(get, path = "/health", responses((status = OK, body = HealthResponse)), tag = "System")]
/// pub async fn health_handler() -> Json<HealthResponse> { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a crate error enum.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<Name>Ext` trait with `.context(...)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant carrying a source.
/// * `From<Source>` for every variant carrying a source.
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * A private `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// Variants must use named fields. A variant with a `source` (by name or by
/// `#[source]`/`#[from]`) must also declare `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[vpms_derive::vpms_error]
/// pub enum DatabaseError {
///     #[error("SQLite error{}: {source}", format_context(.context))]
///     Sqlite { source: rusqlite::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal database error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn vpms_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Defines a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is an `Arc` wrapper that
/// derefs to it and implements `FeatureSlice` so it can be stored in the API state.
///
/// # Example
/// ```rust,ignore
/// #[vpms_derive::vpms_slice]
/// pub struct Parking {
///     pub policy: BillingPolicy,
/// }
///
/// let slice = Parking::new(ParkingInner { policy });
/// ```
#[proc_macro_attribute]
pub fn vpms_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}
