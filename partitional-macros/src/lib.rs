//! Procedural macros for the Partitional framework.
//!
//! These derives generate the name-keyed accessors, partial accessors, and
//! registry submissions that `partitional` resolves at runtime. Every
//! declaration mistake that can be caught while expanding is reported as a
//! compile error instead of a runtime `ConfigurationError`.
//!
//! # Available Macros
//!
//! | Macro | Type | Purpose |
//! |-------|------|---------|
//! | [`Partial`] | Derive | Partial type: attributes, own rules, typed proxy accessors |
//! | [`Record`] | Derive | Name-keyed access for nested records |
//! | [`Host`] | Derive | Record + `partition` accessors, registry entries, rule set |
//!
//! # Quick Start
//!
//! ```ignore
//! use partitional::{Errors, Host, Partial, Partials, Record, Value};
//!
//! // 1. A partial type with its own rules
//! #[derive(Debug, Default, Partial)]
//! pub struct Telephone {
//!     #[validates(inclusion("+81", "+1"))]
//!     pub country: Value,
//!     #[validates(format = r"\d{2}-\d{4}-\d{4}")]
//!     pub number: Value,
//! }
//!
//! // 2. A nested record reached through a dotted path
//! #[derive(Default, Record)]
//! pub struct Line {
//!     pub number: Value,
//! }
//!
//! // 3. The host
//! #[derive(Default, Host)]
//! #[partition(tel, Telephone, mapping(number = "line.number"))]
//! #[validates_partial(tel, unless = "skip_tel")]
//! pub struct Contact {
//!     pub country: Value,
//!     pub skip_tel: Value,
//!     #[record(nested)]
//!     pub line: Option<Line>,
//!     #[record(errors)]
//!     pub errors: Errors,
//!     #[record(partials)]
//!     pub partials: Partials,
//! }
//! ```
//!
//! # Generated Code
//!
//! ## From `Partial`
//!
//! - `Partial` impl: `NAME`, `ATTRIBUTES` (field order), local read/write
//! - `validate` running the field rules, compiled once into a `static`
//! - `ReadAttribute` and `Record` impls over the fields
//! - `<Name>Attributes` trait on `PartialProxy<'_, Name>` with one getter and
//!   one `set_` method per field
//!
//! ## From `Record`
//!
//! - `Record` impl dispatching `read`/`write`/`nested`/`nested_mut` by field name
//!
//! ## From `Host`
//!
//! - Everything `Record` generates
//! - `Host` impl over the `#[record(errors)]` and `#[record(partials)]` fields
//! - Per partition: `fn name(&mut self)` and `fn set_name(&mut self, origin)`
//! - Per partition: an `inventory` registry submission
//! - `rules()`: bridges and `#[validate]` functions, in attribute order

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod host;
mod partial;
mod record;

/// Derive a partial type.
///
/// Every named field is a declared attribute and must be a
/// `partitional::Value`. Field rules come from `#[validates(...)]`:
///
/// | Key | Rule |
/// |-----|------|
/// | `presence` | value must not be blank |
/// | `format = "regex"` | unanchored match on the value's text |
/// | `inclusion(v, ...)` | value must equal one of the literals |
/// | `allow_nil` | skip this field's rules when nil |
/// | `allow_blank` | skip this field's rules when blank |
/// | `message = "..."` | replace the default message |
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Default, Partial)]
/// pub struct Telephone {
///     #[validates(inclusion("+81", "+1"))]
///     pub country: Value,
///     #[validates(format = r"\d{2}-\d{4}-\d{4}", message = "is malformed")]
///     pub number: Value,
/// }
///
/// let mut tel = PartialProxy::new(Telephone::default());
/// tel.set_number("00-1111-2222")?;
/// assert!(!tel.validate()?); // country is nil
/// ```
///
/// # Compile Errors
///
/// - Generic, tuple, or non-struct types
/// - Unknown `validates` keys
/// - A `format` pattern that is not a valid regex
/// - An empty `inclusion` list
#[proc_macro_derive(Partial, attributes(validates))]
pub fn derive_partial(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    partial::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive name-keyed access for a plain record.
///
/// Fields are `partitional::Value` unless marked:
///
/// | Attribute | Effect |
/// |-----------|--------|
/// | `#[record(nested)]` | reachable by `nested`; `T: Record` or `Option<T>` |
/// | `#[record(readonly)]` | readable, writes fail with `ReadOnly` |
/// | `#[record(skip)]` | not reachable by name |
///
/// An absent `Option` nested record is reported as undefined; it is never
/// created.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive a host record.
///
/// Accepts the `Record` field attributes plus `#[record(errors)]` and
/// `#[record(partials)]`, each required on exactly one field.
///
/// # Struct Attributes
///
/// ```ignore
/// #[partition(tel, Telephone)]                                  // number -> number
/// #[partition(tel, Telephone, prefix = "tel")]                  // number -> tel_number
/// #[partition(tel, Telephone, mapping(number = "line.number"))] // dotted path
/// #[partition(tel, Telephone, validation = false)]              // no bridge
///
/// #[validates_partial(tel, if = "run", message = "is malformed")]
/// #[validate(check_contact)] // fn(&Contact, &mut Errors)
/// ```
///
/// `validates_partial` accepts `if`, `unless`, `message`, `allow_nil`,
/// `allow_blank`, and `attributes(..)`. Guards are a property name
/// (`"run"`), a bool, or a `fn(&Host) -> bool` path. A `validates_partial`
/// for a partition replaces that partition's default bridge.
///
/// # Compile Errors
///
/// - Missing `errors` or `partials` field
/// - A partition declared twice, or `validates_partial` naming none
/// - Unknown `partition` or `validates_partial` options
/// - An invalid prefix or mapping path
/// - A mapping key the target does not declare (const assertion)
#[proc_macro_derive(Host, attributes(partition, validates_partial, validate, record))]
pub fn derive_host(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    host::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
