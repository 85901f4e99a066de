//! # Partitional - Partial Value Objects over Host Records
//!
//! Partitional lets a small value object (a *partial*) present a subset of
//! attributes that physically live on another object (the *host*). Reads and
//! writes on the partial go through a per-attribute mapping onto the host,
//! and the partial's own validation failures are re-keyed onto the host's
//! error collection under the mapped names.
//!
//! ## Core Architecture
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | Mapping resolver | [`mapping`], [`resolver`] | Attribute → direct or dotted path; traversal |
//! | Partial proxy | [`PartialProxy`] | Bound (delegating) or Unbound (local storage) |
//! | Accessor binder | [`binder`], [`registry`] | Generated getters/setters, memoization, definitions |
//! | Validation bridge | [`ValidationBridge`] | Runs the partial's rules, re-keys errors |
//!
//! Data flows from declaration to access:
//!
//! 1. **Declare**: `#[partition(...)]` on a host registers a definition
//! 2. **Access**: the generated getter binds a proxy to the host
//! 3. **Validate**: the bridge runs the partial's rules and rewrites keys
//!
//! ## Quick Start
//!
//! ### 1. Define a Partial
//!
//! ```ignore
//! use partitional::{Partial, Value};
//!
//! #[derive(Debug, Default, Partial)]
//! pub struct Telephone {
//!     #[validates(inclusion("+81", "+1"))]
//!     pub country: Value,
//!     #[validates(format = r"\d{2}-\d{4}-\d{4}")]
//!     pub number: Value,
//! }
//! ```
//!
//! ### 2. Declare It on a Host
//!
//! ```ignore
//! use partitional::{Errors, Host, Partials, Value};
//!
//! #[derive(Default, Host)]
//! #[partition(tel, Telephone, prefix = "tel")]
//! pub struct Contact {
//!     pub tel_country: Value,
//!     pub tel_number: Value,
//!     #[record(errors)]
//!     pub errors: Errors,
//!     #[record(partials)]
//!     pub partials: Partials,
//! }
//! ```
//!
//! This generates:
//! - `Contact::tel(&mut self) -> PartialProxy<'_, Telephone>`
//! - `Contact::set_tel(&mut self, origin: &impl ReadAttribute)`
//! - A registry entry mapping `country → tel_country`, `number → tel_number`
//! - A validation bridge re-keying `number` errors as `tel_number`
//!
//! ### 3. Use It
//!
//! ```ignore
//! use partitional::Host;
//! // `TelephoneAttributes` is generated next to `Telephone`
//!
//! let mut contact = Contact::default();
//! contact.tel().set_number("00-0000-1111")?;
//! assert_eq!(contact.tel_number, "00-0000-1111");
//!
//! assert!(contact.is_invalid()?); // country is nil
//! assert!(contact.errors.contains_key("tel_country"));
//! ```
//!
//! ## Errors
//!
//! - [`ConfigurationError`]: a declaration that can never work (fatal)
//! - [`ResolutionError`]: a missing accessor along a mapped path
//! - Validation failures are never errors, only entries in [`Errors`]
//!
//! ## Threading
//!
//! Everything is synchronous and single-threaded. Hosts hold their memoized
//! partials behind `Rc`, so they are `!Send`; the registry and rule sets are
//! immutable statics and may be shared freely.

extern crate self as partitional;

pub mod binder;
mod error;
pub mod mapping;
mod path;
mod proxy;
mod record;
pub mod registry;
pub mod resolver;
pub mod validation;
mod value;

#[cfg(test)]
mod fixtures;

pub use binder::Partials;
pub use error::{ConfigurationError, Error, ResolutionError};
pub use mapping::Mapping;
pub use path::Path;
pub use proxy::{BoundView, FlatRecord, Partial, PartialProxy};
pub use record::{Host, ReadAttribute, Record, WriteAttribute};
pub use registry::{Declaration, PartialDefinition};
pub use validation::{
    AttributeRule, BridgeOptions, Errors, FnRule, Guard, OptionValue, Rule, RuleSet,
    ValidationBridge,
};
pub use value::Value;

// Re-export derive macros
pub use partitional_macros::{Host, Partial, Record};

/// Items used by generated code. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use inventory;
    pub use once_cell::sync::Lazy;
}

/// Register a partial on a hand-written host.
///
/// `#[derive(Host)]` does this for `#[partition(...)]`; use the macro when
/// implementing [`Record`] and [`Host`] by hand.
///
/// # Example
///
/// ```ignore
/// partitional::declare_partition!(Contact, tel: Telephone, prefix = "tel");
///
/// partitional::declare_partition!(
///     Desk,
///     tel: Telephone,
///     mapping = { number => "telephone.number" },
///     validation = false,
/// );
/// ```
///
/// Clauses are optional but must appear in the order shown.
#[macro_export]
macro_rules! declare_partition {
    (
        $host:ty, $name:ident : $target:ty
        $(, prefix = $prefix:literal)?
        $(, mapping = { $($attr:ident => $path:literal),* $(,)? })?
        $(, validation = $validation:literal)?
        $(,)?
    ) => {
        $crate::__private::inventory::submit! {
            $crate::registry::Declaration {
                host: ::core::any::TypeId::of::<$host>,
                host_name: ::core::stringify!($host),
                name: ::core::stringify!($name),
                target: ::core::any::TypeId::of::<$target>,
                target_name: <$target as $crate::Partial>::NAME,
                attributes: <$target as $crate::Partial>::ATTRIBUTES,
                mapping: &[$($((::core::stringify!($attr), $path)),*)?],
                prefix: {
                    let prefix: ::core::option::Option<&'static str> = ::core::option::Option::None;
                    $(let prefix = ::core::option::Option::Some($prefix);)?
                    prefix
                },
                validation: {
                    let validation = true;
                    $(let validation = $validation;)?
                    validation
                },
                validate: <$target as $crate::Partial>::validate,
            }
        }
    };
}
