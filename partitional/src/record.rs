//! Capability traits for hosts, nested records, and assignable partials.
//!
//! | Trait | Implemented by | Purpose |
//! |-------|----------------|---------|
//! | [`Record`] | hosts, nested objects, partial types | Name-keyed accessors walked by the resolver |
//! | [`Host`] | hosts | Error collection, partial memo table, rule set |
//! | [`ReadAttribute`] | partial types, proxies | Source of values for assignment and validation |
//! | [`WriteAttribute`] | proxies | Sink for values |
//!
//! `#[derive(Record)]`, `#[derive(Host)]`, and `#[derive(Partial)]` implement
//! these; hand-written impls are fine for computed accessors.

use crate::binder::Partials;
use crate::error::{Error, ResolutionError};
use crate::validation::{Errors, RuleSet};
use crate::value::Value;

/// An object whose attributes can be reached by accessor name.
///
/// Every method fails with a [`ResolutionError`] when the accessor does not
/// exist; the resolver surfaces those errors unchanged.
///
/// # Example
///
/// ```
/// use partitional::{Record, ResolutionError, Value};
///
/// #[derive(Default)]
/// struct Line {
///     number: Value,
/// }
///
/// impl Record for Line {
///     fn read(&self, name: &str) -> Result<Value, ResolutionError> {
///         match name {
///             "number" => Ok(self.number.clone()),
///             _ => Err(ResolutionError::undefined("Line", name)),
///         }
///     }
///
///     fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
///         match name {
///             "number" => {
///                 self.number = value;
///                 Ok(())
///             }
///             _ => Err(ResolutionError::undefined("Line", name)),
///         }
///     }
///
///     fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
///         Err(ResolutionError::undefined("Line", name))
///     }
///
///     fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
///         Err(ResolutionError::undefined("Line", name))
///     }
/// }
/// ```
pub trait Record {
    /// Call the getter `name`.
    fn read(&self, name: &str) -> Result<Value, ResolutionError>;

    /// Call the setter `name`.
    fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError>;

    /// Call the getter `name`, which must return a nested record.
    fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError>;

    /// Mutable form of [`nested`](Self::nested). Must not create the nested
    /// record if it is absent.
    fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError>;
}

/// Read side of the attribute capability.
///
/// Anything assignable to a partial accessor implements this; assignment
/// copies values through it rather than by shape.
pub trait ReadAttribute {
    fn read_attribute(&self, attribute: &str) -> Result<Value, Error>;
}

/// Write side of the attribute capability.
pub trait WriteAttribute {
    fn write_attribute(&mut self, attribute: &str, value: Value) -> Result<(), Error>;
}

/// A record that owns partial accessors and an error collection.
///
/// Usually derived with `#[derive(Host)]`, which also generates one getter
/// and one setter per `#[partition(...)]`.
pub trait Host: Record + Sized + 'static {
    fn errors(&self) -> &Errors;

    fn errors_mut(&mut self) -> &mut Errors;

    /// Memoized partials of this instance.
    fn partials_mut(&mut self) -> &mut Partials;

    /// Validation rules declared for this host type, bridges included.
    fn rules() -> &'static RuleSet<Self>;

    /// Clear the error collection and run every rule.
    ///
    /// Returns `Ok(true)` when no errors were collected. `Err` is reserved for
    /// configuration and resolution problems; validation failures are data.
    fn validate(&mut self) -> Result<bool, Error> {
        self.errors_mut().clear();
        Self::rules().run(self)?;
        Ok(self.errors().is_empty())
    }

    #[inline]
    fn is_valid(&mut self) -> Result<bool, Error> {
        self.validate()
    }

    #[inline]
    fn is_invalid(&mut self) -> Result<bool, Error> {
        self.validate().map(|valid| !valid)
    }
}
