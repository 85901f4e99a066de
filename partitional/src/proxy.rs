//! Partial types and their runtime proxies.
//!
//! A [`PartialProxy`] is in one of two states:
//!
//! | State | Created by | Reads/writes go to |
//! |-------|------------|--------------------|
//! | Unbound | [`PartialProxy::new`] | The proxy's own local storage (`T`) |
//! | Bound | a generated getter (`host.tel()`) | The host, through the mapping |
//!
//! The state is fixed at construction. Assigning an Unbound proxy to a host
//! never turns it into a Bound one; the setter derives a new Bound proxy and
//! leaves the original untouched. A Bound proxy borrows its host, so it can
//! never outlive it.
//!
//! # Example
//!
//! ```ignore
//! let mut contact = Contact::default();
//!
//! let mut tel = contact.tel();
//! tel.set("number", "00-0000-1111")?;
//! drop(tel);
//! assert_eq!(contact.number, "00-0000-1111");
//!
//! contact.number = "00-2222-3333".into();
//! assert_eq!(contact.tel().get("number")?, "00-2222-3333");
//! ```

use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{Error, ResolutionError};
use crate::mapping::Mapping;
use crate::path::Path;
use crate::record::{ReadAttribute, Record, WriteAttribute};
use crate::resolver;
use crate::validation::Errors;
use crate::value::Value;

/// A value object whose attributes may live on a host.
///
/// Usually derived with `#[derive(Partial)]`, which also implements
/// [`ReadAttribute`] and [`Record`] for the type and generates a typed
/// accessor trait for its proxies.
pub trait Partial: Sized + 'static {
    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// Declared attributes, in declaration order. This is the domain of every
    /// mapping built for the type.
    const ATTRIBUTES: &'static [&'static str];

    /// Read a declared attribute from local storage.
    fn read_local(&self, attribute: &str) -> Option<Value>;

    /// Write a declared attribute to local storage. `false` if undeclared.
    fn write_local(&mut self, attribute: &str, value: Value) -> bool;

    /// Run the type's own rules against `source`.
    fn validate(source: &dyn ReadAttribute, errors: &mut Errors) -> Result<(), Error> {
        let _ = (source, errors);
        Ok(())
    }
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Per-instance state that survives re-borrowing a Bound proxy: its identity
/// and the errors from its last validation.
///
/// `id` is never reused within a process, so it stays meaningful after the
/// state itself is dropped.
#[derive(Debug)]
pub(crate) struct PartialState {
    id: u64,
    errors: RefCell<Errors>,
}

impl Default for PartialState {
    fn default() -> Self {
        Self {
            id: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            errors: RefCell::default(),
        }
    }
}

impl PartialState {
    pub(crate) fn store_errors(&self, errors: Errors) {
        *self.errors.borrow_mut() = errors;
    }

    pub(crate) fn errors(&self) -> Errors {
        self.errors.borrow().clone()
    }
}

/// Type-erased bound access: a host borrow plus the mapping in effect.
pub struct BoundView<'h> {
    host: &'h mut dyn Record,
    mapping: &'static Mapping,
    partial: &'static str,
}

impl<'h> BoundView<'h> {
    pub(crate) fn new(host: &'h mut dyn Record, mapping: &'static Mapping, partial: &'static str) -> Self {
        Self { host, mapping, partial }
    }

    fn path(&self, attribute: &str) -> Result<&'static Path, ResolutionError> {
        let mapping: &'static Mapping = self.mapping;
        mapping
            .resolve(attribute)
            .ok_or_else(|| ResolutionError::undeclared(self.partial, attribute))
    }

    pub fn get(&self, attribute: &str) -> Result<Value, Error> {
        let path = self.path(attribute)?;
        Ok(resolver::get(&*self.host, path)?)
    }

    pub fn set(&mut self, attribute: &str, value: Value) -> Result<(), Error> {
        let path = self.path(attribute)?;
        Ok(resolver::set(&mut *self.host, path, value)?)
    }

    #[inline]
    pub fn mapping(&self) -> &'static Mapping {
        self.mapping
    }
}

impl ReadAttribute for BoundView<'_> {
    fn read_attribute(&self, attribute: &str) -> Result<Value, Error> {
        self.get(attribute)
    }
}

impl WriteAttribute for BoundView<'_> {
    fn write_attribute(&mut self, attribute: &str, value: Value) -> Result<(), Error> {
        self.set(attribute, value)
    }
}

enum Binding<'h, T> {
    Unbound(T),
    Bound(BoundView<'h>),
}

/// The runtime object for a partial of type `T`.
pub struct PartialProxy<'h, T: Partial> {
    binding: Binding<'h, T>,
    state: Rc<PartialState>,
}

impl<T: Partial> PartialProxy<'static, T> {
    /// A standalone (Unbound) proxy owning `local`.
    pub fn new(local: T) -> Self {
        Self {
            binding: Binding::Unbound(local),
            state: Rc::default(),
        }
    }
}

impl<'h, T: Partial> PartialProxy<'h, T> {
    pub(crate) fn bound(view: BoundView<'h>, state: Rc<PartialState>) -> Self {
        Self {
            binding: Binding::Bound(view),
            state,
        }
    }

    /// Current value of `attribute`.
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::Undeclared`] if `T` does not declare `attribute`
    /// - Any [`ResolutionError`] the host reports along the mapped path
    pub fn get(&self, attribute: &str) -> Result<Value, Error> {
        match &self.binding {
            Binding::Unbound(local) => local
                .read_local(attribute)
                .ok_or_else(|| ResolutionError::undeclared(T::NAME, attribute).into()),
            Binding::Bound(view) => view.get(attribute),
        }
    }

    /// Write `attribute`, to local storage or through to the host.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> Result<(), Error> {
        match &mut self.binding {
            Binding::Unbound(local) => {
                if local.write_local(attribute, value.into()) {
                    Ok(())
                } else {
                    Err(ResolutionError::undeclared(T::NAME, attribute).into())
                }
            }
            Binding::Bound(view) => view.set(attribute, value.into()),
        }
    }

    /// Every declared attribute and its current value, in declaration order.
    ///
    /// Only attributes appear; host and mapping state never do.
    pub fn export_flat(&self) -> Result<FlatRecord, Error> {
        let mut values = IndexMap::with_capacity(T::ATTRIBUTES.len());
        for &attribute in T::ATTRIBUTES {
            values.insert(attribute, self.get(attribute)?);
        }
        Ok(FlatRecord(values))
    }

    /// Run `T`'s own rules against the current values.
    ///
    /// The errors are kept on this instance (see [`errors`](Self::errors));
    /// returns whether none were found.
    pub fn validate(&self) -> Result<bool, Error> {
        let mut errors = Errors::new();
        T::validate(self, &mut errors)?;
        let valid = errors.is_empty();
        self.state.store_errors(errors);
        Ok(valid)
    }

    /// Errors from the last validation of this instance, under the partial's
    /// own attribute names.
    pub fn errors(&self) -> Errors {
        self.state.errors()
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    /// The mapping in effect, for Bound proxies.
    pub fn mapping(&self) -> Option<&'static Mapping> {
        match &self.binding {
            Binding::Unbound(_) => None,
            Binding::Bound(view) => Some(view.mapping()),
        }
    }

    /// Local storage, for Unbound proxies.
    pub fn local(&self) -> Option<&T> {
        match &self.binding {
            Binding::Unbound(local) => Some(local),
            Binding::Bound(_) => None,
        }
    }

    /// Whether both handles refer to the same proxy instance.
    ///
    /// Getter calls on one host return the same instance until the setter
    /// replaces it.
    #[inline]
    pub fn same_instance<'o>(&self, other: &PartialProxy<'o, T>) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Identity token that outlives the host borrow, for comparing instances
    /// across separate getter calls. Ids are unique for the life of the
    /// process, even after the instance they named is gone.
    #[inline]
    pub fn instance_id(&self) -> u64 {
        self.state.id
    }
}

impl<T: Partial + Default> Default for PartialProxy<'static, T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Partial> From<T> for PartialProxy<'static, T> {
    fn from(local: T) -> Self {
        Self::new(local)
    }
}

impl<T: Partial> ReadAttribute for PartialProxy<'_, T> {
    fn read_attribute(&self, attribute: &str) -> Result<Value, Error> {
        self.get(attribute)
    }
}

impl<T: Partial> WriteAttribute for PartialProxy<'_, T> {
    fn write_attribute(&mut self, attribute: &str, value: Value) -> Result<(), Error> {
        self.set(attribute, value)
    }
}

impl<T: Partial> fmt::Debug for PartialProxy<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialProxy")
            .field("partial", &T::NAME)
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

/// Flat `attribute -> value` export of a partial.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FlatRecord(IndexMap<&'static str, Value>);

impl FlatRecord {
    #[inline]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    #[inline]
    pub fn contains_key(&self, attribute: &str) -> bool {
        self.0.contains_key(attribute)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.0.iter().map(|(attribute, value)| (*attribute, value))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<&'static str, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{run_rules, AttributeRule};

    #[derive(Debug, Default)]
    struct Telephone {
        country: Value,
        number: Value,
    }

    impl Partial for Telephone {
        const NAME: &'static str = "Telephone";
        const ATTRIBUTES: &'static [&'static str] = &["country", "number"];

        fn read_local(&self, attribute: &str) -> Option<Value> {
            match attribute {
                "country" => Some(self.country.clone()),
                "number" => Some(self.number.clone()),
                _ => None,
            }
        }

        fn write_local(&mut self, attribute: &str, value: Value) -> bool {
            match attribute {
                "country" => self.country = value,
                "number" => self.number = value,
                _ => return false,
            }
            true
        }

        fn validate(source: &dyn ReadAttribute, errors: &mut Errors) -> Result<(), Error> {
            let rules = [AttributeRule::format("number", r"\d{2}-\d{4}-\d{4}")?];
            run_rules(&rules, source, errors)
        }
    }

    #[derive(Default)]
    struct Sheet {
        tel_country: Value,
        tel_number: Value,
    }

    impl Record for Sheet {
        fn read(&self, name: &str) -> Result<Value, ResolutionError> {
            match name {
                "tel_country" => Ok(self.tel_country.clone()),
                "tel_number" => Ok(self.tel_number.clone()),
                _ => Err(ResolutionError::undefined("Sheet", name)),
            }
        }

        fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
            match name {
                "tel_country" => self.tel_country = value,
                "tel_number" => self.tel_number = value,
                _ => return Err(ResolutionError::undefined("Sheet", name)),
            }
            Ok(())
        }

        fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
            Err(ResolutionError::not_nested("Sheet", name))
        }

        fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
            Err(ResolutionError::not_nested("Sheet", name))
        }
    }

    fn prefixed() -> &'static Mapping {
        Box::leak(Box::new(
            Mapping::build("Telephone", Telephone::ATTRIBUTES, &[], Some("tel")).unwrap(),
        ))
    }

    #[test]
    fn test_unbound_reads_local_storage() {
        let mut tel = PartialProxy::new(Telephone::default());
        assert!(!tel.is_bound());
        assert!(tel.mapping().is_none());

        tel.set("number", "00-4444-5555").unwrap();
        assert_eq!(tel.get("number").unwrap(), "00-4444-5555");
        assert_eq!(tel.local().unwrap().number, "00-4444-5555");
    }

    #[test]
    fn test_unbound_rejects_undeclared() {
        let mut tel = PartialProxy::new(Telephone::default());
        let err = tel.set("extension", "12").unwrap_err();
        assert_eq!(err, Error::Resolution(ResolutionError::undeclared("Telephone", "extension")));
    }

    #[test]
    fn test_bound_writes_through_mapping() {
        let mut sheet = Sheet::default();
        let mapping = prefixed();
        {
            let mut tel: PartialProxy<'_, Telephone> =
                PartialProxy::bound(BoundView::new(&mut sheet, mapping, "Telephone"), Rc::default());
            assert!(tel.is_bound());
            tel.set("number", "000-0000-1111").unwrap();
        }
        assert_eq!(sheet.tel_number, "000-0000-1111");

        sheet.tel_number = "000-2222-3333".into();
        let tel: PartialProxy<'_, Telephone> =
            PartialProxy::bound(BoundView::new(&mut sheet, mapping, "Telephone"), Rc::default());
        assert_eq!(tel.get("number").unwrap(), "000-2222-3333");
    }

    #[test]
    fn test_export_flat_lists_attributes_only() {
        let tel = PartialProxy::new(Telephone {
            country: "+81".into(),
            number: "00-4444-5555".into(),
        });
        let flat = tel.export_flat().unwrap();
        assert_eq!(flat.keys().collect::<Vec<_>>(), ["country", "number"]);
        assert_eq!(flat.get("country").unwrap(), &Value::from("+81"));
        assert!(!flat.contains_key("record"));
        assert!(!flat.contains_key("mapping"));
    }

    #[test]
    fn test_validate_keeps_errors_on_instance() {
        let tel = PartialProxy::new(Telephone::default());
        assert!(!tel.validate().unwrap());
        assert_eq!(tel.errors().get("number"), ["is invalid"]);

        let tel = PartialProxy::new(Telephone {
            country: Value::Nil,
            number: "00-1111-2222".into(),
        });
        assert!(tel.validate().unwrap());
        assert!(tel.errors().is_empty());
    }

    #[test]
    fn test_distinct_proxies_are_distinct_instances() {
        let a = PartialProxy::new(Telephone::default());
        let b = PartialProxy::new(Telephone::default());
        assert!(a.same_instance(&a));
        assert!(!a.same_instance(&b));
        assert_ne!(a.instance_id(), b.instance_id());
    }
}
