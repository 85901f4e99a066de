//! Accessor semantics behind the generated getters and setters.
//!
//! `#[derive(Host)]` turns each `#[partition(tel, Telephone, ...)]` into:
//!
//! | Generated | Calls | Behaviour |
//! |-----------|-------|-----------|
//! | `fn tel(&mut self) -> PartialProxy<'_, Telephone>` | [`fetch`] | Lazily memoizes one proxy instance per host and name |
//! | `fn set_tel(&mut self, origin: &O)` | [`assign`] | Replaces the memoized instance, copies direct attributes |
//!
//! Because a Bound proxy borrows its host, the memo cannot hold the proxy
//! itself. [`Partials`] keeps the instance's identity and own state instead,
//! and every getter call re-attaches them to a fresh borrow of the host.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{ConfigurationError, Error};
use crate::proxy::{BoundView, Partial, PartialProxy, PartialState};
use crate::record::{Host, ReadAttribute};
use crate::registry::{self, PartialDefinition};
use crate::resolver;

/// Memoized partial instances of one host, keyed by accessor name.
///
/// Hosts keep one of these in a `#[record(partials)]` field.
#[derive(Debug, Default)]
pub struct Partials {
    slots: IndexMap<&'static str, Rc<PartialState>>,
}

impl Partials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the getter for `name` has been called (or the setter used).
    #[inline]
    pub fn is_memoized(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn obtain(&mut self, name: &'static str) -> Rc<PartialState> {
        self.slots
            .entry(name)
            .or_insert_with(|| {
                trace!(partial = name, "memoizing partial");
                Rc::default()
            })
            .clone()
    }

    pub(crate) fn replace(&mut self, name: &'static str) -> Rc<PartialState> {
        let state = Rc::<PartialState>::default();
        self.slots.insert(name, state.clone());
        state
    }
}

/// Bind the memoized instance for `definition` to `host`.
pub(crate) fn bind<'h, H: Host>(
    host: &'h mut H,
    definition: &'static PartialDefinition,
) -> (BoundView<'h>, Rc<PartialState>) {
    let state = host.partials_mut().obtain(definition.name());
    let view = BoundView::new(host, definition.mapping(), definition.target_name());
    (view, state)
}

/// The getter behind a generated accessor, without panicking.
///
/// # Errors
///
/// - [`ConfigurationError::UnknownPartial`] if `H` declares no partial `name`
/// - [`ConfigurationError::TargetMismatch`] if it targets another type than `T`
/// - Any error raised while building the declaration's definition
pub fn try_fetch<'h, H: Host, T: Partial>(
    host: &'h mut H,
    name: &str,
) -> Result<PartialProxy<'h, T>, ConfigurationError> {
    let definition = registry::definition::<H>(name)?;
    definition.expect_target::<T>()?;
    let (view, state) = bind(host, definition);
    Ok(PartialProxy::bound(view, state))
}

/// The getter behind a generated accessor.
///
/// Returns the memoized Bound proxy for `name`, creating it on first use.
///
/// # Panics
///
/// If the partial's declaration is invalid. The `Host` derive rejects invalid
/// declarations at compile time, so this only fires for hand-written
/// registrations; call [`registry::verify`] at startup to catch them early.
pub fn fetch<'h, H: Host, T: Partial>(host: &'h mut H, name: &str) -> PartialProxy<'h, T> {
    match try_fetch(host, name) {
        Ok(proxy) => proxy,
        Err(err) => panic!("{err}"),
    }
}

/// The setter behind a generated accessor.
///
/// Replaces the memoized instance for `name` with a new Bound one, then
/// copies `origin`'s value of every attribute whose path is direct into the
/// host. Attributes mapped through a dotted path are left alone: the host
/// keeps whatever nested record it already exposes there.
///
/// `origin` is read completely before anything is written, so a failing
/// origin leaves the host untouched.
pub fn assign<H, T, O>(host: &mut H, name: &str, origin: &O) -> Result<(), Error>
where
    H: Host,
    T: Partial,
    O: ReadAttribute + ?Sized,
{
    let definition = registry::definition::<H>(name)?;
    definition.expect_target::<T>()?;

    let mut copies = Vec::with_capacity(definition.mapping().len());
    for (attribute, path) in definition.mapping().iter() {
        if path.is_dotted() {
            continue;
        }
        copies.push((path, origin.read_attribute(attribute)?));
    }

    host.partials_mut().replace(definition.name());
    debug!(
        partial = definition.name(),
        host = definition.host_name(),
        copied = copies.len(),
        "replaced partial"
    );

    for (path, value) in copies {
        resolver::set(&mut *host, path, value)?;
    }
    Ok(())
}
