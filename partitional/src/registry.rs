//! Process-wide registry of partial definitions, keyed by host type.
//!
//! Each `#[partition(...)]` submits one [`Declaration`] through `inventory`.
//! The first lookup collects every submission, builds its mapping, and
//! freezes the result; after that the registry is read-only.
//!
//! # Example
//!
//! ```ignore
//! // At startup, fail fast on any bad registration:
//! partitional::registry::verify()?;
//!
//! let tel = partitional::registry::definition::<Contact>("tel")?;
//! assert_eq!(tel.mapping().resolve("number").unwrap().key(), "tel_number");
//! ```

use core::any::{type_name, TypeId};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::error::{ConfigurationError, Error};
use crate::mapping::Mapping;
use crate::proxy::Partial;
use crate::record::ReadAttribute;
use crate::validation::Errors;

/// Signature of a partial type's own validation routine.
pub type ValidateFn = fn(&dyn ReadAttribute, &mut Errors) -> Result<(), Error>;

/// A raw `partition` declaration, as submitted at compile time.
///
/// The `Host` derive emits these; a hand-written submission looks like:
///
/// ```ignore
/// partitional::__private::inventory::submit! {
///     partitional::registry::Declaration {
///         host: core::any::TypeId::of::<Contact>,
///         host_name: "Contact",
///         name: "tel",
///         target: core::any::TypeId::of::<Telephone>,
///         target_name: <Telephone as partitional::Partial>::NAME,
///         attributes: <Telephone as partitional::Partial>::ATTRIBUTES,
///         mapping: &[],
///         prefix: Some("tel"),
///         validation: true,
///         validate: <Telephone as partitional::Partial>::validate,
///     }
/// }
/// ```
pub struct Declaration {
    pub host: fn() -> TypeId,
    pub host_name: &'static str,
    pub name: &'static str,
    pub target: fn() -> TypeId,
    pub target_name: &'static str,
    pub attributes: &'static [&'static str],
    pub mapping: &'static [(&'static str, &'static str)],
    pub prefix: Option<&'static str>,
    pub validation: bool,
    pub validate: ValidateFn,
}

inventory::collect!(Declaration);

/// A built, immutable partial definition.
pub struct PartialDefinition {
    name: &'static str,
    host_name: &'static str,
    target: TypeId,
    target_name: &'static str,
    mapping: Mapping,
    validation: bool,
    validate: ValidateFn,
}

impl PartialDefinition {
    fn build(declaration: &Declaration) -> Result<Self, ConfigurationError> {
        let mapping = Mapping::build(
            declaration.target_name,
            declaration.attributes,
            declaration.mapping,
            declaration.prefix,
        )?;
        Ok(Self {
            name: declaration.name,
            host_name: declaration.host_name,
            target: (declaration.target)(),
            target_name: declaration.target_name,
            mapping,
            validation: declaration.validation,
            validate: declaration.validate,
        })
    }

    /// Accessor name on the host.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn host_name(&self) -> &'static str {
        self.host_name
    }

    #[inline]
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    #[inline]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Whether the declaration attached a validation bridge.
    #[inline]
    pub fn validation(&self) -> bool {
        self.validation
    }

    #[inline]
    pub fn targets<T: Partial>(&self) -> bool {
        self.target == TypeId::of::<T>()
    }

    pub(crate) fn expect_target<T: Partial>(&self) -> Result<(), ConfigurationError> {
        if self.targets::<T>() {
            return Ok(());
        }
        Err(ConfigurationError::TargetMismatch {
            host: self.host_name,
            name: self.name,
            expected: self.target_name,
            requested: T::NAME,
        })
    }

    /// Run the target type's own rules against `source`.
    pub fn run_validation(&self, source: &dyn ReadAttribute, errors: &mut Errors) -> Result<(), Error> {
        (self.validate)(source, errors)
    }
}

impl core::fmt::Debug for PartialDefinition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PartialDefinition")
            .field("name", &self.name)
            .field("host", &self.host_name)
            .field("target", &self.target_name)
            .field("mapping", &self.mapping)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

type Entry = Result<PartialDefinition, ConfigurationError>;

struct Registry {
    hosts: IndexMap<TypeId, IndexMap<&'static str, Entry>>,
}

impl Registry {
    fn collect() -> Self {
        let mut hosts: IndexMap<TypeId, IndexMap<&'static str, Entry>> = IndexMap::new();
        let mut count = 0usize;

        for declaration in inventory::iter::<Declaration> {
            let partials = hosts.entry((declaration.host)()).or_default();
            let entry = if partials.contains_key(declaration.name) {
                Err(ConfigurationError::DuplicatePartial {
                    host: declaration.host_name,
                    name: declaration.name,
                })
            } else {
                PartialDefinition::build(declaration)
            };
            if let Err(err) = &entry {
                warn!(host = declaration.host_name, partial = declaration.name, %err, "invalid partial declaration");
            }
            partials.insert(declaration.name, entry);
            count += 1;
        }

        debug!(hosts = hosts.len(), partials = count, "built partial registry");
        Self { hosts }
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::collect);

/// The definition of partial `name` on host type `H`.
///
/// # Errors
///
/// - [`ConfigurationError::UnknownPartial`] if `H` declares no such partial
/// - The error its declaration produced, if the declaration is invalid
pub fn definition<H: 'static>(name: &str) -> Result<&'static PartialDefinition, ConfigurationError> {
    let registry: &'static Registry = &REGISTRY;
    match registry.hosts.get(&TypeId::of::<H>()).and_then(|partials| partials.get(name)) {
        Some(Ok(definition)) => Ok(definition),
        Some(Err(err)) => Err(err.clone()),
        None => Err(ConfigurationError::UnknownPartial {
            host: type_name::<H>(),
            name: name.to_owned(),
        }),
    }
}

/// Every valid definition on host type `H`.
pub fn definitions<H: 'static>() -> impl Iterator<Item = &'static PartialDefinition> {
    let registry: &'static Registry = &REGISTRY;
    registry
        .hosts
        .get(&TypeId::of::<H>())
        .into_iter()
        .flat_map(|partials| partials.values())
        .filter_map(|entry| entry.as_ref().ok())
}

/// Check every registered declaration, returning the first error.
pub fn verify() -> Result<(), ConfigurationError> {
    let registry: &'static Registry = &REGISTRY;
    for partials in registry.hosts.values() {
        for entry in partials.values() {
            if let Err(err) = entry {
                return Err(err.clone());
            }
        }
    }
    Ok(())
}
