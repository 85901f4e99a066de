//! The validation bridge: run a partial's own rules, re-key onto the host.
//!
//! # Re-keying
//!
//! | Partial error | Mapped path | Host error key |
//! |---------------|-------------|----------------|
//! | `number` | `number` | `number` |
//! | `number` | `tel_number` | `tel_number` |
//! | `number` | `telephone.number` | `telephone.number` |
//! | `base` | (not mapped) | `base` |
//!
//! # Options
//!
//! | Key | Value | Effect |
//! |-----|-------|--------|
//! | `allow_nil` | flag | Skip when every partial attribute is nil |
//! | `allow_blank` | flag | Skip when every partial attribute is blank |
//! | `if` | guard | Skip when the guard is false |
//! | `unless` | guard | Skip when the guard is true |
//! | `message` | text | Replace every re-keyed message |
//! | `attributes` | list | Only keep re-keyed errors under these host keys |
//!
//! Any other key is a [`ConfigurationError`], raised when the options are
//! built and never at validation time.

use core::fmt;
use std::borrow::Cow;

use tracing::{debug, trace};

use crate::binder;
use crate::error::{ConfigurationError, Error};
use crate::mapping::Mapping;
use crate::path::Path;
use crate::record::{Host, ReadAttribute};
use crate::registry;

use super::errors::Errors;
use super::rule_set::Rule;

/// A condition evaluated against the host at validation time.
pub enum Guard<H> {
    /// Fixed outcome.
    Constant(bool),
    /// Truthiness of a host accessor.
    Property(Cow<'static, str>),
    /// A predicate called with the host.
    Predicate(fn(&H) -> bool),
}

impl<H: Host> Guard<H> {
    pub fn property(name: impl Into<Cow<'static, str>>) -> Self {
        Guard::Property(name.into())
    }

    /// Evaluate the guard.
    ///
    /// # Errors
    ///
    /// A `Property` guard naming an accessor the host lacks fails with the
    /// host's resolution error.
    pub fn evaluate(&self, host: &H) -> Result<bool, Error> {
        match self {
            Guard::Constant(value) => Ok(*value),
            Guard::Property(name) => Ok(host.read(name)?.is_truthy()),
            Guard::Predicate(predicate) => Ok(predicate(host)),
        }
    }
}

impl<H> Clone for Guard<H> {
    fn clone(&self) -> Self {
        match self {
            Guard::Constant(value) => Guard::Constant(*value),
            Guard::Property(name) => Guard::Property(name.clone()),
            Guard::Predicate(predicate) => Guard::Predicate(*predicate),
        }
    }
}

impl<H> fmt::Debug for Guard<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Constant(value) => write!(f, "{value}"),
            Guard::Property(name) => write!(f, ":{name}"),
            Guard::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

impl<H> From<bool> for Guard<H> {
    fn from(value: bool) -> Self {
        Guard::Constant(value)
    }
}

impl<H> From<&'static str> for Guard<H> {
    fn from(name: &'static str) -> Self {
        Guard::Property(Cow::Borrowed(name))
    }
}

impl<H> From<fn(&H) -> bool> for Guard<H> {
    fn from(predicate: fn(&H) -> bool) -> Self {
        Guard::Predicate(predicate)
    }
}

/// An untyped option value, for building [`BridgeOptions`] from key/value
/// pairs.
pub enum OptionValue<H> {
    Flag(bool),
    Text(String),
    List(Vec<String>),
    Guard(Guard<H>),
}

impl<H> fmt::Display for OptionValue<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(value) => write!(f, "{value}"),
            OptionValue::Text(text) => write!(f, "{text:?}"),
            OptionValue::List(items) => write!(f, "{items:?}"),
            OptionValue::Guard(guard) => write!(f, "{guard:?}"),
        }
    }
}

impl<H> From<bool> for OptionValue<H> {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl<H> From<&str> for OptionValue<H> {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_owned())
    }
}

impl<H> From<Guard<H>> for OptionValue<H> {
    fn from(guard: Guard<H>) -> Self {
        OptionValue::Guard(guard)
    }
}

/// Options recognised by [`ValidationBridge`].
pub struct BridgeOptions<H> {
    allow_nil: bool,
    allow_blank: bool,
    when: Option<Guard<H>>,
    unless: Option<Guard<H>>,
    message: Option<String>,
    attributes: Option<Vec<String>>,
}

impl<H> Default for BridgeOptions<H> {
    fn default() -> Self {
        Self {
            allow_nil: false,
            allow_blank: false,
            when: None,
            unless: None,
            message: None,
            attributes: None,
        }
    }
}

impl<H> fmt::Debug for BridgeOptions<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeOptions")
            .field("allow_nil", &self.allow_nil)
            .field("allow_blank", &self.allow_blank)
            .field("if", &self.when)
            .field("unless", &self.unless)
            .field("message", &self.message)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<H: Host> BridgeOptions<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build options from `(key, value)` pairs.
    ///
    /// Flags may be given for guards (constant guard) and text for guards
    /// (host property) or for `attributes` (a single key).
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidOptions`] listing every unknown key and
    /// every known key given a value of the wrong kind.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let err = BridgeOptions::<Contact>::parse([("undefined", true.into())]).unwrap_err();
    /// assert_eq!(err.to_string(), "undefined: true is invalid options");
    /// ```
    pub fn parse<'k, I>(pairs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (&'k str, OptionValue<H>)>,
    {
        let mut options = Self::default();
        let mut invalid = Vec::new();

        for (key, value) in pairs {
            match (key, value) {
                ("allow_nil", OptionValue::Flag(flag)) => options.allow_nil = flag,
                ("allow_blank", OptionValue::Flag(flag)) => options.allow_blank = flag,
                ("if", value) | ("unless", value) => match into_guard(value) {
                    Ok(guard) if key == "if" => options.when = Some(guard),
                    Ok(guard) => options.unless = Some(guard),
                    Err(value) => invalid.push(format!("{key}: {value}")),
                },
                ("message", OptionValue::Text(text)) => options.message = Some(text),
                ("attributes", OptionValue::List(keys)) => options.attributes = Some(keys),
                ("attributes", OptionValue::Text(key)) => options.attributes = Some(vec![key]),
                (key, value) => invalid.push(format!("{key}: {value}")),
            }
        }

        if !invalid.is_empty() {
            return Err(ConfigurationError::InvalidOptions { options: invalid });
        }
        Ok(options)
    }

    pub fn allow_nil(mut self, allow: bool) -> Self {
        self.allow_nil = allow;
        self
    }

    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// The `if` guard.
    pub fn when(mut self, guard: impl Into<Guard<H>>) -> Self {
        self.when = Some(guard.into());
        self
    }

    pub fn unless(mut self, guard: impl Into<Guard<H>>) -> Self {
        self.unless = Some(guard.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn attributes<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the guards say to skip this run.
    fn guarded(&self, host: &H) -> Result<bool, Error> {
        if let Some(guard) = &self.when {
            if !guard.evaluate(host)? {
                return Ok(true);
            }
        }
        if let Some(guard) = &self.unless {
            if guard.evaluate(host)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `allow_nil` / `allow_blank` apply to the partial's values.
    fn exempt(&self, partial: &dyn ReadAttribute, mapping: &Mapping) -> Result<bool, Error> {
        if !self.allow_nil && !self.allow_blank {
            return Ok(false);
        }
        let mut all_nil = true;
        let mut all_blank = true;
        for (attribute, _) in mapping.iter() {
            let value = partial.read_attribute(attribute)?;
            all_nil &= value.is_nil();
            all_blank &= value.is_blank();
        }
        Ok((self.allow_nil && all_nil) || (self.allow_blank && all_blank))
    }

    fn permits(&self, key: &str) -> bool {
        self.attributes
            .as_ref()
            .map_or(true, |keys| keys.iter().any(|k| k == key))
    }
}

fn into_guard<H>(value: OptionValue<H>) -> Result<Guard<H>, OptionValue<H>> {
    match value {
        OptionValue::Guard(guard) => Ok(guard),
        OptionValue::Flag(flag) => Ok(Guard::Constant(flag)),
        OptionValue::Text(name) => Ok(Guard::Property(Cow::Owned(name))),
        other => Err(other),
    }
}

/// Rule that validates the partial behind accessor `name` and re-keys its
/// errors onto the host.
///
/// # Example
///
/// ```ignore
/// let rules = RuleSet::new().with(ValidationBridge::new(
///     "tel",
///     BridgeOptions::new().when("run").message("is malformed"),
/// ));
/// ```
#[derive(Debug)]
pub struct ValidationBridge<H> {
    name: &'static str,
    options: BridgeOptions<H>,
}

impl<H: Host> ValidationBridge<H> {
    pub fn new(name: &'static str, options: BridgeOptions<H>) -> Self {
        Self { name, options }
    }

    /// Bridge for `name` with options parsed from key/value pairs.
    pub fn with_options<'k, I>(name: &'static str, pairs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (&'k str, OptionValue<H>)>,
    {
        Ok(Self::new(name, BridgeOptions::parse(pairs)?))
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<H: Host> Rule<H> for ValidationBridge<H> {
    fn check(&self, host: &mut H) -> Result<(), Error> {
        if self.options.guarded(host)? {
            trace!(partial = self.name, "bridge skipped by guard");
            return Ok(());
        }

        let definition = registry::definition::<H>(self.name)?;
        let (view, state) = binder::bind(host, definition);
        if self.options.exempt(&view, definition.mapping())? {
            trace!(partial = self.name, "bridge skipped, partial is nil or blank");
            return Ok(());
        }
        let mut own = Errors::new();
        definition.run_validation(&view, &mut own)?;
        drop(view);
        state.store_errors(own.clone());

        let mut added = 0usize;
        for (attribute, message) in own.iter() {
            let key = definition.mapping().resolve(attribute).map_or(attribute, Path::key);
            if !self.options.permits(key) {
                continue;
            }
            let message = self.options.message.as_deref().unwrap_or(message);
            host.errors_mut().add(key, message);
            added += 1;
        }
        debug!(partial = self.name, errors = added, "re-keyed partial errors");
        Ok(())
    }
}
