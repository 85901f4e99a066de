//! Attribute-level rules a partial type declares on itself.
//!
//! These are what a partial runs when asked to validate; the bridge then
//! re-keys whatever they report. `#[derive(Partial)]` builds them from
//! `#[validates(...)]` field attributes.
//!
//! | Check | Passes when | Default message |
//! |-------|-------------|-----------------|
//! | [`presence`](AttributeRule::presence) | value is not blank | `can't be blank` |
//! | [`format`](AttributeRule::format) | pattern matches the value's text | `is invalid` |
//! | [`inclusion`](AttributeRule::inclusion) | value is one of the listed values | `is not included in the list` |

use regex::Regex;

use crate::error::{ConfigurationError, Error};
use crate::record::ReadAttribute;
use crate::value::Value;

use super::errors::Errors;

#[derive(Clone, Debug)]
enum Check {
    Presence,
    Format(Regex),
    Inclusion(Vec<Value>),
}

impl Check {
    fn passes(&self, value: &Value) -> bool {
        match self {
            Check::Presence => !value.is_blank(),
            Check::Format(pattern) => pattern.is_match(&value.to_text()),
            Check::Inclusion(allowed) => allowed.contains(value),
        }
    }

    fn default_message(&self) -> &'static str {
        match self {
            Check::Presence => "can't be blank",
            Check::Format(_) => "is invalid",
            Check::Inclusion(_) => "is not included in the list",
        }
    }
}

/// One check on one attribute.
#[derive(Clone, Debug)]
pub struct AttributeRule {
    attribute: &'static str,
    check: Check,
    allow_nil: bool,
    allow_blank: bool,
    message: Option<String>,
}

impl AttributeRule {
    fn new(attribute: &'static str, check: Check) -> Self {
        Self {
            attribute,
            check,
            allow_nil: false,
            allow_blank: false,
            message: None,
        }
    }

    pub fn presence(attribute: &'static str) -> Self {
        Self::new(attribute, Check::Presence)
    }

    /// Unanchored pattern match against the value's text (`Nil` is `""`).
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidPattern`] if `pattern` does not compile.
    pub fn format(attribute: &'static str, pattern: &str) -> Result<Self, ConfigurationError> {
        let regex = Regex::new(pattern).map_err(|err| ConfigurationError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(Self::new(attribute, Check::Format(regex)))
    }

    pub fn inclusion<I, V>(attribute: &'static str, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(attribute, Check::Inclusion(allowed.into_iter().map(Into::into).collect()))
    }

    /// Skip the check when the value is `Nil`.
    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    /// Skip the check when the value is blank.
    pub fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[inline]
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    /// Check the attribute's current value and record a failure in `errors`.
    pub fn apply(&self, source: &dyn ReadAttribute, errors: &mut Errors) -> Result<(), Error> {
        let value = source.read_attribute(self.attribute)?;
        if (self.allow_nil && value.is_nil()) || (self.allow_blank && value.is_blank()) {
            return Ok(());
        }
        if !self.check.passes(&value) {
            let message = self.message.as_deref().unwrap_or(self.check.default_message());
            errors.add(self.attribute, message);
        }
        Ok(())
    }
}

/// Apply `rules` in order.
pub fn run(rules: &[AttributeRule], source: &dyn ReadAttribute, errors: &mut Errors) -> Result<(), Error> {
    for rule in rules {
        rule.apply(source, errors)?;
    }
    Ok(())
}
