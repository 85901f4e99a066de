//! Host-level rules.
//!
//! A host type owns one [`RuleSet`], built once (the `Host` derive keeps it in
//! a `static`) and read-only afterwards. Rules run in declaration order and
//! write into the host's error collection.

use crate::error::Error;
use crate::record::Host;

use super::errors::Errors;

/// A validation rule attached to host type `H`.
pub trait Rule<H>: Send + Sync {
    /// Check `host` and append failures to its errors.
    ///
    /// `Err` is reserved for configuration and resolution problems.
    fn check(&self, host: &mut H) -> Result<(), Error>;
}

/// Ordered rules for one host type.
pub struct RuleSet<H> {
    rules: Vec<Box<dyn Rule<H>>>,
}

impl<H: Host> RuleSet<H> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule, builder style.
    pub fn with(mut self, rule: impl Rule<H> + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl Rule<H> + 'static) {
        self.rules.push(Box::new(rule));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against `host`, stopping at the first hard error.
    pub fn run(&self, host: &mut H) -> Result<(), Error> {
        for rule in &self.rules {
            rule.check(host)?;
        }
        Ok(())
    }
}

impl<H: Host> Default for RuleSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// A host's own check, written as a plain function.
///
/// ```ignore
/// fn check_contact(contact: &Contact, errors: &mut Errors) {
///     if contact.name.is_blank() {
///         errors.add("name", "can't be blank");
///     }
/// }
///
/// RuleSet::new().with(FnRule::new(check_contact));
/// ```
///
/// The function sees the host as left by earlier rules, errors included.
/// Its own failures go to a fresh collection that is appended afterwards.
pub struct FnRule<H> {
    check: fn(&H, &mut Errors),
}

impl<H> FnRule<H> {
    pub const fn new(check: fn(&H, &mut Errors)) -> Self {
        Self { check }
    }
}

impl<H: Host> Rule<H> for FnRule<H> {
    fn check(&self, host: &mut H) -> Result<(), Error> {
        let mut added = Errors::new();
        (self.check)(host, &mut added);
        host.errors_mut().append(added);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Contact;
    use crate::validation::{BridgeOptions, ValidationBridge};

    #[test]
    fn test_fn_rule_sees_earlier_errors() {
        fn summarize(contact: &Contact, errors: &mut Errors) {
            if !contact.errors.is_empty() {
                errors.add("base", format!("has {} problems", contact.errors.len()));
            }
        }
        let rules = RuleSet::new()
            .with(ValidationBridge::new("tel", BridgeOptions::new()))
            .with(FnRule::new(summarize));

        let mut contact = Contact::default();
        rules.run(&mut contact).unwrap();
        assert_eq!(
            contact.errors.full_messages(),
            ["tel_country is not included in the list", "tel_number is invalid", "base has 2 problems"]
        );
    }

    #[test]
    fn test_rules_run_in_order() {
        fn first(_: &Contact, errors: &mut Errors) {
            errors.add("first", "ran");
        }
        fn second(contact: &Contact, errors: &mut Errors) {
            errors.add("second", format!("after {}", contact.errors.keys().join(",")));
        }
        let rules = RuleSet::new().with(FnRule::new(first)).with(FnRule::new(second));

        let mut contact = Contact::default();
        rules.run(&mut contact).unwrap();
        assert_eq!(contact.errors.full_messages(), ["first ran", "second after first"]);
    }
}
