//! Validation: error collection, partial-level rules, host rule sets, and the
//! bridge between them.
//!
//! | Item | Level | Purpose |
//! |------|-------|---------|
//! | [`Errors`] | both | Ordered `(key, message)` collection |
//! | [`AttributeRule`] | partial | Presence / format / inclusion checks |
//! | [`RuleSet`], [`Rule`], [`FnRule`] | host | Rules run by [`Host::validate`](crate::Host::validate) |
//! | [`ValidationBridge`] | host | Runs a partial's rules and re-keys the errors |

mod bridge;
mod errors;
mod rule_set;
mod rules;

pub use bridge::{BridgeOptions, Guard, OptionValue, ValidationBridge};
pub use errors::Errors;
pub use rule_set::{FnRule, Rule, RuleSet};
pub use rules::{run as run_rules, AttributeRule};
