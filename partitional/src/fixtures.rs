//! Hand-written hosts and partials shared by unit tests.

use once_cell::sync::Lazy;

use crate::binder::Partials;
use crate::error::{Error, ResolutionError};
use crate::proxy::Partial;
use crate::record::{Host, ReadAttribute, Record};
use crate::validation::{run_rules, AttributeRule, BridgeOptions, Errors, RuleSet, ValidationBridge};
use crate::value::Value;

#[derive(Debug, Default)]
pub(crate) struct Telephone {
    pub country: Value,
    pub number: Value,
}

static TELEPHONE_RULES: Lazy<Vec<AttributeRule>> = Lazy::new(|| {
    let mut rules = vec![AttributeRule::inclusion("country", ["+81", "+1"])];
    if let Ok(format) = AttributeRule::format("number", r"\d{2}-\d{4}-\d{4}") {
        rules.push(format);
    }
    rules
});

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
        run_rules(&TELEPHONE_RULES, source, errors)
    }
}

impl ReadAttribute for Telephone {
    fn read_attribute(&self, attribute: &str) -> Result<Value, Error> {
        self.read_local(attribute)
            .ok_or_else(|| ResolutionError::undeclared(Self::NAME, attribute).into())
    }
}

/// Prefixed host: `tel` maps onto `tel_country` / `tel_number`.
#[derive(Debug, Default)]
pub(crate) struct Contact {
    pub tel_country: Value,
    pub tel_number: Value,
    pub run: Value,
    pub errors: Errors,
    pub partials: Partials,
}

impl Record for Contact {
    fn read(&self, name: &str) -> Result<Value, ResolutionError> {
        match name {
            "tel_country" => Ok(self.tel_country.clone()),
            "tel_number" => Ok(self.tel_number.clone()),
            "run" => Ok(self.run.clone()),
            _ => Err(ResolutionError::undefined("Contact", name)),
        }
    }

    fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
        match name {
            "tel_country" => self.tel_country = value,
            "tel_number" => self.tel_number = value,
            "run" => self.run = value,
            _ => return Err(ResolutionError::undefined("Contact", name)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Contact", name))
    }

    fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Contact", name))
    }
}

static CONTACT_RULES: Lazy<RuleSet<Contact>> =
    Lazy::new(|| RuleSet::new().with(ValidationBridge::new("tel", BridgeOptions::new())));

impl Host for Contact {
    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    fn partials_mut(&mut self) -> &mut Partials {
        &mut self.partials
    }

    fn rules() -> &'static RuleSet<Self> {
        &CONTACT_RULES
    }
}

crate::declare_partition!(Contact, tel: Telephone, prefix = "tel");

#[derive(Debug, Default)]
pub(crate) struct Line {
    pub number: Value,
}

impl Record for Line {
    fn read(&self, name: &str) -> Result<Value, ResolutionError> {
        match name {
            "number" => Ok(self.number.clone()),
            _ => Err(ResolutionError::undefined("Line", name)),
        }
    }

    fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
        match name {
            "number" => self.number = value,
            _ => return Err(ResolutionError::undefined("Line", name)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Line", name))
    }

    fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Line", name))
    }
}

/// Deep host: `number` lives on a nested `telephone` record.
#[derive(Debug, Default)]
pub(crate) struct Desk {
    pub country: Value,
    pub telephone: Option<Line>,
    pub errors: Errors,
    pub partials: Partials,
}

impl Record for Desk {
    fn read(&self, name: &str) -> Result<Value, ResolutionError> {
        match name {
            "country" => Ok(self.country.clone()),
            _ => Err(ResolutionError::undefined("Desk", name)),
        }
    }

    fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
        match name {
            "country" => self.country = value,
            _ => return Err(ResolutionError::undefined("Desk", name)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
        match (name, &self.telephone) {
            ("telephone", Some(line)) => Ok(line),
            _ => Err(ResolutionError::undefined("Desk", name)),
        }
    }

    fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
        match (name, &mut self.telephone) {
            ("telephone", Some(line)) => Ok(line),
            _ => Err(ResolutionError::undefined("Desk", name)),
        }
    }
}

static DESK_RULES: Lazy<RuleSet<Desk>> =
    Lazy::new(|| RuleSet::new().with(ValidationBridge::new("tel", BridgeOptions::new())));

impl Host for Desk {
    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    fn partials_mut(&mut self) -> &mut Partials {
        &mut self.partials
    }

    fn rules() -> &'static RuleSet<Self> {
        &DESK_RULES
    }
}

crate::declare_partition!(
    Desk,
    tel: Telephone,
    mapping = { number => "telephone.number" },
);

/// A host whose only partial is declared with validation off.
#[derive(Debug, Default)]
pub(crate) struct Kiosk {
    pub country: Value,
    pub number: Value,
    pub errors: Errors,
    pub partials: Partials,
}

impl Record for Kiosk {
    fn read(&self, name: &str) -> Result<Value, ResolutionError> {
        match name {
            "country" => Ok(self.country.clone()),
            "number" => Ok(self.number.clone()),
            _ => Err(ResolutionError::undefined("Kiosk", name)),
        }
    }

    fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
        match name {
            "country" => self.country = value,
            "number" => self.number = value,
            _ => return Err(ResolutionError::undefined("Kiosk", name)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Kiosk", name))
    }

    fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Kiosk", name))
    }
}

static KIOSK_RULES: Lazy<RuleSet<Kiosk>> = Lazy::new(RuleSet::new);

impl Host for Kiosk {
    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    fn partials_mut(&mut self) -> &mut Partials {
        &mut self.partials
    }

    fn rules() -> &'static RuleSet<Self> {
        &KIOSK_RULES
    }
}

crate::declare_partition!(Kiosk, tel: Telephone, validation = false);

/// A partial whose own rules also report a record-level `base` error.
#[derive(Debug, Default)]
pub(crate) struct Badge {
    pub number: Value,
}

impl Partial for Badge {
    const NAME: &'static str = "Badge";
    const ATTRIBUTES: &'static [&'static str] = &["number"];

    fn read_local(&self, attribute: &str) -> Option<Value> {
        (attribute == "number").then(|| self.number.clone())
    }

    fn write_local(&mut self, attribute: &str, value: Value) -> bool {
        if attribute != "number" {
            return false;
        }
        self.number = value;
        true
    }

    fn validate(source: &dyn ReadAttribute, errors: &mut Errors) -> Result<(), Error> {
        if source.read_attribute("number")?.is_blank() {
            errors.add("base", "is incomplete");
            errors.add("number", "can't be blank");
        }
        Ok(())
    }
}

/// Prefixed host for `Badge`: `number` maps onto `p_number`.
#[derive(Debug, Default)]
pub(crate) struct Booth {
    pub p_number: Value,
    pub errors: Errors,
    pub partials: Partials,
}

impl Record for Booth {
    fn read(&self, name: &str) -> Result<Value, ResolutionError> {
        match name {
            "p_number" => Ok(self.p_number.clone()),
            _ => Err(ResolutionError::undefined("Booth", name)),
        }
    }

    fn write(&mut self, name: &str, value: Value) -> Result<(), ResolutionError> {
        match name {
            "p_number" => self.p_number = value,
            _ => return Err(ResolutionError::undefined("Booth", name)),
        }
        Ok(())
    }

    fn nested(&self, name: &str) -> Result<&dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Booth", name))
    }

    fn nested_mut(&mut self, name: &str) -> Result<&mut dyn Record, ResolutionError> {
        Err(ResolutionError::not_nested("Booth", name))
    }
}

static BOOTH_RULES: Lazy<RuleSet<Booth>> =
    Lazy::new(|| RuleSet::new().with(ValidationBridge::new("badge", BridgeOptions::new())));

impl Host for Booth {
    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    fn partials_mut(&mut self) -> &mut Partials {
        &mut self.partials
    }

    fn rules() -> &'static RuleSet<Self> {
        &BOOTH_RULES
    }
}

crate::declare_partition!(Booth, badge: Badge, prefix = "p");
