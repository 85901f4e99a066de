//! Attribute-to-path mappings.
//!
//! A [`Mapping`] is total over a partial's declared attributes: every
//! attribute either has an explicit entry or receives the default path.
//!
//! # Default Paths
//!
//! | Attribute | Prefix | Default path |
//! |-----------|--------|--------------|
//! | `number` | none | `number` |
//! | `number` | `tel` | `tel_number` |
//!
//! Explicit entries always win over defaults, and may be dotted
//! (`"telephone.number"`).

use indexmap::IndexMap;

use crate::error::ConfigurationError;
use crate::path::Path;

/// Total `attribute -> Path` table, ordered like the declared attributes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
    entries: IndexMap<&'static str, Path>,
}

impl Mapping {
    /// Build the full mapping for a partial.
    ///
    /// # Arguments
    ///
    /// * `partial` - Name of the partial type (diagnostics only)
    /// * `attributes` - The partial's declared attributes, in order
    /// * `explicit` - `attribute -> path` overrides
    /// * `prefix` - Optional prefix joined with `_` onto default paths
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::UndeclaredAttribute`] when an override names an
    ///   attribute the partial does not declare
    /// - [`ConfigurationError::InvalidPath`] for a malformed override path
    /// - [`ConfigurationError::InvalidPrefix`] when the prefix is empty or
    ///   would not form a plain accessor name. `Some("")` never yields
    ///   `_attr` keys; use `None` for unprefixed names.
    ///
    /// # Example
    ///
    /// ```
    /// use partitional::Mapping;
    ///
    /// let mapping = Mapping::build(
    ///     "Telephone",
    ///     &["country", "number"],
    ///     &[("number", "telephone.number")],
    ///     Some("tel"),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(mapping.resolve("country").unwrap().key(), "tel_country");
    /// assert_eq!(mapping.resolve("number").unwrap().key(), "telephone.number");
    /// ```
    pub fn build(
        partial: &'static str,
        attributes: &'static [&'static str],
        explicit: &[(&str, &str)],
        prefix: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        if let Some(prefix) = prefix {
            if prefix.is_empty() || prefix.contains('.') || prefix.contains(char::is_whitespace) {
                return Err(ConfigurationError::InvalidPrefix {
                    prefix: prefix.to_owned(),
                });
            }
        }

        for (attribute, _) in explicit {
            if !attributes.iter().any(|declared| declared == attribute) {
                return Err(ConfigurationError::UndeclaredAttribute {
                    partial,
                    attribute: (*attribute).to_owned(),
                });
            }
        }

        let mut entries = IndexMap::with_capacity(attributes.len());
        for &attribute in attributes {
            let path = match explicit.iter().find(|(name, _)| *name == attribute) {
                Some((_, raw)) => Path::parse(raw)?,
                None => Path::direct(&default_path(attribute, prefix))?,
            };
            entries.insert(attribute, path);
        }

        Ok(Self { entries })
    }

    /// The path an attribute resolves to.
    ///
    /// `None` only for attributes the partial does not declare; declared
    /// attributes always resolve.
    #[inline]
    pub fn resolve(&self, attribute: &str) -> Option<&Path> {
        self.entries.get(attribute)
    }

    /// Iterate `(attribute, path)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> + '_ {
        self.entries.iter().map(|(attribute, path)| (*attribute, path))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `(prefix + "_" if prefix else "") + attribute`
pub fn default_path(attribute: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}_{attribute}"),
        None => attribute.to_owned(),
    }
}

/// Compile-time membership test used by generated code.
///
/// The `Host` derive emits `const` assertions with this so a mapping override
/// naming an undeclared attribute fails to compile.
pub const fn declares(attributes: &[&str], name: &str) -> bool {
    let mut i = 0;
    while i < attributes.len() {
        if str_eq(attributes[i], name) {
            return true;
        }
        i += 1;
    }
    false
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const TELEPHONE: &[&str] = &["country", "number"];

    #[test]
    fn test_defaults_without_prefix() {
        let mapping = Mapping::build("Telephone", TELEPHONE, &[], None).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.resolve("country").unwrap().key(), "country");
        assert_eq!(mapping.resolve("number").unwrap().key(), "number");
    }

    #[test]
    fn test_defaults_with_prefix() {
        let mapping = Mapping::build("Telephone", TELEPHONE, &[], Some("tel")).unwrap();
        assert_eq!(mapping.resolve("number").unwrap().key(), "tel_number");
        assert_eq!(mapping.resolve("country").unwrap().key(), "tel_country");
    }

    #[test]
    fn test_explicit_entries_win() {
        let mapping = Mapping::build(
            "Telephone",
            TELEPHONE,
            &[("number", "telephone.number")],
            Some("tel"),
        )
        .unwrap();
        let number = mapping.resolve("number").unwrap();
        assert!(number.is_dotted());
        assert_eq!(number.key(), "telephone.number", "prefix does not apply to explicit paths");
        assert_eq!(mapping.resolve("country").unwrap().key(), "tel_country");
    }

    #[test]
    fn test_mapping_is_total_and_ordered() {
        let mapping = Mapping::build("Telephone", TELEPHONE, &[("number", "n")], None).unwrap();
        let attributes: Vec<_> = mapping.iter().map(|(attribute, _)| attribute).collect();
        assert_eq!(attributes, ["country", "number"]);
        assert!(mapping.resolve("extension").is_none());
    }

    #[test]
    fn test_undeclared_override_rejected() {
        let err = Mapping::build("Telephone", TELEPHONE, &[("extension", "ext")], None).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UndeclaredAttribute {
                partial: "Telephone",
                attribute: "extension".into(),
            }
        );
    }

    #[test]
    fn test_empty_prefix_is_not_unprefixed() {
        let err = Mapping::build("Telephone", TELEPHONE, &[], Some("")).unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidPrefix { prefix: String::new() });

        for prefix in ["tel.", " tel", "t el"] {
            assert!(
                matches!(
                    Mapping::build("Telephone", TELEPHONE, &[], Some(prefix)),
                    Err(ConfigurationError::InvalidPrefix { .. })
                ),
                "{prefix:?} accepted"
            );
        }
    }

    #[test]
    fn test_bad_prefix_and_path_rejected() {
        assert!(matches!(
            Mapping::build("Telephone", TELEPHONE, &[], Some("")),
            Err(ConfigurationError::InvalidPrefix { .. })
        ));
        assert!(matches!(
            Mapping::build("Telephone", TELEPHONE, &[("number", "a..b")], None),
            Err(ConfigurationError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_declares_const() {
        const FOUND: bool = declares(TELEPHONE, "number");
        const MISSING: bool = declares(TELEPHONE, "numbe");
        assert!(FOUND);
        assert!(!MISSING);
    }
}
