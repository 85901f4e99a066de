//! Ordered, keyed error collection.

use core::fmt;

/// Validation failures keyed by attribute, in the order they were added.
///
/// One key may carry several messages; insertion order is preserved across
/// keys so re-keyed errors keep the order the partial reported them in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Errors {
    entries: Vec<(String, String)>,
}

impl Errors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` under `key`.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.push((key.into(), message.into()));
    }

    /// Move every entry of `other` to the end, keeping its order.
    pub fn append(&mut self, mut other: Errors) {
        self.entries.append(&mut other.entries);
    }

    /// Iterate `(key, message)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(key, message)| (key.as_str(), message.as_str()))
    }

    /// Messages recorded under `key`, in order.
    pub fn get(&self, key: &str) -> Vec<&str> {
        self.iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, message)| message)
            .collect()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (key, _) in self.iter() {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `"key message"` strings, the usual human-facing rendering.
    pub fn full_messages(&self) -> Vec<String> {
        self.iter().map(|(key, message)| format!("{key} {message}")).collect()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join(", "))
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
