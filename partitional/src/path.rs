//! Pre-parsed accessor paths.
//!
//! A mapping entry such as `"telephone.number"` is split once, when the
//! definition is built, into an ordered list of accessor names. Access time
//! only walks the segments; strings are never re-split on `get`/`set`.

use core::fmt;

use crate::error::ConfigurationError;

/// An accessor path on a host record.
///
/// All segments but the last are traversed as nested-record getters; the last
/// segment is the final getter/setter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    key: String,
    segments: Box<[String]>,
}

impl Path {
    /// Parse a path from its dotted form.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidPath`] for an empty path or an empty
    /// segment (`"a..b"`, `".a"`, `"a."`).
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let segments: Vec<String> = raw.split('.').map(str::to_owned).collect();
        if segments.iter().any(|s| s.trim().is_empty() || s.trim() != s.as_str()) {
            return Err(ConfigurationError::InvalidPath {
                path: raw.to_owned(),
            });
        }
        Ok(Self {
            key: raw.to_owned(),
            segments: segments.into_boxed_slice(),
        })
    }

    /// A single-segment path.
    pub fn direct(name: &str) -> Result<Self, ConfigurationError> {
        if name.contains('.') {
            return Err(ConfigurationError::InvalidPath {
                path: name.to_owned(),
            });
        }
        Self::parse(name)
    }

    /// True iff the path has more than one segment.
    #[inline]
    pub fn is_dotted(&self) -> bool {
        self.segments.len() > 1
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The host-facing error key.
    ///
    /// The accessor name for a direct path, the dotted string verbatim
    /// otherwise.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Split into the intermediate getters and the final accessor.
    #[inline]
    pub(crate) fn split_last(&self) -> (&str, &[String]) {
        match self.segments.split_last() {
            Some((last, parents)) => (last.as_str(), parents),
            // parse() never produces an empty path
            None => (self.key.as_str(), &[]),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
