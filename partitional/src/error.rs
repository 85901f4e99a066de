//! Error types.
//!
//! Two families, matching when they can happen:
//!
//! | Type | When | Recoverable |
//! |------|------|-------------|
//! | [`ConfigurationError`] | Definition time (declarations, rule options) | No, a programming mistake |
//! | [`ResolutionError`] | Access time (`get`/`set` through a path) | Surfaced to the caller |
//!
//! Validation failures are never errors; they are collected into
//! [`Errors`](crate::Errors) as data.

use thiserror::Error;

/// A declaration or rule option that can never work.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Unknown option keys, or known keys given a value of the wrong kind.
    #[error("{} is invalid options", options.join(", "))]
    InvalidOptions { options: Vec<String> },

    #[error("`{attribute}` is not an attribute of {partial}")]
    UndeclaredAttribute {
        partial: &'static str,
        attribute: String,
    },

    #[error("invalid accessor path `{path}`")]
    InvalidPath { path: String },

    #[error("invalid mapping prefix `{prefix}`")]
    InvalidPrefix { prefix: String },

    #[error("invalid format pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{host} declares no partial named `{name}`")]
    UnknownPartial { host: &'static str, name: String },

    #[error("partial `{name}` on {host} targets {expected}, not {requested}")]
    TargetMismatch {
        host: &'static str,
        name: &'static str,
        expected: &'static str,
        requested: &'static str,
    },

    #[error("partial `{name}` is declared twice on {host}")]
    DuplicatePartial { host: &'static str, name: &'static str },
}

/// An accessor along a path does not exist on the object encountered.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("undefined accessor `{accessor}` on {record}")]
    Undefined {
        record: &'static str,
        accessor: String,
    },

    #[error("`{accessor}` on {record} is not a nested record")]
    NotNested {
        record: &'static str,
        accessor: String,
    },

    #[error("`{accessor}` on {record} is read-only")]
    ReadOnly {
        record: &'static str,
        accessor: String,
    },

    #[error("{partial} does not declare attribute `{attribute}`")]
    Undeclared {
        partial: &'static str,
        attribute: String,
    },
}

impl ResolutionError {
    #[inline]
    pub fn undefined(record: &'static str, accessor: &str) -> Self {
        ResolutionError::Undefined {
            record,
            accessor: accessor.to_owned(),
        }
    }

    #[inline]
    pub fn not_nested(record: &'static str, accessor: &str) -> Self {
        ResolutionError::NotNested {
            record,
            accessor: accessor.to_owned(),
        }
    }

    #[inline]
    pub fn read_only(record: &'static str, accessor: &str) -> Self {
        ResolutionError::ReadOnly {
            record,
            accessor: accessor.to_owned(),
        }
    }

    #[inline]
    pub fn undeclared(partial: &'static str, attribute: &str) -> Self {
        ResolutionError::Undeclared {
            partial,
            attribute: attribute.to_owned(),
        }
    }
}

/// Any error a partitional operation can return.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
