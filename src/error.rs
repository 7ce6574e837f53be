//! Error types
//!
//! Only `EventError` changes control flow during a run: it aborts the current
//! event and nothing else. `ConfigError` can only happen before the first
//! event.

use thiserror::Error;

use crate::record::ObjectKind;

/// Reasons for abandoning a single event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Nothing stored under the requested key
    #[error("no container stored under key `{0}`")]
    MissingContainer(String),

    /// Something is stored under the key, but not what the caller asked for
    #[error("container `{key}` holds {found}, expected {expected}")]
    WrongContainerType { key: String, expected: &'static str, found: &'static str },

    /// An association link refers to detector activity which is not in the map
    #[error("{kind} #{index} is linked to contribution {contribution}, but the map holds only {available}")]
    BrokenAssociation { kind: ObjectKind, index: usize, contribution: usize, available: usize },
}

/// Problems reading the analysis configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't read config file `{path}`: {source}")]
    Io { path: std::path::PathBuf, source: std::io::Error },

    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

pub type EventResult<T> = std::result::Result<T, EventError>;
