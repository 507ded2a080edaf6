// src/error.rs
//
// Error types. Conversion itself never fails; these cover reading the input, writing
// the output, and loading rules or config.

use std::path::PathBuf;

use thiserror::Error;

/// The input could not be obtained; the converter is not called.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),
}

/// The converted text could not be delivered.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write standard output: {0}")]
    Stdout(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("rule has an empty tag name")]
    EmptyTag,

    #[error("tag name {0:?} may only contain letters, digits, '-', '_' and ':'")]
    InvalidTag(String),

    #[error("rule for <{tag}> has an empty target")]
    EmptyTarget { tag: String },

    #[error("rule for <{tag}> has target {target:?}; '[', ']' and '=' are not allowed")]
    InvalidTarget { tag: String, target: String },

    #[error("rule for <{tag}> is of kind {kind} and needs a `{field}` value")]
    MissingField {
        tag: String,
        kind: &'static str,
        field: &'static str,
    },

    #[error("rule for <{tag}> is of kind {kind} and takes no `{field}` value")]
    UnexpectedField {
        tag: String,
        kind: &'static str,
        field: &'static str,
    },

    #[error("tag <{0}> has more than one rule")]
    Duplicate(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", config_path.display())]
    NotFound { config_path: PathBuf },

    #[error("Failed to read config file at {}: {source}", config_path.display())]
    Read {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {}: {source}", config_path.display())]
    Parse {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid rule in config file at {}: {source}", config_path.display())]
    Rule {
        config_path: PathBuf,
        source: RuleError,
    },
}
