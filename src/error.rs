//! Error types for magic_tree.

use std::fmt;

use thiserror::Error;

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    /// Reading the rule stream failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rules were loaded in validate mode and at least one was rejected
    #[error("{name}: {} invalid rule(s), first: {}", warnings.len(), first_warning(warnings))]
    InvalidRules { name: String, warnings: Vec<Warning> },
}

fn first_warning(warnings: &[Warning]) -> String {
    warnings.first().map(|w| w.to_string()).unwrap_or_default()
}

/// Result type alias for magic_tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single rule line was rejected while loading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing offset")]
    MissingOffset,

    #[error("invalid offset: {0}")]
    InvalidOffset(String),

    #[error("negative absolute offset: {0}")]
    NegativeOffset(String),

    #[error("missing closing bracket: {0}")]
    MissingBracket(String),

    #[error("unknown offset type: {0}")]
    UnknownIndirectType(char),

    #[error("unknown offset operator: {0}")]
    UnknownIndirectOperator(char),

    #[error("missing type")]
    MissingType,

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("unknown flag '{flag}' for type {name}")]
    UnknownTypeFlag { name: String, flag: char },

    #[error("can't parse operand: {0}")]
    InvalidOperand(String),

    #[error("operator not supported for type {0}")]
    OperatorNotSupported(String),

    #[error("missing test value")]
    MissingValue,

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("trailing backslash in value")]
    TrailingBackslash,

    #[error("multiple formats: {0}")]
    MultipleFormats(String),

    #[error("invalid format for {name}: {format}")]
    InvalidFormat { name: String, format: String },

    #[error("invalid regex: {0}")]
    InvalidRegex(String),

    #[error("level skipped ({from}->{to})")]
    LevelSkipped { from: u32, to: u32 },

    #[error("continuation without parent")]
    Orphan,

    #[error("invalid MIME type: {0}")]
    InvalidMime(String),

    #[error("invalid strength: {0}")]
    InvalidStrength(String),

    #[error("{0} without a preceding rule")]
    DirectiveWithoutRule(&'static str),
}

/// A [`ParseError`] tied to the rule source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub name: String,
    pub line: u32,
    pub error: ParseError,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}: {}", self.name, self.line, self.error)
    }
}

impl std::error::Error for Warning {}

/// Why a rule could not be tested against a buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestError {
    /// The buffer is too short for the read; never reported
    #[error("read out of bounds")]
    OutOfBounds,

    #[error("not implemented")]
    NotImplemented,

    #[error("failed: {0}")]
    Malformed(&'static str),
}
