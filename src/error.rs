//! Error types for declaration, marshaling and foreign dispatch.

use crate::interop::InterchangeType;
use thiserror::Error;

/// Everything that can go wrong between a host value and a foreign result.
///
/// None of these are transient: each one is a programming or configuration
/// defect and is surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("unknown foreign function '{name}'")]
    UnknownFunction { name: String },

    #[error("foreign function '{name}' is already declared")]
    DuplicateDeclaration { name: String },

    #[error("value {value} cannot be represented exactly as {target}")]
    RangeOverflow { value: String, target: &'static str },

    #[error("foreign function '{function}' failed with status {code}")]
    ForeignCallFailure { function: String, code: i32 },

    #[error("'{function}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of '{function}': expected {expected}, found {found}")]
    ArgumentType {
        function: String,
        index: usize,
        expected: InterchangeType,
        found: String,
    },

    #[error("result of '{function}': cannot convert {found} to {expected}")]
    ResultType {
        function: String,
        expected: &'static str,
        found: InterchangeType,
    },

    #[error("unsupported signature for '{name}': {reason}")]
    UnsupportedSignature { name: String, reason: String },

    #[error("no linked entry point for declared function '{name}'")]
    UnresolvedSymbol { name: String },

    #[error("declaration '{declared}' does not match linked prototype '{linked}'")]
    PrototypeMismatch {
        name: String,
        declared: String,
        linked: String,
    },

    #[error("invalid {target} literal '{text}'")]
    InvalidLiteral { text: String, target: InterchangeType },
}

impl BridgeError {
    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    pub fn range_overflow(value: impl ToString, target: &'static str) -> Self {
        Self::RangeOverflow {
            value: value.to_string(),
            target,
        }
    }

    /// Short machine-friendly tag, used as the `kind` field in log events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownFunction { .. } => "unknown_function",
            Self::DuplicateDeclaration { .. } => "duplicate_declaration",
            Self::RangeOverflow { .. } => "range_overflow",
            Self::ForeignCallFailure { .. } => "foreign_call_failure",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::ArgumentType { .. } => "argument_type",
            Self::ResultType { .. } => "result_type",
            Self::UnsupportedSignature { .. } => "unsupported_signature",
            Self::UnresolvedSymbol { .. } => "unresolved_symbol",
            Self::PrototypeMismatch { .. } => "prototype_mismatch",
            Self::InvalidLiteral { .. } => "invalid_literal",
        }
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
