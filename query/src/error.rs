//! Error types for query parsing, validation, and compilation
//!
//! Validation problems are collected into a [`ValidationReport`] and returned
//! as a value so the caller can report every violation at once. Errors that
//! surface from the compiler itself ([`QueryError::UnsupportedOperator`],
//! [`QueryError::UnsupportedToken`], [`QueryError::MalformedRange`], ...)
//! indicate a condition that slipped past validation and are treated as
//! contract breaches, not user errors.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single validation violation with a stable machine-readable code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of validating a filter tree
///
/// Collects every violation found during the walk; nothing short-circuits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn push(&mut self, code: &'static str, message: impl Into<String>) {
        self.errors.push(ValidationIssue::new(code, message));
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.errors.len())?;
        for issue in &self.errors {
            write!(f, "; {}: {}", issue.code, issue.message)?;
        }
        Ok(())
    }
}

/// Errors from request parsing, validation, or predicate compilation
#[derive(Error, Debug)]
pub enum QueryError {
    /// Request body failed structural checks before reaching the validator
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },

    /// Filter tree failed validation; every violation is listed
    #[error("filter validation failed: {0}")]
    Validation(ValidationReport),

    /// Operator string outside the supported set
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Relative date token outside the supported set
    #[error("unsupported relative date token: {0}")]
    UnsupportedToken(String),

    /// Range operator without exactly two values
    #[error("range operator requires exactly two values, got {0}")]
    MalformedRange(usize),

    /// Value-taking operator compiled without a value
    #[error("operator `{0}` requires a value")]
    MissingValue(&'static str),

    /// Date operator value that does not parse as a date
    #[error("invalid date value: {0}")]
    InvalidDate(String),
}

impl QueryError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    /// Machine-readable code for the error, mirroring validation issue codes
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } => code,
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::UnsupportedOperator(_) => "UNSUPPORTED_OPERATOR",
            Self::UnsupportedToken(_) => "UNKNOWN_DATE_TOKEN",
            Self::MalformedRange(_) => "INVALID_RANGE",
            Self::MissingValue(_) => "VALUE_REQUIRED",
            Self::InvalidDate(_) => "INVALID_DATE",
        }
    }
}
