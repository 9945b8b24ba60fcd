//! Error values raised by surface construction, queries and validation.
//!
//! Public functions return `anyhow::Result`; the error inside is always a
//! [`SurfaceError`] so callers can `downcast_ref` to tell a rejected query
//! apart from a failed validation check.

use thiserror::Error;

use crate::validation::ValidationCheck;

/// Errors produced by the volatility surface.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum SurfaceError {
    /// Query arguments are missing, contradictory or out of range.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The variance table cannot bracket the requested instant.
    #[error("insufficient term structure: {message}")]
    InsufficientTermStructure { message: String },

    /// A validation check rejected the surface.
    #[error("{check} check failed: {message}")]
    Validation {
        check: ValidationCheck,
        message: String,
    },

    /// Root finding or another numerical step did not produce a usable value.
    #[error("numerical error: {message}")]
    Numerical { message: String },
}

impl SurfaceError {
    pub(crate) fn input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn term_structure(message: impl Into<String>) -> Self {
        Self::InsufficientTermStructure {
            message: message.into(),
        }
    }

    pub(crate) fn validation(check: ValidationCheck, message: impl Into<String>) -> Self {
        Self::Validation {
            check,
            message: message.into(),
        }
    }

    pub(crate) fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// Which validation check produced this error, if any.
    pub fn check(&self) -> Option<ValidationCheck> {
        match self {
            Self::Validation { check, .. } => Some(*check),
            _ => None,
        }
    }
}
