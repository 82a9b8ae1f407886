//! Error types shared by predicates, model hooks and the engine.

use thiserror::Error;

/// Result of evaluating one test case.
pub type CaseResult<T> = Result<T, CaseError>;

/// A failed assertion, carrying the message that explains the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionFailure {
    /// Human readable failure message.
    pub message: String,
}

impl AssertionFailure {
    /// Create a new assertion failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why a single case did not produce a verdict.
///
/// Assertion failures are expected and become counterexamples. Anything else
/// is unrelated to the property and ends the enclosing clause.
#[derive(Debug, Error)]
pub enum CaseError {
    /// An assertion inside the predicate or hook failed.
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),

    /// Any other error raised by user code.
    #[error("unrelated error: {0}")]
    Unrelated(#[from] anyhow::Error),
}

impl CaseError {
    /// Create an assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(AssertionFailure::new(message))
    }

    /// Create an unrelated error from a message.
    pub fn unrelated(message: impl std::fmt::Display) -> Self {
        Self::Unrelated(anyhow::anyhow!("{}", message))
    }

    /// Returns true for assertion failures.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}
