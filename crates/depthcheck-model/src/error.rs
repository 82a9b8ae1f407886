//! Error types for malformed command sequences

use depthcheck_core::Tag;
use thiserror::Error;

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Structural problems in a command sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A step refers to a binding no earlier step defines
    #[error("step {step} refers to unknown binding '{name}'")]
    DanglingReference { step: usize, name: String },

    /// A step refers to itself or to a later step
    #[error("step {step} refers to step {target}, which does not precede it")]
    ForwardReference { step: usize, target: usize },

    /// A referenced result does not have the slot's tag
    #[error("step {step} expects {expected} but its reference returns {found}")]
    TagMismatch { step: usize, expected: Tag, found: Tag },

    /// A step still holds a reference the naming pass did not rewrite
    #[error("step {step} holds an unnamed reference to step {target}")]
    UnnamedReference { step: usize, target: usize },

    /// Argument count differs from the command's parameter count
    #[error("step {step} passes {found} arguments to {command}, which takes {expected}")]
    Arity {
        step: usize,
        command: String,
        expected: usize,
        found: usize,
    },
}
