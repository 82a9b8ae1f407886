//! Depthcheck Core - Shared types for depth-bounded exhaustive testing
//!
//! This crate defines the vocabulary every other depthcheck crate speaks:
//! the type tags strategies are registered under, the dynamic values they
//! produce, and the assertion log that predicates and model hooks write to.
//!
//! # Core Concepts
//!
//! - [`Tag`]: Hashable identifier of a generated shape, e.g. `List<Int>`
//! - [`Value`]: A generated value, including the [`Value::Missing`] sentinel
//! - [`Object`]: Shared handle to a system-under-test object or command sequence
//! - [`Assertions`]: Per-case assertion log with checking helpers
//! - [`CaseError`]: Why a single test case did not produce a verdict

pub mod assertions;
pub mod error;
pub mod tag;
pub mod value;

pub use assertions::Assertions;
pub use error::{AssertionFailure, CaseError, CaseResult};
pub use tag::Tag;
pub use value::{FromValue, HasTag, Object, Value};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assertions::Assertions;
    pub use crate::error::{AssertionFailure, CaseError, CaseResult};
    pub use crate::tag::Tag;
    pub use crate::value::{FromValue, HasTag, Object, Value};
}
