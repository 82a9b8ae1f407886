//! Depthcheck Checker - Exhaustive property evaluation up to a depth
//!
//! This crate evaluates trees of quantified properties against every value a
//! registry generates up to a depth, smallest first, and reports the first
//! counterexample or witness in a deterministic order.
//!
//! # Example
//!
//! ```rust,ignore
//! use depthcheck_checker::{check, forall};
//! use depthcheck_generator::Registry;
//!
//! let registry = Registry::new();
//! let prop = forall(Tag::int(), |_, x| Ok(x.as_int() != Some(3)));
//! let outcome = check(&registry, &prop, 3);
//! assert!(outcome.is_failure());
//! ```
//!
//! # Core Concepts
//!
//! - [`Property`]: `FORALL`, `EXISTS`, `AND`, `OR`, `EMPTY` and `UNIT` clauses
//! - [`run`]: Lazy evaluation yielding one [`Signal::Step`] per predicate call
//! - [`Outcome`]: Success or failure kind, bindings, assertion log, nesting
//! - [`PropertySet`]: Named properties run together under a [`CheckConfig`]

pub mod config;
pub mod engine;
pub mod outcome;
pub mod property;
pub mod suite;

pub use config::{CheckConfig, ConfigError, MAX_DEPTH};
pub use engine::{check, run, Run, Signal};
pub use outcome::{Binding, Outcome, OutcomeKind, RunStats};
pub use property::{
    and, empty, exists, exists_invalid, exists_of, forall, forall_of, forall_valid, or, unit,
    Clause, PredicateFn, Property, Verdict,
};
pub use suite::{PropertyResult, PropertySet, SuiteReport};

// Re-export core types for convenience
pub use depthcheck_core::{Assertions, CaseError, CaseResult, Tag, Value};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::CheckConfig;
    pub use crate::engine::{check, run, Signal};
    pub use crate::outcome::{Outcome, OutcomeKind};
    pub use crate::property::{
        and, empty, exists, exists_invalid, exists_of, forall, forall_of, forall_valid, or, unit,
        Property,
    };
    pub use crate::suite::PropertySet;
    pub use depthcheck_core::{Assertions, CaseError, CaseResult, Tag, Value};
}
