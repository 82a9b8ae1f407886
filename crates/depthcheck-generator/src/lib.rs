//! Depthcheck Generator - Depth-bounded value strategies
//!
//! This crate maps type tags to strategies that enumerate every value of a
//! shape up to a size bound ("depth"), smallest first, and combines several
//! strategies into argument tuples fairly.
//!
//! # Core Concepts
//!
//! - [`Strategy`]: Restartable, monotonic, depth-parameterized value producer
//! - [`Registry`]: Tag to strategy mapping with derivation for parametric tags
//! - [`GenContext`]: Registry access plus per-run statistics
//! - [`FairProduct`]: Complete, non-starving enumeration of argument tuples
//!
//! # Built-in Strategies
//!
//! `Int`, `Nat`, `Word2`/`Word4`/`Word8`, `Str`, `Bool`, `Unit`, and the
//! containers `List<T>`, `Set<T>`, `Tuple<..>`, `Union<..>`. See
//! [`builtins`] for the exact value order.
//!
//! # Combinators
//!
//! - [`MapStrategy`]: Flat-map a function over another tag's values
//! - [`ImpliesStrategy`]: Keep only values satisfying a predicate
//! - [`Interleave`]: Round-robin over value streams

pub mod builtins;
mod combinators;
mod context;
mod names;
mod product;
mod registry;
mod traits;

pub use depthcheck_core::{Tag, Value};

pub use combinators::{deferred, ImpliesStrategy, Interleave, MapStrategy};
pub use context::{GenContext, GenStats};
pub use names::{alpha_label, NameSupply};
pub use product::FairProduct;
pub use registry::Registry;
pub use traits::{GeneratorError, GeneratorResult, Strategy, StrategyRef, Values};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::combinators::{deferred, ImpliesStrategy, Interleave, MapStrategy};
    pub use crate::context::{GenContext, GenStats};
    pub use crate::names::{alpha_label, NameSupply};
    pub use crate::product::FairProduct;
    pub use crate::registry::Registry;
    pub use crate::traits::{GeneratorError, GeneratorResult, Strategy, StrategyRef, Values};
    pub use depthcheck_core::{Tag, Value};
}
