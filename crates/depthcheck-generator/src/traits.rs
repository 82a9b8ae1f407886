//! Core Strategy trait and associated types

use std::sync::Arc;

use depthcheck_core::{Tag, Value};

use crate::context::GenContext;

/// Lazily produced values of one generation request.
pub type Values<'a> = Box<dyn Iterator<Item = Value> + 'a>;

/// Shared handle to a registered strategy.
pub type StrategyRef = Arc<dyn Strategy>;

/// Result type for generator operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors reported by the generation layer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// No strategy is registered or derivable for the tag
    #[error("no strategy registered for {0}")]
    MissingStrategy(Tag),

    /// The tag has the wrong shape for the strategy it resolved to
    #[error("invalid tag {tag}: {reason}")]
    InvalidTag { tag: Tag, reason: String },
}

impl GeneratorError {
    pub fn invalid_tag(tag: Tag, reason: impl Into<String>) -> Self {
        Self::InvalidTag {
            tag,
            reason: reason.into(),
        }
    }
}

/// A depth-parameterized producer of values for one tag.
///
/// # Contract
///
/// * **Monotonic**: the values at `depth + 1` contain the values at `depth`.
/// * **Deterministic**: the same depth and arguments always produce the
///   same sequence.
/// * **Finite**: every depth produces finitely many values.
///
/// A strategy is registered once and asked for a fresh iterator on every
/// request; any traversal state lives in the returned iterator. Parametric
/// strategies receive the argument tags of the requested tag in `args`.
pub trait Strategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Produce the values at `depth`.
    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a>;
}
