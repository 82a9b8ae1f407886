//! Generation context passed through every strategy call

use std::cell::Cell;
use std::fmt;
use std::iter;
use std::rc::Rc;

use depthcheck_core::{Tag, Value};
use tracing::trace;

use crate::registry::Registry;
use crate::traits::{GeneratorResult, StrategyRef, Values};

/// Counters collected while generating values for one run.
#[derive(Debug, Default)]
pub struct GenStats {
    failed_implications: Cell<u64>,
    missing_slots: Cell<u64>,
}

impl GenStats {
    /// Record a value rejected by an implication filter.
    pub fn record_failed_implication(&self) {
        self.failed_implications.set(self.failed_implications.get() + 1);
    }

    /// Values rejected by implication filters so far.
    pub fn failed_implications(&self) -> u64 {
        self.failed_implications.get()
    }

    /// Slots filled with [`Value::Missing`] so far.
    pub fn missing_slots(&self) -> u64 {
        self.missing_slots.get()
    }
}

/// Registry access and per-run statistics for one generation request.
///
/// Cloning is cheap; clones share the same statistics.
#[derive(Clone)]
pub struct GenContext<'a> {
    registry: &'a Registry,
    stats: Rc<GenStats>,
}

impl<'a> GenContext<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            stats: Rc::new(GenStats::default()),
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn stats(&self) -> &GenStats {
        &self.stats
    }

    /// Resolve the strategy for a tag.
    pub fn strategy(&self, tag: &Tag) -> Option<StrategyRef> {
        self.registry.lookup(tag)
    }

    /// Resolve the strategy for a tag, or the reason there is none.
    pub fn resolve(&self, tag: &Tag) -> GeneratorResult<StrategyRef> {
        self.registry.resolve(tag)
    }

    /// Lazily generate the values of `tag` at `depth`.
    ///
    /// A tag with no strategy yields exactly one [`Value::Missing`].
    pub fn values(&self, tag: &Tag, depth: usize) -> Values<'a> {
        match self.registry.lookup(tag) {
            Some(strategy) => strategy.generate(self, depth, &[]),
            None => {
                trace!(tag = %tag, depth, "No strategy, substituting missing value");
                let stats = Rc::clone(&self.stats);
                Box::new(iter::once_with(move || {
                    stats.missing_slots.set(stats.missing_slots.get() + 1);
                    Value::Missing
                }))
            }
        }
    }
}

impl fmt::Debug for GenContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenContext")
            .field("registry", &self.registry)
            .field("stats", &self.stats)
            .finish()
    }
}
