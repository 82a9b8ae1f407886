//! Type registry mapping tags to strategies.
//!
//! Exact registrations win. A parametric tag `F<A, ..>` without one is
//! derived from the bare constructor `F` when every argument resolves too,
//! and the derived strategy is memoized under the full tag.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use depthcheck_core::tag::names;
use depthcheck_core::{Tag, Value};
use tracing::debug;

use crate::builtins;
use crate::combinators::{ImpliesStrategy, MapStrategy};
use crate::context::GenContext;
use crate::traits::{GeneratorError, GeneratorResult, Strategy, StrategyRef, Values};

/// Strategy synthesized for `F<A, ..>` from the provider of `F`.
struct Derived {
    name: String,
    origin: StrategyRef,
    args: Vec<Tag>,
}

impl Strategy for Derived {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let mut injected = self.args.clone();
        injected.extend_from_slice(args);
        self.origin.generate(cx, depth, &injected)
    }
}

/// Tag to strategy mapping shared by every run.
///
/// Registration requires `&mut self` and happens before generation; during
/// a run the registry is only read. Derived strategies are cached behind a
/// lock so lookups stay `&self`.
pub struct Registry {
    strategies: HashMap<Tag, StrategyRef>,
    derived: RwLock<HashMap<Tag, StrategyRef>>,
}

impl Registry {
    /// A registry preloaded with the built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtins::register_defaults(&mut registry);
        registry
    }

    /// A registry with no strategies at all.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            derived: RwLock::new(HashMap::new()),
        }
    }

    /// Bind `tag` to `strategy`, returning the strategy it replaces.
    pub fn register<S: Strategy + 'static>(&mut self, tag: Tag, strategy: S) -> Option<StrategyRef> {
        self.register_shared(tag, Arc::new(strategy))
    }

    /// Bind `tag` to an already shared strategy.
    pub fn register_shared(&mut self, tag: Tag, strategy: StrategyRef) -> Option<StrategyRef> {
        debug!(tag = %tag, strategy = strategy.name(), "Registering strategy");
        // Derivations may depend on the binding being replaced.
        self.derived
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.strategies.insert(tag, strategy)
    }

    /// Resolve the strategy for a tag, deriving it if necessary.
    pub fn lookup(&self, tag: &Tag) -> Option<StrategyRef> {
        if let Some(strategy) = self.strategies.get(tag) {
            return Some(Arc::clone(strategy));
        }
        if !tag.is_parametric() {
            return None;
        }

        let cached = self
            .derived
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(tag)
            .cloned();
        if cached.is_some() {
            return cached;
        }

        let origin = self.strategies.get(&tag.constructor())?;
        if !tag.args().iter().all(|arg| self.lookup(arg).is_some()) {
            return None;
        }

        debug!(tag = %tag, origin = origin.name(), "Derived strategy from constructor");
        let derived: StrategyRef = Arc::new(Derived {
            name: tag.to_string(),
            origin: Arc::clone(origin),
            args: tag.args().to_vec(),
        });
        let mut cache = self.derived.write().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(cache.entry(tag.clone()).or_insert(derived)))
    }

    /// Resolve `tag`, reporting why it has no strategy.
    ///
    /// Built-in element containers (`List`, `Set`, `Permutations`) must be
    /// applied to exactly one argument, at any nesting level.
    pub fn resolve(&self, tag: &Tag) -> GeneratorResult<StrategyRef> {
        check_shape(tag)?;
        self.lookup(tag)
            .ok_or_else(|| GeneratorError::MissingStrategy(tag.clone()))
    }

    /// Returns true if `tag` resolves to a strategy.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.lookup(tag).is_some()
    }

    /// Tags with an exact registration, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.strategies.keys()
    }

    /// Collect every value of `tag` at `depth`.
    pub fn generate(&self, tag: &Tag, depth: usize) -> Vec<Value> {
        GenContext::new(self).values(tag, depth).collect()
    }

    /// Register `name->source`, the values of `source` satisfying `predicate`.
    ///
    /// Returns the new tag.
    pub fn implies<F>(&mut self, name: &str, source: Tag, predicate: F) -> Tag
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let tag = Tag::new(format!("{}->{}", name, source));
        self.register(tag.clone(), ImpliesStrategy::new(name, source, predicate));
        tag
    }

    /// Register `name`, whose values are `f` flat-mapped over `source`.
    ///
    /// Returns the new tag.
    pub fn map<F>(&mut self, name: &str, source: Tag, f: F) -> Tag
    where
        F: Fn(usize, &Value) -> Vec<Value> + Send + Sync + 'static,
    {
        let tag = Tag::new(name);
        self.register(tag.clone(), MapStrategy::new(name, source, f));
        tag
    }
}

fn check_shape(tag: &Tag) -> GeneratorResult<()> {
    let unary = matches!(tag.name(), names::LIST | names::SET | names::PERMUTATIONS);
    if unary && tag.args().len() != 1 {
        return Err(GeneratorError::invalid_tag(
            tag.clone(),
            format!("expected 1 argument, found {}", tag.args().len()),
        ));
    }
    tag.args().iter().try_for_each(check_shape)
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<String> = self.strategies.keys().map(ToString::to_string).collect();
        tags.sort();
        f.debug_struct("Registry").field("tags", &tags).finish()
    }
}
