//! Command declarations.
//!
//! A [`Command`] is one typed operation of a model: its parameter tags, its
//! return tag, the function that performs it, and the optional hooks the
//! stateful validator consults around each call. Commands are immutable
//! once declared.

use std::fmt;
use std::sync::Arc;

use depthcheck_core::{Assertions, CaseResult, Tag, Value};

/// Shared handle to a declared command.
pub type CommandRef<S> = Arc<Command<S>>;

type PreconditionFn<S> = dyn Fn(&S, &[Value], &mut Assertions) -> CaseResult<bool> + Send + Sync;
type ExecuteFn = dyn Fn(&[Value]) -> CaseResult<Value> + Send + Sync;
type PostconditionFn<S> =
    dyn Fn(&S, &[Value], &Value, &mut Assertions) -> CaseResult<bool> + Send + Sync;
type NextStateFn<S> = dyn Fn(&S, &[Value], &Value) -> S + Send + Sync;

/// A typed operation together with its model hooks.
///
/// Without explicit hooks the precondition and postcondition always hold
/// and the model state is left unchanged.
pub struct Command<S> {
    name: String,
    params: Vec<Tag>,
    returns: Tag,
    execute: Arc<ExecuteFn>,
    precondition: Option<Arc<PreconditionFn<S>>>,
    postcondition: Option<Arc<PostconditionFn<S>>>,
    next_state: Option<Arc<NextStateFn<S>>>,
}

impl<S> Command<S> {
    /// Declare a command.
    ///
    /// Parameters whose tag has no strategy are filled with the results of
    /// earlier commands returning that tag.
    pub fn declare<F>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = Tag>,
        returns: Tag,
        execute: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> CaseResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            returns,
            execute: Arc::new(execute),
            precondition: None,
            postcondition: None,
            next_state: None,
        }
    }

    pub fn with_precondition<F>(mut self, f: F) -> Self
    where
        F: Fn(&S, &[Value], &mut Assertions) -> CaseResult<bool> + Send + Sync + 'static,
    {
        self.precondition = Some(Arc::new(f));
        self
    }

    pub fn with_postcondition<F>(mut self, f: F) -> Self
    where
        F: Fn(&S, &[Value], &Value, &mut Assertions) -> CaseResult<bool> + Send + Sync + 'static,
    {
        self.postcondition = Some(Arc::new(f));
        self
    }

    pub fn with_next_state<F>(mut self, f: F) -> Self
    where
        F: Fn(&S, &[Value], &Value) -> S + Send + Sync + 'static,
    {
        self.next_state = Some(Arc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Tag] {
        &self.params
    }

    pub fn returns(&self) -> &Tag {
        &self.returns
    }

    pub fn check_precondition(
        &self,
        state: &S,
        args: &[Value],
        log: &mut Assertions,
    ) -> CaseResult<bool> {
        match &self.precondition {
            Some(f) => f(state, args, log),
            None => Ok(true),
        }
    }

    pub fn execute(&self, args: &[Value]) -> CaseResult<Value> {
        (self.execute)(args)
    }

    pub fn check_postcondition(
        &self,
        state: &S,
        args: &[Value],
        result: &Value,
        log: &mut Assertions,
    ) -> CaseResult<bool> {
        match &self.postcondition {
            Some(f) => f(state, args, result, log),
            None => Ok(true),
        }
    }
}

impl<S: Clone> Command<S> {
    pub fn next_state(&self, state: &S, args: &[Value], result: &Value) -> S {
        match &self.next_state {
            Some(f) => f(state, args, result),
            None => state.clone(),
        }
    }
}

impl<S> fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("has_precondition", &self.precondition.is_some())
            .field("has_postcondition", &self.postcondition.is_some())
            .field("has_next_state", &self.next_state.is_some())
            .finish()
    }
}
