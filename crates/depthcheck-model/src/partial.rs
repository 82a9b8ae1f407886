//! Bound command calls.

use std::fmt;
use std::sync::Arc;

use depthcheck_core::Value;

use crate::command::CommandRef;

/// One argument of a bound call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A generated value.
    Literal(Value),
    /// The result of the earlier step at this index. Only present before
    /// binding names are assigned.
    Ref(usize),
    /// The result bound to this name by an earlier step.
    Name(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Literal(value) => write!(f, "{}", value),
            Arg::Ref(index) => write!(f, "#{}", index),
            Arg::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A command applied to bound arguments.
///
/// A partial that a later step refers to carries a binding name; it is then
/// a named partial and its result is stored under that name during replay.
pub struct Partial<S> {
    command: CommandRef<S>,
    args: Vec<Arg>,
    binding: Option<String>,
}

impl<S> Partial<S> {
    pub fn new(command: CommandRef<S>, args: Vec<Arg>) -> Self {
        Self {
            command,
            args,
            binding: None,
        }
    }

    pub fn command(&self) -> &CommandRef<S> {
        &self.command
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Binding name, if a later step refers to this one.
    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.binding.is_some()
    }

    pub(crate) fn set_binding(&mut self, name: String) {
        self.binding = Some(name);
    }

    pub(crate) fn args_mut(&mut self) -> &mut [Arg] {
        &mut self.args
    }

    /// The call without its binding, e.g. `put(a, 0)`.
    pub fn call(&self) -> String {
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        format!("{}({})", self.command.name(), args.join(", "))
    }
}

impl<S> Clone for Partial<S> {
    fn clone(&self) -> Self {
        Self {
            command: Arc::clone(&self.command),
            args: self.args.clone(),
            binding: self.binding.clone(),
        }
    }
}

impl<S> fmt::Display for Partial<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            Some(name) => write!(f, "{} = {}", name, self.call()),
            None => write!(f, "{}", self.call()),
        }
    }
}

impl<S> fmt::Debug for Partial<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("command", &self.command.name())
            .field("args", &self.args)
            .field("binding", &self.binding)
            .finish()
    }
}
