//! Models and the strategy generating their command sequences.

use std::fmt;
use std::sync::Arc;

use depthcheck_core::Tag;
use depthcheck_generator::{GenContext, Registry, Strategy, Values};
use tracing::{debug, trace};

use crate::builder::build_command_sequences;
use crate::command::{Command, CommandRef};

/// A named state machine: an initial model state and the commands acting
/// on it.
pub struct Model<S> {
    name: String,
    initial: S,
    commands: Vec<CommandRef<S>>,
    prefix_filter: bool,
}

impl<S> Model<S> {
    /// Create a model with no commands.
    ///
    /// The prefix filter is enabled: generation discards a prefix as soon
    /// as one of its preconditions fails.
    pub fn new(name: impl Into<String>, initial: S) -> Self {
        Self {
            name: name.into(),
            initial,
            commands: Vec::new(),
            prefix_filter: true,
        }
    }

    pub fn with_command(mut self, command: Command<S>) -> Self {
        self.commands.push(Arc::new(command));
        self
    }

    /// Enable or disable symbolic precondition pruning during generation.
    ///
    /// While pruning, arguments bound to earlier results and the results
    /// themselves reach the precondition and next-state hooks as
    /// [`Value::Missing`](depthcheck_core::Value::Missing). Disable the
    /// filter when a precondition inspects such an argument; replay then
    /// checks every precondition against the real results.
    pub fn with_prefix_filter(mut self, enabled: bool) -> Self {
        self.prefix_filter = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag of this model's command sequences, `Commands<Name>`.
    pub fn tag(&self) -> Tag {
        Tag::commands(self.name.clone())
    }

    /// Commands in declaration order.
    pub fn commands(&self) -> &[CommandRef<S>] {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&CommandRef<S>> {
        self.commands.iter().find(|cmd| cmd.name() == name)
    }

    pub fn initial_state(&self) -> &S {
        &self.initial
    }

    pub fn prefix_filter(&self) -> bool {
        self.prefix_filter
    }
}

impl<S: Clone + Send + Sync + 'static> Model<S> {
    /// Register the model's sequence strategy under [`Model::tag`].
    pub fn register(self, registry: &mut Registry) -> Arc<Self> {
        let model = Arc::new(self);
        debug!(
            model = %model.name,
            commands = model.commands.len(),
            "Registering model"
        );
        registry.register(model.tag(), ModelStrategy::new(Arc::clone(&model)));
        model
    }
}

impl<S> fmt::Debug for Model<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let commands: Vec<&str> = self.commands.iter().map(|cmd| cmd.name()).collect();
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("commands", &commands)
            .field("prefix_filter", &self.prefix_filter)
            .finish()
    }
}

/// Generates the command sequences of a model.
///
/// At depth `d` it walks every command list of length `0..=d`, shortest
/// first and in declaration order within a length, and yields the
/// sequences the builder produces for each list with arguments at depth
/// `d`.
pub struct ModelStrategy<S> {
    name: String,
    model: Arc<Model<S>>,
}

impl<S> ModelStrategy<S> {
    pub fn new(model: Arc<Model<S>>) -> Self {
        Self {
            name: model.tag().to_string(),
            model,
        }
    }
}

impl<S: Clone + Send + Sync + 'static> Strategy for ModelStrategy<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        let model = Arc::clone(&self.model);
        let cx = cx.clone();
        let lists = CommandLists::new(model.commands.len(), depth);
        Box::new(lists.flat_map(move |list| {
            trace!(model = %model.name, length = list.len(), "Expanding command list");
            let commands: Vec<CommandRef<S>> = list
                .iter()
                .map(|&i| Arc::clone(&model.commands[i]))
                .collect();
            build_command_sequences(&cx, &model, &commands, depth).map(|seq| seq.into_value())
        }))
    }
}

/// Index lists over `choices` commands, shortest first then lexicographic.
struct CommandLists {
    choices: usize,
    max_len: usize,
    current: Option<Vec<usize>>,
}

impl CommandLists {
    fn new(choices: usize, max_len: usize) -> Self {
        Self {
            choices,
            max_len,
            current: Some(Vec::new()),
        }
    }
}

impl Iterator for CommandLists {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.current.take()?;
        let mut next = current.clone();
        let mut pos = next.len();
        loop {
            if pos == 0 {
                let len = current.len() + 1;
                self.current = (self.choices > 0 && len <= self.max_len).then(|| vec![0; len]);
                break;
            }
            pos -= 1;
            next[pos] += 1;
            if next[pos] < self.choices {
                self.current = Some(next);
                break;
            }
            next[pos] = 0;
        }
        Some(current)
    }
}
