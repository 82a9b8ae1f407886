//! Command sequence construction.
//!
//! Given a list of commands, the builder enumerates every way to bind their
//! arguments. Literal arguments come from a fair product over each
//! command's parameter tags. A parameter whose tag has no strategy receives
//! a [`Value::Missing`] from the product and is instead bound to an earlier
//! step returning that tag, once per eligible step. A tuple with a missing
//! slot and no eligible step is discarded. Finished sequences go through a
//! naming pass that gives each referenced step a binding name.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use depthcheck_core::{Tag, Value};
use depthcheck_generator::{FairProduct, GenContext, NameSupply};
use tracing::trace;

use crate::command::CommandRef;
use crate::model::Model;
use crate::partial::{Arg, Partial};
use crate::sequence::CommandSequence;
use crate::validator::precondition_step;

/// Lazily build every sequence of `commands`, in order, with arguments at
/// `depth`.
///
/// Each sequence has exactly one step per command. No commands yields one
/// empty sequence. When the model's prefix filter is enabled, prefixes
/// whose preconditions fail are dropped together with all their
/// extensions.
pub fn build_command_sequences<'a, S: Clone>(
    cx: &GenContext<'a>,
    model: &Arc<Model<S>>,
    commands: &[CommandRef<S>],
    depth: usize,
) -> CommandSequences<'a, S> {
    CommandSequences::new(cx, model, commands, depth)
}

struct Frame<'a, S> {
    prefix: Vec<Partial<S>>,
    replacements: BTreeMap<Tag, Vec<usize>>,
    state: Option<S>,
    tuples: FairProduct<'a>,
    options: VecDeque<Vec<Arg>>,
}

/// Iterator returned by [`build_command_sequences`].
///
/// The search is depth-first: the first command's arguments vary slowest.
pub struct CommandSequences<'a, S> {
    cx: GenContext<'a>,
    model: Arc<Model<S>>,
    commands: Vec<CommandRef<S>>,
    depth: usize,
    stack: Vec<Frame<'a, S>>,
    emit_empty: bool,
}

impl<'a, S: Clone> CommandSequences<'a, S> {
    fn new(
        cx: &GenContext<'a>,
        model: &Arc<Model<S>>,
        commands: &[CommandRef<S>],
        depth: usize,
    ) -> Self {
        let mut sequences = Self {
            cx: cx.clone(),
            model: Arc::clone(model),
            commands: commands.to_vec(),
            depth,
            stack: Vec::new(),
            emit_empty: commands.is_empty(),
        };
        if let Some(first) = commands.first() {
            let state = model.prefix_filter().then(|| model.initial_state().clone());
            let tuples = FairProduct::of_tags(cx, first.params(), depth);
            sequences.stack.push(Frame {
                prefix: Vec::new(),
                replacements: BTreeMap::new(),
                state,
                tuples,
                options: VecDeque::new(),
            });
        }
        sequences
    }
}

impl<S: Clone> Iterator for CommandSequences<'_, S> {
    type Item = CommandSequence<S>;

    fn next(&mut self) -> Option<CommandSequence<S>> {
        if self.emit_empty {
            self.emit_empty = false;
            return Some(CommandSequence::new(Arc::clone(&self.model), Vec::new()));
        }

        loop {
            let frame = self.stack.last_mut()?;
            let level = frame.prefix.len();
            let command = &self.commands[level];

            let Some(args) = frame.options.pop_front() else {
                match frame.tuples.next() {
                    Some(tuple) => {
                        frame.options = substitute(tuple, command.params(), &frame.replacements);
                    }
                    None => {
                        self.stack.pop();
                    }
                }
                continue;
            };

            let state = match &frame.state {
                Some(state) => {
                    let literal: Vec<Value> = args.iter().map(symbolic_value).collect();
                    match precondition_step(state, command, &literal) {
                        Some(next) => Some(next),
                        None => {
                            trace!(command = command.name(), level, "Precondition failed, pruning prefix");
                            continue;
                        }
                    }
                }
                None => None,
            };

            let mut prefix = frame.prefix.clone();
            prefix.push(Partial::new(Arc::clone(command), args));
            if prefix.len() == self.commands.len() {
                return Some(assign_names(Arc::clone(&self.model), prefix));
            }

            let mut replacements = frame.replacements.clone();
            replacements
                .entry(command.returns().clone())
                .or_default()
                .push(level);
            let tuples = FairProduct::of_tags(&self.cx, self.commands[level + 1].params(), self.depth);
            self.stack.push(Frame {
                prefix,
                replacements,
                state,
                tuples,
                options: VecDeque::new(),
            });
        }
    }
}

fn symbolic_value(arg: &Arg) -> Value {
    match arg {
        Arg::Literal(value) => value.clone(),
        Arg::Ref(_) | Arg::Name(_) => Value::Missing,
    }
}

/// Expand one product tuple into its argument bindings.
///
/// Missing slots branch over every earlier step returning the slot's tag,
/// earliest first. Returns nothing if some missing slot has no candidate.
fn substitute(
    tuple: Vec<Value>,
    params: &[Tag],
    replacements: &BTreeMap<Tag, Vec<usize>>,
) -> VecDeque<Vec<Arg>> {
    let mut options: Vec<Vec<Arg>> = vec![Vec::with_capacity(params.len())];
    for (value, tag) in tuple.into_iter().zip(params) {
        if value.is_missing() {
            let Some(sources) = replacements.get(tag) else {
                return VecDeque::new();
            };
            options = options
                .into_iter()
                .flat_map(|partial| {
                    sources.iter().map(move |&source| {
                        let mut args = partial.clone();
                        args.push(Arg::Ref(source));
                        args
                    })
                })
                .collect();
        } else {
            for args in &mut options {
                args.push(Arg::Literal(value.clone()));
            }
        }
    }
    options.into()
}

/// Give every referenced step a fresh name and rewrite references to it.
fn assign_names<S>(model: Arc<Model<S>>, mut partials: Vec<Partial<S>>) -> CommandSequence<S> {
    let referenced: BTreeSet<usize> = partials
        .iter()
        .flat_map(|partial| partial.args().iter())
        .filter_map(|arg| match arg {
            Arg::Ref(index) => Some(*index),
            _ => None,
        })
        .collect();

    let mut supply = NameSupply::new();
    let mut names: HashMap<usize, String> = HashMap::new();
    for index in referenced {
        let name = supply.fresh();
        partials[index].set_binding(name.clone());
        names.insert(index, name);
    }

    for partial in &mut partials {
        for arg in partial.args_mut() {
            if let Arg::Ref(index) = arg {
                if let Some(name) = names.get(index) {
                    *arg = Arg::Name(name.clone());
                }
            }
        }
    }
    CommandSequence::new(model, partials)
}
