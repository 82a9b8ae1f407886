//! Command sequences and their type-erased handle.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use depthcheck_core::{Object, Value};

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use crate::partial::{Arg, Partial};
use crate::validator::{self, Replay, ReplayReport};

/// Ordered bound calls plus the model they replay against.
pub struct CommandSequence<S> {
    model: Arc<Model<S>>,
    partials: Vec<Partial<S>>,
}

impl<S> CommandSequence<S> {
    pub fn new(model: Arc<Model<S>>, partials: Vec<Partial<S>>) -> Self {
        Self { model, partials }
    }

    pub fn model(&self) -> &Arc<Model<S>> {
        &self.model
    }

    pub fn partials(&self) -> &[Partial<S>] {
        &self.partials
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Check that every reference names an earlier step of the right tag.
    pub fn check_references(&self) -> ModelResult<()> {
        let mut bound: HashMap<&str, usize> = HashMap::new();
        for (step, partial) in self.partials.iter().enumerate() {
            let params = partial.command().params();
            if params.len() != partial.args().len() {
                return Err(ModelError::Arity {
                    step,
                    command: partial.command().name().to_string(),
                    expected: params.len(),
                    found: partial.args().len(),
                });
            }
            for (arg, expected) in partial.args().iter().zip(params) {
                let target = match arg {
                    Arg::Literal(_) => continue,
                    Arg::Ref(target) if *target >= step => {
                        return Err(ModelError::ForwardReference {
                            step,
                            target: *target,
                        })
                    }
                    Arg::Ref(target) => {
                        return Err(ModelError::UnnamedReference {
                            step,
                            target: *target,
                        })
                    }
                    Arg::Name(name) => match bound.get(name.as_str()) {
                        Some(&target) => target,
                        None => {
                            return Err(ModelError::DanglingReference {
                                step,
                                name: name.clone(),
                            })
                        }
                    },
                };
                let found = self.partials[target].command().returns();
                if found != expected {
                    return Err(ModelError::TagMismatch {
                        step,
                        expected: expected.clone(),
                        found: found.clone(),
                    });
                }
            }
            if let Some(name) = partial.binding() {
                bound.insert(name, step);
            }
        }
        Ok(())
    }
}

impl<S: Clone> CommandSequence<S> {
    /// Replay against a fresh copy of the model's initial state.
    pub fn replay(&self) -> Replay<S> {
        self.replay_from(self.model.initial_state().clone())
    }

    pub fn replay_from(&self, initial: S) -> Replay<S> {
        validator::replay(self, initial)
    }

    /// Check only the precondition chain, without executing anything.
    pub fn preconditions_hold(&self) -> bool {
        validator::validate_preconditions_only(self, self.model.initial_state().clone())
    }

    pub fn is_valid(&self) -> bool {
        self.replay().report.is_valid()
    }
}

impl<S: Clone + Send + Sync + 'static> CommandSequence<S> {
    /// Wrap the sequence as a generated value.
    pub fn into_value(self) -> Value {
        Value::Object(Object::new(SequenceHandle(Arc::new(self))))
    }
}

impl<S> fmt::Display for CommandSequence<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.partials.is_empty() {
            return write!(f, "<no commands>");
        }
        for (i, partial) in self.partials.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", partial)?;
        }
        Ok(())
    }
}

impl<S> fmt::Debug for CommandSequence<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSequence")
            .field("model", &self.model.name())
            .field("partials", &self.partials)
            .finish()
    }
}

/// Operations on a command sequence that do not need its state type.
pub trait Replayable: fmt::Display + Send + Sync {
    fn model_name(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay against a fresh model state.
    fn replay_report(&self) -> ReplayReport;

    fn preconditions_hold(&self) -> bool;

    fn check_references(&self) -> ModelResult<()>;

    fn as_any(&self) -> &dyn Any;
}

impl<S: Clone + Send + Sync + 'static> Replayable for CommandSequence<S> {
    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn len(&self) -> usize {
        self.partials.len()
    }

    fn replay_report(&self) -> ReplayReport {
        self.replay().report
    }

    fn preconditions_hold(&self) -> bool {
        CommandSequence::preconditions_hold(self)
    }

    fn check_references(&self) -> ModelResult<()> {
        CommandSequence::check_references(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Object payload of a generated command sequence.
pub struct SequenceHandle(Arc<dyn Replayable>);

impl fmt::Display for SequenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Borrow the command sequence inside a generated value.
pub fn sequence_of(value: &Value) -> Option<&dyn Replayable> {
    value
        .downcast_ref::<SequenceHandle>()
        .map(|handle| handle.0.as_ref())
}

/// Borrow the command sequence inside a generated value with its state type.
pub fn typed_sequence<S: 'static>(value: &Value) -> Option<&CommandSequence<S>> {
    sequence_of(value)?.as_any().downcast_ref::<CommandSequence<S>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use depthcheck_core::Tag;

    fn model() -> Arc<Model<()>> {
        Arc::new(
            Model::new("Files", ())
                .with_command(Command::declare("open", [], Tag::new("Fd"), |_| Ok(Value::Int(3))))
                .with_command(Command::declare("close", [Tag::new("Fd")], Tag::unit(), |_| {
                    Ok(Value::Unit)
                }))
                .with_command(Command::declare("write", [Tag::string()], Tag::unit(), |_| {
                    Ok(Value::Unit)
                })),
        )
    }

    fn partial(model: &Model<()>, name: &str, args: Vec<Arg>) -> Partial<()> {
        match model.command(name) {
            Some(cmd) => Partial::new(Arc::clone(cmd), args),
            None => panic!("unknown command {}", name),
        }
    }

    #[test]
    fn test_valid_references() {
        let model = model();
        let mut open = partial(&model, "open", vec![]);
        open.set_binding("a".into());
        let close = partial(&model, "close", vec![Arg::Name("a".into())]);
        let seq = CommandSequence::new(Arc::clone(&model), vec![open, close]);
        assert_eq!(seq.check_references(), Ok(()));
        assert_eq!(seq.to_string(), "a = open(); close(a)");
    }

    #[test]
    fn test_reference_errors() {
        let model = model();
        let close = partial(&model, "close", vec![Arg::Name("a".into())]);
        let seq = CommandSequence::new(Arc::clone(&model), vec![close]);
        assert!(matches!(
            seq.check_references(),
            Err(ModelError::DanglingReference { step: 0, .. })
        ));

        let close = partial(&model, "close", vec![Arg::Ref(0)]);
        let seq = CommandSequence::new(Arc::clone(&model), vec![close]);
        assert_eq!(
            seq.check_references(),
            Err(ModelError::ForwardReference { step: 0, target: 0 })
        );

        let mut write = partial(&model, "write", vec![Arg::Literal(Value::Str("x".into()))]);
        write.set_binding("a".into());
        let close = partial(&model, "close", vec![Arg::Name("a".into())]);
        let seq = CommandSequence::new(Arc::clone(&model), vec![write, close]);
        assert!(matches!(seq.check_references(), Err(ModelError::TagMismatch { step: 1, .. })));
    }

    #[test]
    fn test_handle_round_trip() {
        let model = model();
        let seq = CommandSequence::new(Arc::clone(&model), vec![partial(&model, "open", vec![])]);
        let value = seq.into_value();
        let erased = sequence_of(&value).unwrap();
        assert_eq!(erased.model_name(), "Files");
        assert_eq!(erased.len(), 1);
        assert_eq!(value.to_string(), "open()");
        assert!(typed_sequence::<()>(&value).is_some());
        assert!(typed_sequence::<u8>(&value).is_none());
        assert!(sequence_of(&Value::Int(1)).is_none());
    }
}
