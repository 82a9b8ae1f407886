//! Stateful validation of command sequences.
//!
//! [`replay`] runs every step in order against a model state:
//! precondition, execute, postcondition, next state. The first hook that
//! returns false or fails an assertion stops the replay and marks the
//! sequence invalid at that step. [`validate_preconditions_only`] walks only
//! the precondition chain and is meant for implication filters.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use depthcheck_core::{Assertions, CaseError, CaseResult, Tag, Value};
use depthcheck_generator::Registry;
use serde::Serialize;
use tracing::debug;

use crate::command::Command;
use crate::partial::{Arg, Partial};
use crate::sequence::{sequence_of, CommandSequence};

/// Which hook rejected a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    Precondition,
    Execute,
    Postcondition,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Precondition => write!(f, "precondition"),
            Hook::Execute => write!(f, "execute"),
            Hook::Postcondition => write!(f, "postcondition"),
        }
    }
}

/// Why a hook rejected a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Rejection {
    /// The hook returned false.
    False,
    /// The hook failed an assertion.
    Assertion(String),
}

/// Result of replaying a sequence.
#[derive(Debug, Clone)]
pub enum ReplayVerdict {
    /// Every step passed.
    Valid,
    /// A hook rejected the step.
    Invalid {
        step: usize,
        call: String,
        hook: Hook,
        rejection: Rejection,
    },
    /// User code raised an error unrelated to any assertion.
    Errored {
        step: usize,
        call: String,
        error: Arc<anyhow::Error>,
    },
}

impl ReplayVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ReplayVerdict::Valid)
    }
}

impl fmt::Display for ReplayVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayVerdict::Valid => write!(f, "valid"),
            ReplayVerdict::Invalid {
                step,
                call,
                hook,
                rejection: Rejection::False,
            } => write!(f, "step {} {}: {} is false", step, call, hook),
            ReplayVerdict::Invalid {
                step,
                call,
                hook,
                rejection: Rejection::Assertion(message),
            } => write!(f, "step {} {}: {} failed: {}", step, call, hook, message),
            ReplayVerdict::Errored { step, call, error } => {
                write!(f, "step {} {}: error: {}", step, call, error)
            }
        }
    }
}

/// One executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub call: String,
    pub result: Value,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.result, Value::Unit) {
            write!(f, "{}", self.call)
        } else {
            write!(f, "{} -> {}", self.call, self.result)
        }
    }
}

/// State-independent part of a replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub verdict: ReplayVerdict,
    /// Steps whose execute hook ran, in order.
    pub steps: Vec<StepRecord>,
    /// Assertions made by the hooks, in order.
    pub assertions: Vec<String>,
}

impl ReplayReport {
    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    /// Turn the report into a predicate result.
    ///
    /// A valid replay holds, a hook returning false does not hold, a failed
    /// assertion stays an assertion failure and an unrelated error stays
    /// unrelated. The hooks' assertions are appended to `log`.
    pub fn check(self, log: &mut Assertions) -> CaseResult<bool> {
        log.extend(self.assertions);
        match self.verdict {
            ReplayVerdict::Valid => Ok(true),
            ReplayVerdict::Invalid {
                rejection: Rejection::False,
                ..
            } => Ok(false),
            ReplayVerdict::Invalid {
                step,
                call,
                hook,
                rejection: Rejection::Assertion(message),
            } => Err(CaseError::assertion(format!(
                "step {} {}: {}: {}",
                step, call, hook, message
            ))),
            ReplayVerdict::Errored { step, call, error } => Err(CaseError::unrelated(format!(
                "step {} {}: {}",
                step, call, error
            ))),
        }
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", step)?;
        }
        write!(f, " => {}", self.verdict)
    }
}

/// Full replay result including the final model state.
#[derive(Debug, Clone)]
pub struct Replay<S> {
    pub report: ReplayReport,
    /// State after the last step that completed.
    pub final_state: S,
}

struct Replayer<S> {
    state: S,
    bindings: HashMap<String, Value>,
    log: Assertions,
    steps: Vec<StepRecord>,
}

impl<S: Clone> Replayer<S> {
    fn finish(self, verdict: ReplayVerdict) -> Replay<S> {
        Replay {
            report: ReplayReport {
                verdict,
                steps: self.steps,
                assertions: self.log.into_log(),
            },
            final_state: self.state,
        }
    }

    fn resolve(&self, partial: &Partial<S>) -> Result<Vec<Value>, String> {
        partial
            .args()
            .iter()
            .map(|arg| match arg {
                Arg::Literal(value) => Ok(value.clone()),
                Arg::Name(name) => self.bindings.get(name).cloned().ok_or_else(|| name.clone()),
                Arg::Ref(index) => Err(format!("#{}", index)),
            })
            .collect()
    }

    fn step(&mut self, step: usize, partial: &Partial<S>) -> Option<ReplayVerdict> {
        let command = partial.command();
        let call = partial.call();

        let args = match self.resolve(partial) {
            Ok(args) => args,
            Err(name) => {
                return Some(ReplayVerdict::Errored {
                    step,
                    call,
                    error: Arc::new(anyhow::anyhow!("unresolved binding '{}'", name)),
                })
            }
        };

        let pre = command.check_precondition(&self.state, &args, &mut self.log);
        if let Some(verdict) = rejected(pre, step, &call, Hook::Precondition) {
            return Some(verdict);
        }

        let result = match command.execute(&args) {
            Ok(result) => result,
            Err(err) => {
                return rejected(Err(err), step, &call, Hook::Execute);
            }
        };
        if let Some(name) = partial.binding() {
            self.bindings.insert(name.to_string(), result.clone());
        }
        self.steps.push(StepRecord {
            step,
            call: call.clone(),
            result: result.clone(),
        });

        let post = command.check_postcondition(&self.state, &args, &result, &mut self.log);
        if let Some(verdict) = rejected(post, step, &call, Hook::Postcondition) {
            return Some(verdict);
        }

        self.state = command.next_state(&self.state, &args, &result);
        None
    }
}

fn rejected(
    outcome: CaseResult<bool>,
    step: usize,
    call: &str,
    hook: Hook,
) -> Option<ReplayVerdict> {
    let invalid = |rejection| ReplayVerdict::Invalid {
        step,
        call: call.to_string(),
        hook,
        rejection,
    };
    match outcome {
        Ok(true) => None,
        Ok(false) => Some(invalid(Rejection::False)),
        Err(CaseError::Assertion(failure)) => Some(invalid(Rejection::Assertion(failure.message))),
        Err(CaseError::Unrelated(error)) => Some(ReplayVerdict::Errored {
            step,
            call: call.to_string(),
            error: Arc::new(error),
        }),
    }
}

/// Replay `sequence` from `initial`.
pub fn replay<S: Clone>(sequence: &CommandSequence<S>, initial: S) -> Replay<S> {
    let mut replayer = Replayer {
        state: initial,
        bindings: HashMap::new(),
        log: Assertions::new(),
        steps: Vec::with_capacity(sequence.len()),
    };
    for (step, partial) in sequence.partials().iter().enumerate() {
        if let Some(verdict) = replayer.step(step, partial) {
            debug!(step, verdict = %verdict, "Replay stopped");
            return replayer.finish(verdict);
        }
    }
    replayer.finish(ReplayVerdict::Valid)
}

/// Check one precondition with unresolved results as [`Value::Missing`].
///
/// Returns the next state if the precondition holds.
pub(crate) fn precondition_step<S: Clone>(
    state: &S,
    command: &Command<S>,
    args: &[Value],
) -> Option<S> {
    let mut log = Assertions::new();
    match command.check_precondition(state, args, &mut log) {
        Ok(true) => Some(command.next_state(state, args, &Value::Missing)),
        Ok(false) | Err(_) => None,
    }
}

/// Check only the precondition chain of `sequence` from `initial`.
///
/// Nothing is executed: referenced arguments and every result are
/// [`Value::Missing`], so the preconditions and next-state hooks must not
/// depend on them.
pub fn validate_preconditions_only<S: Clone>(sequence: &CommandSequence<S>, initial: S) -> bool {
    let mut state = initial;
    for partial in sequence.partials() {
        let args: Vec<Value> = partial
            .args()
            .iter()
            .map(|arg| match arg {
                Arg::Literal(value) => value.clone(),
                Arg::Ref(_) | Arg::Name(_) => Value::Missing,
            })
            .collect();
        match precondition_step(&state, partial.command(), &args) {
            Some(next) => state = next,
            None => return false,
        }
    }
    true
}

/// Register `validate_pre->Commands<..>`, the sequences of `commands` whose
/// precondition chain holds.
pub fn register_precondition_filter(registry: &mut Registry, commands: Tag) -> Tag {
    registry.implies("validate_pre", commands, |value| {
        sequence_of(value).is_some_and(|seq| seq.preconditions_hold())
    })
}
