//! Lazy evaluation of property trees.
//!
//! [`run`] returns an iterator of [`Signal`]s: one [`Signal::Step`] per
//! predicate invocation, then a single [`Signal::Finished`] carrying the
//! outcome. Dropping the iterator early abandons the search and releases
//! every generator buffer it holds.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use depthcheck_core::{Assertions, CaseError, CaseResult, Tag, Value};
use depthcheck_generator::{GenContext, Registry, Values};
use tracing::{debug, info, trace};

use crate::outcome::{Binding, Outcome, OutcomeKind, RunStats};
use crate::property::{Clause, PredicateFn, Property, Verdict};

/// Progress reported by a [`Run`].
#[derive(Debug, Clone)]
pub enum Signal {
    /// A predicate was invoked. Indices count from zero.
    Step { index: u64 },
    /// The property was decided.
    Finished(Outcome),
}

enum Poll {
    Step,
    Done(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    ForAll,
    Exists,
}

fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };
    anyhow::anyhow!("panicked: {}", message)
}

fn concat(mut first: Vec<String>, second: &[String]) -> Vec<String> {
    first.extend(second.iter().cloned());
    first
}

enum Evaluator<'a> {
    Ready(Option<Outcome>),
    Quantifier(Box<Quantifier<'a>>),
    Junction(Box<Junction<'a>>),
}

impl<'a> Evaluator<'a> {
    fn new(property: &Property, parent: Option<&str>, cx: &GenContext<'a>, depth: usize) -> Self {
        let path = property.path_in(parent);
        match property.clause() {
            Clause::Unit => Evaluator::Ready(Some(Outcome::new(OutcomeKind::UnitSuccess, path))),
            Clause::Empty => Evaluator::Ready(Some(Outcome::new(OutcomeKind::EmptyFailure, path))),
            Clause::ForAll { tag, predicate } => Evaluator::Quantifier(Box::new(Quantifier::new(
                Mode::ForAll,
                tag,
                predicate,
                path,
                cx,
                depth,
            ))),
            Clause::Exists { tag, predicate } => Evaluator::Quantifier(Box::new(Quantifier::new(
                Mode::Exists,
                tag,
                predicate,
                path,
                cx,
                depth,
            ))),
            Clause::And(lhs, rhs) => {
                Evaluator::Junction(Box::new(Junction::new(true, lhs, rhs, path, cx, depth)))
            }
            Clause::Or(lhs, rhs) => {
                Evaluator::Junction(Box::new(Junction::new(false, lhs, rhs, path, cx, depth)))
            }
        }
    }

    fn poll(&mut self) -> Poll {
        match self {
            Evaluator::Ready(outcome) => match outcome.take() {
                Some(outcome) => Poll::Done(outcome),
                None => Poll::Done(Outcome::unrelated(
                    None,
                    anyhow::anyhow!("clause polled after completion"),
                    "",
                )),
            },
            Evaluator::Quantifier(quantifier) => quantifier.poll(),
            Evaluator::Junction(junction) => junction.poll(),
        }
    }
}

/// A nested property being evaluated for one bound value.
struct Pending<'a> {
    binding: Binding,
    assertions: Vec<String>,
    child: Evaluator<'a>,
}

struct Quantifier<'a> {
    mode: Mode,
    tag: Tag,
    predicate: Arc<PredicateFn>,
    path: String,
    cx: GenContext<'a>,
    depth: usize,
    values: Values<'a>,
    pending: Option<Pending<'a>>,
    decided: Option<Outcome>,
    cases: u64,
}

impl<'a> Quantifier<'a> {
    fn new(
        mode: Mode,
        tag: &Tag,
        predicate: &Arc<PredicateFn>,
        path: String,
        cx: &GenContext<'a>,
        depth: usize,
    ) -> Self {
        let (values, decided) = match cx.resolve(tag) {
            Ok(_) => (cx.values(tag, depth), None),
            Err(error) => {
                let values: Values<'a> = Box::new(std::iter::empty::<Value>());
                (values, Some(Outcome::unrelated(None, error.into(), path.clone())))
            }
        };
        Self {
            mode,
            tag: tag.clone(),
            predicate: Arc::clone(predicate),
            path,
            cx: cx.clone(),
            depth,
            values,
            pending: None,
            decided,
            cases: 0,
        }
    }

    fn poll(&mut self) -> Poll {
        if let Some(outcome) = self.decided.take() {
            return Poll::Done(outcome);
        }
        if let Some(pending) = self.pending.as_mut() {
            match pending.child.poll() {
                Poll::Step => {
                    self.cases += 1;
                    return Poll::Step;
                }
                Poll::Done(child) => {
                    if let Some(pending) = self.pending.take() {
                        if let Some(outcome) = self.resolve(pending, child) {
                            return Poll::Done(outcome);
                        }
                    }
                }
            }
        }
        self.invoke_next()
    }

    fn invoke_next(&mut self) -> Poll {
        let values = &mut self.values;
        let value = match panic::catch_unwind(AssertUnwindSafe(|| values.next())) {
            Ok(Some(value)) => value,
            Ok(None) => return Poll::Done(self.exhausted()),
            Err(payload) => {
                let outcome = Outcome::unrelated(None, panic_error(payload), self.path.clone())
                    .with_cases(self.cases);
                return Poll::Done(outcome);
            }
        };
        trace!(path = %self.path, value = %value, "Generated value");

        self.cases += 1;
        let mut log = Assertions::new();
        let predicate = Arc::clone(&self.predicate);
        let result = panic::catch_unwind(AssertUnwindSafe(|| predicate(&mut log, &value)))
            .unwrap_or_else(|payload| Err(CaseError::Unrelated(panic_error(payload))));
        let binding = Binding::new(self.tag.clone(), value);
        self.decided = self.classify(binding, log, result);
        Poll::Step
    }

    fn classify(
        &mut self,
        binding: Binding,
        mut log: Assertions,
        result: CaseResult<Verdict>,
    ) -> Option<Outcome> {
        let kind = match (self.mode, result) {
            (_, Ok(Verdict::Nested(property))) => {
                let child = Evaluator::new(&property, Some(&self.path), &self.cx, self.depth);
                self.pending = Some(Pending {
                    binding,
                    assertions: log.into_log(),
                    child,
                });
                return None;
            }
            (_, Err(CaseError::Unrelated(error))) => OutcomeKind::UnrelatedException {
                binding: Some(binding),
                error: Arc::new(error),
            },
            (Mode::ForAll, Ok(Verdict::Holds(true))) => return None,
            (Mode::ForAll, Ok(Verdict::Holds(false))) => OutcomeKind::Counter { binding },
            (Mode::ForAll, Err(CaseError::Assertion(failure))) => {
                log.note(failure.message.clone());
                OutcomeKind::AssertionCounter {
                    binding,
                    message: failure.message,
                }
            }
            (Mode::Exists, Ok(Verdict::Holds(true))) => OutcomeKind::Witness { binding },
            (Mode::Exists, Ok(Verdict::Holds(false))) => return None,
            (Mode::Exists, Err(CaseError::Assertion(failure))) => {
                debug!(path = %self.path, case = self.cases, "Assertion failed, searching on: {}", failure);
                return None;
            }
        };
        debug!(path = %self.path, case = self.cases, "Case decided: {:?}", kind);
        Some(
            Outcome::new(kind, self.path.clone())
                .with_assertions(log.into_log())
                .with_cases(self.cases),
        )
    }

    fn resolve(&self, pending: Pending<'a>, child: Outcome) -> Option<Outcome> {
        let kind = match (&child.kind, self.mode) {
            (OutcomeKind::UnrelatedException { error, .. }, _) => OutcomeKind::UnrelatedException {
                binding: Some(pending.binding),
                error: Arc::clone(error),
            },
            (_, Mode::ForAll) if child.is_failure() => OutcomeKind::Counter {
                binding: pending.binding,
            },
            (_, Mode::Exists) if child.is_success() => OutcomeKind::Witness {
                binding: pending.binding,
            },
            _ => return None,
        };
        debug!(path = %self.path, case = self.cases, "Nested property decided case: {:?}", kind);
        let assertions = concat(pending.assertions, &child.assertions);
        Some(
            Outcome::new(kind, self.path.clone())
                .with_assertions(assertions)
                .with_cases(self.cases)
                .with_child(child),
        )
    }

    fn exhausted(&self) -> Outcome {
        let kind = match self.mode {
            Mode::ForAll => OutcomeKind::NoCounter,
            Mode::Exists => OutcomeKind::NoWitness,
        };
        debug!(path = %self.path, cases = self.cases, "Values exhausted");
        Outcome::new(kind, self.path.clone()).with_cases(self.cases)
    }
}

struct Junction<'a> {
    conjunction: bool,
    path: String,
    running: [Option<Evaluator<'a>>; 2],
    finished: [Option<Outcome>; 2],
    turn: usize,
    cases: u64,
}

impl<'a> Junction<'a> {
    fn new(
        conjunction: bool,
        lhs: &Property,
        rhs: &Property,
        path: String,
        cx: &GenContext<'a>,
        depth: usize,
    ) -> Self {
        let running = [
            Some(Evaluator::new(lhs, Some(&path), cx, depth)),
            Some(Evaluator::new(rhs, Some(&path), cx, depth)),
        ];
        Self {
            conjunction,
            path,
            running,
            finished: [None, None],
            turn: 0,
            cases: 0,
        }
    }

    fn poll(&mut self) -> Poll {
        loop {
            let side = if self.running[self.turn].is_some() {
                self.turn
            } else if self.running[1 - self.turn].is_some() {
                1 - self.turn
            } else {
                return Poll::Done(self.combine());
            };
            let Some(evaluator) = self.running[side].as_mut() else {
                continue;
            };
            match evaluator.poll() {
                Poll::Step => {
                    self.cases += 1;
                    self.turn = 1 - side;
                    return Poll::Step;
                }
                Poll::Done(outcome) => {
                    self.running[side] = None;
                    let decisive = if self.conjunction {
                        outcome.is_failure()
                    } else {
                        outcome.is_success()
                    };
                    if decisive {
                        // Dropping the other side abandons its search.
                        self.running = [None, None];
                        return Poll::Done(self.decide(outcome));
                    }
                    self.finished[side] = Some(outcome);
                    self.turn = 1 - side;
                }
            }
        }
    }

    fn decide(&self, outcome: Outcome) -> Outcome {
        debug!(path = %self.path, cases = self.cases, "Junction decided by {}", outcome.path);
        Outcome::new(outcome.kind.clone(), self.path.clone())
            .with_assertions(outcome.assertions.clone())
            .with_cases(self.cases)
            .with_child(outcome)
    }

    // Both sides agree; report the side that finished last.
    fn combine(&mut self) -> Outcome {
        let last = self.turn ^ 1;
        match (self.finished[0].take(), self.finished[1].take()) {
            (Some(lhs), Some(rhs)) => {
                let assertions = concat(lhs.assertions.clone(), &rhs.assertions);
                let later = if last == 0 { lhs } else { rhs };
                Outcome::new(later.kind.clone(), self.path.clone())
                    .with_assertions(assertions)
                    .with_cases(self.cases)
                    .with_child(later)
            }
            _ => Outcome::unrelated(
                None,
                anyhow::anyhow!("junction polled after completion"),
                self.path.clone(),
            ),
        }
    }
}

/// Lazy evaluation of one property at one depth.
pub struct Run<'a> {
    root: Evaluator<'a>,
    cx: GenContext<'a>,
    path: String,
    depth: usize,
    steps: u64,
    outcome: Option<Outcome>,
}

impl<'a> Run<'a> {
    /// Predicate invocations so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The outcome, once the run has finished.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Drive the run to completion.
    pub fn finish(mut self) -> Outcome {
        while let Some(signal) = self.next() {
            if let Signal::Finished(outcome) = signal {
                return outcome;
            }
        }
        match self.outcome {
            Some(outcome) => outcome,
            None => Outcome::unrelated(None, anyhow::anyhow!("run ended without an outcome"), self.path),
        }
    }
}

impl Iterator for Run<'_> {
    type Item = Signal;

    fn next(&mut self) -> Option<Signal> {
        if self.outcome.is_some() {
            return None;
        }
        match self.root.poll() {
            Poll::Step => {
                let index = self.steps;
                self.steps += 1;
                Some(Signal::Step { index })
            }
            Poll::Done(mut outcome) => {
                outcome.stats = Some(RunStats {
                    depth: self.depth,
                    steps: self.steps,
                    failed_implications: self.cx.stats().failed_implications(),
                });
                info!(
                    path = %outcome.path,
                    depth = self.depth,
                    steps = self.steps,
                    success = outcome.is_success(),
                    "Property evaluated"
                );
                self.outcome = Some(outcome.clone());
                Some(Signal::Finished(outcome))
            }
        }
    }
}

/// Start evaluating `property` at `depth`.
pub fn run<'a>(registry: &'a Registry, property: &Property, depth: usize) -> Run<'a> {
    let cx = GenContext::new(registry);
    let root = Evaluator::new(property, None, &cx, depth);
    Run {
        root,
        cx,
        path: property.path_in(None),
        depth,
        steps: 0,
        outcome: None,
    }
}

/// Evaluate `property` at `depth` to its outcome.
pub fn check(registry: &Registry, property: &Property, depth: usize) -> Outcome {
    run(registry, property, depth).finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{and, empty, exists, forall, or, unit};

    fn int_of(value: &Value) -> i64 {
        value.as_int().unwrap_or_default()
    }

    fn bound(outcome: &Outcome) -> Option<i64> {
        outcome.binding().and_then(|b| b.value.as_int())
    }

    #[test]
    fn test_constant_clauses() {
        let registry = Registry::new();
        let outcome = check(&registry, &unit(), 3);
        assert!(matches!(outcome.kind, OutcomeKind::UnitSuccess));
        assert_eq!(outcome.stats.map(|s| s.steps), Some(0));
        assert!(matches!(check(&registry, &empty(), 3).kind, OutcomeKind::EmptyFailure));
    }

    #[test]
    fn test_forall_short_circuits() {
        let registry = Registry::new();
        let prop = forall(Tag::int(), |_, x| Ok(int_of(x) != 3));

        let signals: Vec<Signal> = run(&registry, &prop, 3).collect();
        assert_eq!(signals.len(), 7);
        let Some(Signal::Finished(outcome)) = signals.last() else {
            panic!("run did not finish");
        };
        assert!(matches!(outcome.kind, OutcomeKind::Counter { .. }));
        assert_eq!(bound(outcome), Some(3));
        assert_eq!(outcome.cases, 6);
        assert_eq!(outcome.stats.map(|s| s.steps), Some(6));

        let outcome = check(&registry, &prop, 2);
        assert!(matches!(outcome.kind, OutcomeKind::NoCounter));
        assert_eq!(outcome.cases, 5);
    }

    #[test]
    fn test_exists_witness_and_exhaustion() {
        let registry = Registry::new();
        let prop = exists(Tag::int(), |_, x| Ok(int_of(x) < -1));
        let outcome = check(&registry, &prop, 2);
        assert!(matches!(outcome.kind, OutcomeKind::Witness { .. }));
        assert_eq!(bound(&outcome), Some(-2));

        let outcome = check(&registry, &prop, 1);
        assert!(matches!(outcome.kind, OutcomeKind::NoWitness));
    }

    #[test]
    fn test_assertion_counter_keeps_log() {
        let registry = Registry::new();
        let prop = forall(Tag::int(), |log, x| {
            log.assert_lt(&int_of(x), &2)?;
            Ok(true)
        });
        let outcome = check(&registry, &prop, 3);
        match &outcome.kind {
            OutcomeKind::AssertionCounter { binding, message } => {
                assert_eq!(binding.value, Value::Int(2));
                assert_eq!(message, "2 >= 2");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.assertions, vec!["2 >= 2".to_string()]);
    }

    #[test]
    fn test_exists_skips_assertion_failures() {
        let registry = Registry::new();
        let prop = exists(Tag::int(), |log, x| {
            log.assert_true(int_of(x) != 0, "nonzero")?;
            Ok(true)
        });
        let outcome = check(&registry, &prop, 2);
        assert_eq!(bound(&outcome), Some(1));
        assert_eq!(outcome.cases, 2);
    }

    #[test]
    fn test_unrelated_errors_and_panics() {
        let registry = Registry::new();
        let failing = forall(Tag::int(), |_, x| {
            if int_of(x) == 1 {
                Err(CaseError::unrelated("disk on fire"))
            } else {
                Ok(true)
            }
        });
        let outcome = check(&registry, &failing, 3);
        match &outcome.kind {
            OutcomeKind::UnrelatedException { binding, error } => {
                assert_eq!(binding.as_ref().map(|b| b.value.clone()), Some(Value::Int(1)));
                assert!(error.to_string().contains("disk on fire"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let panicking = exists(Tag::int(), |_, x| -> CaseResult<bool> {
            if int_of(x) == -1 {
                panic!("boom");
            }
            Ok(false)
        });
        let outcome = check(&registry, &panicking, 3);
        match &outcome.kind {
            OutcomeKind::UnrelatedException { error, .. } => {
                assert_eq!(error.to_string(), "panicked: boom");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_missing_strategy_is_unrelated() {
        let registry = Registry::new();
        let prop = forall(Tag::new("Queue"), |_, _| Ok(true));
        let outcome = check(&registry, &prop, 3);
        match &outcome.kind {
            OutcomeKind::UnrelatedException { binding: None, error } => {
                assert!(error.to_string().contains("Queue"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.stats.map(|s| s.steps), Some(0));
    }

    #[test]
    fn test_malformed_tag_is_unrelated() {
        let registry = Registry::new();
        let prop = forall(Tag::new("List"), |_, _| Ok(true));
        let outcome = check(&registry, &prop, 3);
        match &outcome.kind {
            OutcomeKind::UnrelatedException { binding: None, error } => {
                assert_eq!(error.to_string(), "invalid tag List: expected 1 argument, found 0");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.cases, 0);
    }

    #[test]
    fn test_nested_counter_has_child() {
        let registry = Registry::new();
        // Every x has some y with x + y == 0, at a depth too shallow for 2.
        let prop = forall(Tag::int(), |_, x| {
            let x = int_of(x);
            Ok(exists(Tag::int(), move |_, y| Ok(x + int_of(y) == 0)))
        })
        .named("inverse");

        let outcome = check(&registry, &prop, 2);
        assert!(outcome.is_success());

        let shallow = forall(Tag::int(), |_, x| {
            let x = int_of(x);
            Ok(exists(Tag::nat(), move |_, y| Ok(x + int_of(y) == 0)))
        })
        .named("nat_inverse");
        let outcome = check(&registry, &shallow, 2);
        assert!(matches!(outcome.kind, OutcomeKind::Counter { .. }));
        assert_eq!(bound(&outcome), Some(1));
        let child = outcome.child.as_deref().map(|c| (c.path.clone(), c.is_failure()));
        assert_eq!(
            child,
            Some(("nat_inverse.FORALL(Int).EXISTS(Nat)".to_string(), true))
        );
        // x = 0 takes one inner case, x = 1 three.
        assert_eq!(outcome.cases, 2 + 1 + 3);
    }

    #[test]
    fn test_junctions_alternate() {
        let registry = Registry::new();
        let holds = forall(Tag::bool(), |_, _| Ok(true));
        let counter = forall(Tag::int(), |_, x| Ok(int_of(x) < 1));

        let outcome = check(&registry, &and(holds.clone(), counter.clone()), 3);
        assert!(matches!(outcome.kind, OutcomeKind::Counter { .. }));
        assert_eq!(outcome.path, "AND");
        assert_eq!(outcome.child.as_deref().map(|c| c.path.as_str()), Some("AND.FORALL(Int)"));
        // Bool, Int 0, Bool, Int 1.
        assert_eq!(outcome.cases, 4);

        let outcome = check(&registry, &or(counter, holds.clone()), 3);
        assert!(matches!(outcome.kind, OutcomeKind::NoCounter));
        assert_eq!(outcome.cases, 4);

        let outcome = check(&registry, &(unit() & holds), 3);
        assert!(matches!(outcome.kind, OutcomeKind::NoCounter));
        assert_eq!(outcome.cases, 2);
    }

    #[test]
    fn test_or_of_failures_merges_assertions() {
        let registry = Registry::new();
        let lhs = forall(Tag::bool(), |log, b| {
            log.note("lhs");
            Ok(b.as_bool() != Some(true))
        });
        let rhs = forall(Tag::unit(), |log, _| {
            log.note("rhs");
            Ok(false)
        });
        let outcome = check(&registry, &(lhs | rhs), 2);
        assert!(matches!(outcome.kind, OutcomeKind::Counter { .. }));
        assert_eq!(outcome.assertions, vec!["lhs".to_string(), "rhs".to_string()]);
    }

    #[test]
    fn test_run_is_resumable() {
        let registry = Registry::new();
        let prop = forall(Tag::int(), |_, _| Ok(true));
        let mut run = run(&registry, &prop, 4);
        let first: Vec<Signal> = run.by_ref().take(3).collect();
        assert!(first.iter().all(|s| matches!(s, Signal::Step { .. })));
        assert_eq!(run.steps(), 3);
        let outcome = run.finish();
        assert!(matches!(outcome.kind, OutcomeKind::NoCounter));
        assert_eq!(outcome.cases, 9);
    }
}
