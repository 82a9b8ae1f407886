//! Outcomes of property evaluation.

use std::fmt;
use std::sync::Arc;

use depthcheck_core::{Tag, Value};
use serde::{Serialize, Serializer};

/// A value bound by a quantifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub tag: Tag,
    pub value: Value,
}

impl Binding {
    pub fn new(tag: Tag, value: Value) -> Self {
        Self { tag, value }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.tag, self.value)
    }
}

fn serialize_error<S: Serializer>(error: &Arc<anyhow::Error>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format!("{:#}", error))
}

/// How a clause ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeKind {
    /// `UNIT` holds.
    UnitSuccess,
    /// `FORALL` exhausted its values without a counterexample.
    NoCounter,
    /// `EXISTS` found a value satisfying the predicate.
    Witness { binding: Binding },
    /// `EMPTY` fails.
    EmptyFailure,
    /// `EXISTS` exhausted its values without a witness.
    NoWitness,
    /// `FORALL` found a value falsifying the predicate.
    Counter { binding: Binding },
    /// `FORALL` found a value failing an assertion.
    AssertionCounter { binding: Binding, message: String },
    /// User code raised an error that is not an assertion failure.
    UnrelatedException {
        binding: Option<Binding>,
        #[serde(serialize_with = "serialize_error")]
        error: Arc<anyhow::Error>,
    },
}

impl OutcomeKind {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OutcomeKind::UnitSuccess | OutcomeKind::NoCounter | OutcomeKind::Witness { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn binding(&self) -> Option<&Binding> {
        match self {
            OutcomeKind::Witness { binding }
            | OutcomeKind::Counter { binding }
            | OutcomeKind::AssertionCounter { binding, .. } => Some(binding),
            OutcomeKind::UnrelatedException { binding, .. } => binding.as_ref(),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            OutcomeKind::UnitSuccess => "holds".to_string(),
            OutcomeKind::NoCounter => "no counterexample".to_string(),
            OutcomeKind::Witness { binding } => format!("witness {}", binding),
            OutcomeKind::EmptyFailure => "empty property".to_string(),
            OutcomeKind::NoWitness => "no witness".to_string(),
            OutcomeKind::Counter { binding } => format!("counterexample {}", binding),
            OutcomeKind::AssertionCounter { binding, message } => {
                format!("counterexample {} (assertion failed: {})", binding, message)
            }
            OutcomeKind::UnrelatedException {
                binding: Some(binding),
                error,
            } => format!("error at {}: {}", binding, error),
            OutcomeKind::UnrelatedException {
                binding: None,
                error,
            } => format!("error: {}", error),
        }
    }
}

/// Totals for one run, attached to its top-level outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub depth: usize,
    /// Step signals emitted before the outcome.
    pub steps: u64,
    /// Generated values rejected by implication filters.
    pub failed_implications: u64,
}

/// Result of evaluating one clause.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    #[serde(flatten)]
    pub kind: OutcomeKind,
    /// Clause path, e.g. `prop_queue.EXISTS(Commands<Queue>)`.
    pub path: String,
    /// Assertions of the case that decided this outcome, then those of
    /// the nested outcome it depends on.
    pub assertions: Vec<String>,
    /// Predicate calls made by this clause.
    pub cases: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<Outcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            assertions: Vec::new(),
            cases: 0,
            child: None,
            stats: None,
        }
    }

    pub fn unrelated(binding: Option<Binding>, error: anyhow::Error, path: impl Into<String>) -> Self {
        Self::new(
            OutcomeKind::UnrelatedException {
                binding,
                error: Arc::new(error),
            },
            path,
        )
    }

    pub fn with_assertions(mut self, assertions: Vec<String>) -> Self {
        self.assertions = assertions;
        self
    }

    pub fn with_cases(mut self, cases: u64) -> Self {
        self.cases = cases;
        self
    }

    pub fn with_child(mut self, child: Outcome) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind.is_success()
    }

    pub fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }

    /// The binding of this outcome.
    pub fn binding(&self) -> Option<&Binding> {
        self.kind.binding()
    }

    /// Bindings from this outcome down through its nested outcomes.
    pub fn bindings(&self) -> Vec<&Binding> {
        let mut bindings = Vec::new();
        let mut current = Some(self);
        while let Some(outcome) = current {
            if let Some(binding) = outcome.binding() {
                if bindings.last().map_or(true, |last: &&Binding| *last != binding) {
                    bindings.push(binding);
                }
            }
            current = outcome.child.as_deref();
        }
        bindings
    }

    /// The innermost nested outcome.
    pub fn root_cause(&self) -> &Outcome {
        let mut current = self;
        while let Some(child) = current.child.as_deref() {
            current = child;
        }
        current
    }

    /// Pretty JSON report of the outcome tree.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_success() { "PASS" } else { "FAIL" };
        write!(f, "{} {}: {}", status, self.path, self.kind.describe())?;
        if self.cases > 0 {
            write!(f, " after {} cases", self.cases)?;
        }
        if let Some(stats) = &self.stats {
            write!(f, " (depth {}, {} steps", stats.depth, stats.steps)?;
            if stats.failed_implications > 0 {
                write!(f, ", {} did not meet implication", stats.failed_implications)?;
            }
            write!(f, ")")?;
        }
        writeln!(f)?;
        for message in &self.assertions {
            writeln!(f, "  - {}", message)?;
        }
        if let Some(child) = &self.child {
            write!(f, "  caused by: {}", child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(value: i64) -> Outcome {
        Outcome::new(
            OutcomeKind::Counter {
                binding: Binding::new(Tag::int(), Value::Int(value)),
            },
            "p.FORALL(Int)",
        )
        .with_cases(3)
    }

    #[test]
    fn test_success_classification() {
        assert!(Outcome::new(OutcomeKind::UnitSuccess, "UNIT").is_success());
        assert!(Outcome::new(OutcomeKind::NoCounter, "x").is_success());
        assert!(Outcome::new(OutcomeKind::EmptyFailure, "EMPTY").is_failure());
        assert!(Outcome::new(OutcomeKind::NoWitness, "x").is_failure());
        assert!(Outcome::unrelated(None, anyhow::anyhow!("boom"), "x").is_failure());
        assert!(counter(3).is_failure());
    }

    #[test]
    fn test_bindings_follow_children() {
        let inner = counter(2);
        let outer = Outcome::new(
            OutcomeKind::Counter {
                binding: Binding::new(Tag::int(), Value::Int(1)),
            },
            "p.FORALL(Int)",
        )
        .with_child(inner);
        let values: Vec<String> = outer.bindings().iter().map(|b| b.value.to_string()).collect();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(outer.root_cause().binding().map(|b| b.value.clone()), Some(Value::Int(2)));
    }

    #[test]
    fn test_display() {
        let outcome = counter(3).with_assertions(vec!["3 > 2".to_string()]);
        assert_eq!(
            outcome.to_string(),
            "FAIL p.FORALL(Int): counterexample Int = 3 after 3 cases\n  - 3 > 2\n"
        );
    }

    #[test]
    fn test_json_report() {
        let json = counter(-1).to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["kind"], "counter");
        assert_eq!(parsed["binding"]["value"], -1);
        assert_eq!(parsed["binding"]["tag"]["name"], "Int");
        assert_eq!(parsed["cases"], 3);
        assert!(parsed.get("child").is_none());
    }
}
