//! Property trees.
//!
//! A [`Property`] is a tree of clauses: quantifiers over a tag, binary
//! conjunction and disjunction, and the constant clauses `EMPTY` (always
//! fails) and `UNIT` (always holds). Quantifier predicates may return a
//! nested property, which the engine evaluates at the same depth.

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

use depthcheck_core::{Assertions, CaseError, CaseResult, FromValue, HasTag, Tag, Value};
use depthcheck_model::sequence_of;

/// What a predicate concluded about one value.
pub enum Verdict {
    Holds(bool),
    /// Evaluate this property to decide.
    Nested(Property),
}

impl From<bool> for Verdict {
    fn from(holds: bool) -> Self {
        Verdict::Holds(holds)
    }
}

impl From<()> for Verdict {
    fn from(_: ()) -> Self {
        Verdict::Holds(true)
    }
}

impl From<Property> for Verdict {
    fn from(property: Property) -> Self {
        Verdict::Nested(property)
    }
}

pub type PredicateFn = dyn Fn(&mut Assertions, &Value) -> CaseResult<Verdict> + Send + Sync;

/// One node of a property tree.
#[derive(Clone)]
pub enum Clause {
    ForAll {
        tag: Tag,
        predicate: Arc<PredicateFn>,
    },
    Exists {
        tag: Tag,
        predicate: Arc<PredicateFn>,
    },
    And(Box<Property>, Box<Property>),
    Or(Box<Property>, Box<Property>),
    Empty,
    Unit,
}

/// A clause tree with an optional name used in outcome paths.
#[derive(Clone)]
pub struct Property {
    clause: Clause,
    name: Option<String>,
}

impl Property {
    fn from_clause(clause: Clause) -> Self {
        Self { clause, name: None }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    /// Clause description, e.g. `FORALL(Int)`.
    pub fn label(&self) -> String {
        match &self.clause {
            Clause::ForAll { tag, .. } => format!("FORALL({})", tag),
            Clause::Exists { tag, .. } => format!("EXISTS({})", tag),
            Clause::And(..) => "AND".to_string(),
            Clause::Or(..) => "OR".to_string(),
            Clause::Empty => "EMPTY".to_string(),
            Clause::Unit => "UNIT".to_string(),
        }
    }

    /// Reporting path of this property below `parent`.
    ///
    /// A named property contributes `name.LABEL`, an unnamed one `LABEL`.
    pub fn path_in(&self, parent: Option<&str>) -> String {
        let own = match &self.name {
            Some(name) => format!("{}.{}", name, self.label()),
            None => self.label(),
        };
        match parent {
            Some(parent) => format!("{}.{}", parent, own),
            None => own,
        }
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("clause", &self.label())
            .finish()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clause {
            Clause::And(lhs, rhs) => write!(f, "({} & {})", lhs, rhs),
            Clause::Or(lhs, rhs) => write!(f, "({} | {})", lhs, rhs),
            _ => write!(f, "{}", self.label()),
        }
    }
}

fn wrap<F, R>(predicate: F) -> Arc<PredicateFn>
where
    F: Fn(&mut Assertions, &Value) -> CaseResult<R> + Send + Sync + 'static,
    R: Into<Verdict>,
{
    Arc::new(move |log: &mut Assertions, value: &Value| predicate(log, value).map(Into::into))
}

fn decode<T: FromValue>(value: &Value, tag: &Tag) -> CaseResult<T> {
    T::from_value(value)
        .ok_or_else(|| CaseError::unrelated(format!("value {} does not decode as {}", value, tag)))
}

/// Every value of `tag` satisfies `predicate`.
pub fn forall<F, R>(tag: Tag, predicate: F) -> Property
where
    F: Fn(&mut Assertions, &Value) -> CaseResult<R> + Send + Sync + 'static,
    R: Into<Verdict>,
{
    Property::from_clause(Clause::ForAll {
        tag,
        predicate: wrap(predicate),
    })
}

/// Some value of `tag` satisfies `predicate`.
pub fn exists<F, R>(tag: Tag, predicate: F) -> Property
where
    F: Fn(&mut Assertions, &Value) -> CaseResult<R> + Send + Sync + 'static,
    R: Into<Verdict>,
{
    Property::from_clause(Clause::Exists {
        tag,
        predicate: wrap(predicate),
    })
}

/// [`forall`] over the canonical tag of `T`, with decoded values.
pub fn forall_of<T, F, R>(predicate: F) -> Property
where
    T: HasTag + FromValue,
    F: Fn(&mut Assertions, T) -> CaseResult<R> + Send + Sync + 'static,
    R: Into<Verdict>,
{
    let tag = T::tag();
    let decode_tag = tag.clone();
    forall(tag, move |log, value| predicate(log, decode(value, &decode_tag)?))
}

/// [`exists`] over the canonical tag of `T`, with decoded values.
pub fn exists_of<T, F, R>(predicate: F) -> Property
where
    T: HasTag + FromValue,
    F: Fn(&mut Assertions, T) -> CaseResult<R> + Send + Sync + 'static,
    R: Into<Verdict>,
{
    let tag = T::tag();
    let decode_tag = tag.clone();
    exists(tag, move |log, value| predicate(log, decode(value, &decode_tag)?))
}

pub fn and(lhs: Property, rhs: Property) -> Property {
    Property::from_clause(Clause::And(Box::new(lhs), Box::new(rhs)))
}

pub fn or(lhs: Property, rhs: Property) -> Property {
    Property::from_clause(Clause::Or(Box::new(lhs), Box::new(rhs)))
}

/// The property that always fails.
pub fn empty() -> Property {
    Property::from_clause(Clause::Empty)
}

/// The property that always holds.
pub fn unit() -> Property {
    Property::from_clause(Clause::Unit)
}

/// Every command sequence of `tag` replays validly.
pub fn forall_valid(tag: Tag) -> Property {
    forall(tag, |log, value| {
        let sequence = sequence_of(value)
            .ok_or_else(|| CaseError::unrelated(format!("{} is not a command sequence", value)))?;
        sequence.replay_report().check(log)
    })
}

/// Some command sequence of `tag` fails to replay validly.
pub fn exists_invalid(tag: Tag) -> Property {
    exists(tag, |_, value| {
        let sequence = sequence_of(value)
            .ok_or_else(|| CaseError::unrelated(format!("{} is not a command sequence", value)))?;
        Ok(!sequence.replay_report().is_valid())
    })
}

impl BitAnd for Property {
    type Output = Property;

    fn bitand(self, rhs: Property) -> Property {
        and(self, rhs)
    }
}

impl BitOr for Property {
    type Output = Property;

    fn bitor(self, rhs: Property) -> Property {
        or(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_paths() {
        let prop = forall(Tag::int(), |_, _| Ok(true)).named("prop_int");
        assert_eq!(prop.label(), "FORALL(Int)");
        assert_eq!(prop.path_in(None), "prop_int.FORALL(Int)");

        let nested = exists(Tag::list(Tag::bool()), |_, _| Ok(false));
        assert_eq!(
            nested.path_in(Some("prop_int.FORALL(Int)")),
            "prop_int.FORALL(Int).EXISTS(List<Bool>)"
        );
    }

    #[test]
    fn test_operators_build_junctions() {
        let prop = unit() & (empty() | unit());
        assert!(matches!(prop.clause(), Clause::And(..)));
        assert_eq!(prop.to_string(), "(UNIT & (EMPTY | UNIT))");
    }

    #[test]
    fn test_verdict_conversions() {
        assert!(matches!(Verdict::from(()), Verdict::Holds(true)));
        assert!(matches!(Verdict::from(false), Verdict::Holds(false)));
        assert!(matches!(Verdict::from(unit()), Verdict::Nested(_)));
    }
}
