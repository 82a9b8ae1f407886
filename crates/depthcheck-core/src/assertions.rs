//! Per-case assertion log.
//!
//! Every predicate and model hook receives an [`Assertions`] scope. Passing
//! checks append a success message, failing checks return an
//! [`AssertionFailure`] that the caller propagates with `?`. The engine opens
//! a fresh scope for each case and merges a nested clause's scope into its
//! parent only once that clause completes.

use std::fmt::Debug;

use crate::error::AssertionFailure;

/// Ordered log of the assertions made while evaluating one case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assertions {
    log: Vec<String>,
}

impl Assertions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn into_log(self) -> Vec<String> {
        self.log
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Append a message without checking anything.
    pub fn note(&mut self, message: impl Into<String>) {
        self.log.push(message.into());
    }

    /// Append a completed child scope.
    pub fn merge(&mut self, child: Assertions) {
        self.log.extend(child.log);
    }

    /// Append raw messages from a completed child.
    pub fn extend(&mut self, messages: impl IntoIterator<Item = String>) {
        self.log.extend(messages);
    }

    /// Record `success` if `cond` holds, otherwise fail with `failure`.
    pub fn check(
        &mut self,
        cond: bool,
        success: impl Into<String>,
        failure: impl Into<String>,
    ) -> Result<(), AssertionFailure> {
        if cond {
            self.log.push(success.into());
            Ok(())
        } else {
            Err(AssertionFailure::new(failure))
        }
    }

    pub fn assert_true(&mut self, cond: bool, what: &str) -> Result<(), AssertionFailure> {
        self.check(cond, format!("{} is true", what), format!("{} is false", what))
    }

    pub fn assert_false(&mut self, cond: bool, what: &str) -> Result<(), AssertionFailure> {
        self.check(!cond, format!("{} is false", what), format!("{} is true", what))
    }

    pub fn assert_eq<T: PartialEq + Debug>(
        &mut self,
        left: T,
        right: T,
    ) -> Result<(), AssertionFailure> {
        let eq = left == right;
        self.check(
            eq,
            format!("{:?} == {:?}", left, right),
            format!("{:?} != {:?}", left, right),
        )
    }

    pub fn assert_ne<T: PartialEq + Debug>(
        &mut self,
        left: T,
        right: T,
    ) -> Result<(), AssertionFailure> {
        let ne = left != right;
        self.check(
            ne,
            format!("{:?} != {:?}", left, right),
            format!("{:?} == {:?}", left, right),
        )
    }

    pub fn assert_lt<T: PartialOrd + Debug>(
        &mut self,
        left: T,
        right: T,
    ) -> Result<(), AssertionFailure> {
        let lt = left < right;
        self.check(
            lt,
            format!("{:?} < {:?}", left, right),
            format!("{:?} >= {:?}", left, right),
        )
    }

    pub fn assert_le<T: PartialOrd + Debug>(
        &mut self,
        left: T,
        right: T,
    ) -> Result<(), AssertionFailure> {
        let le = left <= right;
        self.check(
            le,
            format!("{:?} <= {:?}", left, right),
            format!("{:?} > {:?}", left, right),
        )
    }

    pub fn assert_contains<T: PartialEq + Debug>(
        &mut self,
        haystack: &[T],
        needle: &T,
    ) -> Result<(), AssertionFailure> {
        self.check(
            haystack.contains(needle),
            format!("{:?} in {:?}", needle, haystack),
            format!("{:?} not in {:?}", needle, haystack),
        )
    }

    pub fn assert_some<T: Debug>(
        &mut self,
        value: &Option<T>,
        what: &str,
    ) -> Result<(), AssertionFailure> {
        self.check(
            value.is_some(),
            format!("{} is {:?}", what, value),
            format!("{} is None", what),
        )
    }

    /// Fail unconditionally.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), AssertionFailure> {
        Err(AssertionFailure::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_messages_are_logged() {
        let mut scope = Assertions::new();
        scope.assert_eq(2, 2).unwrap();
        scope.assert_lt(1, 2).unwrap();
        scope.assert_true(true, "ready").unwrap();
        assert_eq!(scope.log(), &["2 == 2", "1 < 2", "ready is true"]);
    }

    #[test]
    fn test_failure_is_not_logged() {
        let mut scope = Assertions::new();
        let err = scope.assert_eq("a", "b").unwrap_err();
        assert_eq!(err.message, r#""a" != "b""#);
        assert!(scope.is_empty());
    }

    #[test]
    fn test_merge_appends_child() {
        let mut parent = Assertions::new();
        parent.note("outer");
        let mut child = Assertions::new();
        child.assert_contains(&[1, 2, 3], &2).unwrap();
        parent.merge(child);
        assert_eq!(parent.into_log(), vec!["outer", "2 in [1, 2, 3]"]);
    }
}
