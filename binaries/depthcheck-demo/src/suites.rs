//! Bundled property suites.
//!
//! Several properties fail on purpose so the runner has something to report.

use std::fmt;
use std::sync::Mutex;

use depthcheck_checker::{
    exists, exists_invalid, exists_of, forall, forall_of, forall_valid, PropertySet,
};
use depthcheck_core::{CaseError, CaseResult, Object, Tag, Value};
use depthcheck_generator::Registry;
use depthcheck_model::{register_precondition_filter, Command, Model};

fn is_sorted(xs: &[i64]) -> bool {
    xs.windows(2).all(|pair| pair[0] <= pair[1])
}

fn int_list(value: &Value) -> Vec<i64> {
    value
        .as_list()
        .map(|items| items.iter().filter_map(Value::as_int).collect())
        .unwrap_or_default()
}

fn lists(registry: &mut Registry) -> PropertySet {
    let sorted = registry.implies("sorted", Tag::list(Tag::int()), |value| {
        is_sorted(&int_list(value))
    });

    PropertySet::new("lists")
        .with_property(
            "prop_sorted_pair",
            exists_of::<Vec<i64>, _, _>(|log, xs| {
                log.assert_true(is_sorted(&xs), &format!("is_sorted({:?})", xs))?;
                Ok(xs.len() == 2)
            }),
        )
        .with_property(
            "prop_contains_2",
            exists(Tag::list(Tag::int()), |_, xs| Ok(int_list(xs).contains(&2))),
        )
        .with_property(
            "prop_sorted_implied",
            forall(sorted, |log, xs| {
                let xs = int_list(xs);
                log.assert_true(is_sorted(&xs), &format!("is_sorted({:?})", xs))?;
                Ok(())
            }),
        )
        .with_property(
            "prop_sorted_reversed",
            forall_of::<Vec<i64>, _, _>(|log, xs| {
                let reversed: Vec<i64> = xs.into_iter().rev().collect();
                log.assert_true(is_sorted(&reversed), &format!("is_sorted({:?})", reversed))?;
                Ok(())
            }),
        )
}

fn quantifiers(registry: &mut Registry) -> PropertySet {
    let evens = registry.map("Even", Tag::nat(), |_, value| {
        value.as_int().map(|n| vec![Value::Int(2 * n)]).unwrap_or_default()
    });

    PropertySet::new("quantifiers")
        .with_property(
            "prop_not_three",
            exists_of::<i64, _, _>(|log, i| {
                log.assert_ne(i, 3)?;
                Ok(())
            }),
        )
        .with_property(
            "prop_evens",
            forall(evens, |log, n| {
                log.assert_eq(n.as_int().map(|n| n % 2), Some(0))?;
                Ok(())
            }),
        )
        .with_property(
            "prop_inverse",
            forall_of::<i64, _, _>(|_, x| Ok(exists_of::<i64, _, _>(move |_, y| Ok(x + y == 0)))),
        )
        .with_property(
            "prop_short_circuit",
            forall_of::<i64, _, _>(|_, x| Ok(x != 3)) & exists_of::<bool, _, _>(|_, b| Ok(b)),
        )
        .with_property(
            "prop_all_equal",
            forall_of::<i64, _, _>(|_, i| {
                Ok(forall_of::<i64, _, _>(move |log, j| {
                    log.assert_eq(i, j)?;
                    Ok(())
                }))
            }),
        )
}

/// A list whose `pop` takes from the wrong end.
struct MyList(Mutex<Vec<i64>>);

impl fmt::Display for MyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MyList")
    }
}

fn my_list(value: &Value) -> CaseResult<&MyList> {
    value
        .downcast_ref::<MyList>()
        .ok_or_else(|| CaseError::unrelated(format!("{} is not a list", value)))
}

type ListState = Option<Vec<i64>>;
type ListCommand = Command<ListState>;

fn list_model() -> Model<ListState> {
    let handle = Tag::new("MyList");
    Model::new("MyModel", None)
        .with_command(
            ListCommand::declare("new", [], handle.clone(), |_| {
                Ok(Value::Object(Object::new(MyList(Mutex::new(Vec::new())))))
            })
            .with_precondition(|state, _, log| {
                log.assert_true(state.is_none(), "state is None")?;
                Ok(true)
            })
            .with_next_state(|_, _, _| Some(Vec::new())),
        )
        .with_command(
            ListCommand::declare("append", [handle.clone(), Tag::int()], Tag::unit(), |args| {
                let list = my_list(&args[0])?;
                list.0
                    .lock()
                    .map_err(CaseError::unrelated)?
                    .extend(args[1].as_int());
                Ok(Value::Unit)
            })
            .with_precondition(|state, _, _| Ok(state.is_some()))
            .with_next_state(|state, args, _| {
                let mut next = state.clone();
                if let Some(items) = next.as_mut() {
                    items.extend(args[1].as_int());
                }
                next
            }),
        )
        .with_command(
            ListCommand::declare("pop", [handle], Tag::int(), |args| {
                let list = my_list(&args[0])?;
                let popped = list.0.lock().map_err(CaseError::unrelated)?.pop();
                Ok(popped.map(Value::Int).unwrap_or(Value::Unit))
            })
            .with_precondition(|state, _, log| {
                log.assert_true(state.as_ref().map_or(false, |s| !s.is_empty()), "state is non-empty")?;
                Ok(true)
            })
            .with_postcondition(|state, _, result, log| {
                let front = state.as_ref().and_then(|s| s.first().copied());
                log.assert_eq(result.as_int(), front)?;
                Ok(true)
            })
            .with_next_state(|state, _, _| {
                let mut next = state.clone();
                if let Some(items) = next.as_mut() {
                    if !items.is_empty() {
                        items.remove(0);
                    }
                }
                next
            }),
        )
        // Prune through the implication filter instead of during generation.
        .with_prefix_filter(false)
}

fn model(registry: &mut Registry) -> PropertySet {
    let commands = list_model().register(registry).tag();
    let valid = register_precondition_filter(registry, commands.clone());

    PropertySet::new("model")
        .with_property("prop_model_breaks", exists_invalid(valid.clone()))
        .with_property("prop_model", forall_valid(valid))
}

/// Register the strategies every suite needs and build the suites.
pub fn all(registry: &mut Registry) -> Vec<PropertySet> {
    vec![lists(registry), quantifiers(registry), model(registry)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthcheck_checker::{CheckConfig, OutcomeKind};

    fn run_suite(name: &str, depth: usize) -> depthcheck_checker::SuiteReport {
        let mut registry = Registry::new();
        let suites = all(&mut registry);
        let suite = suites
            .iter()
            .find(|s| s.name() == name)
            .unwrap_or_else(|| panic!("no suite {}", name));
        let config = CheckConfig::default().with_depth(depth).with_fail_fast(false);
        suite.run(&registry, &config)
    }

    #[test]
    fn test_suite_names() {
        let mut registry = Registry::new();
        let names: Vec<String> = all(&mut registry).iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["lists", "quantifiers", "model"]);
    }

    #[test]
    fn test_lists_suite() {
        let report = run_suite("lists", 3);
        let witness = report
            .outcome("prop_sorted_pair")
            .and_then(|o| o.binding())
            .map(|b| b.value.to_string());
        assert_eq!(witness.as_deref(), Some("[0, 0]"));
        assert!(report.outcome("prop_contains_2").is_some_and(|o| o.is_success()));

        let implied = report.outcome("prop_sorted_implied").and_then(|o| o.stats);
        assert!(implied.is_some_and(|s| s.failed_implications > 0));

        let reversed = report.outcome("prop_sorted_reversed").map(|o| &o.kind);
        assert!(matches!(reversed, Some(OutcomeKind::AssertionCounter { .. })));
    }

    #[test]
    fn test_quantifiers_suite() {
        let report = run_suite("quantifiers", 3);
        let passed: Vec<&str> = report
            .results
            .iter()
            .filter(|r| r.outcome.is_success())
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(passed, vec!["prop_not_three", "prop_evens", "prop_inverse"]);

        let nested = report.outcome("prop_all_equal");
        assert!(nested.is_some_and(|o| o.child.is_some()));
    }

    #[test]
    fn test_model_suite_finds_pop_bug() {
        let report = run_suite("model", 4);
        let witness = report
            .outcome("prop_model_breaks")
            .and_then(|o| o.binding())
            .map(|b| b.value.to_string());
        assert_eq!(
            witness.as_deref(),
            Some("a = new(); append(a, 0); append(a, 1); pop(a)")
        );
        let counter = report.outcome("prop_model").map(|o| &o.kind);
        assert!(matches!(counter, Some(OutcomeKind::AssertionCounter { .. })));
    }
}
