//! Searching a ring-buffer queue with a broken `count` for a failing
//! command sequence.

use std::fmt;
use std::sync::Mutex;

use depthcheck_checker::{check, exists_invalid, forall_valid, run, OutcomeKind, Signal};
use depthcheck_core::{CaseError, CaseResult, Object, Tag, Value};
use depthcheck_generator::Registry;
use depthcheck_model::{register_precondition_filter, Command, Model};

/// Ring buffer with one spare slot, so `capacity` items fit.
struct Ring {
    slots: Vec<i64>,
    inp: usize,
    outp: usize,
    wrapping_count: bool,
}

struct Queue(Mutex<Ring>);

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Queue")
    }
}

fn with_ring<T>(value: &Value, f: impl FnOnce(&mut Ring) -> T) -> CaseResult<T> {
    let queue = value
        .downcast_ref::<Queue>()
        .ok_or_else(|| CaseError::unrelated(format!("{} is not a queue", value)))?;
    let mut ring = queue.0.lock().map_err(CaseError::unrelated)?;
    Ok(f(&mut ring))
}

/// What the queue should contain.
#[derive(Debug, Clone, PartialEq)]
struct Expected {
    capacity: usize,
    items: Vec<i64>,
}

type QueueState = Option<Expected>;
type QueueCommand = Command<QueueState>;

fn queue_model(name: &str, wrapping_count: bool) -> Model<QueueState> {
    let handle = Tag::new("Queue");
    Model::new(name, None)
        .with_command(
            QueueCommand::declare("new", [Tag::nat()], handle.clone(), move |args| {
                let capacity = args[0].as_int().unwrap_or_default() as usize;
                let ring = Ring {
                    slots: vec![0; capacity + 1],
                    inp: 0,
                    outp: 0,
                    wrapping_count,
                };
                Ok(Value::Object(Object::new(Queue(Mutex::new(ring)))))
            })
            .with_precondition(|state, args, _| {
                Ok(state.is_none() && args[0].as_int().map_or(false, |n| n > 0))
            })
            .with_next_state(|_, args, _| {
                Some(Expected {
                    capacity: args[0].as_int().unwrap_or_default() as usize,
                    items: Vec::new(),
                })
            }),
        )
        .with_command(
            QueueCommand::declare("put", [handle.clone(), Tag::int()], Tag::unit(), |args| {
                let item = args[1].as_int().unwrap_or_default();
                with_ring(&args[0], |ring| {
                    ring.slots[ring.inp] = item;
                    ring.inp = (ring.inp + 1) % ring.slots.len();
                })?;
                Ok(Value::Unit)
            })
            .with_precondition(|state, _, _| {
                Ok(state
                    .as_ref()
                    .map_or(false, |q| q.items.len() < q.capacity))
            })
            .with_next_state(|state, args, _| {
                let mut next = state.clone();
                if let Some(q) = next.as_mut() {
                    q.items.extend(args[1].as_int());
                }
                next
            }),
        )
        .with_command(
            QueueCommand::declare("get", [handle.clone()], Tag::int(), |args| {
                let item = with_ring(&args[0], |ring| {
                    let item = ring.slots[ring.outp];
                    ring.outp = (ring.outp + 1) % ring.slots.len();
                    item
                })?;
                Ok(Value::Int(item))
            })
            .with_precondition(|state, _, _| {
                Ok(state.as_ref().map_or(false, |q| !q.items.is_empty()))
            })
            .with_postcondition(|state, _, result, log| {
                let front = state.as_ref().and_then(|q| q.items.first().copied());
                log.assert_eq(result.as_int(), front)?;
                Ok(true)
            })
            .with_next_state(|state, _, _| {
                let mut next = state.clone();
                if let Some(q) = next.as_mut() {
                    q.items.remove(0);
                }
                next
            }),
        )
        .with_command(
            QueueCommand::declare("count", [handle], Tag::int(), |args| {
                let count = with_ring(&args[0], |ring| {
                    if ring.wrapping_count {
                        ((ring.inp + ring.slots.len() - ring.outp) % ring.slots.len()) as i64
                    } else {
                        ring.inp as i64 - ring.outp as i64
                    }
                })?;
                Ok(Value::Int(count))
            })
            .with_precondition(|state, _, _| Ok(state.is_some()))
            .with_postcondition(|state, _, result, log| {
                let len = state.as_ref().map(|q| q.items.len() as i64);
                log.assert_eq(result.as_int(), len)?;
                Ok(true)
            }),
        )
}

fn registry_with(model: Model<QueueState>) -> (Registry, Tag) {
    let mut registry = Registry::new();
    let tag = model.register(&mut registry).tag();
    (registry, tag)
}

#[test]
fn test_exists_invalid_finds_minimal_witness() {
    let (registry, tag) = registry_with(queue_model("Queue", false));
    let outcome = check(&registry, &exists_invalid(tag).named("prop_queue"), 6);

    assert!(outcome.is_success());
    assert_eq!(outcome.path, "prop_queue.EXISTS(Commands<Queue>)");
    let witness = match &outcome.kind {
        OutcomeKind::Witness { binding } => binding.value.to_string(),
        other => panic!("expected a witness, got {:?}", other),
    };
    assert_eq!(witness, "a = new(1); put(a, 0); get(a); put(a, 0); count(a)");
}

#[test]
fn test_forall_valid_reports_failed_postcondition() {
    let (registry, tag) = registry_with(queue_model("Queue", false));
    let outcome = check(&registry, &forall_valid(tag), 5);

    match &outcome.kind {
        OutcomeKind::AssertionCounter { binding, message } => {
            assert_eq!(
                binding.value.to_string(),
                "a = new(1); put(a, 0); get(a); put(a, 0); count(a)"
            );
            assert_eq!(message, "step 4 count(a): postcondition: Some(-1) != Some(1)");
        }
        other => panic!("expected an assertion counterexample, got {:?}", other),
    }
    // get(a) checked its result before count failed.
    assert_eq!(
        outcome.assertions,
        vec![
            "Some(0) == Some(0)".to_string(),
            "step 4 count(a): postcondition: Some(-1) != Some(1)".to_string(),
        ]
    );
}

#[test]
fn test_fixed_queue_holds() {
    let (registry, tag) = registry_with(queue_model("FixedQueue", true));
    let outcome = check(&registry, &forall_valid(tag), 4);
    assert!(matches!(outcome.kind, OutcomeKind::NoCounter));
    assert!(outcome.cases > 1);
}

#[test]
fn test_signals_count_every_sequence() {
    let (registry, tag) = registry_with(queue_model("FixedQueue", true));
    let signals: Vec<Signal> = run(&registry, &forall_valid(tag), 3).collect();

    let steps = signals
        .iter()
        .filter(|s| matches!(s, Signal::Step { .. }))
        .count() as u64;
    let Some(Signal::Finished(outcome)) = signals.last() else {
        panic!("run did not finish");
    };
    assert_eq!(outcome.cases, steps);
    assert_eq!(outcome.stats.map(|s| s.steps), Some(steps));
}

#[test]
fn test_precondition_filter_counts_rejections() {
    let model = queue_model("UnfilteredQueue", true).with_prefix_filter(false);
    let (mut registry, tag) = registry_with(model);
    let filtered = register_precondition_filter(&mut registry, tag);

    let outcome = check(&registry, &forall_valid(filtered), 3);
    assert!(matches!(outcome.kind, OutcomeKind::NoCounter));
    let stats = outcome.stats.unwrap_or_default();
    assert!(stats.failed_implications > 0);
    assert_eq!(stats.depth, 3);
}
