//! Registry behaviour through the public API.

use std::iter;

use depthcheck_generator::{GenContext, Registry, Strategy, Tag, Value, Values};

/// `Twice<T>`: every value of `T` as a pair with itself.
struct Twice;

impl Strategy for Twice {
    fn name(&self) -> &str {
        "Twice"
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let Some(inner) = args.first() else {
            return Box::new(iter::empty());
        };
        Box::new(
            cx.values(inner, depth)
                .map(|value| Value::Tuple(vec![value.clone(), value])),
        )
    }
}

fn render(values: &[Value]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[test]
fn test_builtin_orders() {
    let registry = Registry::new();
    assert_eq!(
        registry.generate(&Tag::int(), 2),
        vec![Value::Int(0), Value::Int(1), Value::Int(-1), Value::Int(2), Value::Int(-2)]
    );
    assert_eq!(
        render(&registry.generate(&Tag::list(Tag::int()), 1)),
        vec!["[]", "[0]", "[1]", "[-1]"]
    );
}

#[test]
fn test_user_constructor_is_derived() {
    let mut registry = Registry::new();
    registry.register(Tag::new("Twice"), Twice);

    let tag = Tag::app("Twice", [Tag::bool()]);
    assert!(registry.lookup(&tag).is_some());
    assert_eq!(
        render(&registry.generate(&tag, 3)),
        vec!["(false, false)", "(true, true)"]
    );

    // Nested derivation goes through List<Twice<Bool>>.
    let nested = Tag::list(tag);
    assert_eq!(registry.generate(&nested, 1).len(), 3);
}

#[test]
fn test_unresolved_argument_yields_missing() {
    let mut registry = Registry::new();
    registry.register(Tag::new("Twice"), Twice);

    let tag = Tag::app("Twice", [Tag::new("Socket")]);
    assert!(registry.lookup(&tag).is_none());
    assert_eq!(registry.generate(&tag, 3), vec![Value::Missing]);
}
