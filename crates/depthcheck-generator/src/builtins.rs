//! Built-in strategies for primitive and container tags
//!
//! | tag | values at depth `d` |
//! |-----|---------------------|
//! | `Int` | `0, 1, -1, .., d, -d` |
//! | `Nat` | `0, 1, .., d` |
//! | `Neg` | `0, -1, .., -d` |
//! | `Word2`/`Word4`/`Word8` | `0 .. min(d, 2^bits)` |
//! | `Str` | the first `d + 1` binding labels |
//! | `Bool` | `false, true` |
//! | `Unit` | `()` |
//! | `List<T>` | `[]`, then round-robin over `x` of `[x] ++ List<T>(d - 1)` |
//! | `Set<T>` | combinations of distinct elements, sizes `0..=d` |
//! | `Permutations<T>` | arrangements of distinct elements, sizes `0..=d` |
//! | `Tuple<..>` | fair product of the components |
//! | `Union<..>` | round-robin over the variants |

use std::iter;

use depthcheck_core::tag::names;
use depthcheck_core::{Tag, Value};
use itertools::Itertools;

use crate::combinators::{deferred, Interleave};
use crate::context::GenContext;
use crate::names::alpha_label;
use crate::product::FairProduct;
use crate::registry::Registry;
use crate::traits::{Strategy, Values};

/// Register every built-in strategy under its constructor name.
pub fn register_defaults(registry: &mut Registry) {
    registry.register(Tag::int(), IntStrategy);
    registry.register(Tag::nat(), NatStrategy);
    registry.register(Tag::neg(), NegStrategy);
    registry.register(Tag::string(), StrStrategy);
    registry.register(Tag::bool(), BoolStrategy);
    registry.register(Tag::unit(), UnitStrategy);
    for bits in [2, 4, 8] {
        registry.register(Tag::word(bits), WordStrategy::new(bits));
    }
    registry.register(Tag::new(names::LIST), ListStrategy);
    registry.register(Tag::new(names::SET), SetStrategy);
    registry.register(Tag::new(names::PERMUTATIONS), PermutationsStrategy);
    registry.register(Tag::new(names::TUPLE), TupleStrategy);
    registry.register(Tag::new(names::UNION), UnionStrategy);
}

fn depth_i64(depth: usize) -> i64 {
    i64::try_from(depth).unwrap_or(i64::MAX)
}

/// Signed integers by increasing magnitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntStrategy;

impl Strategy for IntStrategy {
    fn name(&self) -> &str {
        names::INT
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        let magnitudes = (1..=depth_i64(depth)).flat_map(|i| [i, -i]);
        Box::new(iter::once(0).chain(magnitudes).map(Value::Int))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NatStrategy;

impl Strategy for NatStrategy {
    fn name(&self) -> &str {
        names::NAT
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        Box::new((0..=depth_i64(depth)).map(Value::Int))
    }
}

/// Mirror image of `Nat`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NegStrategy;

impl Strategy for NegStrategy {
    fn name(&self) -> &str {
        names::NEG
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        Box::new((0..=depth_i64(depth)).map(|i| Value::Int(-i)))
    }
}

/// Unsigned words of a fixed bit width. Empty at depth zero.
#[derive(Debug, Clone)]
pub struct WordStrategy {
    name: String,
    bits: u32,
}

impl WordStrategy {
    pub fn new(bits: u32) -> Self {
        Self {
            name: names::word(bits),
            bits,
        }
    }
}

impl Strategy for WordStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        let limit = 1i64.checked_shl(self.bits).unwrap_or(i64::MAX);
        Box::new((0..depth_i64(depth).min(limit)).map(Value::Int))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrStrategy;

impl Strategy for StrStrategy {
    fn name(&self) -> &str {
        names::STR
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        Box::new((0..=depth).map(|i| Value::Str(alpha_label(i))))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolStrategy;

impl Strategy for BoolStrategy {
    fn name(&self) -> &str {
        names::BOOL
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, _depth: usize, _args: &[Tag]) -> Values<'a> {
        Box::new([false, true].into_iter().map(Value::Bool))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnitStrategy;

impl Strategy for UnitStrategy {
    fn name(&self) -> &str {
        names::UNIT
    }

    fn generate<'a>(&self, _cx: &GenContext<'a>, _depth: usize, _args: &[Tag]) -> Values<'a> {
        Box::new(iter::once(Value::Unit))
    }
}

/// Lists of at most `depth` elements drawn from the element tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListStrategy;

impl Strategy for ListStrategy {
    fn name(&self) -> &str {
        names::LIST
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let Some(elem) = args.first().cloned() else {
            return Box::new(iter::empty());
        };
        let empty = iter::once(Value::List(Vec::new()));
        if depth == 0 {
            return Box::new(empty);
        }

        let cx = cx.clone();
        let longer = deferred(move || {
            let tail_tag = Tag::list(elem.clone());
            let streams: Vec<Values<'a>> = cx
                .values(&elem, depth)
                .map(|head| {
                    let tails = cx.values(&tail_tag, depth - 1);
                    Box::new(tails.map(move |tail| prepend(&head, tail))) as Values<'a>
                })
                .collect();
            Box::new(Interleave::new(streams))
        });
        Box::new(empty.chain(longer))
    }
}

fn prepend(head: &Value, tail: Value) -> Value {
    let mut items = vec![head.clone()];
    if let Value::List(rest) = tail {
        items.extend(rest);
    }
    Value::List(items)
}

/// Sets of at most `depth` distinct elements, smallest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetStrategy;

impl Strategy for SetStrategy {
    fn name(&self) -> &str {
        names::SET
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let Some(elem) = args.first().cloned() else {
            return Box::new(iter::empty());
        };
        let cx = cx.clone();
        deferred(move || {
            let elements = distinct(&cx, &elem, depth);
            let largest = depth.min(elements.len());
            Box::new(
                (0..=largest)
                    .flat_map(move |size| elements.clone().into_iter().combinations(size))
                    .map(Value::Set),
            )
        })
    }
}

fn distinct(cx: &GenContext<'_>, elem: &Tag, depth: usize) -> Vec<Value> {
    let mut elements: Vec<Value> = Vec::new();
    for value in cx.values(elem, depth) {
        if !elements.contains(&value) {
            elements.push(value);
        }
    }
    elements
}

/// Lists of at most `depth` distinct elements, in every order.
///
/// Shorter arrangements come first; within a size the order follows the
/// positions of the elements in the element tag's sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermutationsStrategy;

impl Strategy for PermutationsStrategy {
    fn name(&self) -> &str {
        names::PERMUTATIONS
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let Some(elem) = args.first().cloned() else {
            return Box::new(iter::empty());
        };
        let cx = cx.clone();
        deferred(move || {
            let elements = distinct(&cx, &elem, depth);
            let largest = depth.min(elements.len());
            Box::new(
                (0..=largest)
                    .flat_map(move |size| elements.clone().into_iter().permutations(size))
                    .map(Value::List),
            )
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TupleStrategy;

impl Strategy for TupleStrategy {
    fn name(&self) -> &str {
        names::TUPLE
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let cx = cx.clone();
        let components = args.to_vec();
        deferred(move || {
            Box::new(FairProduct::of_tags(&cx, &components, depth).map(Value::Tuple))
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnionStrategy;

impl Strategy for UnionStrategy {
    fn name(&self) -> &str {
        names::UNION
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, args: &[Tag]) -> Values<'a> {
        let streams: Vec<Values<'a>> = args.iter().map(|tag| cx.values(tag, depth)).collect();
        Box::new(Interleave::new(streams))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int).collect()
    }

    fn list(values: &[i64]) -> Value {
        Value::List(ints(values))
    }

    fn is_subsequence(small: &[Value], large: &[Value]) -> bool {
        let mut rest = large.iter();
        small.iter().all(|x| rest.any(|y| y == x))
    }

    #[test]
    fn test_int_order() {
        let registry = Registry::new();
        assert_eq!(registry.generate(&Tag::int(), 0), ints(&[0]));
        assert_eq!(registry.generate(&Tag::int(), 2), ints(&[0, 1, -1, 2, -2]));
    }

    #[test]
    fn test_scalars() {
        let registry = Registry::new();
        assert_eq!(registry.generate(&Tag::nat(), 3), ints(&[0, 1, 2, 3]));
        assert_eq!(registry.generate(&Tag::bool(), 0), vec![Value::Bool(false), Value::Bool(true)]);
        assert_eq!(registry.generate(&Tag::unit(), 4), vec![Value::Unit]);
        assert_eq!(
            registry.generate(&Tag::string(), 2),
            vec![Value::Str("a".into()), Value::Str("b".into()), Value::Str("c".into())]
        );
    }

    #[test]
    fn test_words() {
        let registry = Registry::new();
        assert!(registry.generate(&Tag::word(2), 0).is_empty());
        assert_eq!(registry.generate(&Tag::word(2), 1), ints(&[0]));
        assert_eq!(registry.generate(&Tag::word(2), 4), ints(&[0, 1, 2, 3]));
        assert_eq!(registry.generate(&Tag::word(2), 9), ints(&[0, 1, 2, 3]));
        assert_eq!(registry.generate(&Tag::word(8), 5).len(), 5);
    }

    #[test]
    fn test_list_of_int() {
        let registry = Registry::new();
        let tag = Tag::list(Tag::int());
        assert_eq!(registry.generate(&tag, 0), vec![list(&[])]);
        assert_eq!(
            registry.generate(&tag, 1),
            vec![list(&[]), list(&[0]), list(&[1]), list(&[-1])]
        );

        let two = registry.generate(&tag, 2);
        assert_eq!(&two[..6], &[list(&[]), list(&[0]), list(&[1]), list(&[-1]), list(&[2]), list(&[-2])]);
        assert_eq!(two[6], list(&[0, 0]));
        // 1 + 5 * (1 + 3)
        assert_eq!(two.len(), 21);
    }

    #[test]
    fn test_set_of_bool() {
        let registry = Registry::new();
        let sets = registry.generate(&Tag::set(Tag::bool()), 3);
        assert_eq!(
            sets,
            vec![
                Value::Set(vec![]),
                Value::Set(vec![Value::Bool(false)]),
                Value::Set(vec![Value::Bool(true)]),
                Value::Set(vec![Value::Bool(false), Value::Bool(true)]),
            ]
        );
    }

    #[test]
    fn test_neg() {
        let registry = Registry::new();
        assert_eq!(registry.generate(&Tag::neg(), 0), ints(&[0]));
        assert_eq!(registry.generate(&Tag::neg(), 1), ints(&[0, -1]));
        assert_eq!(registry.generate(&Tag::neg(), 2), ints(&[0, -1, -2]));
    }

    #[test]
    fn test_permutations() {
        let registry = Registry::new();
        let tag = Tag::permutations(Tag::bool());
        let (f, t) = (Value::Bool(false), Value::Bool(true));
        assert_eq!(registry.generate(&tag, 0), vec![Value::List(vec![])]);
        assert_eq!(
            registry.generate(&tag, 1),
            vec![Value::List(vec![]), Value::List(vec![f.clone()]), Value::List(vec![t.clone()])]
        );
        assert_eq!(
            registry.generate(&tag, 2),
            vec![
                Value::List(vec![]),
                Value::List(vec![f.clone()]),
                Value::List(vec![t.clone()]),
                Value::List(vec![f.clone(), t.clone()]),
                Value::List(vec![t, f]),
            ]
        );

        let ints = registry.generate(&Tag::permutations(Tag::int()), 2);
        // 1 + 5 + 5 * 4
        assert_eq!(ints.len(), 26);
        assert_eq!(ints[6], list(&[0, 1]));
        assert_eq!(ints[10], list(&[1, 0]));
    }

    #[test]
    fn test_tuple_and_union() {
        let registry = Registry::new();
        let tuples = registry.generate(&Tag::tuple([Tag::bool(), Tag::int()]), 1);
        assert_eq!(tuples.len(), 6);
        assert_eq!(tuples[0], Value::Tuple(vec![Value::Bool(false), Value::Int(0)]));

        let union = registry.generate(&Tag::union([Tag::bool(), Tag::nat()]), 2);
        assert_eq!(
            union,
            vec![
                Value::Bool(false),
                Value::Int(0),
                Value::Bool(true),
                Value::Int(1),
                Value::Int(2),
            ]
        );
    }

    #[test]
    fn test_monotonic_in_depth() {
        let registry = Registry::new();
        let tags = [
            Tag::int(),
            Tag::string(),
            Tag::word(4),
            Tag::list(Tag::bool()),
            Tag::list(Tag::list(Tag::nat())),
            Tag::set(Tag::int()),
            Tag::neg(),
            Tag::permutations(Tag::int()),
            Tag::union([Tag::int(), Tag::list(Tag::unit())]),
            Tag::tuple([Tag::int(), Tag::bool()]),
            Tag::tuple([Tag::list(Tag::bool()), Tag::string(), Tag::word(2)]),
            Tag::tuple([Tag::set(Tag::nat()), Tag::word(2)]),
        ];
        for tag in &tags {
            for depth in 0..3 {
                let small = registry.generate(tag, depth);
                let large = registry.generate(tag, depth + 1);
                assert!(
                    is_subsequence(&small, &large),
                    "{} at depth {} is not contained in depth {}",
                    tag,
                    depth,
                    depth + 1
                );
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let registry = Registry::new();
        let tag = Tag::tuple([Tag::list(Tag::int()), Tag::string()]);
        assert_eq!(registry.generate(&tag, 2), registry.generate(&tag, 2));
    }
}
