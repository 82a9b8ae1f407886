//! Type tags.
//!
//! A [`Tag`] names the shape a strategy produces. Primitive tags have no
//! arguments (`Int`, `Bool`); parametric tags apply a constructor to tag
//! arguments (`List<Int>`, `Tuple<Int, Str>`). Equal tags always resolve to
//! the same strategy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known constructor names for the built-in strategies.
pub mod names {
    pub const INT: &str = "Int";
    pub const NAT: &str = "Nat";
    pub const NEG: &str = "Neg";
    pub const STR: &str = "Str";
    pub const BOOL: &str = "Bool";
    pub const UNIT: &str = "Unit";
    pub const LIST: &str = "List";
    pub const SET: &str = "Set";
    pub const PERMUTATIONS: &str = "Permutations";
    pub const TUPLE: &str = "Tuple";
    pub const UNION: &str = "Union";
    pub const COMMANDS: &str = "Commands";

    /// Name of the fixed-width word tag with the given bit count.
    pub fn word(bits: u32) -> String {
        format!("Word{}", bits)
    }
}

/// Identifier of a generated shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    args: Vec<Tag>,
}

impl Tag {
    /// A tag with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A constructor applied to tag arguments.
    pub fn app(name: impl Into<String>, args: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn int() -> Self {
        Self::new(names::INT)
    }

    pub fn nat() -> Self {
        Self::new(names::NAT)
    }

    /// Non-positive integers `0, -1, -2, ..`.
    pub fn neg() -> Self {
        Self::new(names::NEG)
    }

    pub fn string() -> Self {
        Self::new(names::STR)
    }

    pub fn bool() -> Self {
        Self::new(names::BOOL)
    }

    pub fn unit() -> Self {
        Self::new(names::UNIT)
    }

    /// Unsigned word of `bits` bits (`Word2`, `Word4`, `Word8`).
    pub fn word(bits: u32) -> Self {
        Self::new(names::word(bits))
    }

    pub fn list(elem: Tag) -> Self {
        Self::app(names::LIST, [elem])
    }

    pub fn set(elem: Tag) -> Self {
        Self::app(names::SET, [elem])
    }

    /// Ordered arrangements of distinct `elem` values.
    pub fn permutations(elem: Tag) -> Self {
        Self::app(names::PERMUTATIONS, [elem])
    }

    pub fn tuple(elems: impl IntoIterator<Item = Tag>) -> Self {
        Self::app(names::TUPLE, elems)
    }

    pub fn union(variants: impl IntoIterator<Item = Tag>) -> Self {
        Self::app(names::UNION, variants)
    }

    /// Tag of the command sequences generated for the named model.
    pub fn commands(model: impl Into<String>) -> Self {
        Self::app(names::COMMANDS, [Tag::new(model)])
    }

    /// Constructor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag arguments, empty for primitive tags.
    pub fn args(&self) -> &[Tag] {
        &self.args
    }

    /// Returns true if the tag applies a constructor to arguments.
    pub fn is_parametric(&self) -> bool {
        !self.args.is_empty()
    }

    /// The bare constructor of this tag, without arguments.
    pub fn constructor(&self) -> Tag {
        Tag::new(self.name.clone())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}
