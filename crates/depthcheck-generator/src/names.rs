//! Binding-name supply.
//!
//! Names come from the label sequence of the string strategy:
//! `a, b, .., z, aa, ab, ..`. The sequence never runs out and label `i`
//! does not depend on the generation depth.

/// The `index`-th label of the sequence `a, b, .., z, aa, ab, ..`.
pub fn alpha_label(index: usize) -> String {
    let mut letters = Vec::new();
    let mut rest = index;
    loop {
        letters.push(char::from(b'a' + (rest % 26) as u8));
        if rest < 26 {
            break;
        }
        rest = rest / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Produces fresh binding names in label order.
#[derive(Debug, Clone, Default)]
pub struct NameSupply {
    next: usize,
}

impl NameSupply {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next unused name.
    pub fn fresh(&mut self) -> String {
        let name = alpha_label(self.next);
        self.next += 1;
        name
    }
}
