//! Fair product enumeration.
//!
//! [`FairProduct`] enumerates the cross product of several lazily produced
//! dimensions without exhausting any dimension first. Index vectors wait in
//! a frontier ordered by index sum (a linear extension of componentwise
//! dominance) and then by insertion order. A vector whose coordinate is not
//! buffered yet is parked on that dimension and released once the
//! dimension yields its next value. Dimensions are pulled one value at a
//! time, round-robin, whenever the frontier is empty.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use depthcheck_core::{Tag, Value};
use tracing::trace;

use crate::context::GenContext;
use crate::traits::Values;

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    rank: usize,
    seq: u64,
    index: Vec<usize>,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.rank, self.seq).cmp(&(other.rank, other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct Dimension<'a> {
    source: Option<Values<'a>>,
    buffer: Vec<Value>,
    parked: Vec<Vec<usize>>,
}

impl Dimension<'_> {
    fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }
}

/// Complete, fair enumeration of `D1 × .. × Dn`.
///
/// Every combination is yielded exactly once. Zero dimensions yield a single
/// empty tuple; any empty dimension makes the product empty.
pub struct FairProduct<'a> {
    dims: Vec<Dimension<'a>>,
    frontier: BinaryHeap<Reverse<Entry>>,
    seen: HashSet<Vec<usize>>,
    seq: u64,
    next_dim: usize,
    started: bool,
    finished: bool,
}

impl<'a> FairProduct<'a> {
    pub fn new(dimensions: Vec<Values<'a>>) -> Self {
        let dims = dimensions
            .into_iter()
            .map(|source| Dimension {
                source: Some(source),
                buffer: Vec::new(),
                parked: Vec::new(),
            })
            .collect();
        Self {
            dims,
            frontier: BinaryHeap::new(),
            seen: HashSet::new(),
            seq: 0,
            next_dim: 0,
            started: false,
            finished: false,
        }
    }

    /// Product of the values of `tags` at `depth`.
    ///
    /// Tags without a strategy contribute a single [`Value::Missing`].
    pub fn of_tags(cx: &GenContext<'a>, tags: &[Tag], depth: usize) -> Self {
        Self::new(tags.iter().map(|tag| cx.values(tag, depth)).collect())
    }

    fn push(&mut self, index: Vec<usize>) {
        let rank = index.iter().sum();
        self.seq += 1;
        self.frontier.push(Reverse(Entry {
            rank,
            seq: self.seq,
            index,
        }));
    }

    /// Pull the first value of every dimension and seed the zero vector.
    fn start(&mut self) {
        self.started = true;
        for dim in &mut self.dims {
            match dim.source.as_mut().and_then(|source| source.next()) {
                Some(value) => dim.buffer.push(value),
                None => {
                    self.finished = true;
                    return;
                }
            }
        }
        let zero = vec![0; self.dims.len()];
        self.seen.insert(zero.clone());
        self.push(zero);
    }

    /// Pull one more value from the next live dimension, round-robin.
    ///
    /// Returns false once every dimension is exhausted.
    fn advance(&mut self) -> bool {
        let n = self.dims.len();
        for _ in 0..n {
            let k = self.next_dim;
            self.next_dim = (self.next_dim + 1) % n;

            let dim = &mut self.dims[k];
            let Some(source) = dim.source.as_mut() else {
                continue;
            };
            match source.next() {
                Some(value) => {
                    dim.buffer.push(value);
                    let released = std::mem::take(&mut dim.parked);
                    trace!(dimension = k, released = released.len(), "Dimension advanced");
                    for index in released {
                        self.push(index);
                    }
                    return true;
                }
                None => {
                    trace!(dimension = k, size = dim.buffer.len(), "Dimension exhausted");
                    dim.source = None;
                    dim.parked.clear();
                }
            }
        }
        false
    }

    fn expand(&mut self, index: &[usize]) {
        for k in 0..index.len() {
            let mut next = index.to_vec();
            next[k] += 1;
            if self.seen.contains(&next) {
                continue;
            }
            let dim = &mut self.dims[k];
            if next[k] < dim.buffer.len() {
                self.seen.insert(next.clone());
                self.push(next);
            } else if !dim.is_exhausted() {
                self.seen.insert(next.clone());
                dim.parked.push(next);
            }
        }
    }
}

impl Iterator for FairProduct<'_> {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Vec<Value>> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.start();
            if self.finished {
                return None;
            }
        }
        loop {
            if let Some(Reverse(entry)) = self.frontier.pop() {
                let tuple = entry
                    .index
                    .iter()
                    .zip(&self.dims)
                    .map(|(&i, dim)| dim.buffer[i].clone())
                    .collect();
                self.expand(&entry.index);
                return Some(tuple);
            }
            if !self.advance() {
                self.finished = true;
                return None;
            }
        }
    }
}
