//! Strategy combinators
//!
//! - [`Interleave`]: round-robin over several value streams
//! - [`deferred`]: postpone building a stream until its first value is pulled
//! - [`MapStrategy`]: flat-map a function over another tag's values
//! - [`ImpliesStrategy`]: keep only values satisfying a predicate

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::vec;

use depthcheck_core::{Tag, Value};
use tracing::trace;

use crate::context::GenContext;
use crate::traits::{Strategy, Values};

/// Round-robin over several streams, dropping each one as it runs dry.
pub struct Interleave<'a> {
    streams: VecDeque<Values<'a>>,
}

impl<'a> Interleave<'a> {
    pub fn new(streams: impl IntoIterator<Item = Values<'a>>) -> Self {
        Self {
            streams: streams.into_iter().collect(),
        }
    }
}

impl Iterator for Interleave<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        while let Some(mut stream) = self.streams.pop_front() {
            if let Some(value) = stream.next() {
                self.streams.push_back(stream);
                return Some(value);
            }
        }
        None
    }
}

struct Deferred<'a, F> {
    init: Option<F>,
    inner: Option<Values<'a>>,
}

impl<'a, F: FnOnce() -> Values<'a>> Iterator for Deferred<'a, F> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if let Some(init) = self.init.take() {
            self.inner = Some(init());
        }
        self.inner.as_mut()?.next()
    }
}

/// Build the stream only when its first value is requested.
///
/// Recursive strategies use this so that constructing an iterator does not
/// construct the whole tree of sub-iterators beneath it.
pub fn deferred<'a, F>(init: F) -> Values<'a>
where
    F: FnOnce() -> Values<'a> + 'a,
{
    Box::new(Deferred {
        init: Some(init),
        inner: None,
    })
}

type MapFn = dyn Fn(usize, &Value) -> Vec<Value> + Send + Sync;

/// Values obtained by applying a function to every value of a source tag.
///
/// Each source value expands to zero or more values; the expansions are
/// interleaved round-robin with one output per source value pulled.
pub struct MapStrategy {
    name: String,
    source: Tag,
    f: Arc<MapFn>,
}

impl MapStrategy {
    pub fn new<F>(name: impl Into<String>, source: Tag, f: F) -> Self
    where
        F: Fn(usize, &Value) -> Vec<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            source,
            f: Arc::new(f),
        }
    }
}

impl fmt::Debug for MapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapStrategy")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

impl Strategy for MapStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        Box::new(FlatInterleave {
            source: Some(cx.values(&self.source, depth)),
            f: Arc::clone(&self.f),
            depth,
            rotation: VecDeque::new(),
        })
    }
}

struct FlatInterleave<'a> {
    source: Option<Values<'a>>,
    f: Arc<MapFn>,
    depth: usize,
    rotation: VecDeque<vec::IntoIter<Value>>,
}

impl Iterator for FlatInterleave<'_> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            if let Some(source) = self.source.as_mut() {
                match source.next() {
                    Some(value) => {
                        let expanded = (self.f)(self.depth, &value);
                        self.rotation.push_back(expanded.into_iter());
                    }
                    None => self.source = None,
                }
            }
            while let Some(mut expansion) = self.rotation.pop_front() {
                if let Some(value) = expansion.next() {
                    self.rotation.push_back(expansion);
                    return Some(value);
                }
            }
            if self.source.is_none() {
                return None;
            }
        }
    }
}

type ImplicationFn = dyn Fn(&Value) -> bool + Send + Sync;

/// The values of a source tag that satisfy a predicate.
///
/// Rejected values are counted in [`GenStats`](crate::GenStats).
pub struct ImpliesStrategy {
    name: String,
    source: Tag,
    predicate: Arc<ImplicationFn>,
}

impl ImpliesStrategy {
    pub fn new<F>(name: &str, source: Tag, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: format!("{}->{}", name, source),
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for ImpliesStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImpliesStrategy")
            .field("name", &self.name)
            .field("source", &self.source)
            .finish()
    }
}

impl Strategy for ImpliesStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(&self, cx: &GenContext<'a>, depth: usize, _args: &[Tag]) -> Values<'a> {
        let predicate = Arc::clone(&self.predicate);
        let cx = cx.clone();
        let values = cx.values(&self.source, depth);
        Box::new(values.filter(move |value| {
            let accepted = predicate(value);
            if !accepted {
                trace!(value = %value, "Value did not meet implication");
                cx.stats().record_failed_implication();
            }
            accepted
        }))
    }
}
