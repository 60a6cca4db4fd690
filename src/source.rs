//! Capability surface of merge sources.
//!
//! Construction reconciles loosely shaped positional arguments from
//! heterogeneous producers (batch collators, model forward passes, auxiliary
//! bookkeeping). The report checks shapes itself rather than requiring every
//! producer to conform up front, so the offending positional index can be
//! named when something is not mapping-shaped.

use crate::value::{FieldMap, Value};

/// Capability a batch must expose: its fields plus the number of samples it
/// carries. Implemented by upstream sample-list/collator types.
pub trait BatchSource {
    /// Fields of the batch in iteration order
    fn items(&self) -> Vec<(String, Value)>;

    /// Number of samples in the batch
    fn get_batch_size(&self) -> usize;
}

/// The first positional argument to [`Report::new`](crate::Report::new).
///
/// A batch is normally an object carrying the [`BatchSource`] capability, but
/// lightweight collators hand over loose data instead: a sequence of
/// `(key, value)` pairs takes a fast path that loads the pairs directly, and
/// anything else is rejected with a typed error.
#[derive(Clone, Copy)]
pub enum BatchArg<'a> {
    /// A batch exposing the mapping and batch-size capabilities
    Samples(&'a dyn BatchSource),
    /// Loose data, shape-checked at construction time
    Loose(&'a Value),
}

impl<'a, B: BatchSource> From<&'a B> for BatchArg<'a> {
    fn from(batch: &'a B) -> Self {
        Self::Samples(batch)
    }
}

impl<'a> From<&'a Value> for BatchArg<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Loose(value)
    }
}

/// A later positional argument (model output or extra source): a mapping, or
/// loose data that must turn out to be mapping-shaped.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    /// Mapping-shaped data
    Mapping(&'a FieldMap),
    /// Loose data, shape-checked at construction time
    Loose(&'a Value),
}

impl<'a> Source<'a> {
    /// The mapping payload, if this source is mapping-shaped
    pub(crate) fn as_mapping(&self) -> Option<&'a FieldMap> {
        match *self {
            Self::Mapping(map) => Some(map),
            Self::Loose(Value::Map(map)) => Some(map),
            Self::Loose(_) => None,
        }
    }

    /// Shape name of the underlying data, used in error messages
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Mapping(_) => "mapping",
            Self::Loose(value) => value.kind(),
        }
    }
}

impl<'a> From<&'a FieldMap> for Source<'a> {
    fn from(map: &'a FieldMap) -> Self {
        Self::Mapping(map)
    }
}

impl<'a> From<&'a Value> for Source<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Loose(value)
    }
}
