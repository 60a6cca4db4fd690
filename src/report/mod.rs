//! The report: one addressable record per training/evaluation step.
//!
//! A [`Report`] merges batch fields, model outputs, and auxiliary mappings
//! into a single ordered record, then supports transforming, relocating, and
//! accumulating that record across steps:
//!
//! - merge with conflict detection ([`Report::new`])
//! - keyed and attribute-style access over one backing store
//! - one-level recursive transforms ([`Report::apply_fn`], [`Report::detach`],
//!   [`Report::to`])
//! - cross-step accumulation of tensor fields and losses
//!   ([`Report::accumulate_tensor_fields_and_loss`])
//! - independent deep snapshots ([`Report::copy`])
//!
//! # Example
//!
//! ```
//! use informe::{BatchArg, BatchSource, FieldMap, Report, Source, Value};
//!
//! struct Batch(FieldMap);
//!
//! impl BatchSource for Batch {
//!     fn items(&self) -> Vec<(String, Value)> {
//!         self.0.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
//!     }
//!     fn get_batch_size(&self) -> usize {
//!         4
//!     }
//! }
//!
//! # fn main() -> Result<(), informe::ReportError> {
//! let mut fields = FieldMap::new();
//! fields.insert("input_ids", Value::from(vec![Value::from(1), Value::from(2)]));
//! let batch = Batch(fields);
//!
//! let mut output = FieldMap::new();
//! output.insert("scores", 0.75);
//!
//! let report = Report::new(
//!     Some(BatchArg::Samples(&batch)),
//!     Some(Source::Mapping(&output)),
//!     &[],
//! )?;
//!
//! assert_eq!(report.get_batch_size()?, 4);
//! assert_eq!(report["scores"], Value::from(0.75));
//! # Ok(())
//! # }
//! ```

use std::ops::{Index, IndexMut};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceSpec};
use crate::error::{ReportError, Result};
use crate::source::{BatchArg, Source};
use crate::value::{FieldMap, Value};


/// Reserved key the batch size is stored under, inserted as the first field.
pub const BATCH_SIZE_KEY: &str = "_batch_size";

/// Field name the per-step loss mapping lives under.
pub const LOSSES_KEY: &str = "losses";

/// Sentinel field name used for prediction-report bookkeeping; skipped by
/// accumulation.
pub const PREDICTION_REPORT_KEY: &str = "__prediction_report__";

/// Ordered, merging key-value record of one training/evaluation step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    fields: FieldMap,
}

impl Report {
    /// Build a report by merging a batch, a model output, and any number of
    /// extra mapping sources, in that order.
    ///
    /// With no batch the report is empty and nothing else happens. A loose
    /// batch that is a sequence of `(key, value)` pairs takes a fast path:
    /// the pairs are loaded in order and `model_output`/`extras` are ignored.
    /// Otherwise every source must be mapping-shaped; a source that is not
    /// fails with [`ReportError::NotAMapping`] naming its positional index
    /// (batch 0, model output 1, extras 2..) before anything is merged.
    ///
    /// The batch size is captured from the batch's [`BatchSource`] capability
    /// and stored under [`BATCH_SIZE_KEY`] as the first field.
    ///
    /// Collision policy: a key written by a source at merge index >= 2 that
    /// already exists in the report logs a warning and overwrites; collisions
    /// between batch and model output overwrite silently. Batch and model
    /// output deliberately override each other, later auxiliary sources
    /// colliding is usually an accident worth surfacing.
    ///
    /// [`BatchSource`]: crate::BatchSource
    pub fn new(
        batch: Option<BatchArg<'_>>,
        model_output: Option<Source<'_>>,
        extras: &[Source<'_>],
    ) -> Result<Self> {
        let Some(batch) = batch else {
            return Ok(Self::default());
        };

        let (batch_items, batch_size) = match batch {
            BatchArg::Samples(samples) => (samples.items(), samples.get_batch_size()),
            BatchArg::Loose(value) => match value {
                Value::Seq(seq) if starts_with_pair(seq) => return Self::from_pair_seq(seq),
                Value::Map(_) => return Err(ReportError::MissingBatchSize),
                other => {
                    return Err(ReportError::NotAMapping {
                        index: 0,
                        found: other.kind(),
                    })
                }
            },
        };

        // Shape-check every remaining source before merging anything.
        let empty = FieldMap::new();
        let model_output = match &model_output {
            None => &empty,
            Some(source) => source.as_mapping().ok_or(ReportError::NotAMapping {
                index: 1,
                found: source.kind(),
            })?,
        };
        let mut extra_maps = Vec::with_capacity(extras.len());
        for (position, source) in extras.iter().enumerate() {
            let map = source.as_mapping().ok_or(ReportError::NotAMapping {
                index: position + 2,
                found: source.kind(),
            })?;
            extra_maps.push(map);
        }

        let mut report = Self::default();
        report.insert(BATCH_SIZE_KEY, Value::Int(batch_size as i64));

        for (key, value) in batch_items {
            report.insert(key, value);
        }
        for (key, value) in model_output.iter() {
            report.insert(key, value.clone());
        }
        for map in extra_maps {
            for (key, value) in map.iter() {
                if report.contains(key) {
                    warn!(
                        "updating report with key {key:?}, but it already exists in previous \
                         sources; consider a different key, collisions can break loss and \
                         metric calculations"
                    );
                }
                report.insert(key, value.clone());
            }
        }
        Ok(report)
    }

    fn from_pair_seq(seq: &[Value]) -> Result<Self> {
        let mut report = Self::default();
        for (index, item) in seq.iter().enumerate() {
            let (key, value) = as_pair(item).ok_or(ReportError::MalformedPair { index })?;
            report.insert(key, value);
        }
        Ok(report)
    }

    /// Batch size captured at construction.
    ///
    /// Fails with [`ReportError::MissingAttribute`] on an empty-constructed
    /// report.
    pub fn get_batch_size(&self) -> Result<usize> {
        self.attr(BATCH_SIZE_KEY)?
            .as_int()
            .map(|size| size as usize)
            .ok_or_else(|| ReportError::MissingAttribute(BATCH_SIZE_KEY.to_string()))
    }

    /// Look up a field by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a field by key, mutably
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    /// Attribute-style read: absent keys fail with
    /// [`ReportError::MissingAttribute`] instead of a key-style panic, so the
    /// report keeps behaving like a plain record.
    pub fn attr(&self, key: &str) -> Result<&Value> {
        self.fields
            .get(key)
            .ok_or_else(|| ReportError::MissingAttribute(key.to_string()))
    }

    /// Attribute-style read, mutable
    pub fn attr_mut(&mut self, key: &str) -> Result<&mut Value> {
        self.fields
            .get_mut(key)
            .ok_or_else(|| ReportError::MissingAttribute(key.to_string()))
    }

    /// Insert or reassign a field. Reassignment never moves the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key, value)
    }

    /// Check whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Snapshot of all field names in first-insertion order
    pub fn fields(&self) -> Vec<String> {
        self.fields.keys().map(str::to_string).collect()
    }

    /// The backing field map
    pub fn as_fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the report has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter()
    }

    /// Apply `fn` over the selected fields, storing results back in place.
    ///
    /// With `fields` given and non-empty, processing is restricted to those
    /// keys; otherwise every field is processed. Recursion is exactly one
    /// level deep: after `f` runs on the top-level value, a resulting
    /// sequence gets `f` applied to each element in place and a resulting
    /// mapping gets `f` applied to each of its values in place. Container
    /// leaves therefore see `f` twice (once as the container, once per
    /// element); callers pass an `f` that is a no-op on shapes it does not
    /// target, or restrict `fields`. Doubly nested values stay partially
    /// transformed.
    ///
    /// Returns `self` for chaining.
    pub fn apply_fn<F>(&mut self, f: F, fields: Option<&[&str]>) -> &mut Self
    where
        F: Fn(Value) -> Value,
    {
        let restrict = fields.filter(|keys| !keys.is_empty());
        for key in self.fields() {
            if let Some(only) = restrict {
                if !only.contains(&key.as_str()) {
                    continue;
                }
            }
            let Some(slot) = self.fields.get_mut(&key) else {
                continue;
            };
            let mut value = f(std::mem::replace(slot, Value::Null));
            match &mut value {
                Value::Seq(items) => {
                    for item in items.iter_mut() {
                        *item = f(std::mem::replace(item, Value::Null));
                    }
                }
                Value::Map(map) => {
                    for (_, nested) in map.iter_mut() {
                        *nested = f(std::mem::replace(nested, Value::Null));
                    }
                }
                _ => {}
            }
            *slot = value;
        }
        self
    }

    /// Decouple every tensor leaf from its upstream gradient graph.
    /// Non-tensor values pass through unchanged.
    pub fn detach(&mut self) -> &mut Self {
        self.apply_fn(detach_value, None)
    }

    /// Relocate every relocatable leaf to `device`.
    ///
    /// `device` is a structured [`Device`] handle or a textual name;
    /// unrecognized names fail with [`ReportError::InvalidDevice`].
    /// `non_blocking` is forwarded to the leaves as a transfer hint.
    /// Non-relocatable leaves pass through unchanged.
    pub fn to<'a, D>(
        &mut self,
        device: D,
        non_blocking: bool,
        fields: Option<&[&str]>,
    ) -> Result<&mut Self>
    where
        D: Into<DeviceSpec<'a>>,
    {
        let device: Device = device.into().resolve()?;
        Ok(self.apply_fn(
            move |value| match value {
                Value::Tensor(tensor) => Value::Tensor(tensor.to_device(device, non_blocking)),
                other => other,
            },
            fields,
        ))
    }

    /// Grow this report's tensor fields and losses with another step's
    /// report.
    ///
    /// For each name in `field_names` (the [`PREDICTION_REPORT_KEY`] sentinel
    /// is skipped): a name absent from `self` logs a warning and is skipped;
    /// a present tensor field becomes the concatenation of self-then-other
    /// along the leading axis; present non-tensor values are left untouched.
    ///
    /// Losses then accumulate as a running sum: for each key of `other`'s
    /// `losses` mapping, a key absent from `self`'s losses logs a warning and
    /// is skipped, numeric and tensor losses are added in place, and
    /// non-accumulable values are left untouched. Both reports must carry a
    /// `losses` mapping.
    pub fn accumulate_tensor_fields_and_loss(
        &mut self,
        other: &Report,
        field_names: &[&str],
    ) -> Result<()> {
        for &key in field_names {
            if key == PREDICTION_REPORT_KEY {
                continue;
            }
            if !self.contains(key) {
                warn!("{key:?} not found in report; metrics calculation might not work as expected");
                continue;
            }
            if let Some(Value::Tensor(current)) = self.get(key) {
                let incoming = match other.get(key) {
                    Some(Value::Tensor(tensor)) => tensor,
                    Some(_) => {
                        return Err(ReportError::NotTensorLike {
                            key: key.to_string(),
                        })
                    }
                    None => return Err(ReportError::MissingField(key.to_string())),
                };
                let merged = current.cat(incoming)?;
                self.insert(key, Value::Tensor(merged));
            }
        }
        self.accumulate_loss(other)
    }

    /// The `losses` mapping of this report
    pub fn losses(&self) -> Result<&FieldMap> {
        match self.get(LOSSES_KEY) {
            Some(Value::Map(losses)) => Ok(losses),
            _ => Err(ReportError::MissingField(LOSSES_KEY.to_string())),
        }
    }

    fn accumulate_loss(&mut self, other: &Report) -> Result<()> {
        let incoming: Vec<(String, Value)> = other
            .losses()?
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        let Some(Value::Map(losses)) = self.get_mut(LOSSES_KEY) else {
            return Err(ReportError::MissingField(LOSSES_KEY.to_string()));
        };
        for (key, value) in incoming {
            let Some(slot) = losses.get_mut(&key) else {
                warn!("{key:?} not found in report; loss calculation might not work as expected");
                continue;
            };
            let promoted = match (&mut *slot, &value) {
                (Value::Tensor(current), Value::Tensor(incoming)) => {
                    current.add_assign(incoming)?;
                    None
                }
                (Value::Tensor(current), Value::Float(x)) => {
                    current.add_scalar_assign(*x as f32);
                    None
                }
                (Value::Tensor(current), Value::Int(x)) => {
                    current.add_scalar_assign(*x as f32);
                    None
                }
                (Value::Float(current), Value::Float(x)) => {
                    *current += *x;
                    None
                }
                (Value::Float(current), Value::Int(x)) => {
                    *current += *x as f64;
                    None
                }
                (Value::Int(current), Value::Int(x)) => {
                    *current += *x;
                    None
                }
                // Int promotes to float when summed with a float
                (Value::Int(current), Value::Float(x)) => Some(Value::Float(*current as f64 + *x)),
                // Non-accumulable on either side: leave untouched
                _ => None,
            };
            if let Some(value) = promoted {
                *slot = value;
            }
        }
        Ok(())
    }

    /// Independent deep snapshot, preserving field order.
    ///
    /// The value tree is fully owned, so the derived `Clone` is the deep
    /// copy; mutating the snapshot, nested containers included, never
    /// affects the original.
    pub fn copy(&self) -> Report {
        self.clone()
    }
}

fn detach_value(value: Value) -> Value {
    match value {
        Value::Tensor(tensor) => Value::Tensor(tensor.detach()),
        other => other,
    }
}

fn starts_with_pair(seq: &[Value]) -> bool {
    matches!(
        seq.first(),
        Some(Value::Seq(pair)) if matches!(pair.first(), Some(Value::Str(_)))
    )
}

fn as_pair(item: &Value) -> Option<(String, Value)> {
    match item {
        Value::Seq(pair) if pair.len() == 2 => match &pair[0] {
            Value::Str(key) => Some((key.clone(), pair[1].clone())),
            _ => None,
        },
        _ => None,
    }
}

impl Index<&str> for Report {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.get(key)
            .unwrap_or_else(|| panic!("no field named {key:?}"))
    }
}

impl IndexMut<&str> for Report {
    fn index_mut(&mut self, key: &str) -> &mut Value {
        self.get_mut(key)
            .unwrap_or_else(|| panic!("no field named {key:?}"))
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = (&'a String, &'a Value);
    type IntoIter = <&'a FieldMap as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        (&self.fields).into_iter()
    }
}

impl<'a> From<&'a Report> for Source<'a> {
    fn from(report: &'a Report) -> Self {
        Source::Mapping(&report.fields)
    }
}
