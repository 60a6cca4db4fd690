//! informe — ordered, merging report structure for training and evaluation
//! steps.
//!
//! A training or evaluation step produces heterogeneous outputs: the input
//! batch fields, the model's forward outputs, and auxiliary bookkeeping.
//! [`Report`] collects them into one addressable, insertion-ordered record
//! with conflict detection, then supports:
//!
//! - transforms over all leaf values with one level of recursion into nested
//!   containers ([`Report::apply_fn`], [`Report::detach`])
//! - relocation of tensor leaves to a target device ([`Report::to`])
//! - cross-step accumulation: concatenation for batch-indexed tensor fields,
//!   running sums for losses
//!   ([`Report::accumulate_tensor_fields_and_loss`])
//! - independent deep snapshots ([`Report::copy`])
//!
//! The crate never assumes a concrete batch or model type. A batch is
//! anything carrying the [`BatchSource`] capability; leaves are dispatched on
//! the tensor-like and relocatable capabilities of [`Tensor`].
//!
//! Reports are exclusively owned by the step that created them: every
//! operation is a synchronous in-memory mutation behind `&mut self`, and
//! [`Report::copy`] is the hand-off mechanism when an independent snapshot is
//! needed.

pub mod device;
pub mod error;
pub mod report;
pub mod source;
pub mod tensor;
pub mod value;

pub use device::{Device, DeviceSpec};
pub use error::{ReportError, Result};
pub use report::{Report, BATCH_SIZE_KEY, LOSSES_KEY, PREDICTION_REPORT_KEY};
pub use source::{BatchArg, BatchSource, Source};
pub use tensor::Tensor;
pub use value::{FieldMap, Value};
