//! Report error types.

use thiserror::Error;

/// Report errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// A positional merge source is not mapping-shaped. Index 0 is the batch,
    /// index 1 the model output, indexes 2.. the extra arguments.
    #[error("argument {index} is not mapping-shaped: found {found}")]
    NotAMapping {
        /// Positional index of the offending argument
        index: usize,
        /// Shape name of the offending value
        found: &'static str,
    },

    /// A pair-sequence batch contains an element that is not a
    /// `(key, value)` pair.
    #[error("pair sequence element {index} is not a (key, value) pair")]
    MalformedPair {
        /// Position of the malformed element within the sequence
        index: usize,
    },

    /// The batch argument is mapping-shaped but carries no batch size.
    #[error("batch source does not expose a batch size")]
    MissingBatchSize,

    /// Attribute-style read of a key the report does not have.
    #[error("no attribute named {0:?}")]
    MissingAttribute(String),

    /// Accumulation referenced a field a report does not carry.
    #[error("no field named {0:?}")]
    MissingField(String),

    /// Accumulation found a tensor on one side and a value that cannot be
    /// concatenated on the other.
    #[error("field {key:?} cannot be accumulated: incoming value is not tensor-like")]
    NotTensorLike {
        /// Field under accumulation
        key: String,
    },

    /// Tensor shapes do not line up for concatenation or in-place addition.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape on the receiving side
        expected: Vec<usize>,
        /// Shape of the incoming tensor
        actual: Vec<usize>,
    },

    /// Relocation target is not a recognized device name.
    #[error("device must be a handle or a recognized name, got {0:?}")]
    InvalidDevice(String),
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
