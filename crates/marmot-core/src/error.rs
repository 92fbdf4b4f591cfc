use std::fmt;

use crate::dtype::DType;
use crate::shape::Shape;

/// How many inputs (or targets) an operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Exactly(usize),
    AtLeast(usize),
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Exactly(n) => write!(f, "{n}"),
            Expected::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// All errors that can occur while decoding tensors or evaluating operators.
///
/// Decoding and operator evaluation are deterministic, so none of these are
/// retryable: the caller gets the error back and decides what to abort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The descriptor carries the UNDEFINED data-type tag.
    #[error("tensor data type is undefined")]
    UndefinedDType,

    /// Segmented tensors, data types without a decoder, and similar.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A raw byte buffer (or wire payload) could not be split into whole elements.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// Neither the typed list nor the raw buffer carries data.
    #[error("no data found for {dtype} tensor")]
    NoDataFound { dtype: DType },

    /// Wrong number of target nodes or children.
    #[error("{op}: expected {expected} {subject}, got {got}")]
    Arity {
        op: String,
        subject: &'static str,
        expected: Expected,
        got: usize,
    },

    /// An auxiliary input must be a scalar or a 1-D tensor.
    #[error("{op}: {input} must have rank <= 1, got rank {rank}")]
    WrongRank {
        op: String,
        input: &'static str,
        rank: usize,
    },

    /// Auxiliary inputs must all have the same length.
    #[error("{op}: {input} has length {got}, expected {expected}")]
    LengthMismatch {
        op: String,
        input: &'static str,
        expected: usize,
        got: usize,
    },

    /// Element count disagrees with the shape.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// DType mismatch between what an operator needs and what it was given.
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: DType, got: DType },

    /// Dimension index out of range for the tensor's rank.
    #[error("dimension out of range: dim {dim} for tensor with {rank} dimensions")]
    DimOutOfRange { dim: i64, rank: usize },

    /// A (start, end, step) triple that does not select a valid range.
    #[error("slice out of bounds: axis {axis}, start {start}, end {end}, step {step}, dim_size {dim_size}")]
    SliceOutOfBounds {
        axis: usize,
        start: i64,
        end: i64,
        step: i64,
        dim_size: usize,
    },

    /// A node id that does not belong to the graph.
    #[error("unknown node id {0}")]
    UnknownNode(usize),

    /// A node's value slot was written twice.
    #[error("node '{0}' already holds a value")]
    AlreadyEvaluated(String),

    /// No factory registered under this operator type name.
    #[error("unknown operator type '{0}'")]
    UnknownOperator(String),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Shorthand for an [`Error::Arity`] failure.
    pub fn arity(op: &str, subject: &'static str, expected: Expected, got: usize) -> Self {
        Error::Arity {
            op: op.to_string(),
            subject,
            expected,
            got,
        }
    }
}

/// Convenience Result type used throughout marmot.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
