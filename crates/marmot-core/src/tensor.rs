use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::shape::Shape;

// TensorValue — The decoded, owned tensor
//
// A TensorValue is what the ONNX decoder produces and what every graph
// operator reads and writes:
//
//   1. A shape (rank >= 0)
//   2. A dtype, implied by the backing variant
//   3. An owned, flat, row-major backing buffer
//
// MEMORY MODEL:
//
//   The backing is a plain Vec owned by the value. Nothing borrows from the
//   serialized descriptor it was decoded from, so descriptors can be dropped
//   as soon as decoding returns.
//
// POPULATED vs UNPOPULATED:
//
//   A populated tensor has exactly shape.elem_count() elements. A FLOAT
//   initializer with neither float_data nor raw_data decodes to an
//   unpopulated tensor: the shape is kept, the backing is empty. Operators
//   that only need the shape (Shape) accept it; operators that read elements
//   (Slice) reject it.

/// Flat backing storage of a tensor, one variant per [`DType`].
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Bool(Vec<bool>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    I64(Vec<i64>),
    I32(Vec<i32>),
}

impl TensorData {
    /// An empty backing of the given dtype.
    pub fn empty(dtype: DType) -> Self {
        match dtype {
            DType::Bool => TensorData::Bool(Vec::new()),
            DType::F32 => TensorData::F32(Vec::new()),
            DType::F64 => TensorData::F64(Vec::new()),
            DType::I64 => TensorData::I64(Vec::new()),
            DType::I32 => TensorData::I32(Vec::new()),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            TensorData::Bool(_) => DType::Bool,
            TensorData::F32(_) => DType::F32,
            TensorData::F64(_) => DType::F64,
            TensorData::I64(_) => DType::I64,
            TensorData::I32(_) => DType::I32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::Bool(v) => v.len(),
            TensorData::F32(v) => v.len(),
            TensorData::F64(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy out the elements at the given flat offsets, in order.
    ///
    /// Every offset must be `< self.len()`.
    pub fn take(&self, offsets: &[usize]) -> Self {
        fn pick<T: Copy>(src: &[T], offsets: &[usize]) -> Vec<T> {
            offsets.iter().map(|&o| src[o]).collect()
        }
        match self {
            TensorData::Bool(v) => TensorData::Bool(pick(v, offsets)),
            TensorData::F32(v) => TensorData::F32(pick(v, offsets)),
            TensorData::F64(v) => TensorData::F64(pick(v, offsets)),
            TensorData::I64(v) => TensorData::I64(pick(v, offsets)),
            TensorData::I32(v) => TensorData::I32(pick(v, offsets)),
        }
    }
}

/// An owned n-dimensional tensor: shape, dtype and flat row-major backing.
///
/// # Example
/// ```
/// use marmot_core::{DType, TensorValue};
///
/// let t = TensorValue::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], (2, 2)).unwrap();
/// assert_eq!(t.dims(), &[2, 2]);
/// assert_eq!(t.dtype(), DType::F32);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TensorValue {
    shape: Shape,
    data: TensorData,
}

impl TensorValue {
    // Constructors

    /// Create a populated tensor. The backing length must match the shape.
    pub fn new(shape: impl Into<Shape>, data: TensorData) -> Result<Self> {
        let shape = shape.into();
        let expected = shape.checked_elem_count().ok_or_else(|| {
            Error::CorruptedData(format!("shape {shape} has more elements than fit in memory"))
        })?;
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(TensorValue { shape, data })
    }

    /// Create a populated tensor from a typed vector.
    pub fn from_vec<T: Element>(values: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        Self::new(shape, T::into_data(values))
    }

    /// Create a rank-1 tensor holding `values`.
    pub fn vector<T: Element>(values: Vec<T>) -> Self {
        TensorValue {
            shape: Shape::from(values.len()),
            data: T::into_data(values),
        }
    }

    /// Create a rank-0 tensor holding a single value.
    pub fn scalar<T: Element>(value: T) -> Self {
        TensorValue {
            shape: Shape::from(()),
            data: T::into_data(vec![value]),
        }
    }

    /// Create a tensor that keeps its shape but carries no elements.
    pub fn unpopulated(shape: impl Into<Shape>, dtype: DType) -> Self {
        TensorValue {
            shape: shape.into(),
            data: TensorData::empty(dtype),
        }
    }

    // Accessors

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The dimensions as a slice (shortcut for shape().dims()).
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Total number of elements implied by the shape.
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// The flat backing buffer.
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Whether the backing holds one element per position in the shape.
    pub fn is_populated(&self) -> bool {
        self.data.len() == self.shape.elem_count()
    }

    /// Borrow the backing as a typed slice.
    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.data).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    /// Read an integer tensor (I64 or I32) as a vector of i64.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>> {
        match &self.data {
            TensorData::I64(v) => Ok(v.clone()),
            TensorData::I32(v) => Ok(v.iter().map(|&x| i64::from(x)).collect()),
            other => Err(Error::DTypeMismatch {
                expected: DType::I64,
                got: other.dtype(),
            }),
        }
    }
}
