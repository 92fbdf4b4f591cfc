use std::fmt;

use crate::tensor::TensorData;

// DType — Element types a decoded tensor can hold
//
// These are the element types the ONNX tensor decoder knows how to
// materialise:
//
//   Bool — boolean masks and conditions
//   F32  — 32-bit float, the default for weights and activations
//   F64  — 64-bit float
//   I64  — signed 64-bit int, used for shapes, indices and slice bounds
//   I32  — signed 32-bit int

/// Enum of all supported element data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    F32,
    F64,
    I64,
    I32,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::Bool => "bool",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I64 => "i64",
            DType::I32 => "i32",
        };
        write!(f, "{}", s)
    }
}

// Element — Trait that connects Rust types to the DType enum
//
// Lets generic code build or borrow the typed backing of a tensor without
// matching on every TensorData variant:
//
//   fn first<T: Element>(t: &TensorValue) -> Option<T> { T::slice(t.data())?.first().copied() }

/// Trait implemented by Rust types that can back a tensor.
pub trait Element: Copy + Send + Sync + 'static + fmt::Debug {
    /// The corresponding DType enum variant.
    const DTYPE: DType;

    /// Wrap an owned vector into the matching backing variant.
    fn into_data(values: Vec<Self>) -> TensorData;

    /// Borrow the backing as `&[Self]` if the dtype matches.
    fn slice(data: &TensorData) -> Option<&[Self]>;
}

macro_rules! impl_element {
    ($ty:ty, $variant:ident) => {
        impl Element for $ty {
            const DTYPE: DType = DType::$variant;

            fn into_data(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }

            fn slice(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(bool, Bool);
impl_element!(f32, F32);
impl_element!(f64, F64);
impl_element!(i64, I64);
impl_element!(i32, I32);
