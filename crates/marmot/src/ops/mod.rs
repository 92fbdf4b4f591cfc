// Built-in operators
//
// Each operator lives in its own module and is listed in BUILTIN, which is
// what `Registry::builtin()` registers. Adding an operator means adding a
// module here and one line to the list.

mod shape;
mod slice;

pub use shape::ShapeOp;
pub use slice::{slice_tensor, SliceOp, SliceRange};

use crate::operator::OperatorFactory;

/// Every operator this crate provides, keyed by ONNX op type.
pub const BUILTIN: &[(&str, OperatorFactory)] =
    &[("Shape", ShapeOp::boxed), ("Slice", SliceOp::boxed)];
