// ONNX — Tensor descriptors and their decoding
//
// The model parser hands us TensorProto records (initializers, Constant
// node values, test-data tensors). This module turns them into owned
// TensorValues:
//
//   bytes ──from_bytes──▶ TensorDescriptor ──decode──▶ TensorValue
//
// The first arrow is only needed for standalone `.pb` tensors; descriptors
// coming out of a parsed model go straight to `decode`.

mod decode;
mod descriptor;
mod proto;

pub use decode::decode;
pub use descriptor::{DataType, Segment, TensorDescriptor};
