//! # marmot
//!
//! The evaluation core of an ONNX-to-dataflow-graph translator.
//!
//! This is the top-level crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use marmot::prelude::*;
//!
//! let mut graph = Graph::new();
//! let x = graph.add_constant("x", TensorValue::from_vec(vec![0.0f32; 35], (5, 7)).unwrap());
//! let shape = graph.add_node("Shape", "shape");
//! graph.add_edge(shape, x).unwrap();
//!
//! let registry = Registry::builtin();
//! let mut op = registry.create("Shape").unwrap();
//! op.configure(&Attributes::new()).unwrap();
//! op.apply(&graph, &[shape]).unwrap();
//!
//! let dims = graph.value(shape).unwrap().unwrap().to_i64_vec().unwrap();
//! assert_eq!(dims, vec![5, 7]);
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `marmot-core` | TensorValue, Shape, DType, Error |
//! | `marmot` | Tensor decoding, Graph, Operator protocol and registry, built-in ops |
//!
//! ## Modules
//!
//! - [`onnx`] — TensorProto descriptors, wire decoding, tensor decoding
//! - [`graph`] — nodes, ordered edges, write-once values
//! - [`operator`] — the `Operator` trait, attributes, `Registry`
//! - [`ops`] — `Shape` and `Slice`

/// Re-export core types.
pub use marmot_core::{DType, Element, Error, Expected, Result, Shape, TensorData, TensorValue};

/// ONNX — TensorProto descriptors and decoding into TensorValues.
pub mod onnx;

/// Graph — nodes, ordered children and value slots.
pub mod graph;

/// Operator protocol, attributes and the operator registry.
pub mod operator;

/// Built-in operators.
pub mod ops;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::graph::{Graph, Node, NodeId};
    pub use crate::onnx::{decode, DataType, TensorDescriptor};
    pub use crate::operator::{AttrValue, Attributes, Operator, OperatorFactory, Registry};
    pub use crate::ops::{ShapeOp, SliceOp};
    pub use crate::{DType, Error, Result, Shape, TensorData, TensorValue};
}
