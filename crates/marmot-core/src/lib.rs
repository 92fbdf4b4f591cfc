//! # marmot-core
//!
//! Core tensor values, types and errors for marmot.
//!
//! This crate provides:
//! - [`TensorValue`] — owned n-dimensional tensor (shape + dtype + flat backing)
//! - [`Shape`] — n-dimensional shape and row-major strides
//! - [`DType`] — element types (Bool, F32, F64, I64, I32)
//! - [`Error`] — the single error type shared by decoding and evaluation

pub mod dtype;
pub mod error;
pub mod shape;
pub mod tensor;

pub use dtype::{DType, Element};
pub use error::{Error, Expected, Result};
pub use shape::Shape;
pub use tensor::{TensorData, TensorValue};
