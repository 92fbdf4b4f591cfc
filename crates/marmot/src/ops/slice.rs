// Slice — ONNX `Slice` (opset >= 10, inputs instead of attributes)
//
// Inputs, by position:
//
//   0  data
//   1  starts   rank <= 1, int64 or int32
//   2  ends     same length as starts
//   3  axes     optional, defaults to [0, 1, ..., len(starts) - 1]
//   4  steps    optional, defaults to all ones
//
// Entry i selects the half-open range [starts[i], ends[i]) of axis axes[i],
// walked in steps of steps[i]. Axes that are not mentioned are kept whole.
// Rank never changes.
//
// Negative starts/ends/axes and negative steps are rejected rather than
// normalized, and out-of-range bounds are errors, not clamped. If an axis
// appears twice, the later entry wins.

use marmot_core::{Error, Result, Shape, TensorValue};

use crate::graph::{Graph, NodeId};
use crate::operator::{
    require_min_child_count, require_no_nil_children, require_target_count, Attributes, Operator,
};

/// The (start, end, step) selection along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
    pub step: usize,
}

impl SliceRange {
    /// The whole of an axis of size `dim`.
    pub fn full(dim: usize) -> Self {
        Self {
            start: 0,
            end: dim,
            step: 1,
        }
    }

    /// Number of elements selected.
    pub fn len(&self) -> usize {
        if self.end <= self.start {
            0
        } else {
            (self.end - self.start + self.step - 1) / self.step
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate a raw (start, end, step) triple against an axis of size `dim`.
    fn checked(axis: usize, start: i64, end: i64, step: i64, dim: usize) -> Result<Self> {
        let out_of_bounds = || Error::SliceOutOfBounds {
            axis,
            start,
            end,
            step,
            dim_size: dim,
        };
        let start_u = usize::try_from(start).map_err(|_| out_of_bounds())?;
        let end_u = usize::try_from(end).map_err(|_| out_of_bounds())?;
        let step_u = usize::try_from(step).map_err(|_| out_of_bounds())?;
        if step_u == 0 || start_u > dim || end_u > dim || end_u < start_u {
            return Err(out_of_bounds());
        }
        Ok(Self {
            start: start_u,
            end: end_u,
            step: step_u,
        })
    }
}

/// ONNX `Slice` over the node's positional inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SliceOp;

impl SliceOp {
    pub fn boxed() -> Box<dyn Operator> {
        Box::new(SliceOp)
    }
}

impl Operator for SliceOp {
    fn op_type(&self) -> &'static str {
        "Slice"
    }

    fn configure(&mut self, _attrs: &Attributes) -> Result<()> {
        Ok(())
    }

    fn apply(&self, graph: &Graph, targets: &[NodeId]) -> Result<()> {
        require_target_count("Slice", targets, 1)?;
        let children = graph.ordered_children(targets[0])?;
        require_min_child_count("Slice", &children, 3)?;
        let inputs = require_no_nil_children("Slice", &children)?;

        let data = inputs[0];
        let starts = index_input("starts", inputs[1], None)?;
        let n = starts.len();
        let ends = index_input("ends", inputs[2], Some(n))?;
        let axes = match inputs.get(3) {
            Some(t) => index_input("axes", t, Some(n))?,
            None => (0..n as i64).collect(),
        };
        let steps = match inputs.get(4) {
            Some(t) => index_input("steps", t, Some(n))?,
            None => vec![1; n],
        };

        let rank = data.rank();
        let mut ranges: Vec<SliceRange> =
            data.dims().iter().map(|&d| SliceRange::full(d)).collect();
        for i in 0..n {
            let axis = usize::try_from(axes[i])
                .ok()
                .filter(|&a| a < rank)
                .ok_or(Error::DimOutOfRange { dim: axes[i], rank })?;
            let range =
                SliceRange::checked(axis, starts[i], ends[i], steps[i], data.dims()[axis])?;
            log::trace!(
                "Slice: axis {axis} [{}..{}) step {} -> {} elements",
                range.start,
                range.end,
                range.step,
                range.len()
            );
            ranges[axis] = range;
        }

        let out = slice_tensor(data, &ranges)?;
        graph.install_value(targets[0], out)
    }
}

/// Read one of the auxiliary index inputs (starts/ends/axes/steps).
///
/// Element i of the result is element i of the tensor.
fn index_input(
    input: &'static str,
    t: &TensorValue,
    expected_len: Option<usize>,
) -> Result<Vec<i64>> {
    if t.rank() > 1 {
        return Err(Error::WrongRank {
            op: "Slice".to_string(),
            input,
            rank: t.rank(),
        });
    }
    if let Some(expected) = expected_len {
        if t.elem_count() != expected {
            return Err(Error::LengthMismatch {
                op: "Slice".to_string(),
                input,
                expected,
                got: t.elem_count(),
            });
        }
    }
    if !t.is_populated() {
        return Err(Error::NoDataFound { dtype: t.dtype() });
    }
    t.to_i64_vec()
}

/// Select `ranges[axis]` along every axis of `data`.
///
/// `ranges` must hold one range per axis, each already validated against
/// the axis size. The result has the same rank and dtype as `data`.
pub fn slice_tensor(data: &TensorValue, ranges: &[SliceRange]) -> Result<TensorValue> {
    if ranges.len() != data.rank() {
        marmot_core::bail!(
            "slice: {} ranges for a rank {} tensor",
            ranges.len(),
            data.rank()
        );
    }
    if !data.is_populated() {
        return Err(Error::NoDataFound { dtype: data.dtype() });
    }
    let out_shape = Shape::new(ranges.iter().map(SliceRange::len).collect());
    let offsets = gather_offsets(data.shape(), ranges, out_shape.elem_count());
    TensorValue::new(out_shape, data.data().take(&offsets))
}

/// Flat source offsets of every selected element, in row-major output order.
fn gather_offsets(shape: &Shape, ranges: &[SliceRange], count: usize) -> Vec<usize> {
    let strides = shape.stride_contiguous();
    let out_dims: Vec<usize> = ranges.iter().map(SliceRange::len).collect();
    let mut offsets = Vec::with_capacity(count);
    let mut index = vec![0usize; out_dims.len()];
    for _ in 0..count {
        let offset = index
            .iter()
            .zip(ranges)
            .zip(&strides)
            .map(|((&i, r), &s)| (r.start + i * r.step) * s)
            .sum::<usize>();
        offsets.push(offset);

        // Odometer increment, last axis fastest.
        for d in (0..index.len()).rev() {
            index[d] += 1;
            if index[d] < out_dims[d] {
                break;
            }
            index[d] = 0;
        }
    }
    offsets
}
