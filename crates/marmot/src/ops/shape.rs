use marmot_core::{Error, Result, TensorValue};

use crate::graph::{Graph, NodeId};
use crate::operator::{
    require_child_count, require_no_nil_children, require_target_count, Attributes, Operator,
};

/// ONNX `Shape`: the dims of the single input as a 1-D int64 tensor.
///
/// Only the input's shape is read, so an unpopulated input is fine.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapeOp;

impl ShapeOp {
    pub fn boxed() -> Box<dyn Operator> {
        Box::new(ShapeOp)
    }
}

impl Operator for ShapeOp {
    fn op_type(&self) -> &'static str {
        "Shape"
    }

    fn configure(&mut self, _attrs: &Attributes) -> Result<()> {
        Ok(())
    }

    fn apply(&self, graph: &Graph, targets: &[NodeId]) -> Result<()> {
        require_target_count("Shape", targets, 1)?;
        let children = graph.ordered_children(targets[0])?;
        require_child_count("Shape", &children, 1)?;
        let input = require_no_nil_children("Shape", &children)?[0];

        let dims = input
            .dims()
            .iter()
            .map(|&d| {
                i64::try_from(d)
                    .map_err(|_| Error::CorruptedData(format!("Shape: dim {d} does not fit in i64")))
            })
            .collect::<Result<Vec<i64>>>()?;
        graph.install_value(targets[0], TensorValue::vector(dims))
    }
}
