// Graph — Nodes, ordered edges and write-once value slots
//
// The graph is built by the model importer and then evaluated node by node
// by a driver that walks it in dependency order. This module only stores the
// structure and the computed values:
//
//   - Every node has an operator type name ("Slice", "Shape", ... or "" for
//     inputs and constants) and an ordered list of children.
//   - Child order is registration order. ONNX inputs are positional (data,
//     starts, ends, axes, steps), so operators index into this order.
//   - A node's value slot is written once. Operators get `&Graph`, so they
//     can read their children's values but cannot change them.
//
// Evaluation is single-threaded; the slot is a `OnceCell`, not a lock.

use std::cell::OnceCell;

use marmot_core::{Error, Result, TensorValue};

/// Index of a node inside its [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A vertex of the dataflow graph.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    op_type: String,
    children: Vec<NodeId>,
    value: OnceCell<TensorValue>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator type name; empty for inputs and constants.
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    /// Child ids in registration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The computed value, if the node has been evaluated.
    pub fn value(&self) -> Option<&TensorValue> {
        self.value.get()
    }
}

/// A directed graph of [`Node`]s with ordered edges.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add an operator node with no children yet.
    pub fn add_node(&mut self, op_type: &str, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.to_string(),
            op_type: op_type.to_string(),
            children: Vec::new(),
            value: OnceCell::new(),
        });
        id
    }

    /// Add a leaf node whose value is already known (initializer or input).
    pub fn add_constant(&mut self, name: &str, value: TensorValue) -> NodeId {
        let id = self.add_node("", name);
        // A freshly created cell is always empty.
        let _ = self.nodes[id.0].value.set(value);
        id
    }

    /// Make `child` the next positional input of `parent`.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(child)?;
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(Error::UnknownNode(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(Error::UnknownNode(id.0))
    }

    /// The children of `id`, in the order they were registered.
    pub fn ordered_children(&self, id: NodeId) -> Result<Vec<&Node>> {
        self.node(id)?
            .children
            .iter()
            .map(|&c| self.node(c))
            .collect()
    }

    /// The computed value of `id`, if any.
    pub fn value(&self, id: NodeId) -> Result<Option<&TensorValue>> {
        Ok(self.node(id)?.value())
    }

    /// Install the value of `id`. Fails if the node already holds one.
    pub fn install_value(&self, id: NodeId, value: TensorValue) -> Result<()> {
        let node = self.node(id)?;
        node.value
            .set(value)
            .map_err(|_| Error::AlreadyEvaluated(node.name.clone()))?;
        if let Some(value) = node.value.get() {
            log::debug!(
                "node '{}' ({}) <- {} {}",
                node.name,
                node.op_type,
                value.dtype(),
                value.shape()
            );
        }
        Ok(())
    }

    /// Drop every value computed by an operator so the graph can be
    /// evaluated again. Constants keep their values.
    pub fn clear_values(&mut self) {
        for node in self.nodes.iter_mut().filter(|n| !n.op_type.is_empty()) {
            node.value.take();
        }
    }
}
