// Operator — The protocol every graph operator implements
//
// An operator is created fresh for each graph node from a factory looked up
// by ONNX op type name, configured once from the node's attributes, and then
// applied to the node:
//
//   let mut op = registry.create("Slice")?;
//   op.configure(&attrs)?;
//   op.apply(&graph, &[node])?;
//
// `apply` reads the already-computed values of the node's ordered children
// and installs the node's own value. The graph is borrowed immutably, so an
// operator cannot touch any other node's value.
//
// The registry is an explicit value built by whoever drives the import, not
// process-wide state: `Registry::builtin()` for the operators in this crate,
// `register` to add more.

use std::collections::{BTreeMap, HashMap};

use marmot_core::{Error, Expected, Result, TensorValue};

use crate::graph::{Graph, Node, NodeId};

// Attributes

/// A node attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f32),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
}

/// Named attributes of a graph node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        self.0.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    /// Integer attribute, or `default` when absent or of another kind.
    pub fn int(&self, name: &str, default: i64) -> i64 {
        match self.get(name) {
            Some(AttrValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Integer-list attribute, empty when absent.
    pub fn ints(&self, name: &str) -> &[i64] {
        match self.get(name) {
            Some(AttrValue::Ints(v)) => v.as_slice(),
            _ => &[],
        }
    }

    /// Float attribute, or `default` when absent or of another kind.
    pub fn float(&self, name: &str, default: f32) -> f32 {
        match self.get(name) {
            Some(AttrValue::Float(v)) => *v,
            _ => default,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Operator trait

/// A graph operator: configured once, then applied to the node(s) it was
/// created for.
pub trait Operator {
    /// The ONNX op type this operator implements.
    fn op_type(&self) -> &'static str;

    /// Read operator-specific attributes from the model.
    fn configure(&mut self, attrs: &Attributes) -> Result<()>;

    /// Compute and install the value of every node in `targets`.
    fn apply(&self, graph: &Graph, targets: &[NodeId]) -> Result<()>;
}

/// Builds a fresh, unconfigured operator.
pub type OperatorFactory = fn() -> Box<dyn Operator>;

// Registry

/// Mapping from op type name to operator factory.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    factories: HashMap<String, OperatorFactory>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry populated from an explicit list of operators.
    pub fn from_operators(operators: &[(&str, OperatorFactory)]) -> Self {
        let mut registry = Self::new();
        for &(name, factory) in operators {
            registry.register(name, factory);
        }
        registry
    }

    /// A registry with every operator this crate provides.
    pub fn builtin() -> Self {
        Self::from_operators(crate::ops::BUILTIN)
    }

    /// Register `factory` under `name`. A later registration of the same
    /// name replaces the earlier one.
    pub fn register(&mut self, name: &str, factory: OperatorFactory) {
        if self.factories.insert(name.to_string(), factory).is_some() {
            log::debug!("operator '{name}' re-registered, replacing previous factory");
        } else {
            log::debug!("operator '{name}' registered");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<OperatorFactory> {
        self.factories.get(name).copied()
    }

    /// Build a fresh operator for `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Operator>> {
        self.lookup(name)
            .map(|factory| factory())
            .ok_or_else(|| Error::UnknownOperator(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// Helpers shared by operator implementations

/// Fail with [`Error::Arity`] unless exactly `expected` targets were given.
pub fn require_target_count(op: &str, targets: &[NodeId], expected: usize) -> Result<()> {
    if targets.len() != expected {
        return Err(Error::arity(
            op,
            "target nodes",
            Expected::Exactly(expected),
            targets.len(),
        ));
    }
    Ok(())
}

/// Fail with [`Error::Arity`] unless there are exactly `expected` children.
pub fn require_child_count(op: &str, children: &[&Node], expected: usize) -> Result<()> {
    if children.len() != expected {
        return Err(Error::arity(
            op,
            "children",
            Expected::Exactly(expected),
            children.len(),
        ));
    }
    Ok(())
}

/// Fail with [`Error::Arity`] unless there are at least `min` children.
pub fn require_min_child_count(op: &str, children: &[&Node], min: usize) -> Result<()> {
    if children.len() < min {
        return Err(Error::arity(
            op,
            "children",
            Expected::AtLeast(min),
            children.len(),
        ));
    }
    Ok(())
}

/// Borrow every child's value. Fails with [`Error::Arity`] (expected: all
/// children, got: how many hold a value) if any child is not yet evaluated.
pub fn require_no_nil_children<'g>(
    op: &str,
    children: &[&'g Node],
) -> Result<Vec<&'g TensorValue>> {
    let values: Vec<&'g TensorValue> = children.iter().filter_map(|&c| c.value()).collect();
    if values.len() != children.len() {
        if let Some(missing) = children.iter().find(|c| c.value().is_none()) {
            log::debug!("{op}: child '{}' has no value", missing.name());
        }
        return Err(Error::arity(
            op,
            "evaluated children",
            Expected::Exactly(children.len()),
            values.len(),
        ));
    }
    Ok(values)
}
