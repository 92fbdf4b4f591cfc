// Operator tests — Shape and Slice driven through the registry, the way an
// importer evaluates a graph node by node

use marmot::prelude::*;
use marmot::Expected;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Evaluate `node` with the operator registered for its op type.
fn eval(registry: &Registry, graph: &Graph, node: NodeId) -> Result<()> {
    let op_type = graph.node(node)?.op_type().to_string();
    let mut op = registry.create(&op_type)?;
    op.configure(&Attributes::new())?;
    op.apply(graph, &[node])
}

/// Build `op_type(inputs...)` with every input as a constant.
fn build(op_type: &str, inputs: Vec<TensorValue>) -> (Graph, NodeId) {
    let mut g = Graph::new();
    let node = g.add_node(op_type, "out");
    for (i, t) in inputs.into_iter().enumerate() {
        let c = g.add_constant(&format!("in{i}"), t);
        g.add_edge(node, c).unwrap();
    }
    (g, node)
}

fn ints(v: &[i64]) -> TensorValue {
    TensorValue::vector(v.to_vec())
}

// Registry

#[test]
fn test_builtin_registry() {
    let registry = Registry::builtin();
    assert_eq!(registry.names(), vec!["Shape", "Slice"]);
    assert_eq!(registry.create("Slice").unwrap().op_type(), "Slice");
    assert!(matches!(
        registry.create("Conv"),
        Err(Error::UnknownOperator(_))
    ));
}

// Shape

#[test]
fn test_shape_of_5x7() {
    init_logging();
    let registry = Registry::builtin();
    let (g, node) = build(
        "Shape",
        vec![TensorValue::from_vec(vec![1.0f64; 35], (5, 7)).unwrap()],
    );
    eval(&registry, &g, node).unwrap();

    let out = g.value(node).unwrap().unwrap();
    assert_eq!(out.dtype(), DType::I64);
    assert_eq!(out.rank(), 1);
    assert_eq!(out.to_i64_vec().unwrap(), vec![5, 7]);
}

#[test]
fn test_shape_child_count() {
    let registry = Registry::builtin();

    let (g, node) = build("Shape", vec![]);
    let err = eval(&registry, &g, node).unwrap_err();
    assert!(matches!(err, Error::Arity { expected: Expected::Exactly(1), got: 0, .. }));

    let (g, node) = build("Shape", vec![ints(&[1]), ints(&[2])]);
    let err = eval(&registry, &g, node).unwrap_err();
    assert!(matches!(err, Error::Arity { expected: Expected::Exactly(1), got: 2, .. }));
}

#[test]
fn test_shape_rejects_multiple_targets() {
    let mut g = Graph::new();
    let x = g.add_constant("x", ints(&[1, 2, 3]));
    let a = g.add_node("Shape", "a");
    let b = g.add_node("Shape", "b");
    g.add_edge(a, x).unwrap();
    g.add_edge(b, x).unwrap();

    let err = ShapeOp.apply(&g, &[a, b]).unwrap_err();
    assert!(matches!(err, Error::Arity { expected: Expected::Exactly(1), got: 2, .. }));
    assert!(g.value(a).unwrap().is_none());
}

#[test]
fn test_shape_of_decoded_initializer() {
    let registry = Registry::builtin();
    let weight = TensorDescriptor::new("w", DataType::Float, &[3, 1, 4])
        .decode()
        .unwrap();
    let (g, node) = build("Shape", vec![weight]);
    eval(&registry, &g, node).unwrap();
    assert_eq!(
        g.value(node).unwrap().unwrap().to_i64_vec().unwrap(),
        vec![3, 1, 4]
    );
}

// Slice

#[test]
fn test_slice_with_step() {
    init_logging();
    let registry = Registry::builtin();
    let data = ints(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    let (g, node) = build(
        "Slice",
        vec![data, ints(&[2]), ints(&[7]), ints(&[0]), ints(&[2])],
    );
    eval(&registry, &g, node).unwrap();

    let out = g.value(node).unwrap().unwrap();
    assert_eq!(out.dims(), &[3]);
    assert_eq!(out.to_i64_vec().unwrap(), vec![2, 4, 6]);
}

#[test]
fn test_slice_length_mismatch() {
    let registry = Registry::builtin();
    let data = TensorValue::from_vec((0..12).collect::<Vec<i64>>(), (3, 4)).unwrap();
    let (g, node) = build("Slice", vec![data, ints(&[0, 1]), ints(&[2])]);
    let err = eval(&registry, &g, node).unwrap_err();
    assert!(matches!(
        err,
        Error::LengthMismatch { input: "ends", expected: 2, got: 1, .. }
    ));
}

#[test]
fn test_slice_needs_three_children() {
    let registry = Registry::builtin();
    let (g, node) = build("Slice", vec![ints(&[1, 2, 3]), ints(&[0])]);
    let err = eval(&registry, &g, node).unwrap_err();
    assert!(matches!(err, Error::Arity { expected: Expected::AtLeast(3), got: 2, .. }));
}

#[test]
fn test_slice_second_axis_uses_its_own_bounds() {
    let registry = Registry::builtin();
    // 2x3x4 tensor 0..24; take [0..2, 1..3, 1..4 step 2]
    let data = TensorValue::from_vec((0..24).collect::<Vec<i32>>(), (2, 3, 4)).unwrap();
    let (g, node) = build(
        "Slice",
        vec![
            data,
            ints(&[1, 1]),
            ints(&[3, 4]),
            ints(&[1, 2]),
            ints(&[1, 2]),
        ],
    );
    eval(&registry, &g, node).unwrap();

    let out = g.value(node).unwrap().unwrap();
    assert_eq!(out.dims(), &[2, 2, 2]);
    assert_eq!(
        out.data(),
        &TensorData::I32(vec![5, 7, 9, 11, 17, 19, 21, 23])
    );
}

#[test]
fn test_slice_of_decoded_raw_initializer() {
    let registry = Registry::builtin();
    let bytes: Vec<u8> = [10.0f32, 20.0, 30.0, 40.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    let data = TensorDescriptor::new("w", DataType::Float, &[4])
        .with_raw_data(bytes)
        .decode()
        .unwrap();
    let starts = TensorDescriptor::new("starts", DataType::Int64, &[1])
        .with_int64_data(vec![1])
        .decode()
        .unwrap();
    let ends = TensorDescriptor::new("ends", DataType::Int32, &[1])
        .with_int32_data(vec![3])
        .decode()
        .unwrap();

    let (g, node) = build("Slice", vec![data, starts, ends]);
    eval(&registry, &g, node).unwrap();
    assert_eq!(
        g.value(node).unwrap().unwrap().as_slice::<f32>().unwrap(),
        &[20.0, 30.0]
    );
}

// Chained evaluation

#[test]
fn test_shape_then_slice_chain() {
    init_logging();
    let registry = Registry::builtin();

    let mut g = Graph::new();
    let x = g.add_constant("x", TensorValue::unpopulated(vec![8, 3, 224, 224], DType::F32));
    let shape = g.add_node("Shape", "shape");
    g.add_edge(shape, x).unwrap();
    let starts = g.add_constant("starts", ints(&[2]));
    let ends = g.add_constant("ends", ints(&[4]));
    let hw = g.add_node("Slice", "hw");
    g.add_edge(hw, shape).unwrap();
    g.add_edge(hw, starts).unwrap();
    g.add_edge(hw, ends).unwrap();

    // Slice before its input is evaluated
    let err = eval(&registry, &g, hw).unwrap_err();
    assert!(matches!(err, Error::Arity { got: 2, .. }));

    eval(&registry, &g, shape).unwrap();
    eval(&registry, &g, hw).unwrap();
    assert_eq!(
        g.value(hw).unwrap().unwrap().to_i64_vec().unwrap(),
        vec![224, 224]
    );

    // Values are write-once until the driver clears them
    assert!(matches!(
        eval(&registry, &g, shape),
        Err(Error::AlreadyEvaluated(_))
    ));
    g.clear_values();
    assert!(g.value(hw).unwrap().is_none());
    eval(&registry, &g, shape).unwrap();
    eval(&registry, &g, hw).unwrap();
}
