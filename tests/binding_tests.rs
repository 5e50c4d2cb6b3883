//! Binding-layout table tests.
//!
//! Visibility, minimum sizes and the validation applied to buffer bindings
//! while resolving.

use pretty_assertions::assert_eq;
use shaderweave::prelude::*;

fn func(label: &str, statements: Vec<Stmt>) -> FunctionNode {
    FunctionNode::new(FunctionBody::new(statements)).with_label(label)
}

fn run(graph: &DefinitionGraph, entries: &[NodeId]) -> Result<ResolvedProgram, ResolveError> {
    resolve(graph, entries, &SlotBindings::new(), &ResolveOptions::default())
}

fn particles(length: ArrayLength) -> DataSchema {
    let items = match length {
        ArrayLength::Fixed(n) => DataSchema::array(DataSchema::vec4f(), n),
        ArrayLength::Runtime => DataSchema::runtime_array(DataSchema::vec4f()),
    };
    DataSchema::structure("Particles", [("count", DataSchema::u32()), ("items", items)])
}

#[test]
fn test_visibility_is_union_of_reaching_stages() {
    let mut builder = GraphBuilder::new();
    let light = builder.add_binding(
        BindingNode::uniform(0, 0, DataSchema::vec4f()).with_label("light"),
    );
    let unused = builder.add_binding(
        BindingNode::storage(0, 1, StorageAccess::Read, DataSchema::runtime_array(DataSchema::f32()))
            .with_label("weights"),
    );
    let shade = builder.add_function(
        func("shade", vec![Stmt::ret(Expr::ident("light"))])
            .returns(DataSchema::vec4f())
            .with_external("light", light),
    );
    let vs = builder.add_function(
        func("vs_main", vec![Stmt::ret(Expr::call("shade", vec![]))])
            .returns(DataSchema::vec4f().builtin(Builtin::Position))
            .with_external("shade", shade)
            .entry(ShaderStage::Vertex),
    );
    let fs = builder.add_function(
        func("fs_main", vec![Stmt::ret(Expr::call("shade", vec![]))])
            .returns(DataSchema::vec4f().location(0))
            .with_external("shade", shade)
            .entry(ShaderStage::Fragment),
    );
    let cs = builder.add_function(
        func(
            "cs_main",
            vec![Stmt::expr(Expr::index(Expr::ident("weights"), Expr::num("0u")))],
        )
        .with_external("weights", unused)
        .entry(ShaderStage::compute(64)),
    );
    let graph = builder.build();

    let program = run(&graph, &[vs, fs, cs]).unwrap();
    let light_entry = program.bindings.get(0, 0).unwrap();
    assert_eq!(light_entry.identifier, "light");
    assert_eq!(light_entry.visibility, ShaderStages::VERTEX | ShaderStages::FRAGMENT);
    assert_eq!(light_entry.min_binding_size, 16);

    let weights = program.bindings.get(0, 1).unwrap();
    assert_eq!(weights.visibility, ShaderStages::COMPUTE);
    assert_eq!(weights.min_binding_size, 4);
    assert_eq!(program.bindings.len(), 2);
}

#[test]
fn test_binding_declaration_order() {
    let mut builder = GraphBuilder::new();
    let params = builder.add_binding(
        BindingNode::uniform(
            1,
            2,
            DataSchema::structure(
                "Params",
                [("scale", DataSchema::f32()), ("offset", DataSchema::vec3f())],
            ),
        )
        .with_label("params"),
    );
    let main = builder.add_function(
        func(
            "main",
            vec![Stmt::ret(Expr::member(Expr::ident("params"), "scale"))],
        )
        .returns(DataSchema::f32())
        .with_external("params", params),
    );
    let graph = builder.build();

    let program = run(&graph, &[main]).unwrap();
    assert_eq!(
        program.code,
        "struct Params {\n  scale: f32,\n  offset: vec3f,\n}\n\n\
         @group(1) @binding(2) var<uniform> params: Params;\n\n\
         fn main() -> f32 {\n  return params.scale;\n}\n"
    );
    let (group, binding, entry) = program.bindings.find(params).unwrap();
    assert_eq!((group, binding), (1, 2));
    assert_eq!(entry.kind, BindingKind::Uniform);
    assert_eq!(entry.min_binding_size, 32);
    // Not an entry point with a stage, so no stage sees it.
    assert!(entry.visibility.is_empty());
}

#[test]
fn test_sized_storage_binding() {
    let mut builder = GraphBuilder::new();
    let buffer = builder.add_binding(
        BindingNode::sized_storage(0, 0, StorageAccess::ReadWrite, particles).with_label("particles"),
    );
    let main = builder.add_function(
        func(
            "main",
            vec![Stmt::expr(Expr::assign(
                Expr::member(Expr::ident("particles"), "count"),
                Expr::num("0u"),
            ))],
        )
        .with_external("particles", buffer)
        .entry(ShaderStage::compute(32)),
    );
    let graph = builder.build();

    let program = run(&graph, &[main]).unwrap();
    assert!(program.code.contains("struct Particles {\n  count: u32,\n  items: array<vec4f>,\n}"));
    assert!(
        program
            .code
            .contains("@group(0) @binding(0) var<storage, read_write> particles: Particles;")
    );

    let entry = program.bindings.get(0, 0).unwrap();
    assert_eq!(entry.min_binding_size, 32);
    assert_eq!(entry.visibility, ShaderStages::COMPUTE);

    let Some(Node::Binding(node)) = graph.get(buffer) else {
        panic!("expected a binding node");
    };
    assert_eq!(size_of(&node.schema.with_length(100)).unwrap(), 16 + 100 * 16);
}

#[test]
fn test_binding_conflict() {
    let mut builder = GraphBuilder::new();
    let first = builder.add_binding(BindingNode::uniform(0, 0, DataSchema::f32()).with_label("first"));
    let second =
        builder.add_binding(BindingNode::uniform(0, 0, DataSchema::u32()).with_label("second"));
    let main = builder.add_function(
        func("main", vec![])
            .with_external("first", first)
            .with_external("second", second),
    );
    let graph = builder.build();

    let err = run(&graph, &[main]).unwrap_err();
    assert_eq!(
        err.kind,
        ResolveErrorKind::BindingConflict {
            group: 0,
            binding: 0,
            existing: "first".to_string(),
            conflicting: "second".to_string(),
        }
    );
}

#[test]
fn test_same_binding_under_two_specializations_is_one_entry() {
    let mut builder = GraphBuilder::new();
    let tint = builder.add_slot(SlotNode::new().with_label("tint"));
    let colors = builder.add_binding(
        BindingNode::storage(0, 3, StorageAccess::Read, DataSchema::runtime_array(DataSchema::vec4f()))
            .with_label("colors"),
    );
    let paint = builder.add_function(
        func(
            "paint",
            vec![Stmt::ret(Expr::binary(
                BinaryOp::Mul,
                Expr::index(Expr::ident("colors"), Expr::num("0u")),
                Expr::ident("tint"),
            ))],
        )
        .returns(DataSchema::vec4f())
        .with_external("colors", colors)
        .with_external("tint", tint)
        .entry(ShaderStage::Fragment),
    );
    let warm = builder.add_specialized(paint, SlotBindings::new().with(tint, Value::f32(1.5)));
    let cool = builder.add_specialized(paint, SlotBindings::new().with(tint, Value::f32(0.5)));
    let graph = builder.build();

    let program = run(&graph, &[warm, cool]).unwrap();
    assert_eq!(program.code.matches("var<storage, read> colors").count(), 1);
    assert_eq!(program.code.matches("fn paint").count(), 2);
    assert_eq!(program.bindings.len(), 1);
    assert_eq!(
        program.bindings.get(0, 3).map(|b| b.visibility),
        Some(ShaderStages::FRAGMENT)
    );
}

#[test]
fn test_runtime_sized_uniform_rejected() {
    let mut builder = GraphBuilder::new();
    let data = builder.add_binding(
        BindingNode::uniform(0, 0, DataSchema::runtime_array(DataSchema::f32())).with_label("data"),
    );
    let main = builder.add_function(func("main", vec![]).with_external("data", data));
    let graph = builder.build();

    let err = run(&graph, &[main]).unwrap_err();
    assert!(err.is_layout());
    assert!(matches!(
        err.kind,
        ResolveErrorKind::Layout(LayoutError::RuntimeSizedUniform { .. })
    ));
    assert_eq!(err.trail, vec!["main", "data"]);
}

#[test]
fn test_bool_binding_rejected() {
    let mut builder = GraphBuilder::new();
    let flags = builder.add_binding(
        BindingNode::storage(0, 0, StorageAccess::Read, DataSchema::array(DataSchema::bool(), 4))
            .with_label("flags"),
    );
    let main = builder.add_function(func("main", vec![]).with_external("flags", flags));
    let graph = builder.build();

    let err = run(&graph, &[main]).unwrap_err();
    assert!(matches!(
        err.kind,
        ResolveErrorKind::Layout(LayoutError::NotHostShareable { .. })
    ));
}

fn storage_main(schema: DataSchema) -> (DefinitionGraph, NodeId) {
    let mut builder = GraphBuilder::new();
    let points = builder.add_binding(
        BindingNode::storage(0, 0, StorageAccess::Read, schema).with_label("points"),
    );
    let main = builder.add_function(
        func("main", vec![])
            .with_external("points", points)
            .entry(ShaderStage::compute(1)),
    );
    (builder.build(), main)
}

#[test]
fn test_widened_stride_binding_rejected() {
    let (graph, main) = storage_main(DataSchema::array(DataSchema::f32(), 4).stride(16));
    let err = run(&graph, &[main]).unwrap_err();
    assert_eq!(
        err.kind,
        ResolveErrorKind::Layout(LayoutError::Unrepresentable {
            schema: "array<f32, 4>".to_string(),
            decoration: "stride",
        })
    );
    assert_eq!(err.trail, vec!["main", "points"]);
}

#[test]
fn test_natural_stride_binding_matches_host_size() {
    let schema = DataSchema::array(DataSchema::f32(), 4).stride(4);
    let (graph, main) = storage_main(schema.clone());
    let program = run(&graph, &[main]).unwrap();
    assert!(
        program
            .code
            .contains("@group(0) @binding(0) var<storage, read> points: array<f32, 4>;")
    );
    assert_eq!(
        program.bindings.get(0, 0).unwrap().min_binding_size,
        size_of(&schema).unwrap()
    );
}

#[test]
fn test_element_alignment_rejected() {
    let (graph, main) = storage_main(DataSchema::array(DataSchema::f32().align(16), 4));
    let err = run(&graph, &[main]).unwrap_err();
    assert!(matches!(
        err.kind,
        ResolveErrorKind::Layout(LayoutError::Unrepresentable { decoration: "align", .. })
    ));
}

#[test]
fn test_member_layout_attributes_match_host_size() {
    let schema = DataSchema::structure(
        "Padded",
        [
            ("a", DataSchema::f32().size_override(16)),
            ("b", DataSchema::f32().align(32)),
        ],
    );
    let (graph, main) = storage_main(schema.clone());
    let program = run(&graph, &[main]).unwrap();
    assert!(
        program
            .code
            .contains("struct Padded {\n  @size(16) a: f32,\n  @align(32) b: f32,\n}")
    );
    assert_eq!(
        program.bindings.get(0, 0).unwrap().min_binding_size,
        size_of(&schema).unwrap()
    );
}

#[test]
fn test_invalid_stride_fails_without_output() {
    let mut builder = GraphBuilder::new();
    let points = builder.add_binding(
        BindingNode::storage(
            0,
            0,
            StorageAccess::Read,
            DataSchema::array(DataSchema::vec3f(), 4).stride(8),
        )
        .with_label("points"),
    );
    let main = builder.add_function(
        func("main", vec![])
            .with_external("points", points)
            .entry(ShaderStage::compute(1)),
    );
    let graph = builder.build();

    let err = run(&graph, &[main]).unwrap_err();
    assert_eq!(
        err.kind,
        ResolveErrorKind::Layout(LayoutError::StrideBelowNatural {
            requested: 8,
            natural: 16
        })
    );
}
