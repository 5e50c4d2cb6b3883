//! Resolution benchmarks.
//!
//! Measures the resolver on synthetic graphs:
//! - Chains: entry points calling a linear chain of helpers (10 to 1000 deep)
//! - Specialization: one helper reached under many slot values
//! - Sharing: many entry points reaching one helper library
//! - Layout: nested struct schemas through the layout calculator
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect scope timings for
//! `resolve` and the layout calculator:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

#![allow(clippy::collapsible_if)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use shaderweave::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[cfg(feature = "profile-with-puffin")]
fn collect_scopes(
    stream: &puffin::Stream,
    scope: &puffin::Scope,
    collection: &puffin::ScopeCollection,
    timings: &mut HashMap<String, i64>,
) {
    use puffin::Reader;

    if let Some(details) = collection.fetch_by_id(&scope.id) {
        *timings.entry(details.name().to_string()).or_insert(0) += scope.record.duration_ns;
    }

    if scope.child_begin_position < scope.child_end_position {
        if let Ok(reader) = Reader::with_offset(stream, scope.child_begin_position) {
            if let Ok(children) = reader.read_top_scopes() {
                for child in children {
                    collect_scopes(stream, &child, collection, timings);
                }
            }
        }
    }
}

/// Print average time per frame for every recorded scope.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };

    let view = frame_view.lock();
    let collection = view.scope_collection();
    let mut timings: HashMap<String, i64> = HashMap::new();
    let mut frames = 0i64;

    for frame in view.recent_frames() {
        frames += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            if let Ok(scopes) = reader.read_top_scopes() {
                for scope in scopes {
                    collect_scopes(&stream_info.stream, &scope, collection, &mut timings);
                }
            }
        }
    }

    println!("\n=== Resolver Profile ({frames} frames) ===");
    let mut entries: Vec<_> = timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg = if frames > 0 { ns / frames } else { ns };
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos(avg as u64)
        );
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

// ============================================================================
// Graph Generators
// ============================================================================

/// `depth` helpers, each calling the previous one, plus a compute entry
/// point at the end of the chain.
fn chain_graph(depth: usize) -> (DefinitionGraph, NodeId) {
    let mut builder = GraphBuilder::new();
    let mut previous = builder.add_function(
        FunctionNode::new(FunctionBody::new(vec![Stmt::ret(Expr::ident("x"))]))
            .with_label("step")
            .with_param("x", DataSchema::f32())
            .returns(DataSchema::f32()),
    );
    for _ in 1..depth {
        previous = builder.add_function(
            FunctionNode::new(FunctionBody::new(vec![Stmt::ret(Expr::binary(
                BinaryOp::Add,
                Expr::call("next", vec![Expr::ident("x")]),
                Expr::num("1.0"),
            ))]))
            .with_label("step")
            .with_param("x", DataSchema::f32())
            .returns(DataSchema::f32())
            .with_external("next", previous),
        );
    }
    let main = builder.add_function(
        FunctionNode::new(FunctionBody::new(vec![Stmt::expr(Expr::call(
            "chain",
            vec![Expr::num("0.0")],
        ))]))
        .with_label("main")
        .with_external("chain", previous)
        .entry(ShaderStage::compute(64)),
    );
    (builder.build(), main)
}

/// One slot-reading helper specialized `count` times.
fn specialization_graph(count: u32) -> (DefinitionGraph, Vec<NodeId>) {
    let mut builder = GraphBuilder::new();
    let factor = builder.add_slot(SlotNode::new().with_label("factor"));
    let scale = builder.add_function(
        FunctionNode::new(FunctionBody::new(vec![Stmt::ret(Expr::binary(
            BinaryOp::Mul,
            Expr::ident("x"),
            Expr::ident("factor"),
        ))]))
        .with_label("scale")
        .with_param("x", DataSchema::f32())
        .returns(DataSchema::f32())
        .with_external("factor", factor),
    );
    let entries = (0..count)
        .map(|i| {
            builder.add_specialized(
                scale,
                SlotBindings::new().with(factor, Value::U32(i)),
            )
        })
        .collect();
    (builder.build(), entries)
}

/// `entries` entry points sharing one helper library of `helpers` functions.
fn shared_library_graph(entries: usize, helpers: usize) -> (DefinitionGraph, Vec<NodeId>) {
    let mut builder = GraphBuilder::new();
    let library: Vec<NodeId> = (0..helpers)
        .map(|_| {
            builder.add_function(
                FunctionNode::new(FunctionBody::new(vec![Stmt::ret(Expr::num("1.0"))]))
                    .with_label("lib")
                    .returns(DataSchema::f32()),
            )
        })
        .collect();

    let entry_points = (0..entries)
        .map(|_| {
            let mut node = FunctionNode::new(FunctionBody::new(
                (0..helpers)
                    .map(|i| Stmt::expr(Expr::call(format!("h{i}"), vec![])))
                    .collect(),
            ))
            .with_label("entry")
            .entry(ShaderStage::Fragment);
            for (i, &helper) in library.iter().enumerate() {
                node = node.with_external(format!("h{i}"), helper);
            }
            builder.add_function(node)
        })
        .collect();
    (builder.build(), entry_points)
}

/// Structs nested `depth` levels, each adding a vec3f and an array field.
fn nested_schema(depth: usize) -> DataSchema {
    let mut schema = DataSchema::structure(
        "Leaf",
        [("position", DataSchema::vec3f()), ("weight", DataSchema::f32())],
    );
    for _ in 0..depth {
        schema = DataSchema::structure(
            "Node",
            [
                ("normal", DataSchema::vec3f()),
                ("children", DataSchema::array(schema, 4)),
                ("flags", DataSchema::u32()),
            ],
        );
    }
    schema
}

// ============================================================================
// Benchmarks
// ============================================================================

fn chain_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let options = ResolveOptions::default();
    let bindings = SlotBindings::new();

    let mut group = c.benchmark_group("resolve/chain");
    for depth in [10usize, 100, 1000] {
        let (graph, main) = chain_graph(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let program = resolve(&graph, black_box(&[main]), &bindings, &options).unwrap();
                end_profiling_frame();
                black_box(program.code.len())
            });
        });
    }
    group.finish();

    print_profiling_stats();
}

fn specialization_benchmarks(c: &mut Criterion) {
    let options = ResolveOptions::default();
    let bindings = SlotBindings::new();

    let mut group = c.benchmark_group("resolve/specialization");
    for count in [4u32, 64, 512] {
        let (graph, entries) = specialization_graph(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let program = resolve(&graph, black_box(&entries), &bindings, &options).unwrap();
                black_box(program.entry_points.len())
            });
        });
    }
    group.finish();
}

fn sharing_benchmarks(c: &mut Criterion) {
    let options = ResolveOptions::default();
    let bindings = SlotBindings::new();

    let mut group = c.benchmark_group("resolve/shared_library");
    for (entries, helpers) in [(8usize, 16usize), (64, 64)] {
        let (graph, entry_points) = shared_library_graph(entries, helpers);
        let id = format!("{entries}x{helpers}");
        group.bench_function(id, |b| {
            b.iter(|| {
                let program =
                    resolve(&graph, black_box(&entry_points), &bindings, &options).unwrap();
                black_box(program.code.len())
            });
        });
    }
    group.finish();
}

fn layout_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/nested");
    for depth in [1usize, 4, 8] {
        let schema = nested_schema(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &schema, |b, schema| {
            b.iter(|| black_box(layout_of(black_box(schema)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    chain_benchmarks,
    specialization_benchmarks,
    sharing_benchmarks,
    layout_benchmarks
);
criterion_main!(benches);
