//! Shaderweave
//!
//! Compose WGSL programs from a graph of typed definitions. Functions,
//! constants, compile-time slots and buffer bindings are added to a
//! [`GraphBuilder`](registry::GraphBuilder); [`resolve`](compiler::resolve)
//! turns any set of entry points into one program, specializing helpers per
//! slot value and sharing everything else.
//!
//! The workspace is split the same way the pipeline is:
//!
//! - [`core`]: schemas, layout calculation, buffer marshalling, IR, errors
//! - [`registry`]: the definition graph
//! - [`compiler`]: resolution into WGSL plus the binding-layout table
//!
//! # Example
//!
//! ```
//! use shaderweave::prelude::*;
//!
//! let mut builder = GraphBuilder::new();
//! let particles = builder.add_binding(
//!     BindingNode::storage(
//!         0,
//!         0,
//!         StorageAccess::ReadWrite,
//!         DataSchema::runtime_array(DataSchema::vec4f()),
//!     )
//!     .with_label("particles"),
//! );
//! let main = builder.add_function(
//!     FunctionNode::new(FunctionBody::new(vec![Stmt::expr(Expr::assign(
//!         Expr::index(Expr::ident("particles"), Expr::num("0u")),
//!         Expr::call("vec4f", vec![Expr::num("0.0")]),
//!     ))]))
//!     .with_label("main")
//!     .with_external("particles", particles)
//!     .entry(ShaderStage::compute(64)),
//! );
//! let graph = builder.build();
//!
//! let program = resolve(&graph, &[main], &SlotBindings::new(), &ResolveOptions::default())?;
//! assert!(program.code.contains("var<storage, read_write> particles: array<vec4f>;"));
//! assert_eq!(program.bindings.get(0, 0).map(|b| b.visibility), Some(ShaderStages::COMPUTE));
//! # Ok::<(), shaderweave::core::ResolveError>(())
//! ```

pub use shaderweave_compiler as compiler;
pub use shaderweave_core as core;
pub use shaderweave_registry as registry;

pub use shaderweave_compiler::{ResolvedProgram, resolve};
pub use shaderweave_core::ShaderweaveError;

/// Everything needed to build a graph and resolve it.
pub mod prelude {
    pub use shaderweave_compiler::{
        BindingEntry, BindingLayoutTable, EntryPoint, NamingStrategy, ResolveOptions,
        ResolvedProgram, ShaderStages, resolve,
    };
    pub use shaderweave_core::ir::{
        AssignOp, BinaryOp, Expr, FunctionBody, LogicalOp, Stmt, UnaryOp,
    };
    pub use shaderweave_core::schema::marshal;
    pub use shaderweave_core::{
        ArrayLength, Builtin, DataSchema, Layout, LayoutError, MarshalError, ResolveError,
        ResolveErrorKind, ScalarKind, SchemaError, ShaderweaveError, SlotValue, StructSchema,
        Value, VectorSize, align_of, layout_of, offsets, size_for_length, size_of, stride,
    };
    pub use shaderweave_registry::{
        BindingKind, BindingNode, ConstantNode, DefinitionGraph, FunctionNode, GraphBuilder, Node,
        NodeId, ShaderStage, SlotBindings, SlotNode, StorageAccess,
    };
}
