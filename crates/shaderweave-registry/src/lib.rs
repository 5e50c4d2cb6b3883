//! Shaderweave definition graph.
//!
//! A [`DefinitionGraph`] is an arena of [`Node`]s addressed by [`NodeId`].
//! Every node carries its references to other nodes explicitly, fixed when
//! the node is built, so the resolver never has to discover dependencies by
//! inspecting function bodies.
//!
//! Graphs are assembled with a [`GraphBuilder`] and frozen by
//! [`GraphBuilder::build`], which also computes each node's transitive
//! slot-dependency set once. A frozen graph is immutable and can be shared
//! across threads for concurrent resolutions.
//!
//! # Example
//!
//! ```
//! use shaderweave_core::ir::{Expr, FunctionBody, Stmt};
//! use shaderweave_core::{DataSchema, Value};
//! use shaderweave_registry::{FunctionNode, GraphBuilder, SlotNode};
//!
//! let mut builder = GraphBuilder::new();
//! let scale = builder.add(SlotNode::new().with_label("scale").with_default(Value::f32(1.0)));
//! let apply = builder.add(
//!     FunctionNode::new(FunctionBody::new(vec![Stmt::ret(Expr::ident("scale"))]))
//!         .with_label("apply")
//!         .returns(DataSchema::f32())
//!         .with_external("scale", scale),
//! );
//!
//! let graph = builder.build();
//! assert_eq!(graph.slot_dependencies(apply), &[scale]);
//! ```

mod dependencies;
mod graph;
mod nodes;

pub use graph::{DefinitionGraph, GraphBuilder};
pub use nodes::{
    BindingKind, BindingNode, BindingSchema, ConstantInit, ConstantNode, Externals, FunctionNode,
    Node, Param, SchemaFactory, ShaderStage, SlotBindings, SlotNode, StorageAccess,
};

pub use shaderweave_core::{GraphError, NodeId};
