//! Shaderweave Compiler
//!
//! Turns a [`DefinitionGraph`](shaderweave_registry::DefinitionGraph) and a
//! set of entry points into one WGSL program plus its binding-layout table.
//!
//! ## Architecture
//!
//! - **Keying**: every reached function, constant and binding is keyed by the
//!   values of the slots it can observe ([`slots`])
//! - **Naming**: each distinct key gets a fresh module-scope identifier
//!   ([`names`]); locals are renamed around them ([`scope`])
//! - **Emission**: declarations are printed in dependency order ([`emit`])
//!
//! ## Modules
//!
//! - [`context`]: per-resolution state
//! - [`emit`]: WGSL text for types, values and bodies
//! - [`layout_table`]: the binding-layout table handed to hosts
//! - [`names`]: identifier sanitizing and the module-scope name registry
//! - [`options`]: resolution options
//! - [`resolver`]: the traversal itself
//! - [`scope`]: local scope management for function bodies
//! - [`slots`]: override stack, resolution keys and the declaration cache
//!
//! ## Example
//!
//! ```
//! use shaderweave_compiler::{ResolveOptions, resolve};
//! use shaderweave_core::ir::{Expr, FunctionBody, Stmt};
//! use shaderweave_core::{DataSchema, Value};
//! use shaderweave_registry::{FunctionNode, GraphBuilder, SlotBindings, SlotNode};
//!
//! let mut builder = GraphBuilder::new();
//! let gain = builder.add_slot(SlotNode::new().with_label("gain").with_default(Value::f32(1.0)));
//! let main = builder.add_function(
//!     FunctionNode::new(FunctionBody::new(vec![Stmt::ret(Expr::ident("gain"))]))
//!         .with_label("gain_value")
//!         .returns(DataSchema::f32())
//!         .with_external("gain", gain),
//! );
//! let graph = builder.build();
//!
//! let bindings = SlotBindings::new().with(gain, Value::f32(0.5));
//! let program = resolve(&graph, &[main], &bindings, &ResolveOptions::default()).unwrap();
//! assert!(program.code.contains("return 0.5f;"));
//! ```

pub mod context;
pub mod emit;
pub mod layout_table;
pub mod names;
pub mod options;
pub mod resolver;
pub mod scope;
pub mod slots;

pub use context::ResolutionContext;
pub use emit::{BodyEmitter, CodeWriter, StructNames};
pub use layout_table::{BindingEntry, BindingLayoutTable, ShaderStages};
pub use names::{NameRegistry, is_reserved, sanitize};
pub use options::{NamingStrategy, ResolveOptions};
pub use resolver::{EntryPoint, ResolvedProgram, resolve};
pub use scope::{BodyScope, LocalVar};
pub use slots::{EntryState, OverrideStack, ResolutionCache, ResolutionKey};

// Re-export ResolveError from core for convenience
pub use shaderweave_core::{ResolveError, ResolveErrorKind};
