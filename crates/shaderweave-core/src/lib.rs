//! Shaderweave core types.
//!
//! Everything the resolver and its collaborators share lives here:
//!
//! - [`schema`]: data schemas, the layout calculator and buffer marshalling
//! - [`ir`]: the simplified function-body IR produced by the front-end
//! - [`error`]: the error taxonomy for every phase
//! - [`NodeId`]: stable handles into a definition graph
//! - [`SchemaHash`]: structural fingerprints for schema deduplication
//! - [`Value`] / [`SlotValue`]: compile-time values bound to constants and slots

pub mod error;
pub mod ir;
mod node_id;
pub mod schema;
mod schema_hash;
mod value;

pub use error::{
    GraphError, LayoutError, MarshalError, NestingViolation, ResolveError, ResolveErrorKind,
    SchemaError, ShaderweaveError, UnsupportedNestingError,
};
pub use node_id::NodeId;
pub use schema::layout::{
    FieldOffset, FieldOffsets, Layout, LayoutCache, StructLayout, align_of, array_stride,
    layout_of, offsets, round_up, size_for_length, size_of, stride, struct_layout_of,
};
pub use schema::{
    ArrayLength, ArraySchema, Builtin, DataSchema, DecoratedSchema, Decorations, ScalarKind,
    StructField, StructSchema, VectorSize,
};
pub use schema_hash::{SchemaHash, SchemaMap};
pub use value::{SlotValue, Value};
