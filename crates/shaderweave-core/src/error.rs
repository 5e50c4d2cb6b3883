//! Unified error types for shaderweave.
//!
//! This module provides the error hierarchy for every phase of turning a
//! definition graph into a program: schema layout, buffer marshalling,
//! graph construction, and resolution.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ShaderweaveError (top-level wrapper)
//! ├── SchemaError     - Layout calculation errors
//! │   ├── LayoutError
//! │   └── UnsupportedNestingError
//! ├── MarshalError    - Host-side buffer read/write errors
//! ├── GraphError      - Definition graph construction errors
//! └── ResolveError    - Resolution/code generation errors (kind + trail)
//! ```
//!
//! ## Usage
//!
//! Each phase-specific error can be handled directly, or converted to
//! `ShaderweaveError` for unified handling:
//!
//! ```ignore
//! use shaderweave_core::ShaderweaveError;
//!
//! fn build() -> Result<String, ShaderweaveError> {
//!     let size = shaderweave_core::size_of(&schema)?; // SchemaError -> ShaderweaveError
//!     let program = resolve(&graph, &[main], &bindings, &options)?; // ResolveError -> ShaderweaveError
//!     Ok(program.code)
//! }
//! ```

use thiserror::Error;

use crate::NodeId;
use crate::schema::ScalarKind;

// ============================================================================
// Layout Errors
// ============================================================================

/// Errors from the layout calculator: invalid overrides and malformed schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// An alignment override is not a power of two.
    #[error("alignment override {requested} is not a power of two")]
    NonPowerOfTwoAlignment {
        /// The requested alignment.
        requested: u32,
    },

    /// An alignment override is below the schema's natural alignment.
    #[error("alignment override {requested} narrows the natural alignment {natural}")]
    NarrowingAlignment {
        /// The requested alignment.
        requested: u32,
        /// The natural alignment of the wrapped schema.
        natural: u32,
    },

    /// A size override is below the schema's natural size.
    #[error("size override {requested} is smaller than the natural size {natural}")]
    NarrowingSize {
        /// The requested size.
        requested: u32,
        /// The natural size of the wrapped schema.
        natural: u32,
    },

    /// A size override was applied to a runtime-sized schema.
    #[error("size override is not allowed on a runtime-sized schema")]
    SizeOnRuntimeSized,

    /// An explicit array stride is below the natural element stride.
    #[error("explicit stride {requested} is smaller than the natural stride {natural}")]
    StrideBelowNatural {
        /// The requested stride.
        requested: u32,
        /// The natural stride of the element.
        natural: u32,
    },

    /// An explicit array stride is not a multiple of the element alignment.
    #[error("explicit stride {stride} is not a multiple of the element alignment {align}")]
    MisalignedStride {
        /// The requested stride.
        stride: u32,
        /// The element alignment.
        align: u32,
    },

    /// A stride override was applied to something other than an array.
    #[error("stride override applied to non-array schema '{schema}'")]
    StrideOnNonArray {
        /// Description of the schema.
        schema: String,
    },

    /// Atomics only wrap 32-bit integers.
    #[error("atomic<{kind}> is not supported; atomics hold i32 or u32")]
    InvalidAtomic {
        /// The rejected scalar kind.
        kind: ScalarKind,
    },

    /// Matrices only hold floating point components.
    #[error("matrix components must be f32 or f16, got {kind}")]
    InvalidMatrix {
        /// The rejected scalar kind.
        kind: ScalarKind,
    },

    /// A struct without fields has no valid layout.
    #[error("struct '{name}' has no fields")]
    EmptyStruct {
        /// The struct label (or a placeholder).
        name: String,
    },

    /// An operation that needs a struct received something else.
    #[error("'{schema}' is not a struct")]
    NotAStruct {
        /// Description of the schema.
        schema: String,
    },

    /// The computed size does not fit in 32 bits.
    #[error("size of '{schema}' overflows u32")]
    Overflow {
        /// Description of the schema.
        schema: String,
    },

    /// The schema cannot live in a host-visible buffer.
    #[error("'{schema}' is not host-shareable")]
    NotHostShareable {
        /// Description of the schema.
        schema: String,
    },

    /// Uniform buffers need a fixed size.
    #[error("uniform binding requires a fixed-size schema, got '{schema}'")]
    RuntimeSizedUniform {
        /// Description of the schema.
        schema: String,
    },
    /// A layout decoration sits where WGSL has no attribute for it and it
    /// differs from the natural layout.
    #[error("{decoration} decoration on '{schema}' has no WGSL equivalent")]
    Unrepresentable {
        /// Description of the decorated schema.
        schema: String,
        /// `stride`, `align` or `size`.
        decoration: &'static str,
    },
}

/// Where a runtime-sized array was found that makes its placement illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingViolation {
    /// The array is a struct field but not the last one.
    NotLastField,
    /// The array ends a struct that is itself nested in another schema.
    NestedStruct,
    /// The array is the element type of another array.
    ArrayElement,
}

impl NestingViolation {
    /// Get a human-readable description.
    pub fn as_str(&self) -> &'static str {
        match self {
            NestingViolation::NotLastField => "only the last struct field may be runtime-sized",
            NestingViolation::NestedStruct => "a struct ending in a runtime-sized array cannot be nested",
            NestingViolation::ArrayElement => "array elements cannot be runtime-sized",
        }
    }
}

impl std::fmt::Display for NestingViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A runtime-sized array appears somewhere it is not permitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("runtime-sized array at '{path}' is not allowed: {violation}")]
pub struct UnsupportedNestingError {
    /// Field path from the root schema to the offending array.
    pub path: String,
    /// Which placement rule was violated.
    pub violation: NestingViolation,
}

/// Any error the layout calculator can produce.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Invalid override or malformed schema.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Misplaced runtime-sized array.
    #[error(transparent)]
    UnsupportedNesting(#[from] UnsupportedNestingError),
}

// ============================================================================
// Marshal Errors
// ============================================================================

/// Errors while reading or writing host-side buffers through a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The schema itself has no valid layout.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The value's shape does not match the schema.
    #[error("value mismatch: expected {expected}, found {found}")]
    ValueMismatch {
        /// What the schema expects.
        expected: String,
        /// What the value provided.
        found: String,
    },

    /// The buffer cannot hold the schema.
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// The schema contains something the marshaller cannot encode.
    #[error("cannot marshal {what}")]
    Unsupported {
        /// What could not be marshalled.
        what: String,
    },
}

// ============================================================================
// Graph Errors
// ============================================================================

/// Errors while building a definition graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A reserved handle was defined twice.
    #[error("node {id} is already defined")]
    AlreadyDefined {
        /// The handle.
        id: NodeId,
    },

    /// A handle that was never reserved by this builder was defined.
    #[error("node {id} was not reserved by this builder")]
    NotReserved {
        /// The handle.
        id: NodeId,
    },
}

// ============================================================================
// Resolve Errors
// ============================================================================

/// What went wrong during resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveErrorKind {
    /// A touched schema has an invalid layout.
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// A touched schema misplaces a runtime-sized array.
    #[error(transparent)]
    UnsupportedNesting(#[from] UnsupportedNestingError),

    /// A non-function definition depends on itself.
    #[error("cyclic dependency through '{node}'")]
    CyclicDependency {
        /// The definition that was re-entered.
        node: String,
    },

    /// A slot was read with no override and no default.
    #[error("slot '{slot}' has no binding and no default value")]
    UnresolvedSlot {
        /// The slot's label.
        slot: String,
    },

    /// A reference set points at a handle the graph does not define.
    #[error("'{from}' references unknown node {id}")]
    UnknownReference {
        /// The referring definition.
        from: String,
        /// The dangling handle.
        id: NodeId,
    },

    /// Internal invariant violation: the name registry handed out a duplicate.
    #[error("identifier '{name}' was assigned twice")]
    NameCollision {
        /// The duplicated identifier.
        name: String,
    },

    /// A function body carries an IR version this resolver does not read.
    #[error("'{node}' has IR version {version}, which is not supported")]
    UnsupportedIrVersion {
        /// The function's label.
        node: String,
        /// The version stamp found.
        version: u16,
    },

    /// Two different binding nodes claim the same coordinates.
    #[error(
        "@group({group}) @binding({binding}) is claimed by both '{existing}' and '{conflicting}'"
    )]
    BindingConflict {
        /// Bind group index.
        group: u32,
        /// Binding index within the group.
        binding: u32,
        /// The binding resolved first.
        existing: String,
        /// The binding that collided with it.
        conflicting: String,
    },

    /// A slot override names a node that is not a slot.
    #[error("'{name}' ({id}) is bound as a slot but is not a slot")]
    NotASlot {
        /// The bound handle.
        id: NodeId,
        /// The node's label.
        name: String,
    },

    /// A value cannot be written as a literal.
    #[error("cannot emit value for '{node}': {reason}")]
    InvalidValue {
        /// The definition holding the value.
        node: String,
        /// Why the value is not expressible.
        reason: String,
    },

    /// A struct field name cannot be written as a WGSL member identifier.
    #[error("struct '{schema}' has field '{field}', which is not a valid WGSL identifier")]
    InvalidFieldName {
        /// The struct's label.
        schema: String,
        /// The offending field name.
        field: String,
    },
}

impl From<SchemaError> for ResolveErrorKind {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Layout(e) => ResolveErrorKind::Layout(e),
            SchemaError::UnsupportedNesting(e) => ResolveErrorKind::UnsupportedNesting(e),
        }
    }
}

/// A resolution failure: the kind plus the chain of definitions that led to it.
///
/// `trail` starts at the entry point being resolved and ends at the failing
/// definition.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}{}", trail_suffix(.trail))]
pub struct ResolveError {
    /// What went wrong.
    pub kind: ResolveErrorKind,
    /// Labels from the entry point down to the failing definition.
    pub trail: Vec<String>,
}

fn trail_suffix(trail: &[String]) -> String {
    if trail.is_empty() {
        String::new()
    } else {
        format!(" (via {})", trail.join(" -> "))
    }
}

impl ResolveError {
    /// Create an error with a trail.
    pub fn new(kind: impl Into<ResolveErrorKind>, trail: Vec<String>) -> Self {
        Self {
            kind: kind.into(),
            trail,
        }
    }

    /// The label of the failing definition, if the trail recorded one.
    pub fn node(&self) -> Option<&str> {
        self.trail.last().map(String::as_str)
    }

    /// Check if this is a cyclic dependency.
    pub fn is_cyclic(&self) -> bool {
        matches!(self.kind, ResolveErrorKind::CyclicDependency { .. })
    }

    /// Check if this is a layout error.
    pub fn is_layout(&self) -> bool {
        matches!(self.kind, ResolveErrorKind::Layout(_))
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Top-level error wrapping every phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShaderweaveError {
    /// Layout calculation error.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Buffer marshalling error.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// Graph construction error.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Resolution error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ShaderweaveError {
    /// Check if this is a schema error.
    pub fn is_schema(&self) -> bool {
        matches!(self, ShaderweaveError::Schema(_))
    }

    /// Check if this is a marshalling error.
    pub fn is_marshal(&self) -> bool {
        matches!(self, ShaderweaveError::Marshal(_))
    }

    /// Check if this is a graph construction error.
    pub fn is_graph(&self) -> bool {
        matches!(self, ShaderweaveError::Graph(_))
    }

    /// Check if this is a resolution error.
    pub fn is_resolve(&self) -> bool {
        matches!(self, ShaderweaveError::Resolve(_))
    }
}
