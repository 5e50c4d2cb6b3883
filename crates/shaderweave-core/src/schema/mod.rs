//! Data schemas.
//!
//! A [`DataSchema`] describes the shape of a value as the GPU sees it. Schemas
//! are immutable once built; aggregates share their children through `Arc`,
//! so cloning a schema is cheap and schemas can be read from several
//! resolutions at once.
//!
//! ## Building schemas
//!
//! ```
//! use shaderweave_core::DataSchema;
//!
//! let particle = DataSchema::structure(
//!     "Particle",
//!     [
//!         ("position", DataSchema::vec3f()),
//!         ("scale", DataSchema::f32()),
//!     ],
//! );
//! assert_eq!(particle.size().unwrap(), 16);
//! assert_eq!(particle.alignment().unwrap(), 16);
//! ```
//!
//! Layout overrides (`align`, `size`, `stride`) and IO attributes
//! (`location`, `builtin`) are applied through [`Decorations`]; see
//! [`layout`] for the rules they must follow.

pub mod layout;
pub mod marshal;

use std::fmt;
use std::sync::Arc;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::SchemaError;

// ============================================================================
// Primitive kinds
// ============================================================================

/// Scalar component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive)]
#[repr(u8)]
pub enum ScalarKind {
    Bool = 0,
    I32 = 1,
    U32 = 2,
    F32 = 3,
    F16 = 4,
}

impl ScalarKind {
    /// WGSL spelling of the scalar type.
    pub fn wgsl_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I32 => "i32",
            ScalarKind::U32 => "u32",
            ScalarKind::F32 => "f32",
            ScalarKind::F16 => "f16",
        }
    }

    /// Suffix used by the short vector/matrix aliases (`vec3f`, `mat4x4h`).
    ///
    /// `bool` has no alias and is spelled `vecN<bool>`.
    pub fn alias_suffix(self) -> Option<&'static str> {
        match self {
            ScalarKind::Bool => None,
            ScalarKind::I32 => Some("i"),
            ScalarKind::U32 => Some("u"),
            ScalarKind::F32 => Some("f"),
            ScalarKind::F16 => Some("h"),
        }
    }

    /// Size in bytes of one component.
    pub fn byte_size(self) -> u32 {
        match self {
            ScalarKind::F16 => 2,
            _ => 4,
        }
    }

    /// Whether this is a floating point kind.
    pub fn is_float(self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F16)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl_name())
    }
}

/// Number of components in a vector (or rows/columns in a matrix).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum VectorSize {
    Two = 2,
    Three = 3,
    Four = 4,
}

impl VectorSize {
    /// Component count as a `u32`.
    #[inline]
    pub fn count(self) -> u32 {
        u8::from(self) as u32
    }
}

/// Built-in IO values an entry point can read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive)]
#[repr(u8)]
pub enum Builtin {
    Position = 0,
    VertexIndex = 1,
    InstanceIndex = 2,
    FrontFacing = 3,
    FragDepth = 4,
    SampleIndex = 5,
    SampleMask = 6,
    LocalInvocationId = 7,
    LocalInvocationIndex = 8,
    GlobalInvocationId = 9,
    WorkgroupId = 10,
    NumWorkgroups = 11,
}

impl Builtin {
    /// WGSL spelling used inside `@builtin(...)`.
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Builtin::Position => "position",
            Builtin::VertexIndex => "vertex_index",
            Builtin::InstanceIndex => "instance_index",
            Builtin::FrontFacing => "front_facing",
            Builtin::FragDepth => "frag_depth",
            Builtin::SampleIndex => "sample_index",
            Builtin::SampleMask => "sample_mask",
            Builtin::LocalInvocationId => "local_invocation_id",
            Builtin::LocalInvocationIndex => "local_invocation_index",
            Builtin::GlobalInvocationId => "global_invocation_id",
            Builtin::WorkgroupId => "workgroup_id",
            Builtin::NumWorkgroups => "num_workgroups",
        }
    }
}

// ============================================================================
// Aggregates
// ============================================================================

/// Element count of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayLength {
    /// Known at schema construction.
    Fixed(u32),
    /// Determined by the bound buffer at dispatch time.
    Runtime,
}

/// An array of a single element schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArraySchema {
    pub element: DataSchema,
    pub length: ArrayLength,
}

/// A named struct member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub schema: DataSchema,
}

impl StructField {
    pub fn new(name: impl Into<String>, schema: DataSchema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// An ordered list of named fields, optionally labelled.
///
/// The label becomes the base of the struct's identifier in generated code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructSchema {
    pub label: Option<String>,
    pub fields: Vec<StructField>,
}

impl StructSchema {
    /// Create an unlabelled struct.
    pub fn new<N, I>(fields: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, DataSchema)>,
    {
        Self {
            label: None,
            fields: fields
                .into_iter()
                .map(|(name, schema)| StructField::new(name, schema))
                .collect(),
        }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Find a field by name.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Label or a placeholder, for diagnostics.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or("<anonymous struct>")
    }
}

/// Attributes layered over a schema.
///
/// `align`, `size` and `stride` change the layout and may only widen the
/// natural values. `location` and `builtin` only affect entry-point IO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Decorations {
    pub align: Option<u32>,
    pub size: Option<u32>,
    pub stride: Option<u32>,
    pub location: Option<u32>,
    pub builtin: Option<Builtin>,
}

impl Decorations {
    /// True when no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Decorations::default()
    }
}

/// A schema with explicit decorations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecoratedSchema {
    pub inner: DataSchema,
    pub decorations: Decorations,
}

// ============================================================================
// DataSchema
// ============================================================================

/// The shape of a GPU value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSchema {
    Scalar(ScalarKind),
    Vector(VectorSize, ScalarKind),
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        component: ScalarKind,
    },
    Array(Arc<ArraySchema>),
    Struct(Arc<StructSchema>),
    Atomic(ScalarKind),
    Decorated(Arc<DecoratedSchema>),
}

impl DataSchema {
    // ==========================================================================
    // Constructors
    // ==========================================================================

    pub fn bool() -> Self {
        DataSchema::Scalar(ScalarKind::Bool)
    }

    pub fn i32() -> Self {
        DataSchema::Scalar(ScalarKind::I32)
    }

    pub fn u32() -> Self {
        DataSchema::Scalar(ScalarKind::U32)
    }

    pub fn f32() -> Self {
        DataSchema::Scalar(ScalarKind::F32)
    }

    pub fn f16() -> Self {
        DataSchema::Scalar(ScalarKind::F16)
    }

    /// A vector of `size` components of `kind`.
    pub fn vec(size: VectorSize, kind: ScalarKind) -> Self {
        DataSchema::Vector(size, kind)
    }

    pub fn vec2f() -> Self {
        Self::vec(VectorSize::Two, ScalarKind::F32)
    }

    pub fn vec3f() -> Self {
        Self::vec(VectorSize::Three, ScalarKind::F32)
    }

    pub fn vec4f() -> Self {
        Self::vec(VectorSize::Four, ScalarKind::F32)
    }

    pub fn vec2u() -> Self {
        Self::vec(VectorSize::Two, ScalarKind::U32)
    }

    pub fn vec3u() -> Self {
        Self::vec(VectorSize::Three, ScalarKind::U32)
    }

    pub fn vec4i() -> Self {
        Self::vec(VectorSize::Four, ScalarKind::I32)
    }

    /// A `columns` x `rows` matrix of `component`.
    pub fn mat(columns: VectorSize, rows: VectorSize, component: ScalarKind) -> Self {
        DataSchema::Matrix {
            columns,
            rows,
            component,
        }
    }

    pub fn mat2x2f() -> Self {
        Self::mat(VectorSize::Two, VectorSize::Two, ScalarKind::F32)
    }

    pub fn mat3x3f() -> Self {
        Self::mat(VectorSize::Three, VectorSize::Three, ScalarKind::F32)
    }

    pub fn mat4x4f() -> Self {
        Self::mat(VectorSize::Four, VectorSize::Four, ScalarKind::F32)
    }

    /// A fixed-length array.
    pub fn array(element: DataSchema, length: u32) -> Self {
        DataSchema::Array(Arc::new(ArraySchema {
            element,
            length: ArrayLength::Fixed(length),
        }))
    }

    /// A runtime-length array.
    pub fn runtime_array(element: DataSchema) -> Self {
        DataSchema::Array(Arc::new(ArraySchema {
            element,
            length: ArrayLength::Runtime,
        }))
    }

    /// A labelled struct.
    pub fn structure<N, I>(label: impl Into<String>, fields: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, DataSchema)>,
    {
        DataSchema::Struct(Arc::new(StructSchema::new(fields).with_label(label)))
    }

    pub fn atomic(kind: ScalarKind) -> Self {
        DataSchema::Atomic(kind)
    }

    pub fn atomic_u32() -> Self {
        DataSchema::Atomic(ScalarKind::U32)
    }

    pub fn atomic_i32() -> Self {
        DataSchema::Atomic(ScalarKind::I32)
    }

    // ==========================================================================
    // Decorators
    // ==========================================================================

    /// Apply a change to this schema's decorations.
    ///
    /// Decorating an already decorated schema updates the existing layer
    /// instead of nesting a new one.
    pub fn decorate(self, apply: impl FnOnce(&mut Decorations)) -> Self {
        let (inner, mut decorations) = match self {
            DataSchema::Decorated(d) => (d.inner.clone(), d.decorations.clone()),
            other => (other, Decorations::default()),
        };
        apply(&mut decorations);
        DataSchema::Decorated(Arc::new(DecoratedSchema { inner, decorations }))
    }

    /// Override the alignment. Validated when the layout is computed.
    pub fn align(self, align: u32) -> Self {
        self.decorate(|d| d.align = Some(align))
    }

    /// Override the size. Validated when the layout is computed.
    pub fn size_override(self, size: u32) -> Self {
        self.decorate(|d| d.size = Some(size))
    }

    /// Override the element stride of an array.
    pub fn stride(self, stride: u32) -> Self {
        self.decorate(|d| d.stride = Some(stride))
    }

    /// Mark as a user-defined IO location.
    pub fn location(self, location: u32) -> Self {
        self.decorate(|d| d.location = Some(location))
    }

    /// Mark as a built-in IO value.
    pub fn builtin(self, builtin: Builtin) -> Self {
        self.decorate(|d| d.builtin = Some(builtin))
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    /// The schema with any decoration layers removed.
    pub fn undecorated(&self) -> &DataSchema {
        match self {
            DataSchema::Decorated(d) => d.inner.undecorated(),
            other => other,
        }
    }

    /// Decorations of the outermost layer, if any.
    pub fn decorations(&self) -> Option<&Decorations> {
        match self {
            DataSchema::Decorated(d) => Some(&d.decorations),
            _ => None,
        }
    }

    /// The struct behind this schema, looking through decorations.
    pub fn as_struct(&self) -> Option<&Arc<StructSchema>> {
        match self.undecorated() {
            DataSchema::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// The array behind this schema, looking through decorations.
    pub fn as_array(&self) -> Option<&Arc<ArraySchema>> {
        match self.undecorated() {
            DataSchema::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Whether a `bool` appears anywhere inside; such schemas cannot be
    /// placed in host-visible buffers.
    pub fn contains_bool(&self) -> bool {
        match self {
            DataSchema::Scalar(k) | DataSchema::Vector(_, k) => *k == ScalarKind::Bool,
            DataSchema::Matrix { .. } | DataSchema::Atomic(_) => false,
            DataSchema::Array(a) => a.element.contains_bool(),
            DataSchema::Struct(s) => s.fields.iter().any(|f| f.schema.contains_bool()),
            DataSchema::Decorated(d) => d.inner.contains_bool(),
        }
    }

    /// Byte size under the layout rules.
    pub fn size(&self) -> Result<u32, SchemaError> {
        layout::size_of(self)
    }

    /// Alignment under the layout rules.
    pub fn alignment(&self) -> Result<u32, SchemaError> {
        layout::align_of(self)
    }
}

impl From<StructSchema> for DataSchema {
    fn from(schema: StructSchema) -> Self {
        DataSchema::Struct(Arc::new(schema))
    }
}

impl fmt::Display for DataSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSchema::Scalar(k) => write!(f, "{k}"),
            DataSchema::Vector(n, k) => write!(f, "vec{}<{k}>", n.count()),
            DataSchema::Matrix {
                columns,
                rows,
                component,
            } => write!(f, "mat{}x{}<{component}>", columns.count(), rows.count()),
            DataSchema::Array(a) => match a.length {
                ArrayLength::Fixed(n) => write!(f, "array<{}, {n}>", a.element),
                ArrayLength::Runtime => write!(f, "array<{}>", a.element),
            },
            DataSchema::Struct(s) => write!(f, "struct {}", s.display_name()),
            DataSchema::Atomic(k) => write!(f, "atomic<{k}>"),
            DataSchema::Decorated(d) => write!(f, "{}", d.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_size_from_u8() {
        assert_eq!(VectorSize::try_from(3u8).unwrap(), VectorSize::Three);
        assert!(VectorSize::try_from(5u8).is_err());
        assert_eq!(VectorSize::Four.count(), 4);
    }

    #[test]
    fn decorate_merges_layers() {
        let schema = DataSchema::vec3f().align(16).location(2);
        let DataSchema::Decorated(d) = &schema else {
            panic!("expected decorated schema");
        };
        assert_eq!(d.inner, DataSchema::vec3f());
        assert_eq!(d.decorations.align, Some(16));
        assert_eq!(d.decorations.location, Some(2));
    }

    #[test]
    fn undecorated_strips_layers() {
        let schema = DataSchema::f32().size_override(8);
        assert_eq!(schema.undecorated(), &DataSchema::f32());
        assert!(schema.decorations().is_some());
        assert!(DataSchema::f32().decorations().is_none());
    }

    #[test]
    fn struct_lookup() {
        let schema = DataSchema::structure(
            "Light",
            [("color", DataSchema::vec3f()), ("power", DataSchema::f32())],
        );
        let s = schema.as_struct().unwrap();
        assert_eq!(s.label.as_deref(), Some("Light"));
        assert!(s.field("power").is_some());
        assert!(s.field("missing").is_none());
    }

    #[test]
    fn structural_equality() {
        let a = DataSchema::array(DataSchema::vec4f(), 8);
        let b = DataSchema::array(DataSchema::vec4f(), 8);
        assert_eq!(a, b);
        assert_ne!(a, DataSchema::runtime_array(DataSchema::vec4f()));
    }

    #[test]
    fn contains_bool_looks_through_aggregates() {
        let schema = DataSchema::structure(
            "Flags",
            [("mask", DataSchema::array(DataSchema::bool(), 4))],
        );
        assert!(schema.contains_bool());
        assert!(!DataSchema::mat4x4f().contains_bool());
    }

    #[test]
    fn display_names() {
        assert_eq!(DataSchema::vec3f().to_string(), "vec3<f32>");
        assert_eq!(DataSchema::mat3x3f().to_string(), "mat3x3<f32>");
        assert_eq!(
            DataSchema::runtime_array(DataSchema::u32()).to_string(),
            "array<u32>"
        );
        assert_eq!(
            DataSchema::structure("P", [("x", DataSchema::f32())]).to_string(),
            "struct P"
        );
    }
}
