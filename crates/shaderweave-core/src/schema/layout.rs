//! Memory layout calculator.
//!
//! Computes size, alignment, struct field offsets and array strides for
//! [`DataSchema`]s following WGSL's host-shareable layout rules:
//!
//! | Schema            | Size                        | Alignment            |
//! |-------------------|-----------------------------|----------------------|
//! | `f32 i32 u32 bool`| 4                           | 4                    |
//! | `f16`             | 2                           | 2                    |
//! | `vec2<T>`         | 2 × size(T)                 | 2 × size(T)          |
//! | `vec3<T>`         | 3 × size(T)                 | 4 × size(T)          |
//! | `vec4<T>`         | 4 × size(T)                 | 4 × size(T)          |
//! | `matCxR<T>`       | C × stride(vecR<T>)         | align(vecR<T>)       |
//! | `array<E, N>`     | N × stride(E)               | align(E)             |
//! | `struct`          | round_up(end, align)        | max(field aligns)    |
//!
//! Overrides only widen: an explicit alignment must be a power of two no
//! smaller than the natural one, an explicit size no smaller than the
//! natural size, and an explicit stride no smaller than the natural stride
//! and a multiple of the element alignment.
//!
//! A runtime-sized array may only be the root schema or the last field of
//! the root struct. It contributes nothing to `size`; use
//! [`size_for_length`] for the size of a concrete buffer.
//!
//! All results are pure functions of the schema's structure, so
//! [`LayoutCache`] memoizes them per distinct structure.

use super::{
    ArrayLength, ArraySchema, DataSchema, DecoratedSchema, ScalarKind, StructSchema, VectorSize,
};
use crate::SchemaMap;
use crate::error::{LayoutError, NestingViolation, SchemaError, UnsupportedNestingError};

// ============================================================================
// Types
// ============================================================================

/// Size and alignment of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Size in bytes. For runtime-sized schemas, the size with zero elements.
    pub size: u32,
    /// Alignment in bytes. Always a power of two.
    pub align: u32,
    /// Whether the schema ends in a runtime-sized array.
    pub runtime_sized: bool,
}

impl Layout {
    const fn sized(size: u32, align: u32) -> Self {
        Self {
            size,
            align,
            runtime_sized: false,
        }
    }

    /// Distance between consecutive elements when this layout is an array
    /// element. `None` if it does not fit in a `u32`.
    pub fn natural_stride(&self) -> Option<u32> {
        round_up(self.size, self.align)
    }
}

/// Placement of one struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOffset {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    pub align: u32,
}

/// Ordered field placements of a struct.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOffsets(Vec<FieldOffset>);

impl FieldOffsets {
    /// Offset of the named field.
    pub fn get(&self, name: &str) -> Option<u32> {
        self.field(name).map(|f| f.offset)
    }

    /// Full placement of the named field.
    pub fn field(&self, name: &str) -> Option<&FieldOffset> {
        self.0.iter().find(|f| f.name == name)
    }

    /// Iterate placements in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldOffset> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Placement of the last field.
    pub fn last(&self) -> Option<&FieldOffset> {
        self.0.last()
    }
}

/// Layout of a struct together with its field placements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub layout: Layout,
    pub fields: FieldOffsets,
}

/// Where a schema sits relative to the root, which decides whether a
/// runtime-sized array is legal there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Tail,
    Nested(NestingViolation),
}

/// Round `value` up to the next multiple of `align`, or `None` on overflow.
#[inline]
pub fn round_up(value: u32, align: u32) -> Option<u32> {
    value.div_ceil(align).checked_mul(align)
}

// ============================================================================
// Public operations
// ============================================================================

/// Compute the layout of a schema.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn layout_of(schema: &DataSchema) -> Result<Layout, SchemaError> {
    compute(schema, Position::Root, &mut Vec::new())
}

/// Byte size of a schema.
pub fn size_of(schema: &DataSchema) -> Result<u32, SchemaError> {
    layout_of(schema).map(|l| l.size)
}

/// Alignment of a schema.
pub fn align_of(schema: &DataSchema) -> Result<u32, SchemaError> {
    layout_of(schema).map(|l| l.align)
}

/// Field offsets of a struct schema (decorations are looked through).
pub fn offsets(schema: &DataSchema) -> Result<FieldOffsets, SchemaError> {
    struct_layout_of(schema).map(|l| l.fields)
}

/// Layout and field placements of a struct schema.
pub fn struct_layout_of(schema: &DataSchema) -> Result<StructLayout, SchemaError> {
    // Validate the whole schema first so overrides on the wrapper are checked.
    layout_of(schema)?;
    match schema.undecorated() {
        DataSchema::Struct(s) => struct_layout(s, Position::Root, &mut Vec::new()),
        other => Err(LayoutError::NotAStruct {
            schema: other.to_string(),
        }
        .into()),
    }
}

/// Stride of an array of `element`, optionally with an explicit override.
pub fn stride(element_schema: &DataSchema, explicit: Option<u32>) -> Result<u32, SchemaError> {
    let element = compute(
        element_schema,
        Position::Nested(NestingViolation::ArrayElement),
        &mut vec!["[]".to_string()],
    )?;
    Ok(stride_for(element_schema, element, explicit)?)
}

/// Size of a schema holding `length` elements in its runtime-sized array.
///
/// Fixed-size schemas ignore `length`.
pub fn size_for_length(schema: &DataSchema, length: u32) -> Result<u32, SchemaError> {
    let layout = layout_of(schema)?;
    if !layout.runtime_sized {
        return Ok(layout.size);
    }

    let overflow = || LayoutError::Overflow {
        schema: schema.to_string(),
    };

    if let Some(s) = schema.as_struct() {
        let fields = offsets(schema)?;
        let (Some(tail), Some(last)) = (fields.last(), s.fields.last()) else {
            return Ok(layout.size);
        };
        let tail_stride = array_stride(&last.schema)?.unwrap_or(0);
        let end = tail_stride
            .checked_mul(length)
            .and_then(|bytes| bytes.checked_add(tail.offset))
            .ok_or_else(overflow)?;
        return round_up(end, layout.align).ok_or_else(|| overflow().into());
    }

    let element_stride = array_stride(schema)?.unwrap_or(0);
    element_stride
        .checked_mul(length)
        .ok_or_else(|| overflow().into())
}

/// Element stride of an array schema, honoring an explicit stride decoration.
///
/// Returns `None` for schemas that are not arrays.
pub fn array_stride(schema: &DataSchema) -> Result<Option<u32>, SchemaError> {
    let explicit = schema.decorations().and_then(|d| d.stride);
    match schema.as_array() {
        Some(array) => stride(&array.element, explicit).map(Some),
        None => Ok(None),
    }
}

// ============================================================================
// Computation
// ============================================================================

fn compute(
    schema: &DataSchema,
    position: Position,
    path: &mut Vec<String>,
) -> Result<Layout, SchemaError> {
    match schema {
        DataSchema::Scalar(kind) => Ok(Layout::sized(kind.byte_size(), kind.byte_size())),
        DataSchema::Vector(size, kind) => {
            let component = kind.byte_size();
            let bytes = size.count() * component;
            let align = match size {
                VectorSize::Three => 4 * component,
                _ => bytes,
            };
            Ok(Layout::sized(bytes, align))
        }
        DataSchema::Matrix {
            columns,
            rows,
            component,
        } => {
            if !component.is_float() {
                return Err(LayoutError::InvalidMatrix { kind: *component }.into());
            }
            let column = compute(&DataSchema::Vector(*rows, *component), position, path)?;
            let column_stride = column.natural_stride().ok_or_else(|| LayoutError::Overflow {
                schema: schema.to_string(),
            })?;
            Ok(Layout::sized(columns.count() * column_stride, column.align))
        }
        DataSchema::Atomic(kind) => match kind {
            ScalarKind::I32 | ScalarKind::U32 => Ok(Layout::sized(4, 4)),
            other => Err(LayoutError::InvalidAtomic { kind: *other }.into()),
        },
        DataSchema::Array(array) => array_layout(array, None, position, path),
        DataSchema::Struct(s) => struct_layout(s, position, path).map(|l| l.layout),
        DataSchema::Decorated(d) => decorated_layout(d, position, path),
    }
}

fn array_layout(
    array: &ArraySchema,
    explicit_stride: Option<u32>,
    position: Position,
    path: &mut Vec<String>,
) -> Result<Layout, SchemaError> {
    path.push("[]".to_string());
    let element = compute(
        &array.element,
        Position::Nested(NestingViolation::ArrayElement),
        path,
    );
    path.pop();
    let element = element?;
    let stride = stride_for(&array.element, element, explicit_stride)?;

    match array.length {
        ArrayLength::Fixed(n) => {
            let size = stride.checked_mul(n).ok_or_else(|| LayoutError::Overflow {
                schema: format!("array<{}, {n}>", array.element),
            })?;
            Ok(Layout::sized(size, element.align))
        }
        ArrayLength::Runtime => match position {
            Position::Root | Position::Tail => Ok(Layout {
                size: 0,
                align: element.align,
                runtime_sized: true,
            }),
            Position::Nested(violation) => Err(UnsupportedNestingError {
                path: display_path(path),
                violation,
            }
            .into()),
        },
    }
}

fn struct_layout(
    schema: &StructSchema,
    position: Position,
    path: &mut Vec<String>,
) -> Result<StructLayout, SchemaError> {
    if schema.fields.is_empty() {
        return Err(LayoutError::EmptyStruct {
            name: schema.display_name().to_string(),
        }
        .into());
    }
    if path.is_empty() {
        path.push(schema.display_name().to_string());
    }

    let overflow = || LayoutError::Overflow {
        schema: schema.display_name().to_string(),
    };
    let last = schema.fields.len() - 1;
    let mut offset = 0u32;
    let mut align = 1u32;
    let mut runtime_sized = false;
    let mut fields = Vec::with_capacity(schema.fields.len());

    for (index, field) in schema.fields.iter().enumerate() {
        let field_position = match (position, index == last) {
            (Position::Root, true) => Position::Tail,
            (_, false) => Position::Nested(NestingViolation::NotLastField),
            (_, true) => Position::Nested(NestingViolation::NestedStruct),
        };

        path.push(field.name.clone());
        let field_layout = compute(&field.schema, field_position, path);
        path.pop();
        let field_layout = field_layout?;

        offset = round_up(offset, field_layout.align).ok_or_else(overflow)?;
        fields.push(FieldOffset {
            name: field.name.clone(),
            offset,
            size: field_layout.size,
            align: field_layout.align,
        });
        offset = offset.checked_add(field_layout.size).ok_or_else(overflow)?;
        align = align.max(field_layout.align);
        runtime_sized |= field_layout.runtime_sized;
    }

    Ok(StructLayout {
        layout: Layout {
            size: round_up(offset, align).ok_or_else(overflow)?,
            align,
            runtime_sized,
        },
        fields: FieldOffsets(fields),
    })
}

fn decorated_layout(
    schema: &DecoratedSchema,
    position: Position,
    path: &mut Vec<String>,
) -> Result<Layout, SchemaError> {
    let decorations = &schema.decorations;
    let mut layout = match (decorations.stride, &schema.inner) {
        (None, inner) => compute(inner, position, path)?,
        (Some(stride), DataSchema::Array(array)) => {
            array_layout(array, Some(stride), position, path)?
        }
        (Some(_), inner) => {
            return Err(LayoutError::StrideOnNonArray {
                schema: inner.to_string(),
            }
            .into());
        }
    };

    if let Some(align) = decorations.align {
        if !align.is_power_of_two() {
            return Err(LayoutError::NonPowerOfTwoAlignment { requested: align }.into());
        }
        if align < layout.align {
            return Err(LayoutError::NarrowingAlignment {
                requested: align,
                natural: layout.align,
            }
            .into());
        }
        layout.align = align;
    }

    if let Some(size) = decorations.size {
        if layout.runtime_sized {
            return Err(LayoutError::SizeOnRuntimeSized.into());
        }
        if size < layout.size {
            return Err(LayoutError::NarrowingSize {
                requested: size,
                natural: layout.size,
            }
            .into());
        }
        layout.size = size;
    }

    Ok(layout)
}

fn stride_for(
    schema: &DataSchema,
    element: Layout,
    explicit: Option<u32>,
) -> Result<u32, LayoutError> {
    let natural = element.natural_stride().ok_or_else(|| LayoutError::Overflow {
        schema: schema.to_string(),
    })?;
    match explicit {
        None => Ok(natural),
        Some(requested) if requested < natural => {
            Err(LayoutError::StrideBelowNatural { requested, natural })
        }
        Some(requested) if requested % element.align != 0 => Err(LayoutError::MisalignedStride {
            stride: requested,
            align: element.align,
        }),
        Some(requested) => Ok(requested),
    }
}

fn display_path(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        if segment != "[]" && !out.is_empty() {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}

// ============================================================================
// Cache
// ============================================================================

/// Memoizes layouts per distinct schema structure.
///
/// Errors are not cached; a failing schema is recomputed (and fails again)
/// on every request.
#[derive(Debug, Default, Clone)]
pub struct LayoutCache {
    layouts: SchemaMap<Layout>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout of `schema`, computed at most once per distinct structure.
    pub fn layout_of(&mut self, schema: &DataSchema) -> Result<Layout, SchemaError> {
        if let Some(layout) = self.layouts.get(schema) {
            return Ok(*layout);
        }
        let layout = layout_of(schema)?;
        self.layouts.insert(schema.clone(), layout);
        Ok(layout)
    }

    /// Number of cached layouts.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
