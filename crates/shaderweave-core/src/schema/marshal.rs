//! Host-side buffer marshalling.
//!
//! Reads and writes [`Value`]s at the offsets the layout calculator assigns,
//! so that bytes produced here can be uploaded to a buffer declared with the
//! same schema in WGSL. All encodings are little-endian.
//!
//! - `bool` is stored as a `u32` holding 0 or 1
//! - atomics are stored as their underlying scalar
//! - padding bytes are left untouched on write and ignored on read
//! - a runtime-sized array reads as many whole elements as the buffer holds
//!
//! `f16` values are not supported.

use std::sync::Arc;

use super::layout::{array_stride, layout_of, size_for_length, struct_layout_of};
use super::{ArrayLength, DataSchema, ScalarKind, VectorSize};
use crate::error::{LayoutError, MarshalError, SchemaError};
use crate::value::Value;

/// Write `value` into `buf` according to `schema`.
///
/// Returns the number of bytes the value occupies.
pub fn write(schema: &DataSchema, value: &Value, buf: &mut [u8]) -> Result<usize, MarshalError> {
    let needed = encoded_size(schema, value)?;
    if buf.len() < needed {
        return Err(MarshalError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    write_at(schema, value, buf, 0)?;
    Ok(needed)
}

/// Encode `value` into a freshly allocated buffer of exactly the right size.
pub fn to_bytes(schema: &DataSchema, value: &Value) -> Result<Vec<u8>, MarshalError> {
    let mut buf = vec![0u8; encoded_size(schema, value)?];
    write_at(schema, value, &mut buf, 0)?;
    Ok(buf)
}

/// Decode a value of `schema` from the start of `buf`.
pub fn read(schema: &DataSchema, buf: &[u8]) -> Result<Value, MarshalError> {
    let layout = layout_of(schema)?;
    let needed = layout.size as usize;
    if buf.len() < needed {
        return Err(MarshalError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }
    read_at(schema, buf, 0)
}

/// Bytes needed to hold `value`, accounting for the length of a trailing
/// runtime-sized array.
fn encoded_size(schema: &DataSchema, value: &Value) -> Result<usize, MarshalError> {
    let layout = layout_of(schema)?;
    if !layout.runtime_sized {
        return Ok(layout.size as usize);
    }

    let runtime_elements = match (schema.undecorated(), value) {
        (DataSchema::Array(_), Value::Array(elements)) => elements.len(),
        (DataSchema::Struct(_), Value::Struct { fields, .. }) => match fields.last() {
            Some(Value::Array(elements)) => elements.len(),
            _ => 0,
        },
        _ => 0,
    };
    Ok(size_for_length(schema, runtime_elements as u32)? as usize)
}

fn mismatch(schema: &DataSchema, value: &Value) -> MarshalError {
    MarshalError::ValueMismatch {
        expected: schema.to_string(),
        found: value.describe(),
    }
}

fn region(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], MarshalError> {
    buf.get(offset..offset + len)
        .ok_or(MarshalError::BufferTooSmall {
            needed: offset + len,
            available: buf.len(),
        })
}

fn region_mut(buf: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8], MarshalError> {
    let available = buf.len();
    buf.get_mut(offset..offset + len)
        .ok_or(MarshalError::BufferTooSmall {
            needed: offset + len,
            available,
        })
}

/// Column stride of a matrix: each column is laid out like a vector.
fn column_stride(rows: VectorSize, component: ScalarKind) -> Result<usize, MarshalError> {
    let column = DataSchema::vec(rows, component);
    let stride = layout_of(&column)?
        .natural_stride()
        .ok_or_else(|| SchemaError::from(LayoutError::Overflow {
            schema: column.to_string(),
        }))?;
    Ok(stride as usize)
}

// ============================================================================
// Writing
// ============================================================================

fn write_at(
    schema: &DataSchema,
    value: &Value,
    buf: &mut [u8],
    offset: usize,
) -> Result<(), MarshalError> {
    match (schema.undecorated(), value) {
        (DataSchema::Scalar(kind) | DataSchema::Atomic(kind), _) => {
            write_scalar(*kind, value, buf, offset)
        }
        (DataSchema::Vector(size, kind), Value::Vector(components))
            if components.len() == size.count() as usize =>
        {
            let step = kind.byte_size() as usize;
            for (i, component) in components.iter().enumerate() {
                write_scalar(*kind, component, buf, offset + i * step)?;
            }
            Ok(())
        }
        (
            DataSchema::Matrix {
                columns,
                rows,
                component,
            },
            Value::Matrix(cols),
        ) if cols.len() == columns.count() as usize => {
            let column_schema = DataSchema::vec(*rows, *component);
            let step = column_stride(*rows, *component)?;
            for (i, column) in cols.iter().enumerate() {
                write_at(&column_schema, column, buf, offset + i * step)?;
            }
            Ok(())
        }
        (DataSchema::Array(array), Value::Array(elements)) => {
            if let ArrayLength::Fixed(n) = array.length
                && elements.len() != n as usize
            {
                return Err(mismatch(schema, value));
            }
            let step = array_stride(schema)?.unwrap_or(0) as usize;
            for (i, element) in elements.iter().enumerate() {
                write_at(&array.element, element, buf, offset + i * step)?;
            }
            Ok(())
        }
        (DataSchema::Struct(s), Value::Struct { fields, .. }) if fields.len() == s.fields.len() => {
            let placement = struct_layout_of(schema)?;
            for ((field, placed), field_value) in
                s.fields.iter().zip(placement.fields.iter()).zip(fields)
            {
                write_at(&field.schema, field_value, buf, offset + placed.offset as usize)?;
            }
            Ok(())
        }
        _ => Err(mismatch(schema, value)),
    }
}

fn write_scalar(
    kind: ScalarKind,
    value: &Value,
    buf: &mut [u8],
    offset: usize,
) -> Result<(), MarshalError> {
    let bytes = match (kind, value) {
        (ScalarKind::Bool, Value::Bool(b)) => (*b as u32).to_le_bytes(),
        (ScalarKind::I32, Value::I32(v)) => v.to_le_bytes(),
        (ScalarKind::U32, Value::U32(v)) => v.to_le_bytes(),
        (ScalarKind::F32, Value::F32(v)) => v.0.to_le_bytes(),
        (ScalarKind::F16, _) => {
            return Err(MarshalError::Unsupported {
                what: "f16".to_string(),
            });
        }
        _ => return Err(mismatch(&DataSchema::Scalar(kind), value)),
    };
    region_mut(buf, offset, 4)?.copy_from_slice(&bytes);
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

fn read_at(schema: &DataSchema, buf: &[u8], offset: usize) -> Result<Value, MarshalError> {
    match schema.undecorated() {
        DataSchema::Scalar(kind) | DataSchema::Atomic(kind) => read_scalar(*kind, buf, offset),
        DataSchema::Vector(size, kind) => {
            let step = kind.byte_size() as usize;
            (0..size.count() as usize)
                .map(|i| read_scalar(*kind, buf, offset + i * step))
                .collect::<Result<_, _>>()
                .map(Value::Vector)
        }
        DataSchema::Matrix {
            columns,
            rows,
            component,
        } => {
            let column_schema = DataSchema::vec(*rows, *component);
            let step = column_stride(*rows, *component)?;
            (0..columns.count() as usize)
                .map(|i| read_at(&column_schema, buf, offset + i * step))
                .collect::<Result<_, _>>()
                .map(Value::Matrix)
        }
        DataSchema::Array(array) => {
            let step = array_stride(schema)?.unwrap_or(0) as usize;
            let count = match array.length {
                ArrayLength::Fixed(n) => n as usize,
                ArrayLength::Runtime if step == 0 => 0,
                ArrayLength::Runtime => buf.len().saturating_sub(offset) / step,
            };
            (0..count)
                .map(|i| read_at(&array.element, buf, offset + i * step))
                .collect::<Result<_, _>>()
                .map(Value::Array)
        }
        DataSchema::Struct(s) => {
            let placement = struct_layout_of(schema)?;
            let fields = s
                .fields
                .iter()
                .zip(placement.fields.iter())
                .map(|(field, placed)| read_at(&field.schema, buf, offset + placed.offset as usize))
                .collect::<Result<_, _>>()?;
            Ok(Value::Struct {
                schema: Arc::clone(s),
                fields,
            })
        }
        DataSchema::Decorated(d) => read_at(&d.inner, buf, offset),
    }
}

fn read_scalar(kind: ScalarKind, buf: &[u8], offset: usize) -> Result<Value, MarshalError> {
    if kind == ScalarKind::F16 {
        return Err(MarshalError::Unsupported {
            what: "f16".to_string(),
        });
    }

    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(region(buf, offset, 4)?);
    Ok(match kind {
        ScalarKind::Bool => Value::Bool(u32::from_le_bytes(bytes) != 0),
        ScalarKind::I32 => Value::I32(i32::from_le_bytes(bytes)),
        ScalarKind::U32 => Value::U32(u32::from_le_bytes(bytes)),
        ScalarKind::F32 | ScalarKind::F16 => Value::f32(f32::from_le_bytes(bytes)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn struct_value(schema: &DataSchema, fields: Vec<Value>) -> Value {
        let s = schema.as_struct().cloned().expect("struct schema");
        Value::Struct { schema: s, fields }
    }

    #[test]
    fn scenario_a_round_trip() {
        let schema = DataSchema::structure(
            "Particle",
            [("position", DataSchema::vec3f()), ("scale", DataSchema::f32())],
        );
        let value = struct_value(&schema, vec![Value::vec3f(1.0, 2.0, 3.0), Value::f32(0.5)]);

        let bytes = to_bytes(&schema, &value).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..16], &0.5f32.to_le_bytes());
        assert_eq!(read(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn bool_is_four_bytes() {
        let bytes = to_bytes(&DataSchema::bool(), &Value::Bool(true)).unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0]);
    }

    #[test]
    fn matrix_columns_are_padded() {
        let schema = DataSchema::mat3x3f();
        let value = Value::Matrix(vec![
            Value::vec3f(1.0, 2.0, 3.0),
            Value::vec3f(4.0, 5.0, 6.0),
            Value::vec3f(7.0, 8.0, 9.0),
        ]);
        let bytes = to_bytes(&schema, &value).unwrap();
        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[16..20], &4.0f32.to_le_bytes());
        assert_eq!(read(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn explicit_stride_spaces_elements() {
        let schema = DataSchema::array(DataSchema::f32(), 2).stride(16);
        let value = Value::Array(vec![Value::f32(1.0), Value::f32(2.0)]);
        let bytes = to_bytes(&schema, &value).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[16..20], &2.0f32.to_le_bytes());
        assert_eq!(read(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn runtime_array_tail() {
        let schema = DataSchema::structure(
            "Points",
            [
                ("count", DataSchema::u32()),
                ("points", DataSchema::runtime_array(DataSchema::vec2f())),
            ],
        );
        let value = struct_value(
            &schema,
            vec![
                Value::U32(2),
                Value::Array(vec![Value::vec2f(1.0, 2.0), Value::vec2f(3.0, 4.0)]),
            ],
        );
        let bytes = to_bytes(&schema, &value).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(read(&schema, &bytes).unwrap(), value);
    }

    #[test]
    fn runtime_array_reads_whole_elements() {
        let schema = DataSchema::runtime_array(DataSchema::u32());
        let bytes = [1, 0, 0, 0, 2, 0, 0, 0, 9, 9];
        assert_eq!(
            read(&schema, &bytes).unwrap(),
            Value::Array(vec![Value::U32(1), Value::U32(2)])
        );
    }

    #[test]
    fn buffer_too_small() {
        let mut buf = [0u8; 8];
        let err = write(&DataSchema::vec4f(), &Value::vec4f(0.0, 0.0, 0.0, 0.0), &mut buf);
        assert_eq!(
            err,
            Err(MarshalError::BufferTooSmall {
                needed: 16,
                available: 8
            })
        );
        assert!(matches!(
            read(&DataSchema::vec4f(), &buf),
            Err(MarshalError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn write_reports_size() {
        let mut buf = [0u8; 32];
        let written = write(&DataSchema::vec2f(), &Value::vec2f(1.0, 2.0), &mut buf).unwrap();
        assert_eq!(written, 8);
    }

    #[test]
    fn shape_mismatch() {
        let err = to_bytes(&DataSchema::vec3f(), &Value::vec2f(1.0, 2.0)).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { .. }));

        let err = to_bytes(&DataSchema::array(DataSchema::u32(), 3), &Value::Array(vec![])).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { .. }));

        let err = to_bytes(&DataSchema::u32(), &Value::I32(1)).unwrap_err();
        assert!(matches!(err, MarshalError::ValueMismatch { .. }));
    }

    #[test]
    fn f16_unsupported() {
        let err = to_bytes(&DataSchema::f16(), &Value::f32(1.0)).unwrap_err();
        assert!(matches!(err, MarshalError::Unsupported { .. }));
    }

    #[test]
    fn invalid_schema_surfaces() {
        let schema = DataSchema::vec3f().align(2);
        let err = to_bytes(&schema, &Value::vec3f(0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, MarshalError::Schema(_)));
    }

    // ========================================================================
    // Round-trip property
    // ========================================================================

    fn scalar_value(kind: ScalarKind) -> BoxedStrategy<Value> {
        match kind {
            ScalarKind::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
            ScalarKind::I32 => any::<i32>().prop_map(Value::I32).boxed(),
            ScalarKind::U32 => any::<u32>().prop_map(Value::U32).boxed(),
            ScalarKind::F32 | ScalarKind::F16 => (-1.0e6f32..1.0e6).prop_map(Value::f32).boxed(),
        }
    }

    fn scalar_kind() -> impl Strategy<Value = ScalarKind> {
        prop_oneof![
            Just(ScalarKind::Bool),
            Just(ScalarKind::I32),
            Just(ScalarKind::U32),
            Just(ScalarKind::F32),
        ]
    }

    fn vector_size() -> impl Strategy<Value = VectorSize> {
        prop_oneof![
            Just(VectorSize::Two),
            Just(VectorSize::Three),
            Just(VectorSize::Four)
        ]
    }

    fn vector(size: VectorSize, kind: ScalarKind) -> BoxedStrategy<Value> {
        prop::collection::vec(scalar_value(kind), size.count() as usize)
            .prop_map(Value::Vector)
            .boxed()
    }

    fn leaf() -> impl Strategy<Value = (DataSchema, Value)> {
        prop_oneof![
            scalar_kind()
                .prop_flat_map(|k| scalar_value(k).prop_map(move |v| (DataSchema::Scalar(k), v))),
            (vector_size(), scalar_kind()).prop_flat_map(|(n, k)| {
                vector(n, k).prop_map(move |v| (DataSchema::vec(n, k), v))
            }),
            (vector_size(), vector_size()).prop_flat_map(|(c, r)| {
                prop::collection::vec(vector(r, ScalarKind::F32), c.count() as usize).prop_map(
                    move |cols| (DataSchema::mat(c, r, ScalarKind::F32), Value::Matrix(cols)),
                )
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_struct_round_trip(fields in prop::collection::vec(leaf(), 1..8)) {
            let schema = DataSchema::structure(
                "Sample",
                fields.iter().enumerate().map(|(i, (s, _))| (format!("f{i}"), s.clone())),
            );
            let value = struct_value(&schema, fields.into_iter().map(|(_, v)| v).collect());

            let bytes = to_bytes(&schema, &value).unwrap();
            prop_assert_eq!(bytes.len() as u32, schema.size().unwrap());
            prop_assert_eq!(read(&schema, &bytes).unwrap(), value);
        }
    }
}
