//! Literal text for compile-time values.

use shaderweave_core::{DataSchema, Value};

use super::StructNames;

/// WGSL expression spelling `value`.
///
/// Struct values need their schema already named in `structs`. Fails with a
/// reason when the value has no WGSL spelling: empty or mixed vectors,
/// ragged matrices, empty arrays.
pub fn value_text(value: &Value, structs: &StructNames) -> Result<String, String> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::I32(i32::MIN) => Ok("i32(-2147483648)".to_string()),
        Value::I32(v) => Ok(format!("{v}i")),
        Value::U32(v) => Ok(format!("{v}u")),
        Value::F32(v) => Ok(float_text(v.0)),
        Value::Vector(components) => {
            let constructor = vector_constructor(components)?;
            Ok(format!("{constructor}({})", list(components, structs)?))
        }
        Value::Matrix(columns) => {
            let rows = match columns.first() {
                Some(Value::Vector(first)) => first.len(),
                Some(other) => return Err(format!("matrix column is {}", other.describe())),
                None => return Err("matrix has no columns".to_string()),
            };
            if !(2..=4).contains(&columns.len()) || !(2..=4).contains(&rows) {
                return Err(format!("no {}x{rows} matrix type", columns.len()));
            }
            for column in columns {
                match column {
                    Value::Vector(c)
                        if c.len() == rows && c.iter().all(|x| matches!(x, Value::F32(_))) => {}
                    _ => return Err("matrix columns must be f32 vectors of equal length".to_string()),
                }
            }
            Ok(format!(
                "mat{}x{rows}f({})",
                columns.len(),
                list(columns, structs)?
            ))
        }
        Value::Array(elements) => {
            if elements.is_empty() {
                return Err("cannot infer the element type of an empty array".to_string());
            }
            Ok(format!("array({})", list(elements, structs)?))
        }
        Value::Struct { schema, fields } => {
            if fields.len() != schema.fields.len() {
                return Err(format!(
                    "struct {} has {} fields, value has {}",
                    schema.display_name(),
                    schema.fields.len(),
                    fields.len()
                ));
            }
            let name = structs
                .get(&DataSchema::Struct(schema.clone()))
                .ok_or_else(|| format!("struct {} was not declared", schema.display_name()))?;
            Ok(format!("{name}({})", list(fields, structs)?))
        }
    }
}

/// Float literal text. Non-finite values have no literal form and are
/// written as a bit cast.
pub fn float_text(v: f32) -> String {
    if v.is_finite() {
        format!("{v}f")
    } else {
        format!("bitcast<f32>({:#010x}u)", v.to_bits())
    }
}

fn vector_constructor(components: &[Value]) -> Result<String, String> {
    let n = components.len();
    if !(2..=4).contains(&n) {
        return Err(format!("vectors have 2 to 4 components, got {n}"));
    }
    let suffix = match &components[0] {
        Value::F32(_) => "f",
        Value::I32(_) => "i",
        Value::U32(_) => "u",
        Value::Bool(_) => "<bool>",
        other => return Err(format!("vector component is {}", other.describe())),
    };
    let same_kind = components
        .iter()
        .all(|c| std::mem::discriminant(c) == std::mem::discriminant(&components[0]));
    if !same_kind {
        return Err("vector components have mixed types".to_string());
    }
    Ok(format!("vec{n}{suffix}"))
}

fn list(values: &[Value], structs: &StructNames) -> Result<String, String> {
    let parts = values
        .iter()
        .map(|v| value_text(v, structs))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(", "))
}

/// Struct schemas a value mentions, innermost first.
pub fn struct_schemas(value: &Value, out: &mut Vec<DataSchema>) {
    match value {
        Value::Vector(items) | Value::Matrix(items) | Value::Array(items) => {
            for item in items {
                struct_schemas(item, out);
            }
        }
        Value::Struct { schema, fields } => {
            for field in fields {
                struct_schemas(field, out);
            }
            out.push(DataSchema::Struct(schema.clone()));
        }
        Value::Bool(_) | Value::I32(_) | Value::U32(_) | Value::F32(_) => {}
    }
}
