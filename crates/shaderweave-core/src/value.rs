//! Compile-time values.
//!
//! [`Value`] is what a constant is initialized with and what a slot may be
//! bound to. Floats are wrapped in [`OrderedFloat`] so values can take part
//! in resolution keys, which need `Eq` and `Hash`.

use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::NodeId;
use crate::schema::StructSchema;

/// A compile-time value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    I32(i32),
    U32(u32),
    F32(OrderedFloat<f32>),
    /// Vector components, all of one scalar kind.
    Vector(Vec<Value>),
    /// Matrix columns, each a [`Value::Vector`].
    Matrix(Vec<Value>),
    Array(Vec<Value>),
    /// Struct value; `fields` follow the schema's declaration order.
    Struct {
        schema: Arc<StructSchema>,
        fields: Vec<Value>,
    },
}

impl Value {
    pub fn f32(value: f32) -> Self {
        Value::F32(OrderedFloat(value))
    }

    pub fn vec2f(x: f32, y: f32) -> Self {
        Value::Vector(vec![Value::f32(x), Value::f32(y)])
    }

    pub fn vec3f(x: f32, y: f32, z: f32) -> Self {
        Value::Vector(vec![Value::f32(x), Value::f32(y), Value::f32(z)])
    }

    pub fn vec4f(x: f32, y: f32, z: f32, w: f32) -> Self {
        Value::Vector(vec![
            Value::f32(x),
            Value::f32(y),
            Value::f32(z),
            Value::f32(w),
        ])
    }

    /// Build a struct value from its schema and fields in declaration order.
    pub fn structure(schema: impl Into<Arc<StructSchema>>, fields: Vec<Value>) -> Self {
        Value::Struct {
            schema: schema.into(),
            fields,
        }
    }

    /// Check if this is a scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::I32(_) | Value::U32(_) | Value::F32(_)
        )
    }

    /// Short description of the value's shape, used in mismatch errors.
    pub fn describe(&self) -> String {
        match self {
            Value::Bool(_) => "bool".to_string(),
            Value::I32(_) => "i32".to_string(),
            Value::U32(_) => "u32".to_string(),
            Value::F32(_) => "f32".to_string(),
            Value::Vector(c) => format!("vector of {}", c.len()),
            Value::Matrix(c) => format!("matrix of {} columns", c.len()),
            Value::Array(e) => format!("array of {}", e.len()),
            Value::Struct { schema, .. } => format!("struct {}", schema.display_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::U32(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::f32(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}u"),
            Value::F32(v) => write!(f, "{}", v.0),
            Value::Vector(items) | Value::Matrix(items) | Value::Array(items) => {
                write!(f, "[")?;
                list(f, items)?;
                write!(f, "]")
            }
            Value::Struct { schema, fields } => {
                write!(f, "{} {{ ", schema.display_name())?;
                list(f, fields)?;
                write!(f, " }}")
            }
        }
    }
}

/// What a slot can be bound to: an inline value or another definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotValue {
    Value(Value),
    Node(NodeId),
}

impl SlotValue {
    /// The bound node, if this binds a definition.
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            SlotValue::Node(id) => Some(*id),
            SlotValue::Value(_) => None,
        }
    }
}

impl From<Value> for SlotValue {
    fn from(value: Value) -> Self {
        SlotValue::Value(value)
    }
}

impl From<NodeId> for SlotValue {
    fn from(id: NodeId) -> Self {
        SlotValue::Node(id)
    }
}
