//! Schema type names and struct declarations.

use shaderweave_core::{
    ArrayLength, DataSchema, Decorations, LayoutError, SchemaError, SchemaMap, StructSchema,
    layout_of, stride,
};

use super::CodeWriter;

/// Identifiers given to struct schemas. Structurally equal structs share
/// one entry.
#[derive(Debug, Default)]
pub struct StructNames {
    names: SchemaMap<String>,
}

impl StructNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, schema: &DataSchema) -> Option<&str> {
        self.names.get(schema).map(String::as_str)
    }

    pub fn insert(&mut self, schema: DataSchema, name: String) {
        self.names.insert(schema, name);
    }

    pub fn contains(&self, schema: &DataSchema) -> bool {
        self.names.contains(schema)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Reject layout decorations that WGSL cannot spell.
///
/// WGSL derives array strides from the element type and only accepts
/// `@align`/`@size` on struct members. A decoration elsewhere is accepted
/// when it restates the natural layout, since dropping it then changes
/// nothing.
pub fn check_declarable(schema: &DataSchema) -> Result<(), SchemaError> {
    check_decorations(schema, false)
}

fn check_decorations(schema: &DataSchema, is_field: bool) -> Result<(), SchemaError> {
    match schema {
        DataSchema::Decorated(d) => {
            let decorations = &d.decorations;
            if let (Some(explicit), DataSchema::Array(array)) = (decorations.stride, &d.inner) {
                if explicit != stride(&array.element, None)? {
                    return Err(unrepresentable(&d.inner, "stride"));
                }
            }
            if !is_field && (decorations.align.is_some() || decorations.size.is_some()) {
                let natural = layout_of(&d.inner)?;
                if decorations.align.is_some_and(|align| align != natural.align) {
                    return Err(unrepresentable(&d.inner, "align"));
                }
                if decorations.size.is_some_and(|size| size != natural.size) {
                    return Err(unrepresentable(&d.inner, "size"));
                }
            }
            check_decorations(&d.inner, is_field)
        }
        DataSchema::Array(array) => check_decorations(&array.element, false),
        DataSchema::Struct(s) => s
            .fields
            .iter()
            .try_for_each(|field| check_decorations(&field.schema, true)),
        DataSchema::Scalar(_)
        | DataSchema::Vector(..)
        | DataSchema::Matrix { .. }
        | DataSchema::Atomic(_) => Ok(()),
    }
}

fn unrepresentable(schema: &DataSchema, decoration: &'static str) -> SchemaError {
    LayoutError::Unrepresentable {
        schema: schema.to_string(),
        decoration,
    }
    .into()
}

/// WGSL spelling of `schema`.
///
/// Decorations are dropped here; the caller writes them as attributes.
/// [`check_declarable`] has already rejected any it cannot write.
pub fn type_text(schema: &DataSchema, structs: &StructNames) -> String {
    match schema {
        DataSchema::Scalar(kind) => kind.wgsl_name().to_string(),
        DataSchema::Vector(size, kind) => match kind.alias_suffix() {
            Some(suffix) => format!("vec{}{suffix}", size.count()),
            None => format!("vec{}<{kind}>", size.count()),
        },
        DataSchema::Matrix {
            columns,
            rows,
            component,
        } => match component.alias_suffix() {
            Some(suffix) => format!("mat{}x{}{suffix}", columns.count(), rows.count()),
            None => format!("mat{}x{}<{component}>", columns.count(), rows.count()),
        },
        DataSchema::Array(array) => {
            let element = type_text(&array.element, structs);
            match array.length {
                ArrayLength::Fixed(n) => format!("array<{element}, {n}>"),
                ArrayLength::Runtime => format!("array<{element}>"),
            }
        }
        DataSchema::Struct(s) => structs
            .get(schema)
            .map_or_else(|| s.display_name().to_string(), str::to_string),
        DataSchema::Atomic(kind) => format!("atomic<{kind}>"),
        DataSchema::Decorated(d) => type_text(&d.inner, structs),
    }
}

/// Attribute prefix for a parameter or return type: only `@builtin` and
/// `@location` apply there.
pub fn io_attributes(decorations: Option<&Decorations>) -> String {
    let Some(d) = decorations else {
        return String::new();
    };
    let io = Decorations {
        builtin: d.builtin,
        location: d.location,
        ..Decorations::default()
    };
    attributes(Some(&io))
}

/// Attribute prefix for a struct member, e.g. `@location(0) ` or
/// `@align(16) @size(32) `. Empty when undecorated.
pub fn attributes(decorations: Option<&Decorations>) -> String {
    let Some(d) = decorations else {
        return String::new();
    };

    let mut out = String::new();
    if let Some(builtin) = d.builtin {
        out.push_str(&format!("@builtin({}) ", builtin.wgsl_name()));
    }
    if let Some(location) = d.location {
        out.push_str(&format!("@location({location}) "));
    }
    if let Some(align) = d.align {
        out.push_str(&format!("@align({align}) "));
    }
    if let Some(size) = d.size {
        out.push_str(&format!("@size({size}) "));
    }
    out
}

/// Collect decorations across every layer of a decorated schema.
pub fn merged_decorations(schema: &DataSchema) -> Option<Decorations> {
    let mut merged: Option<Decorations> = None;
    let mut current = schema;
    while let DataSchema::Decorated(d) = current {
        let m = merged.get_or_insert_with(Decorations::default);
        m.align = m.align.or(d.decorations.align);
        m.size = m.size.or(d.decorations.size);
        m.stride = m.stride.or(d.decorations.stride);
        m.location = m.location.or(d.decorations.location);
        m.builtin = m.builtin.or(d.decorations.builtin);
        current = &d.inner;
    }
    merged
}

/// `struct Name { ... }` for a struct whose nested structs are already named.
pub fn struct_decl(name: &str, schema: &StructSchema, structs: &StructNames, indent: usize) -> String {
    let mut writer = CodeWriter::new(indent);
    writer.open(&format!("struct {name}"));
    for field in &schema.fields {
        writer.line(&format!(
            "{}{}: {},",
            attributes(merged_decorations(&field.schema).as_ref()),
            field.name,
            type_text(&field.schema, structs)
        ));
    }
    writer.close();
    writer.finish()
}
