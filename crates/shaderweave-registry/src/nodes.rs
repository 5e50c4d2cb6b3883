//! Node kinds of the definition graph.
//!
//! Each kind is a plain immutable record. References to other nodes are held
//! as [`NodeId`]s in an explicit reference set ([`Externals`] for functions
//! and constant expressions), keyed by the name the body uses for them.

use std::fmt;
use std::sync::Arc;

use shaderweave_core::ir::{Expr, FunctionBody};
use shaderweave_core::{ArrayLength, DataSchema, NodeId, SlotValue};

// ============================================================================
// Reference Sets
// ============================================================================

/// Names a body uses for other definitions, mapped to their handles.
///
/// Kept sorted by name so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Externals(Vec<(String, NodeId)>);

impl Externals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the handle bound to `name`.
    pub fn insert(&mut self, name: impl Into<String>, id: NodeId) {
        let name = name.into();
        match self.0.binary_search_by(|(n, _)| n.as_str().cmp(&name)) {
            Ok(i) => self.0[i].1 = id,
            Err(i) => self.0.insert(i, (name, id)),
        }
    }

    /// The handle bound to `name`.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.0
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|i| self.0[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.0.iter().map(|(n, id)| (n.as_str(), *id))
    }

    /// Referenced handles, in name order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, NodeId)> for Externals {
    fn from_iter<I: IntoIterator<Item = (N, NodeId)>>(iter: I) -> Self {
        let mut externals = Externals::new();
        for (name, id) in iter {
            externals.insert(name, id);
        }
        externals
    }
}

/// Slot overrides carried by a [`Node::Specialized`], sorted by slot handle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlotBindings(Vec<(NodeId, SlotValue)>);

impl SlotBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `slot` to `value`, replacing any earlier binding.
    pub fn insert(&mut self, slot: NodeId, value: impl Into<SlotValue>) {
        let value = value.into();
        match self.0.binary_search_by_key(&slot, |(s, _)| *s) {
            Ok(i) => self.0[i].1 = value,
            Err(i) => self.0.insert(i, (slot, value)),
        }
    }

    /// Builder form of [`SlotBindings::insert`].
    pub fn with(mut self, slot: NodeId, value: impl Into<SlotValue>) -> Self {
        self.insert(slot, value);
        self
    }

    pub fn get(&self, slot: NodeId) -> Option<&SlotValue> {
        self.0
            .binary_search_by_key(&slot, |(s, _)| *s)
            .ok()
            .map(|i| &self.0[i].1)
    }

    pub fn contains(&self, slot: NodeId) -> bool {
        self.get(slot).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SlotValue)> {
        self.0.iter().map(|(s, v)| (*s, v))
    }

    /// Handles of definitions bound as slot values.
    pub fn node_values(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().filter_map(|(_, v)| v.as_node())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Into<SlotValue>> FromIterator<(NodeId, V)> for SlotBindings {
    fn from_iter<I: IntoIterator<Item = (NodeId, V)>>(iter: I) -> Self {
        let mut bindings = SlotBindings::new();
        for (slot, value) in iter {
            bindings.insert(slot, value);
        }
        bindings
    }
}

// ============================================================================
// Functions
// ============================================================================

/// A function parameter. Interface attributes (`@location`, `@builtin`)
/// ride on the schema's decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub schema: DataSchema,
}

/// Pipeline stage of an entry-point function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute { workgroup_size: [u32; 3] },
}

impl ShaderStage {
    /// A compute stage with a one-dimensional workgroup.
    pub fn compute(x: u32) -> Self {
        ShaderStage::Compute {
            workgroup_size: [x, 1, 1],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute { .. } => "compute",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A function definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub label: Option<String>,
    pub params: Vec<Param>,
    pub return_schema: Option<DataSchema>,
    pub body: FunctionBody,
    /// Every definition the body refers to, by the name it uses.
    pub externals: Externals,
    /// Set when the function is a pipeline entry point.
    pub stage: Option<ShaderStage>,
}

impl FunctionNode {
    pub fn new(body: FunctionBody) -> Self {
        Self {
            label: None,
            params: Vec::new(),
            return_schema: None,
            body,
            externals: Externals::new(),
            stage: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, schema: DataSchema) -> Self {
        self.params.push(Param {
            name: name.into(),
            schema,
        });
        self
    }

    pub fn returns(mut self, schema: DataSchema) -> Self {
        self.return_schema = Some(schema);
        self
    }

    pub fn with_external(mut self, name: impl Into<String>, id: NodeId) -> Self {
        self.externals.insert(name, id);
        self
    }

    /// Mark the function as an entry point for `stage`.
    pub fn entry(mut self, stage: ShaderStage) -> Self {
        self.stage = Some(stage);
        self
    }
}

// ============================================================================
// Constants and Slots
// ============================================================================

/// How a constant gets its value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantInit {
    /// A literal value.
    Value(shaderweave_core::Value),
    /// An expression over other definitions.
    Expr { expr: Expr, externals: Externals },
}

/// A module-scope constant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantNode {
    pub label: Option<String>,
    pub schema: DataSchema,
    pub init: ConstantInit,
}

impl ConstantNode {
    pub fn value(schema: DataSchema, value: impl Into<shaderweave_core::Value>) -> Self {
        Self {
            label: None,
            schema,
            init: ConstantInit::Value(value.into()),
        }
    }

    pub fn expr(schema: DataSchema, expr: Expr) -> Self {
        Self {
            label: None,
            schema,
            init: ConstantInit::Expr {
                expr,
                externals: Externals::new(),
            },
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a reference used by an expression initializer. Has no effect on
    /// literal constants.
    pub fn with_external(mut self, name: impl Into<String>, id: NodeId) -> Self {
        if let ConstantInit::Expr { externals, .. } = &mut self.init {
            externals.insert(name, id);
        }
        self
    }

    /// References made by the initializer.
    pub fn externals(&self) -> Option<&Externals> {
        match &self.init {
            ConstantInit::Expr { externals, .. } => Some(externals),
            ConstantInit::Value(_) => None,
        }
    }
}

/// A compile-time parameter, bound per resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotNode {
    pub label: Option<String>,
    pub default: Option<SlotValue>,
}

impl SlotNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<SlotValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

// ============================================================================
// Resource Bindings
// ============================================================================

/// Access mode of a storage buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageAccess {
    Read,
    ReadWrite,
}

/// Address space of a buffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Uniform,
    Storage(StorageAccess),
}

impl BindingKind {
    /// The `var<...>` qualifier text.
    pub fn address_space(self) -> &'static str {
        match self {
            BindingKind::Uniform => "uniform",
            BindingKind::Storage(StorageAccess::Read) => "storage, read",
            BindingKind::Storage(StorageAccess::ReadWrite) => "storage, read_write",
        }
    }
}

/// Builds a binding's schema for a given array length.
pub type SchemaFactory = Arc<dyn Fn(ArrayLength) -> DataSchema + Send + Sync>;

/// Schema of a binding, either fixed or parameterized by an array length.
#[derive(Clone)]
pub enum BindingSchema {
    Fixed(DataSchema),
    /// The factory is called with [`ArrayLength::Runtime`] for the WGSL
    /// declaration, and with a fixed length when a host sizes a buffer.
    Sized(SchemaFactory),
}

impl BindingSchema {
    /// The schema as declared in WGSL.
    pub fn declared(&self) -> DataSchema {
        match self {
            BindingSchema::Fixed(schema) => schema.clone(),
            BindingSchema::Sized(factory) => factory(ArrayLength::Runtime),
        }
    }

    /// The schema for a buffer holding `length` elements.
    pub fn with_length(&self, length: u32) -> DataSchema {
        match self {
            BindingSchema::Fixed(schema) => schema.clone(),
            BindingSchema::Sized(factory) => factory(ArrayLength::Fixed(length)),
        }
    }
}

impl fmt::Debug for BindingSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSchema::Fixed(schema) => f.debug_tuple("Fixed").field(schema).finish(),
            BindingSchema::Sized(_) => f.write_str("Sized(..)"),
        }
    }
}

/// A buffer bound at `@group(group) @binding(binding)`.
#[derive(Debug, Clone)]
pub struct BindingNode {
    pub label: Option<String>,
    pub kind: BindingKind,
    pub schema: BindingSchema,
    pub group: u32,
    pub binding: u32,
}

impl BindingNode {
    pub fn uniform(group: u32, binding: u32, schema: DataSchema) -> Self {
        Self {
            label: None,
            kind: BindingKind::Uniform,
            schema: BindingSchema::Fixed(schema),
            group,
            binding,
        }
    }

    pub fn storage(group: u32, binding: u32, access: StorageAccess, schema: DataSchema) -> Self {
        Self {
            label: None,
            kind: BindingKind::Storage(access),
            schema: BindingSchema::Fixed(schema),
            group,
            binding,
        }
    }

    /// A storage buffer whose schema depends on the element count.
    pub fn sized_storage<F>(group: u32, binding: u32, access: StorageAccess, factory: F) -> Self
    where
        F: Fn(ArrayLength) -> DataSchema + Send + Sync + 'static,
    {
        Self {
            label: None,
            kind: BindingKind::Storage(access),
            schema: BindingSchema::Sized(Arc::new(factory)),
            group,
            binding,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// ============================================================================
// Node
// ============================================================================

/// A definition in the graph.
#[derive(Debug, Clone)]
pub enum Node {
    Function(FunctionNode),
    Constant(ConstantNode),
    Slot(SlotNode),
    Binding(BindingNode),
    /// A named data type; referencing it emits its struct declaration.
    Schema(DataSchema),
    /// `inner` resolved with `bindings` pushed as an override frame.
    Specialized {
        inner: NodeId,
        bindings: SlotBindings,
    },
}

impl Node {
    /// The node's label. Struct schemas use their struct label.
    pub fn label(&self) -> Option<&str> {
        match self {
            Node::Function(f) => f.label.as_deref(),
            Node::Constant(c) => c.label.as_deref(),
            Node::Slot(s) => s.label.as_deref(),
            Node::Binding(b) => b.label.as_deref(),
            Node::Schema(schema) => schema.as_struct().and_then(|s| s.label.as_deref()),
            Node::Specialized { .. } => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Function(_) => "function",
            Node::Constant(_) => "constant",
            Node::Slot(_) => "slot",
            Node::Binding(_) => "binding",
            Node::Schema(_) => "schema",
            Node::Specialized { .. } => "specialization",
        }
    }

    /// Every handle this node refers to, in a deterministic order.
    pub fn references(&self) -> Vec<NodeId> {
        match self {
            Node::Function(f) => f.externals.ids().collect(),
            Node::Constant(c) => c.externals().map(|e| e.ids().collect()).unwrap_or_default(),
            Node::Slot(s) => s
                .default
                .as_ref()
                .and_then(SlotValue::as_node)
                .into_iter()
                .collect(),
            Node::Binding(_) | Node::Schema(_) => Vec::new(),
            Node::Specialized { inner, bindings } => std::iter::once(*inner)
                .chain(bindings.node_values())
                .collect(),
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Node::Function(_))
    }

    pub fn is_slot(&self) -> bool {
        matches!(self, Node::Slot(_))
    }

    pub fn as_function(&self) -> Option<&FunctionNode> {
        match self {
            Node::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_slot(&self) -> Option<&SlotNode> {
        match self {
            Node::Slot(s) => Some(s),
            _ => None,
        }
    }
}

impl From<FunctionNode> for Node {
    fn from(node: FunctionNode) -> Self {
        Node::Function(node)
    }
}

impl From<ConstantNode> for Node {
    fn from(node: ConstantNode) -> Self {
        Node::Constant(node)
    }
}

impl From<SlotNode> for Node {
    fn from(node: SlotNode) -> Self {
        Node::Slot(node)
    }
}

impl From<BindingNode> for Node {
    fn from(node: BindingNode) -> Self {
        Node::Binding(node)
    }
}

impl From<DataSchema> for Node {
    fn from(schema: DataSchema) -> Self {
        Node::Schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaderweave_core::Value;

    #[test]
    fn externals_stay_sorted() {
        let externals: Externals = [("b", NodeId(2)), ("a", NodeId(1)), ("c", NodeId(3))]
            .into_iter()
            .collect();
        let names: Vec<_> = externals.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(externals.get("b"), Some(NodeId(2)));
        assert_eq!(externals.get("z"), None);
    }

    #[test]
    fn externals_replace() {
        let mut externals = Externals::new();
        externals.insert("a", NodeId(1));
        externals.insert("a", NodeId(5));
        assert_eq!(externals.len(), 1);
        assert_eq!(externals.get("a"), Some(NodeId(5)));
    }

    #[test]
    fn slot_bindings_sorted_by_slot() {
        let bindings = SlotBindings::new()
            .with(NodeId(4), Value::U32(1))
            .with(NodeId(1), NodeId(9))
            .with(NodeId(4), Value::U32(2));
        let slots: Vec<_> = bindings.iter().map(|(s, _)| s).collect();
        assert_eq!(slots, vec![NodeId(1), NodeId(4)]);
        assert_eq!(bindings.get(NodeId(4)), Some(&SlotValue::Value(Value::U32(2))));
        assert_eq!(bindings.node_values().collect::<Vec<_>>(), vec![NodeId(9)]);
    }

    #[test]
    fn specialized_references() {
        let node = Node::Specialized {
            inner: NodeId(0),
            bindings: SlotBindings::new()
                .with(NodeId(1), NodeId(2))
                .with(NodeId(3), Value::f32(1.0)),
        };
        assert_eq!(node.references(), vec![NodeId(0), NodeId(2)]);
        assert_eq!(node.label(), None);
    }

    #[test]
    fn literal_constant_ignores_externals() {
        let c = ConstantNode::value(DataSchema::u32(), 3u32).with_external("x", NodeId(1));
        assert!(c.externals().is_none());
        assert!(Node::from(c).references().is_empty());
    }

    #[test]
    fn sized_binding_schema() {
        let binding = BindingNode::sized_storage(0, 1, StorageAccess::Read, |len| match len {
            ArrayLength::Fixed(n) => DataSchema::array(DataSchema::f32(), n),
            ArrayLength::Runtime => DataSchema::runtime_array(DataSchema::f32()),
        });
        assert_eq!(
            binding.schema.declared(),
            DataSchema::runtime_array(DataSchema::f32())
        );
        assert_eq!(
            binding.schema.with_length(4),
            DataSchema::array(DataSchema::f32(), 4)
        );
        assert_eq!(binding.kind.address_space(), "storage, read");
    }

    #[test]
    fn schema_label() {
        let node = Node::from(DataSchema::structure("Boid", [("pos", DataSchema::vec2f())]));
        assert_eq!(node.label(), Some("Boid"));
        assert_eq!(node.kind_name(), "schema");
    }
}
