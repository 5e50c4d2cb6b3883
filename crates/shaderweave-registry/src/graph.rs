//! Graph construction and the frozen definition graph.

use shaderweave_core::{DataSchema, GraphError, NodeId};

use crate::dependencies;
use crate::nodes::{BindingNode, ConstantNode, FunctionNode, Node, SlotBindings, SlotNode};

/// Assembles a [`DefinitionGraph`].
///
/// Nodes are appended to an arena and addressed by the returned handles.
/// Recursive functions need a handle before their definition exists: take
/// one with [`reserve`](Self::reserve) and fill it with
/// [`define`](Self::define).
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Option<Node>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its handle.
    pub fn add(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Some(node.into()));
        id
    }

    pub fn add_function(&mut self, node: FunctionNode) -> NodeId {
        self.add(node)
    }

    pub fn add_constant(&mut self, node: ConstantNode) -> NodeId {
        self.add(node)
    }

    pub fn add_slot(&mut self, node: SlotNode) -> NodeId {
        self.add(node)
    }

    pub fn add_binding(&mut self, node: BindingNode) -> NodeId {
        self.add(node)
    }

    pub fn add_schema(&mut self, schema: DataSchema) -> NodeId {
        self.add(schema)
    }

    /// Add `inner` resolved under `bindings`.
    pub fn add_specialized(&mut self, inner: NodeId, bindings: SlotBindings) -> NodeId {
        self.add(Node::Specialized { inner, bindings })
    }

    /// Take a handle for a node that will be defined later.
    pub fn reserve(&mut self) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(None);
        id
    }

    /// Fill a handle obtained from [`reserve`](Self::reserve).
    pub fn define(&mut self, id: NodeId, node: impl Into<Node>) -> Result<(), GraphError> {
        match self.nodes.get_mut(id.index()) {
            None => Err(GraphError::NotReserved { id }),
            Some(Some(_)) => Err(GraphError::AlreadyDefined { id }),
            Some(entry) => {
                *entry = Some(node.into());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Freeze the graph and compute slot-dependency sets.
    ///
    /// Reserved handles that were never defined stay empty; references to
    /// them are reported when a resolution reaches them.
    pub fn build(self) -> DefinitionGraph {
        let slot_dependencies = dependencies::compute(&self.nodes);
        DefinitionGraph {
            nodes: self.nodes,
            slot_dependencies,
        }
    }
}

/// An immutable arena of definitions.
#[derive(Debug)]
pub struct DefinitionGraph {
    nodes: Vec<Option<Node>>,
    slot_dependencies: Vec<Vec<NodeId>>,
}

impl DefinitionGraph {
    /// The node behind `id`, if it exists and was defined.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Slots whose values can affect what `id` emits, sorted by handle.
    ///
    /// For a slot this is the slot itself. Empty for unknown handles.
    pub fn slot_dependencies(&self, id: NodeId) -> &[NodeId] {
        self.slot_dependencies
            .get(id.index())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Human-readable name for diagnostics: the label, or the handle.
    pub fn display_name(&self, id: NodeId) -> String {
        match self.get(id).and_then(Node::label) {
            Some(label) => label.to_string(),
            None => match self.get(id) {
                Some(node) => format!("{} {id}", node.kind_name()),
                None => id.to_string(),
            },
        }
    }

    /// Iterate defined nodes in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| node.as_ref().map(|n| (NodeId::from_index(i), n)))
    }

    /// Number of handles, including reserved-but-undefined ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
