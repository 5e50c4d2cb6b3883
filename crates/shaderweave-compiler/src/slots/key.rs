//! Resolution keys.

use rustc_hash::FxHashSet;

use shaderweave_core::SlotValue;
use shaderweave_registry::{DefinitionGraph, NodeId};

use super::OverrideStack;

/// A definition together with the values of the slots it observes.
///
/// Two uses of one definition share a declaration exactly when their keys
/// are equal. Slots are sorted by handle. A slot that cannot be read under
/// the current overrides is recorded as `None`; reading it for real, if the
/// body ever does, reports the error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub node: NodeId,
    pub slots: Vec<(NodeId, Option<SlotValue>)>,
}

impl ResolutionKey {
    /// Compute the key of `node` under `stack`.
    ///
    /// Starts from the node's precomputed slot-dependency set. When a slot
    /// currently holds another definition, that definition's slots are
    /// observed too, since the body will resolve it in place.
    pub fn compute<'a>(graph: &'a DefinitionGraph, stack: &OverrideStack<'a>, node: NodeId) -> Self {
        let mut pending: Vec<NodeId> = graph.slot_dependencies(node).to_vec();
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut slots = Vec::with_capacity(pending.len());

        while let Some(slot) = pending.pop() {
            if !seen.insert(slot) {
                continue;
            }
            let value = stack.read(graph, slot).ok().cloned();
            if let Some(SlotValue::Node(bound)) = &value {
                pending.extend_from_slice(graph.slot_dependencies(*bound));
            }
            slots.push((slot, value));
        }

        slots.sort_by_key(|(slot, _)| *slot);
        Self { node, slots }
    }

    /// Check if the definition reads no slots at all.
    pub fn is_slot_independent(&self) -> bool {
        self.slots.is_empty()
    }
}
