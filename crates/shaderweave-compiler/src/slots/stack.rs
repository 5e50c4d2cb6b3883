//! The override stack.

use shaderweave_core::{ResolveErrorKind, SlotValue};
use shaderweave_registry::{DefinitionGraph, Node, NodeId, SlotBindings};

/// Slot binding frames, outermost first.
///
/// The outermost frame holds the caller's initial bindings; every
/// specialization reached during traversal pushes one more.
#[derive(Debug, Default)]
pub struct OverrideStack<'a> {
    frames: Vec<&'a SlotBindings>,
}

impl<'a> OverrideStack<'a> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn push(&mut self, frame: &'a SlotBindings) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<&'a SlotBindings> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The innermost override for `slot`, ignoring defaults.
    pub fn lookup(&self, slot: NodeId) -> Option<&'a SlotValue> {
        self.frames.iter().rev().find_map(|frame| frame.get(slot))
    }

    /// Read a slot: innermost override, then the slot's default.
    ///
    /// A slot bound to another slot reads through to that slot. The result is
    /// therefore never a slot handle. Alias cycles fail with
    /// `CyclicDependency`; a slot with nothing bound fails with
    /// `UnresolvedSlot`.
    pub fn read(
        &self,
        graph: &'a DefinitionGraph,
        slot: NodeId,
    ) -> Result<&'a SlotValue, ResolveErrorKind> {
        let mut chain: Vec<NodeId> = Vec::new();
        let mut current = slot;
        loop {
            if chain.contains(&current) {
                return Err(ResolveErrorKind::CyclicDependency {
                    node: graph.display_name(current),
                });
            }
            chain.push(current);

            let default = graph
                .get(current)
                .and_then(Node::as_slot)
                .and_then(|s| s.default.as_ref());
            let value = self.lookup(current).or(default).ok_or_else(|| {
                ResolveErrorKind::UnresolvedSlot {
                    slot: graph.display_name(current),
                }
            })?;

            match value {
                SlotValue::Node(next) if graph.get(*next).is_some_and(Node::is_slot) => {
                    current = *next;
                }
                other => return Ok(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shaderweave_core::Value;
    use shaderweave_registry::{GraphBuilder, SlotNode};

    #[test]
    fn innermost_frame_wins() {
        let mut builder = GraphBuilder::new();
        let s = builder.add_slot(SlotNode::new().with_default(Value::U32(0)));
        let graph = builder.build();

        let outer = SlotBindings::new().with(s, Value::U32(1));
        let inner = SlotBindings::new().with(s, Value::U32(2));
        let mut stack = OverrideStack::new();
        assert_eq!(stack.read(&graph, s), Ok(&SlotValue::Value(Value::U32(0))));

        stack.push(&outer);
        stack.push(&inner);
        assert_eq!(stack.read(&graph, s), Ok(&SlotValue::Value(Value::U32(2))));

        stack.pop();
        assert_eq!(stack.read(&graph, s), Ok(&SlotValue::Value(Value::U32(1))));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn unbound_slot_fails() {
        let mut builder = GraphBuilder::new();
        let s = builder.add_slot(SlotNode::new().with_label("gravity"));
        let graph = builder.build();

        let stack = OverrideStack::new();
        assert_eq!(
            stack.read(&graph, s),
            Err(ResolveErrorKind::UnresolvedSlot {
                slot: "gravity".to_string()
            })
        );
    }

    #[test]
    fn aliases_read_through() {
        let mut builder = GraphBuilder::new();
        let target = builder.add_slot(SlotNode::new().with_default(Value::f32(9.8)));
        let alias = builder.add_slot(SlotNode::new().with_default(target));
        let graph = builder.build();

        let stack = OverrideStack::new();
        assert_eq!(
            stack.read(&graph, alias),
            Ok(&SlotValue::Value(Value::f32(9.8)))
        );
    }

    #[test]
    fn alias_cycle_fails() {
        let mut builder = GraphBuilder::new();
        let a = builder.reserve();
        let b = builder.add_slot(SlotNode::new().with_label("b").with_default(a));
        builder
            .define(a, SlotNode::new().with_label("a").with_default(b))
            .unwrap();
        let graph = builder.build();

        let stack = OverrideStack::new();
        assert_eq!(
            stack.read(&graph, a),
            Err(ResolveErrorKind::CyclicDependency {
                node: "a".to_string()
            })
        );
    }
}
