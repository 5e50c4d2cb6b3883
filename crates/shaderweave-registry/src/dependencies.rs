//! Transitive slot-dependency analysis.
//!
//! A node's slot-dependency set is every slot whose value can change the text
//! the node (or anything it reaches) emits. The resolver keys memoized
//! declarations on the values of exactly these slots.
//!
//! The reference graph may contain cycles through recursive functions, so
//! sets are computed over its strongly connected components. Tarjan's
//! algorithm yields components in post-order, meaning every component's
//! successors are finished before it is visited.
//!
//! Rules per node kind:
//!
//! - `Slot`: the slot itself
//! - `Function` / `Constant`: the union over referenced nodes
//! - `Specialized { inner, bindings }`: slots of `inner` minus those bound
//!   here, plus slots of definitions bound as values
//! - `Binding` / `Schema`: empty
//!
//! Members of a cyclic component all receive the union over the component,
//! without subtracting specialization bindings. This over-approximates, which
//! can only cause an extra specialization, never a wrong shared one.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashSet;

use shaderweave_core::NodeId;

use crate::nodes::Node;

/// Compute the sorted slot-dependency set of every handle.
pub(crate) fn compute(nodes: &[Option<Node>]) -> Vec<Vec<NodeId>> {
    let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(nodes.len(), 0);
    for _ in nodes {
        graph.add_node(());
    }

    let defined = |id: NodeId| matches!(nodes.get(id.index()), Some(Some(_)));
    for (i, node) in nodes.iter().enumerate() {
        let Some(node) = node else { continue };
        for target in node.references() {
            // Dangling handles are reported by the resolver.
            if defined(target) {
                graph.add_edge(NodeIndex::new(i), NodeIndex::new(target.index()), ());
            }
        }
    }

    let mut sets: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || graph.contains_edge(component[0], component[0]);

        if !cyclic {
            let index = component[0].index();
            if let Some(node) = &nodes[index] {
                sets[index] = own_set(NodeId::from_index(index), node, &sets);
            }
            continue;
        }

        let members: FxHashSet<usize> = component.iter().map(|n| n.index()).collect();
        let mut union = Vec::new();
        for &member in &component {
            let Some(node) = &nodes[member.index()] else {
                continue;
            };
            if node.is_slot() {
                union.push(NodeId::from_index(member.index()));
            }
            for target in node.references() {
                if !members.contains(&target.index()) {
                    union.extend_from_slice(sets.get(target.index()).map_or(&[][..], Vec::as_slice));
                }
            }
        }
        union.sort_unstable();
        union.dedup();

        for member in component {
            sets[member.index()] = union.clone();
        }
    }

    sets
}

/// Dependency set of a node outside any cycle; every successor is complete.
fn own_set(id: NodeId, node: &Node, sets: &[Vec<NodeId>]) -> Vec<NodeId> {
    let of = |target: NodeId| sets.get(target.index()).map_or(&[][..], Vec::as_slice);

    let mut set: Vec<NodeId> = match node {
        Node::Slot(_) => vec![id],
        Node::Function(_) | Node::Constant(_) => node
            .references()
            .into_iter()
            .flat_map(|target| of(target).iter().copied())
            .collect(),
        Node::Binding(_) | Node::Schema(_) => Vec::new(),
        Node::Specialized { inner, bindings } => of(*inner)
            .iter()
            .copied()
            .filter(|slot| !bindings.contains(*slot))
            .chain(
                bindings
                    .node_values()
                    .flat_map(|target| of(target).iter().copied()),
            )
            .collect(),
    };
    set.sort_unstable();
    set.dedup();
    set
}
