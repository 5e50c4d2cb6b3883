//! Binding-layout table.
//!
//! Lists every resource binding a resolved program declares, keyed by
//! `(group, binding)`, with the identifier written into the program text and
//! the pipeline stages that can reach it. Hosts build their bind group
//! layouts from this table.

use std::collections::BTreeMap;

use bitflags::bitflags;

use shaderweave_core::ResolveErrorKind;
use shaderweave_registry::{BindingKind, NodeId, ShaderStage};

bitflags! {
    /// Pipeline stages a binding is visible to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStages: u8 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

impl From<ShaderStage> for ShaderStages {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => ShaderStages::VERTEX,
            ShaderStage::Fragment => ShaderStages::FRAGMENT,
            ShaderStage::Compute { .. } => ShaderStages::COMPUTE,
        }
    }
}

/// One resource binding of a resolved program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    /// The binding definition.
    pub node: NodeId,
    /// Identifier declared in the program text.
    pub identifier: String,
    pub kind: BindingKind,
    /// Stages of the entry points that reach this binding.
    pub visibility: ShaderStages,
    /// Smallest buffer the binding accepts, in bytes. Runtime-sized
    /// schemas count one array element.
    pub min_binding_size: u32,
}

/// Bindings of a resolved program, ordered by `(group, binding)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingLayoutTable {
    entries: BTreeMap<(u32, u32), BindingEntry>,
}

impl BindingLayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a binding. Fails if another node already holds the coordinates.
    pub fn insert(
        &mut self,
        group: u32,
        binding: u32,
        entry: BindingEntry,
    ) -> Result<(), ResolveErrorKind> {
        match self.entries.get(&(group, binding)) {
            Some(existing) if existing.node != entry.node => Err(ResolveErrorKind::BindingConflict {
                group,
                binding,
                existing: existing.identifier.clone(),
                conflicting: entry.identifier,
            }),
            Some(_) => Ok(()),
            None => {
                self.entries.insert((group, binding), entry);
                Ok(())
            }
        }
    }

    /// Widen the visibility of the binding at `(group, binding)`.
    pub fn add_visibility(&mut self, group: u32, binding: u32, stages: ShaderStages) {
        if let Some(entry) = self.entries.get_mut(&(group, binding)) {
            entry.visibility |= stages;
        }
    }

    pub fn get(&self, group: u32, binding: u32) -> Option<&BindingEntry> {
        self.entries.get(&(group, binding))
    }

    /// The entry declaring `node`.
    pub fn find(&self, node: NodeId) -> Option<(u32, u32, &BindingEntry)> {
        self.entries
            .iter()
            .find(|(_, e)| e.node == node)
            .map(|((g, b), e)| (*g, *b, e))
    }

    /// Iterate `(group, binding, entry)` in coordinate order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &BindingEntry)> {
        self.entries.iter().map(|((g, b), e)| (*g, *b, e))
    }

    /// Entries of one bind group, in binding order.
    pub fn group(&self, group: u32) -> impl Iterator<Item = (u32, &BindingEntry)> {
        self.entries
            .range((group, 0)..=(group, u32::MAX))
            .map(|((_, b), e)| (*b, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
