//! Memoized declarations.
//!
//! Maps each [`ResolutionKey`] to the identifier its declaration was given.
//! Entries also record which other entries they referenced, so the set of
//! bindings an entry point can reach is known once traversal is done, even
//! through shared helpers and recursion.

use rustc_hash::{FxHashMap, FxHashSet};

use shaderweave_registry::NodeId;

use super::ResolutionKey;

/// Progress of a memoized declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Identifier assigned, dependencies still being resolved.
    InProgress,
    /// Declaration emitted.
    Done,
}

#[derive(Debug)]
struct Entry {
    identifier: String,
    state: EntryState,
    /// Coordinates if this entry declares a resource binding.
    binding: Option<(u32, u32)>,
    /// Entries referenced while resolving this one.
    edges: Vec<usize>,
}

/// Cache of resolved declarations for one resolution.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    index: FxHashMap<ResolutionKey, usize>,
    entries: Vec<Entry>,
    instances: FxHashMap<NodeId, usize>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry for `key`, if it was ever started.
    pub fn lookup(&self, key: &ResolutionKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Start an entry. The identifier is fixed from here on.
    pub fn begin(&mut self, key: ResolutionKey, identifier: String) -> usize {
        let entry = self.entries.len();
        *self.instances.entry(key.node).or_insert(0) += 1;
        self.index.insert(key, entry);
        self.entries.push(Entry {
            identifier,
            state: EntryState::InProgress,
            binding: None,
            edges: Vec::new(),
        });
        entry
    }

    pub fn finish(&mut self, entry: usize) {
        if let Some(e) = self.entries.get_mut(entry) {
            e.state = EntryState::Done;
        }
    }

    /// Mark an entry as declaring the binding at `(group, binding)`.
    pub fn set_binding(&mut self, entry: usize, coordinates: (u32, u32)) {
        if let Some(e) = self.entries.get_mut(entry) {
            e.binding = Some(coordinates);
        }
    }

    /// Record that resolving `from` referenced `to`.
    pub fn link(&mut self, from: usize, to: usize) {
        if let Some(e) = self.entries.get_mut(from)
            && !e.edges.contains(&to)
        {
            e.edges.push(to);
        }
    }

    pub fn identifier(&self, entry: usize) -> Option<&str> {
        self.entries.get(entry).map(|e| e.identifier.as_str())
    }

    pub fn state(&self, entry: usize) -> Option<EntryState> {
        self.entries.get(entry).map(|e| e.state)
    }

    /// How many distinct declarations `node` has produced so far.
    pub fn instances(&self, node: NodeId) -> usize {
        self.instances.get(&node).copied().unwrap_or(0)
    }

    /// Binding coordinates reachable from `entry`, in discovery order.
    pub fn reachable_bindings(&self, entry: usize) -> Vec<(u32, u32)> {
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut stack = vec![entry];
        let mut found = Vec::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(e) = self.entries.get(current) else {
                continue;
            };
            if let Some(coordinates) = e.binding {
                found.push(coordinates);
            }
            stack.extend(e.edges.iter().rev().copied());
        }
        found
    }

    /// Number of declarations started.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(node: u32) -> ResolutionKey {
        ResolutionKey {
            node: NodeId(node),
            slots: Vec::new(),
        }
    }

    #[test]
    fn cache_new_is_empty() {
        let cache = ResolutionCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(&key(0)), None);
    }

    #[test]
    fn begin_and_finish() {
        let mut cache = ResolutionCache::new();
        let entry = cache.begin(key(3), "helper".to_string());
        assert_eq!(cache.lookup(&key(3)), Some(entry));
        assert_eq!(cache.state(entry), Some(EntryState::InProgress));
        assert_eq!(cache.identifier(entry), Some("helper"));

        cache.finish(entry);
        assert_eq!(cache.state(entry), Some(EntryState::Done));
    }

    #[test]
    fn instances_count_specializations() {
        let mut cache = ResolutionCache::new();
        let mut specialized = key(1);
        specialized.slots.push((NodeId(0), None));

        cache.begin(key(1), "f".to_string());
        cache.begin(specialized, "f_1".to_string());
        assert_eq!(cache.instances(NodeId(1)), 2);
        assert_eq!(cache.instances(NodeId(2)), 0);
    }

    #[test]
    fn reachable_bindings_follow_cycles() {
        let mut cache = ResolutionCache::new();
        let main = cache.begin(key(0), "main".to_string());
        let a = cache.begin(key(1), "a".to_string());
        let b = cache.begin(key(2), "b".to_string());
        let buffer = cache.begin(key(3), "buffer".to_string());
        cache.set_binding(buffer, (0, 1));

        cache.link(main, a);
        cache.link(a, b);
        cache.link(b, a);
        cache.link(b, buffer);
        cache.link(b, buffer);

        assert_eq!(cache.reachable_bindings(main), vec![(0, 1)]);
        assert_eq!(cache.reachable_bindings(a), vec![(0, 1)]);
        assert!(cache.reachable_bindings(buffer).contains(&(0, 1)));
    }
}
