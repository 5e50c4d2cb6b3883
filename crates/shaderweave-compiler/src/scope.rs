//! Local scope management for function bodies.
//!
//! [`BodyScope`] maps the names a body declares (parameters, `var`, `let`)
//! to the names actually emitted. It handles:
//! - Renaming locals that would shadow a module-scope identifier the body uses
//! - Nested block scopes (if/while/for bodies)
//! - Source-level shadowing with restoration on scope exit

use rustc_hash::{FxHashMap, FxHashSet};

use crate::names::{is_reserved, sanitize};

// ============================================================================
// Types
// ============================================================================

/// A declared local.
#[derive(Debug, Clone)]
pub struct LocalVar {
    /// Name used in the IR
    pub source: String,
    /// Name written to the output
    pub emitted: String,
    /// Scope depth where declared
    pub depth: u32,
}

// ============================================================================
// BodyScope
// ============================================================================

/// Local names of one function body or constant expression.
#[derive(Debug)]
pub struct BodyScope {
    /// Module-scope identifiers this body refers to.
    avoid: FxHashSet<String>,

    /// Variables by source name in the current scope chain
    variables: FxHashMap<String, LocalVar>,

    /// Current scope depth (0 = function scope)
    depth: u32,

    /// Shadowed variables as (shadowing depth, source name, previous var)
    shadowed: Vec<(u32, String, LocalVar)>,
}

impl BodyScope {
    /// Create a scope whose locals must not hide any name in `avoid`.
    pub fn new(avoid: FxHashSet<String>) -> Self {
        Self {
            avoid,
            variables: FxHashMap::default(),
            depth: 0,
            shadowed: Vec::new(),
        }
    }

    // ==========================================================================
    // Scope Management
    // ==========================================================================

    /// Enter a nested block.
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave the current block, forgetting its locals.
    pub fn pop_scope(&mut self) {
        let depth = self.depth;
        self.variables.retain(|_, var| var.depth < depth);

        while let Some((shadowing_depth, _, _)) = self.shadowed.last() {
            if *shadowing_depth != depth {
                break;
            }
            if let Some((_, name, var)) = self.shadowed.pop() {
                self.variables.insert(name, var);
            }
        }

        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    // ==========================================================================
    // Declaration and Lookup
    // ==========================================================================

    /// Declare a local and return the name to emit for it.
    pub fn declare(&mut self, source: &str) -> String {
        let base = sanitize(source, "local");
        let mut emitted = base.clone();
        let mut suffix = 0;
        while self.is_unavailable(&emitted, source) {
            suffix += 1;
            emitted = format!("{base}_{suffix}");
        }

        if let Some(existing) = self.variables.get(source) {
            self.shadowed
                .push((self.depth, source.to_string(), existing.clone()));
        }

        self.variables.insert(
            source.to_string(),
            LocalVar {
                source: source.to_string(),
                emitted: emitted.clone(),
                depth: self.depth,
            },
        );
        emitted
    }

    /// The emitted name of a visible local.
    pub fn lookup(&self, source: &str) -> Option<&str> {
        self.variables.get(source).map(|v| v.emitted.as_str())
    }

    /// Whether `candidate` would hide a module-scope name or clash with a
    /// visible local declared under a different source name.
    fn is_unavailable(&self, candidate: &str, source: &str) -> bool {
        is_reserved(candidate)
            || self.avoid.contains(candidate)
            || self
                .variables
                .values()
                .any(|v| v.emitted == candidate && v.source != source)
    }
}
