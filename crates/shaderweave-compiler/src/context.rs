//! ResolutionContext - mutable state owned by a single `resolve` call.
//!
//! Nothing here outlives the call, which is what makes concurrent
//! resolutions over one shared graph independent of each other.

use shaderweave_core::LayoutCache;

use crate::emit::StructNames;
use crate::layout_table::BindingLayoutTable;
use crate::names::NameRegistry;
use crate::slots::ResolutionCache;

/// Per-resolution bookkeeping.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    /// Module-scope identifiers handed out so far.
    pub names: NameRegistry,
    /// Declarations memoized by resolution key.
    pub cache: ResolutionCache,
    /// Identifiers of declared struct schemas.
    pub structs: StructNames,
    /// Layouts of every schema validated so far.
    pub layouts: LayoutCache,
    /// Bindings the program declares.
    pub table: BindingLayoutTable,
    /// Finished declarations in emission order. Dependencies always come
    /// before their dependents, except around recursive functions.
    pub declarations: Vec<String>,
    /// Display names from the current entry point down to the definition
    /// being resolved.
    pub trail: Vec<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The program text: declarations separated by blank lines.
    pub fn code(&self) -> String {
        if self.declarations.is_empty() {
            return String::new();
        }
        let mut code = self.declarations.join("\n\n");
        code.push('\n');
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_program_has_no_text() {
        assert_eq!(ResolutionContext::new().code(), "");
    }

    #[test]
    fn declarations_are_separated_by_blank_lines() {
        let mut ctx = ResolutionContext::new();
        ctx.declarations.push("const a: u32 = 1u;".to_string());
        ctx.declarations.push("const b: u32 = 2u;".to_string());
        assert_eq!(ctx.code(), "const a: u32 = 1u;\n\nconst b: u32 = 2u;\n");
    }
}
