//! Resolution options.

/// How module-scope identifiers are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NamingStrategy {
    /// Use each definition's label, falling back to a placeholder.
    #[default]
    Labels,
    /// Ignore labels and use placeholders only (`func`, `func_1`, ...).
    Compact,
}

/// Configuration for a single `resolve` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub naming: NamingStrategy,
    /// Spaces per indentation level in emitted bodies.
    pub indent: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            naming: NamingStrategy::Labels,
            indent: 2,
        }
    }
}

impl ResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ResolveOptions::default();
        assert_eq!(options.naming, NamingStrategy::Labels);
        assert_eq!(options.indent, 2);
    }

    #[test]
    fn builder() {
        let options = ResolveOptions::new()
            .with_naming(NamingStrategy::Compact)
            .with_indent(4);
        assert_eq!(options.naming, NamingStrategy::Compact);
        assert_eq!(options.indent, 4);
    }
}
