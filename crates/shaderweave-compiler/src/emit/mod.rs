//! WGSL text emission.
//!
//! - [`CodeWriter`]: indented line buffer for one declaration
//! - [`types`]: schema type names and struct declarations
//! - [`values`]: literal text for compile-time values
//! - [`body`]: function bodies and constant expressions

pub mod body;
pub mod types;
pub mod values;

pub use body::BodyEmitter;
pub use types::StructNames;

/// Writes one declaration line by line with consistent indentation.
#[derive(Debug)]
pub struct CodeWriter {
    out: String,
    unit: String,
    level: usize,
}

impl CodeWriter {
    /// Create a writer indenting by `indent` spaces per level.
    pub fn new(indent: usize) -> Self {
        Self {
            out: String::new(),
            unit: " ".repeat(indent),
            level: 0,
        }
    }

    /// Write a full line at the current indentation.
    pub fn line(&mut self, text: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..self.level {
            self.out.push_str(&self.unit);
        }
        self.out.push_str(text);
    }

    /// Write `header {` and indent. An empty header opens a bare block.
    pub fn open(&mut self, header: &str) {
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(&format!("{header} {{"));
        }
        self.level += 1;
    }

    /// Dedent and write `}`.
    pub fn close(&mut self) {
        self.level = self.level.saturating_sub(1);
        self.line("}");
    }

    /// Dedent, write `} text {` and indent again. Used for `else` branches.
    pub fn reopen(&mut self, text: &str) {
        self.level = self.level.saturating_sub(1);
        self.line(&format!("}} {text} {{"));
        self.level += 1;
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_blocks() {
        let mut writer = CodeWriter::new(2);
        writer.open("fn f()");
        writer.open("if x");
        writer.line("return;");
        writer.reopen("else");
        writer.line("x = 1;");
        writer.close();
        writer.close();
        assert_eq!(writer.level(), 0);
        assert_eq!(
            writer.finish(),
            "fn f() {\n  if x {\n    return;\n  } else {\n    x = 1;\n  }\n}"
        );
    }

    #[test]
    fn custom_indent() {
        let mut writer = CodeWriter::new(4);
        writer.open("struct S");
        writer.line("a: f32,");
        writer.close();
        assert_eq!(writer.finish(), "struct S {\n    a: f32,\n}");
    }
}
