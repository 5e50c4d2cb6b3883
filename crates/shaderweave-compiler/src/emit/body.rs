//! Function bodies and constant expressions.
//!
//! [`BodyEmitter`] prints IR statements and expressions as WGSL. Every
//! identifier goes through three lookups, in order:
//!
//! 1. locals and parameters visible in the current [`BodyScope`]
//! 2. the owner's external references, already resolved to their text
//! 3. anything else is a WGSL built-in and is written unchanged
//!
//! Nested operands are parenthesized whenever they are not atomic, so the
//! output never depends on WGSL operator precedence.

use rustc_hash::FxHashMap;

use shaderweave_core::ir::{Expr, Literal, Stmt};

use super::types::type_text;
use super::{CodeWriter, StructNames};
use crate::scope::BodyScope;

/// Prints one body into a [`CodeWriter`].
pub struct BodyEmitter<'a> {
    scope: BodyScope,
    externals: &'a FxHashMap<String, String>,
    structs: &'a StructNames,
    writer: CodeWriter,
}

impl<'a> BodyEmitter<'a> {
    pub fn new(
        scope: BodyScope,
        externals: &'a FxHashMap<String, String>,
        structs: &'a StructNames,
        indent: usize,
    ) -> Self {
        Self {
            scope,
            externals,
            structs,
            writer: CodeWriter::new(indent),
        }
    }

    /// Declare a parameter or local and return its emitted name.
    pub fn declare(&mut self, name: &str) -> String {
        self.scope.declare(name)
    }

    pub fn line(&mut self, text: &str) {
        self.writer.line(text);
    }

    pub fn open(&mut self, header: &str) {
        self.writer.open(header);
    }

    pub fn close(&mut self) {
        self.writer.close();
    }

    pub fn finish(self) -> String {
        self.writer.finish()
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    pub fn statements(&mut self, statements: &[Stmt]) -> Result<(), String> {
        for statement in statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    pub fn statement(&mut self, statement: &Stmt) -> Result<(), String> {
        match statement {
            Stmt::Expr(_) | Stmt::Var { .. } | Stmt::Let { .. } => {
                let text = self.simple_statement(statement)?;
                self.writer.line(&format!("{text};"));
            }
            Stmt::Block(statements) => {
                self.writer.open("");
                self.nested(statements)?;
                self.writer.close();
            }
            Stmt::Return(None) => self.writer.line("return;"),
            Stmt::Return(Some(value)) => {
                let text = self.expr(value);
                self.writer.line(&format!("return {text};"));
            }
            Stmt::If { .. } => self.if_chain(statement)?,
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                // The initializer's locals live until the loop ends.
                self.scope.push_scope();
                let result = self.for_loop(init.as_deref(), condition.as_ref(), update.as_ref(), body);
                self.scope.pop_scope();
                result?;
            }
            Stmt::While { condition, body } => {
                let condition = self.expr(condition);
                self.writer.open(&format!("while {condition}"));
                self.nested(body)?;
                self.writer.close();
            }
            Stmt::Break => self.writer.line("break;"),
            Stmt::Continue => self.writer.line("continue;"),
        }
        Ok(())
    }

    /// `if` with any `else if` links flattened into one chain.
    fn if_chain(&mut self, statement: &Stmt) -> Result<(), String> {
        let mut current = statement;
        let mut first = true;
        loop {
            let Stmt::If {
                condition,
                then,
                otherwise,
            } = current
            else {
                break;
            };
            let condition = self.expr(condition);
            if first {
                self.writer.open(&format!("if {condition}"));
                first = false;
            } else {
                self.writer.reopen(&format!("else if {condition}"));
            }
            self.nested(then)?;

            match otherwise.as_deref() {
                Some([next @ Stmt::If { .. }]) => current = next,
                Some(statements) => {
                    self.writer.reopen("else");
                    self.nested(statements)?;
                    break;
                }
                None => break,
            }
        }
        self.writer.close();
        Ok(())
    }

    fn for_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<(), String> {
        let init = match init {
            Some(init) => self.simple_statement(init)?,
            None => String::new(),
        };
        let condition = condition.map(|c| self.expr(c)).unwrap_or_default();
        let update = update.map(|u| self.expr(u)).unwrap_or_default();
        self.writer
            .open(&format!("for ({init}; {condition}; {update})"));
        let result = self.nested(body);
        self.writer.close();
        result
    }

    fn nested(&mut self, statements: &[Stmt]) -> Result<(), String> {
        self.scope.push_scope();
        let result = self.statements(statements);
        self.scope.pop_scope();
        result
    }

    /// A statement that fits on one line without its `;`. These are the only
    /// statements allowed in a `for` initializer.
    fn simple_statement(&mut self, statement: &Stmt) -> Result<String, String> {
        match statement {
            Stmt::Expr(expr) => Ok(self.expr(expr)),
            Stmt::Var { name, schema, init } => {
                let init = init.as_ref().map(|e| self.expr(e));
                let ty = schema.as_ref().map(|s| type_text(s, self.structs));
                if init.is_none() && ty.is_none() {
                    return Err(format!("var '{name}' has neither a type nor an initializer"));
                }
                let name = self.scope.declare(name);
                let mut text = format!("var {name}");
                if let Some(ty) = ty {
                    text.push_str(&format!(": {ty}"));
                }
                if let Some(init) = init {
                    text.push_str(&format!(" = {init}"));
                }
                Ok(text)
            }
            Stmt::Let { name, schema, init } => {
                let init = self.expr(init);
                let name = self.scope.declare(name);
                Ok(match schema {
                    Some(schema) => {
                        format!("let {name}: {} = {init}", type_text(schema, self.structs))
                    }
                    None => format!("let {name} = {init}"),
                })
            }
            other => Err(format!("{other:?} cannot appear in a for initializer")),
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal(Literal::Bool(b)) => b.to_string(),
            Expr::Literal(Literal::Num(text)) => text.clone(),
            Expr::Ident(name) => self.name(name).to_string(),
            Expr::Member { object, member } => format!("{}.{member}", self.operand(object)),
            Expr::Index { object, index } => {
                format!("{}[{}]", self.operand(object), self.expr(index))
            }
            Expr::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", self.name(callee), args.join(", "))
            }
            Expr::Unary { op, operand } => format!("{op}{}", self.operand(operand)),
            Expr::Binary { op, left, right } => {
                format!("{} {op} {}", self.operand(left), self.operand(right))
            }
            Expr::Logical { op, left, right } => {
                format!("{} {op} {}", self.operand(left), self.operand(right))
            }
            Expr::Assign { op, target, value } => {
                format!("{} {op} {}", self.expr(target), self.expr(value))
            }
        }
    }

    /// A nested operand, parenthesized unless it is atomic. Negative
    /// literals count as non-atomic.
    fn operand(&self, expr: &Expr) -> String {
        let text = self.expr(expr);
        if expr.is_atomic() && !text.starts_with('-') {
            text
        } else {
            format!("({text})")
        }
    }

    fn name<'n>(&'n self, name: &'n str) -> &'n str {
        self.scope
            .lookup(name)
            .or_else(|| self.externals.get(name).map(String::as_str))
            .unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;
    use shaderweave_core::DataSchema;
    use shaderweave_core::ir::{AssignOp, BinaryOp, LogicalOp, UnaryOp};

    fn externals(pairs: &[(&str, &str)]) -> FxHashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn render(statements: &[Stmt], externals: &FxHashMap<String, String>) -> String {
        let structs = StructNames::new();
        let avoid: FxHashSet<String> = externals.values().cloned().collect();
        let mut emitter = BodyEmitter::new(BodyScope::new(avoid), externals, &structs, 2);
        emitter.statements(statements).unwrap();
        emitter.finish()
    }

    #[test]
    fn externals_are_substituted() {
        let ext = externals(&[("scale", "scale_1"), ("helper", "helper")]);
        let text = render(
            &[Stmt::ret(Expr::binary(
                BinaryOp::Mul,
                Expr::call("helper", vec![Expr::ident("x")]),
                Expr::ident("scale"),
            ))],
            &ext,
        );
        assert_eq!(text, "return helper(x) * scale_1;");
    }

    #[test]
    fn nested_operands_are_parenthesized() {
        let ext = externals(&[("k", "-2f")]);
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, Expr::ident("a"), Expr::ident("b")),
            Expr::ident("k"),
        );
        let structs = StructNames::new();
        let emitter = BodyEmitter::new(BodyScope::new(FxHashSet::default()), &ext, &structs, 2);
        assert_eq!(emitter.expr(&expr), "(a + b) * (-2f)");
        assert_eq!(
            emitter.expr(&Expr::unary(UnaryOp::Not, Expr::logical(
                LogicalOp::And,
                Expr::bool(true),
                Expr::ident("c")
            ))),
            "!(true && c)"
        );
        assert_eq!(
            emitter.expr(&Expr::member(Expr::index(Expr::ident("v"), Expr::num("0u")), "xy")),
            "v[0u].xy"
        );
    }

    #[test]
    fn locals_avoid_external_names() {
        let ext = externals(&[("scale", "scale")]);
        let text = render(
            &[
                Stmt::let_("scale", Expr::ident("scale")),
                Stmt::ret(Expr::ident("scale")),
            ],
            &ext,
        );
        assert_eq!(text, "let scale_1 = scale;\nreturn scale_1;");
    }

    #[test]
    fn else_if_chain() {
        let text = render(
            &[Stmt::if_else(
                Expr::ident("a"),
                vec![Stmt::ret(Expr::num("1"))],
                vec![Stmt::if_else(
                    Expr::ident("b"),
                    vec![Stmt::ret(Expr::num("2"))],
                    vec![Stmt::ret(Expr::num("3"))],
                )],
            )],
            &FxHashMap::default(),
        );
        assert_eq!(
            text,
            "if a {\n  return 1;\n} else if b {\n  return 2;\n} else {\n  return 3;\n}"
        );
    }

    #[test]
    fn loops() {
        let text = render(
            &[
                Stmt::var_typed("acc", DataSchema::f32()),
                Stmt::for_loop(
                    Some(Stmt::var("i", Expr::num("0u"))),
                    Some(Expr::binary(BinaryOp::Lt, Expr::ident("i"), Expr::num("4u"))),
                    Some(Expr::compound_assign(AssignOp::Add, Expr::ident("i"), Expr::num("1u"))),
                    vec![Stmt::expr(Expr::compound_assign(
                        AssignOp::Add,
                        Expr::ident("acc"),
                        Expr::num("1.0"),
                    ))],
                ),
                Stmt::while_loop(Expr::bool(false), vec![Stmt::Break]),
            ],
            &FxHashMap::default(),
        );
        assert_eq!(
            text,
            "var acc: f32;\nfor (var i = 0u; i < 4u; i += 1u) {\n  acc += 1.0;\n}\nwhile false {\n  break;\n}"
        );
    }

    #[test]
    fn shadowed_local_restored_after_block() {
        let text = render(
            &[
                Stmt::let_("x", Expr::num("1")),
                Stmt::Block(vec![Stmt::let_("x", Expr::ident("x"))]),
                Stmt::ret(Expr::ident("x")),
            ],
            &FxHashMap::default(),
        );
        assert_eq!(text, "let x = 1;\n{\n  let x = x;\n}\nreturn x;");
    }

    #[test]
    fn untyped_uninitialized_var_is_rejected() {
        let structs = StructNames::new();
        let ext = FxHashMap::default();
        let mut emitter = BodyEmitter::new(BodyScope::new(FxHashSet::default()), &ext, &structs, 2);
        let stmt = Stmt::Var {
            name: "v".to_string(),
            schema: None,
            init: None,
        };
        assert!(emitter.statement(&stmt).is_err());
        assert!(emitter
            .statement(&Stmt::for_loop(Some(Stmt::Break), None, None, vec![]))
            .is_err());
    }
}
