//! Statement nodes.

use super::expr::Expr;
use crate::schema::DataSchema;

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression statement (`expr;`)
    Expr(Expr),
    /// Nested block with its own scope
    Block(Vec<Stmt>),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
    /// `for (init; condition; update) { body }`
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    /// Mutable local (`var`)
    Var {
        name: String,
        schema: Option<DataSchema>,
        init: Option<Expr>,
    },
    /// Immutable local (`let`)
    Let {
        name: String,
        schema: Option<DataSchema>,
        init: Expr,
    },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::Return(Some(value))
    }

    pub fn if_then(condition: Expr, then: Vec<Stmt>) -> Self {
        Stmt::If {
            condition,
            then,
            otherwise: None,
        }
    }

    pub fn if_else(condition: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt>) -> Self {
        Stmt::If {
            condition,
            then,
            otherwise: Some(otherwise),
        }
    }

    pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While { condition, body }
    }

    pub fn for_loop(
        init: Option<Stmt>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Vec<Stmt>,
    ) -> Self {
        Stmt::For {
            init: init.map(Box::new),
            condition,
            update,
            body,
        }
    }

    /// `var name = init;`
    pub fn var(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Var {
            name: name.into(),
            schema: None,
            init: Some(init),
        }
    }

    /// `var name: schema;`
    pub fn var_typed(name: impl Into<String>, schema: DataSchema) -> Self {
        Stmt::Var {
            name: name.into(),
            schema: Some(schema),
            init: None,
        }
    }

    /// `let name = init;`
    pub fn let_(name: impl Into<String>, init: Expr) -> Self {
        Stmt::Let {
            name: name.into(),
            schema: None,
            init,
        }
    }

    /// The local this statement declares, if any.
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Stmt::Var { name, .. } | Stmt::Let { name, .. } => Some(name),
            _ => None,
        }
    }
}
