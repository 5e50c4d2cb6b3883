//! Simplified IR for function bodies.
//!
//! The IR is produced by an external front-end and consumed read-only by the
//! resolver. It is pure data: nothing here resolves identifiers or checks
//! types. Every identifier in a body is expected to name one of
//!
//! - a parameter or local declared in the body,
//! - an entry in the owning function's external reference set, or
//! - a WGSL built-in, which is passed through untouched.
//!
//! Bodies carry a version stamp so older producers can be rejected cleanly.
//!
//! # Example
//!
//! ```
//! use shaderweave_core::ir::{BinaryOp, Expr, FunctionBody, IrVersion, Stmt};
//!
//! // return a * 2.0;
//! let body = FunctionBody::new(vec![Stmt::ret(Expr::binary(
//!     BinaryOp::Mul,
//!     Expr::ident("a"),
//!     Expr::num("2.0"),
//! ))]);
//! assert_eq!(body.ir_version(), Ok(IrVersion::V1));
//! ```

mod expr;
mod stmt;

pub use expr::{AssignOp, BinaryOp, Expr, Literal, LogicalOp, UnaryOp};
pub use stmt::Stmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Known IR format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum IrVersion {
    V1 = 1,
}

impl IrVersion {
    /// The version produced by [`FunctionBody::new`].
    pub const CURRENT: IrVersion = IrVersion::V1;
}

/// A function body: a version stamp and a statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub version: u16,
    pub statements: Vec<Stmt>,
}

impl FunctionBody {
    /// Create a body stamped with the current IR version.
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self {
            version: IrVersion::CURRENT.into(),
            statements,
        }
    }

    /// Create a body with an explicit, possibly unknown, version stamp.
    pub fn with_version(version: u16, statements: Vec<Stmt>) -> Self {
        Self {
            version,
            statements,
        }
    }

    /// The body's version, or the raw stamp if it is not one we understand.
    pub fn ir_version(&self) -> Result<IrVersion, u16> {
        IrVersion::try_from(self.version).map_err(|e| e.number)
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
