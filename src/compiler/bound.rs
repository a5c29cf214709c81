//! The bound tree: a shape-preserving copy of the syntax tree with
//! declared type annotations resolved and every call site narrowed to
//! its visible overload candidates. Not yet type-complete; the checker
//! re-walks this tree to produce the typed IR.

use crate::compiler::interner::NameId;
use crate::compiler::symbols::FunctionSymbol;
use crate::compiler::syntax::{BinaryOp, LiteralValue, Span, UnaryOp};
use crate::compiler::types::TypeRef;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct BoundProgram {
    pub functions: Vec<BoundFunction>,
}

#[derive(Debug, Clone)]
pub struct BoundFunction {
    pub symbol: Rc<FunctionSymbol>,
    pub body: Vec<BoundStatement>,
}

#[derive(Debug, Clone)]
pub enum BoundStatement {
    VarDecl {
        name: NameId,
        /// Resolved annotation; the error type when the annotation
        /// named an unknown type.
        annotation: Option<TypeRef>,
        init: BoundExpr,
        span: Span,
    },
    ConstDecl {
        name: NameId,
        annotation: Option<TypeRef>,
        init: BoundExpr,
        span: Span,
    },
    Assign {
        name: NameId,
        value: BoundExpr,
        span: Span,
    },
    If {
        condition: BoundExpr,
        then_block: Vec<BoundStatement>,
        else_block: Option<Vec<BoundStatement>>,
        span: Span,
    },
    While {
        condition: BoundExpr,
        body: Vec<BoundStatement>,
        span: Span,
    },
    For {
        var: NameId,
        start: BoundExpr,
        end: BoundExpr,
        inclusive: bool,
        step: Option<BoundExpr>,
        body: Vec<BoundStatement>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Return {
        value: Option<BoundExpr>,
        span: Span,
    },
    Expr {
        expr: BoundExpr,
        span: Span,
    },
    Block {
        statements: Vec<BoundStatement>,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub enum BoundExpr {
    Literal {
        value: LiteralValue,
        span: Span,
    },
    Name {
        name: NameId,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<BoundExpr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
        span: Span,
    },
    Call {
        name: NameId,
        /// Overloads visible at the call site, narrowed at bind time.
        /// Resolution against argument types happens in the checker.
        overloads: Vec<Rc<FunctionSymbol>>,
        args: Vec<BoundExpr>,
        span: Span,
    },
    /// Placeholder for a sub-expression that failed to bind; the
    /// diagnostic was already recorded.
    Error {
        span: Span,
    },
}

impl BoundExpr {
    pub fn span(&self) -> Span {
        match self {
            BoundExpr::Literal { span, .. }
            | BoundExpr::Name { span, .. }
            | BoundExpr::Unary { span, .. }
            | BoundExpr::Binary { span, .. }
            | BoundExpr::Call { span, .. }
            | BoundExpr::Error { span } => *span,
        }
    }
}
