//! The typed IR tree: every expression carries a concrete type,
//! implicit widenings are explicit `Convert` nodes, and range-based
//! for loops have been desugared into primitive loops. Trees are
//! rebuilt bottom-up by rewriters; nodes are never mutated in place.

use crate::compiler::symbols::{FunctionSymbol, ParameterSymbol, VariableSymbol};
use crate::compiler::syntax::{BinaryOp, LiteralValue, UnaryOp};
use crate::compiler::types::TypeRef;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct IrProgram {
    pub functions: Vec<IrFunction>,
}

#[derive(Debug, Clone)]
pub struct IrFunction {
    pub symbol: Rc<FunctionSymbol>,
    pub body: Vec<IrStatement>,
}

/// A reference to a local storage location.
#[derive(Debug, Clone)]
pub enum LocalRef {
    Variable(Rc<VariableSymbol>),
    Parameter(Rc<ParameterSymbol>),
}

impl LocalRef {
    pub fn ty(&self) -> &TypeRef {
        match self {
            LocalRef::Variable(v) => &v.ty,
            LocalRef::Parameter(p) => &p.ty,
        }
    }
}

#[derive(Debug, Clone)]
pub enum IrStatement {
    VarDecl {
        symbol: Rc<VariableSymbol>,
        init: IrExpr,
    },
    Assign {
        target: LocalRef,
        value: IrExpr,
    },
    If {
        condition: IrExpr,
        then_block: Vec<IrStatement>,
        else_block: Option<Vec<IrStatement>>,
    },
    While {
        condition: IrExpr,
        body: Vec<IrStatement>,
    },
    Break,
    Continue,
    Return {
        value: Option<IrExpr>,
    },
    Expr {
        expr: IrExpr,
    },
    Block {
        statements: Vec<IrStatement>,
    },
}

/// Short-circuit logical operators, split out of `BinaryOp` once types
/// are known so the folder and generator can treat them specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum IrExpr {
    Literal {
        value: LiteralValue,
        ty: TypeRef,
    },
    Local {
        local: LocalRef,
    },
    Unary {
        op: UnaryOp,
        operand: Box<IrExpr>,
        ty: TypeRef,
    },
    /// Arithmetic, comparison and equality; never `And`/`Or`.
    Binary {
        op: BinaryOp,
        left: Box<IrExpr>,
        right: Box<IrExpr>,
        ty: TypeRef,
    },
    Logical {
        op: LogicalOp,
        left: Box<IrExpr>,
        right: Box<IrExpr>,
        ty: TypeRef,
    },
    Call {
        symbol: Rc<FunctionSymbol>,
        args: Vec<IrExpr>,
    },
    /// Synthesized implicit conversion; the only widening is
    /// int64 → float64.
    Convert {
        value: Box<IrExpr>,
        ty: TypeRef,
    },
    /// Placeholder for an expression that failed to check.
    Error {
        ty: TypeRef,
    },
}

impl IrExpr {
    pub fn ty(&self) -> &TypeRef {
        match self {
            IrExpr::Literal { ty, .. }
            | IrExpr::Unary { ty, .. }
            | IrExpr::Binary { ty, .. }
            | IrExpr::Logical { ty, .. }
            | IrExpr::Convert { ty, .. }
            | IrExpr::Error { ty } => ty,
            IrExpr::Local { local } => local.ty(),
            IrExpr::Call { symbol, .. } => &symbol.return_type,
        }
    }

    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            IrExpr::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// A literal integer, looking through a single unary negation the
    /// way a front end delivers negative literals.
    pub fn as_int_literal(&self) -> Option<i64> {
        match self {
            IrExpr::Literal {
                value: LiteralValue::Int(v),
                ..
            } => Some(*v),
            IrExpr::Unary {
                op: UnaryOp::Neg,
                operand,
                ..
            } => match operand.as_ref() {
                IrExpr::Literal {
                    value: LiteralValue::Int(v),
                    ..
                } => v.checked_neg(),
                _ => None,
            },
            _ => None,
        }
    }
}
