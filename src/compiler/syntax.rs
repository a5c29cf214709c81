//! Syntax tree as delivered by the front end.
//!
//! The lexer/parser live outside this crate; they hand over a `Program`
//! of already-interned identifiers together with source positions. The
//! constructor helpers build span-less nodes for programmatically
//! constructed trees (tests, embedders); a real front end fills in the
//! struct forms with source spans.

use crate::compiler::interner::NameId;
use crate::compiler::types::TypeKind;
use std::fmt;

/// A source position (line and column, 1-based from a front end).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A literal constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl LiteralValue {
    /// The primitive type kind this literal carries.
    pub fn type_kind(&self) -> TypeKind {
        match self {
            LiteralValue::Int(_) => TypeKind::Int64,
            LiteralValue::Float(_) => TypeKind::Float64,
            LiteralValue::Bool(_) => TypeKind::Bool,
            LiteralValue::Str(_) => TypeKind::String,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{}", v),
            LiteralValue::Float(v) => write!(f, "{}", v),
            LiteralValue::Bool(v) => write!(f, "{}", v),
            LiteralValue::Str(v) => write!(f, "{:?}", v),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Binary operators, including the short-circuit logical pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        f.write_str(text)
    }
}

/// A type name as written in source.
#[derive(Debug, Clone, Copy)]
pub struct TypeAnnotation {
    pub name: NameId,
    pub span: Span,
}

/// A function parameter with its mandatory type annotation.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: NameId,
    pub annotation: TypeAnnotation,
    pub span: Span,
}

/// A function declaration. Nested declarations (inside another
/// function's body) are hoisted by the flattening pre-pass.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: NameId,
    pub params: Vec<ParamDecl>,
    pub return_annotation: Option<TypeAnnotation>,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// A complete program: a flat or yet-to-be-flattened list of functions.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub functions: Vec<FunctionDecl>,
}

/// Statements in the language.
#[derive(Debug, Clone)]
pub enum Statement {
    VarDecl {
        name: NameId,
        annotation: Option<TypeAnnotation>,
        init: Expr,
        span: Span,
    },
    /// `const NAME: type = <literal>;` — only literal initializers.
    ConstDecl {
        name: NameId,
        annotation: Option<TypeAnnotation>,
        init: Expr,
        span: Span,
    },
    Assign {
        name: NameId,
        value: Expr,
        span: Span,
    },
    If {
        condition: Expr,
        then_block: Vec<Statement>,
        else_block: Option<Vec<Statement>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Statement>,
        span: Span,
    },
    /// `for i in start..end { }` / `start..=end`, optional `by step`.
    For {
        var: NameId,
        start: Expr,
        end: Expr,
        inclusive: bool,
        step: Option<Expr>,
        body: Vec<Statement>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Expr {
        expr: Expr,
        span: Span,
    },
    Block {
        statements: Vec<Statement>,
        span: Span,
    },
    /// A function declared inside another function's body.
    FnDecl(FunctionDecl),
}

/// Expressions in the language.
#[derive(Debug, Clone)]
pub enum Expr {
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
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        callee: NameId,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Name { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }

    pub fn int(value: i64) -> Expr {
        Expr::Literal {
            value: LiteralValue::Int(value),
            span: Span::default(),
        }
    }

    pub fn float(value: f64) -> Expr {
        Expr::Literal {
            value: LiteralValue::Float(value),
            span: Span::default(),
        }
    }

    pub fn bool(value: bool) -> Expr {
        Expr::Literal {
            value: LiteralValue::Bool(value),
            span: Span::default(),
        }
    }

    pub fn str(value: impl Into<String>) -> Expr {
        Expr::Literal {
            value: LiteralValue::Str(value.into()),
            span: Span::default(),
        }
    }

    pub fn name(name: NameId) -> Expr {
        Expr::Name {
            name,
            span: Span::default(),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            span: Span::default(),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: Span::default(),
        }
    }

    pub fn call(callee: NameId, args: Vec<Expr>) -> Expr {
        Expr::Call {
            callee,
            args,
            span: Span::default(),
        }
    }

    /// True when this expression is a literal node.
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal { .. })
    }
}
