//! Constant folding and dead-branch pruning over the typed IR.
//!
//! A bottom-up rewriter. Integer arithmetic folds with overflow checks
//! and refuses to fold (keeping the runtime failure) on overflow;
//! division keeps the node whenever the divisor literal is zero.
//! Logical operators short-circuit at the node level: a literal left
//! operand decides the result or yields the right operand untouched,
//! so a pruned right side is never evaluated at fold time either.

use crate::compiler::ir::{IrExpr, IrFunction, IrProgram, IrStatement, LogicalOp};
use crate::compiler::syntax::{BinaryOp, LiteralValue, UnaryOp};

pub struct Folder;

impl Folder {
    pub fn new() -> Self {
        Folder
    }

    pub fn fold_program(&self, program: IrProgram) -> IrProgram {
        IrProgram {
            functions: program
                .functions
                .into_iter()
                .map(|f| IrFunction {
                    symbol: f.symbol,
                    body: self.fold_statements(f.body),
                })
                .collect(),
        }
    }

    fn fold_statements(&self, statements: Vec<IrStatement>) -> Vec<IrStatement> {
        statements
            .into_iter()
            .map(|stmt| self.fold_statement(stmt))
            .collect()
    }

    pub fn fold_statement(&self, stmt: IrStatement) -> IrStatement {
        match stmt {
            IrStatement::VarDecl { symbol, init } => IrStatement::VarDecl {
                symbol,
                init: self.fold_expr(init),
            },
            IrStatement::Assign { target, value } => IrStatement::Assign {
                target,
                value: self.fold_expr(value),
            },
            IrStatement::If {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.fold_expr(condition);
                // A literal condition selects its branch outright; a
                // missing else arm becomes an empty block.
                if let Some(LiteralValue::Bool(value)) = condition.as_literal() {
                    let branch = if *value {
                        then_block
                    } else {
                        else_block.unwrap_or_default()
                    };
                    return IrStatement::Block {
                        statements: self.fold_statements(branch),
                    };
                }
                IrStatement::If {
                    condition,
                    then_block: self.fold_statements(then_block),
                    else_block: else_block.map(|block| self.fold_statements(block)),
                }
            }
            IrStatement::While { condition, body } => {
                let condition = self.fold_expr(condition);
                match condition.as_literal() {
                    // Unreachable body.
                    Some(LiteralValue::Bool(false)) => IrStatement::Block {
                        statements: Vec::new(),
                    },
                    // `while true` stays a loop; never unrolled.
                    _ => IrStatement::While {
                        condition,
                        body: self.fold_statements(body),
                    },
                }
            }
            IrStatement::Return { value } => IrStatement::Return {
                value: value.map(|v| self.fold_expr(v)),
            },
            IrStatement::Expr { expr } => IrStatement::Expr {
                expr: self.fold_expr(expr),
            },
            IrStatement::Block { statements } => IrStatement::Block {
                statements: self.fold_statements(statements),
            },
            other @ (IrStatement::Break | IrStatement::Continue) => other,
        }
    }

    pub fn fold_expr(&self, expr: IrExpr) -> IrExpr {
        match expr {
            IrExpr::Unary { op, operand, ty } => {
                let operand = self.fold_expr(*operand);
                match (op, operand.as_literal()) {
                    (UnaryOp::Neg, Some(LiteralValue::Int(v))) => match v.checked_neg() {
                        Some(folded) => IrExpr::Literal {
                            value: LiteralValue::Int(folded),
                            ty,
                        },
                        // Overflow fails at run time, not fold time.
                        None => IrExpr::Unary {
                            op,
                            operand: Box::new(operand),
                            ty,
                        },
                    },
                    (UnaryOp::Neg, Some(LiteralValue::Float(v))) => IrExpr::Literal {
                        value: LiteralValue::Float(-v),
                        ty,
                    },
                    (UnaryOp::Not, Some(LiteralValue::Bool(v))) => IrExpr::Literal {
                        value: LiteralValue::Bool(!v),
                        ty,
                    },
                    _ => IrExpr::Unary {
                        op,
                        operand: Box::new(operand),
                        ty,
                    },
                }
            }
            IrExpr::Binary {
                op,
                left,
                right,
                ty,
            } => {
                let left = self.fold_expr(*left);
                let right = self.fold_expr(*right);
                match (left.as_literal(), right.as_literal()) {
                    (Some(a), Some(b)) => match self.fold_binary(op, a, b) {
                        Some(value) => IrExpr::Literal { value, ty },
                        None => IrExpr::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                            ty,
                        },
                    },
                    _ => IrExpr::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        ty,
                    },
                }
            }
            IrExpr::Logical {
                op,
                left,
                right,
                ty,
            } => {
                let left = self.fold_expr(*left);
                // Short-circuit before any full fold: a decided left
                // side either fixes the result or hands back the
                // right operand as-is, unfolded.
                match (op, left.as_literal()) {
                    (LogicalOp::And, Some(LiteralValue::Bool(false))) => IrExpr::Literal {
                        value: LiteralValue::Bool(false),
                        ty,
                    },
                    (LogicalOp::And, Some(LiteralValue::Bool(true))) => *right,
                    (LogicalOp::Or, Some(LiteralValue::Bool(true))) => IrExpr::Literal {
                        value: LiteralValue::Bool(true),
                        ty,
                    },
                    (LogicalOp::Or, Some(LiteralValue::Bool(false))) => *right,
                    _ => IrExpr::Logical {
                        op,
                        left: Box::new(left),
                        right: Box::new(self.fold_expr(*right)),
                        ty,
                    },
                }
            }
            IrExpr::Call { symbol, args } => IrExpr::Call {
                symbol,
                args: args.into_iter().map(|a| self.fold_expr(a)).collect(),
            },
            IrExpr::Convert { value, ty } => {
                let value = self.fold_expr(*value);
                match value.as_literal() {
                    Some(LiteralValue::Int(v)) => IrExpr::Literal {
                        value: LiteralValue::Float(*v as f64),
                        ty,
                    },
                    _ => IrExpr::Convert {
                        value: Box::new(value),
                        ty,
                    },
                }
            }
            other @ (IrExpr::Literal { .. } | IrExpr::Local { .. } | IrExpr::Error { .. }) => other,
        }
    }

    /// Fold a binary operator over a same-kind literal pair. Returns
    /// `None` when the pair does not fold (mixed kinds, overflow, a
    /// zero divisor, or an operator foreign to the kind).
    fn fold_binary(&self, op: BinaryOp, a: &LiteralValue, b: &LiteralValue) -> Option<LiteralValue> {
        use LiteralValue::{Bool, Float, Int, Str};
        match (a, b) {
            (Int(a), Int(b)) => match op {
                BinaryOp::Add => a.checked_add(*b).map(Int),
                BinaryOp::Sub => a.checked_sub(*b).map(Int),
                BinaryOp::Mul => a.checked_mul(*b).map(Int),
                BinaryOp::Div if *b != 0 => a.checked_div(*b).map(Int),
                BinaryOp::Div => None,
                BinaryOp::Eq => Some(Bool(a == b)),
                BinaryOp::Ne => Some(Bool(a != b)),
                BinaryOp::Lt => Some(Bool(a < b)),
                BinaryOp::Le => Some(Bool(a <= b)),
                BinaryOp::Gt => Some(Bool(a > b)),
                BinaryOp::Ge => Some(Bool(a >= b)),
                BinaryOp::And | BinaryOp::Or => None,
            },
            (Float(a), Float(b)) => match op {
                BinaryOp::Add => Some(Float(a + b)),
                BinaryOp::Sub => Some(Float(a - b)),
                BinaryOp::Mul => Some(Float(a * b)),
                BinaryOp::Div if *b != 0.0 => Some(Float(a / b)),
                BinaryOp::Div => None,
                BinaryOp::Eq => Some(Bool(a == b)),
                BinaryOp::Ne => Some(Bool(a != b)),
                BinaryOp::Lt => Some(Bool(a < b)),
                BinaryOp::Le => Some(Bool(a <= b)),
                BinaryOp::Gt => Some(Bool(a > b)),
                BinaryOp::Ge => Some(Bool(a >= b)),
                BinaryOp::And | BinaryOp::Or => None,
            },
            (Bool(a), Bool(b)) => match op {
                BinaryOp::Eq => Some(Bool(a == b)),
                BinaryOp::Ne => Some(Bool(a != b)),
                _ => None,
            },
            (Str(a), Str(b)) => match op {
                BinaryOp::Add => Some(Str(format!("{}{}", a, b))),
                BinaryOp::Eq => Some(Bool(a == b)),
                BinaryOp::Ne => Some(Bool(a != b)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl Default for Folder {
    fn default() -> Self {
        Folder::new()
    }
}
