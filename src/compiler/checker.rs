//! The type checker / IR builder: second semantic pass.
//!
//! Replays the binder's scope walk, infers and checks a type for every
//! expression, makes the one implicit widening (int64 to float64)
//! explicit as `Convert` nodes, resolves each call to a single overload
//! by exact argument-type match, and desugars range-based for loops
//! into primitive while loops. Failures record a diagnostic and
//! continue with an `Error`-typed placeholder.

use crate::compiler::bound::{BoundExpr, BoundFunction, BoundProgram, BoundStatement};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::Diagnostic;
use crate::compiler::ir::{IrExpr, IrFunction, IrProgram, IrStatement, LocalRef, LogicalOp};
use crate::compiler::scope::{ScopeKind, ScopeTree};
use crate::compiler::symbols::Symbol;
use crate::compiler::syntax::{BinaryOp, LiteralValue, Span, UnaryOp};
use crate::compiler::types::TypeRef;
use std::rc::Rc;

pub struct Checker<'a> {
    ctx: &'a mut CompilationContext,
    scopes: ScopeTree,
    diagnostics: Vec<Diagnostic>,
}

/// Iteration direction of a lowered for loop, picked at lowering time.
#[derive(Clone, Copy)]
enum Direction {
    Ascending,
    Descending,
}

impl<'a> Checker<'a> {
    /// Takes the binder's scope tree; `reset` rewinds it for the
    /// replayed walk.
    pub fn new(ctx: &'a mut CompilationContext, mut scopes: ScopeTree) -> Self {
        scopes.reset();
        Self {
            ctx,
            scopes,
            diagnostics: Vec::new(),
        }
    }

    pub fn check(mut self, program: &BoundProgram) -> (IrProgram, Vec<Diagnostic>) {
        let functions = program
            .functions
            .iter()
            .map(|f| self.check_function(f))
            .collect();
        (IrProgram { functions }, self.diagnostics)
    }

    fn check_function(&mut self, function: &BoundFunction) -> IrFunction {
        self.scopes
            .begin_function_scope(Rc::clone(&function.symbol));
        for param in &function.symbol.params {
            self.scopes.register_parameter(Rc::clone(param));
        }
        let body = self.check_statements(&function.body);
        self.scopes.exit_scope();
        IrFunction {
            symbol: Rc::clone(&function.symbol),
            body,
        }
    }

    fn check_statements(&mut self, statements: &[BoundStatement]) -> Vec<IrStatement> {
        statements
            .iter()
            .map(|stmt| self.check_statement(stmt))
            .collect()
    }

    fn check_statement(&mut self, stmt: &BoundStatement) -> IrStatement {
        match stmt {
            BoundStatement::VarDecl {
                name,
                annotation,
                init,
                span,
            } => {
                let init = self.check_expr(init);
                let ty = match annotation {
                    Some(declared) => {
                        if declared.is_none() {
                            self.diagnostics.push(Diagnostic::type_error(
                                format!(
                                    "variable '{}' cannot have type 'none'",
                                    self.ctx.interner.resolve(*name)
                                ),
                                *span,
                            ));
                            self.ctx.types.error()
                        } else {
                            declared.clone()
                        }
                    }
                    None => {
                        let inferred = init.ty().clone();
                        if inferred.is_none() {
                            self.diagnostics.push(Diagnostic::type_error(
                                format!(
                                    "initializer of '{}' produces no value",
                                    self.ctx.interner.resolve(*name)
                                ),
                                *span,
                            ));
                            self.ctx.types.error()
                        } else {
                            inferred
                        }
                    }
                };
                let init = self.coerce(init, &ty, *span);
                let symbol = self.scopes.register_variable(self.ctx, *name, ty);
                IrStatement::VarDecl { symbol, init }
            }
            BoundStatement::ConstDecl {
                name,
                annotation,
                init,
                span,
            } => {
                self.check_const_decl(*name, annotation.as_ref(), init, *span);
                // Constant references are substituted at each use site;
                // the declaration itself produces no code.
                IrStatement::Block {
                    statements: Vec::new(),
                }
            }
            BoundStatement::Assign { name, value, span } => {
                let value = self.check_expr(value);
                let target = match self.scopes.get_symbol(*name) {
                    Some(Symbol::Variable(v)) => Some(LocalRef::Variable(v)),
                    Some(Symbol::Parameter(p)) => Some(LocalRef::Parameter(p)),
                    Some(Symbol::Constant(_)) => {
                        self.diagnostics.push(Diagnostic::type_error(
                            format!(
                                "cannot assign to constant '{}'",
                                self.ctx.interner.resolve(*name)
                            ),
                            *span,
                        ));
                        None
                    }
                    None => {
                        self.diagnostics.push(Diagnostic::type_error(
                            format!(
                                "undefined variable '{}'",
                                self.ctx.interner.resolve(*name)
                            ),
                            *span,
                        ));
                        None
                    }
                };
                match target {
                    Some(target) => {
                        let value = self.coerce(value, &target.ty().clone(), *span);
                        IrStatement::Assign { target, value }
                    }
                    None => IrStatement::Expr { expr: value },
                }
            }
            BoundStatement::If {
                condition,
                then_block,
                else_block,
                span,
            } => {
                let condition = self.check_condition(condition, *span);
                self.scopes.begin_scope(ScopeKind::Block);
                let then_block = self.check_statements(then_block);
                self.scopes.exit_scope();
                let else_block = else_block.as_ref().map(|block| {
                    self.scopes.begin_scope(ScopeKind::Block);
                    let checked = self.check_statements(block);
                    self.scopes.exit_scope();
                    checked
                });
                IrStatement::If {
                    condition,
                    then_block,
                    else_block,
                }
            }
            BoundStatement::While {
                condition,
                body,
                span,
            } => {
                let condition = self.check_condition(condition, *span);
                self.scopes.begin_scope(ScopeKind::Loop);
                let body = self.check_statements(body);
                self.scopes.exit_scope();
                IrStatement::While { condition, body }
            }
            BoundStatement::For {
                var,
                start,
                end,
                inclusive,
                step,
                body,
                span,
            } => self.lower_for(*var, start, end, *inclusive, step.as_ref(), body, *span),
            BoundStatement::Break { .. } => IrStatement::Break,
            BoundStatement::Continue { .. } => IrStatement::Continue,
            BoundStatement::Return { value, span } => {
                let function = self.scopes.containing_function();
                let return_type = function
                    .as_ref()
                    .map(|f| f.return_type.clone())
                    .unwrap_or_else(|| self.ctx.types.error());
                let value = match value {
                    Some(value) => {
                        let value = self.check_expr(value);
                        if return_type.is_none() {
                            self.diagnostics.push(Diagnostic::type_error(
                                "function does not return a value",
                                *span,
                            ));
                            None
                        } else {
                            Some(self.coerce(value, &return_type, *span))
                        }
                    }
                    None => {
                        if !return_type.is_none() && !return_type.is_error() {
                            self.diagnostics.push(Diagnostic::type_error(
                                format!("missing return value of type '{}'", return_type.kind),
                                *span,
                            ));
                        }
                        None
                    }
                };
                IrStatement::Return { value }
            }
            BoundStatement::Expr { expr, .. } => IrStatement::Expr {
                expr: self.check_expr(expr),
            },
            BoundStatement::Block { statements, .. } => {
                self.scopes.begin_scope(ScopeKind::Block);
                let statements = self.check_statements(statements);
                self.scopes.exit_scope();
                IrStatement::Block { statements }
            }
        }
    }

    fn check_const_decl(
        &mut self,
        name: crate::compiler::interner::NameId,
        annotation: Option<&TypeRef>,
        init: &BoundExpr,
        span: Span,
    ) {
        let literal = match init {
            BoundExpr::Literal { value, .. } => Some(value.clone()),
            BoundExpr::Error { .. } => None,
            _ => {
                self.diagnostics.push(Diagnostic::type_error(
                    format!(
                        "constant '{}' requires a literal initializer",
                        self.ctx.interner.resolve(name)
                    ),
                    span,
                ));
                None
            }
        };
        let Some(value) = literal else {
            let error = self.ctx.types.error();
            self.scopes.register_variable(self.ctx, name, error);
            return;
        };
        let literal_ty = self.literal_type(&value);
        let ty = match annotation {
            // No promotion for constants; the literal kind must match
            // the declared type exactly.
            Some(declared) if !declared.is_error() && *declared != literal_ty => {
                self.diagnostics.push(Diagnostic::type_error(
                    format!(
                        "constant '{}' declared as '{}' but initialized with '{}'",
                        self.ctx.interner.resolve(name),
                        declared.kind,
                        literal_ty.kind
                    ),
                    span,
                ));
                self.ctx.types.error()
            }
            Some(declared) => declared.clone(),
            None => literal_ty,
        };
        self.scopes.register_constant(name, ty, value);
    }

    /// Desugar `for var in start..end [by step]` into
    /// `{ let var = start; while (var <cmp> end) { body; var := var + step } }`.
    #[allow(clippy::too_many_arguments)]
    fn lower_for(
        &mut self,
        var: crate::compiler::interner::NameId,
        start: &BoundExpr,
        end: &BoundExpr,
        inclusive: bool,
        step: Option<&BoundExpr>,
        body: &[BoundStatement],
        span: Span,
    ) -> IrStatement {
        let int64 = self.ctx.types.int64();
        let bool_ty = self.ctx.types.bool();

        let start = self.check_expr(start);
        let start = self.coerce_for_bound(start, span);
        let end = self.check_expr(end);
        let end = self.coerce_for_bound(end, span);
        let step = match step {
            Some(step) => {
                let step = self.check_expr(step);
                self.coerce_for_bound(step, span)
            }
            None => IrExpr::Literal {
                value: LiteralValue::Int(1),
                ty: Rc::clone(&int64),
            },
        };

        self.scopes.begin_scope(ScopeKind::Loop);
        let iter = self
            .scopes
            .register_variable(self.ctx, var, Rc::clone(&int64));
        let mut while_body = self.check_statements(body);
        self.scopes.exit_scope();

        // Direction: a literal step decides by sign (zero collapses the
        // condition to `false` outright); a non-literal step falls back
        // to the literal bounds, descending only when start > end is
        // known at lowering time.
        let direction = match step.as_int_literal() {
            Some(0) => None,
            Some(s) if s < 0 => Some(Direction::Descending),
            Some(_) => Some(Direction::Ascending),
            None => match (start.as_int_literal(), end.as_int_literal()) {
                (Some(a), Some(b)) if a > b => Some(Direction::Descending),
                _ => Some(Direction::Ascending),
            },
        };
        let condition = match direction {
            None => IrExpr::Literal {
                value: LiteralValue::Bool(false),
                ty: Rc::clone(&bool_ty),
            },
            Some(direction) => {
                let op = match (direction, inclusive) {
                    (Direction::Ascending, false) => BinaryOp::Lt,
                    (Direction::Ascending, true) => BinaryOp::Le,
                    (Direction::Descending, false) => BinaryOp::Gt,
                    (Direction::Descending, true) => BinaryOp::Ge,
                };
                // `end` is re-embedded verbatim and re-evaluated on
                // every iteration.
                IrExpr::Binary {
                    op,
                    left: Box::new(IrExpr::Local {
                        local: LocalRef::Variable(Rc::clone(&iter)),
                    }),
                    right: Box::new(end),
                    ty: bool_ty,
                }
            }
        };
        let increment = IrStatement::Assign {
            target: LocalRef::Variable(Rc::clone(&iter)),
            value: IrExpr::Binary {
                op: BinaryOp::Add,
                left: Box::new(IrExpr::Local {
                    local: LocalRef::Variable(Rc::clone(&iter)),
                }),
                right: Box::new(step),
                ty: int64,
            },
        };
        while_body.push(increment);

        IrStatement::Block {
            statements: vec![
                IrStatement::VarDecl {
                    symbol: iter,
                    init: start,
                },
                IrStatement::While {
                    condition,
                    body: while_body,
                },
            ],
        }
    }

    /// Range bounds and steps are int64 only.
    fn coerce_for_bound(&mut self, expr: IrExpr, span: Span) -> IrExpr {
        let int64 = self.ctx.types.int64();
        if expr.ty().is_error() || *expr.ty() == int64 {
            return expr;
        }
        self.diagnostics.push(Diagnostic::type_error(
            format!("range bounds must be 'int64', found '{}'", expr.ty().kind),
            span,
        ));
        IrExpr::Error {
            ty: self.ctx.types.error(),
        }
    }

    fn check_condition(&mut self, condition: &BoundExpr, span: Span) -> IrExpr {
        let condition = self.check_expr(condition);
        let bool_ty = self.ctx.types.bool();
        if condition.ty().is_error() || *condition.ty() == bool_ty {
            return condition;
        }
        self.diagnostics.push(Diagnostic::type_error(
            format!("condition must be 'bool', found '{}'", condition.ty().kind),
            span,
        ));
        IrExpr::Error {
            ty: self.ctx.types.error(),
        }
    }

    fn check_expr(&mut self, expr: &BoundExpr) -> IrExpr {
        match expr {
            BoundExpr::Literal { value, .. } => IrExpr::Literal {
                value: value.clone(),
                ty: self.literal_type(value),
            },
            BoundExpr::Name { name, .. } => match self.scopes.get_symbol(*name) {
                Some(Symbol::Variable(v)) => IrExpr::Local {
                    local: LocalRef::Variable(v),
                },
                Some(Symbol::Parameter(p)) => IrExpr::Local {
                    local: LocalRef::Parameter(p),
                },
                // Constant references are substituted by value, never
                // re-evaluated.
                Some(Symbol::Constant(c)) => IrExpr::Literal {
                    value: c.value.clone(),
                    ty: c.ty.clone(),
                },
                // The binder diagnosed undefined names already.
                None => IrExpr::Error {
                    ty: self.ctx.types.error(),
                },
            },
            BoundExpr::Unary { op, operand, span } => self.check_unary(*op, operand, *span),
            BoundExpr::Binary {
                op,
                left,
                right,
                span,
            } => self.check_binary(*op, left, right, *span),
            BoundExpr::Call {
                name,
                overloads,
                args,
                span,
            } => self.check_call(*name, overloads, args, *span),
            BoundExpr::Error { .. } => IrExpr::Error {
                ty: self.ctx.types.error(),
            },
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &BoundExpr, span: Span) -> IrExpr {
        let operand = self.check_expr(operand);
        let ty = operand.ty().clone();
        if ty.is_error() {
            return IrExpr::Error { ty };
        }
        let ok = match op {
            UnaryOp::Neg => ty.is_numeric(),
            UnaryOp::Not => ty == self.ctx.types.bool(),
        };
        if !ok {
            let name = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "not",
            };
            self.diagnostics.push(Diagnostic::type_error(
                format!("operator '{}' cannot be applied to '{}'", name, ty.kind),
                span,
            ));
            return IrExpr::Error {
                ty: self.ctx.types.error(),
            };
        }
        IrExpr::Unary {
            op,
            operand: Box::new(operand),
            ty,
        }
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: &BoundExpr,
        right: &BoundExpr,
        span: Span,
    ) -> IrExpr {
        let left = self.check_expr(left);
        let right = self.check_expr(right);
        if left.ty().is_error() || right.ty().is_error() {
            return IrExpr::Error {
                ty: self.ctx.types.error(),
            };
        }
        match op {
            BinaryOp::And | BinaryOp::Or => self.check_logical(op, left, right, span),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let string = self.ctx.types.string();
                if op == BinaryOp::Add && (*left.ty() == string || *right.ty() == string) {
                    // String concatenation requires both sides string.
                    if *left.ty() == string && *right.ty() == string {
                        return IrExpr::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                            ty: string,
                        };
                    }
                    return self.binary_mismatch(op, left, right, span);
                }
                match self.promote_pair(left, right) {
                    Ok((left, right, ty)) => IrExpr::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        ty,
                    },
                    Err((left, right)) => self.binary_mismatch(op, left, right, span),
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                match self.promote_pair(left, right) {
                    Ok((left, right, _)) => IrExpr::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        ty: self.ctx.types.bool(),
                    },
                    Err((left, right)) => self.binary_mismatch(op, left, right, span),
                }
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if left.ty().is_numeric() && right.ty().is_numeric() {
                    match self.promote_pair(left, right) {
                        Ok((left, right, _)) => IrExpr::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                            ty: self.ctx.types.bool(),
                        },
                        Err((left, right)) => self.binary_mismatch(op, left, right, span),
                    }
                } else if left.ty() == right.ty()
                    && (*left.ty() == self.ctx.types.bool()
                        || *left.ty() == self.ctx.types.string())
                {
                    IrExpr::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        ty: self.ctx.types.bool(),
                    }
                } else {
                    self.binary_mismatch(op, left, right, span)
                }
            }
        }
    }

    fn check_logical(&mut self, op: BinaryOp, left: IrExpr, right: IrExpr, span: Span) -> IrExpr {
        let bool_ty = self.ctx.types.bool();
        if *left.ty() != bool_ty || *right.ty() != bool_ty {
            return self.binary_mismatch(op, left, right, span);
        }
        let op = match op {
            BinaryOp::And => LogicalOp::And,
            BinaryOp::Or => LogicalOp::Or,
            _ => unreachable!("not a logical operator"),
        };
        IrExpr::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: bool_ty,
        }
    }

    fn binary_mismatch(
        &mut self,
        op: BinaryOp,
        left: IrExpr,
        right: IrExpr,
        span: Span,
    ) -> IrExpr {
        self.diagnostics.push(Diagnostic::type_error(
            format!(
                "operator '{}' cannot be applied to '{}' and '{}'",
                op,
                left.ty().kind,
                right.ty().kind
            ),
            span,
        ));
        IrExpr::Error {
            ty: self.ctx.types.error(),
        }
    }

    /// Numeric promotion: both operands must be numeric; a mixed
    /// int64/float64 pair widens the int64 side.
    #[allow(clippy::type_complexity)]
    fn promote_pair(
        &mut self,
        left: IrExpr,
        right: IrExpr,
    ) -> Result<(IrExpr, IrExpr, TypeRef), (IrExpr, IrExpr)> {
        if !left.ty().is_numeric() || !right.ty().is_numeric() {
            return Err((left, right));
        }
        let int64 = self.ctx.types.int64();
        let float64 = self.ctx.types.float64();
        if left.ty() == right.ty() {
            let ty = left.ty().clone();
            return Ok((left, right, ty));
        }
        if *left.ty() == int64 && *right.ty() == float64 {
            let left = IrExpr::Convert {
                value: Box::new(left),
                ty: Rc::clone(&float64),
            };
            return Ok((left, right, float64));
        }
        if *left.ty() == float64 && *right.ty() == int64 {
            let right = IrExpr::Convert {
                value: Box::new(right),
                ty: Rc::clone(&float64),
            };
            return Ok((left, right, float64));
        }
        Err((left, right))
    }

    fn check_call(
        &mut self,
        name: crate::compiler::interner::NameId,
        overloads: &[Rc<crate::compiler::symbols::FunctionSymbol>],
        args: &[BoundExpr],
        span: Span,
    ) -> IrExpr {
        let args: Vec<IrExpr> = args.iter().map(|a| self.check_expr(a)).collect();
        if args.iter().any(|a| a.ty().is_error()) {
            return IrExpr::Error {
                ty: self.ctx.types.error(),
            };
        }
        let arg_types: Vec<TypeRef> = args.iter().map(|a| a.ty().clone()).collect();
        // Exact element-wise match only; no coercion during resolution.
        match overloads.iter().find(|f| f.matches_signature(&arg_types)) {
            Some(symbol) => IrExpr::Call {
                symbol: Rc::clone(symbol),
                args,
            },
            None => {
                let rendered: Vec<String> =
                    arg_types.iter().map(|t| t.kind.to_string()).collect();
                self.diagnostics.push(Diagnostic::type_error(
                    format!(
                        "cannot resolve function '{}({})'",
                        self.ctx.interner.resolve(name),
                        rendered.join(", ")
                    ),
                    span,
                ));
                IrExpr::Error {
                    ty: self.ctx.types.error(),
                }
            }
        }
    }

    /// Convert `value` toward `ty` when legal; the only implicit
    /// conversion is the int64 widening.
    fn coerce(&mut self, value: IrExpr, ty: &TypeRef, span: Span) -> IrExpr {
        if value.ty().is_error() || ty.is_error() || value.ty() == ty {
            return value;
        }
        let int64 = self.ctx.types.int64();
        let float64 = self.ctx.types.float64();
        if *value.ty() == int64 && *ty == float64 {
            return IrExpr::Convert {
                value: Box::new(value),
                ty: float64,
            };
        }
        self.diagnostics.push(Diagnostic::type_error(
            format!(
                "type mismatch: expected '{}', found '{}'",
                ty.kind,
                value.ty().kind
            ),
            span,
        ));
        IrExpr::Error {
            ty: self.ctx.types.error(),
        }
    }

    fn literal_type(&self, value: &LiteralValue) -> TypeRef {
        match value {
            LiteralValue::Int(_) => self.ctx.types.int64(),
            LiteralValue::Float(_) => self.ctx.types.float64(),
            LiteralValue::Bool(_) => self.ctx.types.bool(),
            LiteralValue::Str(_) => self.ctx.types.string(),
        }
    }
}
