//! The binder: first semantic pass over the (flattened) syntax tree.
//!
//! Registers the overload set of every function up front so mutual
//! recursion binds, resolves declared type annotations, checks that
//! every referenced name exists, narrows each call site to its visible
//! overload candidates, and re-creates the scope-tree shape the checker
//! later replays. Failures record one diagnostic and substitute an
//! `Error` placeholder node so the walk continues.

use crate::compiler::bound::{BoundExpr, BoundFunction, BoundProgram, BoundStatement};
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::Diagnostic;
use crate::compiler::scope::{ScopeKind, ScopeTree};
use crate::compiler::symbols::{FunctionSymbol, HostFn, ParameterSymbol, Symbol};
use crate::compiler::syntax::{Expr, FunctionDecl, Program, Statement, TypeAnnotation};
use crate::compiler::types::TypeRef;
use std::rc::Rc;

/// The binder's output: the bound tree, the scope tree it built (ready
/// for replay), and the diagnostics it accumulated.
pub struct Binding {
    pub program: BoundProgram,
    pub scopes: ScopeTree,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Binder<'a> {
    ctx: &'a mut CompilationContext,
    scopes: ScopeTree,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Binder<'a> {
    pub fn new(ctx: &'a mut CompilationContext) -> Self {
        let mut scopes = ScopeTree::new(ctx);
        register_builtins(ctx, &mut scopes);
        Self {
            ctx,
            scopes,
            diagnostics: Vec::new(),
        }
    }

    pub fn bind(mut self, program: &Program) -> Binding {
        // First pass: declare every function so call sites anywhere in
        // the program see the full overload sets.
        let mut symbols = Vec::with_capacity(program.functions.len());
        for decl in &program.functions {
            let symbol = self.declare_function(decl);
            if self.scopes.register_function(Rc::clone(&symbol)).is_none() {
                self.diagnostics.push(Diagnostic::type_error(
                    format!(
                        "function '{}' is already defined with an identical parameter list",
                        self.ctx.interner.resolve(decl.name)
                    ),
                    decl.span,
                ));
            }
            symbols.push(symbol);
        }

        // Second pass: bind function bodies.
        let mut functions = Vec::with_capacity(program.functions.len());
        for (decl, symbol) in program.functions.iter().zip(symbols) {
            self.scopes.begin_function_scope(Rc::clone(&symbol));
            for param in &symbol.params {
                self.scopes.register_parameter(Rc::clone(param));
            }
            let body = self.bind_statements(&decl.body);
            self.scopes.exit_scope();
            functions.push(BoundFunction { symbol, body });
        }

        Binding {
            program: BoundProgram { functions },
            scopes: self.scopes,
            diagnostics: self.diagnostics,
        }
    }

    fn declare_function(&mut self, decl: &FunctionDecl) -> Rc<FunctionSymbol> {
        let params = decl
            .params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let ty = self.resolve_annotation(&param.annotation);
                Rc::new(ParameterSymbol {
                    name: param.name,
                    ty,
                    index,
                })
            })
            .collect();
        let return_type = match &decl.return_annotation {
            Some(annotation) => self.resolve_annotation(annotation),
            None => self.ctx.types.none(),
        };
        Rc::new(FunctionSymbol {
            name: decl.name,
            qualified_name: decl.name,
            serial: self.ctx.next_function_serial(),
            return_type,
            params,
            host: None,
        })
    }

    /// Resolve a type annotation, substituting the error type (and
    /// recording a diagnostic) when the name is unknown.
    fn resolve_annotation(&mut self, annotation: &TypeAnnotation) -> TypeRef {
        match self.scopes.resolve_type(annotation.name) {
            Some(ty) => ty,
            None => {
                self.diagnostics.push(Diagnostic::type_error(
                    format!(
                        "unknown type '{}'",
                        self.ctx.interner.resolve(annotation.name)
                    ),
                    annotation.span,
                ));
                self.ctx.types.error()
            }
        }
    }

    fn bind_statements(&mut self, statements: &[Statement]) -> Vec<BoundStatement> {
        statements
            .iter()
            .map(|stmt| self.bind_statement(stmt))
            .collect()
    }

    fn bind_statement(&mut self, stmt: &Statement) -> BoundStatement {
        match stmt {
            Statement::VarDecl {
                name,
                annotation,
                init,
                span,
            } => {
                // The initializer binds before the declaration, so it
                // sees an outer binding of the same name.
                let init = self.bind_expr(init);
                let annotation = annotation.as_ref().map(|a| self.resolve_annotation(a));
                let declared = annotation
                    .clone()
                    .unwrap_or_else(|| self.ctx.types.error());
                self.scopes.register_variable(self.ctx, *name, declared);
                BoundStatement::VarDecl {
                    name: *name,
                    annotation,
                    init,
                    span: *span,
                }
            }
            Statement::ConstDecl {
                name,
                annotation,
                init,
                span,
            } => {
                let init = self.bind_expr(init);
                let annotation = annotation.as_ref().map(|a| self.resolve_annotation(a));
                // Registration for existence only; the checker validates
                // the literal and re-registers with the final type. A
                // non-literal initializer gets a placeholder binding.
                match &init {
                    BoundExpr::Literal { value, .. } => {
                        let ty = annotation
                            .clone()
                            .unwrap_or_else(|| literal_type(self.ctx, value));
                        self.scopes.register_constant(*name, ty, value.clone());
                    }
                    _ => {
                        let error = self.ctx.types.error();
                        self.scopes.register_variable(self.ctx, *name, error);
                    }
                }
                BoundStatement::ConstDecl {
                    name: *name,
                    annotation,
                    init,
                    span: *span,
                }
            }
            Statement::Assign { name, value, span } => BoundStatement::Assign {
                name: *name,
                value: self.bind_expr(value),
                span: *span,
            },
            Statement::If {
                condition,
                then_block,
                else_block,
                span,
            } => {
                let condition = self.bind_expr(condition);
                self.scopes.begin_scope(ScopeKind::Block);
                let then_block = self.bind_statements(then_block);
                self.scopes.exit_scope();
                let else_block = else_block.as_ref().map(|block| {
                    self.scopes.begin_scope(ScopeKind::Block);
                    let bound = self.bind_statements(block);
                    self.scopes.exit_scope();
                    bound
                });
                BoundStatement::If {
                    condition,
                    then_block,
                    else_block,
                    span: *span,
                }
            }
            Statement::While {
                condition,
                body,
                span,
            } => {
                let condition = self.bind_expr(condition);
                self.scopes.begin_scope(ScopeKind::Loop);
                let body = self.bind_statements(body);
                self.scopes.exit_scope();
                BoundStatement::While {
                    condition,
                    body,
                    span: *span,
                }
            }
            Statement::For {
                var,
                start,
                end,
                inclusive,
                step,
                body,
                span,
            } => {
                // Bounds and step bind outside the loop scope; the
                // iterator is only visible inside it.
                let start = self.bind_expr(start);
                let end = self.bind_expr(end);
                let step = step.as_ref().map(|s| self.bind_expr(s));
                self.scopes.begin_scope(ScopeKind::Loop);
                let int64 = self.ctx.types.int64();
                self.scopes.register_variable(self.ctx, *var, int64);
                let body = self.bind_statements(body);
                self.scopes.exit_scope();
                BoundStatement::For {
                    var: *var,
                    start,
                    end,
                    inclusive: *inclusive,
                    step,
                    body,
                    span: *span,
                }
            }
            Statement::Break { span } => BoundStatement::Break { span: *span },
            Statement::Continue { span } => BoundStatement::Continue { span: *span },
            Statement::Return { value, span } => BoundStatement::Return {
                value: value.as_ref().map(|v| self.bind_expr(v)),
                span: *span,
            },
            Statement::Expr { expr, span } => BoundStatement::Expr {
                expr: self.bind_expr(expr),
                span: *span,
            },
            Statement::Block { statements, span } => {
                self.scopes.begin_scope(ScopeKind::Block);
                let statements = self.bind_statements(statements);
                self.scopes.exit_scope();
                BoundStatement::Block {
                    statements,
                    span: *span,
                }
            }
            Statement::FnDecl(decl) => {
                // The flattening pre-pass hoists these; reaching one
                // here means the caller skipped it.
                self.diagnostics.push(Diagnostic::type_error(
                    format!(
                        "nested function '{}' was not flattened before binding",
                        self.ctx.interner.resolve(decl.name)
                    ),
                    decl.span,
                ));
                BoundStatement::Block {
                    statements: Vec::new(),
                    span: decl.span,
                }
            }
        }
    }

    fn bind_expr(&mut self, expr: &Expr) -> BoundExpr {
        match expr {
            Expr::Literal { value, span } => BoundExpr::Literal {
                value: value.clone(),
                span: *span,
            },
            Expr::Name { name, span } => {
                if self.scopes.get_symbol(*name).is_none() {
                    self.diagnostics.push(Diagnostic::type_error(
                        format!("undefined variable '{}'", self.ctx.interner.resolve(*name)),
                        *span,
                    ));
                    return BoundExpr::Error { span: *span };
                }
                BoundExpr::Name {
                    name: *name,
                    span: *span,
                }
            }
            Expr::Unary { op, operand, span } => BoundExpr::Unary {
                op: *op,
                operand: Box::new(self.bind_expr(operand)),
                span: *span,
            },
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => BoundExpr::Binary {
                op: *op,
                left: Box::new(self.bind_expr(left)),
                right: Box::new(self.bind_expr(right)),
                span: *span,
            },
            Expr::Call { callee, args, span } => {
                let args: Vec<BoundExpr> = args.iter().map(|a| self.bind_expr(a)).collect();
                let overloads = self.scopes.function_overloads(*callee);
                if overloads.is_empty() {
                    let message = match self.scopes.get_symbol(*callee) {
                        Some(Symbol::Variable(_) | Symbol::Parameter(_) | Symbol::Constant(_)) => {
                            format!(
                                "'{}' is not a function",
                                self.ctx.interner.resolve(*callee)
                            )
                        }
                        None => format!(
                            "undefined function '{}'",
                            self.ctx.interner.resolve(*callee)
                        ),
                    };
                    self.diagnostics
                        .push(Diagnostic::type_error(message, *span));
                    return BoundExpr::Error { span: *span };
                }
                BoundExpr::Call {
                    name: *callee,
                    overloads,
                    args,
                    span: *span,
                }
            }
        }
    }
}

fn literal_type(
    ctx: &CompilationContext,
    value: &crate::compiler::syntax::LiteralValue,
) -> TypeRef {
    use crate::compiler::syntax::LiteralValue;
    match value {
        LiteralValue::Int(_) => ctx.types.int64(),
        LiteralValue::Float(_) => ctx.types.float64(),
        LiteralValue::Bool(_) => ctx.types.bool(),
        LiteralValue::Str(_) => ctx.types.string(),
    }
}

/// Pre-bind the fixed standard-library surface: an overloaded `println`
/// per primitive type, mapped to the host console-output primitive
/// instead of a generated body.
fn register_builtins(ctx: &mut CompilationContext, scopes: &mut ScopeTree) {
    let println = ctx.interner.intern("println");
    let value = ctx.interner.intern("value");
    let overloads = [
        (ctx.types.int64(), HostFn::PrintlnInt64),
        (ctx.types.float64(), HostFn::PrintlnFloat64),
        (ctx.types.bool(), HostFn::PrintlnBool),
        (ctx.types.string(), HostFn::PrintlnString),
    ];
    for (ty, host) in overloads {
        let symbol = Rc::new(FunctionSymbol {
            name: println,
            qualified_name: println,
            serial: ctx.next_function_serial(),
            return_type: ctx.types.none(),
            params: vec![Rc::new(ParameterSymbol {
                name: value,
                ty,
                index: 0,
            })],
            host: Some(host),
        });
        scopes
            .register_function(symbol)
            .expect("builtin overloads are distinct");
    }
}
