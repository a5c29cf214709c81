//! Local-function flattening pre-pass.
//!
//! Functions declared inside functions are hoisted to a single flat
//! list before binding: each nested declaration is renamed to a dotted
//! qualified name (`outer.inner`) and every call site in scope is
//! rewritten to the qualified name, so the binder and every later pass
//! only ever see a flat function list with no nested declarations.

use crate::compiler::context::CompilationContext;
use crate::compiler::interner::NameId;
use crate::compiler::syntax::{Expr, FunctionDecl, Program, Statement};
use std::collections::HashMap;

pub fn flatten(ctx: &mut CompilationContext, program: Program) -> Program {
    let mut flattener = Flattener {
        ctx,
        renames: Vec::new(),
        flat: Vec::new(),
    };
    for decl in program.functions {
        flattener.flatten_function(decl, None);
    }
    Program {
        functions: flattener.flat,
    }
}

struct Flattener<'a> {
    ctx: &'a mut CompilationContext,
    /// Rename maps, innermost last; call sites resolve against the
    /// nearest enclosing map that knows the name.
    renames: Vec<HashMap<NameId, NameId>>,
    flat: Vec<FunctionDecl>,
}

impl Flattener<'_> {
    fn flatten_function(&mut self, mut decl: FunctionDecl, prefix: Option<&str>) {
        let qualified_text = match prefix {
            Some(prefix) => format!("{}.{}", prefix, self.ctx.interner.resolve(decl.name)),
            None => self.ctx.interner.resolve(decl.name).to_string(),
        };
        decl.name = self.ctx.interner.intern(&qualified_text);

        // Hoist this function's direct nested declarations and record
        // their qualified names before rewriting any call site, so a
        // call above the declaration still resolves.
        let mut nested = Vec::new();
        extract_nested(&mut decl.body, &mut nested);
        let mut scope = HashMap::new();
        for inner in &nested {
            let inner_name = self.ctx.interner.resolve(inner.name).to_string();
            let qualified = self
                .ctx
                .interner
                .intern(&format!("{}.{}", qualified_text, inner_name));
            scope.insert(inner.name, qualified);
        }
        self.renames.push(scope);

        for stmt in &mut decl.body {
            self.rewrite_statement(stmt);
        }
        self.flat.push(decl);
        for inner in nested {
            self.flatten_function(inner, Some(&qualified_text));
        }
        self.renames.pop();
    }

    fn rename(&self, name: NameId) -> NameId {
        for scope in self.renames.iter().rev() {
            if let Some(&qualified) = scope.get(&name) {
                return qualified;
            }
        }
        name
    }

    fn rewrite_statement(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::VarDecl { init, .. } | Statement::ConstDecl { init, .. } => {
                self.rewrite_expr(init);
            }
            Statement::Assign { value, .. } => self.rewrite_expr(value),
            Statement::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                self.rewrite_expr(condition);
                for stmt in then_block {
                    self.rewrite_statement(stmt);
                }
                if let Some(block) = else_block {
                    for stmt in block {
                        self.rewrite_statement(stmt);
                    }
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                self.rewrite_expr(condition);
                for stmt in body {
                    self.rewrite_statement(stmt);
                }
            }
            Statement::For {
                start,
                end,
                step,
                body,
                ..
            } => {
                self.rewrite_expr(start);
                self.rewrite_expr(end);
                if let Some(step) = step {
                    self.rewrite_expr(step);
                }
                for stmt in body {
                    self.rewrite_statement(stmt);
                }
            }
            Statement::Return { value, .. } => {
                if let Some(value) = value {
                    self.rewrite_expr(value);
                }
            }
            Statement::Expr { expr, .. } => self.rewrite_expr(expr),
            Statement::Block { statements, .. } => {
                for stmt in statements {
                    self.rewrite_statement(stmt);
                }
            }
            Statement::Break { .. } | Statement::Continue { .. } => {}
            // Direct children were extracted already; anything left is
            // nested deeper and gets extracted on its own pass.
            Statement::FnDecl(_) => {}
        }
    }

    fn rewrite_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::Call { callee, args, .. } => {
                *callee = self.rename(*callee);
                for arg in args {
                    self.rewrite_expr(arg);
                }
            }
            Expr::Unary { operand, .. } => self.rewrite_expr(operand),
            Expr::Binary { left, right, .. } => {
                self.rewrite_expr(left);
                self.rewrite_expr(right);
            }
            Expr::Literal { .. } | Expr::Name { .. } => {}
        }
    }
}

/// Remove every `FnDecl` statement reachable in this function's own
/// body (without entering the removed functions) and collect them.
fn extract_nested(statements: &mut Vec<Statement>, out: &mut Vec<FunctionDecl>) {
    let mut index = 0;
    while index < statements.len() {
        match &mut statements[index] {
            Statement::FnDecl(_) => {
                let Statement::FnDecl(decl) = statements.remove(index) else {
                    unreachable!();
                };
                out.push(decl);
            }
            Statement::If {
                then_block,
                else_block,
                ..
            } => {
                extract_nested(then_block, out);
                if let Some(block) = else_block {
                    extract_nested(block, out);
                }
                index += 1;
            }
            Statement::While { body, .. } | Statement::For { body, .. } => {
                extract_nested(body, out);
                index += 1;
            }
            Statement::Block {
                statements: inner, ..
            } => {
                extract_nested(inner, out);
                index += 1;
            }
            _ => index += 1,
        }
    }
}
