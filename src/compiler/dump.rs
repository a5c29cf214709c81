//! Pretty-printers for the typed IR and generated code.
//!
//! Human-readable output for debugging the compiler pipeline.

use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{IrExpr, IrFunction, IrProgram, IrStatement, LocalRef, LogicalOp};
use crate::compiler::target::CompiledFunction;

/// Pretty-printer for the typed IR tree.
pub struct IrPrinter<'a> {
    ctx: &'a CompilationContext,
    output: String,
    indent: usize,
}

impl<'a> IrPrinter<'a> {
    pub fn new(ctx: &'a CompilationContext) -> Self {
        Self {
            ctx,
            output: String::new(),
            indent: 0,
        }
    }

    pub fn print_program(&mut self, program: &IrProgram) -> &str {
        self.writeln("Program");
        self.indent += 1;
        for (i, function) in program.functions.iter().enumerate() {
            let is_last = i == program.functions.len() - 1;
            self.print_function(function, is_last);
        }
        self.indent -= 1;
        &self.output
    }

    fn print_function(&mut self, function: &IrFunction, is_last: bool) {
        let params = function
            .symbol
            .params
            .iter()
            .map(|p| format!("{}: {}", self.ctx.interner.resolve(p.name), p.ty.kind))
            .collect::<Vec<_>>()
            .join(", ");
        self.write_node(
            is_last,
            &format!(
                "Function: {}({}) -> {}",
                self.ctx.interner.resolve(function.symbol.qualified_name),
                params,
                function.symbol.return_type.kind
            ),
        );
        self.indent += 1;
        self.print_statements(&function.body);
        self.indent -= 1;
    }

    fn print_statements(&mut self, statements: &[IrStatement]) {
        for (i, stmt) in statements.iter().enumerate() {
            let is_last = i == statements.len() - 1;
            self.print_statement(stmt, is_last);
        }
    }

    fn print_statement(&mut self, stmt: &IrStatement, is_last: bool) {
        match stmt {
            IrStatement::VarDecl { symbol, init } => {
                self.write_node(
                    is_last,
                    &format!(
                        "VarDecl: {}: {}",
                        self.ctx.interner.resolve(symbol.name),
                        symbol.ty.kind
                    ),
                );
                self.print_child_expr(init);
            }
            IrStatement::Assign { target, value } => {
                self.write_node(is_last, &format!("Assign: {}", self.local_name(target)));
                self.print_child_expr(value);
            }
            IrStatement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.write_node(is_last, "If");
                self.indent += 1;
                self.print_expr(condition, else_block.is_none() && then_block.is_empty());
                self.write_node(else_block.is_none(), "Then");
                self.indent += 1;
                self.print_statements(then_block);
                self.indent -= 1;
                if let Some(block) = else_block {
                    self.write_node(true, "Else");
                    self.indent += 1;
                    self.print_statements(block);
                    self.indent -= 1;
                }
                self.indent -= 1;
            }
            IrStatement::While { condition, body } => {
                self.write_node(is_last, "While");
                self.indent += 1;
                self.print_expr(condition, body.is_empty());
                self.print_statements(body);
                self.indent -= 1;
            }
            IrStatement::Break => self.write_node(is_last, "Break"),
            IrStatement::Continue => self.write_node(is_last, "Continue"),
            IrStatement::Return { value } => {
                self.write_node(is_last, "Return");
                if let Some(value) = value {
                    self.print_child_expr(value);
                }
            }
            IrStatement::Expr { expr } => {
                self.write_node(is_last, "ExprStmt");
                self.print_child_expr(expr);
            }
            IrStatement::Block { statements } => {
                self.write_node(is_last, "Block");
                self.indent += 1;
                self.print_statements(statements);
                self.indent -= 1;
            }
        }
    }

    fn print_child_expr(&mut self, expr: &IrExpr) {
        self.indent += 1;
        self.print_expr(expr, true);
        self.indent -= 1;
    }

    fn print_expr(&mut self, expr: &IrExpr, is_last: bool) {
        match expr {
            IrExpr::Literal { value, ty } => {
                self.write_node(is_last, &format!("Literal: {} ({})", value, ty.kind));
            }
            IrExpr::Local { local } => {
                self.write_node(
                    is_last,
                    &format!("Local: {} ({})", self.local_name(local), local.ty().kind),
                );
            }
            IrExpr::Unary { op, operand, ty } => {
                self.write_node(is_last, &format!("Unary: {:?} ({})", op, ty.kind));
                self.print_child_expr(operand);
            }
            IrExpr::Binary {
                op,
                left,
                right,
                ty,
            } => {
                self.write_node(is_last, &format!("Binary: {} ({})", op, ty.kind));
                self.indent += 1;
                self.print_expr(left, false);
                self.print_expr(right, true);
                self.indent -= 1;
            }
            IrExpr::Logical { op, left, right, .. } => {
                let name = match op {
                    LogicalOp::And => "and",
                    LogicalOp::Or => "or",
                };
                self.write_node(is_last, &format!("Logical: {} (bool)", name));
                self.indent += 1;
                self.print_expr(left, false);
                self.print_expr(right, true);
                self.indent -= 1;
            }
            IrExpr::Call { symbol, args } => {
                self.write_node(
                    is_last,
                    &format!(
                        "Call: {} -> {}",
                        self.ctx.interner.resolve(symbol.qualified_name),
                        symbol.return_type.kind
                    ),
                );
                self.indent += 1;
                for (i, arg) in args.iter().enumerate() {
                    self.print_expr(arg, i == args.len() - 1);
                }
                self.indent -= 1;
            }
            IrExpr::Convert { value, ty } => {
                self.write_node(is_last, &format!("Convert: -> {}", ty.kind));
                self.print_child_expr(value);
            }
            IrExpr::Error { .. } => self.write_node(is_last, "Error"),
        }
    }

    fn local_name(&self, local: &LocalRef) -> &str {
        match local {
            LocalRef::Variable(v) => self.ctx.interner.resolve(v.name),
            LocalRef::Parameter(p) => self.ctx.interner.resolve(p.name),
        }
    }

    fn write_node(&mut self, is_last: bool, text: &str) {
        let prefix = if is_last { "└── " } else { "├── " };
        for _ in 1..self.indent {
            self.output.push_str("    ");
        }
        if self.indent > 0 {
            self.output.push_str(prefix);
        }
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn writeln(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }
}

/// Disassembly-style listing of one generated function body.
pub fn dump_code(ctx: &CompilationContext, function: &CompiledFunction) -> String {
    let mut output = format!(
        "{} (locals: {})\n",
        ctx.interner.resolve(function.symbol.qualified_name),
        function.locals
    );
    for (index, op) in function.code.iter().enumerate() {
        output.push_str(&format!("  {:04}: {:?}\n", index, op));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::binder::Binder;
    use crate::compiler::checker::Checker;
    use crate::compiler::syntax::{Expr, FunctionDecl, Program, Span, Statement};

    #[test]
    fn test_printer_renders_every_node_kind_it_meets() {
        let mut ctx = CompilationContext::new();
        let main = ctx.interner.intern("main");
        let println = ctx.interner.intern("println");
        let x = ctx.interner.intern("x");
        let program = Program {
            functions: vec![FunctionDecl {
                name: main,
                params: Vec::new(),
                return_annotation: None,
                body: vec![
                    Statement::VarDecl {
                        name: x,
                        annotation: None,
                        init: Expr::int(1),
                        span: Span::default(),
                    },
                    Statement::Expr {
                        expr: Expr::call(println, vec![Expr::name(x)]),
                        span: Span::default(),
                    },
                ],
                span: Span::default(),
            }],
        };
        let binding = Binder::new(&mut ctx).bind(&program);
        let (ir, diagnostics) = Checker::new(&mut ctx, binding.scopes).check(&binding.program);
        assert!(diagnostics.is_empty());
        let mut printer = IrPrinter::new(&ctx);
        let rendered = printer.print_program(&ir);
        assert!(rendered.contains("Function: main() -> none"));
        assert!(rendered.contains("VarDecl: x: int64"));
        assert!(rendered.contains("Call: println -> none"));
    }
}
