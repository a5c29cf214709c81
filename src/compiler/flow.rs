//! Control-flow placement checks over the bound tree.
//!
//! `break` and `continue` are only legal inside a loop body; the code
//! generator assumes this holds and resolves them against its loop
//! label stack without re-checking. `return` outside a function cannot
//! be expressed in the tree, so only the loop rules live here.

use crate::compiler::bound::{BoundProgram, BoundStatement};
use crate::compiler::diagnostics::Diagnostic;

pub fn check_flow(program: &BoundProgram) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for function in &program.functions {
        check_statements(&function.body, 0, &mut diagnostics);
    }
    diagnostics
}

fn check_statements(statements: &[BoundStatement], loop_depth: usize, out: &mut Vec<Diagnostic>) {
    for stmt in statements {
        match stmt {
            BoundStatement::Break { span } => {
                if loop_depth == 0 {
                    out.push(Diagnostic::flow_error("'break' outside of a loop", *span));
                }
            }
            BoundStatement::Continue { span } => {
                if loop_depth == 0 {
                    out.push(Diagnostic::flow_error(
                        "'continue' outside of a loop",
                        *span,
                    ));
                }
            }
            BoundStatement::If {
                then_block,
                else_block,
                ..
            } => {
                check_statements(then_block, loop_depth, out);
                if let Some(block) = else_block {
                    check_statements(block, loop_depth, out);
                }
            }
            BoundStatement::While { body, .. } | BoundStatement::For { body, .. } => {
                check_statements(body, loop_depth + 1, out);
            }
            BoundStatement::Block { statements, .. } => {
                check_statements(statements, loop_depth, out);
            }
            BoundStatement::VarDecl { .. }
            | BoundStatement::ConstDecl { .. }
            | BoundStatement::Assign { .. }
            | BoundStatement::Return { .. }
            | BoundStatement::Expr { .. } => {}
        }
    }
}
