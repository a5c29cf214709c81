//! The semantic pipeline: flattening, binding, flow checks, type
//! checking / IR building, constant folding, and code generation.
//!
//! Each stage fully consumes its input tree before the next begins.
//! Binding and checking accumulate diagnostics and keep walking; code
//! generation is only defined over diagnostic-free trees, so `compile`
//! stops with the collected diagnostics before reaching it.

pub mod binder;
pub mod bound;
pub mod checker;
pub mod codegen;
pub mod context;
pub mod diagnostics;
pub mod dump;
pub mod flatten;
pub mod flow;
pub mod folder;
pub mod interner;
pub mod ir;
pub mod scope;
pub mod symbols;
pub mod syntax;
pub mod target;
pub mod types;

use crate::compiler::binder::Binder;
use crate::compiler::checker::Checker;
use crate::compiler::codegen::CodegenError;
use crate::compiler::context::CompilationContext;
use crate::compiler::diagnostics::Diagnostic;
use crate::compiler::dump::IrPrinter;
use crate::compiler::folder::Folder;
use crate::compiler::ir::IrProgram;
use crate::compiler::syntax::Program;
use crate::compiler::target::CompiledProgram;
use crate::config::CompilerConfig;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    /// The program failed semantic analysis; code generation was not
    /// attempted.
    Diagnostics(Vec<Diagnostic>),
    /// Fatal program-assembly failure.
    Codegen(CodegenError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Diagnostics(diagnostics) => {
                for (i, diagnostic) in diagnostics.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", diagnostic)?;
                }
                Ok(())
            }
            CompileError::Codegen(err) => write!(f, "{}", err),
        }
    }
}

impl Error for CompileError {}

impl From<CodegenError> for CompileError {
    fn from(err: CodegenError) -> Self {
        CompileError::Codegen(err)
    }
}

/// Run the analysis stages: flatten, bind, flow-check, type-check.
/// Returns the typed IR together with every diagnostic collected along
/// the way; the IR is only meaningful when the list is empty.
pub fn check_program(
    ctx: &mut CompilationContext,
    program: Program,
) -> (IrProgram, Vec<Diagnostic>) {
    let program = flatten::flatten(ctx, program);
    let binding = Binder::new(ctx).bind(&program);
    let mut diagnostics = binding.diagnostics;
    diagnostics.extend(flow::check_flow(&binding.program));
    let (ir, checked) = Checker::new(ctx, binding.scopes).check(&binding.program);
    diagnostics.extend(checked);
    (ir, diagnostics)
}

/// Full pipeline: analysis, optional constant folding, code
/// generation, entry-point resolution.
pub fn compile(
    ctx: &mut CompilationContext,
    program: Program,
    config: &CompilerConfig,
) -> Result<CompiledProgram, CompileError> {
    let (ir, diagnostics) = check_program(ctx, program);
    if !diagnostics.is_empty() {
        return Err(CompileError::Diagnostics(diagnostics));
    }
    let ir = if config.fold_constants {
        Folder::new().fold_program(ir)
    } else {
        ir
    };
    if config.dump_ir {
        eprintln!("{}", IrPrinter::new(ctx).print_program(&ir));
    }
    let compiled = codegen::generate(ctx, &ir)?;
    if config.dump_code {
        for function in &compiled.functions {
            eprint!("{}", dump::dump_code(ctx, function));
        }
    }
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::syntax::{Expr, FunctionDecl, Span, Statement};

    #[test]
    fn test_compile_rejects_programs_with_diagnostics() {
        let mut ctx = CompilationContext::new();
        let main = ctx.interner.intern("main");
        let x = ctx.interner.intern("x");
        let program = Program {
            functions: vec![FunctionDecl {
                name: main,
                params: Vec::new(),
                return_annotation: None,
                body: vec![Statement::Expr {
                    expr: Expr::name(x),
                    span: Span::default(),
                }],
                span: Span::default(),
            }],
        };
        let result = compile(&mut ctx, program, &CompilerConfig::default());
        let Err(CompileError::Diagnostics(diagnostics)) = result else {
            panic!("expected diagnostics");
        };
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_compile_resolves_the_entry_point() {
        let mut ctx = CompilationContext::new();
        let main = ctx.interner.intern("main");
        let program = Program {
            functions: vec![FunctionDecl {
                name: main,
                params: Vec::new(),
                return_annotation: None,
                body: Vec::new(),
                span: Span::default(),
            }],
        };
        let compiled = compile(&mut ctx, program, &CompilerConfig::default())
            .expect("empty main compiles");
        assert_eq!(ctx.interner.resolve(compiled.entry.qualified_name), "main");
    }
}
