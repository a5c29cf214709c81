//! End-to-end pipeline tests: folding equivalence, dead-branch
//! pruning, diagnostics, multi-return emission, and entry resolution.

mod common;

use common::{
    compile, compile_err, expr_stmt, function, let_stmt, main_fn, println_stmt, ret_stmt,
    run_program,
};
use kiln::compiler::diagnostics::DiagnosticKind;
use kiln::compiler::syntax::{BinaryOp, Expr, Program, Span, Statement};
use kiln::compiler::target::Op;
use kiln::{CompilationContext, CompileError};

/// Folding an integer expression never changes the program's output.
#[test]
fn test_integer_folding_preserves_behavior() {
    for fold in [false, true] {
        let mut ctx = CompilationContext::new();
        let print = println_stmt(
            &mut ctx,
            Expr::binary(
                BinaryOp::Sub,
                Expr::binary(
                    BinaryOp::Mul,
                    Expr::binary(BinaryOp::Add, Expr::int(2), Expr::int(3)),
                    Expr::int(4),
                ),
                Expr::binary(BinaryOp::Div, Expr::int(9), Expr::int(2)),
            ),
        );
        let program = main_fn(&mut ctx, vec![print]);
        let output = run_program(&mut ctx, program, fold);
        assert_eq!(output, vec!["16".to_string()], "fold_constants = {fold}");
    }
}

/// Each of the ten binary operators prints the same result whether or
/// not constants are folded.
#[test]
fn test_fold_equivalence_across_all_operators() {
    use BinaryOp::{Add, Div, Eq, Ge, Gt, Le, Lt, Mul, Ne, Sub};
    for op in [Add, Sub, Mul, Div, Eq, Ne, Lt, Le, Gt, Ge] {
        let mut outputs = Vec::new();
        for fold in [false, true] {
            let mut ctx = CompilationContext::new();
            let print = println_stmt(&mut ctx, Expr::binary(op, Expr::int(7), Expr::int(3)));
            let program = main_fn(&mut ctx, vec![print]);
            outputs.push(run_program(&mut ctx, program, fold));
        }
        assert_eq!(outputs[0], outputs[1], "operator {op}");
        assert_eq!(outputs[0].len(), 1, "operator {op}");
    }
}

/// Division by a zero literal is never folded away; the failure is
/// deferred to run time, so the division survives in the emitted code.
#[test]
fn test_division_by_zero_survives_folding() {
    let mut ctx = CompilationContext::new();
    let print = println_stmt(
        &mut ctx,
        Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0)),
    );
    let program = main_fn(&mut ctx, vec![print]);
    let compiled = compile(&mut ctx, program, true);
    assert!(
        compiled
            .entry_function()
            .code
            .contains(&Op::I64DivS)
    );
}

/// `false and <div-by-zero comparison>` folds to `false`; the pruned
/// right side is neither folded nor evaluated.
#[test]
fn test_short_circuit_prunes_the_right_operand() {
    let mut ctx = CompilationContext::new();
    let print = println_stmt(
        &mut ctx,
        Expr::binary(
            BinaryOp::And,
            Expr::bool(false),
            Expr::binary(
                BinaryOp::Eq,
                Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0)),
                Expr::int(0),
            ),
        ),
    );
    let program = main_fn(&mut ctx, vec![print]);
    let output = run_program(&mut ctx, program, true);
    assert_eq!(output, vec!["false".to_string()]);
}

/// `if false { ... }` disappears; `while false { ... }` disappears;
/// the surrounding statements keep running.
#[test]
fn test_literal_conditions_prune_dead_branches() {
    let mut ctx = CompilationContext::new();
    let dead_print = println_stmt(&mut ctx, Expr::int(-1));
    let dead_loop_print = println_stmt(&mut ctx, Expr::int(-2));
    let live_print = println_stmt(&mut ctx, Expr::int(7));
    let program = main_fn(
        &mut ctx,
        vec![
            Statement::If {
                condition: Expr::bool(false),
                then_block: vec![dead_print],
                else_block: None,
                span: Span::default(),
            },
            Statement::While {
                condition: Expr::bool(false),
                body: vec![dead_loop_print],
                span: Span::default(),
            },
            live_print,
        ],
    );
    let compiled = compile(&mut ctx, program, true);
    // Nothing of the dead branches survives emission.
    assert!(
        !compiled
            .entry_function()
            .code
            .iter()
            .any(|op| matches!(op, Op::I64Const(-1) | Op::I64Const(-2)))
    );
    assert_eq!(common::run(&compiled), vec!["7".to_string()]);
}

/// Calling a two-argument form of a function only declared with one
/// parameter yields exactly one `Type` diagnostic.
#[test]
fn test_unresolvable_overload_is_one_type_diagnostic() {
    let mut ctx = CompilationContext::new();
    let f = ctx.interner.intern("f");
    let helper = function(&mut ctx, "f", &[("x", "int64")], None, Vec::new());
    let mut program = main_fn(
        &mut ctx,
        vec![expr_stmt(Expr::call(f, vec![Expr::int(1), Expr::int(2)]))],
    );
    program.functions.push(helper);
    let CompileError::Diagnostics(diagnostics) = compile_err(&mut ctx, program) else {
        panic!("expected diagnostics");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Type);
}

/// A function with three return statements still emits exactly one
/// physical return instruction.
#[test]
fn test_three_returns_one_physical_ret() {
    let mut ctx = CompilationContext::new();
    let pick = ctx.interner.intern("pick");
    let x = ctx.interner.intern("x");
    let body = vec![
        Statement::If {
            condition: Expr::binary(BinaryOp::Lt, Expr::name(x), Expr::int(0)),
            then_block: vec![ret_stmt(Some(Expr::int(-1)))],
            else_block: None,
            span: Span::default(),
        },
        Statement::If {
            condition: Expr::binary(BinaryOp::Gt, Expr::name(x), Expr::int(0)),
            then_block: vec![ret_stmt(Some(Expr::int(1)))],
            else_block: None,
            span: Span::default(),
        },
        ret_stmt(Some(Expr::int(0))),
    ];
    let helper = function(&mut ctx, "pick", &[("x", "int64")], Some("int64"), body);
    let negative = println_stmt(&mut ctx, Expr::call(pick, vec![Expr::int(-5)]));
    let positive = println_stmt(&mut ctx, Expr::call(pick, vec![Expr::int(9)]));
    let zero = println_stmt(&mut ctx, Expr::call(pick, vec![Expr::int(0)]));
    let mut program = main_fn(&mut ctx, vec![negative, positive, zero]);
    program.functions.push(helper);
    let compiled = compile(&mut ctx, program, true);
    let pick_fn = compiled
        .functions
        .iter()
        .find(|f| ctx.interner.resolve(f.symbol.qualified_name) == "pick")
        .expect("pick was generated");
    assert_eq!(
        pick_fn
            .code
            .iter()
            .filter(|op| matches!(op, Op::Ret))
            .count(),
        1
    );
    assert_eq!(common::run(&compiled), vec!["-1", "1", "0"]);
}

/// Mixed int64/float64 arithmetic widens the int side end to end.
#[test]
fn test_numeric_promotion_end_to_end() {
    let mut ctx = CompilationContext::new();
    let print = println_stmt(
        &mut ctx,
        Expr::binary(BinaryOp::Add, Expr::int(1), Expr::float(0.5)),
    );
    let program = main_fn(&mut ctx, vec![print]);
    // Folding off keeps the Convert op observable at run time.
    let output = run_program(&mut ctx, program, false);
    assert_eq!(output, vec!["1.5".to_string()]);
}

/// break/continue outside a loop are Flow diagnostics, not Type ones.
#[test]
fn test_break_outside_loop_is_a_flow_diagnostic() {
    let mut ctx = CompilationContext::new();
    let program = main_fn(
        &mut ctx,
        vec![Statement::Break {
            span: Span::default(),
        }],
    );
    let CompileError::Diagnostics(diagnostics) = compile_err(&mut ctx, program) else {
        panic!("expected diagnostics");
    };
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::Flow);
}

/// Two `main` overloads collapse to the parameterless one.
#[test]
fn test_entry_point_collapses_to_parameterless_main() {
    let mut ctx = CompilationContext::new();
    let with_param = function(&mut ctx, "main", &[("x", "int64")], None, Vec::new());
    let mut program = main_fn(&mut ctx, Vec::new());
    program.functions.push(with_param);
    let compiled = compile(&mut ctx, program, true);
    assert!(compiled.entry.params.is_empty());
}

/// Two parameterful `main` overloads and no parameterless one is a
/// fatal ambiguity, not a diagnostic.
#[test]
fn test_ambiguous_entry_point_is_fatal() {
    let mut ctx = CompilationContext::new();
    let a = function(&mut ctx, "main", &[("x", "int64")], None, Vec::new());
    let b = function(&mut ctx, "main", &[("x", "bool")], None, Vec::new());
    let program = Program {
        functions: vec![a, b],
    };
    let err = compile_err(&mut ctx, program);
    assert!(matches!(err, CompileError::Codegen(_)));
    assert!(err.to_string().contains("ambiguous entry point"));
}

/// A nested function is flattened, qualified, and callable end to end.
#[test]
fn test_nested_function_flattens_and_runs() {
    let mut ctx = CompilationContext::new();
    let double = ctx.interner.intern("double");
    let x = ctx.interner.intern("x");
    let inner = function(
        &mut ctx,
        "double",
        &[("x", "int64")],
        Some("int64"),
        vec![ret_stmt(Some(Expr::binary(
            BinaryOp::Mul,
            Expr::name(x),
            Expr::int(2),
        )))],
    );
    let print = println_stmt(&mut ctx, Expr::call(double, vec![Expr::int(21)]));
    let program = main_fn(&mut ctx, vec![Statement::FnDecl(inner), print]);
    let compiled = compile(&mut ctx, program, true);
    assert!(
        compiled
            .functions
            .iter()
            .any(|f| ctx.interner.resolve(f.symbol.qualified_name) == "main.double")
    );
    assert_eq!(common::run(&compiled), vec!["42".to_string()]);
}

/// Constants fold into their use sites and cannot be reassigned.
#[test]
fn test_constants_substitute_and_string_concat_folds() {
    let mut ctx = CompilationContext::new();
    let greeting = ctx.interner.intern("greeting");
    let print = println_stmt(
        &mut ctx,
        Expr::binary(BinaryOp::Add, Expr::name(greeting), Expr::str(" world")),
    );
    let program = main_fn(
        &mut ctx,
        vec![
            Statement::ConstDecl {
                name: greeting,
                annotation: None,
                init: Expr::str("hello"),
                span: Span::default(),
            },
            print,
        ],
    );
    let output = run_program(&mut ctx, program, true);
    assert_eq!(output, vec!["hello world".to_string()]);
}

/// Shadowing in a nested block leaves the outer binding intact.
#[test]
fn test_block_shadowing_restores_outer_binding() {
    let mut ctx = CompilationContext::new();
    let x = ctx.interner.intern("x");
    let outer_decl = let_stmt(&mut ctx, "x", Expr::int(1));
    let inner_decl = let_stmt(&mut ctx, "x", Expr::int(2));
    let inner_print = println_stmt(&mut ctx, Expr::name(x));
    let outer_print = println_stmt(&mut ctx, Expr::name(x));
    let program = main_fn(
        &mut ctx,
        vec![
            outer_decl,
            Statement::Block {
                statements: vec![inner_decl, inner_print],
                span: Span::default(),
            },
            outer_print,
        ],
    );
    let output = run_program(&mut ctx, program, true);
    assert_eq!(output, vec!["2".to_string(), "1".to_string()]);
}
