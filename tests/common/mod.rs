//! Shared helpers for the integration tests: terse syntax-tree
//! builders plus a small reference interpreter for the abstract target
//! operations, so generated programs can be executed and their printed
//! output asserted.

#![allow(dead_code)]

use kiln::compiler::symbols::HostFn;
use kiln::compiler::syntax::{
    Expr, FunctionDecl, ParamDecl, Program, Span, Statement, TypeAnnotation,
};
use kiln::compiler::target::{CompiledFunction, CompiledProgram, Op};
use kiln::{CompilationContext, CompileError, CompilerConfig};

pub fn main_fn(ctx: &mut CompilationContext, body: Vec<Statement>) -> Program {
    Program {
        functions: vec![function(ctx, "main", &[], None, body)],
    }
}

pub fn function(
    ctx: &mut CompilationContext,
    name: &str,
    params: &[(&str, &str)],
    return_type: Option<&str>,
    body: Vec<Statement>,
) -> FunctionDecl {
    let params = params
        .iter()
        .map(|(name, ty)| ParamDecl {
            name: ctx.interner.intern(name),
            annotation: TypeAnnotation {
                name: ctx.interner.intern(ty),
                span: Span::default(),
            },
            span: Span::default(),
        })
        .collect();
    FunctionDecl {
        name: ctx.interner.intern(name),
        params,
        return_annotation: return_type.map(|ty| TypeAnnotation {
            name: ctx.interner.intern(ty),
            span: Span::default(),
        }),
        body,
        span: Span::default(),
    }
}

pub fn expr_stmt(expr: Expr) -> Statement {
    Statement::Expr {
        expr,
        span: Span::default(),
    }
}

pub fn println_stmt(ctx: &mut CompilationContext, arg: Expr) -> Statement {
    let println = ctx.interner.intern("println");
    expr_stmt(Expr::call(println, vec![arg]))
}

pub fn let_stmt(ctx: &mut CompilationContext, name: &str, init: Expr) -> Statement {
    Statement::VarDecl {
        name: ctx.interner.intern(name),
        annotation: None,
        init,
        span: Span::default(),
    }
}

pub fn ret_stmt(value: Option<Expr>) -> Statement {
    Statement::Return {
        value,
        span: Span::default(),
    }
}

pub fn for_stmt(
    ctx: &mut CompilationContext,
    var: &str,
    start: Expr,
    end: Expr,
    inclusive: bool,
    step: Option<Expr>,
    body: Vec<Statement>,
) -> Statement {
    Statement::For {
        var: ctx.interner.intern(var),
        start,
        end,
        inclusive,
        step,
        body,
        span: Span::default(),
    }
}

/// Compile with the given folding setting; panics on any error so
/// tests read as straight-line assertions.
pub fn compile(
    ctx: &mut CompilationContext,
    program: Program,
    fold_constants: bool,
) -> CompiledProgram {
    let config = CompilerConfig {
        fold_constants,
        ..CompilerConfig::default()
    };
    kiln::compile(ctx, program, &config).expect("program compiles")
}

pub fn compile_err(ctx: &mut CompilationContext, program: Program) -> CompileError {
    kiln::compile(ctx, program, &CompilerConfig::default())
        .err()
        .expect("program is rejected")
}

/// Compile and execute, returning the printed lines.
pub fn run_program(ctx: &mut CompilationContext, program: Program, fold_constants: bool) -> Vec<String> {
    let compiled = compile(ctx, program, fold_constants);
    run(&compiled)
}

// --- reference interpreter -------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(usize),
}

struct Machine<'a> {
    program: &'a CompiledProgram,
    strings: Vec<String>,
    output: Vec<String>,
}

/// Execute a compiled program from its entry point and collect the
/// println output.
pub fn run(program: &CompiledProgram) -> Vec<String> {
    let mut machine = Machine {
        program,
        strings: program.strings.clone(),
        output: Vec::new(),
    };
    let entry = program.entry_function();
    machine.run_function(entry, Vec::new());
    machine.output
}

impl Machine<'_> {
    fn run_function(&mut self, function: &CompiledFunction, args: Vec<Value>) -> Option<Value> {
        let mut locals = vec![Value::Int(0); function.locals.max(args.len())];
        locals[..args.len()].copy_from_slice(&args);
        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0;
        while pc < function.code.len() {
            match &function.code[pc] {
                Op::I64Const(v) => stack.push(Value::Int(*v)),
                Op::F64Const(v) => stack.push(Value::Float(*v)),
                Op::BoolConst(v) => stack.push(Value::Bool(*v)),
                Op::StringConst(i) => stack.push(Value::Str(*i)),
                Op::LocalGet(slot) => stack.push(locals[*slot]),
                Op::LocalSet(slot) => locals[*slot] = pop(&mut stack),
                Op::Drop => {
                    pop(&mut stack);
                }
                Op::Dup => {
                    let top = *stack.last().expect("stack underflow");
                    stack.push(top);
                }
                Op::I64Add => int_binop(&mut stack, |a, b| a.wrapping_add(b)),
                Op::I64Sub => int_binop(&mut stack, |a, b| a.wrapping_sub(b)),
                Op::I64Mul => int_binop(&mut stack, |a, b| a.wrapping_mul(b)),
                Op::I64DivS => int_binop(&mut stack, |a, b| {
                    a.checked_div(b).expect("division by zero")
                }),
                Op::I64Neg => {
                    let v = pop_int(&mut stack);
                    stack.push(Value::Int(v.wrapping_neg()));
                }
                Op::F64Add => float_binop(&mut stack, |a, b| a + b),
                Op::F64Sub => float_binop(&mut stack, |a, b| a - b),
                Op::F64Mul => float_binop(&mut stack, |a, b| a * b),
                Op::F64Div => float_binop(&mut stack, |a, b| a / b),
                Op::F64Neg => {
                    let v = pop_float(&mut stack);
                    stack.push(Value::Float(-v));
                }
                Op::I64Eq => int_cmp(&mut stack, |a, b| a == b),
                Op::I64Ne => int_cmp(&mut stack, |a, b| a != b),
                Op::I64LtS => int_cmp(&mut stack, |a, b| a < b),
                Op::I64LeS => int_cmp(&mut stack, |a, b| a <= b),
                Op::I64GtS => int_cmp(&mut stack, |a, b| a > b),
                Op::I64GeS => int_cmp(&mut stack, |a, b| a >= b),
                Op::F64Eq => float_cmp(&mut stack, |a, b| a == b),
                Op::F64Ne => float_cmp(&mut stack, |a, b| a != b),
                Op::F64Lt => float_cmp(&mut stack, |a, b| a < b),
                Op::F64Le => float_cmp(&mut stack, |a, b| a <= b),
                Op::F64Gt => float_cmp(&mut stack, |a, b| a > b),
                Op::F64Ge => float_cmp(&mut stack, |a, b| a >= b),
                Op::BoolNot => {
                    let v = pop_bool(&mut stack);
                    stack.push(Value::Bool(!v));
                }
                Op::BoolAnd => bool_binop(&mut stack, |a, b| a && b),
                Op::BoolOr => bool_binop(&mut stack, |a, b| a || b),
                Op::BoolEq => bool_cmp(&mut stack, |a, b| a == b),
                Op::BoolNe => bool_cmp(&mut stack, |a, b| a != b),
                Op::StringConcat => {
                    let b = self.pop_str(&mut stack);
                    let a = self.pop_str(&mut stack);
                    let joined = format!("{}{}", a, b);
                    let index = self.strings.len();
                    self.strings.push(joined);
                    stack.push(Value::Str(index));
                }
                Op::StringEq => {
                    let b = self.pop_str(&mut stack);
                    let a = self.pop_str(&mut stack);
                    stack.push(Value::Bool(a == b));
                }
                Op::StringNe => {
                    let b = self.pop_str(&mut stack);
                    let a = self.pop_str(&mut stack);
                    stack.push(Value::Bool(a != b));
                }
                Op::F64ConvertI64S => {
                    let v = pop_int(&mut stack);
                    stack.push(Value::Float(v as f64));
                }
                Op::Jmp(target) => {
                    pc = *target;
                    continue;
                }
                Op::BrIf(target) => {
                    if pop_bool(&mut stack) {
                        pc = *target;
                        continue;
                    }
                }
                Op::BrIfFalse(target) => {
                    if !pop_bool(&mut stack) {
                        pc = *target;
                        continue;
                    }
                }
                Op::Call(serial, argc) => {
                    let callee = self
                        .program
                        .function(*serial)
                        .expect("call target has a body");
                    let split = stack.len() - argc;
                    let args = stack.split_off(split);
                    if let Some(result) = self.run_function(callee, args) {
                        stack.push(result);
                    }
                }
                Op::HostCall(host) => self.host_call(*host, &mut stack),
                Op::Ret => {
                    return if function.symbol.return_type.is_none() {
                        None
                    } else {
                        stack.pop()
                    };
                }
            }
            pc += 1;
        }
        None
    }

    fn host_call(&mut self, host: HostFn, stack: &mut Vec<Value>) {
        let line = match host {
            HostFn::PrintlnInt64 => pop_int(stack).to_string(),
            HostFn::PrintlnFloat64 => pop_float(stack).to_string(),
            HostFn::PrintlnBool => pop_bool(stack).to_string(),
            HostFn::PrintlnString => {
                let value = pop(stack);
                let Value::Str(index) = value else {
                    panic!("println(string) over a non-string {value:?}");
                };
                self.strings[index].clone()
            }
        };
        self.output.push(line);
    }

    fn pop_str(&self, stack: &mut Vec<Value>) -> String {
        let Value::Str(index) = pop(stack) else {
            panic!("expected a string on the stack");
        };
        self.strings[index].clone()
    }
}

fn pop(stack: &mut Vec<Value>) -> Value {
    stack.pop().expect("stack underflow")
}

fn pop_int(stack: &mut Vec<Value>) -> i64 {
    match pop(stack) {
        Value::Int(v) => v,
        other => panic!("expected an int, found {other:?}"),
    }
}

fn pop_float(stack: &mut Vec<Value>) -> f64 {
    match pop(stack) {
        Value::Float(v) => v,
        other => panic!("expected a float, found {other:?}"),
    }
}

fn pop_bool(stack: &mut Vec<Value>) -> bool {
    match pop(stack) {
        Value::Bool(v) => v,
        other => panic!("expected a bool, found {other:?}"),
    }
}

fn int_binop(stack: &mut Vec<Value>, f: impl Fn(i64, i64) -> i64) {
    let b = pop_int(stack);
    let a = pop_int(stack);
    stack.push(Value::Int(f(a, b)));
}

fn int_cmp(stack: &mut Vec<Value>, f: impl Fn(i64, i64) -> bool) {
    let b = pop_int(stack);
    let a = pop_int(stack);
    stack.push(Value::Bool(f(a, b)));
}

fn float_binop(stack: &mut Vec<Value>, f: impl Fn(f64, f64) -> f64) {
    let b = pop_float(stack);
    let a = pop_float(stack);
    stack.push(Value::Float(f(a, b)));
}

fn float_cmp(stack: &mut Vec<Value>, f: impl Fn(f64, f64) -> bool) {
    let b = pop_float(stack);
    let a = pop_float(stack);
    stack.push(Value::Bool(f(a, b)));
}

fn bool_binop(stack: &mut Vec<Value>, f: impl Fn(bool, bool) -> bool) {
    let b = pop_bool(stack);
    let a = pop_bool(stack);
    stack.push(Value::Bool(f(a, b)));
}

fn bool_cmp(stack: &mut Vec<Value>, f: impl Fn(bool, bool) -> bool) {
    let b = pop_bool(stack);
    let a = pop_bool(stack);
    stack.push(Value::Bool(f(a, b)));
}
