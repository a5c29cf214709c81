//! Stack-machine code generation over folded, diagnostic-free IR.
//!
//! Control flow is linearized with a label/patch scheme: branches are
//! emitted with a placeholder target and patched once the target index
//! is known. A per-loop frame records the loop's start index and the
//! branch sites waiting for its end label; `break`/`continue` resolve
//! against the innermost frame. Generating over a tree that still has
//! diagnostics is a contract violation, not a recoverable condition.

use crate::compiler::context::CompilationContext;
use crate::compiler::ir::{IrExpr, IrFunction, IrProgram, IrStatement, LocalRef, LogicalOp};
use crate::compiler::symbols::FunctionSymbol;
use crate::compiler::syntax::{BinaryOp, LiteralValue, UnaryOp};
use crate::compiler::target::{CompiledFunction, CompiledProgram, Op};
use crate::compiler::types::TypeKind;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

/// Fatal program-assembly failures; never diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    NoEntryPoint,
    AmbiguousEntryPoint,
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::NoEntryPoint => write!(f, "no entry point: no function named 'main'"),
            CodegenError::AmbiguousEntryPoint => {
                write!(f, "ambiguous entry point: define a parameterless 'main'")
            }
        }
    }
}

impl Error for CodegenError {}

pub fn generate(
    ctx: &CompilationContext,
    program: &IrProgram,
) -> Result<CompiledProgram, CodegenError> {
    let mut strings = StringPool::default();
    let functions: Vec<CompiledFunction> = program
        .functions
        .iter()
        .map(|f| FunctionGenerator::new(&mut strings).generate(f))
        .collect();
    let entry = resolve_entry(ctx, &functions)?;
    Ok(CompiledProgram {
        functions,
        strings: strings.pool,
        entry,
    })
}

/// Locate `main`: zero candidates is fatal; several collapse to the
/// unique parameterless overload or are fatal.
fn resolve_entry(
    ctx: &CompilationContext,
    functions: &[CompiledFunction],
) -> Result<Rc<FunctionSymbol>, CodegenError> {
    let main = ctx.interner.get("main");
    let candidates: Vec<&CompiledFunction> = functions
        .iter()
        .filter(|f| Some(f.symbol.qualified_name) == main)
        .collect();
    match candidates.as_slice() {
        [] => Err(CodegenError::NoEntryPoint),
        [single] => Ok(Rc::clone(&single.symbol)),
        several => {
            let mut parameterless = several.iter().filter(|f| f.symbol.params.is_empty());
            match (parameterless.next(), parameterless.next()) {
                (Some(entry), None) => Ok(Rc::clone(&entry.symbol)),
                _ => Err(CodegenError::AmbiguousEntryPoint),
            }
        }
    }
}

#[derive(Default)]
struct StringPool {
    pool: Vec<String>,
    indices: HashMap<String, usize>,
}

impl StringPool {
    fn intern(&mut self, text: &str) -> usize {
        if let Some(&index) = self.indices.get(text) {
            return index;
        }
        let index = self.pool.len();
        self.pool.push(text.to_string());
        self.indices.insert(text.to_string(), index);
        index
    }
}

struct LoopFrame {
    /// Index of the condition, the `continue` target.
    start: usize,
    /// Branch sites waiting for the loop-end label.
    end_patches: Vec<usize>,
}

/// How `return` statements are emitted for one function body.
#[derive(Clone, Copy)]
enum ReturnMode {
    /// A single trailing return is emitted inline.
    Inline,
    /// Multiple or early returns are redirected to one shared
    /// epilogue; a value-returning function stores into a hidden
    /// result slot first.
    Epilogue { result_slot: Option<usize> },
}

struct FunctionGenerator<'a> {
    strings: &'a mut StringPool,
    ops: Vec<Op>,
    /// Variable serial → local slot; parameters use their index
    /// directly and stay out of this table.
    slots: HashMap<u32, usize>,
    next_slot: usize,
    loops: Vec<LoopFrame>,
    return_mode: ReturnMode,
    epilogue_patches: Vec<usize>,
}

impl<'a> FunctionGenerator<'a> {
    fn new(strings: &'a mut StringPool) -> Self {
        Self {
            strings,
            ops: Vec::new(),
            slots: HashMap::new(),
            next_slot: 0,
            loops: Vec::new(),
            return_mode: ReturnMode::Inline,
            epilogue_patches: Vec::new(),
        }
    }

    fn generate(mut self, function: &IrFunction) -> CompiledFunction {
        self.next_slot = function.symbol.params.len();
        self.return_mode = self.pick_return_mode(function);

        for stmt in &function.body {
            self.emit_statement(stmt);
        }

        match self.return_mode {
            ReturnMode::Inline => {
                if !matches!(self.ops.last(), Some(Op::Ret)) {
                    self.ops.push(Op::Ret);
                }
            }
            ReturnMode::Epilogue { result_slot } => {
                let epilogue = self.ops.len();
                for site in std::mem::take(&mut self.epilogue_patches) {
                    self.patch(site, epilogue);
                }
                if let Some(slot) = result_slot {
                    self.ops.push(Op::LocalGet(slot));
                }
                self.ops.push(Op::Ret);
            }
        }

        CompiledFunction {
            symbol: Rc::clone(&function.symbol),
            locals: self.next_slot,
            code: self.ops,
        }
    }

    /// More than one return, or an early return in a value-returning
    /// function, redirects every return through a shared epilogue so
    /// the body has exactly one physical return instruction.
    fn pick_return_mode(&mut self, function: &IrFunction) -> ReturnMode {
        let returns = count_returns(&function.body);
        let last_is_return = matches!(function.body.last(), Some(IrStatement::Return { .. }));
        let returns_value = !function.symbol.return_type.is_none();
        let early = returns > 0 && !(returns == 1 && last_is_return);
        if returns > 1 || (returns_value && early) {
            let result_slot = returns_value.then(|| {
                let slot = self.next_slot;
                self.next_slot += 1;
                slot
            });
            ReturnMode::Epilogue { result_slot }
        } else {
            ReturnMode::Inline
        }
    }

    fn patch(&mut self, site: usize, target: usize) {
        match &mut self.ops[site] {
            Op::Jmp(t) | Op::BrIf(t) | Op::BrIfFalse(t) => *t = target,
            other => panic!("patch site {site} holds a non-branch op {other:?}"),
        }
    }

    fn slot_of(&self, local: &LocalRef) -> usize {
        match local {
            LocalRef::Parameter(p) => p.index,
            LocalRef::Variable(v) => *self
                .slots
                .get(&v.serial)
                .expect("variable declared before use"),
        }
    }

    fn emit_statement(&mut self, stmt: &IrStatement) {
        match stmt {
            IrStatement::VarDecl { symbol, init } => {
                self.emit_expr(init);
                let slot = *self.slots.entry(symbol.serial).or_insert_with(|| {
                    let slot = self.next_slot;
                    self.next_slot += 1;
                    slot
                });
                self.ops.push(Op::LocalSet(slot));
            }
            IrStatement::Assign { target, value } => {
                self.emit_expr(value);
                let slot = self.slot_of(target);
                self.ops.push(Op::LocalSet(slot));
            }
            IrStatement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.emit_expr(condition);
                let skip_then = self.ops.len();
                self.ops.push(Op::BrIfFalse(0));
                for stmt in then_block {
                    self.emit_statement(stmt);
                }
                match else_block {
                    Some(else_block) => {
                        let skip_else = self.ops.len();
                        self.ops.push(Op::Jmp(0));
                        let else_start = self.ops.len();
                        self.patch(skip_then, else_start);
                        for stmt in else_block {
                            self.emit_statement(stmt);
                        }
                        let end = self.ops.len();
                        self.patch(skip_else, end);
                    }
                    None => {
                        let end = self.ops.len();
                        self.patch(skip_then, end);
                    }
                }
            }
            IrStatement::While { condition, body } => {
                let start = self.ops.len();
                self.emit_expr(condition);
                let exit = self.ops.len();
                self.ops.push(Op::BrIfFalse(0));
                self.loops.push(LoopFrame {
                    start,
                    end_patches: vec![exit],
                });
                for stmt in body {
                    self.emit_statement(stmt);
                }
                self.ops.push(Op::Jmp(start));
                let end = self.ops.len();
                let frame = self.loops.pop().expect("loop frame pushed above");
                for site in frame.end_patches {
                    self.patch(site, end);
                }
            }
            IrStatement::Break => {
                let site = self.ops.len();
                self.ops.push(Op::Jmp(0));
                self.loops
                    .last_mut()
                    .expect("break inside a loop")
                    .end_patches
                    .push(site);
            }
            IrStatement::Continue => {
                let start = self.loops.last().expect("continue inside a loop").start;
                self.ops.push(Op::Jmp(start));
            }
            IrStatement::Return { value } => {
                if let Some(value) = value {
                    self.emit_expr(value);
                }
                match self.return_mode {
                    ReturnMode::Inline => self.ops.push(Op::Ret),
                    ReturnMode::Epilogue { result_slot } => {
                        if let Some(slot) = result_slot {
                            if value.is_some() {
                                self.ops.push(Op::LocalSet(slot));
                            }
                        }
                        let site = self.ops.len();
                        self.ops.push(Op::Jmp(0));
                        self.epilogue_patches.push(site);
                    }
                }
            }
            IrStatement::Expr { expr } => {
                self.emit_expr(expr);
                if !expr.ty().is_none() {
                    self.ops.push(Op::Drop);
                }
            }
            IrStatement::Block { statements } => {
                for stmt in statements {
                    self.emit_statement(stmt);
                }
            }
        }
    }

    fn emit_expr(&mut self, expr: &IrExpr) {
        match expr {
            IrExpr::Literal { value, .. } => {
                let op = match value {
                    LiteralValue::Int(v) => Op::I64Const(*v),
                    LiteralValue::Float(v) => Op::F64Const(*v),
                    LiteralValue::Bool(v) => Op::BoolConst(*v),
                    LiteralValue::Str(v) => Op::StringConst(self.strings.intern(v)),
                };
                self.ops.push(op);
            }
            IrExpr::Local { local } => {
                let slot = self.slot_of(local);
                self.ops.push(Op::LocalGet(slot));
            }
            IrExpr::Unary { op, operand, ty } => {
                self.emit_expr(operand);
                let op = match (op, ty.kind) {
                    (UnaryOp::Neg, TypeKind::Int64) => Op::I64Neg,
                    (UnaryOp::Neg, TypeKind::Float64) => Op::F64Neg,
                    (UnaryOp::Not, TypeKind::Bool) => Op::BoolNot,
                    (op, kind) => panic!("unchecked unary {op:?} over {kind}"),
                };
                self.ops.push(op);
            }
            IrExpr::Binary {
                op, left, right, ..
            } => {
                self.emit_expr(left);
                self.emit_expr(right);
                let op = binary_op(*op, left.ty().kind);
                self.ops.push(op);
            }
            IrExpr::Logical {
                op, left, right, ..
            } => self.emit_logical(*op, left, right),
            IrExpr::Call { symbol, args } => {
                for arg in args {
                    self.emit_expr(arg);
                }
                let op = match symbol.host {
                    Some(host) => Op::HostCall(host),
                    None => Op::Call(symbol.serial, args.len()),
                };
                self.ops.push(op);
            }
            IrExpr::Convert { value, .. } => {
                self.emit_expr(value);
                self.ops.push(Op::F64ConvertI64S);
            }
            IrExpr::Error { .. } => panic!("code generation over an unchecked tree"),
        }
    }

    /// Literal and variable operands are side-effect free, so the
    /// non-branching bool op is enough; anything else gets the true
    /// short-circuit branch sequence.
    fn emit_logical(&mut self, op: LogicalOp, left: &IrExpr, right: &IrExpr) {
        let simple = matches!(right, IrExpr::Literal { .. } | IrExpr::Local { .. });
        if simple {
            self.emit_expr(left);
            self.emit_expr(right);
            self.ops.push(match op {
                LogicalOp::And => Op::BoolAnd,
                LogicalOp::Or => Op::BoolOr,
            });
            return;
        }
        // left; Dup; branch over the right side when it decides the
        // result; Drop; right
        self.emit_expr(left);
        self.ops.push(Op::Dup);
        let short = self.ops.len();
        self.ops.push(match op {
            LogicalOp::And => Op::BrIfFalse(0),
            LogicalOp::Or => Op::BrIf(0),
        });
        self.ops.push(Op::Drop);
        self.emit_expr(right);
        let end = self.ops.len();
        self.patch(short, end);
    }
}

fn binary_op(op: BinaryOp, operand: TypeKind) -> Op {
    match (operand, op) {
        (TypeKind::Int64, BinaryOp::Add) => Op::I64Add,
        (TypeKind::Int64, BinaryOp::Sub) => Op::I64Sub,
        (TypeKind::Int64, BinaryOp::Mul) => Op::I64Mul,
        (TypeKind::Int64, BinaryOp::Div) => Op::I64DivS,
        (TypeKind::Int64, BinaryOp::Eq) => Op::I64Eq,
        (TypeKind::Int64, BinaryOp::Ne) => Op::I64Ne,
        (TypeKind::Int64, BinaryOp::Lt) => Op::I64LtS,
        (TypeKind::Int64, BinaryOp::Le) => Op::I64LeS,
        (TypeKind::Int64, BinaryOp::Gt) => Op::I64GtS,
        (TypeKind::Int64, BinaryOp::Ge) => Op::I64GeS,
        (TypeKind::Float64, BinaryOp::Add) => Op::F64Add,
        (TypeKind::Float64, BinaryOp::Sub) => Op::F64Sub,
        (TypeKind::Float64, BinaryOp::Mul) => Op::F64Mul,
        (TypeKind::Float64, BinaryOp::Div) => Op::F64Div,
        (TypeKind::Float64, BinaryOp::Eq) => Op::F64Eq,
        (TypeKind::Float64, BinaryOp::Ne) => Op::F64Ne,
        (TypeKind::Float64, BinaryOp::Lt) => Op::F64Lt,
        (TypeKind::Float64, BinaryOp::Le) => Op::F64Le,
        (TypeKind::Float64, BinaryOp::Gt) => Op::F64Gt,
        (TypeKind::Float64, BinaryOp::Ge) => Op::F64Ge,
        (TypeKind::Bool, BinaryOp::Eq) => Op::BoolEq,
        (TypeKind::Bool, BinaryOp::Ne) => Op::BoolNe,
        (TypeKind::String, BinaryOp::Add) => Op::StringConcat,
        (TypeKind::String, BinaryOp::Eq) => Op::StringEq,
        (TypeKind::String, BinaryOp::Ne) => Op::StringNe,
        (operand, op) => panic!("unchecked binary '{op}' over {operand}"),
    }
}

fn count_returns(statements: &[IrStatement]) -> usize {
    statements
        .iter()
        .map(|stmt| match stmt {
            IrStatement::Return { .. } => 1,
            IrStatement::If {
                then_block,
                else_block,
                ..
            } => {
                count_returns(then_block)
                    + else_block.as_deref().map_or(0, count_returns)
            }
            IrStatement::While { body, .. } => count_returns(body),
            IrStatement::Block { statements } => count_returns(statements),
            _ => 0,
        })
        .sum()
}
