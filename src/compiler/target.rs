//! Abstract stack-machine target emitted by the code generator.
//!
//! All arithmetic/comparison operations are typed (e.g., I64Add,
//! F64Lt); the operand stack carries untyped slots and type
//! information lives in the opcodes. Naming follows WASM: `I64`/`F64`
//! prefixes, `S` suffix for signed variants. Branch targets are
//! absolute instruction indices within one function body.

use crate::compiler::symbols::{FunctionSymbol, HostFn};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // Constants
    I64Const(i64),
    F64Const(f64),
    BoolConst(bool),
    StringConst(usize), // string pool index

    // Local variables
    LocalGet(usize),
    LocalSet(usize),

    // Stack manipulation
    Drop,
    Dup,

    // i64 arithmetic
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64Neg,

    // f64 arithmetic
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Neg,

    // i64 comparison → bool
    I64Eq,
    I64Ne,
    I64LtS,
    I64LeS,
    I64GtS,
    I64GeS,

    // f64 comparison → bool
    F64Eq,
    F64Ne,
    F64Lt,
    F64Le,
    F64Gt,
    F64Ge,

    // bool operations; And/Or are the non-branching forms used when
    // both operands are cheap to evaluate
    BoolNot,
    BoolAnd,
    BoolOr,
    BoolEq,
    BoolNe,

    // string operations
    StringConcat,
    StringEq,
    StringNe,

    // Type conversion
    F64ConvertI64S,

    // Control flow
    Jmp(usize),
    BrIf(usize),
    BrIfFalse(usize),
    /// Direct call by the callee's serial id; argc trails for the
    /// frame setup.
    Call(u32, usize),
    /// Call into a host primitive.
    HostCall(HostFn),
    Ret,
}

/// One generated function body, keyed by its canonical symbol.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub symbol: Rc<FunctionSymbol>,
    /// Number of local slots, parameters included.
    pub locals: usize,
    pub code: Vec<Op>,
}

/// The assembled program: every generated body, the shared string
/// pool, and the resolved entry point.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub functions: Vec<CompiledFunction>,
    pub strings: Vec<String>,
    pub entry: Rc<FunctionSymbol>,
}

impl CompiledProgram {
    pub fn function(&self, serial: u32) -> Option<&CompiledFunction> {
        self.functions.iter().find(|f| f.symbol.serial == serial)
    }

    pub fn entry_function(&self) -> &CompiledFunction {
        self.function(self.entry.serial)
            .expect("entry symbol has a generated body")
    }
}
