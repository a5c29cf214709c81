//! Symbols produced by binding and consumed by checking and codegen.
//!
//! Symbols are shared via `Rc` and never mutated after creation; the
//! mutable bookkeeping that logically belongs to them (local slots,
//! overload serials) lives in the owning stage instead.

use crate::compiler::interner::NameId;
use crate::compiler::syntax::LiteralValue;
use crate::compiler::types::TypeRef;
use std::rc::Rc;

/// A local variable. Slot assignment lives in the code generator's
/// side table keyed by `serial`.
#[derive(Debug)]
pub struct VariableSymbol {
    pub name: NameId,
    pub ty: TypeRef,
    pub serial: u32,
}

/// A function parameter; `index` is its 0-based ordinal.
#[derive(Debug)]
pub struct ParameterSymbol {
    pub name: NameId,
    pub ty: TypeRef,
    pub index: usize,
}

/// A named literal constant; the value is fixed at declaration and
/// substituted at every reference, never re-evaluated.
#[derive(Debug)]
pub struct ConstantSymbol {
    pub name: NameId,
    pub ty: TypeRef,
    pub value: LiteralValue,
}

/// Host console-output primitives backing the builtin `println`
/// overload set. These symbols have no generated body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFn {
    PrintlnInt64,
    PrintlnFloat64,
    PrintlnBool,
    PrintlnString,
}

/// A function overload. Identity (and call-target resolution after
/// binding) is by `serial`; structural parameter matching happens only
/// during overload resolution.
#[derive(Debug)]
pub struct FunctionSymbol {
    pub name: NameId,
    /// Dotted name after flattening (`outer.inner`); equals `name` for
    /// top-level functions. Entry-point search keys on this.
    pub qualified_name: NameId,
    pub serial: u32,
    pub return_type: TypeRef,
    pub params: Vec<Rc<ParameterSymbol>>,
    pub host: Option<HostFn>,
}

impl PartialEq for FunctionSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for FunctionSymbol {}

impl FunctionSymbol {
    pub fn param_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.params.iter().map(|p| &p.ty)
    }

    /// Exact element-wise parameter-type match against `arg_types`.
    pub fn matches_signature(&self, arg_types: &[TypeRef]) -> bool {
        self.params.len() == arg_types.len()
            && self.param_types().zip(arg_types).all(|(p, a)| p == a)
    }
}

/// A name binding held in a scope's variable map.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(Rc<VariableSymbol>),
    Parameter(Rc<ParameterSymbol>),
    Constant(Rc<ConstantSymbol>),
}

impl Symbol {
    pub fn ty(&self) -> &TypeRef {
        match self {
            Symbol::Variable(v) => &v.ty,
            Symbol::Parameter(p) => &p.ty,
            Symbol::Constant(c) => &c.ty,
        }
    }

    pub fn name(&self) -> NameId {
        match self {
            Symbol::Variable(v) => v.name,
            Symbol::Parameter(p) => p.name,
            Symbol::Constant(c) => c.name,
        }
    }
}
