//! Nested lexical scopes and symbol registration.
//!
//! The binder builds the scope tree during its walk; the checker then
//! replays the identical walk. Each scope remembers its children in
//! creation order together with a replay cursor: `begin_scope` re-enters
//! the next recorded child when one exists and only creates a new scope
//! otherwise, so two passes that enter and exit scopes in the same order
//! traverse the same tree. `reset` rewinds to the root and zeroes every
//! cursor.

use crate::compiler::context::CompilationContext;
use crate::compiler::interner::NameId;
use crate::compiler::symbols::{
    ConstantSymbol, FunctionSymbol, ParameterSymbol, Symbol, VariableSymbol,
};
use crate::compiler::syntax::LiteralValue;
use crate::compiler::types::TypeRef;
use std::collections::HashMap;
use std::rc::Rc;

/// What syntactic construct a scope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Top,
    Function,
    Block,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct ScopeData {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    function: Option<Rc<FunctionSymbol>>,
    variables: HashMap<NameId, Symbol>,
    functions: HashMap<NameId, Vec<Rc<FunctionSymbol>>>,
    types: HashMap<NameId, TypeRef>,
    children: Vec<ScopeId>,
    cursor: usize,
}

impl ScopeData {
    fn new(parent: Option<ScopeId>, kind: ScopeKind, function: Option<Rc<FunctionSymbol>>) -> Self {
        Self {
            parent,
            kind,
            function,
            variables: HashMap::new(),
            functions: HashMap::new(),
            types: HashMap::new(),
            children: Vec::new(),
            cursor: 0,
        }
    }
}

/// The scope tree / symbol table.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<ScopeData>,
    current: ScopeId,
}

impl ScopeTree {
    /// Create a tree whose root scope knows the primitive type names.
    pub fn new(ctx: &CompilationContext) -> Self {
        let mut root = ScopeData::new(None, ScopeKind::Top, None);
        for ty in ctx.types.annotatable() {
            root.types.insert(ty.name, ty);
        }
        Self {
            scopes: vec![root],
            current: ScopeId(0),
        }
    }

    fn data(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.0]
    }

    fn data_mut(&mut self, id: ScopeId) -> &mut ScopeData {
        &mut self.scopes[id.0]
    }

    /// Enter a child scope: the next recorded child when replaying, a
    /// freshly created one otherwise.
    pub fn begin_scope(&mut self, kind: ScopeKind) -> ScopeId {
        self.begin(kind, None)
    }

    /// Enter the body scope of a function.
    pub fn begin_function_scope(&mut self, function: Rc<FunctionSymbol>) -> ScopeId {
        self.begin(ScopeKind::Function, Some(function))
    }

    fn begin(&mut self, kind: ScopeKind, function: Option<Rc<FunctionSymbol>>) -> ScopeId {
        let current = self.current;
        let cursor = self.data(current).cursor;
        if let Some(&child) = self.data(current).children.get(cursor) {
            debug_assert_eq!(self.data(child).kind, kind, "scope replay out of order");
            self.data_mut(current).cursor += 1;
            self.current = child;
            return child;
        }
        let id = ScopeId(self.scopes.len());
        self.scopes.push(ScopeData::new(Some(current), kind, function));
        self.data_mut(current).children.push(id);
        self.data_mut(current).cursor += 1;
        self.current = id;
        id
    }

    /// Return to the parent scope.
    pub fn exit_scope(&mut self) {
        let parent = self
            .data(self.current)
            .parent
            .expect("exit_scope called on the root scope");
        self.current = parent;
    }

    /// Return to the root and rewind every replay cursor, ready for an
    /// independent walk over the same tree. Value bindings are cleared
    /// so the next pass re-registers them at its own declaration
    /// points; an initializer must see the outer binding, not the one
    /// being declared. Function overloads and type names survive.
    pub fn reset(&mut self) {
        self.current = ScopeId(0);
        for scope in &mut self.scopes {
            scope.cursor = 0;
            scope.variables.clear();
        }
    }

    /// Register a variable in the current scope. Rebinding a name in
    /// the same scope is legal and shadows from this point forward.
    pub fn register_variable(
        &mut self,
        ctx: &mut CompilationContext,
        name: NameId,
        ty: TypeRef,
    ) -> Rc<VariableSymbol> {
        let symbol = Rc::new(VariableSymbol {
            name,
            ty,
            serial: ctx.next_variable_serial(),
        });
        self.data_mut(self.current)
            .variables
            .insert(name, Symbol::Variable(Rc::clone(&symbol)));
        symbol
    }

    /// Register a parameter symbol in the current scope.
    pub fn register_parameter(&mut self, param: Rc<ParameterSymbol>) {
        self.data_mut(self.current)
            .variables
            .insert(param.name, Symbol::Parameter(param));
    }

    /// Register a literal constant in the current scope.
    pub fn register_constant(
        &mut self,
        name: NameId,
        ty: TypeRef,
        value: LiteralValue,
    ) -> Rc<ConstantSymbol> {
        let symbol = Rc::new(ConstantSymbol { name, ty, value });
        self.data_mut(self.current)
            .variables
            .insert(name, Symbol::Constant(Rc::clone(&symbol)));
        symbol
    }

    /// Register a function overload in the current scope. Returns
    /// `None` when an overload with an identical parameter-type
    /// sequence already exists here; the caller raises the diagnostic.
    pub fn register_function(&mut self, symbol: Rc<FunctionSymbol>) -> Option<Rc<FunctionSymbol>> {
        let arg_types: Vec<TypeRef> = symbol.param_types().cloned().collect();
        let overloads = self
            .data_mut(self.current)
            .functions
            .entry(symbol.name)
            .or_default();
        if overloads.iter().any(|f| f.matches_signature(&arg_types)) {
            return None;
        }
        overloads.push(Rc::clone(&symbol));
        Some(symbol)
    }

    /// Register a locally-declared type name.
    pub fn register_type(&mut self, ty: TypeRef) {
        self.data_mut(self.current).types.insert(ty.name, ty);
    }

    /// Resolve a name to its nearest enclosing binding.
    pub fn get_symbol(&self, name: NameId) -> Option<Symbol> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(symbol) = self.data(id).variables.get(&name) {
                return Some(symbol.clone());
            }
            scope = self.data(id).parent;
        }
        None
    }

    /// All overloads of `name` visible from the current scope,
    /// innermost level first. Overloads concatenate across levels
    /// rather than shadowing by name alone.
    pub fn function_overloads(&self, name: NameId) -> Vec<Rc<FunctionSymbol>> {
        let mut result = Vec::new();
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(overloads) = self.data(id).functions.get(&name) {
                result.extend(overloads.iter().cloned());
            }
            scope = self.data(id).parent;
        }
        result
    }

    /// Overload resolution: exact element-wise match between the
    /// argument types and a candidate's parameter types, no coercion.
    pub fn get_function(&self, name: NameId, arg_types: &[TypeRef]) -> Option<Rc<FunctionSymbol>> {
        self.function_overloads(name)
            .into_iter()
            .find(|f| f.matches_signature(arg_types))
    }

    /// Resolve a type annotation name through the scope chain.
    pub fn resolve_type(&self, name: NameId) -> Option<TypeRef> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(ty) = self.data(id).types.get(&name) {
                return Some(Rc::clone(ty));
            }
            scope = self.data(id).parent;
        }
        None
    }

    /// The function whose body encloses the current scope.
    pub fn containing_function(&self) -> Option<Rc<FunctionSymbol>> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(function) = &self.data(id).function {
                return Some(Rc::clone(function));
            }
            scope = self.data(id).parent;
        }
        None
    }
}
