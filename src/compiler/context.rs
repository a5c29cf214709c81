//! Per-compilation shared state.
//!
//! Serial counters are owned here rather than being process-wide
//! statics, so independent compilations stay isolated.

use crate::compiler::interner::Interner;
use crate::compiler::types::TypeRegistry;

/// State threaded through the whole pipeline: the identifier interner
/// (shared with the front end), the type registry, and the serial
/// counters for function and variable symbols.
#[derive(Debug)]
pub struct CompilationContext {
    pub interner: Interner,
    pub types: TypeRegistry,
    next_function_serial: u32,
    next_variable_serial: u32,
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationContext {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let types = TypeRegistry::new(&mut interner);
        Self {
            interner,
            types,
            next_function_serial: 0,
            next_variable_serial: 0,
        }
    }

    /// Mint a unique serial for a function overload.
    pub fn next_function_serial(&mut self) -> u32 {
        let serial = self.next_function_serial;
        self.next_function_serial += 1;
        serial
    }

    /// Mint a unique serial for a variable symbol.
    pub fn next_variable_serial(&mut self) -> u32 {
        let serial = self.next_variable_serial;
        self.next_variable_serial += 1;
        serial
    }
}
