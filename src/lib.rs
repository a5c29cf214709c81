//! Kiln - a small statically-typed language compiled to stack bytecode.
//!
//! This library provides the semantic pipeline: binding, type checking,
//! constant folding and code generation. The lexer/parser front end and
//! the executable packaging step are external collaborators; the crate
//! consumes a syntax tree plus an identifier interner and produces a
//! compiled program of abstract target operations.

pub mod compiler;
pub mod config;

// Re-export commonly used types
pub use compiler::context::CompilationContext;
pub use compiler::target::{CompiledProgram, Op};
pub use compiler::{CompileError, check_program, compile};
pub use config::CompilerConfig;
