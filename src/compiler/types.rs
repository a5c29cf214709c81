//! Type symbols and the type registry.
//!
//! Primitive types are interned once per compilation as canonical,
//! identity-comparable symbols: two `TypeRef`s denote the same type
//! exactly when their serial ids are equal.

use crate::compiler::interner::{Interner, NameId};
use std::fmt;
use std::rc::Rc;

/// The kind of a type symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// The unit type of value-less functions.
    None,
    Int64,
    Float64,
    Bool,
    String,
    /// Placeholder substituted when a type cannot be determined.
    Error,
    /// A type declared in source (reserved; the language currently has
    /// no user-defined composite types).
    Defined,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::None => "none",
            TypeKind::Int64 => "int64",
            TypeKind::Float64 => "float64",
            TypeKind::Bool => "bool",
            TypeKind::String => "string",
            TypeKind::Error => "<error>",
            TypeKind::Defined => "<defined>",
        };
        write!(f, "{}", name)
    }
}

/// A canonical type. Created once by the registry, never mutated.
#[derive(Debug)]
pub struct TypeSymbol {
    pub serial: u32,
    pub name: NameId,
    pub kind: TypeKind,
}

/// Shared handle to a canonical type symbol.
pub type TypeRef = Rc<TypeSymbol>;

impl PartialEq for TypeSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl Eq for TypeSymbol {}

impl fmt::Display for TypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl TypeSymbol {
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TypeKind::Int64 | TypeKind::Float64)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Int64 | TypeKind::Float64 | TypeKind::Bool | TypeKind::String
        )
    }

    pub fn is_none(&self) -> bool {
        self.kind == TypeKind::None
    }

    pub fn is_error(&self) -> bool {
        self.kind == TypeKind::Error
    }
}

/// Interns the primitive types and mints serial ids for declared ones.
#[derive(Debug)]
pub struct TypeRegistry {
    none: TypeRef,
    int64: TypeRef,
    float64: TypeRef,
    bool_: TypeRef,
    string: TypeRef,
    error: TypeRef,
    next_serial: u32,
}

impl TypeRegistry {
    pub fn new(interner: &mut Interner) -> Self {
        let mut next_serial = 0;
        let mut primitive = |name: &str, kind: TypeKind| {
            let serial = next_serial;
            next_serial += 1;
            Rc::new(TypeSymbol {
                serial,
                name: interner.intern(name),
                kind,
            })
        };
        let none = primitive("none", TypeKind::None);
        let int64 = primitive("int64", TypeKind::Int64);
        let float64 = primitive("float64", TypeKind::Float64);
        let bool_ = primitive("bool", TypeKind::Bool);
        let string = primitive("string", TypeKind::String);
        let error = primitive("?", TypeKind::Error);
        Self {
            none,
            int64,
            float64,
            bool_,
            string,
            error,
            next_serial,
        }
    }

    pub fn none(&self) -> TypeRef {
        Rc::clone(&self.none)
    }

    pub fn int64(&self) -> TypeRef {
        Rc::clone(&self.int64)
    }

    pub fn float64(&self) -> TypeRef {
        Rc::clone(&self.float64)
    }

    pub fn bool(&self) -> TypeRef {
        Rc::clone(&self.bool_)
    }

    pub fn string(&self) -> TypeRef {
        Rc::clone(&self.string)
    }

    pub fn error(&self) -> TypeRef {
        Rc::clone(&self.error)
    }

    /// Mint a locally-declared type symbol.
    pub fn declare(&mut self, name: NameId) -> TypeRef {
        let serial = self.next_serial;
        self.next_serial += 1;
        Rc::new(TypeSymbol {
            serial,
            name,
            kind: TypeKind::Defined,
        })
    }

    /// All primitive types that may appear in a source annotation,
    /// in registration order.
    pub fn annotatable(&self) -> [TypeRef; 5] {
        [
            self.none(),
            self.int64(),
            self.float64(),
            self.bool(),
            self.string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_identity() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new(&mut interner);
        assert_eq!(registry.int64(), registry.int64());
        assert_ne!(registry.int64(), registry.float64());
        assert_ne!(registry.none(), registry.error());
    }

    #[test]
    fn test_predicates() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new(&mut interner);
        assert!(registry.int64().is_numeric());
        assert!(registry.float64().is_numeric());
        assert!(!registry.bool().is_numeric());
        assert!(registry.string().is_primitive());
        assert!(!registry.none().is_primitive());
        assert!(registry.none().is_none());
        assert!(registry.error().is_error());
    }

    #[test]
    fn test_declared_types_are_distinct() {
        let mut interner = Interner::new();
        let mut registry = TypeRegistry::new(&mut interner);
        let name = interner.intern("point");
        let a = registry.declare(name);
        let b = registry.declare(name);
        assert_ne!(a, b);
        assert_eq!(a.kind, TypeKind::Defined);
    }

    #[test]
    fn test_display() {
        let mut interner = Interner::new();
        let registry = TypeRegistry::new(&mut interner);
        assert_eq!(registry.int64().to_string(), "int64");
        assert_eq!(registry.string().to_string(), "string");
    }
}
