//! Diagnostics accumulated across the analysis passes.
//!
//! Binding and checking record errors and keep walking (best-effort,
//! multi-error reporting); the list is append-only.

use crate::compiler::syntax::Span;
use std::fmt;

/// What class of rule a diagnostic violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Produced by the front end; not raised by this crate.
    Syntax,
    /// Binder/checker: mismatches, unresolved calls, invalid operators.
    Type,
    /// Placement errors: break/continue outside a loop.
    Flow,
}

/// A single reported error with its source position.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Type,
            message: message.into(),
            span,
        }
    }

    pub fn flow_error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Flow,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Type => "type",
            DiagnosticKind::Flow => "flow",
        };
        write!(
            f,
            "error[{}]: {} at {}:{}",
            kind, self.message, self.span.line, self.span.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::type_error("expected `int64`, found `bool`", Span::new(3, 7));
        assert_eq!(
            d.to_string(),
            "error[type]: expected `int64`, found `bool` at 3:7"
        );
    }
}
