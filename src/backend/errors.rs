//! Define error types for code generation.
//!
//! ## Notes
//!
//! - Prefer actionable messages: users should learn which construct is unsupported on which target,
//!   so they can restructure the source or pick the other backend.

use crate::frontend::ast::Span;
use crate::frontend::diagnostics::{Diagnostic, errors};

use super::Target;

/// Error during code generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("{construct} is not supported by the {target} backend")]
    Unsupported { target: Target, construct: String, span: Span },
}

impl EmitError {
    pub fn unsupported(target: Target, construct: impl Into<String>, span: Span) -> Self {
        EmitError::Unsupported {
            target,
            construct: construct.into(),
            span,
        }
    }

    /// The user-facing diagnostic for this failure.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EmitError::Unsupported { target, construct, span } => {
                errors::unsupported(construct, &target.to_string(), *span)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::diagnostics::DiagnosticKind;

    #[test]
    fn test_unsupported_maps_to_diagnostic() {
        let err = EmitError::unsupported(Target::Jvm, "`await`", Span::new(3, 8));
        assert_eq!(err.to_string(), "`await` is not supported by the JVM backend");
        let diagnostic = err.to_diagnostic();
        assert_eq!(diagnostic.kind, DiagnosticKind::UnsupportedConstruct);
        assert_eq!(diagnostic.span, Span::new(3, 8));
        assert!(diagnostic.is_error());
    }
}
