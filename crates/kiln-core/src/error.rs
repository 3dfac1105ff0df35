//! Error taxonomy of the compiler.
//!
//! ```text
//! CompilationError
//! ├── TypeMismatch      - assignment, return, argument, operator operands
//! ├── UnresolvedCall    - no matching overload
//! ├── AmbiguousCall     - several incomparable matches
//! ├── UnresolvedName    - unknown type, variable, field or constant
//! ├── Structural        - missing constructor, uninitialised final field,
//! │                       duplicate signature, circular inheritance
//! ├── GenericMismatch   - argument conforms only after erasure
//! └── Internal          - invariant violation, never user-facing
//! ```
//!
//! User-facing errors are collected as diagnostics rather than propagated:
//! the compiler keeps going with a placeholder so one pass reports every
//! independent error. Only [`CompilationError::Internal`] travels through
//! `Result`.

use crate::Span;
use std::fmt;
use thiserror::Error;

/// What an unresolved call was trying to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Method,
    Constructor,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallKind::Method => "method",
            CallKind::Constructor => "constructor",
        })
    }
}

/// What an unresolved name was expected to denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Type,
    Variable,
    Field,
    EnumConstant,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NameKind::Type => "type",
            NameKind::Variable => "variable",
            NameKind::Field => "field",
            NameKind::EnumConstant => "enumeration constant",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
    #[error("{message}")]
    TypeMismatch { message: String, span: Span },

    #[error("{kind} `{name}({args})` not found")]
    UnresolvedCall {
        kind: CallKind,
        name: String,
        args: String,
        span: Span,
    },

    #[error("ambiguous call to method `{owner}.{name}`")]
    AmbiguousCall { owner: String, name: String, span: Span },

    #[error("unknown {kind} `{name}`")]
    UnresolvedName { kind: NameKind, name: String, span: Span },

    #[error("{message}")]
    Structural { message: String, span: Span },

    #[error("mismatched types: expected `{expected}` but found `{found}`")]
    GenericMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilationError {
    pub fn type_mismatch(span: Span, message: impl Into<String>) -> Self {
        CompilationError::TypeMismatch { message: message.into(), span }
    }

    pub fn structural(span: Span, message: impl Into<String>) -> Self {
        CompilationError::Structural { message: message.into(), span }
    }

    pub fn unresolved_name(span: Span, kind: NameKind, name: impl Into<String>) -> Self {
        CompilationError::UnresolvedName { kind, name: name.into(), span }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompilationError::Internal { message: message.into() }
    }

    /// Where the error occurred; internal errors have no location.
    pub fn span(&self) -> Span {
        match self {
            CompilationError::TypeMismatch { span, .. }
            | CompilationError::UnresolvedCall { span, .. }
            | CompilationError::AmbiguousCall { span, .. }
            | CompilationError::UnresolvedName { span, .. }
            | CompilationError::Structural { span, .. }
            | CompilationError::GenericMismatch { span, .. } => *span,
            CompilationError::Internal { .. } => Span::default(),
        }
    }

    /// The stable one-line form: `line L:C <message>.`
    pub fn render(&self) -> String {
        let span = self.span();
        format!("line {}:{} {}.", span.line, span.col, self)
    }
}

/// Every diagnostic gathered for a compilation unit.
///
/// Displays one rendered line per diagnostic, each newline-terminated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    errors: Vec<CompilationError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: CompilationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = CompilationError>) {
        self.errors.extend(errors);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompilationError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<CompilationError> {
        self.errors
    }
}

impl From<Vec<CompilationError>> for Diagnostics {
    fn from(errors: Vec<CompilationError>) -> Self {
        Self { errors }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a CompilationError;
    type IntoIter = std::slice::Iter<'a, CompilationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error.render())?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unresolved_call_message() {
        let err = CompilationError::UnresolvedCall {
            kind: CallKind::Method,
            name: "method".to_string(),
            args: "int".to_string(),
            span: Span::new(4, 9, 6),
        };
        assert_eq!(err.render(), "line 4:9 method `method(int)` not found.");
    }

    #[test]
    fn ambiguous_call_message() {
        let err = CompilationError::AmbiguousCall {
            owner: "demo.A".to_string(),
            name: "f".to_string(),
            span: Span::point(2, 3),
        };
        assert_eq!(err.to_string(), "ambiguous call to method `demo.A.f`");
    }

    #[test]
    fn internal_errors_have_no_location() {
        let err = CompilationError::internal("boom");
        assert_eq!(err.span(), Span::default());
    }

    #[test]
    fn diagnostics_render_one_line_each() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(CompilationError::unresolved_name(
            Span::point(1, 2),
            NameKind::Variable,
            "x",
        ));
        diagnostics.push(CompilationError::structural(
            Span::point(3, 1),
            "missing return statement",
        ));
        assert_eq!(
            diagnostics.to_string(),
            "line 1:2 unknown variable `x`.\nline 3:1 missing return statement.\n"
        );
    }
}
