//! Source coordinates attached to AST nodes and diagnostics.
//!
//! The AST is produced by an external parser; every node carries the
//! [`Span`] it was built from so diagnostics can be rendered as
//! `line L:C <message>.`.

use std::fmt;

/// A source position: where a construct starts and how long it is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
    /// Length in bytes, zero when unknown.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// A zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Span covering `self` through the end of `other`.
    ///
    /// Spans on different lines keep the start of `self`; the length is
    /// only meaningful within a single line.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        if self.line != other.line {
            return Span::point(self.line, self.col);
        }
        let start = self.col.min(other.col);
        let end = (self.col + self.len).max(other.col + other.len);
        Span::new(self.line, start, end - start)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
