//! Typed syntax trees consumed by the compiler.
//!
//! Trees arrive already parsed with literal types and variable names bound;
//! each node carries the [`Span`](kiln_core::Span) diagnostics point at.
//! Node kinds are closed enums so every compiler phase matches them
//! exhaustively.

mod decl;
mod expr;
mod stmt;

pub use decl::{ClassDecl, ConstructorDecl, FieldDecl, MethodDecl, Parameter};
pub use expr::{
    BinaryOp, CallTarget, CompareOp, EnumKey, ExprKind, Expression, FieldTarget, Literal,
    LogicalOp, UnaryOp,
};
pub use stmt::{Statement, StmtKind};
