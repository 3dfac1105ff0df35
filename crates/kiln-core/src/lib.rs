//! Shared vocabulary of the kiln compiler.
//!
//! This crate holds the value types every compiler phase agrees on:
//!
//! - [`Type`] and [`PrimitiveKind`]: the compile-time type model
//! - [`Signature`], [`Function`], [`Field`]: declared members
//! - [`ClassInfo`]: the reflection view returned by class loading
//! - [`CompilationError`] and [`Diagnostics`]: the error taxonomy
//! - [`Span`] and [`TypeHash`]: source coordinates and stable identities

mod class_info;
mod error;
mod signature;
mod span;
mod type_hash;
pub mod types;

pub use class_info::ClassInfo;
pub use error::{CallKind, CompilationError, Diagnostics, NameKind};
pub use signature::{Field, Function, Signature, join_types};
pub use span::Span;
pub use type_hash::TypeHash;
pub use types::{ClassFlags, EnumCapabilities, MemberFlags, PrimitiveKind, Type, names};
