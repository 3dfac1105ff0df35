//! Compilation passes.
//!
//! A unit compiles in two passes over its class declarations:
//!
//! 1. [`RegistrationPass`] declares every class, with its members and
//!    generated enumeration members, in the [`TypeSystem`](crate::type_system::TypeSystem).
//! 2. [`CompilationPass`] compiles every body against the complete table.

pub(crate) mod enums;
mod compilation;
mod registration;

pub use compilation::{CompilationOutput, CompilationPass, CompiledClass};
pub use registration::{RegistrationOutput, RegistrationPass};
