//! Kiln Compiler
//!
//! The compiler core: turns typed class declarations into stack-machine
//! instruction sequences for a JVM-style class-file writer.
//!
//! ## Architecture
//!
//! - **Pass 1 (Registration)**: declare every class with its member
//!   signatures so bodies can refer to any class of the unit
//! - **Pass 2 (Compilation)**: type check bodies and generate instructions
//!
//! ## Modules
//!
//! - [`ast`]: Typed expression, statement and declaration trees
//! - [`bytecode`]: Instruction model and the [`Code`](bytecode::Code) accumulator
//! - [`env`]: Locals, labels and operand-stack tracking for one method body
//! - [`expr`]: Expression compiler
//! - [`function_compiler`]: Per-method driver
//! - [`options`]: Code generation switches
//! - [`overload`]: Overload resolution and the dynamic dispatch decision
//! - [`passes`]: Registration and compilation passes
//! - [`return_checker`]: Return-path analysis
//! - [`stmt`]: Statement compiler and tail-call rewriting
//! - [`type_system`]: Class table, conformance, intersection and conversion

pub mod ast;
pub mod bytecode;
pub mod env;
pub mod expr;
pub mod function_compiler;
pub mod options;
pub mod overload;
pub mod passes;
pub mod return_checker;
pub mod stmt;
pub mod type_system;

pub use env::{Frame, Local, OperandEnvironment};
pub use expr::ExprCompiler;
pub use function_compiler::{CompiledMethod, FunctionCompiler};
pub use options::CompilerOptions;
pub use overload::{Match, MatchResult, OverloadResolver};
pub use passes::{
    CompilationOutput, CompilationPass, CompiledClass, RegistrationOutput, RegistrationPass,
};
pub use return_checker::ReturnChecker;
pub use stmt::StmtCompiler;
pub use type_system::{ClassLoader, Method, PlatformLoader, TypeSystem};

// Re-export CompilationError from core for convenience
pub use kiln_core::CompilationError;
