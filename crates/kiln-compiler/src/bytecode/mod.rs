//! Instruction model and the code-generation monoid.
//!
//! - [`Instruction`]: symbolic stack-machine instructions with [`Label`]
//!   targets
//! - [`Opcode`]: the platform numbering of each instruction
//! - [`Code`]: instructions, exception-table entries and diagnostics,
//!   folded together with [`Code::concat`]

mod code;
mod instruction;
mod opcode;

pub use code::{Code, ExceptionEntry};
pub use instruction::{
    ArithOp, Condition, Instruction, InvokeKind, Label, MemberRef, ValueKind,
};
pub use opcode::Opcode;
