//! The code-generation monoid.
//!
//! Every compile operation returns a [`Code`]: an ordered instruction list,
//! the exception-table entries covering its try-regions and the
//! diagnostics raised while producing it. [`Code::concat`] is associative
//! and [`Code::new`] is its identity, so callers fold child results
//! together in evaluation order.

use super::{Condition, Instruction, Label, Opcode};
use kiln_core::CompilationError;
use std::ops::{Add, AddAssign};

/// A protected region and its handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExceptionEntry {
    pub start: Label,
    pub end: Label,
    pub handler: Label,
    /// Internal name of the caught class.
    pub catch_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code {
    instructions: Vec<Instruction>,
    exception_table: Vec<ExceptionEntry>,
    diagnostics: Vec<CompilationError>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result holding only a diagnostic.
    pub fn error(error: CompilationError) -> Self {
        let mut code = Self::new();
        code.diagnostics.push(error);
        code
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    /// Pushes an instruction if there is one; used with width-dependent
    /// helpers such as [`Instruction::pop`].
    pub fn push_opt(&mut self, instruction: Option<Instruction>) -> &mut Self {
        if let Some(instruction) = instruction {
            self.instructions.push(instruction);
        }
        self
    }

    /// Fixes the position of `label` at the current end of the sequence.
    pub fn label(&mut self, label: Label) -> &mut Self {
        self.push(Instruction::Label(label))
    }

    pub fn exception_entry(&mut self, entry: ExceptionEntry) -> &mut Self {
        self.exception_table.push(entry);
        self
    }

    pub fn diagnostic(&mut self, error: CompilationError) -> &mut Self {
        self.diagnostics.push(error);
        self
    }

    /// Appends `other` after `self`.
    pub fn append(&mut self, other: Code) -> &mut Self {
        self.instructions.extend(other.instructions);
        self.exception_table.extend(other.exception_table);
        self.diagnostics.extend(other.diagnostics);
        self
    }

    pub fn concat(mut self, other: Code) -> Code {
        self.append(other);
        self
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn exception_table(&self) -> &[ExceptionEntry] {
        &self.exception_table
    }

    pub fn diagnostics(&self) -> &[CompilationError] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<CompilationError> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Opcodes in order, skipping label markers.
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.instructions.iter().filter_map(Instruction::opcode).collect()
    }

    pub fn count(&self, opcode: Opcode) -> usize {
        self.instructions.iter().filter(|i| i.opcode() == Some(opcode)).count()
    }

    /// Whether the last real instruction never falls through.
    pub fn ends_abruptly(&self) -> bool {
        self.instructions
            .iter()
            .rev()
            .find_map(Instruction::opcode)
            .is_some_and(Opcode::ends_block)
    }

    /// Whether control can reach the end of the sequence: it is empty,
    /// ends in a label some jump may target, or ends in an instruction
    /// that continues to the next one.
    pub fn falls_through(&self) -> bool {
        match self.instructions.last() {
            None | Some(Instruction::Label(_)) => true,
            Some(last) => !last.opcode().is_some_and(Opcode::ends_block),
        }
    }

    /// Drops unconditional jumps to a label that immediately follows them.
    pub fn fold_trivial_jumps(&mut self) {
        let instructions = std::mem::take(&mut self.instructions);
        let trivial: Vec<bool> = instructions
            .iter()
            .enumerate()
            .map(|(index, instruction)| match instruction {
                Instruction::Jump { condition: Condition::Always, target } => instructions
                    [index + 1..]
                    .iter()
                    .take_while(|next| matches!(next, Instruction::Label(_)))
                    .any(|next| *next == Instruction::Label(*target)),
                _ => false,
            })
            .collect();
        self.instructions = instructions
            .into_iter()
            .zip(trivial)
            .filter_map(|(instruction, trivial)| (!trivial).then_some(instruction))
            .collect();
    }

    pub fn into_parts(self) -> (Vec<Instruction>, Vec<ExceptionEntry>, Vec<CompilationError>) {
        (self.instructions, self.exception_table, self.diagnostics)
    }
}

impl From<Instruction> for Code {
    fn from(instruction: Instruction) -> Self {
        Code::from(vec![instruction])
    }
}

impl From<Vec<Instruction>> for Code {
    fn from(instructions: Vec<Instruction>) -> Self {
        Code { instructions, ..Code::default() }
    }
}

impl FromIterator<Instruction> for Code {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Code::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl Extend<Instruction> for Code {
    fn extend<T: IntoIterator<Item = Instruction>>(&mut self, iter: T) {
        self.instructions.extend(iter);
    }
}

impl FromIterator<Code> for Code {
    fn from_iter<T: IntoIterator<Item = Code>>(iter: T) -> Self {
        iter.into_iter().fold(Code::new(), Code::concat)
    }
}

impl Add for Code {
    type Output = Code;

    fn add(self, rhs: Code) -> Code {
        self.concat(rhs)
    }
}

impl AddAssign for Code {
    fn add_assign(&mut self, rhs: Code) {
        self.append(rhs);
    }
}
