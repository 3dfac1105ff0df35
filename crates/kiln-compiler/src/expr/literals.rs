//! Literal constants.

use super::ExprCompiler;
use crate::ast::Literal;
use crate::bytecode::{Code, Instruction};

impl<'a> ExprCompiler<'a> {
    pub(super) fn compile_literal(&mut self, literal: &Literal) -> Code {
        let instruction = match literal {
            Literal::Boolean(value) => Instruction::IConst(i32::from(*value)),
            Literal::Char(value) => Instruction::IConst(*value as i32),
            Literal::Int(value) => Instruction::IConst(*value),
            Literal::Long(value) => Instruction::LConst(*value),
            Literal::Double(value) => Instruction::DConst(*value),
            Literal::String(value) => Instruction::SConst(value.clone()),
            Literal::Null => Instruction::AConstNull,
        };
        self.env.push(literal.ty());
        Code::from(instruction)
    }
}
