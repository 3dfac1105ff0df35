//! `&&` and `||`.
//!
//! The value form works on values rather than booleans: the left operand
//! is kept when it decides the result, otherwise the right operand replaces
//! it, and the result type is the intersection of both. The branch form
//! short-circuits straight to the caller's labels.

use super::ExprCompiler;
use crate::ast::{Expression, LogicalOp};
use crate::bytecode::{Code, Instruction, Label};
use kiln_core::{CompilationError, Span, Type};

/// Whether a literal left operand alone fixes the outcome of `op`.
fn decides(op: LogicalOp, value: bool) -> bool {
    match op {
        LogicalOp::And => !value,
        LogicalOp::Or => value,
    }
}

impl<'a> ExprCompiler<'a> {
    pub(super) fn logical_type(&self, left: &Expression, right: &Expression) -> Type {
        self.types.intersect(&self.type_of(left), &self.type_of(right))
    }

    pub(super) fn compile_logical(
        &mut self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
        span: Span,
    ) -> Code {
        let ty = self.logical_type(left, right);
        if ty.is_void() {
            let mut code = Code::error(CompilationError::type_mismatch(
                span,
                "`void` operand in a logical expression",
            ));
            code.append(self.compile_discard(left));
            code.append(self.compile_discard(right));
            return code;
        }
        if let Some(value) = left.as_boolean()
            && decides(op, value)
        {
            return self.compile_to(left, &ty);
        }

        let end = self.env.new_label();
        let mut code = self.compile_to(left, &ty);
        code.push_opt(Instruction::dup(ty.width()));
        self.env.push(ty.clone());
        code.append(self.truth_jump(&ty, op == LogicalOp::Or, end));
        code.push_opt(Instruction::pop(ty.width()));
        self.env.pop();
        code.append(self.compile_to(right, &ty));
        code.label(end);
        code
    }

    pub(super) fn logical_condition(
        &mut self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
        on_true: Label,
        on_false: Label,
    ) -> Code {
        if let Some(value) = left.as_boolean() {
            return if decides(op, value) {
                Code::from(Instruction::goto(if value { on_true } else { on_false }))
            } else {
                self.compile_condition(right, on_true, on_false)
            };
        }
        let next = self.env.new_label();
        let mut code = match op {
            LogicalOp::And => self.compile_condition(left, next, on_false),
            LogicalOp::Or => self.compile_condition(left, on_true, next),
        };
        code.label(next);
        code.append(self.compile_condition(right, on_true, on_false));
        code
    }
}
