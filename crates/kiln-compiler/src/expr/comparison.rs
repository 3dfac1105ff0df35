//! Comparison chains.
//!
//! `a < b <= c` compares each operand with its neighbour, evaluating every
//! operand once. Intermediate operands are duplicated under their left
//! neighbour before the comparison consumes the pair:
//!
//! ```text
//! [a] [b] dup_x1        -> b a b
//! if_icmpge cleanup     -> b
//! [c] if_icmpgt false   ->
//! goto true
//! cleanup: pop, goto false
//! ```

use super::ExprCompiler;
use crate::ast::{CompareOp, Expression};
use crate::bytecode::{Code, Condition, Instruction, InvokeKind, Label, ValueKind};
use kiln_core::{CompilationError, Span, Type, names};

impl<'a> ExprCompiler<'a> {
    /// The type every operand of a chain is converted to: the widest
    /// numeric kind when all operands are numeric, otherwise their
    /// intersection.
    fn comparison_type(&self, operands: &[&Expression]) -> Type {
        let types: Vec<Type> = operands.iter().map(|e| self.type_of(e)).collect();
        let numeric: Option<Vec<_>> = types
            .iter()
            .filter(|t| !t.is_null())
            .map(|t| self.numeric_kind(t))
            .collect();
        if let Some(kinds) = numeric
            && let Some(widest) = kinds.into_iter().max()
        {
            return Type::Primitive(widest.computational());
        }
        types
            .iter()
            .skip(1)
            .fold(types[0].clone(), |acc, t| self.types.intersect(&acc, t))
    }

    pub(super) fn compare_chain(
        &mut self,
        first: &Expression,
        rest: &[(CompareOp, Expression)],
        on_true: Label,
        on_false: Label,
        span: Span,
    ) -> Code {
        let operands: Vec<&Expression> = std::iter::once(first)
            .chain(rest.iter().map(|(_, operand)| operand))
            .collect();
        let common = self.comparison_type(&operands);
        let width = common.width();
        let base = self.env.snapshot();
        let cleanup = self.env.new_label();
        let mut needs_cleanup = false;

        let mut code = self.compile_to(first, &common);
        if rest.is_empty() {
            code.append(self.truth_jump(&common, true, on_true));
            code.push(Instruction::goto(on_false));
            return code;
        }

        for (index, (op, operand)) in rest.iter().enumerate() {
            code.append(self.compile_to(operand, &common));
            if index + 1 < rest.len() {
                // Keep the right operand for the next link.
                code.push(if width == 2 { Instruction::Dup2X2 } else { Instruction::DupX1 });
                self.env.pop_n(2);
                for _ in 0..3 {
                    self.env.push(common.clone());
                }
                code.append(self.compare_jump(&common, *op, false, cleanup, span));
                needs_cleanup = true;
            } else {
                code.append(self.compare_jump(&common, *op, false, on_false, span));
                code.push(Instruction::goto(on_true));
            }
        }

        if needs_cleanup {
            code.label(cleanup);
            code.push_opt(Instruction::pop(width));
            code.push(Instruction::goto(on_false));
        }
        self.env.restore(base);
        code
    }

    /// Consumes two values of `ty` and jumps to `target` when `left op
    /// right` evaluates to `when`.
    fn compare_jump(
        &mut self,
        ty: &Type,
        op: CompareOp,
        when: bool,
        target: Label,
        span: Span,
    ) -> Code {
        let effective = if when { op } else { op.negate() };
        let ty = ty.unwrap_constant();
        let mut code = Code::new();

        match ValueKind::of(ty) {
            ValueKind::Int if ty.is_boolean() && !op.is_equality() => {
                return self.incomparable(code, ty, op, span);
            }
            ValueKind::Int => {
                code.push(Instruction::jump(int_condition(effective), target));
                self.env.pop_n(2);
            }
            ValueKind::Long => {
                code.push(Instruction::LCmp);
                self.env.pop_n(2);
                code.push(Instruction::jump(zero_condition(effective), target));
            }
            ValueKind::Double => {
                // NaN must make every ordering false: pick the comparison
                // whose NaN result fails the un-negated operator.
                let compare = match op {
                    CompareOp::Lt | CompareOp::Le => Instruction::DCmpG,
                    _ => Instruction::DCmpL,
                };
                code.push(compare);
                self.env.pop_n(2);
                code.push(Instruction::jump(zero_condition(effective), target));
            }
            ValueKind::Reference if op.is_equality() => {
                code.push(Instruction::invoke(
                    InvokeKind::Static,
                    names::OBJECTS,
                    "equals",
                    "(Ljava/lang/Object;Ljava/lang/Object;)Z",
                ));
                self.env.pop_n(2);
                let condition = if effective == CompareOp::Eq { Condition::Ne } else { Condition::Eq };
                code.push(Instruction::jump(condition, target));
            }
            ValueKind::Reference if self.types.is_comparable(ty) => {
                code.push(Instruction::invoke(
                    InvokeKind::Interface,
                    names::COMPARABLE,
                    "compareTo",
                    "(Ljava/lang/Object;)I",
                ));
                self.env.pop_n(2);
                code.push(Instruction::jump(zero_condition(effective), target));
            }
            ValueKind::Reference => return self.incomparable(code, ty, op, span),
        }
        code
    }

    /// Reports an operator that cannot order `ty` and drops both operands.
    fn incomparable(&mut self, mut code: Code, ty: &Type, op: CompareOp, span: Span) -> Code {
        code.diagnostic(CompilationError::type_mismatch(
            span,
            format!("operator `{op}` cannot be applied to `{ty}` operands"),
        ));
        for _ in 0..2 {
            if let Some(operand) = self.env.pop() {
                code.push_opt(Instruction::pop(operand.width()));
            }
        }
        code
    }
}

fn int_condition(op: CompareOp) -> Condition {
    match op {
        CompareOp::Eq => Condition::ICmpEq,
        CompareOp::Ne => Condition::ICmpNe,
        CompareOp::Lt => Condition::ICmpLt,
        CompareOp::Le => Condition::ICmpLe,
        CompareOp::Gt => Condition::ICmpGt,
        CompareOp::Ge => Condition::ICmpGe,
    }
}

fn zero_condition(op: CompareOp) -> Condition {
    match op {
        CompareOp::Eq => Condition::Eq,
        CompareOp::Ne => Condition::Ne,
        CompareOp::Lt => Condition::Lt,
        CompareOp::Le => Condition::Le,
        CompareOp::Gt => Condition::Gt,
        CompareOp::Ge => Condition::Ge,
    }
}
