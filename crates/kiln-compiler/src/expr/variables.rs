//! Local variable reads, writes and increments.

use super::ExprCompiler;
use crate::ast::Expression;
use crate::bytecode::{ArithOp, Code, Instruction, ValueKind};
use kiln_core::{CompilationError, NameKind, PrimitiveKind, Span, Type};
use ordered_float::OrderedFloat;

impl<'a> ExprCompiler<'a> {
    pub(super) fn variable_type(&self, name: &str) -> Type {
        self.env.lookup(name).map_or(Type::Null, |local| local.ty.clone())
    }

    pub(super) fn compile_variable(&mut self, name: &str, span: Span) -> Code {
        match self.env.lookup(name).cloned() {
            Some(local) => {
                self.env.push(local.ty.clone());
                Code::from(Instruction::load(&local.ty, local.slot))
            }
            None => {
                let code = Code::error(CompilationError::unresolved_name(span, NameKind::Variable, name));
                let depth = self.env.stack_depth();
                self.placeholder(code, depth)
            }
        }
    }

    /// Stores `value` into a local; `keep` leaves the stored value on the
    /// stack as the expression's result.
    pub(super) fn compile_assign(
        &mut self,
        name: &str,
        value: &Expression,
        keep: bool,
        span: Span,
    ) -> Code {
        let depth = self.env.stack_depth();
        let Some(local) = self.env.lookup(name).cloned() else {
            let mut code = self.compile(value);
            code.diagnostic(CompilationError::unresolved_name(span, NameKind::Variable, name));
            return if keep { self.placeholder(code, depth) } else { self.discard_to(code, depth) };
        };

        let mut code = self.compile_to(value, &local.ty);
        if keep {
            code.push_opt(Instruction::dup(local.ty.width()));
            self.env.push(local.ty.clone());
        }
        code.push(Instruction::store(&local.ty, local.slot));
        self.env.pop();
        code
    }

    pub(super) fn increment_type(&self, name: &str) -> Type {
        match self.env.lookup(name).and_then(|local| incrementable(&local.ty)) {
            Some(kind) => Type::Primitive(kind),
            None => Type::Null,
        }
    }

    pub(super) fn compile_increment(
        &mut self,
        name: &str,
        delta: i8,
        prefix: bool,
        keep: bool,
        span: Span,
    ) -> Code {
        let depth = self.env.stack_depth();
        let local = self.env.lookup(name).cloned();
        let (local, kind) = match local {
            Some(local) => match incrementable(&local.ty) {
                Some(kind) => (local, kind),
                None => {
                    let error = CompilationError::type_mismatch(
                        span,
                        format!("cannot increment a value of type `{}`", local.ty),
                    );
                    return self.failed_increment(error, keep, depth);
                }
            },
            None => {
                let error = CompilationError::unresolved_name(span, NameKind::Variable, name);
                return self.failed_increment(error, keep, depth);
            }
        };

        let ty = Type::Primitive(kind);
        let mut code = Code::new();
        if kind == PrimitiveKind::Int {
            if keep && !prefix {
                code.push(Instruction::load(&ty, local.slot));
            }
            code.push(Instruction::IInc { slot: local.slot, delta: i16::from(delta) });
            if keep && prefix {
                code.push(Instruction::load(&ty, local.slot));
            }
            if keep {
                self.env.push(ty);
            }
            return code;
        }

        code.push(Instruction::load(&ty, local.slot));
        self.env.push(ty.clone());
        if keep && !prefix {
            code.push(Instruction::Dup2);
            self.env.push(ty.clone());
        }
        code.push(match kind {
            PrimitiveKind::Long => Instruction::LConst(i64::from(delta)),
            _ => Instruction::DConst(OrderedFloat(f64::from(delta))),
        });
        self.env.push(ty.clone());
        code.push(Instruction::Arith { op: ArithOp::Add, kind: ValueKind::of_primitive(kind) });
        self.env.pop_n(2);
        self.env.push(ty.clone());
        if keep && prefix {
            code.push(Instruction::Dup2);
            self.env.push(ty.clone());
        }
        code.push(Instruction::store(&ty, local.slot));
        self.env.pop();
        code
    }

    fn failed_increment(&mut self, error: CompilationError, keep: bool, depth: usize) -> Code {
        let code = Code::error(error);
        if keep { self.placeholder(code, depth) } else { code }
    }
}

/// Kind of a local that `++`/`--` apply to.
fn incrementable(ty: &Type) -> Option<PrimitiveKind> {
    ty.primitive()
        .filter(|kind| matches!(kind, PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Double))
}
