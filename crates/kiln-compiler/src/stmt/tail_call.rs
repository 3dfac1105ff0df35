//! Self tail-call elimination.
//!
//! A call in tail position that resolves to the enclosing method itself is
//! compiled as: evaluate every argument, store them into the parameter
//! slots from the last parameter down to the first, jump to the entry
//! label. All arguments are evaluated before the first store, so no
//! argument observes an already-updated parameter.
//!
//! Only calls that must reach this very method qualify: static, private
//! or final methods, methods of a final class, and instance methods no
//! known subclass overrides. An overridden instance method could dispatch
//! elsewhere and is left as an ordinary call.

use super::StmtCompiler;
use crate::ast::{CallTarget, ExprKind, Expression};
use crate::bytecode::{Code, Instruction};
use kiln_core::{ClassFlags, MemberFlags};

impl<'a> StmtCompiler<'a> {
    /// The jump form of `expression` when it is a self tail call.
    pub(super) fn tail_call(&mut self, expression: &Expression) -> Option<Code> {
        if !self.env.options().tail_calls {
            return None;
        }
        let ExprKind::Call { target, name, arguments } = &expression.kind else {
            return None;
        };
        if !matches!(target, CallTarget::Implicit | CallTarget::This) {
            return None;
        }
        let frame = self.env.frame()?.clone();
        if frame.signature.name != *name || frame.signature.arity() != arguments.len() {
            return None;
        }

        let found = self.expr().resolve_direct(target, name, arguments, expression.span)?;
        let function = &found.method.function;
        if function.signature != frame.signature || function.is_static() != frame.is_static {
            return None;
        }
        let sealed = self
            .types
            .reflect(&frame.signature.owner)
            .is_some_and(|info| info.flags.contains(ClassFlags::FINAL));
        if !(function.is_static()
            || function.is_private()
            || function.flags.contains(MemberFlags::FINAL)
            || sealed
            || !self.types.is_overridden(&function.signature))
        {
            return None;
        }

        let mut code = self.expr().compile_arguments(&found, arguments);
        for (slot, ty) in frame.parameter_slots.iter().zip(found.conversion_targets()).rev() {
            code.push(Instruction::store(&ty, *slot));
            self.env.pop();
        }
        code.push(Instruction::goto(frame.entry));
        tracing::debug!(method = %frame.signature, "self call in tail position compiled as a jump");
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::super::StmtCompiler;
    use crate::ast::{CompareOp, Expression, Statement};
    use crate::bytecode::{Instruction, Opcode};
    use crate::env::{Frame, OperandEnvironment};
    use crate::expr::test_support::{OWNER, static_env, types};
    use crate::options::CompilerOptions;
    use kiln_core::{Signature, Span, Type};
    use pretty_assertions::assert_eq;

    fn countdown_frame(env: &mut OperandEnvironment) -> Frame {
        let n = env.declare("n", Type::INT, Span::default()).unwrap();
        let acc = env.declare("acc", Type::LONG, Span::default()).unwrap();
        let frame = Frame {
            signature: Signature::new(
                Type::reference(OWNER),
                "countdown",
                vec![Type::INT, Type::LONG],
                Type::LONG,
            ),
            entry: env.new_label(),
            parameter_slots: vec![n, acc],
            is_static: true,
        };
        env.set_frame(frame.clone());
        frame
    }

    fn recurse() -> Expression {
        Expression::call(
            "countdown",
            vec![
                Expression::sub(Expression::var("n"), Expression::int(1)),
                Expression::add(Expression::var("acc"), Expression::var("n")),
            ],
        )
    }

    #[test]
    fn stores_run_from_the_last_parameter_down() {
        let types = types();
        let mut env = static_env();
        let frame = countdown_frame(&mut env);
        let body = vec![Statement::ret(recurse())];
        let code = StmtCompiler::new(&types, &mut env, Type::LONG).compile_body(&body);
        assert!(code.diagnostics().is_empty());
        assert_eq!(
            code.opcodes(),
            vec![
                Opcode::ILoad,
                Opcode::IConst1,
                Opcode::ISub,
                Opcode::LLoad,
                Opcode::ILoad,
                Opcode::I2L,
                Opcode::LAdd,
                Opcode::LStore,
                Opcode::IStore,
                Opcode::Goto,
            ]
        );
        assert_eq!(code.instructions().last(), Some(&Instruction::goto(frame.entry)));
        assert_eq!(code.count(Opcode::InvokeStatic), 0);
        assert_eq!(env.stack_depth(), 0);
    }

    #[test]
    fn only_the_tail_position_is_rewritten() {
        let types = types();
        let mut env = static_env();
        countdown_frame(&mut env);
        let body = vec![
            Statement::if_then(
                Expression::compare(Expression::var("n"), CompareOp::Eq, Expression::int(0)),
                Statement::ret(Expression::var("acc")),
            ),
            Statement::var("ignored", None, Some(recurse())),
            Statement::ret(recurse()),
        ];
        let code = StmtCompiler::new(&types, &mut env, Type::LONG).compile_body(&body);
        assert_eq!(code.count(Opcode::InvokeStatic), 1);
        assert_eq!(code.count(Opcode::LReturn), 1);
    }

    #[test]
    fn both_branches_of_a_final_if_are_tail_positions() {
        let types = types();
        let mut env = static_env();
        countdown_frame(&mut env);
        let body = vec![Statement::if_else(
            Expression::compare(Expression::var("n"), CompareOp::Eq, Expression::int(0)),
            Statement::ret(Expression::var("acc")),
            Statement::block(vec![Statement::ret(recurse())]),
        )];
        let code = StmtCompiler::new(&types, &mut env, Type::LONG).compile_body(&body);
        assert_eq!(code.count(Opcode::InvokeStatic), 0);
    }

    #[test]
    fn disabled_rewriting_keeps_the_call() {
        let types = types();
        let mut env = OperandEnvironment::new(
            Type::reference(OWNER),
            true,
            CompilerOptions::default().with_tail_calls(false),
        );
        countdown_frame(&mut env);
        let code = StmtCompiler::new(&types, &mut env, Type::LONG).compile_body(&[Statement::ret(recurse())]);
        assert_eq!(code.count(Opcode::InvokeStatic), 1);
        assert_eq!(code.count(Opcode::Goto), 0);
    }
}
