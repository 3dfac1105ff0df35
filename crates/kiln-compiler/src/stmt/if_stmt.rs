//! If/else statement compilation.
//!
//! ```text
//! [condition -> then | else]
//! then:
//!   [then branch]
//!   goto end        ; omitted when the branch cannot complete
//! else:
//!   [else branch]
//! end:              ; omitted when neither branch can complete
//! ```

use super::StmtCompiler;
use crate::ast::{Expression, Statement};
use crate::bytecode::{Code, Instruction};

impl<'a> StmtCompiler<'a> {
    pub(super) fn compile_if(
        &mut self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
        tail: bool,
    ) -> Code {
        let then_label = self.env.new_label();
        let else_label = self.env.new_label();
        let mut code = self.expr().compile_condition(condition, then_label, else_label);

        code.label(then_label);
        let then_code = self.compile_branch(then_branch, tail);
        let then_completes = then_code.falls_through();
        code.append(then_code);

        match else_branch {
            Some(else_branch) => {
                let end = self.env.new_label();
                if then_completes {
                    code.push(Instruction::goto(end));
                }
                code.label(else_label);
                let else_code = self.compile_branch(else_branch, tail);
                let else_completes = else_code.falls_through();
                code.append(else_code);
                if then_completes || else_completes {
                    code.label(end);
                }
            }
            None => {
                code.label(else_label);
            }
        }
        code
    }

    /// A branch gets its own scope even when it is a single declaration.
    fn compile_branch(&mut self, branch: &Statement, tail: bool) -> Code {
        self.env.push_scope();
        let code = self.compile_in(branch, tail);
        self.env.pop_scope();
        code
    }
}

#[cfg(test)]
mod tests {
    use super::super::StmtCompiler;
    use crate::ast::{CompareOp, Expression, Statement};
    use crate::bytecode::{Instruction, Opcode};
    use crate::expr::test_support::{env, types};
    use kiln_core::{Span, Type};
    use pretty_assertions::assert_eq;

    #[test]
    fn else_branch_is_skipped_by_a_goto() {
        let types = types();
        let mut env = env();
        env.declare("n", Type::INT, Span::default()).unwrap();
        let stmt = Statement::if_else(
            Expression::compare(Expression::var("n"), CompareOp::Lt, Expression::int(0)),
            Statement::expr(Expression::call("sideEffect", vec![])),
            Statement::var("m", None, Some(Expression::int(1))),
        );
        let code = StmtCompiler::new(&types, &mut env, Type::VOID).compile(&stmt);
        assert!(code.diagnostics().is_empty());
        assert_eq!(
            code.opcodes(),
            vec![
                Opcode::ILoad,
                Opcode::IConst0,
                Opcode::IfICmpGe,
                Opcode::Goto,
                Opcode::ALoad,
                Opcode::InvokeVirtual,
                Opcode::Goto,
                Opcode::IConst1,
                Opcode::IStore,
            ]
        );
        assert_eq!(env.stack_depth(), 0);
    }

    #[test]
    fn returning_branch_needs_no_goto() {
        let types = types();
        let mut env = env();
        let stmt = Statement::if_else(
            Expression::call("expensive", vec![]),
            Statement::ret(Expression::int(1)),
            Statement::ret(Expression::int(2)),
        );
        let code = StmtCompiler::new(&types, &mut env, Type::INT).compile(&stmt);
        let gotos = code
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Jump { condition: crate::bytecode::Condition::Always, .. }))
            .count();
        // Only the condition's fall-back jump to the else label.
        assert_eq!(gotos, 1);
        assert_eq!(code.count(Opcode::IReturn), 2);
        assert!(!code.falls_through());
    }
}
