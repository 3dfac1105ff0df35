//! Statement compilation.
//!
//! [`StmtCompiler`] lowers [`Statement`]s to [`Code`], handing expressions
//! to an [`ExprCompiler`] over the same environment:
//! - blocks open a local scope
//! - `if` and `for` consume their conditions as jumps, never as values
//! - `return` converts to the method's result type
//! - declarations infer a missing type from the initializer
//! - a self-call in tail position becomes a jump to the method entry
//!
//! Every statement leaves the operand stack empty.

mod block;
mod for_stmt;
mod if_stmt;
mod return_stmt;
mod tail_call;
mod var_decl;

use crate::ast::{Statement, StmtKind};
use crate::bytecode::Code;
use crate::env::OperandEnvironment;
use crate::expr::ExprCompiler;
use crate::type_system::TypeSystem;
use kiln_core::{CompilationError, Type};

/// Compiles the statements of one method body.
pub struct StmtCompiler<'a> {
    types: &'a TypeSystem,
    env: &'a mut OperandEnvironment,
    /// Declared result type of the enclosing method.
    return_type: Type,
}

impl<'a> StmtCompiler<'a> {
    pub fn new(types: &'a TypeSystem, env: &'a mut OperandEnvironment, return_type: Type) -> Self {
        Self { types, env, return_type }
    }

    /// Compiles a method body. The last statement is in tail position.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_body(&mut self, statements: &[Statement]) -> Code {
        self.compile_sequence(statements, true)
    }

    /// Compiles a statement outside tail position.
    pub fn compile(&mut self, stmt: &Statement) -> Code {
        self.compile_in(stmt, false)
    }

    fn compile_in(&mut self, stmt: &Statement, tail: bool) -> Code {
        let mut code = match &stmt.kind {
            StmtKind::Block(statements) => self.compile_block(statements, tail),
            StmtKind::If { condition, then_branch, else_branch } => {
                self.compile_if(condition, then_branch, else_branch.as_deref(), tail)
            }
            StmtKind::For { init, condition, update, body } => {
                self.compile_for(init.as_deref(), condition.as_ref(), update.as_ref(), body)
            }
            StmtKind::Return(value) => self.compile_return(value.as_ref(), tail, stmt.span),
            StmtKind::VarDecl { name, ty, init } => {
                self.compile_var_decl(name, ty.as_ref(), init.as_ref(), stmt.span)
            }
            StmtKind::FieldWrite { target, name, value } => {
                self.expr().compile_field_write(target, name, value, false, stmt.span)
            }
            StmtKind::Expression(expression) => self.compile_expression_stmt(expression, tail),
        };

        if self.env.stack_depth() != 0 {
            code.diagnostic(CompilationError::internal(format!(
                "operand stack not empty after statement at line {}",
                stmt.span.line
            )));
            self.env.restore(Vec::new());
        }
        code
    }

    fn compile_sequence(&mut self, statements: &[Statement], tail: bool) -> Code {
        let last = statements.len().saturating_sub(1);
        statements
            .iter()
            .enumerate()
            .map(|(i, stmt)| self.compile_in(stmt, tail && i == last))
            .collect()
    }

    fn compile_expression_stmt(&mut self, expression: &crate::ast::Expression, tail: bool) -> Code {
        if tail && self.return_type.is_void() {
            if let Some(code) = self.tail_call(expression) {
                return code;
            }
        }
        self.expr().compile_discard(expression)
    }

    /// An expression compiler sharing this compiler's environment.
    fn expr(&mut self) -> ExprCompiler<'_> {
        ExprCompiler::new(self.types, &mut *self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use crate::bytecode::Opcode;
    use crate::expr::test_support::{env, types};
    use pretty_assertions::assert_eq;

    #[test]
    fn expression_statement_discards_its_value() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::VOID)
            .compile(&Statement::expr(Expression::call("expensive", vec![])));
        assert_eq!(code.opcodes(), vec![Opcode::ALoad, Opcode::InvokeVirtual, Opcode::Pop]);
        assert_eq!(env.stack_depth(), 0);
    }

    #[test]
    fn field_write_statement_leaves_nothing_behind() {
        let types = types();
        let mut env = env();
        let stmt = Statement::field_write(crate::ast::FieldTarget::This, "count", Expression::int(4));
        let code = StmtCompiler::new(&types, &mut env, Type::VOID).compile(&stmt);
        assert!(code.diagnostics().is_empty());
        assert_eq!(code.opcodes(), vec![Opcode::ALoad, Opcode::IConst4, Opcode::PutField]);
        assert_eq!(env.max_stack(), 2);
    }
}
