//! Return statements.

use super::StmtCompiler;
use crate::ast::Expression;
use crate::bytecode::{Code, Instruction};
use kiln_core::{CompilationError, Span};

impl<'a> StmtCompiler<'a> {
    /// Compiles `return [value]`.
    ///
    /// The value is converted to the method's result type. A throwable
    /// value that does not conform to the result type is thrown instead of
    /// returned, so a method can hand back the exception a try-expression
    /// caught. In tail position a self-call is rewritten into a jump.
    pub(super) fn compile_return(&mut self, value: Option<&Expression>, tail: bool, span: Span) -> Code {
        let return_type = self.return_type.clone();
        let Some(value) = value else {
            if return_type.is_void() {
                return Code::from(Instruction::ReturnVoid);
            }
            let mut code = Code::error(CompilationError::type_mismatch(
                span,
                format!("missing return value of type `{return_type}`"),
            ));
            code.push_opt(Instruction::zero(&return_type)).push(Instruction::ret(&return_type));
            return code;
        };

        if tail && let Some(code) = self.tail_call(value) {
            return code;
        }

        let found = self.expr().type_of(value);
        if return_type.is_void() {
            let mut code = Code::new();
            if !found.is_void() {
                code.diagnostic(CompilationError::type_mismatch(
                    value.span,
                    format!("cannot return a value of type `{found}` from a method returning `void`"),
                ));
            }
            code.append(self.expr().compile_discard(value));
            code.push(Instruction::ReturnVoid);
            return code;
        }

        if self.types.is_throwable(&found) && !self.types.is_assignable(&found, &return_type) {
            let mut code = self.expr().compile(value);
            code.push(Instruction::Throw);
            self.env.pop();
            return code;
        }

        let mut code = self.expr().compile_to(value, &return_type);
        code.push(Instruction::ret(&return_type));
        self.env.pop();
        code
    }
}

#[cfg(test)]
mod tests {
    use super::super::StmtCompiler;
    use crate::ast::{Expression, Statement};
    use crate::bytecode::Opcode;
    use crate::expr::test_support::{env, types};
    use kiln_core::{Type, names};
    use pretty_assertions::assert_eq;

    #[test]
    fn value_is_converted_to_the_result_type() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::DOUBLE).compile(&Statement::ret(Expression::int(2)));
        assert_eq!(code.opcodes(), vec![Opcode::IConst2, Opcode::I2D, Opcode::DReturn]);
        assert_eq!(env.stack_depth(), 0);
    }

    #[test]
    fn caught_exception_is_rethrown() {
        let types = types();
        let mut env = env();
        let value = Expression::construct(Type::reference(names::RUNTIME_EXCEPTION), vec![]);
        let code = StmtCompiler::new(&types, &mut env, Type::string()).compile(&Statement::ret(value));
        assert!(code.diagnostics().is_empty());
        assert_eq!(code.opcodes().last(), Some(&Opcode::AThrow));
    }

    #[test]
    fn bare_return_in_a_value_method_is_reported() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::INT).compile(&Statement::ret_void());
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(code.opcodes(), vec![Opcode::IConst0, Opcode::IReturn]);
    }

    #[test]
    fn value_in_a_void_method_is_reported() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::VOID).compile(&Statement::ret(Expression::int(1)));
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(code.opcodes(), vec![Opcode::IConst1, Opcode::Pop, Opcode::Return]);
    }
}
