//! Local variable declarations.

use super::StmtCompiler;
use crate::ast::Expression;
use crate::bytecode::{Code, Instruction};
use kiln_core::{CompilationError, Span, Type};

impl<'a> StmtCompiler<'a> {
    /// Compiles `var name [: ty] [= init]`.
    ///
    /// Without a type the initializer's type is used, with `null` widened
    /// to the universal object type. Without an initializer the slot is
    /// set to the type's zero value. The name is declared only after the
    /// initializer is compiled, so it cannot refer to itself.
    pub(super) fn compile_var_decl(
        &mut self,
        name: &str,
        ty: Option<&Type>,
        init: Option<&Expression>,
        span: Span,
    ) -> Code {
        let declared = match (ty, init) {
            (Some(ty), _) => ty.clone(),
            (None, Some(init)) => infer_local_type(self.expr().type_of(init)),
            (None, None) => {
                return Code::error(CompilationError::type_mismatch(
                    span,
                    format!("cannot infer a type for `{name}` without an initializer"),
                ));
            }
        };
        if declared.is_void() {
            let mut code = Code::error(CompilationError::type_mismatch(
                span,
                format!("variable `{name}` cannot have type `void`"),
            ));
            if let Some(init) = init {
                code.append(self.expr().compile_discard(init));
            }
            return code;
        }

        let mut code = match init {
            Some(init) => self.expr().compile_to(init, &declared),
            None => {
                self.env.push(declared.clone());
                let mut code = Code::new();
                code.push_opt(Instruction::zero(&declared));
                code
            }
        };

        match self.env.declare(name, declared.clone(), span) {
            Ok(slot) => {
                code.push(Instruction::store(&declared, slot));
                self.env.pop();
            }
            Err(error) => {
                code.diagnostic(error);
                let depth = self.env.stack_depth().saturating_sub(1);
                code = self.expr().discard_to(code, depth);
            }
        }
        code
    }
}

fn infer_local_type(ty: Type) -> Type {
    match ty {
        Type::Null => Type::object(),
        Type::Constant(inner) => *inner,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::super::StmtCompiler;
    use crate::ast::{Expression, Statement};
    use crate::bytecode::{Instruction, Opcode};
    use crate::expr::test_support::{env, types};
    use kiln_core::{CompilationError, Span, Type};
    use pretty_assertions::assert_eq;

    #[test]
    fn null_initializer_declares_an_object() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::VOID)
            .compile(&Statement::var("o", None, Some(Expression::null())));
        assert!(code.diagnostics().is_empty());
        assert_eq!(env.lookup("o").map(|l| &l.ty), Some(&Type::object()));
        assert_eq!(code.opcodes(), vec![Opcode::AConstNull, Opcode::AStore]);
    }

    #[test]
    fn declared_type_converts_the_initializer() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::VOID)
            .compile(&Statement::var("d", Some(Type::DOUBLE), Some(Expression::int(3))));
        assert_eq!(code.opcodes(), vec![Opcode::IConst3, Opcode::I2D, Opcode::DStore]);
    }

    #[test]
    fn missing_initializer_stores_zero() {
        let types = types();
        let mut env = env();
        let code = StmtCompiler::new(&types, &mut env, Type::VOID)
            .compile(&Statement::var("n", Some(Type::LONG), None));
        assert_eq!(code.instructions(), &[Instruction::LConst(0), Instruction::store(&Type::LONG, 1)]);
    }

    #[test]
    fn redeclaration_in_the_same_scope_is_an_error() {
        let types = types();
        let mut env = env();
        let mut compiler = StmtCompiler::new(&types, &mut env, Type::VOID);
        compiler.compile(&Statement::var("x", None, Some(Expression::int(1))));
        let code = compiler.compile(&Statement::var("x", None, Some(Expression::int(2))).at(4, 1));
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(code.diagnostics()[0].span(), Span::point(4, 1));
        assert!(matches!(code.diagnostics()[0], CompilationError::Structural { .. }));
        assert_eq!(env.stack_depth(), 0);
    }
}
