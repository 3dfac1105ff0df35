//! Arithmetic, negation and string concatenation.
//!
//! Numeric operands are converted to the widest computational kind of the
//! pair before the operation. A `+` with any string operand switches the
//! whole `+` chain into a single builder-append sequence.

use super::ExprCompiler;
use crate::ast::{BinaryOp, ExprKind, Expression};
use crate::bytecode::{ArithOp, Code, Instruction, InvokeKind, ValueKind};
use kiln_core::{CompilationError, PrimitiveKind, Span, Type, names};

impl<'a> ExprCompiler<'a> {
    pub(super) fn binary_type(&self, op: BinaryOp, left: &Expression, right: &Expression) -> Type {
        let (l, r) = (self.type_of(left), self.type_of(right));
        if op == BinaryOp::Add && (self.types.is_string(&l) || self.types.is_string(&r)) {
            return Type::string();
        }
        self.arithmetic_kind(&l, &r).map_or(Type::Null, Type::Primitive)
    }

    /// Kind an arithmetic operation on `l` and `r` is carried out in.
    ///
    /// A `Null` operand is a placeholder for an earlier failure, so it
    /// takes whatever kind the other side has.
    fn arithmetic_kind(&self, l: &Type, r: &Type) -> Option<PrimitiveKind> {
        let kind = match (l.is_null(), r.is_null()) {
            (true, true) => return None,
            (true, false) => self.numeric_kind(r)?,
            (false, true) => self.numeric_kind(l)?,
            (false, false) => self.numeric_kind(l)?.max(self.numeric_kind(r)?),
        };
        Some(kind.computational())
    }

    pub(super) fn compile_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        expr: &Expression,
    ) -> Code {
        let (l, r) = (self.type_of(left), self.type_of(right));
        if op == BinaryOp::Add && (self.types.is_string(&l) || self.types.is_string(&r)) {
            let mut parts = Vec::new();
            self.flatten_concat(expr, &mut parts);
            return self.compile_concat(&parts, expr.span);
        }

        let depth = self.env.stack_depth();
        match self.arithmetic_kind(&l, &r) {
            Some(kind) => {
                let target = Type::Primitive(kind);
                let mut code = self.compile_to(left, &target);
                code.append(self.compile_to(right, &target));
                code.push(Instruction::Arith { op: arith_op(op), kind: ValueKind::of_primitive(kind) });
                self.env.pop_n(2);
                self.env.push(target);
                code
            }
            None => {
                let mut code = self.compile(left);
                code.append(self.compile(right));
                if !l.is_null() && !r.is_null() {
                    code.diagnostic(CompilationError::type_mismatch(
                        expr.span,
                        format!("cannot {} `{l}` and `{r}`", op.verb()),
                    ));
                }
                self.placeholder(code, depth)
            }
        }
    }

    pub(super) fn negation_type(&self, operand: &Expression) -> Type {
        let ty = self.type_of(operand);
        self.numeric_kind(&ty)
            .map_or(Type::Null, |kind| Type::Primitive(kind.computational()))
    }

    pub(super) fn compile_negation(&mut self, operand: &Expression, span: Span) -> Code {
        let ty = self.type_of(operand);
        let depth = self.env.stack_depth();
        match self.numeric_kind(&ty) {
            Some(kind) => {
                let kind = kind.computational();
                let mut code = self.compile_to(operand, &Type::Primitive(kind));
                code.push(Instruction::Arith { op: ArithOp::Neg, kind: ValueKind::of_primitive(kind) });
                code
            }
            None => {
                let mut code = self.compile(operand);
                if !ty.is_null() {
                    code.diagnostic(CompilationError::type_mismatch(
                        span,
                        format!("cannot negate `{ty}`"),
                    ));
                }
                self.placeholder(code, depth)
            }
        }
    }

    // =========================================================================
    // String concatenation
    // =========================================================================

    /// Collects the operands of a string-typed `+` chain in source order.
    /// Sub-chains that are not themselves strings stay whole, so `1 + 2 +
    /// "a"` still adds before appending.
    fn flatten_concat<'e>(&self, expr: &'e Expression, parts: &mut Vec<&'e Expression>) {
        match &expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, left, right }
                if self.types.is_string(&self.type_of(expr)) =>
            {
                self.flatten_concat(left, parts);
                self.flatten_concat(right, parts);
            }
            ExprKind::Concat(inner) => {
                for part in inner {
                    self.flatten_concat(part, parts);
                }
            }
            _ => parts.push(expr),
        }
    }

    pub(super) fn compile_concat(&mut self, parts: &[&Expression], span: Span) -> Code {
        let builder = Type::reference(names::STRING_BUILDER);
        let builder_descriptor = builder.descriptor();
        let mut code = Code::new();
        code.push(Instruction::new_object(names::STRING_BUILDER))
            .push(Instruction::Dup)
            .push(Instruction::invoke(
                InvokeKind::Special,
                names::STRING_BUILDER,
                names::CONSTRUCTOR,
                "()V",
            ));
        self.env.push(builder.clone());
        self.env.push(builder.clone());
        self.env.pop();

        for part in parts {
            let ty = self.type_of(part);
            code.append(self.compile(part));
            if ty.is_void() {
                code.diagnostic(CompilationError::type_mismatch(
                    part.span,
                    "cannot concatenate a `void` value",
                ));
                continue;
            }
            let argument = self.append_parameter(&ty);
            code.push(Instruction::invoke(
                InvokeKind::Virtual,
                names::STRING_BUILDER,
                "append",
                format!("({argument}){builder_descriptor}"),
            ));
            self.env.pop_n(2);
            self.env.push(builder.clone());
        }

        code.push(Instruction::invoke(
            InvokeKind::Virtual,
            names::STRING_BUILDER,
            "toString",
            format!("(){}", Type::string().descriptor()),
        ));
        self.env.pop();
        self.env.push(Type::string());
        tracing::trace!(parts = parts.len(), line = span.line, "string concatenation");
        code
    }

    /// Descriptor of the `append` overload taking a value of `ty`.
    fn append_parameter(&self, ty: &Type) -> String {
        match ty.primitive() {
            Some(kind) => kind.descriptor().to_string(),
            None if self.types.is_string(ty) => Type::string().descriptor(),
            None if !ty.is_null()
                && self.types.is_assignable(ty, &Type::reference(names::CHAR_SEQUENCE)) =>
            {
                Type::reference(names::CHAR_SEQUENCE).descriptor()
            }
            None => Type::object().descriptor(),
        }
    }
}

fn arith_op(op: BinaryOp) -> ArithOp {
    match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Sub => ArithOp::Sub,
        BinaryOp::Mul => ArithOp::Mul,
        BinaryOp::Div => ArithOp::Div,
        BinaryOp::Rem => ArithOp::Rem,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::ast::{BinaryOp, Expression};
    use crate::bytecode::{Instruction, Opcode};
    use crate::expr::ExprCompiler;
    use kiln_core::Type;
    use pretty_assertions::assert_eq;

    #[test]
    fn number_literals_add_as_doubles() {
        let types = types();
        let mut env = env();
        let expr = Expression::add(Expression::number(1.0), Expression::number(2.0));
        let mut compiler = ExprCompiler::new(&types, &mut env);
        assert_eq!(compiler.type_of(&expr), Type::DOUBLE);
        let code = compiler.compile(&expr);
        assert_eq!(code.opcodes(), vec![Opcode::DConst1, Opcode::Ldc2W, Opcode::DAdd]);
        assert!(code.diagnostics().is_empty());
        assert_eq!(env.stack_width(), 2);
    }

    #[test]
    fn mixed_operands_widen_to_the_wider_kind() {
        let types = types();
        let mut env = env();
        let expr = Expression::binary(BinaryOp::Mul, Expression::int(2), Expression::long(3));
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.opcodes(), vec![Opcode::IConst2, Opcode::I2L, Opcode::Ldc2W, Opcode::LMul]);
        assert_eq!(env.peek(), Some(&Type::LONG));
    }

    #[test]
    fn string_operand_switches_to_concatenation() {
        let types = types();
        let mut env = env();
        let expr = Expression::add(Expression::string("a"), Expression::int(1));
        let mut compiler = ExprCompiler::new(&types, &mut env);
        assert_eq!(compiler.type_of(&expr), Type::string());
        let code = compiler.compile(&expr);
        assert!(code.diagnostics().is_empty());
        assert_eq!(code.count(Opcode::IAdd), 0);
        assert_eq!(code.count(Opcode::New), 1);
        assert!(code.instructions().contains(&Instruction::invoke(
            crate::bytecode::InvokeKind::Virtual,
            kiln_core::names::STRING_BUILDER,
            "append",
            "(I)Ljava/lang/StringBuilder;",
        )));
        assert_eq!(env.stack_depth(), 1);
    }

    #[test]
    fn whole_chain_uses_one_builder() {
        let types = types();
        let mut env = env();
        let expr = Expression::add(
            Expression::add(Expression::string("a"), Expression::number(1.0)),
            Expression::string("b"),
        );
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.count(Opcode::New), 1);
        assert_eq!(code.count(Opcode::InvokeVirtual), 4);
    }

    #[test]
    fn numeric_prefix_is_added_before_appending() {
        let types = types();
        let mut env = env();
        let expr = Expression::add(
            Expression::add(Expression::int(1), Expression::int(2)),
            Expression::string("a"),
        );
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.count(Opcode::IAdd), 1);
        assert_eq!(code.count(Opcode::InvokeVirtual), 3);
    }

    #[test]
    fn invalid_operands_report_and_keep_the_stack_balanced() {
        let types = types();
        let mut env = env();
        let expr = Expression::sub(Expression::boolean(true), Expression::string("x")).at(3, 7);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(
            code.diagnostics()[0].render(),
            "line 3:7 cannot subtract `boolean` and `java.lang.String`."
        );
        assert_eq!(env.stack_depth(), 1);
        assert_eq!(env.peek(), Some(&Type::Null));
    }

    #[test]
    fn null_placeholder_does_not_cascade() {
        let types = types();
        let mut env = env();
        let expr = Expression::add(Expression::var("missing"), Expression::int(1));
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(env.peek(), Some(&Type::INT));
    }

    #[test]
    fn negation_of_char_is_int() {
        let types = types();
        let mut env = env();
        let code = ExprCompiler::new(&types, &mut env).compile(&Expression::neg(Expression::char('a')));
        assert_eq!(code.opcodes(), vec![Opcode::BiPush, Opcode::INeg]);
        assert_eq!(env.peek(), Some(&Type::INT));
    }
}
