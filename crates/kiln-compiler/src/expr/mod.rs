//! Expression compilation.
//!
//! [`ExprCompiler`] turns an [`Expression`] into [`Code`] for one of three
//! consumption contexts:
//! - [`compile`](ExprCompiler::compile) leaves the value on the operand stack
//! - [`compile_condition`](ExprCompiler::compile_condition) jumps to a true
//!   or false label and leaves the stack untouched
//! - [`compile_discard`](ExprCompiler::compile_discard) evaluates for effect
//!
//! ## Stack bookkeeping
//!
//! Every emitted instruction that changes the operand stack is mirrored on
//! the [`OperandEnvironment`]. After `compile` the environment holds exactly
//! one more entry, of type [`type_of`](ExprCompiler::type_of), or none when
//! that type is void.
//!
//! ## Errors
//!
//! User errors are attached to the returned `Code` and the failing node is
//! replaced by a placeholder: its operands are still compiled, for their own
//! diagnostics, then discarded and `null` stands in for the value. `type_of`
//! reports the `Null` type for such nodes so parents stay consistent.

mod arithmetic;
mod calls;
mod comparison;
mod enums;
mod fields;
mod literals;
mod logical;
mod try_expr;
mod variables;

use crate::ast::{ExprKind, Expression, Literal, UnaryOp};
use crate::bytecode::{Code, Condition, Instruction, Label, ValueKind};
use crate::env::OperandEnvironment;
use crate::type_system::TypeSystem;
use kiln_core::{CompilationError, PrimitiveKind, Span, Type};
use ordered_float::OrderedFloat;

/// Compiles expressions against a type system and one method's environment.
pub struct ExprCompiler<'a> {
    types: &'a TypeSystem,
    env: &'a mut OperandEnvironment,
}

impl<'a> ExprCompiler<'a> {
    pub fn new(types: &'a TypeSystem, env: &'a mut OperandEnvironment) -> Self {
        Self { types, env }
    }

    #[inline]
    pub fn types(&self) -> &'a TypeSystem {
        self.types
    }

    #[inline]
    pub fn env(&mut self) -> &mut OperandEnvironment {
        &mut *self.env
    }

    // =========================================================================
    // Typing
    // =========================================================================

    /// Static type of `expr`. Pure: emits nothing and reports nothing.
    pub fn type_of(&self, expr: &Expression) -> Type {
        match &expr.kind {
            ExprKind::Literal(literal) => literal.ty(),
            ExprKind::Binary { op, left, right } => self.binary_type(*op, left, right),
            ExprKind::Comparison { .. } => Type::BOOLEAN,
            ExprKind::Logical { left, right, .. } => self.logical_type(left, right),
            ExprKind::Unary { op: UnaryOp::Not, .. } => Type::BOOLEAN,
            ExprKind::Unary { op: UnaryOp::Neg, operand } => self.negation_type(operand),
            ExprKind::Increment { name, .. } => self.increment_type(name),
            ExprKind::Variable(name) | ExprKind::Assign { name, .. } => self.variable_type(name),
            ExprKind::FieldRead { target, name } | ExprKind::FieldWrite { target, name, .. } => {
                self.field_type(target, name)
            }
            ExprKind::Call { target, name, arguments } => {
                self.call_type(target, name, arguments, expr.span)
            }
            ExprKind::Construct { class, arguments } => {
                self.construct_type(class, arguments, expr.span)
            }
            ExprKind::Try { body, catch_type } => self.try_type(body, catch_type.as_ref()),
            ExprKind::EnumConstant { enumeration, key } => self.enum_type(enumeration, key),
            ExprKind::Concat(_) => Type::string(),
            ExprKind::This => self.env.this_type().cloned().unwrap_or(Type::Null),
        }
    }

    /// Whether `expr` has a native branch-producing form.
    pub fn is_condition(&self, expr: &Expression) -> bool {
        match &expr.kind {
            ExprKind::Comparison { .. }
            | ExprKind::Literal(Literal::Boolean(_))
            | ExprKind::Unary { op: UnaryOp::Not, .. } => true,
            ExprKind::Logical { left, right, .. } => {
                self.is_condition(left) && self.is_condition(right)
            }
            _ => false,
        }
    }

    // =========================================================================
    // Consumption contexts
    // =========================================================================

    /// Compiles `expr` leaving its value on the stack.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self, expr: &Expression) -> Code {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(literal) => self.compile_literal(literal),
            ExprKind::Binary { op, left, right } => self.compile_binary(*op, left, right, expr),
            ExprKind::Comparison { .. } | ExprKind::Unary { op: UnaryOp::Not, .. } => {
                self.materialize(expr)
            }
            ExprKind::Logical { op, left, right } => self.compile_logical(*op, left, right, span),
            ExprKind::Unary { op: UnaryOp::Neg, operand } => self.compile_negation(operand, span),
            ExprKind::Increment { name, delta, prefix } => {
                self.compile_increment(name, *delta, *prefix, true, span)
            }
            ExprKind::Variable(name) => self.compile_variable(name, span),
            ExprKind::Assign { name, value } => self.compile_assign(name, value, true, span),
            ExprKind::FieldRead { target, name } => self.compile_field_read(target, name, span),
            ExprKind::FieldWrite { target, name, value } => {
                self.compile_field_write(target, name, value, true, span)
            }
            ExprKind::Call { target, name, arguments } => {
                self.compile_call(target, name, arguments, span)
            }
            ExprKind::Construct { class, arguments } => {
                self.compile_construct(class, arguments, span)
            }
            ExprKind::Try { body, catch_type } => self.compile_try(body, catch_type.as_ref(), span),
            ExprKind::EnumConstant { enumeration, key } => {
                self.compile_enum_constant(enumeration, key, span)
            }
            ExprKind::Concat(parts) => {
                let parts: Vec<&Expression> = parts.iter().collect();
                self.compile_concat(&parts, span)
            }
            ExprKind::This => self.load_this(span),
        }
    }

    /// Compiles `expr` and converts its value to `target`, reporting a
    /// mismatch when the value does not conform.
    pub fn compile_to(&mut self, expr: &Expression, target: &Type) -> Code {
        let found = self.type_of(expr);
        let mut code = self.compile(expr);
        code.append(self.coerce(&found, target, expr.span));
        code
    }

    /// Jumps to `on_true` or `on_false` by the truth of `expr`.
    ///
    /// The returned code never falls through and leaves the operand stack
    /// as it found it.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_condition(&mut self, expr: &Expression, on_true: Label, on_false: Label) -> Code {
        match &expr.kind {
            ExprKind::Literal(Literal::Boolean(value)) => {
                Code::from(Instruction::goto(if *value { on_true } else { on_false }))
            }
            ExprKind::Comparison { first, rest } => {
                self.compare_chain(first, rest, on_true, on_false, expr.span)
            }
            ExprKind::Logical { op, left, right } => {
                self.logical_condition(*op, left, right, on_true, on_false)
            }
            ExprKind::Unary { op: UnaryOp::Not, operand } => {
                self.compile_condition(operand, on_false, on_true)
            }
            ExprKind::Try { body, catch_type } => {
                self.try_condition(body, catch_type.as_ref(), on_true, on_false, expr.span)
            }
            _ => {
                let ty = self.type_of(expr);
                let mut code = self.compile(expr);
                code.append(self.truth_jump(&ty, true, on_true));
                code.push(Instruction::goto(on_false));
                code
            }
        }
    }

    /// Compiles `expr` for its side effects only.
    pub fn compile_discard(&mut self, expr: &Expression) -> Code {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Increment { name, delta, prefix } => {
                self.compile_increment(name, *delta, *prefix, false, span)
            }
            ExprKind::Assign { name, value } => self.compile_assign(name, value, false, span),
            ExprKind::FieldWrite { target, name, value } => {
                self.compile_field_write(target, name, value, false, span)
            }
            ExprKind::Try { body, catch_type } => {
                self.try_discard(body, catch_type.as_ref(), span)
            }
            _ => {
                let depth = self.env.stack_depth();
                let code = self.compile(expr);
                self.discard_to(code, depth)
            }
        }
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    /// Converts the value on top of the stack from `found` to `target`.
    pub(crate) fn coerce(&mut self, found: &Type, target: &Type, span: Span) -> Code {
        if !self.types.is_assignable(found, target) {
            let mut code = Code::error(CompilationError::type_mismatch(
                span,
                format!("incompatible types: `{found}` cannot be converted to `{target}`"),
            ));
            code.append(self.replace_top(found, target));
            return code;
        }
        match self.types.convert(found, target) {
            Ok(instructions) => {
                if !found.is_void() {
                    self.env.pop();
                }
                self.env.push(target.clone());
                Code::from(instructions)
            }
            Err(error) => {
                let mut code = Code::error(error);
                code.append(self.replace_top(found, target));
                code
            }
        }
    }

    /// Replaces the top value, of type `found`, with the zero of `target`.
    fn replace_top(&mut self, found: &Type, target: &Type) -> Code {
        let mut code = Code::new();
        code.push_opt(Instruction::pop(found.width()));
        code.push_opt(Instruction::zero(target));
        if !found.is_void() {
            self.env.pop();
        }
        self.env.push(target.clone());
        code
    }

    /// Pops operand values until the stack is back at `depth`.
    pub(crate) fn discard_to(&mut self, mut code: Code, depth: usize) -> Code {
        while self.env.stack_depth() > depth {
            if let Some(ty) = self.env.pop() {
                code.push_opt(Instruction::pop(ty.width()));
            }
        }
        code
    }

    /// Discards everything above `depth` and pushes `null` for a result
    /// that could not be computed.
    fn placeholder(&mut self, code: Code, depth: usize) -> Code {
        let mut code = self.discard_to(code, depth);
        code.push(Instruction::AConstNull);
        self.env.push(Type::Null);
        code
    }

    /// Value form of a branch-producing expression: `1` or `0`.
    fn materialize(&mut self, expr: &Expression) -> Code {
        let on_true = self.env.new_label();
        let on_false = self.env.new_label();
        let end = self.env.new_label();
        let mut code = self.compile_condition(expr, on_true, on_false);
        code.label(on_true)
            .push(Instruction::IConst(1))
            .push(Instruction::goto(end))
            .label(on_false)
            .push(Instruction::IConst(0))
            .label(end);
        self.env.push(Type::BOOLEAN);
        code
    }

    /// Consumes a value of `ty` and jumps to `target` when its truth equals
    /// `when`. Zero and `null` are false; everything else is true.
    ///
    /// References are never unboxed here, so a non-null `Boolean` holding
    /// `false` is still true.
    pub(crate) fn truth_jump(&mut self, ty: &Type, when: bool, target: Label) -> Code {
        let mut code = Code::new();
        let ty = ty.unwrap_constant();
        if ty.is_void() {
            if !when {
                code.push(Instruction::goto(target));
            }
            return code;
        }
        let condition = match ValueKind::of(ty) {
            ValueKind::Int => Condition::Ne,
            ValueKind::Long => {
                code.push(Instruction::LConst(0)).push(Instruction::LCmp);
                self.compare_against_zero(ty);
                Condition::Ne
            }
            ValueKind::Double => {
                code.push(Instruction::DConst(OrderedFloat(0.0)))
                    .push(Instruction::DCmpL);
                self.compare_against_zero(ty);
                Condition::Ne
            }
            ValueKind::Reference => Condition::NonNull,
        };
        code.push(Instruction::jump(if when { condition } else { condition.negate() }, target));
        self.env.pop();
        code
    }

    /// Stack effect of pushing a wide zero and comparing it with the top.
    fn compare_against_zero(&mut self, ty: &Type) {
        self.env.push(ty.clone());
        self.env.pop_n(2);
        self.env.push(Type::INT);
    }

    /// Pushes `this`, or a `null` stand-in with a diagnostic in static
    /// context.
    pub(crate) fn load_this(&mut self, span: Span) -> Code {
        match self.env.this_type().cloned() {
            Some(this) => {
                self.env.push(this.clone());
                Code::from(Instruction::load(&this, 0))
            }
            None => {
                self.env.push(Type::Null);
                let mut code = Code::error(CompilationError::structural(
                    span,
                    "`this` cannot be referenced from a static context",
                ));
                code.push(Instruction::AConstNull);
                code
            }
        }
    }

    /// Numeric kind of a primitive or box type.
    pub(crate) fn numeric_kind(&self, ty: &Type) -> Option<PrimitiveKind> {
        let kind = ty.primitive().or_else(|| self.types.unboxed(ty))?;
        kind.is_numeric().then_some(kind)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::options::CompilerOptions;
    use kiln_core::{ClassInfo, EnumCapabilities, MemberFlags};

    pub const OWNER: &str = "demo.Calc";

    /// A type system with a small user class and an enumeration.
    pub fn types() -> TypeSystem {
        let mut types = TypeSystem::new();
        types.register(
            ClassInfo::class(OWNER)
                .with_method("expensive", vec![], Type::BOOLEAN, MemberFlags::PUBLIC)
                .with_method("sideEffect", vec![], Type::VOID, MemberFlags::PUBLIC)
                .with_method("method", vec![Type::string()], Type::VOID, MemberFlags::PUBLIC)
                .with_method(
                    "twice",
                    vec![Type::DOUBLE],
                    Type::DOUBLE,
                    MemberFlags::PUBLIC | MemberFlags::STATIC,
                )
                .with_method(
                    "countdown",
                    vec![Type::INT, Type::LONG],
                    Type::LONG,
                    MemberFlags::PUBLIC | MemberFlags::STATIC,
                )
                .with_field("count", Type::INT, MemberFlags::PUBLIC)
                .with_field("label", Type::string(), MemberFlags::PUBLIC | MemberFlags::STATIC),
        );
        types.register(ClassInfo::enumeration("demo.Color", &["RED", "GREEN"]));
        types.register(
            ClassInfo::enumeration("demo.Level", &["LOW", "HIGH"])
                .with_capabilities(EnumCapabilities::DEFAULT),
        );
        types.register(ClassInfo::class("demo.Plain").with_constructor(vec![]));
        types
    }

    pub fn env() -> OperandEnvironment {
        OperandEnvironment::new(Type::reference(OWNER), false, CompilerOptions::default())
    }

    pub fn static_env() -> OperandEnvironment {
        OperandEnvironment::new(Type::reference(OWNER), true, CompilerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::bytecode::Opcode;
    use pretty_assertions::assert_eq;

    #[test]
    fn value_of_a_condition_is_materialized() {
        let types = types();
        let mut env = env();
        let expr = Expression::not(Expression::boolean(false));
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(env.stack_depth(), 1);
        assert_eq!(code.count(Opcode::IConst1), 1);
        assert_eq!(code.count(Opcode::IConst0), 1);
    }

    #[test]
    fn condition_leaves_the_stack_alone() {
        let types = types();
        let mut env = env();
        env.declare("x", Type::DOUBLE, Span::default()).unwrap();
        let (t, f) = (env.new_label(), env.new_label());
        let code = ExprCompiler::new(&types, &mut env).compile_condition(&Expression::var("x"), t, f);
        assert_eq!(env.stack_depth(), 0);
        assert!(code.ends_abruptly());
        assert_eq!(code.count(Opcode::DCmpL), 1);
    }

    #[test]
    fn discard_pops_the_value() {
        let types = types();
        let mut env = env();
        let code = ExprCompiler::new(&types, &mut env).compile_discard(&Expression::long(3));
        assert_eq!(env.stack_depth(), 0);
        assert_eq!(code.opcodes(), vec![Opcode::Ldc2W, Opcode::Pop2]);
    }

    #[test]
    fn mismatched_coercion_reports_and_keeps_the_stack_typed() {
        let types = types();
        let mut env = env();
        let code = ExprCompiler::new(&types, &mut env).compile_to(&Expression::boolean(true), &Type::string());
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(env.peek(), Some(&Type::string()));
        assert_eq!(code.opcodes(), vec![Opcode::IConst1, Opcode::Pop, Opcode::AConstNull]);
    }

    #[test]
    fn this_is_unavailable_in_static_context() {
        let types = types();
        let mut env = static_env();
        let code = ExprCompiler::new(&types, &mut env).compile(&Expression::this());
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(env.peek(), Some(&Type::Null));
    }
}
