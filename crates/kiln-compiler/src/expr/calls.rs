//! Method calls and object construction.
//!
//! A call is resolved from the static argument types before any code is
//! emitted, so the receiver can be loaded only when the chosen method needs
//! one. Resolution ends in one of three ways:
//! - a direct `invoke*` of the selected overload, arguments converted to its
//!   declared parameter types
//! - an indirect call site for the runtime dispatch cache, when the static
//!   types are too broad to pick an overload
//! - a diagnostic and a `null` placeholder

use super::ExprCompiler;
use crate::ast::{CallTarget, Expression};
use crate::bytecode::{Code, Instruction, InvokeKind, MemberRef};
use crate::overload::{Match, MatchResult, OverloadResolver, needs_dynamic_dispatch};
use crate::type_system::Method;
use kiln_core::{CallKind, ClassFlags, CompilationError, NameKind, Span, Type, join_types, names};

/// Outcome of resolving a call, computed without emitting code.
enum Resolution {
    Direct(Match),
    Dynamic,
    Unresolved(CompilationError),
}

impl<'a> ExprCompiler<'a> {
    fn call_receiver_type(&self, target: &CallTarget) -> Type {
        match target {
            CallTarget::Implicit | CallTarget::This => self.env.class_type().clone(),
            CallTarget::Instance(receiver) => self.types.boxed(&self.type_of(receiver)),
            CallTarget::Static(owner) => owner.clone(),
        }
    }

    fn resolve_call(
        &self,
        target: &CallTarget,
        name: &str,
        arguments: &[Expression],
        span: Span,
    ) -> Resolution {
        let receiver = self.call_receiver_type(target);
        let args: Vec<Type> = arguments.iter().map(|a| self.type_of(a)).collect();
        let mut candidates = self.types.methods(&receiver, name);
        if matches!(target, CallTarget::Static(_)) {
            candidates.retain(Method::is_static);
        }

        let result = OverloadResolver::new(self.types).resolve(&candidates, &args);
        let result = match result {
            MatchResult::Success(found) => return Resolution::Direct(found),
            other => other,
        };

        if self.env.options().dynamic_dispatch
            && needs_dynamic_dispatch(self.types, &receiver, &candidates, &args, &result)
        {
            return Resolution::Dynamic;
        }
        Resolution::Unresolved(match result {
            MatchResult::Ambiguous(_) => CompilationError::AmbiguousCall {
                owner: receiver.name(),
                name: name.to_string(),
                span,
            },
            _ => CompilationError::UnresolvedCall {
                kind: CallKind::Method,
                name: name.to_string(),
                args: join_types(&args),
                span,
            },
        })
    }

    pub(super) fn call_type(
        &self,
        target: &CallTarget,
        name: &str,
        arguments: &[Expression],
        span: Span,
    ) -> Type {
        match self.resolve_call(target, name, arguments, span) {
            Resolution::Direct(found) => found.return_type,
            Resolution::Dynamic => Type::object(),
            Resolution::Unresolved(_) => Type::Null,
        }
    }

    pub(super) fn compile_call(
        &mut self,
        target: &CallTarget,
        name: &str,
        arguments: &[Expression],
        span: Span,
    ) -> Code {
        let depth = self.env.stack_depth();
        match self.resolve_call(target, name, arguments, span) {
            Resolution::Direct(found) => self.direct_call(target, &found, arguments, depth, span),
            Resolution::Dynamic => self.dynamic_call(target, name, arguments, depth, span),
            Resolution::Unresolved(error) => {
                let mut code = Code::error(error);
                if let CallTarget::Instance(receiver) = target {
                    code.append(self.compile(receiver));
                }
                for argument in arguments {
                    code.append(self.compile(argument));
                }
                self.placeholder(code, depth)
            }
        }
    }

    /// Resolves a call for tail-call rewriting without emitting anything.
    pub(crate) fn resolve_direct(
        &self,
        target: &CallTarget,
        name: &str,
        arguments: &[Expression],
        span: Span,
    ) -> Option<Match> {
        match self.resolve_call(target, name, arguments, span) {
            Resolution::Direct(found) => Some(found),
            _ => None,
        }
    }

    /// Reports generic mismatches of `found` and compiles the arguments
    /// converted to its declared parameter types.
    pub(crate) fn compile_arguments(&mut self, found: &Match, arguments: &[Expression]) -> Code {
        let mut code = Code::new();
        for mismatch in &found.mismatches {
            let span = arguments.get(mismatch.position).map(|a| a.span).unwrap_or_default();
            code.diagnostic(CompilationError::GenericMismatch {
                expected: mismatch.expected.name(),
                found: mismatch.found.name(),
                span,
            });
        }
        for (argument, target) in arguments.iter().zip(found.conversion_targets()) {
            code.append(self.compile_to(argument, &target));
        }
        code
    }

    fn direct_call(
        &mut self,
        target: &CallTarget,
        found: &Match,
        arguments: &[Expression],
        depth: usize,
        span: Span,
    ) -> Code {
        let method = &found.method;
        let is_static = method.is_static();
        let mut code = match target {
            CallTarget::Instance(receiver) if is_static => self.compile_discard(receiver),
            CallTarget::Instance(receiver) => {
                let ty = self.type_of(receiver);
                let mut code = self.compile(receiver);
                if ty.primitive().is_some() {
                    let boxed = self.types.boxed(&ty);
                    code.append(self.coerce(&ty, &boxed, span));
                }
                code
            }
            CallTarget::Implicit | CallTarget::This if !is_static => self.load_this(span),
            _ => Code::new(),
        };

        code.append(self.compile_arguments(found, arguments));

        let owner = method.owner_class();
        let kind = if is_static {
            InvokeKind::Static
        } else if self.types.is_interface(&method.function.signature.owner) {
            InvokeKind::Interface
        } else if method.function.is_private() {
            InvokeKind::Special
        } else {
            InvokeKind::Virtual
        };
        code.push(Instruction::invoke(kind, &owner, method.name(), method.descriptor()));
        if let Some(class) = found.result_cast() {
            code.push(Instruction::check_cast(&class));
        }
        self.settle(depth, found.return_type.clone());
        code
    }

    fn dynamic_call(
        &mut self,
        target: &CallTarget,
        name: &str,
        arguments: &[Expression],
        depth: usize,
        span: Span,
    ) -> Code {
        let mut descriptor = String::from("(");
        let mut code = match target {
            CallTarget::Instance(receiver) => {
                let ty = self.type_of(receiver);
                let boxed = self.types.boxed(&ty);
                let mut code = self.compile(receiver);
                code.append(self.coerce(&ty, &boxed, span));
                descriptor.push_str(&boxed.descriptor());
                code
            }
            CallTarget::Implicit | CallTarget::This if !self.env.is_static() => {
                descriptor.push_str(&self.env.class_type().descriptor());
                self.load_this(span)
            }
            _ => Code::new(),
        };
        for argument in arguments {
            let ty = self.type_of(argument);
            code.append(self.compile(argument));
            if ty.is_void() {
                code.diagnostic(CompilationError::type_mismatch(
                    argument.span,
                    "`void` cannot be passed as an argument",
                ));
                continue;
            }
            descriptor.push_str(&ty.descriptor());
        }
        descriptor.push(')');
        descriptor.push_str(&Type::object().descriptor());

        tracing::debug!(name, %descriptor, "deferring call to the runtime dispatch cache");
        let options = self.env.options();
        let bootstrap = MemberRef::new(
            &options.bootstrap_owner,
            &options.bootstrap_name,
            options.bootstrap_descriptor(),
        );
        code.push(Instruction::InvokeDynamic { name: name.to_string(), descriptor, bootstrap });
        self.settle(depth, Type::object());
        code
    }

    /// Pops everything a call consumed and pushes its result.
    fn settle(&mut self, depth: usize, result: Type) {
        let consumed = self.env.stack_depth().saturating_sub(depth);
        self.env.pop_n(consumed);
        self.env.push(result);
    }

    // =========================================================================
    // Construction
    // =========================================================================

    fn resolve_construct(&self, class: &Type, arguments: &[Expression], span: Span) -> Resolution {
        let Some(info) = self.types.reflect(class) else {
            return Resolution::Unresolved(CompilationError::unresolved_name(
                span,
                NameKind::Type,
                class.name(),
            ));
        };
        if info.is_interface() || info.is_enum() || info.flags.contains(ClassFlags::ABSTRACT) {
            return Resolution::Unresolved(CompilationError::structural(
                span,
                format!("`{}` cannot be instantiated", info.name),
            ));
        }
        let args: Vec<Type> = arguments.iter().map(|a| self.type_of(a)).collect();
        let candidates = self.types.constructors(class);
        match OverloadResolver::new(self.types).resolve(&candidates, &args) {
            MatchResult::Success(found) => Resolution::Direct(found),
            MatchResult::Ambiguous(_) => Resolution::Unresolved(CompilationError::AmbiguousCall {
                owner: class.name(),
                name: names::CONSTRUCTOR.to_string(),
                span,
            }),
            MatchResult::Failed => Resolution::Unresolved(CompilationError::UnresolvedCall {
                kind: CallKind::Constructor,
                name: class.name(),
                args: join_types(&args),
                span,
            }),
        }
    }

    pub(super) fn construct_type(&self, class: &Type, arguments: &[Expression], span: Span) -> Type {
        match self.resolve_construct(class, arguments, span) {
            Resolution::Direct(_) => class.clone(),
            _ => Type::Null,
        }
    }

    pub(super) fn compile_construct(&mut self, class: &Type, arguments: &[Expression], span: Span) -> Code {
        let depth = self.env.stack_depth();
        let found = match self.resolve_construct(class, arguments, span) {
            Resolution::Direct(found) => found,
            Resolution::Unresolved(error) => {
                let mut code = Code::error(error);
                for argument in arguments {
                    code.append(self.compile(argument));
                }
                return self.placeholder(code, depth);
            }
            Resolution::Dynamic => return self.placeholder(Code::new(), depth),
        };

        let name = class.class_name().unwrap_or(names::OBJECT).to_string();
        let mut code = Code::new();
        code.push(Instruction::new_object(&name)).push(Instruction::Dup);
        self.env.push(class.clone());
        self.env.push(class.clone());
        code.append(self.compile_arguments(&found, arguments));
        code.push(Instruction::invoke(
            InvokeKind::Special,
            &name,
            names::CONSTRUCTOR,
            found.method.descriptor(),
        ));
        self.settle(depth, class.clone());
        code
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::ast::Expression;
    use crate::bytecode::{Instruction, InvokeKind, Opcode};
    use crate::expr::ExprCompiler;
    use crate::options::CompilerOptions;
    use crate::env::OperandEnvironment;
    use crate::type_system::TypeSystem;
    use kiln_core::{CallKind, ClassInfo, CompilationError, MemberFlags, Span, Type, names};
    use pretty_assertions::assert_eq;

    const SINK: &str = "demo.Sink";

    /// `demo.Sink` with `take(List<String>)` and two incomparable `pick`s.
    fn sink_types() -> TypeSystem {
        let mut types = types();
        let static_public = MemberFlags::PUBLIC | MemberFlags::STATIC;
        types.register(
            ClassInfo::class(SINK)
                .with_method(
                    "take",
                    vec![Type::parameterised(names::LIST, vec![Type::string()])],
                    Type::VOID,
                    static_public,
                )
                .with_method("pick", vec![Type::object(), Type::string()], Type::VOID, static_public)
                .with_method("pick", vec![Type::string(), Type::object()], Type::VOID, static_public),
        );
        types
    }

    #[test]
    fn int_argument_does_not_match_a_string_parameter() {
        let types = types();
        let mut env = env();
        let expr = Expression::call("method", vec![Expression::int(1)]).at(5, 9);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(
            code.diagnostics(),
            &[CompilationError::UnresolvedCall {
                kind: CallKind::Method,
                name: "method".to_string(),
                args: "int".to_string(),
                span: Span::point(5, 9),
            }]
        );
        assert_eq!(code.diagnostics()[0].render(), "line 5:9 method `method(int)` not found.");
        assert_eq!(env.peek(), Some(&Type::Null));
    }

    #[test]
    fn generic_mismatch_is_reported_and_the_call_still_emitted() {
        let types = sink_types();
        let mut env = env();
        let found = Type::parameterised(names::LIST, vec![Type::object()]);
        env.declare("items", found.clone(), Span::default()).unwrap();
        let expr = Expression::call_static(
            Type::reference(SINK),
            "take",
            vec![Expression::var("items").at(3, 14)],
        );
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(
            code.diagnostics(),
            &[CompilationError::GenericMismatch {
                expected: Type::parameterised(names::LIST, vec![Type::string()]).name(),
                found: found.name(),
                span: Span::point(3, 14),
            }]
        );
        assert!(code.diagnostics()[0].render().starts_with("line 3:14 mismatched types: expected `"));
        assert_eq!(code.opcodes(), vec![Opcode::ALoad, Opcode::InvokeStatic]);
        assert!(code.instructions().contains(&Instruction::invoke(
            InvokeKind::Static,
            SINK,
            "take",
            "(Ljava/util/List;)V",
        )));
        assert_eq!(env.stack_depth(), 0);
    }

    #[test]
    fn incomparable_overloads_render_an_ambiguous_call() {
        let types = sink_types();
        let mut env = env();
        let expr = Expression::call_static(
            Type::reference(SINK),
            "pick",
            vec![Expression::string("a"), Expression::string("b")],
        )
        .at(7, 5);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(
            code.diagnostics()[0].render(),
            "line 7:5 ambiguous call to method `demo.Sink.pick`."
        );
        assert_eq!(code.count(Opcode::InvokeStatic), 0);
        assert_eq!(env.peek(), Some(&Type::Null));
    }

    #[test]
    fn implicit_instance_call_loads_this_first() {
        let types = types();
        let mut env = env();
        let code = ExprCompiler::new(&types, &mut env).compile(&Expression::call("sideEffect", vec![]));
        assert_eq!(code.opcodes(), vec![Opcode::ALoad, Opcode::InvokeVirtual]);
        assert_eq!(env.stack_depth(), 0);
    }

    #[test]
    fn static_call_converts_arguments() {
        let types = types();
        let mut env = env();
        let expr = Expression::call_static(Type::reference(OWNER), "twice", vec![Expression::int(2)]);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.opcodes(), vec![Opcode::IConst2, Opcode::I2D, Opcode::InvokeStatic]);
        assert_eq!(env.peek(), Some(&Type::DOUBLE));
    }

    #[test]
    fn object_receiver_defers_to_the_dispatch_cache() {
        let types = types();
        let mut env = env();
        env.declare("o", Type::object(), Span::default()).unwrap();
        let expr = Expression::call_on(Expression::var("o"), "quack", vec![Expression::number(1.0)]);
        let mut compiler = ExprCompiler::new(&types, &mut env);
        assert_eq!(compiler.type_of(&expr), Type::object());
        let code = compiler.compile(&expr);
        assert!(code.diagnostics().is_empty());
        match code.instructions().last() {
            Some(Instruction::InvokeDynamic { name, descriptor, .. }) => {
                assert_eq!(name, "quack");
                assert_eq!(descriptor, "(Ljava/lang/Object;D)Ljava/lang/Object;");
            }
            other => panic!("expected an indirect call site, got {other:?}"),
        }
        assert_eq!(env.stack_depth(), 1);
    }

    #[test]
    fn dispatch_fallback_can_be_disabled() {
        let types = types();
        let mut env = OperandEnvironment::new(
            Type::reference(OWNER),
            false,
            CompilerOptions::default().with_dynamic_dispatch(false),
        );
        env.declare("o", Type::object(), Span::default()).unwrap();
        let expr = Expression::call_on(Expression::var("o"), "quack", vec![]);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.diagnostics().len(), 1);
        assert_eq!(code.count(Opcode::InvokeDynamic), 0);
    }

    #[test]
    fn construction_news_dups_and_initialises() {
        let types = types();
        let mut env = env();
        let expr = Expression::construct(Type::reference(names::STRING_BUILDER), vec![Expression::string("x")]);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.opcodes(), vec![Opcode::New, Opcode::Dup, Opcode::Ldc, Opcode::InvokeSpecial]);
        assert!(code.instructions().contains(&Instruction::invoke(
            InvokeKind::Special,
            names::STRING_BUILDER,
            names::CONSTRUCTOR,
            "(Ljava/lang/String;)V",
        )));
        assert_eq!(env.stack_depth(), 1);
        assert_eq!(env.max_stack(), 3);
    }

    #[test]
    fn enumerations_cannot_be_constructed() {
        let types = types();
        let mut env = env();
        let expr = Expression::construct(Type::reference("demo.Color"), vec![]);
        let code = ExprCompiler::new(&types, &mut env).compile(&expr);
        assert_eq!(code.diagnostics().len(), 1);
    }

    #[test]
    fn generic_result_is_cast_to_the_substituted_type() {
        let types = types();
        let mut env = env();
        let list = Type::parameterised(names::LIST, vec![Type::string()]);
        env.declare("items", list, Span::default()).unwrap();
        let expr = Expression::call_on(Expression::var("items"), "get", vec![Expression::int(0)]);
        let mut compiler = ExprCompiler::new(&types, &mut env);
        assert_eq!(compiler.type_of(&expr), Type::string());
        let code = compiler.compile(&expr);
        assert_eq!(
            code.opcodes(),
            vec![Opcode::ALoad, Opcode::IConst0, Opcode::InvokeInterface, Opcode::CheckCast]
        );
    }
}
