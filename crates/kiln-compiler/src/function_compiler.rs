//! Per-method driver.
//!
//! [`FunctionCompiler`] compiles one method, constructor or static
//! initialiser of a declared class into a [`CompiledMethod`]:
//! - parameters are declared in slots after `this`
//! - the body's entry label and [`Frame`] are recorded for tail calls
//! - the body goes through the [`StmtCompiler`]
//! - return paths are checked and void bodies get an implicit `RETURN`
//! - max-stack and max-locals come from the [`OperandEnvironment`]
//!
//! Constructors first call the superclass constructor, then run the
//! instance field initialisers in declaration order, then the body.

use crate::ast::{ClassDecl, ConstructorDecl, Expression, FieldTarget, MethodDecl, Parameter};
use crate::bytecode::{Code, Instruction, InvokeKind, MemberRef};
use crate::env::{Frame, OperandEnvironment};
use crate::expr::ExprCompiler;
use crate::options::CompilerOptions;
use crate::overload::{MatchResult, OverloadResolver};
use crate::passes::enums::{self, NAME_FIELD, ORDINAL_FIELD};
use crate::return_checker::ReturnChecker;
use crate::stmt::StmtCompiler;
use crate::type_system::TypeSystem;
use kiln_core::{CallKind, CompilationError, Function, MemberFlags, Signature, Span, Type, join_types, names};

/// A method body ready for the class-file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMethod {
    pub signature: Signature,
    pub flags: MemberFlags,
    /// Empty for abstract methods.
    pub code: Code,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl CompiledMethod {
    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(MemberFlags::ABSTRACT)
    }

    pub fn diagnostics(&self) -> &[CompilationError] {
        self.code.diagnostics()
    }
}

/// Compiles the bodies of one declared class.
pub struct FunctionCompiler<'a> {
    types: &'a TypeSystem,
    options: &'a CompilerOptions,
    class: &'a ClassDecl,
    class_type: Type,
}

impl<'a> FunctionCompiler<'a> {
    pub fn new(types: &'a TypeSystem, options: &'a CompilerOptions, class: &'a ClassDecl) -> Self {
        Self { types, options, class, class_type: class.as_type() }
    }

    fn environment(&self, is_static: bool) -> OperandEnvironment {
        OperandEnvironment::new(self.class_type.clone(), is_static, self.options.clone())
    }

    /// Declares the parameters in order, returning their slots.
    fn declare_parameters(
        env: &mut OperandEnvironment,
        parameters: &[Parameter],
        span: Span,
        code: &mut Code,
    ) -> Vec<u16> {
        parameters
            .iter()
            .map(|p| match env.declare(&p.name, p.ty.clone(), span) {
                Ok(slot) => slot,
                Err(error) => {
                    code.diagnostic(error);
                    env.allocate_temp(&p.ty)
                }
            })
            .collect()
    }

    fn finish(signature: Signature, flags: MemberFlags, mut code: Code, env: &mut OperandEnvironment) -> CompiledMethod {
        for error in env.take_diagnostics() {
            code.diagnostic(error);
        }
        code.fold_trivial_jumps();
        CompiledMethod {
            signature,
            flags,
            code,
            max_stack: env.max_stack(),
            max_locals: env.max_locals(),
        }
    }

    // =========================================================================
    // Methods
    // =========================================================================

    /// Compiles a declared method. `function` is its registered form.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_method(&self, method: &MethodDecl, function: &Function) -> CompiledMethod {
        let _span = tracing::debug_span!("method", name = %method.name).entered();
        let signature = function.signature.clone();

        let Some(body) = &method.body else {
            let mut code = Code::new();
            if !self.class.is_abstract() && !method.flags.contains(MemberFlags::ABSTRACT) {
                code.diagnostic(CompilationError::structural(
                    method.span,
                    format!("method `{signature}` has no body and is not abstract"),
                ));
            }
            return CompiledMethod {
                signature,
                flags: function.flags | MemberFlags::ABSTRACT,
                code,
                max_stack: 0,
                max_locals: 0,
            };
        };
        tracing::debug!(method = %signature.display_name(), "compiling method body");

        let is_static = function.is_static();
        let mut env = self.environment(is_static);
        let mut code = Code::new();
        let parameter_slots = Self::declare_parameters(&mut env, &method.parameters, method.span, &mut code);
        let entry = env.new_label();
        env.set_frame(Frame { signature: signature.clone(), entry, parameter_slots, is_static });
        code.label(entry);

        let return_type = signature.return_type.clone();
        code.append(StmtCompiler::new(self.types, &mut env, return_type.clone()).compile_body(body));

        if return_type.is_void() {
            if code.falls_through() {
                code.push(Instruction::ReturnVoid);
            }
        } else if !ReturnChecker::new().all_paths_return(body) {
            code.diagnostic(CompilationError::structural(method.span, "missing return statement"));
        }
        Self::finish(signature, function.flags, code, &mut env)
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Compiles a declared constructor.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_constructor(&self, constructor: &ConstructorDecl, function: &Function) -> CompiledMethod {
        let _span = tracing::debug_span!("constructor", class = %self.class.name).entered();
        let signature = function.signature.clone();
        let mut env = self.environment(false);
        let mut code = Code::new();
        let parameter_slots =
            Self::declare_parameters(&mut env, &constructor.parameters, constructor.span, &mut code);
        let entry = env.new_label();
        env.set_frame(Frame { signature: signature.clone(), entry, parameter_slots, is_static: false });
        code.label(entry);

        code.append(self.super_call(&mut env, &constructor.super_arguments, constructor.span));
        code.append(self.field_initialisers(&mut env, false));
        code.append(StmtCompiler::new(self.types, &mut env, Type::VOID).compile_body(&constructor.body));
        if code.falls_through() {
            code.push(Instruction::ReturnVoid);
        }
        Self::finish(signature, function.flags, code, &mut env)
    }

    /// `this.super(arguments)`: resolves the superclass constructor.
    fn super_call(&self, env: &mut OperandEnvironment, arguments: &[Expression], span: Span) -> Code {
        let super_type = self
            .types
            .reflect(&self.class_type)
            .and_then(|info| info.super_class.clone())
            .unwrap_or_else(Type::object);
        let mut expr = ExprCompiler::new(self.types, env);
        let args: Vec<Type> = arguments.iter().map(|a| expr.type_of(a)).collect();
        let candidates = self.types.constructors(&super_type);

        let found = match OverloadResolver::new(self.types).resolve(&candidates, &args) {
            MatchResult::Success(found) => found,
            MatchResult::Ambiguous(_) => {
                return Code::error(CompilationError::AmbiguousCall {
                    owner: super_type.name(),
                    name: names::CONSTRUCTOR.to_string(),
                    span,
                });
            }
            MatchResult::Failed => {
                return Code::error(CompilationError::UnresolvedCall {
                    kind: CallKind::Constructor,
                    name: super_type.name(),
                    args: join_types(&args),
                    span,
                });
            }
        };

        let mut code = expr.load_this(span);
        code.append(expr.compile_arguments(&found, arguments));
        let owner = found.method.owner_class();
        code.push(Instruction::invoke(InvokeKind::Special, &owner, names::CONSTRUCTOR, found.method.descriptor()));
        let env = expr.env();
        env.pop_n(arguments.len() + 1);
        code
    }

    /// Field initialisers of the instance or static fields, in declaration
    /// order.
    fn field_initialisers(&self, env: &mut OperandEnvironment, statics: bool) -> Code {
        let target = if statics {
            FieldTarget::Static(self.class_type.clone())
        } else {
            FieldTarget::This
        };
        let mut expr = ExprCompiler::new(self.types, env);
        self.class
            .fields
            .iter()
            .filter(|field| field.is_static() == statics)
            .filter_map(|field| {
                let init = field.initializer.as_ref()?;
                Some(expr.compile_field_write(&target, &field.name, init, false, field.span))
            })
            .collect()
    }

    /// The private `<init>(String, int)` of an enumeration.
    pub fn compile_enum_constructor(&self) -> CompiledMethod {
        let signature = Signature::constructor(self.class_type.clone(), vec![Type::string(), Type::INT]);
        let mut env = self.environment(false);
        let mut code = Code::new();
        let name = env.allocate_temp(&Type::string());
        let ordinal = env.allocate_temp(&Type::INT);
        let owner = self.class.name.as_str();

        code.push(Instruction::load(&self.class_type, 0))
            .push(Instruction::invoke(InvokeKind::Special, names::OBJECT, names::CONSTRUCTOR, "()V"))
            .push(Instruction::load(&self.class_type, 0))
            .push(Instruction::load(&Type::string(), name))
            .push(Instruction::PutField(MemberRef::new(owner, NAME_FIELD, Type::string().descriptor())))
            .push(Instruction::load(&self.class_type, 0))
            .push(Instruction::load(&Type::INT, ordinal))
            .push(Instruction::PutField(MemberRef::new(owner, ORDINAL_FIELD, Type::INT.descriptor())));
        env.push(self.class_type.clone());
        env.push(Type::INT);
        env.pop_n(2);

        let entry = env.new_label();
        env.set_frame(Frame { signature: signature.clone(), entry, parameter_slots: vec![name, ordinal], is_static: false });
        code.append(self.field_initialisers(&mut env, false));
        code.push(Instruction::ReturnVoid);
        Self::finish(signature, MemberFlags::PRIVATE | MemberFlags::SYNTHETIC, code, &mut env)
    }

    // =========================================================================
    // Static initialiser
    // =========================================================================

    /// `<clinit>`, when the class has enumeration constants or static field
    /// initialisers.
    pub fn compile_static_init(&self) -> Option<CompiledMethod> {
        let has_static_inits =
            self.class.fields.iter().any(|f| f.is_static() && f.initializer.is_some());
        if !self.class.is_enum() && !has_static_inits {
            return None;
        }
        let signature = Signature::new(self.class_type.clone(), names::STATIC_INIT, vec![], Type::VOID);
        let mut env = self.environment(true);
        let entry = env.new_label();
        env.set_frame(Frame { signature: signature.clone(), entry, parameter_slots: Vec::new(), is_static: true });

        let mut code = Code::new();
        if self.class.is_enum() {
            code.append(enums::initialise_constants(self.class, &mut env));
        }
        code.append(self.field_initialisers(&mut env, true));
        code.push(Instruction::ReturnVoid);
        Some(Self::finish(signature, MemberFlags::STATIC | MemberFlags::SYNTHETIC, code, &mut env))
    }
}
