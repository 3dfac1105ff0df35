//! Compilation Pass (Pass 2) - compile every body of the unit.
//!
//! Runs after [`RegistrationPass`](super::RegistrationPass) has declared
//! every class, so the type system is complete and read-only here. Each
//! class yields a [`CompiledClass`] holding its reflection view and one
//! [`CompiledMethod`] per method, constructor and generated member.
//!
//! Diagnostics are moved out of the method bodies into
//! [`CompilationOutput::errors`] in class order.

use crate::ast::ClassDecl;
use crate::function_compiler::{CompiledMethod, FunctionCompiler};
use crate::options::CompilerOptions;
use crate::passes::enums;
use crate::passes::registration::{constructor_function, method_function};
use crate::type_system::TypeSystem;
use kiln_core::{ClassInfo, CompilationError, TypeHash};
use rustc_hash::FxHashSet;

/// A class ready for the class-file writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClass {
    pub info: ClassInfo,
    pub methods: Vec<CompiledMethod>,
}

impl CompiledClass {
    pub fn method(&self, name: &str) -> Option<&CompiledMethod> {
        self.methods.iter().find(|m| m.signature.name == name)
    }
}

/// Output of the compilation pass.
#[derive(Debug, Default)]
pub struct CompilationOutput {
    pub classes: Vec<CompiledClass>,
    pub errors: Vec<CompilationError>,
}

/// Pass 2: compile method, constructor and initialiser bodies.
pub struct CompilationPass<'a> {
    types: &'a TypeSystem,
    options: &'a CompilerOptions,
}

impl<'a> CompilationPass<'a> {
    pub fn new(types: &'a TypeSystem, options: &'a CompilerOptions) -> Self {
        Self { types, options }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self, classes: &[ClassDecl]) -> CompilationOutput {
        let mut output = CompilationOutput::default();
        for class in classes {
            let mut methods = self.compile_class(class);
            for method in &mut methods {
                output.errors.extend(method.code.take_diagnostics());
            }
            match self.types.class(&class.name) {
                Some(info) => output.classes.push(CompiledClass { info: info.clone(), methods }),
                None => output
                    .errors
                    .push(CompilationError::internal(format!("class `{}` was never registered", class.name))),
            }
        }
        output
    }

    fn compile_class(&self, class: &ClassDecl) -> Vec<CompiledMethod> {
        let _span = tracing::debug_span!("class", name = %class.name).entered();
        let compiler = FunctionCompiler::new(self.types, self.options, class);
        let owner = class.as_type();
        let mut methods = Vec::new();
        // Duplicates were reported during registration.
        let mut seen: FxHashSet<TypeHash> = FxHashSet::default();

        if class.is_enum() {
            methods.push(compiler.compile_enum_constructor());
        }
        for constructor in &class.constructors {
            let function = constructor_function(&owner, constructor);
            if seen.insert(function.signature.hash()) {
                methods.push(compiler.compile_constructor(constructor, &function));
            }
        }
        for method in &class.methods {
            let function = method_function(&owner, method);
            if seen.insert(function.signature.hash()) {
                methods.push(compiler.compile_method(method, &function));
            }
        }
        if class.is_enum() {
            methods.extend(enums::generated_methods(class));
        }
        methods.extend(compiler.compile_static_init());
        methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, MethodDecl, Parameter, Statement};
    use crate::passes::RegistrationPass;
    use kiln_core::{EnumCapabilities, MemberFlags, Type, names};
    use pretty_assertions::assert_eq;

    fn compile(mut classes: Vec<ClassDecl>) -> CompilationOutput {
        let mut types = TypeSystem::new();
        let registered = RegistrationPass::new(&mut types, None).run(&mut classes);
        assert_eq!(registered.errors, vec![]);
        let options = CompilerOptions::default();
        CompilationPass::new(&types, &options).run(&classes)
    }

    #[test]
    fn compiles_constructors_and_methods() {
        let output = compile(vec![ClassDecl::class("demo.A").with_method(
            MethodDecl::new("id", vec![Parameter::new("x", Type::INT)], Type::INT)
                .with_body(vec![Statement::ret(Expression::var("x"))]),
        )]);
        assert_eq!(output.errors, vec![]);
        let class = &output.classes[0];
        let names: Vec<&str> = class.methods.iter().map(|m| m.signature.name.as_str()).collect();
        assert_eq!(names, vec![names::CONSTRUCTOR, "id"]);
        assert_eq!(class.method("id").map(|m| m.max_locals), Some(2));
    }

    #[test]
    fn body_errors_are_collected_in_class_order() {
        let broken = |name: &str| {
            ClassDecl::class(name).with_method(
                MethodDecl::new("f", vec![], Type::string())
                    .with_body(vec![Statement::ret(Expression::var("nope"))]),
            )
        };
        let output = compile(vec![broken("demo.A"), broken("demo.B")]);
        assert_eq!(output.errors.len(), 2);
        assert!(output.classes.iter().all(|c| c.methods.iter().all(|m| m.diagnostics().is_empty())));
    }

    #[test]
    fn enumerations_compile_their_generated_members() {
        let output = compile(vec![
            ClassDecl::enumeration("demo.Color", &["RED", "GREEN"])
                .with_capabilities(EnumCapabilities::DEFAULT | EnumCapabilities::ORDERED),
        ]);
        assert_eq!(output.errors, vec![]);
        let class = &output.classes[0];
        for name in ["RED", "GREEN", "name", "ordinal", enums::DEFAULT_METHOD, "compareTo", names::STATIC_INIT] {
            assert!(class.method(name).is_some(), "missing `{name}`");
        }
        assert!(class.method(names::CONSTRUCTOR).is_some_and(|m| m.flags.contains(MemberFlags::PRIVATE)));
    }

    #[test]
    fn abstract_methods_have_no_code() {
        let output = compile(vec![ClassDecl::interface("demo.Shape").with_method(MethodDecl::new(
            "area",
            vec![],
            Type::DOUBLE,
        ))]);
        assert_eq!(output.errors, vec![]);
        let area = output.classes[0].method("area").unwrap();
        assert!(area.is_abstract());
        assert!(area.code.is_empty());
    }
}
