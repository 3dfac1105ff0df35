//! Kiln: the compiler core of a statically-typed, class-based language
//! targeting JVM-style class files.
//!
//! A [`Unit`] gathers class declarations and compiles them together in two
//! passes: every class is declared first, then every body is compiled.
//! Either every class compiles cleanly or the unit yields all of its
//! [`Diagnostics`] and no output.
//!
//! ```ignore
//! use kiln::prelude::*;
//!
//! let classes = Unit::new()
//!     .with_class(ClassDecl::class("demo.Hello"))
//!     .compile()?;
//! ```

pub use kiln_compiler as compiler;
pub use kiln_core as core;

use kiln_compiler::ast::ClassDecl;
use kiln_compiler::{
    ClassLoader, CompilationPass, CompiledClass, CompilerOptions, RegistrationPass, TypeSystem,
};
use kiln_core::Diagnostics;

pub mod prelude {
    pub use crate::Unit;
    pub use kiln_compiler::ast::*;
    pub use kiln_compiler::bytecode::{Code, Instruction, Opcode};
    pub use kiln_compiler::{
        ClassLoader, CompiledClass, CompiledMethod, CompilerOptions, PlatformLoader, TypeSystem,
    };
    pub use kiln_core::{
        ClassFlags, ClassInfo, CompilationError, Diagnostics, EnumCapabilities, MemberFlags, Span,
        Type,
    };
}

/// A compilation unit: the classes compiled together.
pub struct Unit {
    types: TypeSystem,
    options: CompilerOptions,
    classes: Vec<ClassDecl>,
    loader: Option<Box<dyn ClassLoader>>,
}

impl Default for Unit {
    fn default() -> Self {
        Self::new()
    }
}

impl Unit {
    /// An empty unit over the platform classes.
    pub fn new() -> Self {
        Self::with_types(TypeSystem::new())
    }

    /// An empty unit over a prepared type system, e.g. one holding
    /// previously compiled classes.
    pub fn with_types(types: TypeSystem) -> Self {
        Self {
            types,
            options: CompilerOptions::default(),
            classes: Vec::new(),
            loader: None,
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Classes the unit refers to but does not declare are loaded from
    /// `loader`.
    pub fn with_loader(mut self, loader: impl ClassLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn with_class(mut self, class: ClassDecl) -> Self {
        self.classes.push(class);
        self
    }

    pub fn add_class(&mut self, class: ClassDecl) -> &mut Self {
        self.classes.push(class);
        self
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles every class of the unit.
    ///
    /// Returns the compiled classes in declaration order, or every
    /// diagnostic of the unit when there is at least one.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(self) -> Result<Vec<CompiledClass>, Diagnostics> {
        self.compile_with_types().map(|(classes, _)| classes)
    }

    /// Like [`compile`](Self::compile), also handing back the type system
    /// holding the unit's classes for later units to build on.
    pub fn compile_with_types(self) -> Result<(Vec<CompiledClass>, TypeSystem), Diagnostics> {
        let Unit { mut types, options, mut classes, loader } = self;
        let _span = tracing::debug_span!("unit", classes = classes.len()).entered();

        let registered = RegistrationPass::new(&mut types, loader.as_deref()).run(&mut classes);
        let compiled = CompilationPass::new(&types, &options).run(&classes);
        tracing::debug!(
            classes = registered.classes_registered,
            errors = registered.errors.len() + compiled.errors.len(),
            "compiled unit"
        );

        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(registered.errors);
        diagnostics.extend(compiled.errors);
        if diagnostics.is_empty() {
            Ok((compiled.classes, types))
        } else {
            Err(diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_unit_compiles_to_nothing() {
        assert_eq!(Unit::new().compile(), Ok(vec![]));
    }

    #[test]
    fn diagnostics_of_both_passes_are_reported_together() {
        let result = Unit::new()
            .with_class(ClassDecl::class("demo.A").with_super(Type::reference("demo.Missing")).at(1, 1))
            .with_class(
                ClassDecl::class("demo.B").with_method(
                    MethodDecl::new("f", vec![], Type::VOID)
                        .with_body(vec![Statement::expr(Expression::var("x").at(3, 9))]),
                ),
            )
            .compile();
        let diagnostics = result.unwrap_err();
        assert_eq!(
            diagnostics.to_string(),
            "line 1:1 unknown type `demo.Missing`.\nline 3:9 unknown variable `x`.\n"
        );
    }

    #[test]
    fn compiled_types_carry_over_to_the_next_unit() {
        let (_, types) = Unit::new()
            .with_class(ClassDecl::class("demo.Base"))
            .compile_with_types()
            .unwrap();
        let classes = Unit::with_types(types)
            .with_class(ClassDecl::class("demo.Derived").with_super(Type::reference("demo.Base")))
            .compile()
            .unwrap();
        assert_eq!(classes.len(), 1);
    }
}
