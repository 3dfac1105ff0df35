//! Registration Pass (Pass 1) - declare every class of the unit.
//!
//! Walks the class declarations and registers a [`ClassInfo`] for each one
//! in the [`TypeSystem`] before any body is compiled, so bodies may refer to
//! classes declared later in the unit.
//!
//! ## Responsibilities
//!
//! - Reject duplicate classes and duplicate member signatures
//! - Resolve superclasses and interfaces, importing foreign classes through
//!   the [`ClassLoader`]
//! - Detect circular inheritance
//! - Give classes without constructors an implicit no-argument one
//! - Declare the generated members of enumerations
//! - Check that final fields are initialised and that final classes and
//!   interfaces are not extended
//!
//! Errors are collected; a broken supertype degrades to `Object` so the
//! class can still be registered and its bodies checked.

use crate::ast::{ClassDecl, ConstructorDecl, MethodDecl};
use crate::passes::enums;
use crate::type_system::{ClassLoader, TypeSystem};
use kiln_core::{
    ClassFlags, ClassInfo, CompilationError, Field, Function, MemberFlags, NameKind, Signature, Span, Type,
    TypeHash,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Output of the registration pass.
#[derive(Debug, Default)]
pub struct RegistrationOutput {
    /// Number of classes registered.
    pub classes_registered: usize,
    /// Collected errors (compilation can continue with some errors).
    pub errors: Vec<CompilationError>,
}

/// Pass 1: register every class and its member signatures.
pub struct RegistrationPass<'a> {
    types: &'a mut TypeSystem,
    loader: Option<&'a dyn ClassLoader>,
    errors: Vec<CompilationError>,
}

/// The registered form of a declared method.
pub(crate) fn method_function(owner: &Type, method: &MethodDecl) -> Function {
    let mut flags = method.flags;
    if method.body.is_none() {
        flags |= MemberFlags::ABSTRACT;
    }
    let signature = Signature::new(owner.clone(), &method.name, method.parameter_types(), method.return_type.clone());
    method
        .type_parameters
        .iter()
        .cloned()
        .fold(Function::new(signature, flags), Function::with_type_parameter)
}

pub(crate) fn constructor_function(owner: &Type, constructor: &ConstructorDecl) -> Function {
    Function::new(Signature::constructor(owner.clone(), constructor.parameter_types()), constructor.flags)
}

impl<'a> RegistrationPass<'a> {
    pub fn new(types: &'a mut TypeSystem, loader: Option<&'a dyn ClassLoader>) -> Self {
        Self { types, loader, errors: Vec::new() }
    }

    /// Registers `classes`, normalising them in place: duplicates are
    /// dropped, implicit constructors are added and unresolvable supertypes
    /// are reset.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, classes: &mut Vec<ClassDecl>) -> RegistrationOutput {
        self.drop_duplicate_classes(classes);
        let declared: FxHashSet<String> = classes.iter().map(|c| c.name.clone()).collect();

        for class in classes.iter_mut() {
            self.normalise_constructors(class);
            self.resolve_supertypes(class, &declared);
        }
        self.break_cycles(classes);

        for class in classes.iter() {
            let info = self.class_info(class, &declared);
            tracing::debug!(
                class = %info.name,
                methods = info.methods.len(),
                fields = info.fields.len(),
                "declared class"
            );
            self.types.register(info);
        }
        for class in classes.iter() {
            self.check_inheritance(class);
            self.check_final_fields(class);
        }

        RegistrationOutput { classes_registered: classes.len(), errors: self.errors }
    }

    fn drop_duplicate_classes(&mut self, classes: &mut Vec<ClassDecl>) {
        let mut seen = FxHashSet::default();
        let types = &*self.types;
        let errors = &mut self.errors;
        classes.retain(|class| {
            let fresh = seen.insert(class.name.clone()) && !types.contains(&class.name);
            if !fresh {
                errors.push(CompilationError::structural(
                    class.span,
                    format!("duplicate class `{}`", class.name),
                ));
            }
            fresh
        });
    }

    fn normalise_constructors(&mut self, class: &mut ClassDecl) {
        if class.is_enum() {
            if let Some(constructor) = class.constructors.first() {
                self.errors.push(CompilationError::structural(
                    constructor.span,
                    format!("enumeration `{}` cannot declare constructors", class.name),
                ));
            }
            class.constructors.clear();
        } else if !class.is_interface() && class.constructors.is_empty() {
            let mut implicit = ConstructorDecl::implicit();
            implicit.span = class.span;
            class.constructors.push(implicit);
        }
    }

    // =========================================================================
    // Supertypes
    // =========================================================================

    /// Whether `ty` names a class of the unit, of the table or of the loader.
    fn resolve(&mut self, ty: &Type, declared: &FxHashSet<String>) -> bool {
        let erased = ty.erasure();
        let Some(name) = erased.class_name() else { return true };
        if declared.contains(name) || self.types.contains(name) {
            return true;
        }
        match self.loader {
            Some(loader) => self.types.import(loader, name).is_some(),
            None => false,
        }
    }

    fn unknown_type(&mut self, ty: &Type, span: Span) {
        self.errors.push(CompilationError::unresolved_name(span, NameKind::Type, ty.erasure().name()));
    }

    fn resolve_supertypes(&mut self, class: &mut ClassDecl, declared: &FxHashSet<String>) {
        if let Some(super_class) = class.super_class.clone()
            && !self.resolve(&super_class, declared)
        {
            self.unknown_type(&super_class, class.span);
            class.super_class = None;
        }
        let interfaces = std::mem::take(&mut class.interfaces);
        for interface in interfaces {
            if self.resolve(&interface, declared) {
                class.interfaces.push(interface);
            } else {
                self.unknown_type(&interface, class.span);
            }
        }
    }

    /// Direct supertypes of `class` that are declared in the unit.
    fn declared_supers(class: &ClassDecl, by_name: &FxHashMap<&str, usize>) -> Vec<usize> {
        class
            .super_class
            .iter()
            .chain(class.interfaces.iter())
            .filter_map(|ty| ty.class_name().and_then(|name| by_name.get(name).copied()))
            .collect()
    }

    /// Depth-first search over the unit's inheritance edges; every class on
    /// a cycle loses its supertypes.
    fn break_cycles(&mut self, classes: &mut [ClassDecl]) {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(
            index: usize,
            edges: &[Vec<usize>],
            marks: &mut [Mark],
            path: &mut Vec<usize>,
            cyclic: &mut FxHashSet<usize>,
        ) {
            marks[index] = Mark::Active;
            path.push(index);
            for &next in &edges[index] {
                match marks[next] {
                    Mark::Unvisited => visit(next, edges, marks, path, cyclic),
                    Mark::Active => {
                        let start = path.iter().rposition(|&i| i == next).unwrap_or(0);
                        cyclic.extend(path[start..].iter().copied());
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[index] = Mark::Done;
        }

        let by_name: FxHashMap<&str, usize> =
            classes.iter().enumerate().map(|(i, c)| (c.name.as_str(), i)).collect();
        let edges: Vec<Vec<usize>> = classes.iter().map(|c| Self::declared_supers(c, &by_name)).collect();
        drop(by_name);

        let mut marks = vec![Mark::Unvisited; classes.len()];
        let mut cyclic = FxHashSet::default();
        for index in 0..classes.len() {
            if marks[index] == Mark::Unvisited {
                visit(index, &edges, &mut marks, &mut Vec::new(), &mut cyclic);
            }
        }

        let mut cyclic: Vec<usize> = cyclic.into_iter().collect();
        cyclic.sort_unstable();
        for index in cyclic {
            let class = &mut classes[index];
            self.errors.push(CompilationError::structural(
                class.span,
                format!("cyclic inheritance involving `{}`", class.name),
            ));
            class.super_class = None;
            class.interfaces.clear();
        }
    }

    // =========================================================================
    // Class info
    // =========================================================================

    fn class_info(&mut self, class: &ClassDecl, declared: &FxHashSet<String>) -> ClassInfo {
        let owner = class.as_type();
        let mut info = ClassInfo::class(class.name.clone());
        info.flags = class.flags;
        info.type_parameters = class.type_parameters.clone();
        info.interfaces = class.interfaces.clone();
        info.super_class = if class.is_interface() {
            None
        } else {
            Some(class.super_class.clone().unwrap_or_else(Type::object))
        };
        info.enum_constants = class.enum_constants.clone();
        info.capabilities = class.capabilities;

        let mut fields: FxHashSet<&str> = FxHashSet::default();
        for field in &class.fields {
            if !fields.insert(field.name.as_str()) {
                self.errors.push(CompilationError::structural(
                    field.span,
                    format!("field `{}` is already defined in `{}`", field.name, class.name),
                ));
                continue;
            }
            if !self.resolve(&field.ty, declared) {
                self.unknown_type(&field.ty, field.span);
            }
            info.fields.push(Field::new(owner.clone(), &field.name, field.ty.clone(), field.flags));
        }

        let mut signatures: FxHashSet<TypeHash> = FxHashSet::default();
        for constructor in &class.constructors {
            let function = constructor_function(&owner, constructor);
            if !signatures.insert(function.signature.hash()) {
                self.errors.push(CompilationError::structural(
                    constructor.span,
                    format!("constructor `{}` is already defined", function.signature),
                ));
                continue;
            }
            self.check_member_types(&function.signature, constructor.span, declared);
            info.constructors.push(function);
        }
        for method in &class.methods {
            let function = method_function(&owner, method);
            if !signatures.insert(function.signature.hash()) {
                self.errors.push(CompilationError::structural(
                    method.span,
                    format!("method `{}` is already defined in `{}`", function.signature, class.name),
                ));
                continue;
            }
            self.check_member_types(&function.signature, method.span, declared);
            info.methods.push(function);
        }

        if class.is_enum() {
            info = enums::declare_members(class, info);
        }
        info
    }

    fn check_member_types(&mut self, signature: &Signature, span: Span, declared: &FxHashSet<String>) {
        for ty in signature.parameters.iter().chain(std::iter::once(&signature.return_type)) {
            if !self.resolve(ty, declared) {
                self.unknown_type(ty, span);
            }
        }
    }

    // =========================================================================
    // Post-registration checks
    // =========================================================================

    fn check_inheritance(&mut self, class: &ClassDecl) {
        if let Some(super_class) = &class.super_class
            && let Some(info) = self.types.reflect(super_class)
        {
            let message = if info.is_interface() {
                Some(format!("`{}` is an interface and cannot be extended", info.name))
            } else if info.flags.contains(ClassFlags::FINAL) {
                Some(format!("cannot inherit from final `{}`", info.name))
            } else {
                None
            };
            if let Some(message) = message {
                self.errors.push(CompilationError::structural(class.span, message));
            }
        }
        for interface in &class.interfaces {
            if let Some(info) = self.types.reflect(interface)
                && !info.is_interface()
            {
                let message = format!("`{}` is not an interface", info.name);
                self.errors.push(CompilationError::structural(class.span, message));
            }
        }
    }

    /// A final field must have an initialiser, or, for instance fields, be
    /// assigned by every constructor.
    fn check_final_fields(&mut self, class: &ClassDecl) {
        for field in class.fields.iter().filter(|f| f.is_final() && f.initializer.is_none()) {
            let initialised = !field.is_static()
                && !class.constructors.is_empty()
                && class
                    .constructors
                    .iter()
                    .all(|constructor| constructor.body.iter().any(|s| s.writes_field(&field.name)));
            if !initialised {
                self.errors.push(CompilationError::structural(
                    field.span,
                    format!("final field `{}` is never initialised", field.name),
                ));
            }
        }
    }
}
