//! The type system: class table, hierarchy queries and the
//! conformance/intersection/conversion algebra.
//!
//! ## Class table
//!
//! Classes are keyed by the [`TypeHash`] of their qualified name. The table
//! starts with the platform classes; user classes are added by the
//! declaration pass and foreign classes are pulled in through a
//! [`ClassLoader`].
//!
//! ## Determinism
//!
//! Every hierarchy walk is breadth-first over superclass-then-interfaces in
//! declaration order, so identical input always yields identical output.

mod conformance;
mod conversion;
mod intersect;
mod platform;
mod substitution;

pub use conformance::widens;
pub use platform::PlatformLoader;
pub use substitution::{Substitution, is_generic, substitute};

use kiln_core::{ClassInfo, Field, Function, Signature, Type, TypeHash, names};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Reflection/class-loading collaborator.
pub trait ClassLoader {
    /// Looks up a class by fully-qualified name.
    fn load(&self, name: &str) -> Option<ClassInfo>;
}

impl ClassLoader for FxHashMap<String, ClassInfo> {
    fn load(&self, name: &str) -> Option<ClassInfo> {
        self.get(name).cloned()
    }
}

/// A method as seen from a particular receiver type.
///
/// `function` keeps the declared signature (its descriptor is what the
/// call instruction names); `parameters` and `return_type` have the
/// receiver's type arguments substituted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub function: Function,
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl Method {
    pub fn declared(function: Function) -> Self {
        let parameters = function.signature.parameters.clone();
        let return_type = function.signature.return_type.clone();
        Self { function, parameters, return_type }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.function.name()
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.function.is_static()
    }

    /// Class declaring the method.
    pub fn owner_class(&self) -> String {
        self.function
            .signature
            .owner
            .class_name()
            .unwrap_or(names::OBJECT)
            .to_string()
    }

    pub fn descriptor(&self) -> String {
        self.function.signature.descriptor()
    }
}

#[derive(Debug, Clone)]
pub struct TypeSystem {
    classes: FxHashMap<TypeHash, ClassInfo>,
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    /// A type system preloaded with the platform classes.
    pub fn new() -> Self {
        let mut types = Self::empty();
        for info in platform::classes() {
            types.register(info);
        }
        types
    }

    pub fn empty() -> Self {
        Self { classes: FxHashMap::default() }
    }

    // =========================================================================
    // Class table
    // =========================================================================

    /// Adds or replaces a class.
    pub fn register(&mut self, info: ClassInfo) {
        self.classes.insert(TypeHash::from_name(&info.name), info);
    }

    /// Loads `name` and, transitively, its supertypes from `loader`.
    ///
    /// Returns `None` when neither the table nor the loader knows the class.
    pub fn import(&mut self, loader: &dyn ClassLoader, name: &str) -> Option<Type> {
        if let Some(info) = self.class(name) {
            return Some(info.as_type());
        }
        let info = loader.load(name)?;
        let supers: Vec<String> = info
            .supertypes()
            .filter_map(|s| s.class_name().map(str::to_string))
            .collect();
        let ty = info.as_type();
        self.register(info);
        for super_name in supers {
            // Missing supertypes degrade to direct subclasses of Object.
            let _ = self.import(loader, &super_name);
        }
        Some(ty)
    }

    pub fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(&TypeHash::from_name(name))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.class(name).is_some()
    }

    /// Read-only view over the members of the class behind `ty`.
    pub fn reflect(&self, ty: &Type) -> Option<&ClassInfo> {
        ty.class_name().and_then(|name| self.class(name))
    }

    pub fn is_interface(&self, ty: &Type) -> bool {
        self.reflect(ty).is_some_and(ClassInfo::is_interface)
    }

    #[inline]
    pub fn width(&self, ty: &Type) -> u8 {
        ty.width()
    }

    #[inline]
    pub fn descriptor(&self, ty: &Type) -> String {
        ty.descriptor()
    }

    #[inline]
    pub fn name(&self, ty: &Type) -> String {
        ty.name()
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// Maps a class's header parameters to the arguments of `ty`.
    ///
    /// A raw reference to a generic class binds each parameter to the
    /// erasure of its bound.
    fn bindings(&self, ty: &Type, info: &ClassInfo) -> Substitution {
        let mut bindings = Substitution::default();
        if let Type::Parameterised { arguments, .. } = ty {
            if arguments.len() == info.type_parameters.len() {
                for (param, arg) in info.type_parameters.iter().zip(arguments) {
                    bindings.insert(param.name(), arg.clone());
                }
                return bindings;
            }
        }
        for param in &info.type_parameters {
            bindings.insert(param.name(), param.erasure());
        }
        bindings
    }

    fn is_raw(ty: &Type, info: &ClassInfo) -> bool {
        !info.type_parameters.is_empty() && !matches!(ty, Type::Parameterised { .. })
    }

    /// Immediate supertypes of `ty` with its type arguments substituted.
    pub fn direct_supertypes(&self, ty: &Type) -> Vec<Type> {
        let ty = ty.unwrap_constant();
        match ty {
            Type::Variable { upper_bound, .. } | Type::Bounded { upper_bound, .. } => {
                vec![(**upper_bound).clone()]
            }
            Type::Reference(_) | Type::Parameterised { .. } => {
                if ty.class_name() == Some(names::OBJECT) {
                    return Vec::new();
                }
                let Some(info) = self.reflect(ty) else {
                    return vec![Type::object()];
                };
                let bindings = self.bindings(ty, info);
                let raw = Self::is_raw(ty, info);
                let mut supers: Vec<Type> = info
                    .supertypes()
                    .map(|s| {
                        let s = substitute(s, &bindings);
                        if raw { s.erasure() } else { s }
                    })
                    .collect();
                if info.super_class.is_none() {
                    supers.push(Type::object());
                }
                supers
            }
            _ => Vec::new(),
        }
    }

    /// `ty` and all of its supertypes, breadth-first, each class once.
    pub fn ancestors(&self, ty: &Type) -> Vec<Type> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut queue = VecDeque::from([ty.unwrap_constant().clone()]);
        while let Some(current) = queue.pop_front() {
            let key = match &current {
                Type::Variable { name, .. } | Type::Bounded { name, .. } => format!("'{name}"),
                other => other.erasure().name(),
            };
            if !seen.insert(key) {
                continue;
            }
            queue.extend(self.direct_supertypes(&current));
            out.push(current);
        }
        out
    }

    /// The view of `ty` as its ancestor class `class`, if it has one.
    pub fn as_super(&self, ty: &Type, class: &str) -> Option<Type> {
        self.ancestors(ty).into_iter().find(|ancestor| {
            matches!(ancestor, Type::Reference(_) | Type::Parameterised { .. })
                && ancestor.class_name() == Some(class)
        })
    }

    /// Whether reference type `ty` is `class` or inherits from it.
    pub fn is_subclass(&self, ty: &Type, class: &str) -> bool {
        if ty.is_reference() && class == names::OBJECT {
            return true;
        }
        self.as_super(ty, class).is_some()
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Methods named `name` visible on `ty`, most derived first.
    ///
    /// An override hides the inherited method with the same erased
    /// parameters.
    pub fn methods(&self, ty: &Type, name: &str) -> Vec<Method> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for ancestor in self.ancestors(ty) {
            let Some(info) = self.reflect(&ancestor) else { continue };
            if matches!(ancestor, Type::Variable { .. } | Type::Bounded { .. }) {
                continue;
            }
            let bindings = self.bindings(&ancestor, info);
            for function in info.methods_named(name) {
                if !seen.insert(function.signature.hash()) {
                    continue;
                }
                out.push(Method {
                    parameters: function
                        .signature
                        .parameters
                        .iter()
                        .map(|p| substitute(p, &bindings))
                        .collect(),
                    return_type: substitute(&function.signature.return_type, &bindings),
                    function: function.clone(),
                });
            }
        }
        out
    }

    /// Whether a known subclass of the owner of `signature` redeclares it
    /// as an instance method.
    pub fn is_overridden(&self, signature: &Signature) -> bool {
        let Some(owner) = signature.owner.class_name() else { return true };
        let hash = signature.hash();
        self.classes
            .values()
            .filter(|info| info.name != owner)
            .filter(|info| self.is_subclass(&Type::reference(info.name.clone()), owner))
            .any(|info| {
                info.methods
                    .iter()
                    .any(|function| !function.is_static() && function.signature.hash() == hash)
            })
    }

    /// Constructors declared by the class behind `ty`.
    pub fn constructors(&self, ty: &Type) -> Vec<Method> {
        let Some(info) = self.reflect(ty) else { return Vec::new() };
        let bindings = self.bindings(ty, info);
        info.constructors
            .iter()
            .map(|function| Method {
                parameters: function
                    .signature
                    .parameters
                    .iter()
                    .map(|p| substitute(p, &bindings))
                    .collect(),
                return_type: Type::VOID,
                function: function.clone(),
            })
            .collect()
    }

    /// A field visible on `ty` and its type as seen from `ty`.
    pub fn field(&self, ty: &Type, name: &str) -> Option<(Field, Type)> {
        self.ancestors(ty).into_iter().find_map(|ancestor| {
            if matches!(ancestor, Type::Variable { .. } | Type::Bounded { .. }) {
                return None;
            }
            let info = self.reflect(&ancestor)?;
            let field = info.field(name)?;
            let ty = substitute(&field.ty, &self.bindings(&ancestor, info));
            Some((field.clone(), ty))
        })
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// Whether `ty` switches `+` into string concatenation.
    pub fn is_string(&self, ty: &Type) -> bool {
        !ty.is_null() && self.is_assignable(ty, &Type::string())
    }

    pub fn is_throwable(&self, ty: &Type) -> bool {
        !ty.is_null() && self.is_assignable(ty, &Type::reference(names::THROWABLE))
    }

    /// Whether values of `ty` order themselves through `compareTo`.
    pub fn is_comparable(&self, ty: &Type) -> bool {
        ty.is_reference() && !ty.is_null() && self.is_subclass(ty, names::COMPARABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::MemberFlags;
    use pretty_assertions::assert_eq;

    fn boxed_list() -> ClassInfo {
        ClassInfo::class("demo.Box")
            .with_type_parameter("T", Type::object())
            .with_interface(Type::parameterised(
                names::COMPARABLE,
                vec![Type::bounded("T", Type::object())],
            ))
            .with_method(
                "get",
                vec![],
                Type::bounded("T", Type::object()),
                MemberFlags::PUBLIC,
            )
            .with_field("value", Type::bounded("T", Type::object()), MemberFlags::PUBLIC)
    }

    #[test]
    fn ancestors_are_breadth_first_and_unique() {
        let types = TypeSystem::new();
        let names: Vec<String> = types
            .ancestors(&Type::reference(names::INTEGER))
            .iter()
            .map(|t| t.erasure().name())
            .collect();
        assert_eq!(
            names,
            vec![names::INTEGER, names::NUMBER, names::COMPARABLE, names::OBJECT]
        );
    }

    #[test]
    fn overriding_is_seen_from_known_subclasses_only() {
        let mut types = TypeSystem::new();
        types.register(ClassInfo::class("demo.Base").with_method(
            "spin",
            vec![Type::DOUBLE],
            Type::DOUBLE,
            MemberFlags::PUBLIC,
        ));
        let base = types.methods(&Type::reference("demo.Base"), "spin")[0].function.signature.clone();
        assert!(!types.is_overridden(&base));

        types.register(ClassInfo::class("demo.Sibling").with_method(
            "spin",
            vec![Type::DOUBLE],
            Type::DOUBLE,
            MemberFlags::PUBLIC,
        ));
        assert!(!types.is_overridden(&base));

        types.register(
            ClassInfo::class("demo.Derived")
                .with_super(Type::reference("demo.Base"))
                .with_method("spin", vec![Type::DOUBLE], Type::DOUBLE, MemberFlags::PUBLIC),
        );
        assert!(types.is_overridden(&base));
    }

    #[test]
    fn supertypes_are_substituted() {
        let mut types = TypeSystem::new();
        types.register(boxed_list());
        let boxed = Type::parameterised("demo.Box", vec![Type::string()]);
        assert_eq!(
            types.as_super(&boxed, names::COMPARABLE),
            Some(Type::parameterised(names::COMPARABLE, vec![Type::string()]))
        );
    }

    #[test]
    fn raw_references_have_raw_supertypes() {
        let mut types = TypeSystem::new();
        types.register(boxed_list());
        assert_eq!(
            types.as_super(&Type::reference("demo.Box"), names::COMPARABLE),
            Some(Type::reference(names::COMPARABLE))
        );
    }

    #[test]
    fn members_see_receiver_type_arguments() {
        let mut types = TypeSystem::new();
        types.register(boxed_list());
        let boxed = Type::parameterised("demo.Box", vec![Type::string()]);

        let get = types.methods(&boxed, "get");
        assert_eq!(get.len(), 1);
        assert_eq!(get[0].return_type, Type::string());
        assert_eq!(get[0].descriptor(), "()Ljava/lang/Object;");

        let (_, field_ty) = types.field(&boxed, "value").unwrap();
        assert_eq!(field_ty, Type::string());
    }

    #[test]
    fn overrides_hide_inherited_methods() {
        let types = TypeSystem::new();
        let to_string = types.methods(&Type::string(), "toString");
        assert_eq!(to_string.len(), 1);
        assert_eq!(to_string[0].owner_class(), names::STRING);
    }

    #[test]
    fn import_pulls_in_supertypes() {
        let mut loader: FxHashMap<String, ClassInfo> = FxHashMap::default();
        loader.insert(
            "lib.Base".to_string(),
            ClassInfo::class("lib.Base"),
        );
        loader.insert(
            "lib.Derived".to_string(),
            ClassInfo::class("lib.Derived").with_super(Type::reference("lib.Base")),
        );
        let mut types = TypeSystem::new();
        assert_eq!(types.import(&loader, "lib.Derived"), Some(Type::reference("lib.Derived")));
        assert!(types.contains("lib.Base"));
        assert_eq!(types.import(&loader, "lib.Missing"), None);
    }

    #[test]
    fn classification() {
        let types = TypeSystem::new();
        assert!(types.is_string(&Type::string()));
        assert!(!types.is_string(&Type::Null));
        assert!(!types.is_string(&Type::INT));
        assert!(types.is_throwable(&Type::reference(names::RUNTIME_EXCEPTION)));
        assert!(types.is_comparable(&Type::reference(names::DOUBLE)));
        assert!(!types.is_comparable(&Type::object()));
    }
}
