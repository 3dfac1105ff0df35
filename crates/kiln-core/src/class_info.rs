//! Reflection view over a class, interface or enumeration.
//!
//! A [`ClassInfo`] is what the class-loading collaborator hands back for a
//! fully-qualified name. It is read-only once loaded: the type system
//! consults it for supertypes, members and enumeration metadata.

use crate::signature::{Field, Function, Signature};
use crate::types::{ClassFlags, EnumCapabilities, MemberFlags, Type, names};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub flags: ClassFlags,
    /// Header generic parameters as `Bounded` types, in declaration order.
    pub type_parameters: Vec<Type>,
    /// `None` only for the universal object type and interfaces.
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<Function>,
    pub constructors: Vec<Function>,
    pub fields: Vec<Field>,
    /// Constant names of an enumeration, in declaration order.
    pub enum_constants: Vec<String>,
    pub capabilities: EnumCapabilities,
}

impl ClassInfo {
    /// A class extending the universal object type.
    pub fn class(name: impl Into<String>) -> Self {
        let name = name.into();
        let super_class = (name != names::OBJECT).then(Type::object);
        Self {
            name,
            flags: ClassFlags::PUBLIC,
            type_parameters: Vec::new(),
            super_class,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            enum_constants: Vec::new(),
            capabilities: EnumCapabilities::empty(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        let mut info = Self::class(name);
        info.flags = ClassFlags::PUBLIC | ClassFlags::INTERFACE | ClassFlags::ABSTRACT;
        info.super_class = None;
        info
    }

    pub fn enumeration(name: impl Into<String>, constants: &[&str]) -> Self {
        let mut info = Self::class(name);
        info.flags |= ClassFlags::ENUM | ClassFlags::FINAL;
        info.enum_constants = constants.iter().map(|c| c.to_string()).collect();
        info
    }

    pub fn with_super(mut self, super_class: Type) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn with_interface(mut self, interface: Type) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_type_parameter(mut self, name: &str, upper_bound: Type) -> Self {
        self.type_parameters.push(Type::bounded(name, upper_bound));
        self
    }

    pub fn with_capabilities(mut self, capabilities: EnumCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Adds a method owned by this class.
    pub fn with_method(
        mut self,
        name: &str,
        parameters: Vec<Type>,
        return_type: Type,
        flags: MemberFlags,
    ) -> Self {
        let signature = Signature::new(self.as_type(), name, parameters, return_type);
        self.methods.push(Function::new(signature, flags));
        self
    }

    pub fn with_function(mut self, function: Function) -> Self {
        self.methods.push(function);
        self
    }

    pub fn with_constructor(mut self, parameters: Vec<Type>) -> Self {
        let signature = Signature::constructor(self.as_type(), parameters);
        self.constructors.push(Function::new(signature, MemberFlags::PUBLIC));
        self
    }

    pub fn with_field(mut self, name: &str, ty: Type, flags: MemberFlags) -> Self {
        self.fields.push(Field::new(self.as_type(), name, ty, flags));
        self
    }

    /// The type of `this` inside the class: parameterised by its own header
    /// parameters when it declares any.
    pub fn as_type(&self) -> Type {
        if self.type_parameters.is_empty() {
            Type::Reference(self.name.clone())
        } else {
            Type::parameterised(self.name.clone(), self.type_parameters.clone())
        }
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.flags.contains(ClassFlags::ENUM)
    }

    /// Direct supertypes: superclass first, then interfaces in declaration
    /// order.
    pub fn supertypes(&self) -> impl Iterator<Item = &Type> {
        self.super_class.iter().chain(self.interfaces.iter())
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Function> + 'a {
        self.methods.iter().filter(move |m| m.name() == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.enum_constants.iter().any(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_has_no_superclass() {
        assert_eq!(ClassInfo::class(names::OBJECT).super_class, None);
        assert_eq!(ClassInfo::class("demo.A").super_class, Some(Type::object()));
    }

    #[test]
    fn generic_class_type_is_parameterised_by_its_header() {
        let info = ClassInfo::class("demo.Box").with_type_parameter("T", Type::object());
        assert_eq!(
            info.as_type(),
            Type::parameterised("demo.Box", vec![Type::bounded("T", Type::object())])
        );
    }

    #[test]
    fn members_are_owned_by_the_class() {
        let info = ClassInfo::class("demo.A")
            .with_method("run", vec![], Type::VOID, MemberFlags::PUBLIC)
            .with_field("count", Type::INT, MemberFlags::PRIVATE);
        assert_eq!(info.methods_named("run").count(), 1);
        assert_eq!(info.field("count").map(|f| &f.owner), Some(&Type::reference("demo.A")));
    }

    #[test]
    fn supertypes_list_superclass_first() {
        let info = ClassInfo::class("demo.A").with_interface(Type::reference(names::COMPARABLE));
        let supers: Vec<_> = info.supertypes().cloned().collect();
        assert_eq!(supers, vec![Type::object(), Type::reference(names::COMPARABLE)]);
    }
}
