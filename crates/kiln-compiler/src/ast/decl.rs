//! Class-level declarations.

use super::{Expression, Statement};
use kiln_core::{ClassFlags, EnumCapabilities, MemberFlags, Span, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: Type,
}

impl Parameter {
    pub fn new(name: &str, ty: Type) -> Self {
        Self { name: name.to_string(), ty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    pub flags: MemberFlags,
    pub initializer: Option<Expression>,
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: &str, ty: Type, flags: MemberFlags) -> Self {
        Self { name: name.to_string(), ty, flags, initializer: None, span: Span::default() }
    }

    pub fn with_initializer(mut self, initializer: Expression) -> Self {
        self.initializer = Some(initializer);
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    #[inline]
    pub fn is_final(&self) -> bool {
        self.flags.contains(MemberFlags::FINAL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Type,
    pub flags: MemberFlags,
    /// Method-level generic variables (`Type::Variable`).
    pub type_parameters: Vec<Type>,
    /// `None` for abstract and interface methods.
    pub body: Option<Vec<Statement>>,
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: &str, parameters: Vec<Parameter>, return_type: Type) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            return_type,
            flags: MemberFlags::PUBLIC,
            type_parameters: Vec::new(),
            body: None,
            span: Span::default(),
        }
    }

    pub fn with_body(mut self, body: Vec<Statement>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_type_parameter(mut self, variable: Type) -> Self {
        self.type_parameters.push(variable);
        self
    }

    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.span = Span::point(line, col);
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDecl {
    pub parameters: Vec<Parameter>,
    pub flags: MemberFlags,
    /// Arguments of the superclass constructor call.
    pub super_arguments: Vec<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}

impl ConstructorDecl {
    pub fn new(parameters: Vec<Parameter>, body: Vec<Statement>) -> Self {
        Self {
            parameters,
            flags: MemberFlags::PUBLIC,
            super_arguments: Vec::new(),
            body,
            span: Span::default(),
        }
    }

    /// The constructor a class without any gets.
    pub fn implicit() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn with_super_arguments(mut self, arguments: Vec<Expression>) -> Self {
        self.super_arguments = arguments;
        self
    }

    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.span = Span::point(line, col);
        self
    }

    pub fn parameter_types(&self) -> Vec<Type> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: String,
    pub flags: ClassFlags,
    /// Class-level generic parameters (`Type::Bounded`).
    pub type_parameters: Vec<Type>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub fields: Vec<FieldDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
    pub enum_constants: Vec<String>,
    pub capabilities: EnumCapabilities,
    pub span: Span,
}

impl ClassDecl {
    pub fn class(name: &str) -> Self {
        Self {
            name: name.to_string(),
            flags: ClassFlags::PUBLIC,
            type_parameters: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            enum_constants: Vec::new(),
            capabilities: EnumCapabilities::empty(),
            span: Span::default(),
        }
    }

    pub fn interface(name: &str) -> Self {
        let mut decl = Self::class(name);
        decl.flags |= ClassFlags::INTERFACE | ClassFlags::ABSTRACT;
        decl
    }

    pub fn enumeration(name: &str, constants: &[&str]) -> Self {
        let mut decl = Self::class(name);
        decl.flags |= ClassFlags::ENUM | ClassFlags::FINAL;
        decl.enum_constants = constants.iter().map(|c| c.to_string()).collect();
        decl
    }

    pub fn with_super(mut self, super_class: Type) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn with_interface(mut self, interface: Type) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_type_parameter(mut self, parameter: Type) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorDecl) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_capabilities(mut self, capabilities: EnumCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.span = Span::point(line, col);
        self
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::INTERFACE)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.flags.intersects(ClassFlags::ABSTRACT | ClassFlags::INTERFACE)
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        self.flags.contains(ClassFlags::ENUM)
    }

    /// The type of `this` inside the class.
    pub fn as_type(&self) -> Type {
        if self.type_parameters.is_empty() {
            Type::reference(self.name.clone())
        } else {
            Type::parameterised(self.name.clone(), self.type_parameters.clone())
        }
    }
}
