//! Declared members: method signatures, functions and fields.

use crate::types::{MemberFlags, Type, names};
use crate::TypeHash;
use std::fmt;

/// `(owner, name, parameter types, return type)`.
///
/// Value-equal. Constructors are named `<init>` and return `void`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub owner: Type,
    pub name: String,
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl Signature {
    pub fn new(
        owner: Type,
        name: impl Into<String>,
        parameters: Vec<Type>,
        return_type: Type,
    ) -> Self {
        Self { owner, name: name.into(), parameters, return_type }
    }

    pub fn constructor(owner: Type, parameters: Vec<Type>) -> Self {
        Self::new(owner, names::CONSTRUCTOR, parameters, Type::VOID)
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.name == names::CONSTRUCTOR
    }

    /// Method descriptor over the erased parameter and return types,
    /// e.g. `(ILjava/lang/String;)D`.
    pub fn descriptor(&self) -> String {
        let params: String = self.parameters.iter().map(Type::descriptor).collect();
        format!("({}){}", params, self.return_type.descriptor())
    }

    /// Identity used for duplicate detection: name plus erased parameters.
    pub fn hash(&self) -> TypeHash {
        let params: Vec<TypeHash> = self.parameters.iter().map(Type::type_hash).collect();
        if self.is_constructor() {
            TypeHash::from_constructor(self.owner.type_hash(), &params)
        } else {
            TypeHash::from_method(&self.name, &params)
        }
    }

    /// `owner.name(p1, p2)` with fully-qualified type names.
    pub fn display_name(&self) -> String {
        format!("{}.{}({})", self.owner, self.name, join_types(&self.parameters))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, join_types(&self.parameters))
    }
}

/// Comma-separated type names, as used in diagnostics.
pub fn join_types(types: &[Type]) -> String {
    types.iter().map(Type::name).collect::<Vec<_>>().join(", ")
}

/// A method or constructor as seen through reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub signature: Signature,
    pub flags: MemberFlags,
    /// Method-level generic parameters as `Variable` types.
    pub type_parameters: Vec<Type>,
}

impl Function {
    pub fn new(signature: Signature, flags: MemberFlags) -> Self {
        Self { signature, flags, type_parameters: Vec::new() }
    }

    pub fn with_type_parameter(mut self, variable: Type) -> Self {
        self.type_parameters.push(variable);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    #[inline]
    pub fn is_private(&self) -> bool {
        self.flags.contains(MemberFlags::PRIVATE)
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub owner: Type,
    pub name: String,
    pub ty: Type,
    pub flags: MemberFlags,
}

impl Field {
    pub fn new(owner: Type, name: impl Into<String>, ty: Type, flags: MemberFlags) -> Self {
        Self { owner, name: name.into(), ty, flags }
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
