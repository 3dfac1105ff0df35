//! The compile-time type model.
//!
//! [`Type`] is an immutable value compared structurally. Every type has a
//! descriptor, a fully-qualified name and an operand-stack width; the
//! conformance, intersection and conversion algebra over these values lives
//! in the compiler's type system.
//!
//! ## Erasure
//!
//! Descriptors are always computed from the erased type: parameterised
//! types erase to their base class, generic variables to their upper bound
//! and `Null` to the universal object type.

mod flags;
pub mod names;
mod primitive;

pub use flags::{ClassFlags, EnumCapabilities, MemberFlags};
pub use primitive::PrimitiveKind;

use crate::TypeHash;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),
    /// A nominal class or interface.
    Reference(String),
    /// A generic instantiation; `arguments` has the base's declared arity.
    Parameterised { base: String, arguments: Vec<Type> },
    /// An unbound generic parameter inside a method declaration.
    Variable { name: String, upper_bound: Box<Type> },
    /// A generic parameter declared at a class or interface header.
    Bounded { name: String, upper_bound: Box<Type> },
    /// A value usable as an enumeration discriminant.
    Constant(Box<Type>),
    /// Bottom type: the `null` literal and the placeholder for failed
    /// resolution.
    Null,
}

impl Type {
    pub const VOID: Type = Type::Primitive(PrimitiveKind::Void);
    pub const BOOLEAN: Type = Type::Primitive(PrimitiveKind::Boolean);
    pub const CHAR: Type = Type::Primitive(PrimitiveKind::Char);
    pub const INT: Type = Type::Primitive(PrimitiveKind::Int);
    pub const LONG: Type = Type::Primitive(PrimitiveKind::Long);
    pub const DOUBLE: Type = Type::Primitive(PrimitiveKind::Double);

    pub fn reference(name: impl Into<String>) -> Type {
        Type::Reference(name.into())
    }

    pub fn object() -> Type {
        Type::reference(names::OBJECT)
    }

    pub fn string() -> Type {
        Type::reference(names::STRING)
    }

    pub fn parameterised(base: impl Into<String>, arguments: Vec<Type>) -> Type {
        Type::Parameterised { base: base.into(), arguments }
    }

    pub fn variable(name: impl Into<String>, upper_bound: Type) -> Type {
        Type::Variable { name: name.into(), upper_bound: Box::new(upper_bound) }
    }

    pub fn bounded(name: impl Into<String>, upper_bound: Type) -> Type {
        Type::Bounded { name: name.into(), upper_bound: Box::new(upper_bound) }
    }

    pub fn constant(wrapped: Type) -> Type {
        Type::Constant(Box::new(wrapped))
    }

    /// Operand-stack width in slots: 0 for void, 2 for long and double.
    pub fn width(&self) -> u8 {
        match self {
            Type::Primitive(kind) => kind.width(),
            Type::Constant(inner) => inner.width(),
            _ => 1,
        }
    }

    /// Fully-qualified source-level name.
    pub fn name(&self) -> String {
        match self {
            Type::Primitive(kind) => kind.name().to_string(),
            Type::Reference(name) => name.clone(),
            Type::Parameterised { base, arguments } => {
                let args: Vec<String> = arguments.iter().map(Type::name).collect();
                format!("{}<{}>", base, args.join(", "))
            }
            Type::Variable { name, .. } | Type::Bounded { name, .. } => name.clone(),
            Type::Constant(inner) => inner.name(),
            Type::Null => "null".to_string(),
        }
    }

    /// Field descriptor of the erased type, e.g. `I` or `Ljava/lang/String;`.
    pub fn descriptor(&self) -> String {
        match self {
            Type::Primitive(kind) => kind.descriptor().to_string(),
            Type::Reference(name) | Type::Parameterised { base: name, .. } => {
                format!("L{};", names::internal(name))
            }
            Type::Variable { upper_bound, .. } | Type::Bounded { upper_bound, .. } => {
                upper_bound.descriptor()
            }
            Type::Constant(inner) => inner.descriptor(),
            Type::Null => format!("L{};", names::internal(names::OBJECT)),
        }
    }

    /// The runtime type values of this type have.
    pub fn erasure(&self) -> Type {
        match self {
            Type::Parameterised { base, .. } => Type::Reference(base.clone()),
            Type::Variable { upper_bound, .. } | Type::Bounded { upper_bound, .. } => {
                upper_bound.erasure()
            }
            Type::Constant(inner) => inner.erasure(),
            Type::Null => Type::object(),
            other => other.clone(),
        }
    }

    /// Class whose members describe this type, if any.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Type::Reference(name) | Type::Parameterised { base: name, .. } => Some(name),
            Type::Variable { upper_bound, .. } | Type::Bounded { upper_bound, .. } => {
                upper_bound.class_name()
            }
            Type::Constant(inner) => inner.class_name(),
            Type::Primitive(_) | Type::Null => None,
        }
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            Type::Constant(inner) => inner.primitive(),
            _ => None,
        }
    }

    /// Strips any `Constant` marker.
    pub fn unwrap_constant(&self) -> &Type {
        match self {
            Type::Constant(inner) => inner.unwrap_constant(),
            other => other,
        }
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.primitive() == Some(PrimitiveKind::Void)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Type::Null)
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        self.primitive() == Some(PrimitiveKind::Boolean)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.primitive().is_some_and(PrimitiveKind::is_numeric)
    }

    /// Whether values of this type are object references (including `null`).
    #[inline]
    pub fn is_reference(&self) -> bool {
        self.primitive().is_none()
    }

    /// Identity of the erased type, used to key class tables and signatures.
    pub fn type_hash(&self) -> TypeHash {
        match self.erasure() {
            Type::Primitive(kind) => TypeHash::from_name(kind.name()),
            Type::Reference(name) => TypeHash::from_name(&name),
            _ => TypeHash::EMPTY,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
