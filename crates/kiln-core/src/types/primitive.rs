//! Primitive kinds and their platform box classes.

use super::names;

/// The primitive kinds of the language.
///
/// Declaration order follows the numeric widening lattice for the numeric
/// kinds: `Char < Int < Long < Double`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Char,
    Int,
    Long,
    Double,
}

impl PrimitiveKind {
    /// Operand-stack width in slots.
    #[inline]
    pub fn width(self) -> u8 {
        match self {
            PrimitiveKind::Void => 0,
            PrimitiveKind::Long | PrimitiveKind::Double => 2,
            _ => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "void" => PrimitiveKind::Void,
            "boolean" => PrimitiveKind::Boolean,
            "char" => PrimitiveKind::Char,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    /// Single-character descriptor.
    pub fn descriptor(self) -> char {
        match self {
            PrimitiveKind::Void => 'V',
            PrimitiveKind::Boolean => 'Z',
            PrimitiveKind::Char => 'C',
            PrimitiveKind::Int => 'I',
            PrimitiveKind::Long => 'J',
            PrimitiveKind::Double => 'D',
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Char | PrimitiveKind::Int | PrimitiveKind::Long | PrimitiveKind::Double
        )
    }

    /// The kind arithmetic on this kind is carried out in.
    ///
    /// `char` operands are promoted to `int`; every other numeric kind is
    /// its own computational kind.
    pub fn computational(self) -> Self {
        match self {
            PrimitiveKind::Char | PrimitiveKind::Boolean => PrimitiveKind::Int,
            other => other,
        }
    }

    /// The platform class values of this kind box into.
    pub fn box_class(self) -> Option<&'static str> {
        match self {
            PrimitiveKind::Void => None,
            PrimitiveKind::Boolean => Some(names::BOOLEAN),
            PrimitiveKind::Char => Some(names::CHARACTER),
            PrimitiveKind::Int => Some(names::INTEGER),
            PrimitiveKind::Long => Some(names::LONG),
            PrimitiveKind::Double => Some(names::DOUBLE),
        }
    }

    /// The primitive a box class unboxes to.
    pub fn from_box(class: &str) -> Option<Self> {
        [
            PrimitiveKind::Boolean,
            PrimitiveKind::Char,
            PrimitiveKind::Int,
            PrimitiveKind::Long,
            PrimitiveKind::Double,
        ]
        .into_iter()
        .find(|kind| kind.box_class() == Some(class))
    }

    /// Name of the box-class accessor that yields this primitive.
    pub fn unbox_method(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "",
            PrimitiveKind::Boolean => "booleanValue",
            PrimitiveKind::Char => "charValue",
            PrimitiveKind::Int => "intValue",
            PrimitiveKind::Long => "longValue",
            PrimitiveKind::Double => "doubleValue",
        }
    }
}
