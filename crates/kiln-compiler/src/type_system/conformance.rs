//! The assignability relation.
//!
//! `is_assignable(from, to)` is reflexive and transitive:
//!
//! - `null` is assignable to everything
//! - numeric primitives widen along `char < int < long < double`
//! - a primitive boxes into any supertype of the box class of a kind it
//!   widens to, and a box class unboxes into any primitive its kind widens
//!   to; box classes convert into each other along the same lattice
//! - reference types conform to their superclasses and interfaces
//! - a parameterised target requires the source's view of that class to be
//!   parameterised with covariantly conforming arguments; raw types do not
//!   conform to parameterised ones
//! - generic parameters conform through their upper bound

use super::TypeSystem;
use kiln_core::{PrimitiveKind, Type};

/// Primitive widening, reflexive.
pub fn widens(from: PrimitiveKind, to: PrimitiveKind) -> bool {
    from == to
        || (from.is_numeric() && to.is_numeric() && to != PrimitiveKind::Char && from <= to)
}

const BOXABLE: [PrimitiveKind; 5] = [
    PrimitiveKind::Boolean,
    PrimitiveKind::Char,
    PrimitiveKind::Int,
    PrimitiveKind::Long,
    PrimitiveKind::Double,
];

impl TypeSystem {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn is_assignable(&self, from: &Type, to: &Type) -> bool {
        let from = from.unwrap_constant();
        let to = to.unwrap_constant();
        if from == to {
            return true;
        }
        match (from, to) {
            (Type::Null, _) => true,
            (_, Type::Null) => false,
            (Type::Primitive(a), Type::Primitive(b)) => widens(*a, *b),
            (_, Type::Variable { .. } | Type::Bounded { .. }) => false,
            (Type::Primitive(a), _) => self.box_target(*a, to).is_some(),
            (Type::Variable { upper_bound, .. } | Type::Bounded { upper_bound, .. }, _) => {
                self.is_assignable(upper_bound, to)
            }
            (_, Type::Primitive(b)) => self.unboxed(from).is_some_and(|k| widens(k, *b)),
            (_, Type::Parameterised { base, arguments }) => match self.as_super(from, base) {
                Some(Type::Parameterised { arguments: actual, .. }) => {
                    actual.len() == arguments.len()
                        && actual
                            .iter()
                            .zip(arguments)
                            .all(|(a, expected)| self.is_assignable(a, expected))
                }
                _ => false,
            },
            (_, Type::Reference(name)) => {
                self.is_subclass(from, name)
                    || self
                        .unboxed(from)
                        .is_some_and(|k| self.box_target(k, to).is_some())
            }
            _ => false,
        }
    }

    /// The primitive a box-class reference unboxes to.
    pub fn unboxed(&self, ty: &Type) -> Option<PrimitiveKind> {
        match ty.unwrap_constant() {
            Type::Reference(name) => PrimitiveKind::from_box(name),
            _ => None,
        }
    }

    /// The narrowest kind `kind` widens to whose box class conforms to `to`.
    pub fn box_target(&self, kind: PrimitiveKind, to: &Type) -> Option<PrimitiveKind> {
        BOXABLE.into_iter().filter(|k| widens(kind, *k)).find(|k| {
            let Some(class) = k.box_class() else { return false };
            let boxed = Type::reference(class);
            match to {
                Type::Reference(name) => self.is_subclass(&boxed, name),
                other => self.is_assignable(&boxed, other),
            }
        })
    }

    /// The reference type a primitive boxes into by default.
    pub fn boxed(&self, ty: &Type) -> Type {
        match ty.primitive().and_then(PrimitiveKind::box_class) {
            Some(class) => Type::reference(class),
            None => ty.clone(),
        }
    }
}
