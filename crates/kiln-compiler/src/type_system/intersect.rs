//! Most specific common supertype.

use super::TypeSystem;
use kiln_core::Type;
use rustc_hash::FxHashSet;

impl TypeSystem {
    /// The most specific type both `a` and `b` are assignable to.
    ///
    /// `null` intersects to the other operand. Primitives that are not
    /// related by widening are boxed first. Unrelated references meet at
    /// their most specific common ancestor, preferring classes over
    /// interfaces and otherwise the first in `a`'s breadth-first ancestor
    /// order, with the universal object type as the fallback.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn intersect(&self, a: &Type, b: &Type) -> Type {
        if a == b {
            return a.clone();
        }
        if a.is_null() {
            return b.clone();
        }
        if b.is_null() {
            return a.clone();
        }
        if a.is_void() || b.is_void() {
            return Type::VOID;
        }
        if self.is_assignable(a, b) {
            return b.clone();
        }
        if self.is_assignable(b, a) {
            return a.clone();
        }
        match (a.primitive(), b.primitive()) {
            (Some(_), _) | (_, Some(_)) => self.intersect(&self.boxed(a), &self.boxed(b)),
            (None, None) => self.common_ancestor(a.unwrap_constant(), b.unwrap_constant()),
        }
    }

    fn common_ancestor(&self, a: &Type, b: &Type) -> Type {
        let theirs: FxHashSet<String> = self
            .ancestors(b)
            .iter()
            .filter_map(|t| t.class_name().map(str::to_string))
            .collect();
        let common: Vec<Type> = self
            .ancestors(a)
            .into_iter()
            .filter(|t| !matches!(t, Type::Variable { .. } | Type::Bounded { .. }))
            .filter(|t| t.class_name().is_some_and(|name| theirs.contains(name)))
            .collect();

        // Keep only candidates with no strictly more specific candidate.
        let minimal: Vec<&Type> = common
            .iter()
            .filter(|c| {
                !common.iter().any(|d| {
                    d.class_name() != c.class_name()
                        && self.is_subclass(d, c.class_name().unwrap_or_default())
                })
            })
            .collect();

        let chosen = minimal
            .iter()
            .find(|t| !self.is_interface(t))
            .or_else(|| minimal.first())
            .map(|t| (*t).clone());

        match chosen {
            Some(Type::Parameterised { base, arguments }) => {
                // Differently parameterised views meet at the raw class.
                match self.as_super(b, &base) {
                    Some(Type::Parameterised { arguments: other, .. }) if other == arguments => {
                        Type::Parameterised { base, arguments }
                    }
                    _ => Type::Reference(base),
                }
            }
            Some(other) => other,
            None => Type::object(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{ClassInfo, names};
    use pretty_assertions::assert_eq;

    fn types() -> TypeSystem {
        let mut types = TypeSystem::new();
        types.register(ClassInfo::interface("demo.Named"));
        types.register(ClassInfo::interface("demo.Aged"));
        types.register(ClassInfo::class("demo.Animal").with_interface(Type::reference("demo.Named")));
        types.register(
            ClassInfo::class("demo.Dog")
                .with_super(Type::reference("demo.Animal"))
                .with_interface(Type::reference("demo.Aged")),
        );
        types.register(
            ClassInfo::class("demo.Cat")
                .with_super(Type::reference("demo.Animal"))
                .with_interface(Type::reference("demo.Aged")),
        );
        types.register(
            ClassInfo::class("demo.Robot")
                .with_interface(Type::reference("demo.Named"))
                .with_interface(Type::reference("demo.Aged")),
        );
        types
    }

    #[test]
    fn null_yields_the_other_operand() {
        let types = types();
        assert_eq!(types.intersect(&Type::Null, &Type::string()), Type::string());
        assert_eq!(types.intersect(&Type::INT, &Type::Null), Type::INT);
    }

    #[test]
    fn numerics_meet_at_the_wider_kind() {
        let types = types();
        assert_eq!(types.intersect(&Type::INT, &Type::DOUBLE), Type::DOUBLE);
        assert_eq!(types.intersect(&Type::LONG, &Type::CHAR), Type::LONG);
    }

    #[test]
    fn siblings_meet_at_their_superclass() {
        let types = types();
        let dog = Type::reference("demo.Dog");
        let cat = Type::reference("demo.Cat");
        assert_eq!(types.intersect(&dog, &cat), Type::reference("demo.Animal"));
    }

    #[test]
    fn unrelated_classes_meet_at_a_shared_interface() {
        let types = types();
        let dog = Type::reference("demo.Dog");
        let robot = Type::reference("demo.Robot");
        let meet = types.intersect(&dog, &robot);
        assert_eq!(meet, Type::reference("demo.Aged"));
        assert_eq!(types.intersect(&dog, &robot), meet);
    }

    #[test]
    fn unrelated_types_fall_back_to_object() {
        let types = types();
        let meet = types.intersect(&Type::reference("demo.Dog"), &Type::string());
        assert_eq!(meet, Type::object());
    }

    #[test]
    fn primitive_and_reference_box_first() {
        let types = types();
        assert_eq!(
            types.intersect(&Type::INT, &Type::reference(names::DOUBLE)),
            Type::reference(names::DOUBLE)
        );
        let meet = types.intersect(&Type::BOOLEAN, &Type::string());
        assert_eq!(meet.erasure(), Type::reference(names::COMPARABLE));
    }

    #[test]
    fn result_is_a_supertype_of_both() {
        let types = types();
        let samples = [
            Type::INT,
            Type::string(),
            Type::reference("demo.Dog"),
            Type::reference("demo.Robot"),
            Type::reference(names::INTEGER),
        ];
        for a in &samples {
            for b in &samples {
                let meet = types.intersect(a, b);
                assert!(types.is_assignable(a, &meet), "{a} !<: {meet}");
                assert!(types.is_assignable(b, &meet), "{b} !<: {meet}");
            }
        }
    }
}
