//! The platform classes every compilation can see.

use super::ClassLoader;
use kiln_core::{ClassInfo, MemberFlags, Type, names};

const PUBLIC: MemberFlags = MemberFlags::PUBLIC;

fn public_static() -> MemberFlags {
    MemberFlags::PUBLIC | MemberFlags::STATIC
}

fn generic(name: &str) -> Type {
    Type::bounded(name, Type::object())
}

fn boxed(name: &str, primitive: Type, unbox: &str, interfaces_self: bool) -> ClassInfo {
    let me = Type::reference(name);
    let mut info = ClassInfo::class(name)
        .with_flags(kiln_core::ClassFlags::FINAL)
        .with_method("valueOf", vec![primitive.clone()], me.clone(), public_static())
        .with_method(unbox, vec![], primitive, PUBLIC)
        .with_method("toString", vec![], Type::string(), PUBLIC);
    if interfaces_self {
        info = info.with_interface(Type::parameterised(names::COMPARABLE, vec![me]));
    }
    info
}

fn numeric_box(name: &str, primitive: Type, unbox: &str) -> ClassInfo {
    let mut info = boxed(name, primitive, unbox, true).with_super(Type::reference(names::NUMBER));
    // Inherited accessors are redeclared so every box answers every kind.
    for (method, ty) in [("intValue", Type::INT), ("longValue", Type::LONG), ("doubleValue", Type::DOUBLE)] {
        if method != unbox {
            info = info.with_method(method, vec![], ty, PUBLIC);
        }
    }
    info
}

/// All platform classes, in a fixed order.
pub fn classes() -> Vec<ClassInfo> {
    let object = Type::object();
    let string = Type::string();
    let builder = Type::reference(names::STRING_BUILDER);

    let mut string_builder = ClassInfo::class(names::STRING_BUILDER)
        .with_flags(kiln_core::ClassFlags::FINAL)
        .with_interface(Type::reference(names::CHAR_SEQUENCE))
        .with_constructor(vec![])
        .with_constructor(vec![string.clone()])
        .with_method("toString", vec![], string.clone(), PUBLIC)
        .with_method("length", vec![], Type::INT, PUBLIC);
    for arg in [
        string.clone(),
        Type::reference(names::CHAR_SEQUENCE),
        object.clone(),
        Type::BOOLEAN,
        Type::CHAR,
        Type::INT,
        Type::LONG,
        Type::DOUBLE,
    ] {
        string_builder = string_builder.with_method("append", vec![arg], builder.clone(), PUBLIC);
    }

    vec![
        ClassInfo::class(names::OBJECT)
            .with_constructor(vec![])
            .with_method("equals", vec![object.clone()], Type::BOOLEAN, PUBLIC)
            .with_method("hashCode", vec![], Type::INT, PUBLIC)
            .with_method("toString", vec![], string.clone(), PUBLIC),
        ClassInfo::interface(names::CHAR_SEQUENCE)
            .with_method("length", vec![], Type::INT, PUBLIC | MemberFlags::ABSTRACT)
            .with_method("toString", vec![], string.clone(), PUBLIC | MemberFlags::ABSTRACT),
        ClassInfo::interface(names::COMPARABLE)
            .with_type_parameter("T", object.clone())
            .with_method("compareTo", vec![generic("T")], Type::INT, PUBLIC | MemberFlags::ABSTRACT),
        ClassInfo::class(names::STRING)
            .with_flags(kiln_core::ClassFlags::FINAL)
            .with_interface(Type::reference(names::CHAR_SEQUENCE))
            .with_interface(Type::parameterised(names::COMPARABLE, vec![string.clone()]))
            .with_constructor(vec![])
            .with_method("length", vec![], Type::INT, PUBLIC)
            .with_method("concat", vec![string.clone()], string.clone(), PUBLIC)
            .with_method("equals", vec![object.clone()], Type::BOOLEAN, PUBLIC)
            .with_method("compareTo", vec![string.clone()], Type::INT, PUBLIC)
            .with_method("toString", vec![], string.clone(), PUBLIC)
            .with_method("valueOf", vec![object.clone()], string.clone(), public_static()),
        string_builder,
        ClassInfo::class(names::NUMBER)
            .with_flags(kiln_core::ClassFlags::ABSTRACT)
            .with_constructor(vec![])
            .with_method("intValue", vec![], Type::INT, PUBLIC | MemberFlags::ABSTRACT)
            .with_method("longValue", vec![], Type::LONG, PUBLIC | MemberFlags::ABSTRACT)
            .with_method("doubleValue", vec![], Type::DOUBLE, PUBLIC | MemberFlags::ABSTRACT),
        boxed(names::BOOLEAN, Type::BOOLEAN, "booleanValue", true),
        boxed(names::CHARACTER, Type::CHAR, "charValue", true),
        numeric_box(names::INTEGER, Type::INT, "intValue"),
        numeric_box(names::LONG, Type::LONG, "longValue"),
        numeric_box(names::DOUBLE, Type::DOUBLE, "doubleValue"),
        ClassInfo::class(names::THROWABLE)
            .with_constructor(vec![])
            .with_constructor(vec![string.clone()])
            .with_method("getMessage", vec![], string.clone(), PUBLIC),
        ClassInfo::class(names::EXCEPTION)
            .with_super(Type::reference(names::THROWABLE))
            .with_constructor(vec![])
            .with_constructor(vec![string.clone()]),
        ClassInfo::class(names::RUNTIME_EXCEPTION)
            .with_super(Type::reference(names::EXCEPTION))
            .with_constructor(vec![])
            .with_constructor(vec![string.clone()]),
        ClassInfo::class(names::OBJECTS)
            .with_flags(kiln_core::ClassFlags::FINAL)
            .with_method(
                "equals",
                vec![object.clone(), object.clone()],
                Type::BOOLEAN,
                public_static(),
            )
            .with_method("hashCode", vec![object.clone()], Type::INT, public_static())
            .with_method("toString", vec![object.clone()], string.clone(), public_static()),
        ClassInfo::interface(names::ITERABLE).with_type_parameter("T", object.clone()),
        ClassInfo::interface(names::COLLECTION)
            .with_type_parameter("E", object.clone())
            .with_interface(Type::parameterised(names::ITERABLE, vec![generic("E")]))
            .with_method("size", vec![], Type::INT, PUBLIC | MemberFlags::ABSTRACT)
            .with_method("add", vec![generic("E")], Type::BOOLEAN, PUBLIC | MemberFlags::ABSTRACT),
        ClassInfo::interface(names::LIST)
            .with_type_parameter("E", object.clone())
            .with_interface(Type::parameterised(names::COLLECTION, vec![generic("E")]))
            .with_method("get", vec![Type::INT], generic("E"), PUBLIC | MemberFlags::ABSTRACT),
        ClassInfo::interface(names::MAP)
            .with_type_parameter("K", object.clone())
            .with_type_parameter("V", object.clone())
            .with_method("get", vec![object.clone()], generic("V"), PUBLIC | MemberFlags::ABSTRACT)
            .with_method(
                "put",
                vec![generic("K"), generic("V")],
                generic("V"),
                PUBLIC | MemberFlags::ABSTRACT,
            )
            .with_method("size", vec![], Type::INT, PUBLIC | MemberFlags::ABSTRACT),
        ClassInfo::class(names::HASH_MAP)
            .with_type_parameter("K", object.clone())
            .with_type_parameter("V", object)
            .with_interface(Type::parameterised(names::MAP, vec![generic("K"), generic("V")]))
            .with_constructor(vec![]),
    ]
}

/// [`ClassLoader`] over the platform classes.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformLoader;

impl ClassLoader for PlatformLoader {
    fn load(&self, name: &str) -> Option<ClassInfo> {
        classes().into_iter().find(|info| info.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_supertype_is_itself_a_platform_class() {
        let all = classes();
        for info in &all {
            for s in info.supertypes() {
                let name = s.class_name().unwrap();
                assert!(all.iter().any(|c| c.name == name), "{name} missing");
            }
        }
    }

    #[test]
    fn loader_finds_by_name() {
        assert!(PlatformLoader.load(names::STRING_BUILDER).is_some());
        assert!(PlatformLoader.load("java.lang.Thread").is_none());
    }
}
