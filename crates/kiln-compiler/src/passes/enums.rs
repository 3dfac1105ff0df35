//! Members generated for enumerations.
//!
//! An enumeration `E { A, B }` compiles to a final class with:
//! - a static field and a static accessor `A()` per constant
//! - private `$name` and `$ordinal` instance fields set by a private
//!   `<init>(String, int)`, exposed through `name()` and `ordinal()`
//! - a static `$table` mapping constant names to constants, for
//!   dynamically keyed lookups
//! - with [`EnumCapabilities::DEFAULT`], a static `defaultValue()` returning
//!   the first constant unless the enumeration declares its own
//! - with [`EnumCapabilities::ORDERED`], `Comparable` over ordinals
//!
//! The constants and the table are built by the static initialiser.

use crate::ast::ClassDecl;
use crate::bytecode::{ArithOp, Code, Instruction, InvokeKind, MemberRef, ValueKind};
use crate::env::OperandEnvironment;
use crate::function_compiler::CompiledMethod;
use kiln_core::{ClassInfo, EnumCapabilities, Function, MemberFlags, Signature, Type, names};

pub const TABLE_FIELD: &str = "$table";
pub const NAME_FIELD: &str = "$name";
pub const ORDINAL_FIELD: &str = "$ordinal";
pub const DEFAULT_METHOD: &str = "defaultValue";

const GENERATED_STATIC: MemberFlags = MemberFlags::PUBLIC
    .union(MemberFlags::STATIC)
    .union(MemberFlags::FINAL)
    .union(MemberFlags::SYNTHETIC);

fn table_type(enumeration: &Type) -> Type {
    Type::parameterised(names::MAP, vec![Type::string(), enumeration.clone()])
}

/// Whether the declaration supplies its own `defaultValue()`.
fn declares_default(decl: &ClassDecl) -> bool {
    decl.methods.iter().any(|m| m.name == DEFAULT_METHOD && m.parameters.is_empty())
}

/// Adds the generated fields, methods and constructor to `info`.
pub(crate) fn declare_members(decl: &ClassDecl, info: ClassInfo) -> ClassInfo {
    let ty = info.as_type();
    let mut info = info;
    for constant in &decl.enum_constants {
        info = info
            .with_field(constant, ty.clone(), GENERATED_STATIC)
            .with_method(constant, vec![], ty.clone(), GENERATED_STATIC);
    }
    info = info
        .with_field(TABLE_FIELD, table_type(&ty), GENERATED_STATIC)
        .with_field(NAME_FIELD, Type::string(), MemberFlags::PRIVATE | MemberFlags::FINAL)
        .with_field(ORDINAL_FIELD, Type::INT, MemberFlags::PRIVATE | MemberFlags::FINAL)
        .with_method("name", vec![], Type::string(), MemberFlags::PUBLIC | MemberFlags::SYNTHETIC)
        .with_method("ordinal", vec![], Type::INT, MemberFlags::PUBLIC | MemberFlags::SYNTHETIC);
    info.constructors.push(Function::new(
        Signature::constructor(ty.clone(), vec![Type::string(), Type::INT]),
        MemberFlags::PRIVATE | MemberFlags::SYNTHETIC,
    ));

    if decl.capabilities.contains(EnumCapabilities::DEFAULT) && !declares_default(decl) {
        info = info.with_method(DEFAULT_METHOD, vec![], ty.clone(), GENERATED_STATIC);
    }
    if decl.capabilities.contains(EnumCapabilities::ORDERED) {
        info = info
            .with_interface(Type::parameterised(names::COMPARABLE, vec![ty.clone()]))
            .with_method(
                "compareTo",
                vec![Type::object()],
                Type::INT,
                MemberFlags::PUBLIC | MemberFlags::SYNTHETIC,
            );
    }
    info
}

/// Bodies of the generated methods other than the constructor.
pub(crate) fn generated_methods(decl: &ClassDecl) -> Vec<CompiledMethod> {
    let ty = decl.as_type();
    let owner = decl.name.as_str();
    let descriptor = ty.descriptor();
    let mut methods = Vec::new();

    for constant in &decl.enum_constants {
        methods.push(CompiledMethod {
            signature: Signature::new(ty.clone(), constant.as_str(), vec![], ty.clone()),
            flags: GENERATED_STATIC,
            code: Code::from(vec![
                Instruction::GetStatic(MemberRef::new(owner, constant, descriptor.clone())),
                Instruction::ret(&ty),
            ]),
            max_stack: 1,
            max_locals: 0,
        });
    }

    for (name, field, field_ty) in [
        ("name", NAME_FIELD, Type::string()),
        ("ordinal", ORDINAL_FIELD, Type::INT),
    ] {
        methods.push(CompiledMethod {
            signature: Signature::new(ty.clone(), name, vec![], field_ty.clone()),
            flags: MemberFlags::PUBLIC | MemberFlags::SYNTHETIC,
            code: Code::from(vec![
                Instruction::load(&ty, 0),
                Instruction::GetField(MemberRef::new(owner, field, field_ty.descriptor())),
                Instruction::ret(&field_ty),
            ]),
            max_stack: 1,
            max_locals: 1,
        });
    }

    if decl.capabilities.contains(EnumCapabilities::DEFAULT) && !declares_default(decl) {
        let value = match decl.enum_constants.first() {
            Some(first) => Instruction::GetStatic(MemberRef::new(owner, first, descriptor.clone())),
            None => Instruction::AConstNull,
        };
        methods.push(CompiledMethod {
            signature: Signature::new(ty.clone(), DEFAULT_METHOD, vec![], ty.clone()),
            flags: GENERATED_STATIC,
            code: Code::from(vec![value, Instruction::ret(&ty)]),
            max_stack: 1,
            max_locals: 0,
        });
    }

    if decl.capabilities.contains(EnumCapabilities::ORDERED) {
        let ordinal = MemberRef::new(owner, ORDINAL_FIELD, Type::INT.descriptor());
        methods.push(CompiledMethod {
            signature: Signature::new(ty.clone(), "compareTo", vec![Type::object()], Type::INT),
            flags: MemberFlags::PUBLIC | MemberFlags::SYNTHETIC,
            code: Code::from(vec![
                Instruction::load(&ty, 0),
                Instruction::GetField(ordinal.clone()),
                Instruction::load(&Type::object(), 1),
                Instruction::check_cast(owner),
                Instruction::GetField(ordinal),
                Instruction::Arith { op: ArithOp::Sub, kind: ValueKind::Int },
                Instruction::ret(&Type::INT),
            ]),
            max_stack: 2,
            max_locals: 2,
        });
    }
    methods
}

/// Static-initialiser code creating every constant and filling the table.
pub(crate) fn initialise_constants(decl: &ClassDecl, env: &mut OperandEnvironment) -> Code {
    let ty = decl.as_type();
    let owner = decl.name.as_str();
    let table = MemberRef::new(owner, TABLE_FIELD, Type::reference(names::MAP).descriptor());
    let init = Signature::constructor(ty.clone(), vec![Type::string(), Type::INT]).descriptor();
    let mut code = Code::new();

    for (ordinal, constant) in decl.enum_constants.iter().enumerate() {
        let ordinal = i32::try_from(ordinal).unwrap_or(i32::MAX);
        code.push(Instruction::new_object(owner))
            .push(Instruction::Dup)
            .push(Instruction::SConst(constant.clone()))
            .push(Instruction::IConst(ordinal))
            .push(Instruction::invoke(InvokeKind::Special, owner, names::CONSTRUCTOR, init.as_str()))
            .push(Instruction::PutStatic(MemberRef::new(owner, constant, ty.descriptor())));
    }
    if !decl.enum_constants.is_empty() {
        // NEW, DUP, name, ordinal.
        for pushed in [ty.clone(), ty.clone(), Type::string(), Type::INT] {
            env.push(pushed);
        }
        env.pop_n(4);
    }

    let map = names::HASH_MAP;
    code.push(Instruction::new_object(map))
        .push(Instruction::Dup)
        .push(Instruction::invoke(InvokeKind::Special, map, names::CONSTRUCTOR, "()V"))
        .push(Instruction::PutStatic(table.clone()));
    for constant in &decl.enum_constants {
        code.push(Instruction::GetStatic(table.clone()))
            .push(Instruction::SConst(constant.clone()))
            .push(Instruction::GetStatic(MemberRef::new(owner, constant, ty.descriptor())))
            .push(Instruction::invoke(
                InvokeKind::Interface,
                names::MAP,
                "put",
                "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;",
            ))
            .push(Instruction::Pop);
    }
    // HashMap creation needs two slots; each put needs three.
    let peak = if decl.enum_constants.is_empty() { 2 } else { 3 };
    for _ in 0..peak {
        env.push(Type::object());
    }
    env.pop_n(peak);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Opcode;
    use crate::options::CompilerOptions;
    use pretty_assertions::assert_eq;

    fn color() -> ClassDecl {
        ClassDecl::enumeration("demo.Color", &["RED", "GREEN"])
            .with_capabilities(EnumCapabilities::DEFAULT | EnumCapabilities::ORDERED)
    }

    #[test]
    fn declares_accessors_table_and_capabilities() {
        let decl = color();
        let info = declare_members(&decl, ClassInfo::enumeration("demo.Color", &["RED", "GREEN"]));
        assert_eq!(info.methods_named("RED").count(), 1);
        assert!(info.field(TABLE_FIELD).is_some());
        assert_eq!(info.methods_named(DEFAULT_METHOD).count(), 1);
        assert_eq!(info.constructors.len(), 1);
        assert!(info.interfaces.iter().any(|i| i.class_name() == Some(names::COMPARABLE)));
        assert_eq!(info.name, "demo.Color");
    }

    #[test]
    fn user_default_suppresses_the_generated_one() {
        let decl = color().with_method(
            crate::ast::MethodDecl::new(DEFAULT_METHOD, vec![], Type::reference("demo.Color"))
                .with_flags(MemberFlags::PUBLIC | MemberFlags::STATIC),
        );
        assert!(generated_methods(&decl).iter().all(|m| m.signature.name != DEFAULT_METHOD));
    }

    #[test]
    fn initialiser_builds_constants_in_order() {
        let decl = color();
        let mut env = OperandEnvironment::new(decl.as_type(), true, CompilerOptions::default());
        let code = initialise_constants(&decl, &mut env);
        assert_eq!(code.count(Opcode::PutStatic), 3);
        assert_eq!(code.count(Opcode::InvokeInterface), 2);
        assert_eq!(code.instructions()[3], Instruction::IConst(0));
        assert_eq!(env.max_stack(), 4);
        assert_eq!(env.stack_depth(), 0);
    }
}
