//! Enumeration constants.
//!
//! `Color.RED` calls the static accessor generated for the constant. A key
//! computed at run time goes through the generated name table instead, and
//! falls back to the enumeration's default value when nothing matches, so
//! it is only allowed on enumerations declaring
//! [`EnumCapabilities::DEFAULT`].

use super::ExprCompiler;
use crate::ast::{EnumKey, Expression};
use crate::bytecode::{Code, Condition, Instruction, InvokeKind, MemberRef};
use crate::passes::enums::{DEFAULT_METHOD, TABLE_FIELD};
use kiln_core::{ClassInfo, CompilationError, EnumCapabilities, NameKind, Span, Type, names};

impl<'a> ExprCompiler<'a> {
    fn enumeration(&self, enumeration: &Type, span: Span) -> Result<&'a ClassInfo, CompilationError> {
        let info = self.types.reflect(enumeration).ok_or_else(|| {
            CompilationError::unresolved_name(span, NameKind::Type, enumeration.name())
        })?;
        if !info.is_enum() {
            return Err(CompilationError::structural(
                span,
                format!("`{}` is not an enumeration", info.name),
            ));
        }
        Ok(info)
    }

    /// Checks a constant access, returning the enumeration class on success.
    fn check_enum_access(
        &self,
        enumeration: &Type,
        key: &EnumKey,
        span: Span,
    ) -> Result<&'a ClassInfo, CompilationError> {
        let info = self.enumeration(enumeration, span)?;
        match key {
            EnumKey::Literal(name) if !info.has_constant(name) => Err(
                CompilationError::unresolved_name(span, NameKind::EnumConstant, format!("{}.{name}", info.name)),
            ),
            EnumKey::Literal(_) => Ok(info),
            EnumKey::Dynamic(key) => {
                if !info.capabilities.contains(EnumCapabilities::DEFAULT) {
                    return Err(CompilationError::structural(
                        span,
                        format!(
                            "enumeration `{}` has no default value for dynamically selected constants",
                            info.name
                        ),
                    ));
                }
                let found = self.type_of(key);
                if !self.types.is_string(&found) {
                    return Err(CompilationError::type_mismatch(
                        key.span,
                        format!("incompatible types: `{found}` cannot be converted to `{}`", Type::string()),
                    ));
                }
                Ok(info)
            }
        }
    }

    pub(super) fn enum_type(&self, enumeration: &Type, key: &EnumKey) -> Type {
        match self.check_enum_access(enumeration, key, Span::default()) {
            Ok(info) if matches!(key, EnumKey::Literal(_)) => Type::constant(info.as_type()),
            Ok(info) => info.as_type(),
            Err(_) => Type::Null,
        }
    }

    pub(super) fn compile_enum_constant(&mut self, enumeration: &Type, key: &EnumKey, span: Span) -> Code {
        let depth = self.env.stack_depth();
        let info = match self.check_enum_access(enumeration, key, span) {
            Ok(info) => info,
            Err(error) => {
                let mut code = Code::error(error);
                if let EnumKey::Dynamic(key) = key {
                    code.append(self.compile(key));
                }
                return self.placeholder(code, depth);
            }
        };
        let ty = info.as_type();
        let descriptor = format!("(){}", ty.descriptor());

        match key {
            EnumKey::Literal(name) => {
                self.env.push(Type::constant(ty));
                Code::from(Instruction::invoke(InvokeKind::Static, &info.name, name, descriptor))
            }
            EnumKey::Dynamic(key) => self.lookup_constant(info, key, descriptor),
        }
    }

    /// `table.get(key)`, or `defaultValue()` when the key names nothing.
    fn lookup_constant(&mut self, info: &ClassInfo, key: &Expression, default_descriptor: String) -> Code {
        let map = Type::reference(names::MAP);
        let found = self.env.new_label();
        tracing::trace!(enumeration = %info.name, "dynamic enumeration lookup");

        let mut code = Code::from(Instruction::GetStatic(MemberRef::new(
            &info.name,
            TABLE_FIELD,
            map.descriptor(),
        )));
        self.env.push(map);
        code.append(self.compile(key));
        code.push(Instruction::invoke(
            InvokeKind::Interface,
            names::MAP,
            "get",
            "(Ljava/lang/Object;)Ljava/lang/Object;",
        ));
        self.env.pop_n(2);
        self.env.push(Type::object());

        code.push(Instruction::Dup)
            .push(Instruction::jump(Condition::NonNull, found))
            .push(Instruction::Pop)
            .push(Instruction::invoke(InvokeKind::Static, &info.name, DEFAULT_METHOD, default_descriptor))
            .label(found)
            .push(Instruction::check_cast(&info.name));
        self.env.push(Type::object());
        self.env.pop_n(2);
        self.env.push(info.as_type());
        code
    }
}
