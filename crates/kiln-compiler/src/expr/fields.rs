//! Field reads and writes.

use super::ExprCompiler;
use crate::ast::{Expression, FieldTarget};
use crate::bytecode::{Code, Instruction, MemberRef};
use kiln_core::{CompilationError, Field, NameKind, Span, Type, names};

impl<'a> ExprCompiler<'a> {
    fn field_owner(&self, target: &FieldTarget) -> Type {
        match target {
            FieldTarget::Implicit | FieldTarget::This => self.env.class_type().clone(),
            FieldTarget::Instance(receiver) => self.type_of(receiver),
            FieldTarget::Static(owner) => owner.clone(),
        }
    }

    pub(super) fn field_type(&self, target: &FieldTarget, name: &str) -> Type {
        let owner = self.field_owner(target);
        self.types.field(&owner, name).map_or(Type::Null, |(_, ty)| ty)
    }

    /// Pushes the receiver an access to `field` needs, if any.
    fn field_receiver(&mut self, target: &FieldTarget, field: &Field, span: Span) -> Code {
        if field.is_static() {
            return match target {
                FieldTarget::Instance(receiver) => self.compile_discard(receiver),
                _ => Code::new(),
            };
        }
        match target {
            FieldTarget::Implicit | FieldTarget::This => self.load_this(span),
            FieldTarget::Instance(receiver) => self.compile(receiver),
            FieldTarget::Static(_) => {
                self.env.push(Type::Null);
                let mut code = Code::error(CompilationError::structural(
                    span,
                    format!("non-static field `{}` cannot be referenced from a static context", field.name),
                ));
                code.push(Instruction::AConstNull);
                code
            }
        }
    }

    fn unknown_field(&mut self, target: &FieldTarget, name: &str, span: Span) -> Code {
        let owner = self.field_owner(target);
        let mut code = match target {
            FieldTarget::Instance(receiver) => self.compile(receiver),
            _ => Code::new(),
        };
        code.diagnostic(CompilationError::unresolved_name(
            span,
            NameKind::Field,
            format!("{owner}.{name}"),
        ));
        code
    }

    pub(super) fn compile_field_read(&mut self, target: &FieldTarget, name: &str, span: Span) -> Code {
        let depth = self.env.stack_depth();
        let owner = self.field_owner(target);
        let Some((field, ty)) = self.types.field(&owner, name) else {
            let code = self.unknown_field(target, name, span);
            return self.placeholder(code, depth);
        };

        let mut code = self.field_receiver(target, &field, span);
        let member = member_ref(&field);
        if field.is_static() {
            code.push(Instruction::GetStatic(member));
        } else {
            code.push(Instruction::GetField(member));
            self.env.pop();
        }
        if let Some(class) = narrowed_class(&field, &ty) {
            code.push(Instruction::check_cast(&class));
        }
        self.env.push(ty);
        code
    }

    /// Stores `value` into a field; `keep` leaves the stored value on the
    /// stack as the expression's result.
    pub(crate) fn compile_field_write(
        &mut self,
        target: &FieldTarget,
        name: &str,
        value: &Expression,
        keep: bool,
        span: Span,
    ) -> Code {
        let depth = self.env.stack_depth();
        let owner = self.field_owner(target);
        let Some((field, ty)) = self.types.field(&owner, name) else {
            let mut code = self.unknown_field(target, name, span);
            code.append(self.compile(value));
            return if keep { self.placeholder(code, depth) } else { self.discard_to(code, depth) };
        };

        let mut code = self.field_receiver(target, &field, span);
        if field.is_final() && !self.initialises(&field) {
            code.diagnostic(CompilationError::structural(
                span,
                format!("cannot assign a value to final field `{}`", field.name),
            ));
        }
        code.append(self.compile_to(value, &ty));

        let member = member_ref(&field);
        if field.is_static() {
            if keep {
                code.push_opt(Instruction::dup(ty.width()));
                self.env.push(ty.clone());
            }
            code.push(Instruction::PutStatic(member));
            self.env.pop();
        } else {
            if keep {
                // value receiver value
                code.push(if ty.width() == 2 { Instruction::Dup2X1 } else { Instruction::DupX1 });
                let receiver = self.env.pop().zip(self.env.pop()).map(|(_, receiver)| receiver);
                self.env.push(ty.clone());
                self.env.push(receiver.unwrap_or(Type::Null));
                self.env.push(ty.clone());
            }
            code.push(Instruction::PutField(member));
            self.env.pop_n(2);
        }
        code
    }

    /// Whether the method being compiled may assign the final `field`:
    /// a constructor of its class, or the static initialiser for static
    /// fields.
    fn initialises(&self, field: &Field) -> bool {
        let expected = if field.is_static() { names::STATIC_INIT } else { names::CONSTRUCTOR };
        self.env.frame().is_some_and(|frame| {
            frame.signature.name == expected
                && frame.signature.owner.class_name() == field.owner.class_name()
        })
    }
}

pub(crate) fn member_ref(field: &Field) -> MemberRef {
    MemberRef::new(
        field.owner.class_name().unwrap_or(names::OBJECT),
        &field.name,
        field.ty.descriptor(),
    )
}

/// Class to cast a read to when substitution narrowed the declared type.
fn narrowed_class(field: &Field, seen: &Type) -> Option<String> {
    let declared = field.ty.erasure();
    let actual = seen.erasure();
    if declared == actual || !actual.is_reference() {
        return None;
    }
    actual.class_name().map(str::to_string)
}
