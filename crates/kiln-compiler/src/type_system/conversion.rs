//! Instruction sequences implementing legal conversions.

use super::{TypeSystem, widens};
use crate::bytecode::{Instruction, InvokeKind, ValueKind};
use kiln_core::{CompilationError, PrimitiveKind, Type};

type Result<T> = std::result::Result<T, CompilationError>;

impl TypeSystem {
    /// Instructions turning a value of `from` on top of the stack into a
    /// value of `to`.
    ///
    /// Callers validate assignability first; a request between unrelated
    /// types is an internal error.
    pub fn convert(&self, from: &Type, to: &Type) -> Result<Vec<Instruction>> {
        let from = from.unwrap_constant();
        let to = to.unwrap_constant();
        if from == to {
            return Ok(Vec::new());
        }
        if to.is_void() {
            return Ok(Instruction::pop(from.width()).into_iter().collect());
        }
        if from.is_null() {
            return Ok(match to.primitive() {
                Some(_) => [Some(Instruction::Pop), Instruction::zero(to)]
                    .into_iter()
                    .flatten()
                    .collect(),
                None => Vec::new(),
            });
        }

        match (from.primitive(), to.primitive()) {
            (Some(a), Some(b)) if widens(a, b) => Ok(widen(a, b)),
            (Some(a), None) => {
                let kind = self
                    .box_target(a, to)
                    .ok_or_else(|| unrelated(from, to))?;
                let mut out = widen(a, kind);
                out.push(box_value(kind));
                Ok(out)
            }
            (None, Some(b)) => match self.unboxed(from) {
                Some(kind) if widens(kind, b) => {
                    let mut out = vec![unbox_value(kind)];
                    out.extend(widen(kind, b));
                    Ok(out)
                }
                _ => Err(unrelated(from, to)),
            },
            (None, None) => self.convert_reference(from, to),
            _ => Err(unrelated(from, to)),
        }
    }

    fn convert_reference(&self, from: &Type, to: &Type) -> Result<Vec<Instruction>> {
        let target = to.erasure();
        if let Some(class) = target.class_name() {
            if self.is_subclass(from, class) {
                return Ok(Vec::new());
            }
        }
        // Box classes convert along the widening lattice.
        let unboxed = self.unboxed(from);
        let boxed = unboxed.and_then(|kind| self.box_target(kind, to));
        match (unboxed, boxed) {
            (Some(source), Some(dest)) => {
                let mut out = vec![unbox_value(source)];
                out.extend(widen(source, dest));
                out.push(box_value(dest));
                Ok(out)
            }
            _ => Err(unrelated(from, to)),
        }
    }
}

fn unrelated(from: &Type, to: &Type) -> CompilationError {
    CompilationError::internal(format!("no conversion from `{from}` to `{to}`"))
}

/// Primitive widening instructions; empty when both share a category.
pub(crate) fn widen(from: PrimitiveKind, to: PrimitiveKind) -> Vec<Instruction> {
    let from = ValueKind::of_primitive(from);
    let to = ValueKind::of_primitive(to);
    if from == to {
        Vec::new()
    } else {
        vec![Instruction::Convert { from, to }]
    }
}

fn box_value(kind: PrimitiveKind) -> Instruction {
    let class = kind.box_class().unwrap_or_default();
    Instruction::invoke(
        InvokeKind::Static,
        class,
        "valueOf",
        format!("({}){}", kind.descriptor(), Type::reference(class).descriptor()),
    )
}

fn unbox_value(kind: PrimitiveKind) -> Instruction {
    let class = kind.box_class().unwrap_or_default();
    Instruction::invoke(
        InvokeKind::Virtual,
        class,
        kind.unbox_method(),
        format!("(){}", kind.descriptor()),
    )
}
