//! Generic parameter substitution.

use kiln_core::Type;
use rustc_hash::FxHashMap;

/// Generic parameter name to the type bound to it.
pub type Substitution = FxHashMap<String, Type>;

/// Replaces every bound `Variable`/`Bounded` in `ty`.
pub fn substitute(ty: &Type, bindings: &Substitution) -> Type {
    if bindings.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::Variable { name, .. } | Type::Bounded { name, .. } => {
            bindings.get(name).cloned().unwrap_or_else(|| ty.clone())
        }
        Type::Parameterised { base, arguments } => Type::Parameterised {
            base: base.clone(),
            arguments: arguments.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
        Type::Constant(inner) => Type::constant(substitute(inner, bindings)),
        other => other.clone(),
    }
}

/// Whether `ty` still mentions a generic parameter.
pub fn is_generic(ty: &Type) -> bool {
    match ty {
        Type::Variable { .. } | Type::Bounded { .. } => true,
        Type::Parameterised { arguments, .. } => arguments.iter().any(is_generic),
        Type::Constant(inner) => is_generic(inner),
        _ => false,
    }
}
