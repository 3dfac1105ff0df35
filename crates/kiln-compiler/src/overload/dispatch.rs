//! When to defer a call to the runtime dispatch cache.
//!
//! A call whose static resolution fails can still be legal at run time if
//! the static types are broader than what a candidate accepts: an `Object`
//! argument may hold exactly the `String` some overload wants. Such calls
//! become indirect call sites. Genuine ambiguities, where every argument
//! already conforms to several incomparable candidates, stay compile-time
//! errors.

use super::MatchResult;
use crate::type_system::{Method, TypeSystem};
use kiln_core::{Type, names};

/// Whether a call should be emitted as an indirect call site.
///
/// True when resolution did not succeed and either the receiver is
/// statically the universal object type with no candidate at all, or some
/// arity-matching candidate accepts every argument that conforms and has a
/// parameter strictly narrower than each argument that does not.
pub fn needs_dynamic_dispatch(
    types: &TypeSystem,
    receiver: &Type,
    candidates: &[Method],
    args: &[Type],
    result: &MatchResult,
) -> bool {
    if result.is_success() {
        return false;
    }
    if candidates.is_empty() {
        return receiver.erasure().class_name() == Some(names::OBJECT);
    }
    candidates
        .iter()
        .filter(|candidate| candidate.arity() == args.len())
        .any(|candidate| admits_narrower_runtime_types(types, &candidate.parameters, args))
}

fn admits_narrower_runtime_types(types: &TypeSystem, params: &[Type], args: &[Type]) -> bool {
    let mut broader = false;
    for (param, arg) in params.iter().zip(args) {
        if types.is_assignable(arg, param) {
            continue;
        }
        if arg.is_reference() && types.is_assignable(&param.erasure(), arg) {
            broader = true;
            continue;
        }
        return false;
    }
    broader
}
