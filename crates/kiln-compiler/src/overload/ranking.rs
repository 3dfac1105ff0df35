//! Specificity ranking of matched candidates.
//!
//! [`MatchResult::better_of`] merges two results so that folding a stream
//! of per-candidate results leaves exactly the candidates no other
//! candidate dominates: one survivor is a `Success`, several are
//! `Ambiguous`, none is `Failed`.

use super::{Match, MatchResult};
use crate::type_system::TypeSystem;
use kiln_core::Type;

impl MatchResult {
    pub fn better_of(self, other: MatchResult, types: &TypeSystem) -> MatchResult {
        match (self, other) {
            (MatchResult::Failed, result) | (result, MatchResult::Failed) => result,
            (MatchResult::Success(a), MatchResult::Success(b)) => merge(vec![a], b, types),
            (MatchResult::Ambiguous(maximal), MatchResult::Success(m))
            | (MatchResult::Success(m), MatchResult::Ambiguous(maximal)) => merge(maximal, m, types),
            (MatchResult::Ambiguous(maximal), MatchResult::Ambiguous(more)) => more
                .into_iter()
                .fold(MatchResult::Ambiguous(maximal), |acc, m| {
                    acc.better_of(MatchResult::Success(m), types)
                }),
        }
    }
}

fn merge(mut maximal: Vec<Match>, candidate: Match, types: &TypeSystem) -> MatchResult {
    if !maximal.iter().any(|m| dominates(m, &candidate, types)) {
        maximal.retain(|m| !dominates(&candidate, m, types));
        maximal.push(candidate);
    }
    if maximal.len() == 1 {
        maximal.pop().map_or(MatchResult::Failed, MatchResult::Success)
    } else {
        MatchResult::Ambiguous(maximal)
    }
}

fn all_assignable(types: &TypeSystem, from: &[Type], to: &[Type]) -> bool {
    from.len() == to.len() && from.iter().zip(to).all(|(f, t)| types.is_assignable(f, t))
}

/// Whether `a` is strictly preferable to `b`.
///
/// `a` dominates when its parameters are pairwise assignable to `b`'s but
/// not the other way round. Candidates with mutually assignable parameters
/// are separated by, in order: fewer generic mismatches, fewer boxing
/// conversions, more specific
/// declared parameters, a more derived declaring class, fewer method
/// type parameters.
fn dominates(a: &Match, b: &Match, types: &TypeSystem) -> bool {
    let a_fits = all_assignable(types, &a.parameters, &b.parameters);
    let b_fits = all_assignable(types, &b.parameters, &a.parameters);
    match (a_fits, b_fits) {
        (true, false) => true,
        (true, true) => tie_break(a, b, types),
        _ => false,
    }
}

fn tie_break(a: &Match, b: &Match, types: &TypeSystem) -> bool {
    if a.mismatches.len() != b.mismatches.len() {
        return a.mismatches.len() < b.mismatches.len();
    }
    if a.boxing != b.boxing {
        return a.boxing < b.boxing;
    }

    let a_declared = a.conversion_targets();
    let b_declared = b.conversion_targets();
    let a_narrower = all_assignable(types, &a_declared, &b_declared);
    let b_narrower = all_assignable(types, &b_declared, &a_declared);
    if a_narrower != b_narrower {
        return a_narrower;
    }

    let a_owner = a.method.function.signature.owner.erasure();
    let b_owner = b.method.function.signature.owner.erasure();
    if a_owner != b_owner {
        let a_derived = types.is_assignable(&a_owner, &b_owner);
        let b_derived = types.is_assignable(&b_owner, &a_owner);
        if a_derived != b_derived {
            return a_derived;
        }
    }

    a.method.function.type_parameters.len() < b.method.function.type_parameters.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overload::OverloadResolver;
    use crate::type_system::Method;
    use kiln_core::{Function, MemberFlags, Signature, names};

    fn matched(owner: &str, params: Vec<Type>, args: &[Type], types: &TypeSystem) -> MatchResult {
        let method = Method::declared(Function::new(
            Signature::new(Type::reference(owner), "f", params, Type::VOID),
            MemberFlags::PUBLIC,
        ));
        OverloadResolver::new(types).try_match(&method, args)
    }

    #[test]
    fn failed_is_the_identity() {
        let types = TypeSystem::new();
        let m = matched("demo.A", vec![Type::INT], &[Type::INT], &types);
        assert_eq!(MatchResult::Failed.better_of(m.clone(), &types), m);
        assert_eq!(m.clone().better_of(MatchResult::Failed, &types), m);
    }

    #[test]
    fn dominated_candidates_leave_an_ambiguity() {
        let types = TypeSystem::new();
        let args = [Type::string(), Type::string()];
        let left = matched("demo.A", vec![Type::object(), Type::string()], &args, &types);
        let right = matched("demo.A", vec![Type::string(), Type::object()], &args, &types);
        let best = matched("demo.A", vec![Type::string(), Type::string()], &args, &types);

        let ambiguous = left.better_of(right, &types);
        assert!(matches!(ambiguous, MatchResult::Ambiguous(_)));
        let resolved = ambiguous.better_of(best.clone(), &types);
        assert_eq!(resolved, best);
    }

    #[test]
    fn derived_declaration_breaks_ties() {
        let types = TypeSystem::new();
        let args = [Type::string()];
        let base = matched(names::OBJECT, vec![Type::string()], &args, &types);
        let derived = matched(names::STRING, vec![Type::string()], &args, &types);
        assert_eq!(base.better_of(derived.clone(), &types), derived);
    }

    #[test]
    fn merging_two_ambiguities_keeps_maximal_elements() {
        let types = TypeSystem::new();
        let args = [Type::string(), Type::string()];
        let a = matched("demo.A", vec![Type::object(), Type::string()], &args, &types);
        let b = matched("demo.A", vec![Type::string(), Type::object()], &args, &types);
        let c = matched("demo.A", vec![Type::object(), Type::reference(names::CHAR_SEQUENCE)], &args, &types);
        let d = matched("demo.A", vec![Type::reference(names::CHAR_SEQUENCE), Type::object()], &args, &types);
        let left = a.better_of(b, &types);
        let right = c.better_of(d, &types);
        match left.better_of(right, &types) {
            MatchResult::Ambiguous(all) => assert_eq!(all.len(), 2),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }
}
