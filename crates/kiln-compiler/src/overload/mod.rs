//! Overload resolution for method and constructor calls.
//!
//! ## Algorithm
//!
//! 1. Discard candidates whose arity differs from the argument count
//! 2. Match each remaining candidate position by position with
//!    `is_assignable`, inferring method-level generic variables from the
//!    arguments
//! 3. Fold the per-candidate results with [`MatchResult::better_of`], which
//!    keeps the pairwise most specific candidates
//!
//! Parameterised parameters are matched by their erased class; an argument
//! that only conforms after erasure is still accepted but recorded as a
//! [`GenericMismatch`] so the caller can report it while generating code
//! against the best-guess signature.

mod dispatch;
mod ranking;

pub use dispatch::needs_dynamic_dispatch;

use crate::type_system::{Method, Substitution, TypeSystem, is_generic, substitute};
use kiln_core::Type;

/// An argument that conforms to its parameter only after erasure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericMismatch {
    pub position: usize,
    pub expected: Type,
    pub found: Type,
}

/// A candidate that accepts the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub method: Method,
    /// Parameter types with receiver and inferred type arguments applied.
    pub parameters: Vec<Type>,
    pub return_type: Type,
    pub mismatches: Vec<GenericMismatch>,
    /// Arguments that need a boxing or unboxing conversion.
    pub boxing: usize,
}

impl Match {
    pub fn parameter_types(&self) -> &[Type] {
        &self.parameters
    }

    /// Types the arguments are converted to before the call: the erased
    /// declared parameters, which is what the descriptor names.
    pub fn conversion_targets(&self) -> Vec<Type> {
        self.method
            .function
            .signature
            .parameters
            .iter()
            .map(Type::erasure)
            .collect()
    }

    /// Class to cast the call result to when substitution made the return
    /// type narrower than the declared erasure.
    pub fn result_cast(&self) -> Option<String> {
        let declared = self.method.function.signature.return_type.erasure();
        let actual = self.return_type.erasure();
        if declared == actual || !actual.is_reference() {
            return None;
        }
        actual.class_name().map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Success(Match),
    Ambiguous(Vec<Match>),
    Failed,
}

impl MatchResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, MatchResult::Success(_))
    }

    pub fn as_match(&self) -> Option<&Match> {
        match self {
            MatchResult::Success(m) => Some(m),
            _ => None,
        }
    }
}

/// Selects among candidate callables using a [`TypeSystem`].
pub struct OverloadResolver<'a> {
    types: &'a TypeSystem,
}

impl<'a> OverloadResolver<'a> {
    pub fn new(types: &'a TypeSystem) -> Self {
        Self { types }
    }

    /// Resolves a call with the given static argument types.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(&self, candidates: &[Method], args: &[Type]) -> MatchResult {
        candidates
            .iter()
            .map(|candidate| self.try_match(candidate, args))
            .fold(MatchResult::Failed, |best, next| best.better_of(next, self.types))
    }

    /// Matches a single candidate against the arguments.
    pub fn try_match(&self, candidate: &Method, args: &[Type]) -> MatchResult {
        if candidate.arity() != args.len() {
            return MatchResult::Failed;
        }

        let types = self.types;
        let mut bindings = Substitution::default();
        let mut mismatches = Vec::new();

        for (position, (param, arg)) in candidate.parameters.iter().zip(args).enumerate() {
            match param {
                Type::Variable { name, upper_bound } => {
                    if !types.is_assignable(arg, upper_bound) {
                        return MatchResult::Failed;
                    }
                    if arg.is_null() {
                        continue;
                    }
                    let inferred = types.boxed(arg.unwrap_constant());
                    let bound = match bindings.get(name) {
                        Some(previous) => types.intersect(previous, &inferred),
                        None => inferred,
                    };
                    bindings.insert(name.clone(), bound);
                }
                Type::Parameterised { base, .. } => {
                    if !types.is_assignable(arg, &Type::reference(base.clone())) {
                        return MatchResult::Failed;
                    }
                    let expected = substitute(param, &bindings);
                    if !is_generic(&expected) && !types.is_assignable(arg, &expected) {
                        mismatches.push(GenericMismatch {
                            position,
                            expected,
                            found: arg.clone(),
                        });
                    }
                }
                _ => {
                    if !types.is_assignable(arg, param) {
                        return MatchResult::Failed;
                    }
                }
            }
        }

        // Variables no argument pinned down stand for their bound.
        for variable in &candidate.function.type_parameters {
            if let Type::Variable { name, upper_bound } = variable {
                bindings
                    .entry(name.clone())
                    .or_insert_with(|| (**upper_bound).clone());
            }
        }

        tracing::trace!(
            method = %candidate.function.signature,
            mismatches = mismatches.len(),
            "candidate matched"
        );

        let parameters: Vec<Type> = candidate
            .parameters
            .iter()
            .map(|p| substitute(p, &bindings))
            .collect();
        let boxing = parameters
            .iter()
            .zip(args)
            .filter(|(param, arg)| {
                !arg.is_null() && arg.primitive().is_some() != param.primitive().is_some()
            })
            .count();

        MatchResult::Success(Match {
            parameters,
            return_type: substitute(&candidate.return_type, &bindings),
            method: candidate.clone(),
            mismatches,
            boxing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::{Function, MemberFlags, Signature, names};
    use pretty_assertions::assert_eq;

    fn owner() -> Type {
        Type::reference("demo.Calc")
    }

    fn method(name: &str, params: Vec<Type>, ret: Type) -> Method {
        Method::declared(Function::new(
            Signature::new(owner(), name, params, ret),
            MemberFlags::PUBLIC,
        ))
    }

    fn resolve(candidates: &[Method], args: &[Type]) -> MatchResult {
        let types = TypeSystem::new();
        OverloadResolver::new(&types).resolve(candidates, args)
    }

    fn chosen(result: &MatchResult) -> Vec<Type> {
        result.as_match().expect("expected a single match").parameters.clone()
    }

    #[test]
    fn arity_filters_candidates() {
        let candidates = [
            method("f", vec![Type::DOUBLE], Type::VOID),
            method("f", vec![Type::DOUBLE, Type::DOUBLE], Type::VOID),
        ];
        let result = resolve(&candidates, &[Type::DOUBLE, Type::DOUBLE]);
        assert_eq!(chosen(&result), vec![Type::DOUBLE, Type::DOUBLE]);
    }

    #[test]
    fn most_specific_candidate_wins() {
        let candidates = [
            method("f", vec![Type::object()], Type::VOID),
            method("f", vec![Type::string()], Type::VOID),
            method("f", vec![Type::reference(names::CHAR_SEQUENCE)], Type::VOID),
        ];
        let result = resolve(&candidates, &[Type::string()]);
        assert_eq!(chosen(&result), vec![Type::string()]);
    }

    #[test]
    fn exact_primitive_beats_widening() {
        let candidates = [
            method("f", vec![Type::DOUBLE], Type::VOID),
            method("f", vec![Type::INT], Type::VOID),
        ];
        assert_eq!(chosen(&resolve(&candidates, &[Type::INT])), vec![Type::INT]);
        assert_eq!(chosen(&resolve(&candidates, &[Type::DOUBLE])), vec![Type::DOUBLE]);
    }

    #[test]
    fn candidate_without_boxing_beats_its_box() {
        let boxed = Type::reference(names::DOUBLE);
        let candidates = [
            method("f", vec![boxed.clone()], Type::VOID),
            method("f", vec![Type::DOUBLE], Type::VOID),
        ];
        assert_eq!(chosen(&resolve(&candidates, &[Type::DOUBLE])), vec![Type::DOUBLE]);
        assert_eq!(chosen(&resolve(&candidates, &[boxed.clone()])), vec![boxed]);

        let candidates = [
            method("g", vec![Type::INT], Type::VOID),
            method("g", vec![Type::reference(names::INTEGER)], Type::VOID),
        ];
        assert_eq!(chosen(&resolve(&candidates, &[Type::INT])), vec![Type::INT]);
    }

    #[test]
    fn incomparable_candidates_are_ambiguous() {
        let candidates = [
            method("f", vec![Type::object(), Type::string()], Type::VOID),
            method("f", vec![Type::string(), Type::object()], Type::VOID),
        ];
        let result = resolve(&candidates, &[Type::string(), Type::string()]);
        assert!(matches!(result, MatchResult::Ambiguous(ref all) if all.len() == 2));
    }

    #[test]
    fn nothing_conforming_fails() {
        let candidates = [method("method", vec![Type::string()], Type::VOID)];
        assert_eq!(resolve(&candidates, &[Type::INT]), MatchResult::Failed);
        assert_eq!(resolve(&[], &[]), MatchResult::Failed);
    }

    #[test]
    fn method_variables_are_inferred_from_arguments() {
        let t = Type::variable("T", Type::object());
        let function = Function::new(
            Signature::new(owner(), "id", vec![t.clone()], t.clone()),
            MemberFlags::PUBLIC,
        )
        .with_type_parameter(t);
        let result = resolve(&[Method::declared(function)], &[Type::string()]);
        let m = result.as_match().unwrap();
        assert_eq!(m.return_type, Type::string());
        assert_eq!(m.conversion_targets(), vec![Type::object()]);
        assert_eq!(m.result_cast(), Some(names::STRING.to_string()));
    }

    #[test]
    fn primitive_arguments_bind_their_box() {
        let t = Type::variable("T", Type::object());
        let function = Function::new(
            Signature::new(owner(), "id", vec![t.clone()], t.clone()),
            MemberFlags::PUBLIC,
        )
        .with_type_parameter(t);
        let result = resolve(&[Method::declared(function)], &[Type::INT]);
        assert_eq!(result.as_match().unwrap().return_type, Type::reference(names::INTEGER));
    }

    #[test]
    fn generic_argument_mismatch_is_recorded_not_rejected() {
        let expected = Type::parameterised(names::LIST, vec![Type::string()]);
        let found = Type::parameterised(names::LIST, vec![Type::object()]);
        let candidates = [method("take", vec![expected.clone()], Type::VOID)];
        let result = resolve(&candidates, &[found.clone()]);
        let m = result.as_match().unwrap();
        assert_eq!(
            m.mismatches,
            vec![GenericMismatch { position: 0, expected, found }]
        );
    }

    #[test]
    fn resolution_is_order_independent() {
        let a = method("f", vec![Type::object()], Type::VOID);
        let b = method("f", vec![Type::string()], Type::VOID);
        let c = method("f", vec![Type::reference(names::CHAR_SEQUENCE)], Type::VOID);
        let forward = resolve(&[a.clone(), b.clone(), c.clone()], &[Type::string()]);
        let backward = resolve(&[c, b, a], &[Type::string()]);
        assert_eq!(forward, backward);
    }
}
