//! Deterministic 64-bit identities for classes and method signatures.
//!
//! [`TypeHash`] keys the class table and the duplicate-signature check.
//! Hashes are computed from names with XXHash64, so the same class or
//! signature always hashes the same way regardless of declaration order.
//!
//! ```
//! use kiln_core::TypeHash;
//!
//! let a = TypeHash::from_method("fib", &[TypeHash::from_name("double")]);
//! let b = TypeHash::from_method("fib", &[TypeHash::from_name("double")]);
//! assert_eq!(a, b);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain mixing constants; keeps a class named `foo` from colliding with a
/// method named `foo`.
mod domain {
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;
    pub const PARAM: u64 = 0x9e3779b97f4a7c15;
}

/// A deterministic hash identifying a class, a parameterisation or a
/// method signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a fully-qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(domain::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a method name plus its (erased) parameter types.
    ///
    /// The return type does not participate: two methods differing only in
    /// return type are duplicates.
    #[inline]
    pub fn from_method(name: &str, params: &[TypeHash]) -> Self {
        Self::mix(domain::METHOD ^ xxh64(name.as_bytes(), 0), params)
    }

    /// Hash of a constructor of `owner` with the given parameters.
    #[inline]
    pub fn from_constructor(owner: TypeHash, params: &[TypeHash]) -> Self {
        Self::mix(domain::CONSTRUCTOR ^ owner.0, params)
    }

    /// Hash of a parameterised instantiation such as `Map<String, Object>`.
    #[inline]
    pub fn from_parameterised(base: TypeHash, args: &[TypeHash]) -> Self {
        Self::mix(base.0, args)
    }

    fn mix(seed: u64, parts: &[TypeHash]) -> Self {
        // Multiplication makes argument order significant.
        let hash = parts.iter().enumerate().fold(seed, |hash, (i, part)| {
            let marker = domain::PARAM.wrapping_mul(i as u64 + 1);
            hash.wrapping_mul(domain::SEP).wrapping_add(marker ^ part.0)
        });
        TypeHash(hash)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
