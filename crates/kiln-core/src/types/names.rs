//! Fully-qualified names of the platform classes the compiler relies on.

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const CHAR_SEQUENCE: &str = "java.lang.CharSequence";
pub const STRING_BUILDER: &str = "java.lang.StringBuilder";
pub const COMPARABLE: &str = "java.lang.Comparable";
pub const NUMBER: &str = "java.lang.Number";
pub const BOOLEAN: &str = "java.lang.Boolean";
pub const CHARACTER: &str = "java.lang.Character";
pub const INTEGER: &str = "java.lang.Integer";
pub const LONG: &str = "java.lang.Long";
pub const DOUBLE: &str = "java.lang.Double";
pub const THROWABLE: &str = "java.lang.Throwable";
pub const EXCEPTION: &str = "java.lang.Exception";
pub const RUNTIME_EXCEPTION: &str = "java.lang.RuntimeException";
pub const OBJECTS: &str = "java.util.Objects";
pub const ITERABLE: &str = "java.lang.Iterable";
pub const COLLECTION: &str = "java.util.Collection";
pub const LIST: &str = "java.util.List";
pub const MAP: &str = "java.util.Map";
pub const HASH_MAP: &str = "java.util.HashMap";

/// Method name of instance initialisers.
pub const CONSTRUCTOR: &str = "<init>";
/// Method name of the static initialiser.
pub const STATIC_INIT: &str = "<clinit>";

/// Converts a dotted qualified name into its slash-separated internal form.
pub fn internal(name: &str) -> String {
    name.replace('.', "/")
}
