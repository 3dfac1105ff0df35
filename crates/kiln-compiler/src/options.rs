//! Compiler configuration.

use kiln_core::names;

/// Knobs that change code generation without changing the language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Rewrite self-recursive calls in final position into jumps.
    pub tail_calls: bool,
    /// Emit indirect call sites for calls whose static types are broader
    /// than every overload; when off such calls are reported as errors.
    pub dynamic_dispatch: bool,
    /// Class holding the runtime dispatch-cache bootstrap method.
    pub bootstrap_owner: String,
    pub bootstrap_name: String,
    /// Exception class a try-expression catches when none is given.
    pub default_catch_type: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            tail_calls: true,
            dynamic_dispatch: true,
            bootstrap_owner: "kiln.runtime.DispatchCache".to_string(),
            bootstrap_name: "bootstrap".to_string(),
            default_catch_type: names::EXCEPTION.to_string(),
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tail_calls(mut self, enabled: bool) -> Self {
        self.tail_calls = enabled;
        self
    }

    pub fn with_dynamic_dispatch(mut self, enabled: bool) -> Self {
        self.dynamic_dispatch = enabled;
        self
    }

    pub fn with_bootstrap(mut self, owner: impl Into<String>, name: impl Into<String>) -> Self {
        self.bootstrap_owner = owner.into();
        self.bootstrap_name = name.into();
        self
    }

    pub fn with_default_catch_type(mut self, class: impl Into<String>) -> Self {
        self.default_catch_type = class.into();
        self
    }

    /// Descriptor of the bootstrap method.
    pub fn bootstrap_descriptor(&self) -> &'static str {
        "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let options = CompilerOptions::default();
        assert!(options.tail_calls);
        assert!(options.dynamic_dispatch);
        assert_eq!(options.default_catch_type, names::EXCEPTION);
    }

    #[test]
    fn builders_override_fields() {
        let options = CompilerOptions::new()
            .with_tail_calls(false)
            .with_bootstrap("rt.Linker", "link");
        assert!(!options.tail_calls);
        assert_eq!(options.bootstrap_owner, "rt.Linker");
        assert_eq!(options.bootstrap_name, "link");
    }
}
