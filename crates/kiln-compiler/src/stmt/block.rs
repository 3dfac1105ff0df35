//! Block statements.

use super::StmtCompiler;
use crate::ast::Statement;
use crate::bytecode::Code;

impl<'a> StmtCompiler<'a> {
    /// Compiles `{ ... }` in a fresh local scope. Locals declared inside
    /// go out of scope, and their slots become reusable, at the closing
    /// brace.
    pub(super) fn compile_block(&mut self, statements: &[Statement], tail: bool) -> Code {
        self.env.push_scope();
        let code = self.compile_sequence(statements, tail);
        self.env.pop_scope();
        code
    }
}
