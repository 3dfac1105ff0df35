//! For loop compilation.
//!
//! All three header parts are optional; `for (;;)` loops forever. The
//! init declaration is scoped to the loop.
//!
//! ```text
//! [init]
//! start:
//!   [condition -> body | exit]   ; absent condition falls into the body
//! body:
//!   [body]
//!   [update, discarded]
//!   goto start
//! exit:
//! ```

use super::StmtCompiler;
use crate::ast::{Expression, Statement};
use crate::bytecode::{Code, Instruction};

impl<'a> StmtCompiler<'a> {
    pub(super) fn compile_for(
        &mut self,
        init: Option<&Statement>,
        condition: Option<&Expression>,
        update: Option<&Expression>,
        body: &Statement,
    ) -> Code {
        self.env.push_scope();
        let mut code = init.map(|init| self.compile(init)).unwrap_or_default();

        let start = self.env.new_label();
        let body_label = self.env.new_label();
        let exit = self.env.new_label();
        code.label(start);
        if let Some(condition) = condition {
            code.append(self.expr().compile_condition(condition, body_label, exit));
        }
        code.label(body_label);

        self.env.push_scope();
        code.append(self.compile(body));
        self.env.pop_scope();

        if let Some(update) = update {
            code.append(self.expr().compile_discard(update));
        }
        code.push(Instruction::goto(start)).label(exit);
        self.env.pop_scope();
        code
    }
}
