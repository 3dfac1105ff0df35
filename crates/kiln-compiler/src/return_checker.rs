//! Return path verification for non-void methods.
//!
//! [`ReturnChecker`] works on the statement tree rather than on emitted
//! code: a body "cannot complete normally" when every path through it ends
//! in a `return` or loops forever. The language has no `break`, so a
//! `for` without a condition never completes.

use crate::ast::{Statement, StmtKind};

/// Decides whether a body can run off its end.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReturnChecker;

impl ReturnChecker {
    pub fn new() -> Self {
        Self
    }

    /// Whether every path through `body` ends without falling off the end.
    pub fn all_paths_return(&self, body: &[Statement]) -> bool {
        body.iter().any(|stmt| self.always_returns(stmt))
    }

    /// Whether `stmt` never completes normally.
    pub fn always_returns(&self, stmt: &Statement) -> bool {
        match &stmt.kind {
            StmtKind::Return(_) => true,
            StmtKind::Block(statements) => self.all_paths_return(statements),
            StmtKind::If { then_branch, else_branch: Some(else_branch), .. } => {
                self.always_returns(then_branch) && self.always_returns(else_branch)
            }
            StmtKind::If { else_branch: None, .. } => false,
            StmtKind::For { condition, .. } => condition.is_none(),
            StmtKind::VarDecl { .. } | StmtKind::FieldWrite { .. } | StmtKind::Expression(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;

    fn ret() -> Statement {
        Statement::ret(Expression::int(1))
    }

    #[test]
    fn if_without_else_can_complete() {
        let checker = ReturnChecker::new();
        assert!(!checker.all_paths_return(&[Statement::if_then(Expression::var("c"), ret())]));
    }

    #[test]
    fn both_branches_returning_is_enough() {
        let checker = ReturnChecker::new();
        let body = [Statement::if_else(
            Expression::var("c"),
            Statement::block(vec![ret()]),
            ret(),
        )];
        assert!(checker.all_paths_return(&body));
    }

    #[test]
    fn infinite_loop_never_completes() {
        let checker = ReturnChecker::new();
        let forever = Statement::for_loop(None, None, None, Statement::block(vec![]));
        let bounded = Statement::for_loop(None, Some(Expression::var("c")), None, ret());
        assert!(checker.always_returns(&forever));
        assert!(!checker.always_returns(&bounded));
    }

    #[test]
    fn statements_after_a_return_do_not_matter() {
        let checker = ReturnChecker::new();
        let body = [ret(), Statement::expr(Expression::var("x"))];
        assert!(checker.all_paths_return(&body));
        assert!(!checker.all_paths_return(&[]));
    }
}
