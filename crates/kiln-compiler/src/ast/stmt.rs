//! Statement nodes.

use super::{Expression, FieldTarget};
use kiln_core::{Span, Type};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Block(Vec<Statement>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    Return(Option<Expression>),
    /// A local declaration; `ty` is inferred from `init` when absent.
    VarDecl {
        name: String,
        ty: Option<Type>,
        init: Option<Expression>,
    },
    FieldWrite {
        target: FieldTarget,
        name: String,
        value: Expression,
    },
    /// An expression evaluated for its effect, typically a call.
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StmtKind,
    pub span: Span,
}

impl Statement {
    pub fn new(kind: StmtKind) -> Self {
        Self { kind, span: Span::default() }
    }

    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.span = Span::point(line, col);
        self
    }

    pub fn block(statements: Vec<Statement>) -> Self {
        Self::new(StmtKind::Block(statements))
    }

    pub fn if_then(condition: Expression, then_branch: Statement) -> Self {
        Self::new(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: None,
        })
    }

    pub fn if_else(condition: Expression, then_branch: Statement, else_branch: Statement) -> Self {
        Self::new(StmtKind::If {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        })
    }

    pub fn for_loop(
        init: Option<Statement>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Statement,
    ) -> Self {
        Self::new(StmtKind::For {
            init: init.map(Box::new),
            condition,
            update,
            body: Box::new(body),
        })
    }

    pub fn ret(value: Expression) -> Self {
        Self::new(StmtKind::Return(Some(value)))
    }

    pub fn ret_void() -> Self {
        Self::new(StmtKind::Return(None))
    }

    pub fn var(name: &str, ty: Option<Type>, init: Option<Expression>) -> Self {
        Self::new(StmtKind::VarDecl { name: name.to_string(), ty, init })
    }

    pub fn field_write(target: FieldTarget, name: &str, value: Expression) -> Self {
        Self::new(StmtKind::FieldWrite { target, name: name.to_string(), value })
    }

    pub fn expr(expression: Expression) -> Self {
        let span = expression.span;
        Self { kind: StmtKind::Expression(expression), span }
    }

    /// Whether this statement assigns field `name` of the current instance,
    /// directly or through any nested statement or expression.
    pub fn writes_field(&self, name: &str) -> bool {
        match &self.kind {
            StmtKind::Block(statements) => statements.iter().any(|s| s.writes_field(name)),
            StmtKind::If { condition, then_branch, else_branch } => {
                expression_writes_field(condition, name)
                    || then_branch.writes_field(name)
                    || else_branch.as_ref().is_some_and(|s| s.writes_field(name))
            }
            StmtKind::For { init, condition, update, body } => {
                init.as_ref().is_some_and(|s| s.writes_field(name))
                    || condition.as_ref().is_some_and(|e| expression_writes_field(e, name))
                    || update.as_ref().is_some_and(|e| expression_writes_field(e, name))
                    || body.writes_field(name)
            }
            StmtKind::Return(value) => value.as_ref().is_some_and(|e| expression_writes_field(e, name)),
            StmtKind::VarDecl { init, .. } => init.as_ref().is_some_and(|e| expression_writes_field(e, name)),
            StmtKind::FieldWrite { target, name: written, value } => {
                (written == name && is_own_field(target)) || expression_writes_field(value, name)
            }
            StmtKind::Expression(expression) => expression_writes_field(expression, name),
        }
    }
}

fn is_own_field(target: &FieldTarget) -> bool {
    matches!(target, FieldTarget::Implicit | FieldTarget::This)
}

fn expression_writes_field(expression: &Expression, name: &str) -> bool {
    if let super::ExprKind::FieldWrite { target, name: written, .. } = &expression.kind {
        if written == name && is_own_field(target) {
            return true;
        }
    }
    expression.children().into_iter().any(|child| expression_writes_field(child, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nested_field_writes() {
        let body = Statement::block(vec![Statement::if_then(
            Expression::boolean(true),
            Statement::expr(Expression::field_write(
                FieldTarget::This,
                "count",
                Expression::int(1),
            )),
        )]);
        assert!(body.writes_field("count"));
        assert!(!body.writes_field("other"));
    }

    #[test]
    fn writes_through_another_receiver_do_not_count() {
        let stmt = Statement::field_write(
            FieldTarget::Instance(Box::new(Expression::var("peer"))),
            "count",
            Expression::int(1),
        );
        assert!(!stmt.writes_field("count"));
    }
}
