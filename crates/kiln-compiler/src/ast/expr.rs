//! Expression nodes.

use kiln_core::{Span, Type};
use ordered_float::OrderedFloat;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Boolean(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Double(OrderedFloat<f64>),
    String(String),
    Null,
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Boolean(_) => Type::BOOLEAN,
            Literal::Char(_) => Type::CHAR,
            Literal::Int(_) => Type::INT,
            Literal::Long(_) => Type::LONG,
            Literal::Double(_) => Type::DOUBLE,
            Literal::String(_) => Type::string(),
            Literal::Null => Type::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Verb used in operand diagnostics: "cannot add X and Y".
    pub fn verb(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "subtract",
            BinaryOp::Mul => "multiply",
            BinaryOp::Div => "divide",
            BinaryOp::Rem => "take the remainder of",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    #[inline]
    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    /// The operator that holds exactly when `self` does not.
    pub fn negate(self) -> CompareOp {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Ge => CompareOp::Lt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Le => CompareOp::Gt,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Where a field lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// A field of the current class, named without a receiver.
    Implicit,
    This,
    Instance(Box<Expression>),
    Static(Type),
}

/// What a call is made on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// A method of the current class, named without a receiver.
    Implicit,
    This,
    Instance(Box<Expression>),
    Static(Type),
}

/// How an enumeration constant is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumKey {
    Literal(String),
    /// A string-valued expression looked up in the generated table.
    Dynamic(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(Literal),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// `a < b <= c`: each operator compares its neighbours.
    Comparison {
        first: Box<Expression>,
        rest: Vec<(CompareOp, Expression)>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Increment {
        name: String,
        delta: i8,
        prefix: bool,
    },
    Variable(String),
    Assign {
        name: String,
        value: Box<Expression>,
    },
    FieldRead {
        target: FieldTarget,
        name: String,
    },
    FieldWrite {
        target: FieldTarget,
        name: String,
        value: Box<Expression>,
    },
    Call {
        target: CallTarget,
        name: String,
        arguments: Vec<Expression>,
    },
    Construct {
        class: Type,
        arguments: Vec<Expression>,
    },
    /// Evaluates `body`; an exception of `catch_type` becomes the value.
    Try {
        body: Box<Expression>,
        catch_type: Option<Type>,
    },
    EnumConstant {
        enumeration: Type,
        key: EnumKey,
    },
    /// Explicit string concatenation of all parts.
    Concat(Vec<Expression>),
    This,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expression {
    pub fn new(kind: ExprKind) -> Self {
        Self { kind, span: Span::default() }
    }

    /// Attaches a source position.
    pub fn at(mut self, line: u32, col: u32) -> Self {
        self.span = Span::point(line, col);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // =========================================================================
    // Construction helpers
    // =========================================================================

    pub fn literal(literal: Literal) -> Self {
        Self::new(ExprKind::Literal(literal))
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(Literal::Boolean(value))
    }

    pub fn int(value: i32) -> Self {
        Self::literal(Literal::Int(value))
    }

    pub fn long(value: i64) -> Self {
        Self::literal(Literal::Long(value))
    }

    /// A language number literal.
    pub fn number(value: f64) -> Self {
        Self::literal(Literal::Double(OrderedFloat(value)))
    }

    pub fn char(value: char) -> Self {
        Self::literal(Literal::Char(value))
    }

    pub fn string(value: &str) -> Self {
        Self::literal(Literal::String(value.to_string()))
    }

    pub fn null() -> Self {
        Self::literal(Literal::Null)
    }

    pub fn var(name: &str) -> Self {
        Self::new(ExprKind::Variable(name.to_string()))
    }

    pub fn this() -> Self {
        Self::new(ExprKind::This)
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::new(ExprKind::Binary { op, left: Box::new(left), right: Box::new(right) })
    }

    pub fn add(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Add, left, right)
    }

    pub fn sub(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOp::Sub, left, right)
    }

    pub fn compare(left: Expression, op: CompareOp, right: Expression) -> Self {
        Self::chain(left, vec![(op, right)])
    }

    pub fn chain(first: Expression, rest: Vec<(CompareOp, Expression)>) -> Self {
        Self::new(ExprKind::Comparison { first: Box::new(first), rest })
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::new(ExprKind::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) })
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::new(ExprKind::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) })
    }

    pub fn not(operand: Expression) -> Self {
        Self::new(ExprKind::Unary { op: UnaryOp::Not, operand: Box::new(operand) })
    }

    pub fn neg(operand: Expression) -> Self {
        Self::new(ExprKind::Unary { op: UnaryOp::Neg, operand: Box::new(operand) })
    }

    pub fn increment(name: &str, delta: i8, prefix: bool) -> Self {
        Self::new(ExprKind::Increment { name: name.to_string(), delta, prefix })
    }

    pub fn assign(name: &str, value: Expression) -> Self {
        Self::new(ExprKind::Assign { name: name.to_string(), value: Box::new(value) })
    }

    pub fn field(name: &str) -> Self {
        Self::new(ExprKind::FieldRead { target: FieldTarget::Implicit, name: name.to_string() })
    }

    pub fn field_of(receiver: Expression, name: &str) -> Self {
        Self::new(ExprKind::FieldRead {
            target: FieldTarget::Instance(Box::new(receiver)),
            name: name.to_string(),
        })
    }

    pub fn static_field(owner: Type, name: &str) -> Self {
        Self::new(ExprKind::FieldRead { target: FieldTarget::Static(owner), name: name.to_string() })
    }

    pub fn field_write(target: FieldTarget, name: &str, value: Expression) -> Self {
        Self::new(ExprKind::FieldWrite { target, name: name.to_string(), value: Box::new(value) })
    }

    /// A call on the current class.
    pub fn call(name: &str, arguments: Vec<Expression>) -> Self {
        Self::new(ExprKind::Call { target: CallTarget::Implicit, name: name.to_string(), arguments })
    }

    pub fn call_on(receiver: Expression, name: &str, arguments: Vec<Expression>) -> Self {
        Self::new(ExprKind::Call {
            target: CallTarget::Instance(Box::new(receiver)),
            name: name.to_string(),
            arguments,
        })
    }

    pub fn call_static(owner: Type, name: &str, arguments: Vec<Expression>) -> Self {
        Self::new(ExprKind::Call { target: CallTarget::Static(owner), name: name.to_string(), arguments })
    }

    pub fn construct(class: Type, arguments: Vec<Expression>) -> Self {
        Self::new(ExprKind::Construct { class, arguments })
    }

    pub fn try_catch(body: Expression, catch_type: Option<Type>) -> Self {
        Self::new(ExprKind::Try { body: Box::new(body), catch_type })
    }

    pub fn enum_constant(enumeration: Type, name: &str) -> Self {
        Self::new(ExprKind::EnumConstant { enumeration, key: EnumKey::Literal(name.to_string()) })
    }

    pub fn enum_lookup(enumeration: Type, key: Expression) -> Self {
        Self::new(ExprKind::EnumConstant { enumeration, key: EnumKey::Dynamic(Box::new(key)) })
    }

    pub fn concat(parts: Vec<Expression>) -> Self {
        Self::new(ExprKind::Concat(parts))
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Direct sub-expressions in evaluation order.
    pub fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::Variable(_)
            | ExprKind::Increment { .. }
            | ExprKind::This => Vec::new(),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                vec![&**left, &**right]
            }
            ExprKind::Comparison { first, rest } => std::iter::once(&**first)
                .chain(rest.iter().map(|(_, operand)| operand))
                .collect(),
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Assign { value, .. } => vec![&**value],
            ExprKind::FieldRead { target, .. } => match target {
                FieldTarget::Instance(receiver) => vec![&**receiver],
                _ => Vec::new(),
            },
            ExprKind::FieldWrite { target, value, .. } => match target {
                FieldTarget::Instance(receiver) => vec![&**receiver, &**value],
                _ => vec![&**value],
            },
            ExprKind::Call { target, arguments, .. } => {
                let receiver = match target {
                    CallTarget::Instance(receiver) => Some(&**receiver),
                    _ => None,
                };
                receiver.into_iter().chain(arguments.iter()).collect()
            }
            ExprKind::Construct { arguments, .. } => arguments.iter().collect(),
            ExprKind::Try { body, .. } => vec![&**body],
            ExprKind::EnumConstant { key, .. } => match key {
                EnumKey::Dynamic(key) => vec![&**key],
                EnumKey::Literal(_) => Vec::new(),
            },
            ExprKind::Concat(parts) => parts.iter().collect(),
        }
    }

    /// Names of local variables this expression reads, in evaluation order.
    pub fn variable_reads(&self) -> Vec<&str> {
        let mut reads = Vec::new();
        self.collect_reads(&mut reads);
        reads
    }

    fn collect_reads<'a>(&'a self, reads: &mut Vec<&'a str>) {
        match &self.kind {
            ExprKind::Variable(name) | ExprKind::Increment { name, .. } => reads.push(name),
            _ => {}
        }
        for child in self.children() {
            child.collect_reads(reads);
        }
    }

    /// The literal boolean this expression is, if it is one.
    pub fn as_boolean(&self) -> Option<bool> {
        match self.kind {
            ExprKind::Literal(Literal::Boolean(value)) => Some(value),
            _ => None,
        }
    }
}
