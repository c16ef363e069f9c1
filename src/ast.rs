//! Syntax tree of the calculation language.
//!
//! A `calculation_operation` is parsed into a [`FunctionBody`]: an ordered list of
//! statements that behaves like the body of a zero-argument function, so a
//! `return` statement yields the computed value.

pub type Statements = Vec<Statement>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionBody {
    pub statements: Statements,
}

impl FunctionBody {
    pub fn new(statements: Statements) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeclarationKind {
    Let,
    Const,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration {
        kind: DeclarationKind,
        declarators: Vec<Declarator>,
    },
    Expression(Expression),
    Return(Option<Expression>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    Block(Statements),
    Throw(Expression),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Expression>),
    Object(Vec<(String, Expression)>),
    Member {
        object: Box<Expression>,
        property: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    New {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        consequent: Box<Expression>,
        alternative: Box<Expression>,
    },
    Assign {
        target: String,
        op: AssignOperator,
        value: Box<Expression>,
    },
}

impl Expression {
    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Source-like rendering used in error messages such as `x.y is not a function`.
    pub fn describe(&self) -> String {
        match self {
            Expression::Identifier(name) => name.clone(),
            Expression::This => "this".to_string(),
            Expression::Member { object, property } => {
                format!("{}.{}", object.describe(), property)
            }
            Expression::Index { object, .. } => format!("{}[...]", object.describe()),
            Expression::Call { callee, .. } => format!("{}(...)", callee.describe()),
            Expression::Literal(Literal::String(s)) => format!("\"{}\"", s),
            Expression::Literal(Literal::Number(n)) => n.to_string(),
            _ => "expression".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnaryOperator {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Negate,
    #[strum(serialize = "+")]
    Plus,
    #[strum(serialize = "typeof")]
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "**")]
    Power,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "===")]
    StrictEqual,
    #[strum(serialize = "!==")]
    StrictNotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    // short-circuit
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "??")]
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AssignOperator {
    #[strum(serialize = "=")]
    Assign,
    #[strum(serialize = "+=")]
    Add,
    #[strum(serialize = "-=")]
    Subtract,
    #[strum(serialize = "*=")]
    Multiply,
    #[strum(serialize = "/=")]
    Divide,
    #[strum(serialize = "%=")]
    Modulo,
}

impl AssignOperator {
    /// The arithmetic operator a compound assignment applies, `None` for plain `=`.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignOperator::Assign => None,
            AssignOperator::Add => Some(BinaryOperator::Add),
            AssignOperator::Subtract => Some(BinaryOperator::Subtract),
            AssignOperator::Multiply => Some(BinaryOperator::Multiply),
            AssignOperator::Divide => Some(BinaryOperator::Divide),
            AssignOperator::Modulo => Some(BinaryOperator::Modulo),
        }
    }
}
