//! Abstract Syntax Tree (AST) definitions for module source.
//!
//! Node names follow ESTree where a counterpart exists.

use std::rc::Rc;

use crate::lexer::Span;

/// A complete program (or function body).
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(Rc<FunctionLiteral>),
    /// Expression statement
    Expression(Expression),
    /// Block statement { ... }
    Block(Vec<Statement>),
    /// If statement
    If(IfStatement),
    /// While statement
    While(WhileStatement),
    /// For statement
    For(ForStatement),
    /// Return statement
    Return(Option<Expression>),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// Throw statement
    Throw(Expression),
    /// Try statement
    Try(TryStatement),
    /// Empty statement (;)
    Empty,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var declaration (function scoped, hoisted)
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// The name being declared
    pub name: String,
    /// Optional initializer expression
    pub init: Option<Expression>,
}

/// A function declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    /// The function name, if any
    pub name: Option<String>,
    /// The parameter names
    pub params: Vec<String>,
    /// The function body
    pub body: Vec<Statement>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// The then branch
    pub consequent: Box<Statement>,
    /// The optional else branch
    pub alternate: Option<Box<Statement>>,
}

/// A while statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    /// The condition
    pub test: Expression,
    /// The loop body
    pub body: Box<Statement>,
}

/// A C-style for statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    /// Initializer (declaration or expression statement)
    pub init: Option<Box<Statement>>,
    /// Loop condition
    pub test: Option<Expression>,
    /// Update expression
    pub update: Option<Expression>,
    /// The loop body
    pub body: Box<Statement>,
}

/// A try statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    /// The protected block
    pub block: Vec<Statement>,
    /// The catch clause
    pub handler: Option<CatchClause>,
    /// The finally block
    pub finalizer: Option<Vec<Statement>>,
}

/// A catch clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// The bound error name (optional catch binding)
    pub param: Option<String>,
    /// The handler body
    pub body: Vec<Statement>,
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// null
    Null,
    /// undefined
    Undefined,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Identifier reference
    Identifier(String),
    /// this
    This,
    /// Array literal
    Array(Vec<Expression>),
    /// Object literal, properties in source order
    Object(Vec<(String, Expression)>),
    /// Function expression
    Function(Rc<FunctionLiteral>),
    /// Unary operation
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        argument: Box<Expression>,
    },
    /// `++`/`--` on an assignable target
    Update {
        /// Increment or decrement
        op: UpdateOp,
        /// Whether the operator precedes the target
        prefix: bool,
        /// The target (identifier or member)
        target: Box<Expression>,
    },
    /// Binary operation
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Short-circuiting logical operation
    Logical {
        /// The operator
        op: LogicalOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Conditional (ternary) expression
    Conditional {
        /// The condition
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
    },
    /// Assignment
    Assign {
        /// The operator
        op: AssignOp,
        /// The target (identifier or member)
        target: Box<Expression>,
        /// The assigned value
        value: Box<Expression>,
    },
    /// Property access
    Member {
        /// The object
        object: Box<Expression>,
        /// The property
        property: MemberProperty,
    },
    /// Function call
    Call {
        /// The callee
        callee: Box<Expression>,
        /// The arguments
        arguments: Vec<Expression>,
        /// Location of the call, for error messages
        span: Span,
    },
    /// `new` expression
    New {
        /// The constructor
        callee: Box<Expression>,
        /// The arguments
        arguments: Vec<Expression>,
    },
}

/// The property part of a member expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `object.name`
    Named(String),
    /// `object[expr]`
    Computed(Box<Expression>),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// !
    Not,
    /// -
    Minus,
    /// +
    Plus,
    /// typeof
    Typeof,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// +
    Add,
    /// -
    Sub,
    /// *
    Mul,
    /// /
    Div,
    /// %
    Mod,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// ===
    StrictEqual,
    /// !==
    StrictNotEqual,
    /// <
    Less,
    /// <=
    LessEqual,
    /// >
    Greater,
    /// >=
    GreaterEqual,
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// &&
    And,
    /// ||
    Or,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// =
    Assign,
    /// +=
    Add,
    /// -=
    Sub,
    /// *=
    Mul,
    /// /=
    Div,
}

impl AssignOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }
}
