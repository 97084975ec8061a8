//! The main parser implementation.

use std::rc::Rc;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Scanner, Span, Token, TokenKind};

/// How deeply statements and expressions may nest before parsing fails
/// with a `SyntaxError`. Bounds native recursion in the parser and in the
/// evaluator that later walks the tree.
pub const MAX_NESTING_DEPTH: usize = 128;

/// A recursive descent parser for module source.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::default(), false),
            depth: 0,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<Statement> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                self.consume_semicolon()?;
                Ok(declaration)
            }
            TokenKind::Function => self.parse_function_declaration(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Break)
            }
            TokenKind::Continue => {
                self.advance();
                self.consume_semicolon()?;
                Ok(Statement::Continue)
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            _ => {
                let expression = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::Expression(expression))
            }
        }
    }

    /// Parses `var`/`let`/`const` declarators, without the trailing semicolon.
    fn parse_variable_declaration(&mut self) -> Result<Statement> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.error_at_current("Expected variable keyword")),
        };
        self.advance();

        let mut declarations = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let init = if self.matches(&TokenKind::Equal) {
                Some(self.parse_assignment()?)
            } else if kind == VariableKind::Const {
                return Err(self.error_at_current("Missing initializer in const declaration"));
            } else {
                None
            };
            declarations.push(VariableDeclarator { name, init });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        Ok(Statement::VariableDeclaration(VariableDeclaration {
            kind,
            declarations,
        }))
    }

    fn parse_function_declaration(&mut self) -> Result<Statement> {
        self.advance(); // consume 'function'
        let name = self.expect_identifier()?;
        let literal = self.parse_function_rest(Some(name))?;
        Ok(Statement::FunctionDeclaration(literal))
    }

    /// Parses `(params) { body }` after the `function` keyword and name.
    fn parse_function_rest(&mut self, name: Option<String>) -> Result<Rc<FunctionLiteral>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_block()?;
        Ok(Rc::new(FunctionLiteral { name, params, body }))
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(body)
    }

    fn parse_if_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.matches(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'for'
        self.expect(&TokenKind::LeftParen)?;

        let init = match &self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                Some(Box::new(self.parse_variable_declaration()?))
            }
            _ => Some(Box::new(Statement::Expression(self.parse_expression()?))),
        };
        self.expect(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'return'
        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(argument))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(self.error_at_current("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(argument))
    }

    fn parse_try_statement(&mut self) -> Result<Statement> {
        self.advance(); // consume 'try'
        let block = self.parse_block()?;

        let handler = if self.matches(&TokenKind::Catch) {
            let param = if self.matches(&TokenKind::LeftParen) {
                let name = self.expect_identifier()?;
                self.expect(&TokenKind::RightParen)?;
                Some(name)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.matches(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at_current("Missing catch or finally after try"));
        }

        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    // Expressions ------------------------------------------------------------

    /// Parses an expression.
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression> {
        self.nested(Self::parse_assignment_kind)
    }

    fn parse_assignment_kind(&mut self) -> Result<Expression> {
        let target = self.parse_conditional()?;

        let op = match &self.current.kind {
            TokenKind::Equal => AssignOp::Assign,
            TokenKind::PlusEqual => AssignOp::Add,
            TokenKind::MinusEqual => AssignOp::Sub,
            TokenKind::StarEqual => AssignOp::Mul,
            TokenKind::SlashEqual => AssignOp::Div,
            _ => return Ok(target),
        };

        if !is_assignable(&target) {
            return Err(self.error_at_current("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expression::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let test = self.parse_logical_or()?;
        if !self.matches(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut left = self.parse_logical_and()?;
        while self.matches(&TokenKind::PipePipe) {
            self.descend()?;
            let right = self.parse_logical_and()?;
            left = Expression::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut left = self.parse_equality()?;
        while self.matches(&TokenKind::AmpersandAmpersand) {
            self.descend()?;
            let right = self.parse_equality()?;
            left = Expression::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::StrictEqual => BinaryOp::StrictEqual,
                TokenKind::StrictNotEqual => BinaryOp::StrictNotEqual,
                _ => break,
            };
            self.descend()?;
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::LessThan => BinaryOp::Less,
                TokenKind::LessThanEqual => BinaryOp::LessEqual,
                TokenKind::GreaterThan => BinaryOp::Greater,
                TokenKind::GreaterThanEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            self.descend()?;
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.descend()?;
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.descend()?;
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        self.depth = mark;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match &self.current.kind {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if self.current.kind == TokenKind::PlusPlus {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance();
                let target = self.nested(Self::parse_unary)?;
                if !is_assignable(&target) {
                    return Err(self.error_at_previous("Invalid left-hand side in prefix operation"));
                }
                return Ok(Expression::Update {
                    op,
                    prefix: true,
                    target: Box::new(target),
                });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let argument = self.nested(Self::parse_unary)?;
        Ok(Expression::Unary {
            op,
            argument: Box::new(argument),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let expression = self.parse_call_member()?;
        let op = match &self.current.kind {
            TokenKind::PlusPlus if !self.current.newline_before => UpdateOp::Increment,
            TokenKind::MinusMinus if !self.current.newline_before => UpdateOp::Decrement,
            _ => return Ok(expression),
        };
        if !is_assignable(&expression) {
            return Err(self.error_at_current("Invalid left-hand side in postfix operation"));
        }
        self.advance();
        Ok(Expression::Update {
            op,
            prefix: false,
            target: Box::new(expression),
        })
    }

    fn parse_call_member(&mut self) -> Result<Expression> {
        let mark = self.depth;
        let mut expression = if self.check(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };

        loop {
            if matches!(
                self.current.kind,
                TokenKind::Dot | TokenKind::LeftBracket | TokenKind::LeftParen
            ) {
                self.descend()?;
            }
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property: MemberProperty::Named(name),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expression = Expression::Member {
                        object: Box::new(expression),
                        property: MemberProperty::Computed(Box::new(property)),
                    };
                }
                TokenKind::LeftParen => {
                    let span = self.current.span;
                    let arguments = self.parse_arguments()?;
                    expression = Expression::Call {
                        callee: Box::new(expression),
                        arguments,
                        span,
                    };
                }
                _ => break,
            }
        }
        self.depth = mark;
        Ok(expression)
    }

    /// `new Callee(args)`; the callee is a member chain without calls.
    fn parse_new(&mut self) -> Result<Expression> {
        self.advance(); // consume 'new'
        let mark = self.depth;
        let mut callee = if self.check(&TokenKind::New) {
            self.nested(Self::parse_new)?
        } else {
            self.parse_primary()?
        };
        loop {
            if !matches!(self.current.kind, TokenKind::Dot | TokenKind::LeftBracket) {
                break;
            }
            self.descend()?;
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    callee = Expression::Member {
                        object: Box::new(callee),
                        property: MemberProperty::Named(name),
                    };
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    callee = Expression::Member {
                        object: Box::new(callee),
                        property: MemberProperty::Computed(Box::new(property)),
                    };
                }
                _ => break,
            }
        }
        self.depth = mark;
        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            arguments.push(self.parse_assignment()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let token = self.current.clone();
        let expression = match token.kind {
            TokenKind::Number(n) => Expression::Literal(Literal::Number(n)),
            TokenKind::String(s) => Expression::Literal(Literal::String(s)),
            TokenKind::True => Expression::Literal(Literal::Boolean(true)),
            TokenKind::False => Expression::Literal(Literal::Boolean(false)),
            TokenKind::Null => Expression::Literal(Literal::Null),
            TokenKind::This => Expression::This,
            TokenKind::Identifier(name) if name == "undefined" => {
                Expression::Literal(Literal::Undefined)
            }
            TokenKind::Identifier(name) => Expression::Identifier(name),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                self.advance();
                let name = match &self.current.kind {
                    TokenKind::Identifier(name) => {
                        let name = name.clone();
                        self.advance();
                        Some(name)
                    }
                    _ => None,
                };
                return Ok(Expression::Function(self.parse_function_rest(name)?));
            }
            TokenKind::UnterminatedString => {
                return Err(self.error_at_current("Invalid or unexpected token"));
            }
            other => {
                return Err(self.error_at_current(&format!("Unexpected {}", other.describe())));
            }
        };
        self.advance();
        Ok(expression)
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        self.advance(); // consume '['
        let mut elements = Vec::new();
        while !self.check(&TokenKind::RightBracket) {
            elements.push(self.parse_assignment()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.advance(); // consume '{'
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let key = self.expect_property_name()?;
            let value = if self.matches(&TokenKind::Colon) {
                self.parse_assignment()?
            } else if self.check(&TokenKind::LeftParen) {
                // Method shorthand: `name(args) { ... }`
                Expression::Function(self.parse_function_rest(Some(key.clone()))?)
            } else {
                // Property shorthand: `{ name }`
                Expression::Identifier(key.clone())
            };
            properties.push((key, value));
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(Expression::Object(properties))
    }

    // Helpers ----------------------------------------------------------------

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mark = self.depth;
        self.descend()?;
        let result = parse(self);
        self.depth = mark;
        result
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error_at_current("Too much nesting"));
        }
        Ok(())
    }

    fn advance(&mut self) {
        let next = self.scanner.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// True where automatic semicolon insertion would end a statement.
    fn at_statement_end(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) || self.current.newline_before
    }

    fn consume_semicolon(&mut self) -> Result<()> {
        if self.matches(&TokenKind::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.error_at_current(&format!(
                "Unexpected {}",
                self.current.kind.describe()
            )))
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_at_current(&format!(
                "Expected {} but found {}",
                kind.describe(),
                self.current.kind.describe()
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error_at_current(&format!(
                "Expected identifier but found {}",
                other.describe()
            ))),
        }
    }

    fn expect_property_name(&mut self) -> Result<String> {
        match self.current.kind.property_name() {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(self.error_at_current(&format!(
                "Expected property name but found {}",
                self.current.kind.describe()
            ))),
        }
    }

    fn error_at_current(&self, message: &str) -> Error {
        error_at(&self.current, message)
    }

    fn error_at_previous(&self, message: &str) -> Error {
        error_at(&self.previous, message)
    }
}

fn error_at(token: &Token, message: &str) -> Error {
    Error::Syntax {
        message: message.to_string(),
        line: token.span.line,
        column: token.span.column,
    }
}

fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn is_assignable(expression: &Expression) -> bool {
    matches!(
        expression,
        Expression::Identifier(_) | Expression::Member { .. }
    )
}
