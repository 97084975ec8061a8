//! Parser for module source code.
//!
//! Transforms the token stream from [`Scanner`](crate::lexer::Scanner) into
//! a [`Program`](crate::ast::Program). Statements may be terminated by a
//! semicolon, a closing brace, the end of input, or a line break.
//!
//! ## Usage
//!
//! ```rust
//! use modrun_script::parser::Parser;
//!
//! let mut parser = Parser::new("exports.answer = 40 + 2;");
//! let program = parser.parse_program().expect("Should parse");
//! assert_eq!(program.body.len(), 1);
//! ```

mod parser;

pub use parser::{MAX_NESTING_DEPTH, Parser};

use crate::ast::Program;
use crate::error::Result;

/// Parses `source` into a program.
pub fn parse(source: &str) -> Result<Program> {
    Parser::new(source).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::error::Error;

    fn parse_ok(source: &str) -> Program {
        parse(source).unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
    }

    #[test]
    fn test_variable_declarations() {
        let program = parse_ok("var a = 1, b; let c = 2; const d = 3;");
        assert_eq!(program.body.len(), 3);
        match &program.body[0] {
            Statement::VariableDeclaration(decl) => {
                assert_eq!(decl.kind, VariableKind::Var);
                assert_eq!(decl.declarations.len(), 2);
                assert!(decl.declarations[1].init.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_const_requires_initializer() {
        assert!(matches!(parse("const x;"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn test_automatic_semicolons() {
        let program = parse_ok("var a = 1\nvar b = 2\na = b\n");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_missing_semicolon_on_same_line() {
        assert!(parse("var a = 1 var b = 2").is_err());
    }

    #[test]
    fn test_return_without_value_before_newline() {
        let program = parse_ok("function f() { return\n42 }");
        let Statement::FunctionDeclaration(literal) = &program.body[0] else {
            panic!("expected function");
        };
        assert_eq!(literal.body.len(), 2);
        assert_eq!(literal.body[0], Statement::Return(None));
    }

    #[test]
    fn test_require_member_call() {
        let program = parse_ok("require('greeter').main(ctx)");
        let Statement::Expression(Expression::Call { callee, arguments, .. }) = &program.body[0]
        else {
            panic!("expected call");
        };
        assert_eq!(arguments.len(), 1);
        assert!(matches!(
            callee.as_ref(),
            Expression::Member {
                property: MemberProperty::Named(name),
                ..
            } if name == "main"
        ));
    }

    #[test]
    fn test_operator_precedence() {
        let program = parse_ok("1 + 2 * 3");
        let Statement::Expression(Expression::Binary { op, right, .. }) = &program.body[0] else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.as_ref(),
            Expression::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_object_literal_keys() {
        let program = parse_ok("x = { a: 1, 'b c': 2, 3: 3, new: 4, d }");
        let Statement::Expression(Expression::Assign { value, .. }) = &program.body[0] else {
            panic!("expected assignment");
        };
        let Expression::Object(properties) = value.as_ref() else {
            panic!("expected object");
        };
        let keys: Vec<&str> = properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b c", "3", "new", "d"]);
    }

    #[test]
    fn test_function_expression_and_new() {
        parse_ok("module.exports = function greet(name) { return 'hi ' + name; };");
        parse_ok("throw new Error('boom')");
        parse_ok("var e = new Error;");
    }

    #[test]
    fn test_control_flow() {
        parse_ok(
            "for (var i = 0; i < 3; i++) { if (i == 1) continue; else break; }\n\
             while (false) {}\n\
             try { x() } catch (e) { y() } finally { z() }",
        );
    }

    #[test]
    fn test_try_requires_handler() {
        assert!(parse("try { }").is_err());
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert!(parse("1 = 2").is_err());
        assert!(parse("f()++").is_err());
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("var a = 1;\nvar = 2;").unwrap_err();
        match err {
            Error::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(parse("var s = 'abc"), Err(Error::Syntax { .. })));
    }

    fn assert_too_deep(source: &str) {
        match parse(source) {
            Err(Error::Syntax { message, .. }) => assert_eq!(message, "Too much nesting"),
            other => panic!("expected nesting error, got {:?}", other.map(|p| p.body.len())),
        }
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let deep = 20_000;
        assert_too_deep(&format!("exports.x = {}1{};", "(".repeat(deep), ")".repeat(deep)));
        assert_too_deep(&format!("{}{}", "{".repeat(deep), "}".repeat(deep)));
        assert_too_deep(&format!("x = {}[]{};", "[".repeat(deep), "]".repeat(deep)));
        assert_too_deep(&format!("x = {}1;", "- ".repeat(deep)));
        assert_too_deep(&format!("x = 1{};", " + 1".repeat(deep)));
        assert_too_deep(&format!("x = a{};", ".b".repeat(deep)));
        assert_too_deep(&format!("{}x = 1;", "if (a) ".repeat(deep)));
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let depth = MAX_NESTING_DEPTH / 4;
        parse_ok(&format!("exports.x = {}1{};", "(".repeat(depth), ")".repeat(depth)));
        parse_ok(&format!("{}{}", "{".repeat(depth), "}".repeat(depth)));
        parse_ok(&format!("x = 1{};", " + 1".repeat(depth)));
    }
}
