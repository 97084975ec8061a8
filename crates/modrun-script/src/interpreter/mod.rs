//! Tree-walking interpreter.
//!
//! An [`Interpreter`] owns one global scope, populated from a
//! [`Capabilities`] set when it is created. Every function created by the
//! interpreter closes over that scope or a scope nested inside it.
//!
//! ## Structure
//!
//! - `statements` - statement execution and declaration hoisting
//! - `expressions` - expression evaluation, member access and operators

mod expressions;
mod statements;

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::FunctionLiteral;
use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::runtime::{Capabilities, Function, FunctionKind, Scope, ScopeRef, Value, scope};

use statements::Completion;

/// Default limit on nested function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Binding name used for the receiver. `this` is a keyword, so no script
/// identifier can collide with it.
const THIS_BINDING: &str = "this";

/// The script interpreter.
pub struct Interpreter {
    globals: ScopeRef,
    depth: Cell<usize>,
    max_depth: usize,
}

impl Interpreter {
    /// Creates an interpreter whose global scope holds exactly `capabilities`.
    pub fn new(capabilities: Capabilities) -> Self {
        Self::with_max_depth(capabilities, DEFAULT_MAX_CALL_DEPTH)
    }

    /// Creates an interpreter with a custom call depth limit.
    pub fn with_max_depth(capabilities: Capabilities, max_depth: usize) -> Self {
        let globals = Scope::root();
        {
            let mut scope = globals.borrow_mut();
            for (name, value) in capabilities.iter() {
                scope.declare(name, value.clone(), true);
            }
        }
        Self {
            globals,
            depth: Cell::new(0),
            max_depth,
        }
    }

    /// The global scope.
    pub fn globals(&self) -> &ScopeRef {
        &self.globals
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        scope::lookup(&self.globals, name)
    }

    /// Current nesting of function calls.
    pub fn call_depth(&self) -> usize {
        self.depth.get()
    }

    /// Evaluates `source` in the global scope and returns the value of the
    /// last expression statement.
    pub fn eval(&self, source: &str) -> Result<Value> {
        let program = Parser::new(source).parse_program()?;
        let scope = Rc::clone(&self.globals);
        statements::hoist_vars(&program.body, &scope);
        statements::hoist_functions(&program.body, &scope);

        let mut last = Value::Undefined;
        for statement in &program.body {
            match statement {
                crate::ast::Statement::Expression(expression) => {
                    last = self.evaluate(expression, &scope)?;
                }
                other => match self.execute(other, &scope)? {
                    Completion::Normal => {}
                    Completion::Return(value) => return Ok(value),
                    Completion::Break | Completion::Continue => break,
                },
            }
        }
        Ok(last)
    }

    /// Compiles `body` as the body of a function taking `params`.
    ///
    /// The function closes over the global scope, so top-level `var` and
    /// function declarations in `body` stay local to each call.
    pub fn compile_function(&self, name: &str, params: &[&str], body: &str) -> Result<Value> {
        let program = Parser::new(body).parse_program()?;
        let literal = FunctionLiteral {
            name: Some(name.to_string()),
            params: params.iter().map(|p| p.to_string()).collect(),
            body: program.body,
        };
        Ok(Value::Function(Rc::new(Function::script(
            Rc::new(literal),
            Rc::clone(&self.globals),
        ))))
    }

    /// Calls `callee` with the given receiver and arguments.
    pub fn call(&self, callee: &Value, this: &Value, args: &[Value]) -> Result<Value> {
        let Value::Function(function) = callee else {
            return Err(Error::type_error(format!(
                "{} is not a function",
                callee.type_of()
            )));
        };

        let depth = self.depth.get();
        if depth >= self.max_depth {
            return Err(Error::range_error("Maximum call stack size exceeded"));
        }
        self.depth.set(depth + 1);
        let result = self.invoke(function, this, args);
        self.depth.set(depth);
        result
    }

    /// Calls `callee` as a constructor (`new callee(...args)`).
    pub fn construct(&self, callee: &Value, args: &[Value]) -> Result<Value> {
        let Value::Function(function) = callee else {
            return Err(Error::type_error(format!(
                "{} is not a constructor",
                callee.type_of()
            )));
        };
        if function.is_native() {
            return self.call(callee, &Value::Undefined, args);
        }
        let instance = Value::object();
        let result = self.call(callee, &instance, args)?;
        Ok(match result {
            Value::Object(_) | Value::Array(_) | Value::Function(_) => result,
            _ => instance,
        })
    }

    fn invoke(&self, function: &Rc<Function>, this: &Value, args: &[Value]) -> Result<Value> {
        match function.kind() {
            FunctionKind::Native(native) => native(self, this, args),
            FunctionKind::Script(closure) => {
                let scope = Scope::child(&closure.scope);
                {
                    let mut frame = scope.borrow_mut();
                    frame.declare(THIS_BINDING, this.clone(), false);
                    for (index, param) in closure.literal.params.iter().enumerate() {
                        let value = args.get(index).cloned().unwrap_or_default();
                        frame.declare(param.as_str(), value, true);
                    }
                }
                let body = &closure.literal.body;
                statements::hoist_vars(body, &scope);
                statements::hoist_functions(body, &scope);
                match self.execute_all(body, &scope)? {
                    Completion::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("depth", &self.depth.get())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Value {
        Interpreter::new(Capabilities::standard())
            .eval(source)
            .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
    }

    #[test]
    fn test_eval_returns_last_expression() {
        assert_eq!(eval("1 + 2; 'a' + 'b'"), Value::from("ab"));
        assert_eq!(eval("var x = 1;"), Value::Undefined);
    }

    #[test]
    fn test_globals_are_exactly_capabilities() {
        let interp = Interpreter::new(Capabilities::new().with("answer", Value::from(42)));
        assert_eq!(interp.eval("answer").unwrap(), Value::from(42));
        assert!(matches!(interp.eval("console"), Err(Error::Reference(_))));
        assert_eq!(interp.eval("typeof console").unwrap(), Value::from("undefined"));
    }

    #[test]
    fn test_compile_function_keeps_vars_local() {
        let interp = Interpreter::new(Capabilities::standard());
        let f = interp
            .compile_function("module", &["input"], "var doubled = input * 2; return doubled;")
            .unwrap();
        let result = interp.call(&f, &Value::Undefined, &[Value::from(21)]).unwrap();
        assert_eq!(result, Value::from(42));
        assert!(interp.global("doubled").is_none());
    }

    #[test]
    fn test_compile_function_syntax_error() {
        let interp = Interpreter::new(Capabilities::standard());
        let err = interp.compile_function("m", &[], "return (;").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn test_call_native_with_receiver() {
        let interp = Interpreter::new(Capabilities::new());
        let f = Value::native("self", |_, this, _| Ok(this.clone()));
        let receiver = Value::from("me");
        assert_eq!(interp.call(&f, &receiver, &[]).unwrap(), receiver);
    }

    #[test]
    fn test_call_non_function() {
        let interp = Interpreter::new(Capabilities::new());
        let err = interp.call(&Value::from(1), &Value::Undefined, &[]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn test_call_depth_limit() {
        let interp = Interpreter::with_max_depth(Capabilities::new(), 16);
        let err = interp
            .eval("function f(n) { return f(n + 1); } f(0)")
            .unwrap_err();
        assert!(matches!(err, Error::Range(ref msg) if msg == "Maximum call stack size exceeded"));
        assert_eq!(interp.call_depth(), 0);
    }

    #[test]
    fn test_construct_script_function() {
        let interp = Interpreter::new(Capabilities::new());
        let point = interp
            .eval("function Point(x) { this.x = x; } new Point(3)")
            .unwrap();
        assert_eq!(point.get("x"), Value::from(3));
    }
}
