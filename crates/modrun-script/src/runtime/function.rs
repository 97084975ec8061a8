//! Function representation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::scope::ScopeRef;
use super::value::Value;
use crate::ast::FunctionLiteral;
use crate::error::Result;
use crate::interpreter::Interpreter;

/// A native (Rust) function: `(interpreter, this, args) -> result`.
pub type NativeFn = Rc<dyn Fn(&Interpreter, &Value, &[Value]) -> Result<Value>>;

/// A callable value. Functions are objects, so they carry their own
/// property table (`require.main`, `require.resolve`, ...).
pub struct Function {
    name: String,
    kind: FunctionKind,
    properties: RefCell<IndexMap<String, Value>>,
}

/// The implementation behind a [`Function`].
#[derive(Clone)]
pub enum FunctionKind {
    /// A script function closing over the scope it was created in
    Script(Closure),
    /// A native Rust function
    Native(NativeFn),
}

/// A script function together with its captured scope.
#[derive(Clone)]
pub struct Closure {
    /// The parsed function
    pub literal: Rc<FunctionLiteral>,
    /// The scope the function was created in
    pub scope: ScopeRef,
}

impl Function {
    /// Creates a script function.
    pub fn script(literal: Rc<FunctionLiteral>, scope: ScopeRef) -> Self {
        Self {
            name: literal.name.clone().unwrap_or_default(),
            kind: FunctionKind::Script(Closure { literal, scope }),
            properties: RefCell::default(),
        }
    }

    /// Creates a native function.
    pub fn native(name: impl Into<String>, func: NativeFn) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Native(func),
            properties: RefCell::default(),
        }
    }

    /// The function's name (empty for anonymous functions).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The implementation.
    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    /// Returns true for native functions.
    pub fn is_native(&self) -> bool {
        matches!(self.kind, FunctionKind::Native(_))
    }

    /// Number of declared parameters (0 for native functions).
    pub fn arity(&self) -> usize {
        match &self.kind {
            FunctionKind::Script(closure) => closure.literal.params.len(),
            FunctionKind::Native(_) => 0,
        }
    }

    /// Reads a property; `name` and `length` are always present.
    pub fn get(&self, key: &str) -> Value {
        if let Some(value) = self.properties.borrow().get(key) {
            return value.clone();
        }
        match key {
            "name" => Value::from(self.name.as_str()),
            "length" => Value::Number(self.arity() as f64),
            _ => Value::Undefined,
        }
    }

    /// Sets a property.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.properties.borrow_mut().insert(key.into(), value);
    }

    /// Own property keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.properties.borrow().keys().cloned().collect()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FunctionKind::Script(_) => write!(f, "Function({:?})", self.name),
            FunctionKind::Native(_) => write!(f, "NativeFunction({})", self.name),
        }
    }
}
