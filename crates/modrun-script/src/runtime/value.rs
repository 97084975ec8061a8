//! Script value representation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::function::{Function, NativeFn};
use super::object::{Object, ObjectRef};
use crate::error::{Error, Result};
use crate::interpreter::Interpreter;

/// Largest length an array may reach. Arrays are stored densely, so this
/// sits well below the 2^32 - 1 index range.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;

/// Shared, mutable array storage.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// A script value.
///
/// Objects, arrays and functions are reference types: cloning a `Value`
/// clones the handle, so mutations are visible through every clone.
/// Values are `!Send`; a value belongs to the interpreter session that
/// created it.
#[derive(Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(Rc<str>),
    /// Object reference
    Object(ObjectRef),
    /// Array reference
    Array(ArrayRef),
    /// Function reference
    Function(Rc<Function>),
}

impl Value {
    /// Creates a new empty object.
    pub fn object() -> Self {
        Self::from_object(Object::new())
    }

    /// Wraps an [`Object`] in a fresh reference.
    pub fn from_object(object: Object) -> Self {
        Value::Object(Rc::new(RefCell::new(object)))
    }

    /// Creates an object from `(key, value)` pairs, preserving order.
    pub fn object_from<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut object = Object::new();
        for (key, value) in entries {
            object.set(key, value);
        }
        Self::from_object(object)
    }

    /// Creates an array value.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Creates a native function value.
    pub fn native<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Interpreter, &Value, &[Value]) -> Result<Value> + 'static,
    {
        Value::Function(Rc::new(Function::native(name, Rc::new(func) as NativeFn)))
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is null or undefined.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns the string contents if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the function if this is a function.
    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) | Value::Array(_) | Value::Function(_) => true,
        }
    }

    /// Converts the value to a number (ToNumber).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Array(items) => {
                let items = items.borrow();
                match items.len() {
                    0 => 0.0,
                    1 => items[0].to_number(),
                    _ => f64::NAN,
                }
            }
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// Returns the type of this value as `typeof` reports it.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) | Value::Array(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Strict equality (`===`). Reference types compare by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Abstract equality (`==`).
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
            (Value::Null | Value::Undefined, _) | (_, Value::Null | Value::Undefined) => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Boolean(_), _)
            | (_, Value::Boolean(_)) => {
                if self.is_reference() || other.is_reference() {
                    self.to_string() == other.to_string()
                } else {
                    self.to_number() == other.to_number()
                }
            }
            (a, b) if a.is_reference() != b.is_reference() => a.to_string() == b.to_string(),
            _ => self.strict_equals(other),
        }
    }

    fn is_reference(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_) | Value::Function(_))
    }

    /// Reads an own property. Missing properties and primitives yield undefined.
    ///
    /// Arrays expose `length` and index keys; strings expose `length`.
    /// Built-in methods are resolved by the interpreter, not here.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(object) => object.borrow().get(key).cloned().unwrap_or_default(),
            Value::Function(function) => function.get(key),
            Value::Array(items) => {
                let items = items.borrow();
                if key == "length" {
                    return Value::Number(items.len() as f64);
                }
                array_index(key)
                    .and_then(|index| items.get(index).cloned())
                    .unwrap_or_default()
            }
            Value::String(s) => {
                if key == "length" {
                    return Value::Number(s.encode_utf16().count() as f64);
                }
                array_index(key)
                    .and_then(|index| s.chars().nth(index))
                    .map(|ch| Value::from(ch.to_string()))
                    .unwrap_or_default()
            }
            _ => Value::Undefined,
        }
    }

    /// Writes a property. Returns `false` if this value cannot hold properties
    /// or the write would grow an array past [`MAX_ARRAY_LENGTH`].
    pub fn set(&self, key: impl Into<String>, value: Value) -> bool {
        self.try_set(key, value).unwrap_or(false)
    }

    /// Writes a property, failing with a `RangeError` when an array would
    /// grow past [`MAX_ARRAY_LENGTH`] or `length` is not a valid length.
    pub fn try_set(&self, key: impl Into<String>, value: Value) -> Result<bool> {
        match self {
            Value::Object(object) => {
                object.borrow_mut().set(key, value);
                Ok(true)
            }
            Value::Function(function) => {
                function.set(key, value);
                Ok(true)
            }
            Value::Array(items) => {
                let key = key.into();
                if key == "length" {
                    let len = value.to_number();
                    if !(len >= 0.0 && len.fract() == 0.0 && len <= MAX_ARRAY_LENGTH as f64) {
                        return Err(Error::range_error("Invalid array length"));
                    }
                    items.borrow_mut().resize(len as usize, Value::Undefined);
                } else if let Some(index) = array_index(&key) {
                    let mut items = items.borrow_mut();
                    if index >= items.len() {
                        if index >= MAX_ARRAY_LENGTH {
                            return Err(Error::range_error("Invalid array length"));
                        }
                        items.resize(index + 1, Value::Undefined);
                    }
                    items[index] = value;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Own enumerable keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Value::Object(object) => object.borrow().keys().map(str::to_string).collect(),
            Value::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
            Value::Function(function) => function.keys(),
            _ => Vec::new(),
        }
    }
}

fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that scripts must not
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

/// Formats a number the way scripts print it (`1`, `0.5`, `NaN`).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Object(object) => {
                let object = object.borrow();
                if object.is_error() {
                    let name = object.get("name").cloned().unwrap_or_default();
                    let message = object.get("message").cloned().unwrap_or_default();
                    match message {
                        Value::String(ref m) if !m.is_empty() => write!(f, "{}: {}", name, m),
                        _ => write!(f, "{}", name),
                    }
                } else {
                    write!(f, "[object Object]")
                }
            }
            Value::Array(items) => {
                // Nested arrays that contain themselves would recurse forever
                let items = match items.try_borrow() {
                    Ok(items) => items,
                    Err(_) => return Ok(()),
                };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Function(function) => {
                write!(f, "function {}() {{ [native code] }}", function.name())
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Number(n) => write!(f, "Number({})", number_to_string(*n)),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Object(object) => match object.try_borrow() {
                Ok(object) => f
                    .debug_struct("Object")
                    .field("keys", &object.keys().collect::<Vec<_>>())
                    .finish(),
                Err(_) => write!(f, "Object(<borrowed>)"),
            },
            Value::Array(items) => match items.try_borrow() {
                Ok(items) => write!(f, "Array(len={})", items.len()),
                Err(_) => write!(f, "Array(<borrowed>)"),
            },
            Value::Function(function) => write!(f, "Function({})", function.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_to_number() {
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert_eq!(Value::from("0x10").to_number(), 16.0);
        assert!(Value::from("inf").to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Null.to_number(), 0.0);
    }

    #[test]
    fn test_reference_identity() {
        let a = Value::object();
        let b = a.clone();
        b.set("x", Value::from(1));
        assert_eq!(a.get("x").to_number(), 1.0);
        assert!(a.strict_equals(&b));
        assert!(!a.strict_equals(&Value::object()));
    }

    #[test]
    fn test_loose_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(Value::from("1").loose_equals(&Value::from(1)));
        assert!(Value::from(true).loose_equals(&Value::from(1)));
        assert!(!Value::Null.loose_equals(&Value::from(0)));
    }

    #[test]
    fn test_array_properties() {
        let array = Value::array(vec![Value::from(1), Value::from("two")]);
        assert_eq!(array.get("length").to_number(), 2.0);
        assert_eq!(array.get("1").to_string(), "two");
        array.set("3", Value::from(4));
        assert_eq!(array.get("length").to_number(), 4.0);
        assert_eq!(array.to_string(), "1,two,,4");
    }

    #[test]
    fn test_array_growth_is_bounded() {
        let array = Value::array(Vec::new());
        assert!(matches!(
            array.try_set("1000000000000000", Value::from(1)),
            Err(Error::Range(_))
        ));
        assert!(matches!(
            array.try_set(MAX_ARRAY_LENGTH.to_string(), Value::from(1)),
            Err(Error::Range(_))
        ));
        assert!(matches!(array.try_set("length", Value::from(-1)), Err(Error::Range(_))));
        assert!(matches!(array.try_set("length", Value::from(1.5)), Err(Error::Range(_))));
        assert!(matches!(
            array.try_set("length", Value::from(4294967295.0)),
            Err(Error::Range(_))
        ));
        assert!(!array.set("length", Value::from(f64::NAN)));
        assert_eq!(array.get("length").to_number(), 0.0);

        assert!(array.try_set("length", Value::from(3)).unwrap());
        assert_eq!(array.get("length").to_number(), 3.0);
        assert!(array.try_set("length", Value::from(1)).unwrap());
        assert_eq!(array.get("length").to_number(), 1.0);
    }

    #[test]
    fn test_object_keys_keep_insertion_order() {
        let object = Value::object_from([("b", Value::from(1)), ("a", Value::from(2))]);
        assert_eq!(object.keys(), vec!["b".to_string(), "a".to_string()]);
    }
}
