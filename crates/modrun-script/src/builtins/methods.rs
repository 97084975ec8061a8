//! Built-in methods on arrays and strings.
//!
//! Primitives and arrays carry no property table for methods; the
//! interpreter asks here when a member lookup on one of them misses.

use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::runtime::value::MAX_ARRAY_LENGTH;

/// Returns the built-in method `name` for `receiver`, if any.
pub fn lookup(receiver: &Value, name: &str) -> Option<Value> {
    match receiver {
        Value::Array(_) => array_method(name),
        Value::String(_) => string_method(name),
        _ => None,
    }
}

fn array_method(name: &str) -> Option<Value> {
    let method = match name {
        "push" => Value::native("push", |_, this, args| {
            let Value::Array(items) = this else {
                return Err(Error::type_error("push called on non-array"));
            };
            let mut items = items.borrow_mut();
            if items.len() + args.len() > MAX_ARRAY_LENGTH {
                return Err(Error::range_error("Invalid array length"));
            }
            items.extend(args.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }),
        "join" => Value::native("join", |_, this, args| {
            let Value::Array(items) = this else {
                return Err(Error::type_error("join called on non-array"));
            };
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(sep) => sep.to_string(),
            };
            let parts: Vec<String> = items
                .borrow()
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_string() })
                .collect();
            Ok(Value::from(parts.join(&separator)))
        }),
        "indexOf" => Value::native("indexOf", |_, this, args| {
            let Value::Array(items) = this else {
                return Err(Error::type_error("indexOf called on non-array"));
            };
            let needle = args.first().cloned().unwrap_or_default();
            let index = items
                .borrow()
                .iter()
                .position(|item| item.strict_equals(&needle))
                .map_or(-1.0, |i| i as f64);
            Ok(Value::Number(index))
        }),
        _ => return None,
    };
    Some(method)
}

fn this_string(this: &Value, method: &str) -> Result<String> {
    match this {
        Value::String(s) => Ok(s.to_string()),
        _ => Err(Error::type_error(format!("{} called on non-string", method))),
    }
}

fn string_method(name: &str) -> Option<Value> {
    let method = match name {
        "toUpperCase" => Value::native("toUpperCase", |_, this, _| {
            Ok(Value::from(this_string(this, "toUpperCase")?.to_uppercase()))
        }),
        "toLowerCase" => Value::native("toLowerCase", |_, this, _| {
            Ok(Value::from(this_string(this, "toLowerCase")?.to_lowercase()))
        }),
        "indexOf" => Value::native("indexOf", |_, this, args| {
            let haystack = this_string(this, "indexOf")?;
            let needle = args.first().map(Value::to_string).unwrap_or_default();
            let index = haystack
                .find(&needle)
                .map_or(-1.0, |byte| haystack[..byte].chars().count() as f64);
            Ok(Value::Number(index))
        }),
        "slice" => Value::native("slice", |_, this, args| {
            let chars: Vec<char> = this_string(this, "slice")?.chars().collect();
            let len = chars.len() as f64;
            let clamp = |value: Option<&Value>, default: f64| {
                let n = match value {
                    None | Some(Value::Undefined) => default,
                    Some(v) => v.to_number(),
                };
                let n = if n.is_nan() { 0.0 } else { n.trunc() };
                if n < 0.0 { (len + n).max(0.0) } else { n.min(len) }
            };
            let start = clamp(args.first(), 0.0) as usize;
            let end = clamp(args.get(1), len) as usize;
            let slice: String = if start < end {
                chars[start..end].iter().collect()
            } else {
                String::new()
            };
            Ok(Value::from(slice))
        }),
        _ => return None,
    };
    Some(method)
}
