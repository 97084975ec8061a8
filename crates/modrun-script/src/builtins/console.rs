//! Console built-in object.
//!
//! Provides `console.log`, `console.info`, `console.warn` and `console.error`.

use crate::runtime::Value;

fn format_args(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the `console` object.
pub fn console_object() -> Value {
    Value::object_from([
        (
            "log",
            Value::native("log", |_, _, args| {
                println!("{}", format_args(args));
                Ok(Value::Undefined)
            }),
        ),
        (
            "info",
            Value::native("info", |_, _, args| {
                println!("{}", format_args(args));
                Ok(Value::Undefined)
            }),
        ),
        (
            "warn",
            Value::native("warn", |_, _, args| {
                eprintln!("Warning: {}", format_args(args));
                Ok(Value::Undefined)
            }),
        ),
        (
            "error",
            Value::native("error", |_, _, args| {
                eprintln!("{}", format_args(args));
                Ok(Value::Undefined)
            }),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_args() {
        let args = [Value::from("a"), Value::from(1), Value::Null];
        assert_eq!(format_args(&args), "a 1 null");
    }

    #[test]
    fn test_console_methods_are_callable() {
        let console = console_object();
        for name in ["log", "info", "warn", "error"] {
            assert!(console.get(name).is_callable(), "{} missing", name);
        }
    }
}
