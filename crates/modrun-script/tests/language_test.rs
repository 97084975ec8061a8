//! Language integration tests
//!
//! Exercises the interpreter through its public API the way module code
//! uses it.

use modrun_script::{Capabilities, Error, Interpreter, Value};

fn engine() -> Interpreter {
    Interpreter::new(Capabilities::standard())
}

fn eval_str(source: &str) -> String {
    engine()
        .eval(source)
        .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
        .to_string()
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval_str("5 + 3;"), "8");
    assert_eq!(eval_str("10 - 4;"), "6");
    assert_eq!(eval_str("6 * 7;"), "42");
    assert_eq!(eval_str("15 / 3;"), "5");
    assert_eq!(eval_str("17 % 5;"), "2");
    assert_eq!(eval_str("0.1 * 3;"), "0.30000000000000004");
    assert_eq!(eval_str("1 / 0;"), "Infinity");
}

#[test]
fn test_comparison() {
    assert_eq!(eval_str("5 == '5';"), "true");
    assert_eq!(eval_str("5 === '5';"), "false");
    assert_eq!(eval_str("null == undefined;"), "true");
    assert_eq!(eval_str("null === undefined;"), "false");
    assert_eq!(eval_str("5 <= 5;"), "true");
}

#[test]
fn test_typeof() {
    assert_eq!(eval_str("typeof 42;"), "number");
    assert_eq!(eval_str("typeof 'hello';"), "string");
    assert_eq!(eval_str("typeof undefined;"), "undefined");
    assert_eq!(eval_str("typeof null;"), "object");
    assert_eq!(eval_str("typeof function () {};"), "function");
    assert_eq!(eval_str("typeof notDeclared;"), "undefined");
}

#[test]
fn test_loops() {
    assert_eq!(
        eval_str("var sum = 0; for (var i = 1; i <= 10; i++) { sum += i; } sum;"),
        "55"
    );
    assert_eq!(
        eval_str(
            "var out = []; var n = 0;\n\
             while (true) { n++; if (n % 2) continue; if (n > 6) break; out.push(n); }\n\
             out.join(',');"
        ),
        "2,4,6"
    );
}

#[test]
fn test_block_scoping() {
    assert_eq!(
        eval_str("let x = 1; { let x = 2; } x;"),
        "1"
    );
    assert_eq!(
        eval_str("var x = 1; { var x = 2; } x;"),
        "2"
    );
}

#[test]
fn test_function_hoisting() {
    assert_eq!(
        eval_str("var r = twice(4); function twice(n) { return n * 2; } r;"),
        "8"
    );
}

#[test]
fn test_closures() {
    assert_eq!(
        eval_str(
            "function counter() { var n = 0; return function () { n += 1; return n; }; }\n\
             var c = counter(); c(); c(); c();"
        ),
        "3"
    );
}

#[test]
fn test_objects_and_arrays() {
    assert_eq!(
        eval_str("var o = { a: { b: [10, 20, 30] } }; o.a.b[1] + o.a.b.length;"),
        "23"
    );
    assert_eq!(eval_str("var a = [1]; a[3] = 4; a.length;"), "4");
    assert_eq!(eval_str("var o = {}; o['k' + 1] = 'v'; o.k1;"), "v");
}

#[test]
fn test_try_catch_finally() {
    assert_eq!(
        eval_str(
            "var log = [];\n\
             try { log.push('try'); throw new Error('boom'); }\n\
             catch (e) { log.push(e.message); }\n\
             finally { log.push('finally'); }\n\
             log.join(' ');"
        ),
        "try boom finally"
    );
}

#[test]
fn test_runtime_errors_are_catchable() {
    assert_eq!(
        eval_str("var m; try { null.x; } catch (e) { m = e.name; } m;"),
        "TypeError"
    );
    assert_eq!(
        eval_str("var m; try { nope(); } catch (e) { m = e.message; } m;"),
        "nope is not defined"
    );
}

#[test]
fn test_array_length_limits() {
    let err = engine().eval("var a = []; a[1e15] = 1;").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: Invalid array length");
    assert_eq!(
        eval_str("var m; try { var a = [1, 2]; a.length = -1; } catch (e) { m = e.name; } m;"),
        "RangeError"
    );
    assert_eq!(eval_str("var a = [1, 2, 3]; a.length = 1; a.length;"), "1");
    assert_eq!(eval_str("var a = []; a[4] = 'x'; a.length;"), "5");
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let source = format!("var x = {}1{};", "[".repeat(10_000), "]".repeat(10_000));
    let err = engine().eval(&source).unwrap_err();
    assert_eq!(err.name(), "SyntaxError");
}

#[test]
fn test_finally_overrides_return() {
    assert_eq!(
        eval_str("function f() { try { return 1; } finally { return 2; } } f();"),
        "2"
    );
}

#[test]
fn test_uncaught_throw() {
    let err = engine().eval("throw new TypeError('bad input');").unwrap_err();
    assert_eq!(err.name(), "TypeError");
    assert_eq!(err.message(), "bad input");
    assert_eq!(err.to_string(), "Uncaught TypeError: bad input");
}

#[test]
fn test_throw_primitive() {
    let err = engine().eval("throw 'plain';").unwrap_err();
    assert!(matches!(err, Error::Thrown(Value::String(ref s)) if &**s == "plain"));
}

#[test]
fn test_without_console_capability() {
    let interp = Interpreter::new(Capabilities::new().with_error_constructors());
    let err = interp.eval("console.log('hi');").unwrap_err();
    assert!(matches!(err, Error::Reference(ref name) if name == "console"));
}

#[test]
fn test_host_function_capability() {
    let caps = Capabilities::standard().with(
        "sum",
        Value::native("sum", |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).sum()))
        }),
    );
    let interp = Interpreter::new(caps);
    assert_eq!(interp.eval("sum(1, 2, 3)").unwrap(), Value::Number(6.0));
}

#[test]
fn test_syntax_error_reports_position() {
    let err = engine().eval("var a = 1;\nvar b = ;").unwrap_err();
    assert!(matches!(err, Error::Syntax { line: 2, .. }));
}
