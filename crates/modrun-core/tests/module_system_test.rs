//! Module system integration tests
//!
//! Each test writes a small module tree into a temporary directory and
//! drives it through a `Runner`.

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use modrun_core::module_system::{FileSystemLocator, ModuleResource, ResourceLocator};
use modrun_core::{ModuleError, Result, Runner};
use modrun_script::Value;
use tempfile::TempDir;

/// Wraps a filesystem locator and records every id it is asked for.
struct CountingLocator {
    inner: FileSystemLocator,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ResourceLocator for CountingLocator {
    fn locate(&self, id: &str) -> Result<Option<ModuleResource>> {
        self.calls.borrow_mut().push(id.to_string());
        self.inner.locate(id)
    }
}

fn fixture(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn counting_runner(dir: &TempDir) -> (Runner, Rc<RefCell<Vec<String>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let locator = CountingLocator {
        inner: FileSystemLocator::new(dir.path()),
        calls: Rc::clone(&calls),
    };
    let runner = Runner::builder().locator(locator).build().unwrap();
    (runner, calls)
}

fn count(calls: &Rc<RefCell<Vec<String>>>, id: &str) -> usize {
    calls.borrow().iter().filter(|c| c.as_str() == id).count()
}

#[test]
fn test_cache_idempotence() {
    let dir = fixture(&[("greeter.js", "exports.loads = (exports.loads || 0) + 1;")]);
    let (runner, calls) = counting_runner(&dir);

    let first = runner.require("greeter").unwrap();
    let second = runner.require("greeter").unwrap();

    assert!(first.strict_equals(&second));
    assert_eq!(first.get("loads"), Value::from(1));
    assert_eq!(count(&calls, "greeter"), 1);
}

#[test]
fn test_shared_dependency_executes_once() {
    let dir = fixture(&[
        ("counter.js", "var n = 0; exports.next = function () { n += 1; return n; };"),
        ("a.js", "exports.value = require('counter').next();"),
        ("b.js", "exports.value = require('counter').next();"),
    ]);
    let (runner, calls) = counting_runner(&dir);

    assert_eq!(runner.require("a").unwrap().get("value"), Value::from(1));
    assert_eq!(runner.require("b").unwrap().get("value"), Value::from(2));
    assert_eq!(count(&calls, "counter"), 1);
}

#[test]
fn test_cycle_sees_partial_exports() {
    let dir = fixture(&[
        (
            "a.js",
            "exports.early = 'a-early';\n\
             var b = require('b');\n\
             exports.fromB = b.sawEarly + '/' + b.sawLate;\n\
             exports.late = 'a-late';",
        ),
        (
            "b.js",
            "var a = require('a');\n\
             exports.sawEarly = a.early;\n\
             exports.sawLate = typeof a.late;",
        ),
    ]);
    let (runner, calls) = counting_runner(&dir);

    let a = runner.require("a").unwrap();
    assert_eq!(a.get("fromB"), Value::from("a-early/undefined"));
    assert_eq!(a.get("late"), Value::from("a-late"));
    assert_eq!(count(&calls, "a"), 1);
    assert_eq!(count(&calls, "b"), 1);

    // Both ends of the cycle end up cached
    assert_eq!(runner.cached_ids(), ["a", "b"]);
}

#[test]
fn test_failure_evicts_and_retry_reloads() {
    let dir = fixture(&[(
        "flaky.js",
        "exports.partial = true;\nthrow new Error('flaky failed');",
    )]);
    let (runner, calls) = counting_runner(&dir);

    let err = runner.require("flaky").unwrap_err();
    assert!(matches!(err, ModuleError::Script(_)));
    assert!(err.to_string().contains("flaky failed"));
    assert!(!runner.is_cached("flaky"));

    assert!(runner.require("flaky").is_err());
    assert_eq!(count(&calls, "flaky"), 2);
}

#[test]
fn test_syntax_error_evicts() {
    let dir = fixture(&[("broken.js", "exports.x = ;")]);
    let (runner, _) = counting_runner(&dir);
    let err = runner.require("broken").unwrap_err();
    assert!(matches!(
        err,
        ModuleError::Script(modrun_script::Error::Syntax { line: 1, .. })
    ));
    assert!(!runner.is_cached("broken"));
}

#[test]
fn test_oversized_array_write_evicts() {
    let dir = fixture(&[("sparse.js", "var a = []; a[1e15] = 1; exports.n = a.length;")]);
    let (runner, _) = counting_runner(&dir);
    let err = runner.require("sparse").unwrap_err();
    assert!(matches!(err, ModuleError::Script(modrun_script::Error::Range(_))));
    assert_eq!(err.to_string(), "RangeError: Invalid array length");
    assert!(!runner.is_cached("sparse"));
}

#[test]
fn test_deeply_nested_source_evicts() {
    let depth = 20_000;
    let source = format!("exports.x = {}1{};", "(".repeat(depth), ")".repeat(depth));
    let dir = fixture(&[("nested.js", source.as_str())]);
    let (runner, _) = counting_runner(&dir);
    let err = runner.require("nested").unwrap_err();
    assert!(matches!(
        err,
        ModuleError::Script(modrun_script::Error::Syntax { line: 1, .. })
    ));
    assert!(!runner.is_cached("nested"));
}

#[test]
fn test_malformed_identifier_is_fatal() {
    let runner = Runner::new("http://127.0.0.1:9/modules/").unwrap();
    let err = runner.require("//[bad").unwrap_err();
    assert!(matches!(err, ModuleError::MalformedIdentifier { ref id, .. } if id == "//[bad"));
    assert!(runner.cached_ids().is_empty());
}

#[test]
fn test_directory_fallback() {
    let dir = fixture(&[
        ("pkg/main.js", "exports.id = module.id; exports.helper = require('./helper').name;"),
        ("pkg/helper.js", "exports.name = 'pkg helper';"),
    ]);
    let (runner, calls) = counting_runner(&dir);

    let pkg = runner.require("pkg").unwrap();
    assert_eq!(pkg.get("id"), Value::from("pkg/main"));
    assert_eq!(pkg.get("helper"), Value::from("pkg helper"));
    assert!(runner.is_cached("pkg"));
    assert_eq!(count(&calls, "pkg/helper"), 1);
}

#[test]
fn test_not_found_carries_requested_id() {
    let dir = fixture(&[]);
    let (runner, _) = counting_runner(&dir);

    let err = runner.require("nowhere").unwrap_err();
    assert!(matches!(err, ModuleError::ModuleNotFound(ref id) if id == "nowhere"));
    assert_eq!(err.to_string(), "Cannot find module 'nowhere'");
    assert!(runner.cached_ids().is_empty());
}

#[test]
fn test_nested_not_found_propagates_unchanged() {
    let dir = fixture(&[
        ("outer.js", "exports.inner = require('./middle');"),
        ("middle.js", "require('./absent');"),
    ]);
    let (runner, _) = counting_runner(&dir);

    let err = runner.require("outer").unwrap_err();
    assert!(matches!(err, ModuleError::ModuleNotFound(ref id) if id == "./absent"));
    assert!(!runner.is_cached("outer"));
    assert!(!runner.is_cached("./middle"));
}

#[test]
fn test_not_found_can_be_caught_by_script() {
    let dir = fixture(&[(
        "optional.js",
        "try { require('missing'); exports.found = true; }\n\
         catch (e) { exports.found = false; exports.reason = e.message; }",
    )]);
    let (runner, _) = counting_runner(&dir);

    let exports = runner.require("optional").unwrap();
    assert_eq!(exports.get("found"), Value::Boolean(false));
    assert_eq!(exports.get("reason"), Value::from("Cannot find module 'missing'"));
}

#[test]
fn test_relative_requires_in_subdirectories() {
    let dir = fixture(&[
        ("app.js", "var util = require('./lib/util'); exports.main = function () { return util.describe(); };"),
        ("lib/util.js", "var fmt = require('./fmt'); exports.describe = function () { return fmt.wrap(module.id); };"),
        ("lib/fmt.js", "exports.wrap = function (s) { return '[' + s + ']'; };"),
    ]);
    let (runner, calls) = counting_runner(&dir);

    let result = runner.run_main("app", Value::Undefined).unwrap();
    assert_eq!(result, Value::from("[lib/util]"));
    assert_eq!(count(&calls, "lib/util"), 1);
    assert_eq!(count(&calls, "lib/fmt"), 1);
}

#[test]
fn test_require_resolve() {
    let dir = fixture(&[(
        "lib/util.js",
        "exports.sibling = require.resolve('./sibling'); exports.top = require.resolve('top');",
    )]);
    let (runner, _) = counting_runner(&dir);

    let exports = runner.require("lib/util").unwrap();
    assert_eq!(exports.get("sibling"), Value::from("lib/sibling"));
    assert_eq!(exports.get("top"), Value::from("top"));
}

#[test]
fn test_require_main_is_module_record() {
    let dir = fixture(&[("self.js", "exports.same = require.main === module;")]);
    let (runner, _) = counting_runner(&dir);
    assert_eq!(runner.require("self").unwrap().get("same"), Value::Boolean(true));
}

#[test]
fn test_module_exports_replaced_wholesale() {
    let dir = fixture(&[
        ("fn.js", "module.exports = function (x) { return x * 2; };"),
        ("user.js", "exports.value = require('fn')(21);"),
    ]);
    let (runner, _) = counting_runner(&dir);
    assert_eq!(runner.require("user").unwrap().get("value"), Value::from(42));
}

#[test]
fn test_module_scope_is_private() {
    let dir = fixture(&[
        ("one.js", "var secret = 1; exports.ok = true;"),
        ("two.js", "exports.seen = typeof secret;"),
    ]);
    let (runner, _) = counting_runner(&dir);
    runner.require("one").unwrap();
    assert_eq!(runner.require("two").unwrap().get("seen"), Value::from("undefined"));
}

#[test]
fn test_preregistered_module() {
    let dir = fixture(&[("app.js", "exports.main = function () { return require('config').mode; };")]);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let runner = Runner::builder()
        .locator(CountingLocator {
            inner: FileSystemLocator::new(dir.path()),
            calls: Rc::clone(&calls),
        })
        .module("config", Value::object_from([("mode", Value::from("test"))]))
        .build()
        .unwrap();

    assert_eq!(runner.run_main("app", Value::Undefined).unwrap(), Value::from("test"));
    assert_eq!(count(&calls, "config"), 0);
    assert!(runner.is_cached("config"));
}

#[test]
fn test_late_registration() {
    let dir = fixture(&[]);
    let (runner, _) = counting_runner(&dir);
    assert!(runner.require("late").is_err());
    runner.register_module("late", Value::from("registered"));
    assert_eq!(runner.require("late").unwrap(), Value::from("registered"));
}

#[test]
fn test_native_module_provider() {
    let dir = fixture(&[
        ("a.js", "exports.v = require('clock').now();"),
        ("b.js", "exports.v = require('clock').now();"),
    ]);
    let built = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&built);
    let runner = Runner::builder()
        .locator(FileSystemLocator::new(dir.path()))
        .native("clock", move || {
            *counter.borrow_mut() += 1;
            Ok(Value::object_from([(
                "now",
                Value::native("now", |_, _, _| Ok(Value::from(1000))),
            )]))
        })
        .build()
        .unwrap();

    assert_eq!(runner.require("a").unwrap().get("v"), Value::from(1000));
    assert_eq!(runner.require("b").unwrap().get("v"), Value::from(1000));
    assert_eq!(*built.borrow(), 1);
}

#[test]
fn test_native_module_failure() {
    let dir = fixture(&[("app.js", "require('device');")]);
    let runner = Runner::builder()
        .locator(FileSystemLocator::new(dir.path()))
        .native("device", || Err("device unavailable".into()))
        .build()
        .unwrap();

    let err = runner.require("app").unwrap_err();
    assert!(matches!(err, ModuleError::NativeModule { ref id, .. } if id == "device"));
    assert!(!runner.is_cached("app"));
}

#[test]
fn test_literal_id_cache_key() {
    let dir = fixture(&[
        ("shared.js", "exports.token = {};"),
        ("user.js", "exports.viaRelative = require('./shared');"),
    ]);
    let (runner, calls) = counting_runner(&dir);

    let direct = runner.require("shared").unwrap();
    let via_relative = runner.require("user").unwrap().get("viaRelative");

    // "./shared" and "shared" are different cache keys
    assert!(!direct.strict_equals(&via_relative));
    assert_eq!(count(&calls, "shared"), 2);
}
