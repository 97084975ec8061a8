//! Runtime data structures: values, objects, functions and scopes.

pub mod capabilities;
pub mod function;
pub mod object;
pub mod scope;
pub mod value;

pub use capabilities::Capabilities;
pub use function::{Closure, Function, FunctionKind, NativeFn};
pub use object::{Object, ObjectRef};
pub use scope::{Scope, ScopeRef};
pub use value::Value;
