//! Built-in objects and methods.
//!
//! Only what module code needs is provided: `console`, the error
//! constructors, and a handful of array and string methods. Globals are
//! granted through [`Capabilities`](crate::runtime::Capabilities), never
//! installed implicitly.

pub mod console;
pub mod error;
pub mod methods;
