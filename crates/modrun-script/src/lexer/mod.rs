//! Lexical analysis for module source.
//!
//! The scanner turns source text into a stream of [`Token`]s, recording for
//! each token whether a line break preceded it so the parser can apply
//! automatic semicolon insertion.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
