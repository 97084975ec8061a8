//! Token definitions for the script lexer.

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// Whether a line terminator appeared between the previous token and this one
    pub newline_before: bool,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

/// The different kinds of tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal (escapes already processed)
    String(String),
    /// Boolean true
    True,
    /// Boolean false
    False,
    /// null
    Null,

    /// Identifier
    Identifier(String),

    // Keywords
    /// break
    Break,
    /// catch
    Catch,
    /// const
    Const,
    /// continue
    Continue,
    /// else
    Else,
    /// finally
    Finally,
    /// for
    For,
    /// function
    Function,
    /// if
    If,
    /// let
    Let,
    /// new
    New,
    /// return
    Return,
    /// this
    This,
    /// throw
    Throw,
    /// try
    Try,
    /// typeof
    Typeof,
    /// var
    Var,
    /// while
    While,

    // Punctuation
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// .
    Dot,
    /// ;
    Semicolon,
    /// ,
    Comma,
    /// :
    Colon,
    /// ?
    Question,

    // Operators
    /// <
    LessThan,
    /// >
    GreaterThan,
    /// <=
    LessThanEqual,
    /// >=
    GreaterThanEqual,
    /// ==
    EqualEqual,
    /// !=
    NotEqual,
    /// ===
    StrictEqual,
    /// !==
    StrictNotEqual,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// ++
    PlusPlus,
    /// --
    MinusMinus,
    /// !
    Bang,
    /// &&
    AmpersandAmpersand,
    /// ||
    PipePipe,

    // Assignment
    /// =
    Equal,
    /// +=
    PlusEqual,
    /// -=
    MinusEqual,
    /// *=
    StarEqual,
    /// /=
    SlashEqual,

    // Special
    /// End of input
    Eof,
    /// Unterminated string literal
    UnterminatedString,
    /// Any character the scanner does not understand
    Invalid(char),
}

impl TokenKind {
    /// Returns the keyword token for `ident`, if it is a reserved word.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "break" => TokenKind::Break,
            "catch" => TokenKind::Catch,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "else" => TokenKind::Else,
            "false" => TokenKind::False,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "let" => TokenKind::Let,
            "new" => TokenKind::New,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "while" => TokenKind::While,
            _ => return None,
        };
        Some(kind)
    }

    /// The text of this token when it may be used as a property name
    /// (`exports.default`, `{ new: 1 }`).
    pub fn property_name(&self) -> Option<String> {
        let name = match self {
            TokenKind::Identifier(name) => return Some(name.clone()),
            TokenKind::String(s) => return Some(s.clone()),
            TokenKind::Number(n) => return Some(crate::runtime::value::number_to_string(*n)),
            TokenKind::Break => "break",
            TokenKind::Catch => "catch",
            TokenKind::Const => "const",
            TokenKind::Continue => "continue",
            TokenKind::Else => "else",
            TokenKind::False => "false",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::Function => "function",
            TokenKind::If => "if",
            TokenKind::Let => "let",
            TokenKind::New => "new",
            TokenKind::Null => "null",
            TokenKind::Return => "return",
            TokenKind::This => "this",
            TokenKind::Throw => "throw",
            TokenKind::True => "true",
            TokenKind::Try => "try",
            TokenKind::Typeof => "typeof",
            TokenKind::Var => "var",
            TokenKind::While => "while",
            _ => return None,
        };
        Some(name.to_string())
    }

    /// A short human-readable description used in syntax errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {}", crate::runtime::value::number_to_string(*n)),
            TokenKind::String(s) => format!("string '{}'", s),
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::UnterminatedString => "unterminated string".to_string(),
            TokenKind::Invalid(ch) => format!("character '{}'", ch),
            other => match other.property_name() {
                Some(keyword) => format!("'{}'", keyword),
                None => format!("{:?}", other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(TokenKind::keyword("function"), Some(TokenKind::Function));
        assert_eq!(TokenKind::keyword("typeof"), Some(TokenKind::Typeof));
        assert_eq!(TokenKind::keyword("require"), None);
    }

    #[test]
    fn test_keywords_are_property_names() {
        assert_eq!(TokenKind::New.property_name().as_deref(), Some("new"));
        assert_eq!(TokenKind::Number(1.0).property_name().as_deref(), Some("1"));
        assert_eq!(TokenKind::Comma.property_name(), None);
    }
}
