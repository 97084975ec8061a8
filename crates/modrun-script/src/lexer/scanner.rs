//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes script source code.
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the source text this scanner reads from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = self.skip_whitespace_and_comments();

        let start = self.current_pos;
        let (line, column) = (self.line, self.column);

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, line, column),
                newline_before,
            );
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,

            '.' => match self.peek() {
                Some('0'..='9') => self.scan_number(ch),
                _ => TokenKind::Dot,
            },
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_with_equal(TokenKind::Star, TokenKind::StarEqual),
            '/' => self.scan_with_equal(TokenKind::Slash, TokenKind::SlashEqual),
            '%' => TokenKind::Percent,
            '<' => self.scan_with_equal(TokenKind::LessThan, TokenKind::LessThanEqual),
            '>' => self.scan_with_equal(TokenKind::GreaterThan, TokenKind::GreaterThanEqual),
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),
            '&' => self.scan_double('&', TokenKind::AmpersandAmpersand, ch),
            '|' => self.scan_double('|', TokenKind::PipePipe, ch),

            '"' | '\'' => self.scan_string(ch),

            '0'..='9' => self.scan_number(ch),

            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => TokenKind::Invalid(ch),
        };

        Token::new(
            kind,
            Span::new(start, self.current_pos, line, column),
            newline_before,
        )
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    /// Skips trivia and reports whether a line terminator was crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut saw_newline = false;
        loop {
            match self.peek() {
                Some('\n') => {
                    saw_newline = true;
                    self.advance();
                }
                Some(' ' | '\t' | '\r' | '\u{feff}') => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        while let Some((_, ch)) = self.advance() {
                            if ch == '\n' {
                                saw_newline = true;
                            }
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        saw_newline
    }

    fn scan_plus(&mut self) -> TokenKind {
        match self.peek() {
            Some('+') => {
                self.advance();
                TokenKind::PlusPlus
            }
            Some('=') => {
                self.advance();
                TokenKind::PlusEqual
            }
            _ => TokenKind::Plus,
        }
    }

    fn scan_minus(&mut self) -> TokenKind {
        match self.peek() {
            Some('-') => {
                self.advance();
                TokenKind::MinusMinus
            }
            Some('=') => {
                self.advance();
                TokenKind::MinusEqual
            }
            _ => TokenKind::Minus,
        }
    }

    fn scan_with_equal(&mut self, plain: TokenKind, with_equal: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_equal
        } else {
            plain
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.peek() != Some('=') {
            return TokenKind::Equal;
        }
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            TokenKind::StrictEqual
        } else {
            TokenKind::EqualEqual
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.peek() != Some('=') {
            return TokenKind::Bang;
        }
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            TokenKind::StrictNotEqual
        } else {
            TokenKind::NotEqual
        }
    }

    fn scan_double(&mut self, second: char, kind: TokenKind, first: char) -> TokenKind {
        if self.peek() == Some(second) {
            self.advance();
            kind
        } else {
            TokenKind::Invalid(first)
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();
        loop {
            let Some((_, ch)) = self.advance() else {
                return TokenKind::UnterminatedString;
            };
            match ch {
                c if c == quote => return TokenKind::String(value),
                '\n' => return TokenKind::UnterminatedString,
                '\\' => {
                    let Some((_, escaped)) = self.advance() else {
                        return TokenKind::UnterminatedString;
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        'b' => value.push('\u{8}'),
                        'f' => value.push('\u{c}'),
                        'v' => value.push('\u{b}'),
                        'u' => match self.scan_unicode_escape() {
                            Some(c) => value.push(c),
                            None => return TokenKind::Invalid('\\'),
                        },
                        // Line continuation
                        '\n' => {}
                        other => value.push(other),
                    }
                }
                other => value.push(other),
            }
        }
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let (_, ch) = self.advance()?;
            code = code * 16 + ch.to_digit(16)?;
        }
        char::from_u32(code)
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let start = self.current_pos - first.len_utf8();

        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let digits_start = self.current_pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits = &self.source[digits_start..self.current_pos];
            return match u64::from_str_radix(digits, 16) {
                Ok(n) => TokenKind::Number(n as f64),
                Err(_) => TokenKind::Invalid('x'),
            };
        }

        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        if first != '.' && self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let next = self.peek_next();
            if matches!(next, Some('0'..='9' | '+' | '-')) {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some('0'..='9')) {
                    self.advance();
                }
            }
        }

        match self.source[start..self.current_pos].parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid(first),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let start = self.current_pos - first.len_utf8();
        while matches!(self.peek(), Some(c) if is_id_continue(c)) {
            self.advance();
        }
        let ident = &self.source[start..self.current_pos];
        TokenKind::keyword(ident).unwrap_or_else(|| TokenKind::Identifier(ident.to_string()))
    }
}

fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

fn is_id_continue(ch: char) -> bool {
    is_id_start(ch) || ch.is_ascii_digit()
}
