//! Formula tokenizer
//!
//! Scans formula text (everything after the `=` sigil) left to right with
//! one character of lookahead.

use crate::error::{LexError, LexResult};
use std::fmt;

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    True,
    False,

    // Identifiers and references
    Cell,
    Identifier,

    // Operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Exclamation,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    NotEqual,
    DotDot,
    Comma,

    // Delimiters
    ParenLeft,
    ParenRight,

    // End of input
    Eof,
}

/// Literal payload carried by number and string tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
}

/// A scanned token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Raw source text of the token
    pub lexeme: String,
    /// Token kind
    pub kind: TokenKind,
    /// Parsed value for number and string tokens
    pub literal: Option<Literal>,
}

impl Token {
    fn new(lexeme: &str, kind: TokenKind, literal: Option<Literal>) -> Self {
        Self {
            lexeme: lexeme.to_string(),
            kind,
            literal,
        }
    }

    /// True for the end-of-input token
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(Literal::Number(n)) => write!(f, "{:?}({:?}, {})", self.kind, self.lexeme, n),
            Some(Literal::Text(s)) => write!(f, "{:?}({:?}, {:?})", self.kind, self.lexeme, s),
            None => write!(f, "{:?}({:?})", self.kind, self.lexeme),
        }
    }
}

/// Keywords recognised among identifiers
fn keyword(text: &str) -> Option<TokenKind> {
    match text {
        "True" | "true" => Some(TokenKind::True),
        "False" | "false" => Some(TokenKind::False),
        _ => None,
    }
}

/// Single-character operators
fn single_operator(c: char) -> Option<TokenKind> {
    let kind = match c {
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Asterisk,
        '/' => TokenKind::Slash,
        '>' => TokenKind::Greater,
        '<' => TokenKind::Less,
        '(' => TokenKind::ParenLeft,
        ')' => TokenKind::ParenRight,
        '=' => TokenKind::Equal,
        ',' => TokenKind::Comma,
        '!' => TokenKind::Exclamation,
        _ => return None,
    };
    Some(kind)
}

/// Two-character operators, keyed by their first character
fn compound_operator(first: char) -> Option<(char, TokenKind)> {
    match first {
        '>' => Some(('=', TokenKind::GreaterEqual)),
        '<' => Some(('=', TokenKind::LessEqual)),
        '!' => Some(('=', TokenKind::NotEqual)),
        '.' => Some(('.', TokenKind::DotDot)),
        _ => None,
    }
}

/// Tokenize formula text.
///
/// Scanning always runs to the end of the input; the first error found is
/// returned in place of the tokens.
///
/// ```
/// use subsheet_formula::lexer::{tokenize, TokenKind};
///
/// let tokens = tokenize("sum(A1..A3)").unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::Identifier,
///         TokenKind::ParenLeft,
///         TokenKind::Cell,
///         TokenKind::DotDot,
///         TokenKind::Cell,
///         TokenKind::ParenRight,
///         TokenKind::Eof,
///     ]
/// );
/// ```
pub fn tokenize(text: &str) -> LexResult<Vec<Token>> {
    let (tokens, error) = Lexer::new(text).scan();
    match error {
        Some(e) => Err(e),
        None => Ok(tokens),
    }
}

/// Formula tokenizer
pub struct Lexer<'a> {
    input: &'a str,
    start: usize,
    pos: usize,
    tokens: Vec<Token>,
    error: Option<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            start: 0,
            pos: 0,
            tokens: Vec::new(),
            error: None,
        }
    }

    /// Scan the whole input.
    ///
    /// Returns every token that could be formed (always ending with EOF)
    /// together with the first error encountered, if any. Callers must check
    /// the error before using the tokens.
    pub fn scan(mut self) -> (Vec<Token>, Option<LexError>) {
        while !self.is_at_end() {
            self.start = self.pos;
            self.scan_token();
        }

        self.start = self.pos;
        self.add_token(TokenKind::Eof, None);

        (self.tokens, self.error)
    }

    fn scan_token(&mut self) {
        let Some(c) = self.advance() else {
            return;
        };

        if c == '"' {
            self.scan_string();
        } else if c.is_ascii_digit() || (c == '.' && self.peek_char() != Some('.')) {
            self.scan_number();
        } else if c.is_ascii_uppercase()
            && self
                .peek_char()
                .map_or(true, |n| n.is_ascii_uppercase() || n.is_ascii_digit())
        {
            self.scan_cell();
        } else if c.is_ascii_alphabetic() {
            self.scan_identifier();
        } else if let Some((second, kind)) = compound_operator(c) {
            if self.peek_char() == Some(second) {
                self.advance();
                self.add_token(kind, None);
            } else if let Some(kind) = single_operator(c) {
                self.add_token(kind, None);
            } else {
                self.set_error(LexError::InvalidChar);
            }
        } else if let Some(kind) = single_operator(c) {
            self.add_token(kind, None);
        } else if !matches!(c, ' ' | '\t' | '\r' | '\n') {
            self.set_error(LexError::InvalidChar);
        }
    }

    fn scan_string(&mut self) {
        while self.peek_char().map_or(false, |c| c != '"') {
            self.advance();
        }

        let value = self.input[self.start + 1..self.pos].to_string();

        // Closing quote (an unterminated string runs to end of input)
        self.advance();

        self.add_token(TokenKind::String, Some(Literal::Text(value)));
    }

    fn scan_number(&mut self) {
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_digit() || c == '.')
        {
            self.advance();
        }

        match self.lexeme().parse::<f64>() {
            Ok(n) => self.add_token(TokenKind::Number, Some(Literal::Number(n))),
            Err(_) => self.set_error(LexError::InvalidNumber),
        }
    }

    fn scan_cell(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_uppercase()) {
            self.advance();
        }

        if !self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.set_error(LexError::InvalidCell);
            return;
        }

        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        self.add_token(TokenKind::Cell, None);
    }

    fn scan_identifier(&mut self) {
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            self.advance();
        }

        let kind = keyword(self.lexeme()).unwrap_or(TokenKind::Identifier);
        self.add_token(kind, None);
    }

    // === Helper methods ===

    fn lexeme(&self) -> &'a str {
        &self.input[self.start..self.pos]
    }

    fn add_token(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let token = Token::new(self.lexeme(), kind, literal);
        self.tokens.push(token);
    }

    fn set_error(&mut self, error: LexError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input_yields_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_number_literals() {
        let tokens = tokenize("42 3.5 .25").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.5)));
        assert_eq!(tokens[2].literal, Some(Literal::Number(0.25)));
        assert_eq!(tokens[1].lexeme, "3.5");
    }

    #[test]
    fn test_malformed_number() {
        assert_eq!(tokenize("1.2.3"), Err(LexError::InvalidNumber));
        assert_eq!(tokenize("1+."), Err(LexError::InvalidNumber));
    }

    #[test]
    fn test_string_literal_is_verbatim() {
        let tokens = tokenize("\"a\\nb\" + \"\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal, Some(Literal::Text("a\\nb".into())));
        assert_eq!(tokens[0].lexeme, "\"a\\nb\"");
        assert_eq!(tokens[2].literal, Some(Literal::Text(String::new())));
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let tokens = tokenize("\"abc").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Text("abc".into())));
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_cell_tokens() {
        let tokens = tokenize("A1+AB23").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Cell);
        assert_eq!(tokens[0].lexeme, "A1");
        assert_eq!(tokens[2].kind, TokenKind::Cell);
        assert_eq!(tokens[2].lexeme, "AB23");
    }

    #[test]
    fn test_invalid_cell() {
        assert_eq!(tokenize("A1B"), Err(LexError::InvalidCell));
        assert_eq!(tokenize("AB+1"), Err(LexError::InvalidCell));
        assert_eq!(tokenize("A"), Err(LexError::InvalidCell));
    }

    #[test]
    fn test_lone_capital_is_identifier() {
        let tokens = tokenize("B + 1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "B");
        assert_eq!(kinds("X(1)")[0], TokenKind::Identifier);
        assert_eq!(
            crate::parse_formula("=B + 1"),
            Err(crate::FormulaError::Parse(crate::ParseError::UnexpectedToken))
        );
    }

    #[test]
    fn test_identifiers_and_keywords() {
        assert_eq!(
            kinds("sum True False true x1"),
            vec![
                TokenKind::Identifier,
                TokenKind::True,
                TokenKind::False,
                TokenKind::True,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        // Uppercase letter followed by a lowercase one is not a cell
        assert_eq!(kinds("Abc"), vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds(">= <= != .. > < ! ="),
            vec![
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::NotEqual,
                TokenKind::DotDot,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::Exclamation,
                TokenKind::Equal,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_range_tokens() {
        assert_eq!(
            kinds("A1..B2"),
            vec![TokenKind::Cell, TokenKind::DotDot, TokenKind::Cell, TokenKind::Eof]
        );
    }

    #[test]
    fn test_invalid_char_keeps_scanning() {
        let (tokens, error) = Lexer::new("1 # 2").scan();
        assert_eq!(error, Some(LexError::InvalidChar));
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn test_first_error_wins() {
        let (_, error) = Lexer::new("1.2.3 + A1B").scan();
        assert_eq!(error, Some(LexError::InvalidNumber));
    }
}
