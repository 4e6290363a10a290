use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub source: Arc<str>,
}

impl Position {
    pub fn new(line: usize, column: usize, source: Arc<str>) -> Self { Self { line, column, source } }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} @ {}.{}]", self.source, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Boolean,
    Constant,
    Variable,
    Keyword,
    Operator,
    // ( ) { }
    Grouper,
    Comma,
    Newline,
    Undefined,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Boolean => "boolean",
            Constant => "constant",
            Variable => "variable",
            Keyword => "keyword",
            Operator => "operator",
            Grouper => "grouper",
            Comma => "comma",
            Newline => "newline",
            Undefined => "undefined",
        }
    }

    pub fn is_operand(self) -> bool { matches!(self, TokenKind::Boolean | TokenKind::Constant | TokenKind::Variable | TokenKind::Undefined) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind, pos: Position) -> Self { Self { text: text.into(), kind, pos } }

    pub fn is(&self, kind: TokenKind, text: &str) -> bool { self.kind == kind && self.text == text }

    pub fn is_grouper(&self, text: &str) -> bool { self.is(TokenKind::Grouper, text) }

    pub fn is_operator(&self, text: &str) -> bool { self.is(TokenKind::Operator, text) }

    pub fn is_keyword(&self, text: &str) -> bool { self.is(TokenKind::Keyword, text) }

    /// Text used when the token is quoted in a diagnostic.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Newline => "newline".to_string(),
            _ => format!("\"{}\"", self.text),
        }
    }
}
