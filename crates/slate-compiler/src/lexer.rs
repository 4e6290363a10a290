use std::sync::Arc;

use tracing::debug;

use crate::config::{CompileOptions, NewlineMode};
use crate::error::{DiagnosticKind, DiagnosticLog};
use crate::token::{Position, Token, TokenKind};
use crate::types::TYPE_NAMES;

pub const KEYWORDS: [&str; 5] = ["let", "define", "if", "elif", "else"];

pub fn is_operator_char(ch: char) -> bool { matches!(ch, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' | ':' | '.') }

fn is_grouper(ch: char) -> bool { matches!(ch, '(' | ')' | '{' | '}') }

fn is_word_start(ch: char) -> bool { ch.is_ascii_alphabetic() || ch == '_' }

fn is_word_char(ch: char) -> bool { ch.is_ascii_alphanumeric() || ch == '_' }

pub fn is_keyword(word: &str) -> bool { KEYWORDS.contains(&word) || TYPE_NAMES.contains(&word) }

fn radix_of(marker: char) -> Option<u32> {
    match marker {
        'b' => Some(2),
        'o' => Some(8),
        'd' => Some(10),
        'x' => Some(16),
        _ => None,
    }
}

/// Splits constant text into its digits and radix, e.g. `0x1f` -> (`1f`, 16).
fn split_radix(text: &str) -> (&str, u32) {
    let mut chars = text.chars();
    if let (Some('0'), Some(marker)) = (chars.next(), chars.next()) {
        if let Some(radix) = radix_of(marker) { return (&text[2..], radix); }
    }
    (text, 10)
}

pub fn is_valid_constant(text: &str) -> bool {
    let (digits, radix) = split_radix(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix))
}

/// Largest literal whose tagged form (`n << 1`) still fits in a signed word.
pub const MAX_LITERAL: i64 = i64::MAX >> 1;

/// Numeric value of a constant token; `None` for malformed or out-of-range text.
pub fn constant_value(text: &str) -> Option<i64> {
    if !is_valid_constant(text) { return None; }
    let (digits, radix) = split_radix(text);
    i64::from_str_radix(digits, radix).ok().filter(|v| *v <= MAX_LITERAL)
}

pub struct Lexer {
    input: Vec<char>,
    len: usize,
    idx: usize,
    line: usize,
    col: usize,
    source: Arc<str>,
    newlines: NewlineMode,
}

impl Lexer {
    pub fn new(source: &str, options: &CompileOptions) -> Self {
        let input: Vec<char> = source.chars().collect();
        let len = input.len();
        Self { input, len, idx: 0, line: 1, col: 1, source: options.source_name.clone(), newlines: options.newline_mode }
    }

    fn pos(&self) -> Position { Position::new(self.line, self.col, self.source.clone()) }

    fn peek(&self) -> Option<char> { self.input.get(self.idx).copied() }

    fn bump(&mut self) -> Option<char> {
        if self.idx >= self.len { return None; }
        let ch = self.input[self.idx];
        self.idx += 1;
        self.col += 1;
        Some(ch)
    }

    fn bump_line(&mut self) {
        // "\r\n" counts as a single line break
        if self.bump() == Some('\r') && self.peek() == Some('\n') { self.idx += 1; }
        self.line += 1;
        self.col = 1;
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) { break; }
            s.push(ch);
            self.bump();
        }
        s
    }

    fn read_word(&mut self, pos: Position) -> Token {
        let word = self.take_while(is_word_char);
        let kind = if word == "true" || word == "false" {
            TokenKind::Boolean
        } else if is_keyword(&word) {
            TokenKind::Keyword
        } else {
            TokenKind::Variable
        };
        Token::new(word, kind, pos)
    }

    fn read_constant(&mut self, pos: Position, log: &mut DiagnosticLog) -> Token {
        let text = self.take_while(is_word_char);
        if !is_valid_constant(&text) {
            log.push(DiagnosticKind::InvalidToken { text: text.clone() }, pos.clone());
            return Token::new(text, TokenKind::Undefined, pos);
        }
        if constant_value(&text).is_none() {
            log.push(DiagnosticKind::IntegerOutOfRange { text: text.clone() }, pos.clone());
            return Token::new(text, TokenKind::Undefined, pos);
        }
        Token::new(text, TokenKind::Constant, pos)
    }

    fn read_unknown(&mut self, pos: Position, log: &mut DiagnosticLog) -> Token {
        let mut text: String = self.bump().into_iter().collect();
        text.push_str(&self.take_while(|c| {
            !(c.is_whitespace() || is_grouper(c) || is_operator_char(c) || is_word_char(c) || c == ',')
        }));
        log.push(DiagnosticKind::InvalidToken { text: text.clone() }, pos.clone());
        Token::new(text, TokenKind::Undefined, pos)
    }

    /// Produces the next token, or `None` once the input is exhausted.
    /// Invalid text becomes an `Undefined` token plus a diagnostic; lexing always continues.
    pub fn next_token(&mut self, log: &mut DiagnosticLog) -> Option<Token> {
        loop {
            let ch = self.peek()?;
            let pos = self.pos();
            match ch {
                ' ' | '\t' => { self.bump(); }
                '\n' | '\r' => {
                    self.bump_line();
                    if self.newlines == NewlineMode::Emit { return Some(Token::new("\n", TokenKind::Newline, pos)); }
                }
                '(' | ')' | '{' | '}' => { self.bump(); return Some(Token::new(ch, TokenKind::Grouper, pos)); }
                ',' => { self.bump(); return Some(Token::new(ch, TokenKind::Comma, pos)); }
                c if is_operator_char(c) => {
                    let text = self.take_while(is_operator_char);
                    return Some(Token::new(text, TokenKind::Operator, pos));
                }
                c if is_word_start(c) => return Some(self.read_word(pos)),
                c if c.is_ascii_digit() => return Some(self.read_constant(pos, log)),
                _ => return Some(self.read_unknown(pos, log)),
            }
        }
    }
}

pub fn tokenize(source: &str, options: &CompileOptions, log: &mut DiagnosticLog) -> Vec<Token> {
    let mut lex = Lexer::new(source, options);
    let mut tokens = Vec::new();
    while let Some(tok) = lex.next_token(log) { tokens.push(tok); }
    debug!(source = %options.source_name, tokens = tokens.len(), "lexed source");
    tokens
}
