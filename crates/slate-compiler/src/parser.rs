use std::mem;

use tracing::debug;

use crate::ast::{Node, Program};
use crate::context::CompilationContext;
use crate::error::DiagnosticKind;
use crate::reorder::is_prefix_operator;
use crate::token::{Position, Token, TokenKind};
use crate::typeck::register_binding;
use crate::types::ValueType;

fn starts_expression(tok: &Token) -> bool {
    match tok.kind {
        TokenKind::Grouper => tok.text == "(" || tok.text == ")",
        TokenKind::Operator => is_prefix_operator(&tok.text),
        k => k.is_operand(),
    }
}

/// A binding whose header has been parsed and whose body is still to come.
struct OpenBinding {
    name: Token,
    declared: Option<ValueType>,
    expr: Node,
}

/// Recursive-descent statement parser. Expressions are handed to the
/// reorderer (see `reorder`). Nothing here aborts: every problem is logged
/// and parsing resumes at the next token it can make sense of.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    idx: usize,
    // number of enclosing `{`
    depth: usize,
    pub(crate) ctx: &'a mut CompilationContext,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, ctx: &'a mut CompilationContext) -> Self { Self { tokens, idx: 0, depth: 0, ctx } }

    pub fn parse_program(&mut self) -> Program {
        let stmts = self.parse_statements();
        debug!(statements = stmts.len(), diagnostics = self.ctx.log.len(), "parsed program");
        Program { stmts }
    }

    pub(crate) fn cur(&self) -> Option<&Token> { self.tokens.get(self.idx) }

    pub(crate) fn bump(&mut self) { if self.idx < self.tokens.len() { self.idx += 1; } }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.cur().cloned();
        self.bump();
        tok
    }

    /// Position used for diagnostics at the cursor, falling back to the last token.
    pub(crate) fn here(&self) -> Position {
        self.cur()
            .or_else(|| self.tokens.last())
            .map(|t| t.pos.clone())
            .unwrap_or_else(|| Position::new(1, 1, self.ctx.options.source_name.clone()))
    }

    fn found(&self) -> String { self.cur().map(Token::describe).unwrap_or_else(|| "end of input".to_string()) }

    fn at_grouper(&self, text: &str) -> bool { self.cur().is_some_and(|t| t.is_grouper(text)) }

    fn at_keyword(&self, text: &str) -> bool { self.cur().is_some_and(|t| t.is_keyword(text)) }

    fn skip_newlines(&mut self) { while self.cur().is_some_and(|t| t.kind == TokenKind::Newline) { self.bump(); } }

    fn error(&mut self, kind: DiagnosticKind, pos: Position) { self.ctx.log.push(kind, pos); }

    /// Statements up to the enclosing `}` (left unconsumed) or end of input.
    /// A binding's body is every statement after it, so a run of bindings nests;
    /// the open bindings are kept on a stack and closed once the run ends.
    fn parse_statements(&mut self) -> Vec<Node> {
        let mut open: Vec<(OpenBinding, Vec<Node>)> = Vec::new();
        let mut stmts = Vec::new();
        while let Some(tok) = self.cur().cloned() {
            if tok.is_grouper("}") {
                if self.depth > 0 { break; }
                self.error(DiagnosticKind::UnmatchedGrouper { text: tok.text.clone() }, tok.pos);
                self.bump();
                continue;
            }
            if tok.is_keyword("let") || tok.is_keyword("define") {
                if let Some(head) = self.parse_binding_head() { open.push((head, mem::take(&mut stmts))); }
                continue;
            }
            if let Some(stmt) = self.parse_stmt() { stmts.push(stmt); }
        }
        while let Some((head, mut outer)) = open.pop() {
            outer.push(Node::binding(&head.name, head.declared, head.expr, stmts));
            stmts = outer;
        }
        stmts
    }

    fn parse_stmt(&mut self) -> Option<Node> {
        let tok = self.cur()?.clone();
        match tok.kind {
            TokenKind::Newline => {
                self.bump();
                None
            }
            _ if starts_expression(&tok) => self.parse_expression(),
            TokenKind::Grouper if tok.text == "{" => Some(self.parse_block()),
            TokenKind::Keyword if tok.text == "let" || tok.text == "define" => {
                let head = self.parse_binding_head()?;
                let body = self.parse_statements();
                Some(Node::binding(&head.name, head.declared, head.expr, body))
            }
            TokenKind::Keyword if tok.text == "if" => {
                self.bump();
                Some(self.parse_conditional(tok))
            }
            _ => {
                self.error(DiagnosticKind::UnexpectedToken { found: tok.describe() }, tok.pos);
                self.bump();
                None
            }
        }
    }

    /// `let name [: type] = stmt ::`, up to where the body starts. The name is
    /// registered before the body is parsed, so the body can see it and `stmt`
    /// cannot. `None` means there was no name to bind.
    fn parse_binding_head(&mut self) -> Option<OpenBinding> {
        self.bump();

        let name = match self.cur().cloned() {
            Some(tok) if tok.kind == TokenKind::Variable => {
                self.bump();
                tok
            }
            _ => {
                let found = self.found();
                self.error(DiagnosticKind::ExpectedToken { expected: "variable to bind", found }, self.here());
                self.skip_binding_header();
                if self.cur().is_some_and(|t| t.is_operator("::")) { self.bump(); }
                return None;
            }
        };

        let declared = if self.cur().is_some_and(|t| t.is_operator(":")) {
            self.bump();
            self.parse_type_name()
        } else {
            None
        };

        let mut recovered = false;
        let expr = if self.cur().is_some_and(|t| t.is_operator("=")) {
            self.bump();
            self.skip_newlines();
            if self.cur().is_none() || self.at_grouper("}") {
                self.error(DiagnosticKind::UnexpectedTermination { construct: "binding" }, self.here());
                Node::placeholder(name.pos.clone())
            } else {
                self.parse_stmt().unwrap_or_else(|| Node::placeholder(name.pos.clone()))
            }
        } else {
            let found = self.found();
            self.error(DiagnosticKind::ExpectedToken { expected: "binding assignment operator \"=\"", found }, self.here());
            // the name is still bound, as undefined, so its uses stay quiet
            self.skip_binding_header();
            recovered = true;
            Node::placeholder(name.pos.clone())
        };

        let ctx = &mut *self.ctx;
        register_binding(&mut ctx.env, &mut ctx.log, &name, declared, expr.ty);

        self.skip_newlines();
        if self.cur().is_some_and(|t| t.is_operator("::")) {
            self.bump();
        } else if !recovered && self.cur().is_some() && !self.at_grouper("}") {
            let found = self.found();
            self.error(DiagnosticKind::ExpectedToken { expected: "binding terminator \"::\"", found }, self.here());
        }

        Some(OpenBinding { name, declared, expr })
    }

    /// Skips the rest of a malformed binding header, stopping at its `::`, the
    /// end of the line or a closing `}`.
    fn skip_binding_header(&mut self) {
        while let Some(tok) = self.cur() {
            if tok.kind == TokenKind::Newline || tok.is_operator("::") || tok.is_grouper("}") { break; }
            self.bump();
        }
    }

    fn parse_type_name(&mut self) -> Option<ValueType> {
        let Some(tok) = self.cur().cloned() else {
            self.error(DiagnosticKind::UnexpectedTermination { construct: "type annotation" }, self.here());
            return None;
        };
        if !matches!(tok.kind, TokenKind::Keyword | TokenKind::Variable) {
            self.error(DiagnosticKind::ExpectedToken { expected: "type name", found: tok.describe() }, tok.pos);
            return None;
        }
        self.bump();
        let ty = ValueType::from_name(&tok.text);
        if ty.is_none() { self.error(DiagnosticKind::UnknownType { name: tok.text.clone() }, tok.pos); }
        ty
    }

    /// `if` has already been consumed; `elif` chains recurse through here.
    fn parse_conditional(&mut self, keyword: Token) -> Node {
        let cond = if !self.cur().is_some_and(starts_expression) {
            let found = self.found();
            self.error(DiagnosticKind::ExpectedToken { expected: "condition", found }, self.here());
            Node::placeholder(keyword.pos.clone())
        } else {
            self.parse_expression().unwrap_or_else(|| Node::placeholder(keyword.pos.clone()))
        };

        self.skip_newlines();
        if !self.at_grouper("{") {
            let found = self.found();
            let pos = self.here();
            self.error(DiagnosticKind::ExpectedToken { expected: "\"{\"", found }, pos.clone());
            return Node::conditional(cond, Node::block(Vec::new(), pos), None, keyword.pos, &mut self.ctx.log);
        }
        let then_block = self.parse_block();

        let mark = self.idx;
        self.skip_newlines();
        let else_branch = if self.at_keyword("elif") {
            self.advance().map(|elif| self.parse_conditional(elif))
        } else if self.at_keyword("else") {
            self.bump();
            self.skip_newlines();
            if self.at_grouper("{") {
                Some(self.parse_block())
            } else {
                let found = self.found();
                self.error(DiagnosticKind::ExpectedToken { expected: "\"{\"", found }, self.here());
                None
            }
        } else {
            self.idx = mark;
            None
        };

        Node::conditional(cond, then_block, else_branch, keyword.pos, &mut self.ctx.log)
    }

    /// `{ stmt* }` in a fresh scope. The cursor sits on `{`.
    fn parse_block(&mut self) -> Node {
        let open_pos = self.here();
        self.bump();
        self.ctx.env.push_scope();
        self.depth += 1;
        let stmts = self.parse_statements();
        if self.at_grouper("}") {
            self.bump();
        } else {
            self.error(DiagnosticKind::UnmatchedGrouper { text: "{".to_string() }, open_pos.clone());
        }
        self.depth -= 1;
        self.ctx.env.pop_scope();
        Node::block(stmts, open_pos)
    }
}
