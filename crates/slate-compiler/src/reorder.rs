//! Expression runs: shunting-yard reordering into postfix order, then tree
//! construction by folding that order over an operand stack.
//!
//! An operator takes its right operand first and then its left one, so the
//! postfix output must keep operands in source order.

use std::mem;

use tracing::trace;

use crate::ast::Node;
use crate::error::DiagnosticKind;
use crate::parser::Parser;
use crate::token::{Position, Token, TokenKind};

/// Parentheses never get popped by an incoming operator.
pub const GROUP_PRIORITY: u8 = 0;
pub const PREFIX_PRIORITY: u8 = 4;

/// Priority of `op` in infix position, or `None` when `op` cannot appear in an expression.
pub fn infix_priority(op: &str) -> Option<u8> {
    match op {
        "==" | "!=" | "<" | ">" | "<=" | ">=" => Some(1),
        "+" | "-" => Some(2),
        "*" | "/" => Some(3),
        _ => None,
    }
}

pub fn is_prefix_operator(op: &str) -> bool { matches!(op, "-" | "!") }

/// One entry of the postfix output.
#[derive(Debug, Clone)]
pub enum Rpn {
    Operand(Token),
    /// Calls are parsed eagerly and travel through the reorderer as finished nodes.
    Call(Node),
    Prefix(Token),
    Infix(Token),
    /// Stand-in for an operand that was reported missing.
    Missing(Position),
}

#[derive(Debug)]
enum Pending {
    Open(Token),
    Prefix(Token),
    Infix(Token, u8),
}

impl Pending {
    fn priority(&self) -> u8 {
        match self {
            Pending::Open(_) => GROUP_PRIORITY,
            Pending::Prefix(_) => PREFIX_PRIORITY,
            Pending::Infix(_, p) => *p,
        }
    }

    fn operator(&self) -> &Token {
        match self {
            Pending::Open(t) | Pending::Prefix(t) | Pending::Infix(t, _) => t,
        }
    }

    fn into_rpn(self) -> Option<Rpn> {
        match self {
            Pending::Open(_) => None,
            Pending::Prefix(t) => Some(Rpn::Prefix(t)),
            Pending::Infix(t, _) => Some(Rpn::Infix(t)),
        }
    }
}

fn belongs_to_run(tok: &Token) -> bool {
    match tok.kind {
        TokenKind::Grouper => tok.text == "(" || tok.text == ")",
        TokenKind::Operator => infix_priority(&tok.text).is_some() || is_prefix_operator(&tok.text),
        TokenKind::Comma => true,
        k => k.is_operand(),
    }
}

impl<'a> Parser<'a> {
    /// Parses the expression run at the cursor into a typed tree.
    /// `None` means the run was discarded after a diagnostic.
    pub fn parse_expression(&mut self) -> Option<Node> {
        let output = self.reorder()?;
        trace!(entries = output.len(), "reordered expression");
        self.build_tree(output)
    }

    /// Shunting-yard over the run at the cursor. The run ends at the first
    /// token that cannot continue it; that token is left for the caller.
    pub fn reorder(&mut self) -> Option<Vec<Rpn>> {
        let mut output = Vec::new();
        let mut stack: Vec<Pending> = Vec::new();
        let mut expect_operand = true;
        let mut open = 0usize;

        while let Some(tok) = self.cur().cloned() {
            match tok.kind {
                TokenKind::Newline if open > 0 => self.bump(),
                k if k.is_operand() => {
                    if !expect_operand { break; }
                    self.bump();
                    if self.starts_call(&tok) {
                        let call = self.parse_call(tok);
                        output.push(Rpn::Call(call));
                    } else {
                        output.push(Rpn::Operand(tok));
                    }
                    expect_operand = false;
                }
                TokenKind::Grouper if tok.text == "(" => {
                    if !expect_operand { break; }
                    self.bump();
                    stack.push(Pending::Open(tok));
                    open += 1;
                }
                TokenKind::Grouper if tok.text == ")" => {
                    if open == 0 {
                        self.ctx.log.push(DiagnosticKind::UnexpectedEndOfExpression, tok.pos.clone());
                        self.bump();
                        self.skip_run();
                        return None;
                    }
                    self.bump();
                    if expect_operand { output.push(self.missing_operand(stack.last(), &tok)); }
                    while let Some(top) = stack.pop() {
                        match top.into_rpn() {
                            Some(rpn) => output.push(rpn),
                            None => break,
                        }
                    }
                    open -= 1;
                    expect_operand = false;
                }
                TokenKind::Operator => {
                    if expect_operand && is_prefix_operator(&tok.text) {
                        self.bump();
                        stack.push(Pending::Prefix(tok));
                        continue;
                    }
                    let Some(priority) = infix_priority(&tok.text) else { break };
                    self.bump();
                    if expect_operand {
                        self.ctx.log.push(DiagnosticKind::MissingLeftOperand { op: tok.text.clone() }, tok.pos.clone());
                        output.push(Rpn::Missing(tok.pos.clone()));
                    }
                    while let Some(top) = stack.last() {
                        if matches!(top, Pending::Open(_)) || top.priority() < priority { break; }
                        if let Some(rpn) = stack.pop().and_then(Pending::into_rpn) { output.push(rpn); }
                    }
                    stack.push(Pending::Infix(tok, priority));
                    expect_operand = true;
                }
                _ => break,
            }
        }

        if open > 0 {
            let pos = stack.iter().rev().find(|p| matches!(p, Pending::Open(_))).map(|p| p.operator().pos.clone()).unwrap_or_else(|| self.here());
            self.ctx.log.push(DiagnosticKind::UnexpectedEndOfExpression, pos);
            return None;
        }
        if expect_operand {
            if let Some(top) = stack.last() {
                let op = top.operator().clone();
                self.ctx.log.push(DiagnosticKind::MissingRightOperand { op: op.text.clone() }, op.pos.clone());
                output.push(Rpn::Missing(op.pos));
            }
        }
        while let Some(top) = stack.pop() {
            if let Some(rpn) = top.into_rpn() { output.push(rpn); }
        }
        if output.is_empty() { None } else { Some(output) }
    }

    fn missing_operand(&mut self, top: Option<&Pending>, close: &Token) -> Rpn {
        match top {
            Some(Pending::Open(_)) | None => {
                self.ctx.log.push(DiagnosticKind::ExpectedToken { expected: "expression", found: close.describe() }, close.pos.clone());
                Rpn::Missing(close.pos.clone())
            }
            Some(p) => {
                let op = p.operator();
                self.ctx.log.push(DiagnosticKind::MissingRightOperand { op: op.text.clone() }, op.pos.clone());
                Rpn::Missing(op.pos.clone())
            }
        }
    }

    fn skip_run(&mut self) {
        while let Some(tok) = self.cur() {
            if !belongs_to_run(tok) { break; }
            self.bump();
        }
    }

    /// Folds the postfix output into a tree over an explicit operand stack, so
    /// long operator chains never recurse. An operator takes its right operand
    /// off the stack first and then its left one. Types are inferred as each
    /// node is built.
    fn build_tree(&mut self, output: Vec<Rpn>) -> Option<Node> {
        let mut operands: Vec<Node> = Vec::with_capacity(output.len());
        for entry in output {
            let node = match entry {
                Rpn::Operand(tok) => self.leaf(&tok),
                Rpn::Call(node) => node,
                Rpn::Missing(pos) => Node::placeholder(pos),
                Rpn::Prefix(op) => {
                    let operand = self.pop_or_report(&mut operands, &op, false);
                    Node::unary(&op, operand, &mut self.ctx.log)
                }
                Rpn::Infix(op) => {
                    let right = self.pop_or_report(&mut operands, &op, false);
                    let left = self.pop_or_report(&mut operands, &op, true);
                    Node::binary(&op, left, right, &mut self.ctx.log)
                }
            };
            operands.push(node);
        }
        operands.pop()
    }

    fn pop_or_report(&mut self, operands: &mut Vec<Node>, op: &Token, left: bool) -> Node {
        if let Some(node) = operands.pop() { return node; }
        let kind = if left {
            DiagnosticKind::MissingLeftOperand { op: op.text.clone() }
        } else {
            DiagnosticKind::MissingRightOperand { op: op.text.clone() }
        };
        self.ctx.log.push(kind, op.pos.clone());
        Node::placeholder(op.pos.clone())
    }

    fn leaf(&mut self, tok: &Token) -> Node {
        match tok.kind {
            TokenKind::Boolean => Node::boolean(tok),
            TokenKind::Constant => Node::integer(tok),
            TokenKind::Variable => {
                let ctx = &mut *self.ctx;
                Node::variable(tok, &ctx.env, &mut ctx.log)
            }
            // already reported by the lexer
            _ => Node::placeholder(tok.pos.clone()),
        }
    }

    /// A name directly followed by `(` is a call unless it names a variable in scope.
    fn starts_call(&self, name: &Token) -> bool {
        name.kind == TokenKind::Variable
            && self.cur().is_some_and(|t| t.is_grouper("("))
            && (self.ctx.env.is_function(&name.text) || self.ctx.env.lookup(&name.text).is_none())
    }

    /// Collects the argument spans of a call, split on top-level commas, and
    /// parses each one as a full expression. The cursor sits on `(`.
    fn parse_call(&mut self, name: Token) -> Node {
        let open = self.cur().cloned();
        self.bump();
        let mut spans: Vec<Vec<Token>> = Vec::new();
        let mut current = Vec::new();
        let mut depth = 0usize;
        let mut closed = false;

        while let Some(tok) = self.cur().cloned() {
            if tok.is_grouper("{") || tok.is_grouper("}") || tok.kind == TokenKind::Keyword { break; }
            self.bump();
            match tok.kind {
                TokenKind::Newline => continue,
                TokenKind::Comma if depth == 0 => {
                    spans.push(mem::take(&mut current));
                    continue;
                }
                TokenKind::Grouper if tok.text == "(" => depth += 1,
                TokenKind::Grouper if tok.text == ")" => {
                    if depth == 0 {
                        closed = true;
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            current.push(tok);
        }

        if !closed {
            let pos = open.map(|t| t.pos).unwrap_or_else(|| name.pos.clone());
            self.ctx.log.push(DiagnosticKind::UnmatchedGrouper { text: "(".to_string() }, pos);
            return Node::placeholder(name.pos);
        }
        if !current.is_empty() || !spans.is_empty() { spans.push(current); }

        trace!(callee = %name.text, args = spans.len(), "parsing call");
        let args: Vec<Node> = spans.into_iter().map(|span| self.parse_argument(span, &name)).collect();
        let ctx = &mut *self.ctx;
        Node::call(&name, args, &ctx.env, &mut ctx.log)
    }

    fn parse_argument(&mut self, span: Vec<Token>, callee: &Token) -> Node {
        let Some(first) = span.first().cloned() else {
            self.ctx.log.push(DiagnosticKind::ExpectedToken { expected: "argument", found: "\",\"".to_string() }, callee.pos.clone());
            return Node::placeholder(callee.pos.clone());
        };
        let mut sub = Parser::new(span, &mut *self.ctx);
        let arg = sub.parse_expression().unwrap_or_else(|| Node::placeholder(first.pos.clone()));
        if let Some(extra) = sub.cur().cloned() {
            sub.ctx.log.push(DiagnosticKind::UnexpectedToken { found: extra.describe() }, extra.pos);
        }
        arg
    }
}
