use std::mem;

use crate::token::Position;
use crate::types::ValueType;

/// A syntax tree node. Every node owns its children and carries the type
/// inferred for it when it was built (see `typeck`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: ValueType,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Boolean { text: String, value: bool },
    Integer { text: String, value: i64 },
    Variable { name: String },
    Unary { op: String, operand: Box<Node> },
    Binary { op: String, left: Box<Node>, right: Box<Node> },
    /// `let name [: declared] = expr :: body`; `body` holds the statements that follow
    /// in the same scope and is empty when nothing follows.
    Binding { name: String, declared: Option<ValueType>, expr: Box<Node>, body: Vec<Node> },
    Block { stmts: Vec<Node> },
    Conditional { cond: Box<Node>, then_block: Box<Node>, else_branch: Option<Box<Node>> },
    Call { name: String, args: Vec<Node> },
    /// Stands in for an operand or expression that could not be parsed.
    Placeholder,
}

impl Node {
    pub fn is_defined(&self) -> bool { self.ty.is_defined() }

    /// Compact s-expression rendering, handy for inspecting tree shape.
    pub fn sexpr(&self) -> String {
        use NodeKind::*;

        enum Piece<'n> {
            Node(&'n Node),
            Text(&'n str),
        }

        let mut out = String::new();
        let mut work = vec![Piece::Node(self)];
        while let Some(piece) = work.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Piece::Node(node) => node,
            };
            let mut parts = Vec::new();
            match &node.kind {
                Boolean { text, .. } | Integer { text, .. } => parts.push(Piece::Text(text)),
                Variable { name } => parts.push(Piece::Text(name)),
                Unary { op, operand } => parts.extend([Piece::Text("("), Piece::Text(op), Piece::Text(" "), Piece::Node(operand), Piece::Text(")")]),
                Binary { op, left, right } => parts.extend([
                    Piece::Text("("),
                    Piece::Text(op),
                    Piece::Text(" "),
                    Piece::Node(left),
                    Piece::Text(" "),
                    Piece::Node(right),
                    Piece::Text(")"),
                ]),
                Binding { name, expr, body, .. } => {
                    parts.extend([Piece::Text("(let "), Piece::Text(name), Piece::Text(" "), Piece::Node(expr)]);
                    for stmt in body { parts.extend([Piece::Text(" "), Piece::Node(stmt)]); }
                    parts.push(Piece::Text(")"));
                }
                Block { stmts } => {
                    parts.push(Piece::Text("{"));
                    for (i, stmt) in stmts.iter().enumerate() {
                        if i > 0 { parts.push(Piece::Text(" ")); }
                        parts.push(Piece::Node(stmt));
                    }
                    parts.push(Piece::Text("}"));
                }
                Conditional { cond, then_block, else_branch } => {
                    parts.extend([Piece::Text("(if "), Piece::Node(cond), Piece::Text(" "), Piece::Node(then_block)]);
                    if let Some(e) = else_branch { parts.extend([Piece::Text(" "), Piece::Node(e)]); }
                    parts.push(Piece::Text(")"));
                }
                Call { name, args } => {
                    parts.extend([Piece::Text("("), Piece::Text(name)]);
                    for arg in args { parts.extend([Piece::Text(" "), Piece::Node(arg)]); }
                    parts.push(Piece::Text(")"));
                }
                Placeholder => parts.push(Piece::Text("?")),
            }
            work.extend(parts.into_iter().rev());
        }
        out
    }
}

impl NodeKind {
    /// Moves the children out, leaving a placeholder behind.
    fn take_children(&mut self, into: &mut Vec<Node>) {
        match mem::replace(self, NodeKind::Placeholder) {
            NodeKind::Unary { operand, .. } => into.push(*operand),
            NodeKind::Binary { left, right, .. } => into.extend([*left, *right]),
            NodeKind::Binding { expr, body, .. } => {
                into.push(*expr);
                into.extend(body);
            }
            NodeKind::Block { stmts } => into.extend(stmts),
            NodeKind::Conditional { cond, then_block, else_branch } => {
                into.extend([*cond, *then_block]);
                if let Some(e) = else_branch { into.push(*e); }
            }
            NodeKind::Call { args, .. } => into.extend(args),
            _ => {}
        }
    }
}

// Long operator chains build trees as deep as the source is long; tear them
// down with a worklist instead of recursive drop glue.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.kind.take_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.kind.take_children(&mut pending);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub stmts: Vec<Node>,
}
