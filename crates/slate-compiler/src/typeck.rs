//! Type inference performed while the tree is being built.
//!
//! Every constructor computes the node's `ValueType` from its already-typed
//! children (or from the environment for variables) and records a diagnostic
//! when no rule applies. A node whose type is `Undefined` never triggers a
//! second diagnostic in its ancestors.

use crate::ast::{Node, NodeKind};
use crate::env::Environment;
use crate::error::{DiagnosticKind, DiagnosticLog};
use crate::lexer::constant_value;
use crate::token::{Position, Token};
use crate::types::{binary_result, unary_result, ValueType};

impl Node {
    pub fn placeholder(pos: Position) -> Self { Node { kind: NodeKind::Placeholder, ty: ValueType::Undefined, pos } }

    pub fn boolean(tok: &Token) -> Self {
        let kind = NodeKind::Boolean { text: tok.text.clone(), value: tok.text == "true" };
        Node { kind, ty: ValueType::Boolean, pos: tok.pos.clone() }
    }

    pub fn integer(tok: &Token) -> Self {
        // malformed constants were already reported by the lexer
        match constant_value(&tok.text) {
            Some(value) => Node { kind: NodeKind::Integer { text: tok.text.clone(), value }, ty: ValueType::Integer, pos: tok.pos.clone() },
            None => Node::placeholder(tok.pos.clone()),
        }
    }

    pub fn variable(tok: &Token, env: &Environment, log: &mut DiagnosticLog) -> Self {
        let ty = match env.lookup(&tok.text) {
            Some(binding) => binding.ty,
            None => {
                log.push(DiagnosticKind::UndefinedVariable { name: tok.text.clone() }, tok.pos.clone());
                ValueType::Undefined
            }
        };
        Node { kind: NodeKind::Variable { name: tok.text.clone() }, ty, pos: tok.pos.clone() }
    }

    pub fn unary(op: &Token, operand: Node, log: &mut DiagnosticLog) -> Self {
        let ty = if !operand.is_defined() {
            ValueType::Undefined
        } else if let Some(t) = unary_result(&op.text, operand.ty) {
            t
        } else {
            log.push(DiagnosticKind::UnaryTypeMismatch { op: op.text.clone(), operand: operand.ty }, op.pos.clone());
            ValueType::Undefined
        };
        Node { kind: NodeKind::Unary { op: op.text.clone(), operand: Box::new(operand) }, ty, pos: op.pos.clone() }
    }

    pub fn binary(op: &Token, left: Node, right: Node, log: &mut DiagnosticLog) -> Self {
        let ty = if !left.is_defined() || !right.is_defined() {
            ValueType::Undefined
        } else if let Some(t) = binary_result(left.ty, &op.text, right.ty) {
            t
        } else {
            log.push(DiagnosticKind::BinaryTypeMismatch { op: op.text.clone(), left: left.ty, right: right.ty }, op.pos.clone());
            ValueType::Undefined
        };
        Node { kind: NodeKind::Binary { op: op.text.clone(), left: Box::new(left), right: Box::new(right) }, ty, pos: op.pos.clone() }
    }

    pub fn block(stmts: Vec<Node>, pos: Position) -> Self { Node { kind: NodeKind::Block { stmts }, ty: ValueType::Void, pos } }

    pub fn conditional(cond: Node, then_block: Node, else_branch: Option<Node>, pos: Position, log: &mut DiagnosticLog) -> Self {
        if cond.is_defined() && cond.ty != ValueType::Boolean {
            log.push(DiagnosticKind::ConditionNotBoolean { found: cond.ty }, cond.pos.clone());
        }
        let ty = if cond.ty == ValueType::Boolean { ValueType::Void } else { ValueType::Undefined };
        let kind = NodeKind::Conditional { cond: Box::new(cond), then_block: Box::new(then_block), else_branch: else_branch.map(Box::new) };
        Node { kind, ty, pos }
    }

    pub fn call(name: &Token, args: Vec<Node>, env: &Environment, log: &mut DiagnosticLog) -> Self {
        let ty = match env.function(&name.text) {
            None => {
                log.push(DiagnosticKind::UnknownFunction { name: name.text.clone() }, name.pos.clone());
                ValueType::Undefined
            }
            Some(sig) if sig.arity != args.len() => {
                log.push(DiagnosticKind::ArityMismatch { name: name.text.clone(), expected: sig.arity, found: args.len() }, name.pos.clone());
                ValueType::Undefined
            }
            Some(_) if args.iter().any(|a| !a.is_defined()) => ValueType::Undefined,
            Some(sig) => sig.result,
        };
        Node { kind: NodeKind::Call { name: name.text.clone(), args }, ty, pos: name.pos.clone() }
    }

    pub fn binding(name: &Token, declared: Option<ValueType>, expr: Node, body: Vec<Node>) -> Self {
        let kind = NodeKind::Binding { name: name.text.clone(), declared, expr: Box::new(expr), body };
        Node { kind, ty: ValueType::Void, pos: name.pos.clone() }
    }
}

/// Checks a bound expression against its annotation and registers the name in
/// the innermost scope. On a mismatch the inferred type is what gets registered,
/// so uses of the name further down do not repeat the error.
pub fn register_binding(env: &mut Environment, log: &mut DiagnosticLog, name: &Token, declared: Option<ValueType>, inferred: ValueType) {
    if let Some(expected) = declared {
        if inferred.is_defined() && inferred != expected {
            log.push(DiagnosticKind::BindingTypeMismatch { expected, found: inferred }, name.pos.clone());
        }
    }
    if env.bind(&name.text, inferred).is_err() {
        log.push(DiagnosticKind::DuplicateBinding { name: name.text.clone() }, name.pos.clone());
    }
}
