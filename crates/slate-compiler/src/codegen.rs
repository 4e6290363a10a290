//! Code generation: walk the typed tree and lower it to x86-64 assembly text.
//!
//! Every expression leaves its tagged result in `rax`. Binary operators park
//! their right operand in the frame slot numbered by the current frame offset
//! and evaluate the left operand one slot higher, so temporaries and bindings
//! never overlap. Bindings are placed into the code generator's own
//! `Environment` only after their expression has been emitted.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::asm::{encode_boolean, encode_integer, render, slot_bytes, Cond, Instr, Operand, Reg, ARG_REGS, TRUE_BITS, FALSE_BITS};
use crate::ast::{Node, NodeKind, Program};
use crate::config::CompileOptions;
use crate::env::Environment;
use crate::types::{is_relational, ValueType};

const RAX: Operand = Operand::Reg(Reg::Rax);

/// What `rax` holds after something without a value: a void call or an empty
/// program. Integer zero, so the result always decodes.
const VOID_VALUE: i64 = 0;

/// One unit of pending work for `CodeGenerator::emit`. Nodes are visited off
/// an explicit stack so deep trees do not recurse.
enum Step<'n> {
    Visit(&'n Node, usize),
    Emit(Instr),
    Store(usize),
    Bind(&'n str, usize, ValueType),
    Enter,
    Leave,
}

/// State of one emission run. Labels are numbered per run, so generating the
/// same program twice produces identical text.
pub struct CodeGenerator<'o> {
    options: &'o CompileOptions,
    env: Environment,
    labels: usize,
    // number of frame slots touched so far
    slots: usize,
    externs: BTreeSet<String>,
}

impl<'o> CodeGenerator<'o> {
    pub fn new(options: &'o CompileOptions) -> Self {
        Self { options, env: Environment::new(), labels: 0, slots: 0, externs: BTreeSet::new() }
    }

    fn next_label(&mut self) -> usize {
        let n = self.labels;
        self.labels += 1;
        trace!(label = n, "allocated label");
        n
    }

    fn store(&mut self, slot: usize) -> Instr {
        self.slots = self.slots.max(slot + 1);
        Instr::Mov(Operand::Slot(slot), RAX)
    }

    /// Lowers `node`, using frame slots from `frame` upward for anything it
    /// needs to keep. Subtrees whose type is undefined produce nothing.
    pub fn emit(&mut self, node: &Node, frame: usize) -> Vec<Instr> {
        let mut out = Vec::new();
        let mut work = vec![Step::Visit(node, frame)];
        while let Some(step) = work.pop() {
            match step {
                Step::Visit(node, frame) => {
                    let steps = self.visit(node, frame);
                    work.extend(steps.into_iter().rev());
                }
                Step::Emit(instr) => out.push(instr),
                Step::Store(slot) => out.push(self.store(slot)),
                // registered after the expression: it cannot see its own name
                Step::Bind(name, slot, ty) => {
                    let _ = self.env.bind_at(name, slot, ty);
                }
                Step::Enter => self.env.push_scope(),
                Step::Leave => self.env.pop_scope(),
            }
        }
        out
    }

    /// The steps that lower one node, in execution order.
    fn visit<'n>(&mut self, node: &'n Node, frame: usize) -> Vec<Step<'n>> {
        if !node.is_defined() { return Vec::new(); }
        let mut steps = Vec::new();
        match &node.kind {
            NodeKind::Boolean { value, .. } => steps.push(Step::Emit(Instr::Mov(RAX, Operand::Bits(encode_boolean(*value))))),
            NodeKind::Integer { value, .. } => steps.push(Step::Emit(Instr::Mov(RAX, Operand::Imm(encode_integer(*value))))),
            NodeKind::Variable { name } => {
                if let Some(binding) = self.env.lookup(name) { steps.push(Step::Emit(Instr::Mov(RAX, Operand::Slot(binding.offset)))); }
            }
            NodeKind::Unary { op, operand } => {
                steps.push(Step::Visit(operand, frame));
                match op.as_str() {
                    "-" => steps.push(Step::Emit(Instr::Neg(Reg::Rax))),
                    // FALSE_BITS and TRUE_BITS differ only in the sign bit
                    "!" => steps.push(Step::Emit(Instr::Btc(Reg::Rax, 63))),
                    _ => {}
                }
            }
            NodeKind::Binary { op, left, right } => {
                steps.extend([Step::Visit(right, frame), Step::Store(frame), Step::Visit(left, frame + 1)]);
                steps.extend(combine(op, Operand::Slot(frame)).into_iter().map(Step::Emit));
            }
            NodeKind::Binding { name, expr, body, .. } => {
                steps.extend([Step::Visit(expr, frame + 1), Step::Store(frame), Step::Bind(name, frame, expr.ty)]);
                steps.extend(body.iter().map(|stmt| Step::Visit(stmt, frame + 1)));
            }
            NodeKind::Block { stmts } => {
                steps.push(Step::Enter);
                steps.extend(stmts.iter().map(|stmt| Step::Visit(stmt, frame)));
                steps.push(Step::Leave);
            }
            NodeKind::Conditional { cond, then_block, else_branch } => {
                let n = self.next_label();
                let (else_label, end_label) = (format!("else_{n}"), format!("end_{n}"));
                steps.extend([
                    Step::Visit(cond, frame),
                    Step::Emit(Instr::Mov(Operand::Reg(Reg::Rcx), Operand::Bits(TRUE_BITS))),
                    Step::Emit(Instr::Cmp(Reg::Rax, Operand::Reg(Reg::Rcx))),
                    Step::Emit(Instr::Jne(else_label.clone())),
                    Step::Visit(then_block, frame),
                    Step::Emit(Instr::Jmp(end_label.clone())),
                    Step::Emit(Instr::Label(else_label)),
                ]);
                if let Some(else_branch) = else_branch { steps.push(Step::Visit(else_branch, frame)); }
                steps.push(Step::Emit(Instr::Label(end_label)));
            }
            NodeKind::Call { name, args } => {
                // arguments are evaluated last to first into their own slots,
                // then loaded into the argument registers together
                let count = args.len().min(ARG_REGS.len());
                for (i, arg) in args.iter().enumerate().take(count).rev() {
                    steps.extend([Step::Visit(arg, frame + count), Step::Store(frame + i)]);
                }
                for (i, reg) in ARG_REGS.iter().enumerate().take(count) {
                    steps.push(Step::Emit(Instr::Mov(Operand::Reg(*reg), Operand::Slot(frame + i))));
                }
                steps.push(Step::Emit(Instr::Call(name.clone())));
                if node.ty == ValueType::Void { steps.push(Step::Emit(Instr::Mov(RAX, Operand::Imm(VOID_VALUE)))); }
                self.externs.insert(name.clone());
            }
            NodeKind::Placeholder => {}
        }
        steps
    }

    /// Frame size in bytes, rounded up so calls see an aligned stack.
    fn frame_bytes(&self) -> usize {
        if self.slots == 0 { 0 } else { slot_bytes(self.slots - 1).div_ceil(16) * 16 }
    }

    /// Emits the whole program inside the entry symbol.
    pub fn generate(mut self, program: &Program) -> String {
        let mut body = Vec::new();
        for stmt in &program.stmts { body.extend(self.emit(stmt, 0)); }
        if body.is_empty() { body.push(Instr::Mov(RAX, Operand::Imm(VOID_VALUE))); }

        let entry = &self.options.entry_symbol;
        let mut text = String::new();
        for name in &self.externs { text.push_str(&format!("extern {name}\n")); }
        if !self.externs.is_empty() { text.push('\n'); }
        text.push_str("section .text\n");
        text.push_str(&format!("  global {entry}\n"));
        text.push_str(&format!("{entry}:\n"));

        let mut prologue = vec![Instr::Push(Reg::Rbp), Instr::Mov(Operand::Reg(Reg::Rbp), Operand::Reg(Reg::Rsp))];
        let frame = self.frame_bytes();
        if frame > 0 { prologue.push(Instr::Sub(Reg::Rsp, Operand::Imm(frame as i64))); }
        let epilogue = [Instr::Mov(Operand::Reg(Reg::Rsp), Operand::Reg(Reg::Rbp)), Instr::Pop(Reg::Rbp), Instr::Ret];

        text.push_str(&render(&prologue));
        text.push_str(&render(&body));
        text.push_str(&render(&epilogue));
        debug!(entry = %entry, instructions = body.len(), frame_bytes = frame, labels = self.labels, "generated assembly");
        text
    }
}

/// Combines `rax` (left) with the parked right operand.
fn combine(op: &str, right: Operand) -> Vec<Instr> {
    match op {
        "+" => vec![Instr::Add(Reg::Rax, right)],
        "-" => vec![Instr::Sub(Reg::Rax, right)],
        // (2a * 2b) >> 1 == 2ab
        "*" => vec![Instr::Imul(Reg::Rax, right), Instr::Sar(Reg::Rax, 1)],
        // 2a / 2b == a / b, re-tagged
        "/" => vec![Instr::Cqo, Instr::Idiv(right), Instr::Shl(Reg::Rax, 1)],
        _ if is_relational(op) => match Cond::for_relational(op) {
            Some(cond) => vec![
                Instr::Cmp(Reg::Rax, right),
                Instr::Mov(RAX, Operand::Bits(FALSE_BITS)),
                Instr::Mov(Operand::Reg(Reg::Rcx), Operand::Bits(TRUE_BITS)),
                Instr::Cmov(cond, Reg::Rax, Reg::Rcx),
            ],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Generates the assembly artifact for an already-checked program.
pub fn generate(program: &Program, options: &CompileOptions) -> String { CodeGenerator::new(options).generate(program) }
