//! x86-64 instruction model (NASM / Intel syntax) and the tagged value encoding
//! shared with whatever runtime calls the emitted entry symbol.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    Rax,
    Rcx,
    Rdx,
    Rdi,
    Rsi,
    R8,
    R9,
    Rbp,
    Rsp,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::Rax => "rax",
            Reg::Rcx => "rcx",
            Reg::Rdx => "rdx",
            Reg::Rdi => "rdi",
            Reg::Rsi => "rsi",
            Reg::R8 => "r8",
            Reg::R9 => "r9",
            Reg::Rbp => "rbp",
            Reg::Rsp => "rsp",
        }
    }
}

/// System V integer argument registers, in order.
pub const ARG_REGS: [Reg; 6] = [Reg::Rdi, Reg::Rsi, Reg::Rdx, Reg::Rcx, Reg::R8, Reg::R9];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(i64),
    /// Raw 64-bit pattern, rendered in hex.
    Bits(u64),
    /// Frame slot `k`, i.e. `qword [rbp - 8*(k+1)]`.
    Slot(usize),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(r) => f.write_str(r.name()),
            Operand::Imm(v) => write!(f, "{v}"),
            Operand::Bits(b) => write!(f, "0x{b:016X}"),
            Operand::Slot(k) => write!(f, "qword [rbp - {}]", slot_bytes(*k)),
        }
    }
}

pub fn slot_bytes(slot: usize) -> usize { 8 * (slot + 1) }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    E,
    Ne,
    L,
    G,
    Le,
    Ge,
}

impl Cond {
    pub fn for_relational(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Cond::E),
            "!=" => Some(Cond::Ne),
            "<" => Some(Cond::L),
            ">" => Some(Cond::G),
            "<=" => Some(Cond::Le),
            ">=" => Some(Cond::Ge),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Cond::E => "e",
            Cond::Ne => "ne",
            Cond::L => "l",
            Cond::G => "g",
            Cond::Le => "le",
            Cond::Ge => "ge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    Mov(Operand, Operand),
    Add(Reg, Operand),
    Sub(Reg, Operand),
    Imul(Reg, Operand),
    Idiv(Operand),
    Cqo,
    Neg(Reg),
    Sar(Reg, u8),
    Shl(Reg, u8),
    // complement bit, used to flip between the two boolean sentinels
    Btc(Reg, u8),
    Cmp(Reg, Operand),
    Cmov(Cond, Reg, Reg),
    Push(Reg),
    Pop(Reg),
    Jmp(String),
    Jne(String),
    Call(String),
    Label(String),
    Ret,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instr::*;
        match self {
            Mov(dst, src) => write!(f, "  mov {dst}, {src}"),
            Add(r, src) => write!(f, "  add {}, {src}", r.name()),
            Sub(r, src) => write!(f, "  sub {}, {src}", r.name()),
            Imul(r, src) => write!(f, "  imul {}, {src}", r.name()),
            Idiv(src) => write!(f, "  idiv {src}"),
            Cqo => f.write_str("  cqo"),
            Neg(r) => write!(f, "  neg {}", r.name()),
            Sar(r, n) => write!(f, "  sar {}, {n}", r.name()),
            Shl(r, n) => write!(f, "  shl {}, {n}", r.name()),
            Btc(r, n) => write!(f, "  btc {}, {n}", r.name()),
            Cmp(r, src) => write!(f, "  cmp {}, {src}", r.name()),
            Cmov(c, dst, src) => write!(f, "  cmov{} {}, {}", c.suffix(), dst.name(), src.name()),
            Push(r) => write!(f, "  push {}", r.name()),
            Pop(r) => write!(f, "  pop {}", r.name()),
            Jmp(l) => write!(f, "  jmp {l}"),
            Jne(l) => write!(f, "  jne {l}"),
            Call(s) => write!(f, "  call {s}"),
            Label(l) => write!(f, "{l}:"),
            Ret => f.write_str("  ret"),
        }
    }
}

pub fn render(instrs: &[Instr]) -> String {
    let mut out = String::new();
    for i in instrs {
        out.push_str(&i.to_string());
        out.push('\n');
    }
    out
}

// Both sentinels are odd; every tagged integer is even.
pub const FALSE_BITS: u64 = 0x7FFF_FFFF_FFFF_FFFF;
pub const TRUE_BITS: u64 = 0xFFFF_FFFF_FFFF_FFFF;

pub fn encode_integer(value: i64) -> i64 { value << 1 }

pub fn encode_boolean(value: bool) -> u64 { if value { TRUE_BITS } else { FALSE_BITS } }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeValue {
    Integer(i64),
    Boolean(bool),
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Integer(v) => write!(f, "{v}"),
            RuntimeValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Decodes a value returned by the entry symbol. `None` for bit patterns the
/// compiler never produces.
pub fn decode_value(bits: u64) -> Option<RuntimeValue> {
    match bits {
        TRUE_BITS => Some(RuntimeValue::Boolean(true)),
        FALSE_BITS => Some(RuntimeValue::Boolean(false)),
        b if b & 1 == 0 => Some(RuntimeValue::Integer((b as i64) >> 1)),
        _ => None,
    }
}
