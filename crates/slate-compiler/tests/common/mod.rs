#![allow(dead_code)]

use std::collections::HashMap;

use slate_compiler::{compile, decode_value, parse, CompileFailure, CompileOptions, DiagnosticKind, Program, RuntimeValue};

pub fn options() -> CompileOptions { CompileOptions::new().with_source_name("test.slate") }

pub fn check_ok(src: &str) -> Program {
    match parse(src, &options()) {
        Ok(p) => p,
        Err(e) => panic!("expected {src:?} to parse cleanly, got:\n{}", e.report()),
    }
}

pub fn check_err(src: &str) -> CompileFailure {
    match parse(src, &options()) {
        Ok(p) => panic!("expected diagnostics for {src:?}, parsed {} statement(s)", p.stmts.len()),
        Err(e) => e,
    }
}

pub fn kinds(src: &str) -> Vec<DiagnosticKind> { check_err(src).kinds().into_iter().cloned().collect() }

/// s-expression of the single statement in `src`.
pub fn tree(src: &str) -> String {
    let p = check_ok(src);
    assert_eq!(p.stmts.len(), 1, "expected one statement in {src:?}");
    p.stmts[0].sexpr()
}

pub fn compile_ok(src: &str) -> String {
    match compile(src, &options()) {
        Ok(asm) => asm,
        Err(e) => panic!("expected {src:?} to compile, got:\n{}", e.report()),
    }
}

pub struct Execution {
    pub bits: u64,
    /// Raw first argument of every `print` call.
    pub printed: Vec<u64>,
}

impl Execution {
    pub fn value(&self) -> RuntimeValue {
        match decode_value(self.bits) {
            Some(v) => v,
            None => panic!("returned bit pattern {:#x} is not a valid value", self.bits),
        }
    }
}

pub fn eval(src: &str) -> RuntimeValue { run(&compile_ok(src)).value() }

#[derive(Debug, Clone)]
enum Arg {
    Reg(String),
    Imm(i64),
    Mem(String, i64),
}

fn parse_arg(text: &str) -> Arg {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix("qword [").and_then(|s| s.strip_suffix(']')) {
        let (base, off) = inner.split_once(" - ").expect("only [reg - n] addressing is emitted");
        return Arg::Mem(base.to_string(), -off.parse::<i64>().expect("offset"));
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return Arg::Imm(u64::from_str_radix(hex, 16).expect("hex immediate") as i64);
    }
    match text.parse::<i64>() {
        Ok(v) => Arg::Imm(v),
        Err(_) => Arg::Reg(text.to_string()),
    }
}

/// Evaluator for the small x86-64 subset the code generator emits. Stops at
/// the first `ret` and returns `rax`.
#[derive(Default)]
struct Machine {
    regs: HashMap<String, i64>,
    mem: HashMap<i64, i64>,
    // operands of the last cmp
    flags: (i64, i64),
    printed: Vec<u64>,
}

impl Machine {
    fn reg(&self, name: &str) -> i64 { self.regs.get(name).copied().unwrap_or(0) }

    fn read(&self, arg: &Arg) -> i64 {
        match arg {
            Arg::Reg(r) => self.reg(r),
            Arg::Imm(v) => *v,
            Arg::Mem(base, off) => {
                let addr = self.reg(base) + off;
                *self.mem.get(&addr).unwrap_or_else(|| panic!("read of uninitialised slot {addr:#x}"))
            }
        }
    }

    fn write(&mut self, arg: &Arg, value: i64) {
        match arg {
            Arg::Reg(r) => { self.regs.insert(r.clone(), value); }
            Arg::Mem(base, off) => {
                let addr = self.reg(base) + off;
                self.mem.insert(addr, value);
            }
            Arg::Imm(_) => panic!("write to immediate"),
        }
    }

    fn cond(&self, cc: &str) -> bool {
        let (a, b) = self.flags;
        match cc {
            "e" => a == b,
            "ne" => a != b,
            "l" => a < b,
            "g" => a > b,
            "le" => a <= b,
            "ge" => a >= b,
            other => panic!("unknown condition {other}"),
        }
    }
}

pub fn run(asm: &str) -> Execution {
    let lines: Vec<&str> = asm.lines().map(str::trim).collect();
    let labels: HashMap<&str, usize> = lines.iter().enumerate().filter_map(|(i, l)| l.strip_suffix(':').map(|name| (name, i))).collect();

    let mut m = Machine::default();
    // as if a caller had just pushed its return address
    m.regs.insert("rsp".into(), 0x10000 - 8);
    let mut pc = 0;
    let mut steps = 0;
    while pc < lines.len() {
        steps += 1;
        assert!(steps < 100_000, "runaway program");
        let line = lines[pc];
        pc += 1;
        if line.is_empty() || line.ends_with(':') || line.starts_with("section") || line.starts_with("global") || line.starts_with("extern") {
            continue;
        }
        let (op, rest) = line.split_once(' ').unwrap_or((line, ""));
        let args: Vec<Arg> = if rest.is_empty() { Vec::new() } else { rest.split(", ").map(parse_arg).collect() };
        match op {
            "mov" => {
                let v = m.read(&args[1]);
                m.write(&args[0], v);
            }
            "add" => {
                let v = m.read(&args[0]).wrapping_add(m.read(&args[1]));
                m.write(&args[0], v);
            }
            "sub" => {
                let v = m.read(&args[0]).wrapping_sub(m.read(&args[1]));
                m.write(&args[0], v);
            }
            "imul" => {
                let v = m.read(&args[0]).wrapping_mul(m.read(&args[1]));
                m.write(&args[0], v);
            }
            "cqo" => {
                let sign = if m.reg("rax") < 0 { -1 } else { 0 };
                m.regs.insert("rdx".into(), sign);
            }
            "idiv" => {
                let (dividend, divisor) = (m.reg("rax"), m.read(&args[0]));
                assert_ne!(divisor, 0, "division by zero");
                m.regs.insert("rax".into(), dividend.wrapping_div(divisor));
                m.regs.insert("rdx".into(), dividend.wrapping_rem(divisor));
            }
            "neg" => {
                let v = m.read(&args[0]).wrapping_neg();
                m.write(&args[0], v);
            }
            "sar" => {
                let v = m.read(&args[0]) >> m.read(&args[1]);
                m.write(&args[0], v);
            }
            "shl" => {
                let v = m.read(&args[0]).wrapping_shl(m.read(&args[1]) as u32);
                m.write(&args[0], v);
            }
            "btc" => {
                let v = m.read(&args[0]) ^ (1i64 << m.read(&args[1]));
                m.write(&args[0], v);
            }
            "cmp" => m.flags = (m.read(&args[0]), m.read(&args[1])),
            "push" => {
                let rsp = m.reg("rsp") - 8;
                m.regs.insert("rsp".into(), rsp);
                let v = m.read(&args[0]);
                m.mem.insert(rsp, v);
            }
            "pop" => {
                let rsp = m.reg("rsp");
                let v = *m.mem.get(&rsp).expect("pop from empty stack");
                m.write(&args[0], v);
                m.regs.insert("rsp".into(), rsp + 8);
            }
            "jmp" | "jne" => {
                if op == "jmp" || m.cond("ne") {
                    let Arg::Reg(label) = &args[0] else { panic!("jump target") };
                    pc = labels[label.as_str()];
                }
            }
            "call" => {
                let Arg::Reg(callee) = &args[0] else { panic!("call target") };
                assert_eq!(callee, "print", "unexpected callee");
                assert_eq!(m.reg("rsp") % 16, 0, "stack misaligned at call");
                m.printed.push(m.reg("rdi") as u64);
            }
            "ret" => return Execution { bits: m.reg("rax") as u64, printed: m.printed },
            cc if cc.starts_with("cmov") => {
                if m.cond(&cc[4..]) {
                    let v = m.read(&args[1]);
                    m.write(&args[0], v);
                }
            }
            other => panic!("unsupported instruction {other:?} in line {line:?}"),
        }
    }
    panic!("program fell off the end without ret")
}
