//! Lexical scopes mapping names to stack slots, plus the table of callable functions.

use std::collections::HashMap;

use crate::types::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub offset: usize,
    pub ty: ValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSig {
    pub arity: usize,
    pub result: ValueType,
}

/// Functions provided by the runtime and linked in by name.
pub const INTRINSICS: &[(&str, FunctionSig)] = &[("print", FunctionSig { arity: 1, result: ValueType::Void })];

#[derive(Debug, Clone, Default)]
struct Scope {
    // first slot handed out in this scope
    base: usize,
    entries: Vec<(String, Binding)>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<Binding> { self.entries.iter().find(|(n, _)| n == name).map(|(_, b)| *b) }

    fn next_offset(&self) -> usize { self.entries.iter().map(|(_, b)| b.offset + 1).max().unwrap_or(self.base).max(self.base) }
}

#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
    functions: HashMap<String, FunctionSig>,
}

impl Default for Environment {
    fn default() -> Self { Self::new() }
}

impl Environment {
    pub fn new() -> Self {
        let mut this = Self { scopes: vec![Scope::default()], functions: HashMap::new() };
        this.install_intrinsics();
        this
    }

    fn install_intrinsics(&mut self) {
        for (name, sig) in INTRINSICS { self.functions.insert((*name).to_string(), *sig); }
    }

    pub fn push_scope(&mut self) {
        let base = self.next_offset();
        self.scopes.push(Scope { base, entries: Vec::new() });
    }

    /// The outermost scope is never popped.
    pub fn pop_scope(&mut self) { if self.scopes.len() > 1 { self.scopes.pop(); } }

    pub fn next_offset(&self) -> usize { self.scopes.last().map(Scope::next_offset).unwrap_or(0) }

    /// Binds `name` at the next free offset. A name already bound in the innermost
    /// scope is left untouched and its existing binding is returned as the error.
    pub fn bind(&mut self, name: &str, ty: ValueType) -> Result<Binding, Binding> {
        let offset = self.next_offset();
        self.bind_at(name, offset, ty)
    }

    pub fn bind_at(&mut self, name: &str, offset: usize, ty: ValueType) -> Result<Binding, Binding> {
        let scope = self.innermost();
        if let Some(existing) = scope.get(name) { return Err(existing); }
        let binding = Binding { offset, ty };
        scope.entries.push((name.to_string(), binding));
        Ok(binding)
    }

    fn innermost(&mut self) -> &mut Scope {
        if self.scopes.is_empty() { self.scopes.push(Scope::default()); }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn lookup(&self, name: &str) -> Option<Binding> { self.scopes.iter().rev().find_map(|s| s.get(name)) }

    pub fn function(&self, name: &str) -> Option<FunctionSig> { self.functions.get(name).copied() }

    pub fn is_function(&self, name: &str) -> bool { self.functions.contains_key(name) }
}
