//! Options shared by every stage of a compilation run.

use std::sync::Arc;

/// How the lexer treats `\n` / `\r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlineMode {
    /// Emit a `Newline` token that separates statements.
    #[default]
    Emit,
    /// Drop line breaks entirely (expression-only input).
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub source_name: Arc<str>,
    pub entry_symbol: String,
    pub newline_mode: NewlineMode,
}

pub const DEFAULT_SOURCE_NAME: &str = "<input>";
pub const DEFAULT_ENTRY_SYMBOL: &str = "slate_main";

impl Default for CompileOptions {
    fn default() -> Self {
        Self { source_name: Arc::from(DEFAULT_SOURCE_NAME), entry_symbol: DEFAULT_ENTRY_SYMBOL.to_string(), newline_mode: NewlineMode::Emit }
    }
}

impl CompileOptions {
    pub fn new() -> Self { Self::default() }

    pub fn with_source_name(mut self, name: impl AsRef<str>) -> Self {
        self.source_name = Arc::from(name.as_ref());
        self
    }

    pub fn with_entry_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.entry_symbol = symbol.into();
        self
    }

    pub fn with_newline_mode(mut self, mode: NewlineMode) -> Self {
        self.newline_mode = mode;
        self
    }
}
