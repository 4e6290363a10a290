use crate::config::CompileOptions;
use crate::env::Environment;
use crate::error::DiagnosticLog;

/// Everything one compilation mutates while parsing: the scope stack and the
/// diagnostic log. Each call to `compile` builds a fresh one, so nothing leaks
/// between runs.
#[derive(Debug)]
pub struct CompilationContext {
    pub options: CompileOptions,
    pub env: Environment,
    pub log: DiagnosticLog,
}

impl CompilationContext {
    pub fn new(options: CompileOptions) -> Self { Self { options, env: Environment::new(), log: DiagnosticLog::new() } }
}

impl Default for CompilationContext {
    fn default() -> Self { Self::new(CompileOptions::default()) }
}
