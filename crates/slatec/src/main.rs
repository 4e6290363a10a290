use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slate_compiler::{CompileFailure, CompileOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slatec")]
#[command(about = "Slate compiler: source text to x86-64 NASM assembly")]
struct Cli {
    /// Log compiler stages (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the token stream of a source file
    Tokens { file: PathBuf },
    /// Parse a source file and print each top-level statement as an s-expression
    Parse { file: PathBuf },
    /// Compile a source file to assembly
    Build {
        file: PathBuf,
        /// Output path (defaults to <file>.asm)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Name of the generated entry symbol
        #[arg(long, default_value = slate_compiler::config::DEFAULT_ENTRY_SYMBOL)]
        entry: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn read_source(file: &Path) -> Result<(String, CompileOptions)> {
    let src = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let options = CompileOptions::new().with_source_name(file.display().to_string());
    Ok((src, options))
}

fn report(failure: &CompileFailure) -> ExitCode {
    eprint!("{}", failure.report());
    ExitCode::FAILURE
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Tokens { file } => {
            let (src, options) = read_source(&file)?;
            match slate_compiler::tokenize(&src, &options) {
                Ok(tokens) => {
                    for tok in tokens {
                        println!("{} {:<9} {}", tok.pos, tok.kind.name(), tok.describe());
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => Ok(report(&failure)),
            }
        }
        Command::Parse { file } => {
            let (src, options) = read_source(&file)?;
            match slate_compiler::parse(&src, &options) {
                Ok(program) => {
                    for stmt in &program.stmts {
                        println!("{} : {}", stmt.sexpr(), stmt.ty);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => Ok(report(&failure)),
            }
        }
        Command::Build { file, output, entry } => {
            let (src, options) = read_source(&file)?;
            let options = options.with_entry_symbol(entry);
            match slate_compiler::compile(&src, &options) {
                Ok(asm) => {
                    let out = output.unwrap_or_else(|| file.with_extension("asm"));
                    fs::write(&out, asm).with_context(|| format!("failed to write {}", out.display()))?;
                    info!(output = %out.display(), "wrote assembly");
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => Ok(report(&failure)),
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli.command)
}
