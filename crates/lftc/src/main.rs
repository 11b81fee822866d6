//! The lft compiler driver.
//!
//! Reads a JSON-serialized AST (the parser's output), lowers it to LLVM IR,
//! and writes the module to a `.ll` file.
//!
//! Options:
//! - `[INPUT]` - AST file; standard input when omitted
//! - `--output` - Path of the IR file (default `out.ll`)
//! - `--run` - Execute the program through the JIT after writing the IR
//! - `--flat-scopes` - Resolve names in the active scope frame only
//! - `--target` - Target triple stamped on the module (not with `--run`)
//! - `--json` - Report errors as JSON (one object per line)
//! - `--verbose` - Log lowering steps to stderr

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use lft_codegen::{LowerOptions, ScopeLookup};
use lft_common::Block;

#[derive(Parser)]
#[command(name = "lftc", version, about = "The lft compiler")]
struct Cli {
    /// JSON AST to compile; reads standard input when omitted
    input: Option<PathBuf>,

    /// Output path for the LLVM IR
    #[arg(short, long, default_value = "out.ll")]
    output: PathBuf,

    /// Run the program's `main` through the JIT and print its result
    #[arg(long)]
    run: bool,

    /// Resolve identifiers in the active scope frame only
    #[arg(long = "flat-scopes")]
    flat_scopes: bool,

    /// Target triple for the module (e.g., x86_64-unknown-linux-gnu)
    #[arg(long, conflicts_with = "run")]
    target: Option<String>,

    /// Output errors as JSON (one object per line) instead of human-readable format
    #[arg(long)]
    json: bool,

    /// Log lowering steps (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

/// A driver failure and the stage that produced it.
#[derive(Debug)]
struct Failure {
    stage: &'static str,
    message: String,
}

impl Failure {
    fn new(stage: &'static str, message: impl ToString) -> Self {
        Failure {
            stage,
            message: message.to_string(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = compile(&cli) {
        if cli.json {
            let msg = serde_json::json!({
                "severity": "error",
                "stage": e.stage,
                "message": e.message,
                "file": cli.input.as_ref().map(|p| p.display().to_string()),
            });
            eprintln!("{}", msg);
        } else {
            eprintln!("error: {}", e.message);
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Execute the pipeline: read AST -> lower -> write IR -> optionally run.
fn compile(cli: &Cli) -> Result<(), Failure> {
    let source = read_input(cli.input.as_deref())?;

    // A tree that does not parse never reaches the lowering engine.
    let root: Block = serde_json::from_str(&source)
        .map_err(|e| Failure::new("parse", format!("failed to parse AST: {}", e)))?;

    let options = LowerOptions {
        scope_lookup: if cli.flat_scopes {
            ScopeLookup::Flat
        } else {
            ScopeLookup::Lexical
        },
        target_triple: cli.target.clone(),
        ..LowerOptions::default()
    };

    if cli.run {
        let out = lft_codegen::compile_and_run(&root, &options)
            .map_err(|e| Failure::new(stage_of(&e), e))?;
        write_ir(&cli.output, &out.ir)?;
        println!("=> {}", out.exit_value);
    } else {
        lft_codegen::compile_to_llvm_ir(&root, &cli.output, &options)
            .map_err(|e| Failure::new(stage_of(&e), e))?;
    }

    tracing::debug!(output = %cli.output.display(), "wrote LLVM IR");
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, Failure> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            Failure::new("read", format!("failed to read '{}': {}", path.display(), e))
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| Failure::new("read", format!("failed to read stdin: {}", e)))?;
            Ok(buf)
        }
    }
}

fn write_ir(path: &Path, ir: &str) -> Result<(), Failure> {
    std::fs::write(path, ir).map_err(|e| {
        Failure::new("emit", format!("failed to write '{}': {}", path.display(), e))
    })
}

fn stage_of(err: &lft_codegen::Error) -> &'static str {
    match err {
        lft_codegen::Error::Lower(_) => "lower",
        lft_codegen::Error::Jit(_) => "run",
        lft_codegen::Error::Emit { .. } => "emit",
    }
}
