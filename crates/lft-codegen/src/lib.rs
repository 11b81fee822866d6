//! LLVM IR lowering for the lft language.
//!
//! This crate walks an lft AST (see `lft_common::ast`) and produces an LLVM
//! module with one function per declaration plus a top-level `main` holding
//! the root statements. The module can be written out as textual IR or run
//! in-process through LLVM's JIT.
//!
//! ## Architecture
//!
//! - [`codegen`]: the lowering context and per-node lowering rules
//! - [`jit`]: in-process execution of a lowered module
//! - [`error`]: lowering and execution failures
//!
//! ## Pipeline
//!
//! ```text
//! AST -> CodeGen -> verified LLVM module -> .ll file | JIT
//! ```

pub mod codegen;
pub mod error;
pub mod jit;

use std::path::Path;

use inkwell::context::Context;
use lft_common::Block;

pub use codegen::scope::ScopeLookup;
pub use codegen::{CodeGen, LowerOptions};
pub use error::{Error, JitError, LowerError};

/// Result of compiling and running a program in-process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Textual IR of the module that was run.
    pub ir: String,
    /// Value returned by the generated `main`.
    pub exit_value: i32,
}

/// Lower a root block and return the module as LLVM IR text.
///
/// # Errors
///
/// Returns the first [`LowerError`] raised while lowering or verifying.
pub fn generate_code(root: &Block, options: &LowerOptions) -> Result<String, LowerError> {
    let context = Context::create();
    let mut codegen = CodeGen::new(&context, options.clone());
    codegen.compile(root)?;
    Ok(codegen.get_llvm_ir())
}

/// Lower a root block and write the module as LLVM IR text to `output`.
///
/// Nothing is written when lowering fails.
pub fn compile_to_llvm_ir(
    root: &Block,
    output: &Path,
    options: &LowerOptions,
) -> Result<(), Error> {
    let context = Context::create();
    let mut codegen = CodeGen::new(&context, options.clone());
    codegen.compile(root)?;

    codegen
        .emit_llvm_ir(output)
        .map_err(|message| Error::Emit {
            path: output.display().to_string(),
            message,
        })
}

/// Lower a root block and execute its `main` through the JIT.
pub fn compile_and_run(root: &Block, options: &LowerOptions) -> Result<RunOutput, Error> {
    let context = Context::create();
    let mut codegen = CodeGen::new(&context, options.clone());
    codegen.compile(root)?;

    let ir = codegen.get_llvm_ir();
    let exit_value = jit::run(codegen.module())?;
    Ok(RunOutput { ir, exit_value })
}
