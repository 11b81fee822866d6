//! In-process execution of a lowered module.
//!
//! Hands the module to LLVM's JIT execution engine and calls the top-level
//! `main`. Runtime symbols such as `printf` resolve against the host
//! process, so print calls write to this process's standard output.

use inkwell::module::Module;
use inkwell::targets::{InitializationConfig, Target, TargetMachine};
use inkwell::OptimizationLevel;

use crate::codegen::ENTRY_FUNCTION;
use crate::error::JitError;

/// Execute `main` in `module` and return its `i32` result.
///
/// The module must come from a successful lowering, so that `main` exists
/// with the `i32 ()` signature.
///
/// A module stamped with a triple other than the host's is refused; an
/// unset triple runs as host code.
pub fn run(module: &Module<'_>) -> Result<i32, JitError> {
    let triple = module.get_triple();
    let triple = triple.as_str().to_string_lossy();
    let host = TargetMachine::get_default_triple();
    let host = host.as_str().to_string_lossy();
    if !triple.is_empty() && triple != host {
        return Err(JitError::ForeignTarget {
            triple: triple.into_owned(),
            host: host.into_owned(),
        });
    }

    Target::initialize_native(&InitializationConfig::default())
        .map_err(|e| JitError::TargetInit(e.to_string()))?;

    let ee = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|e| JitError::Engine(e.to_string()))?;

    // SAFETY: the lowering pass always emits `main` as `i32 ()`.
    let entry = unsafe { ee.get_function::<unsafe extern "C" fn() -> i32>(ENTRY_FUNCTION) }
        .map_err(|e| JitError::MissingEntry {
            name: ENTRY_FUNCTION.to_string(),
            message: e.to_string(),
        })?;

    tracing::debug!("running generated code");
    let result = unsafe { entry.call() };
    tracing::debug!(result, "code was run");
    Ok(result)
}
