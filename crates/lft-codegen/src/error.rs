//! Error types for lowering and execution.
//!
//! Every lowering rule reports through [`LowerError`] and the pass stops at
//! the first one. The node that observes a condition is the one that raises
//! it; nothing is retried.

use std::fmt::Display;

use lft_common::BinOp;

/// A failure observed while lowering the AST to LLVM IR.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LowerError {
    /// An expression reads a name with no binding in scope.
    #[error("undeclared variable `{name}`")]
    UndeclaredIdentifier { name: String },

    /// An assignment targets a name with no binding in scope.
    #[error("assignment to undeclared variable `{name}`")]
    UndeclaredAssignmentTarget { name: String },

    /// A call names a function that is not (yet) in the module.
    #[error("no such function `{name}`")]
    UnresolvedCallee { name: String },

    /// A declaration or signature names a type other than `int`/`double`
    /// (or `void`, for return types).
    #[error("unsupported type `{type_name}` for `{name}`")]
    UnsupportedDeclarationType { type_name: String, name: String },

    #[error("`{callee}` expects {expected} argument(s), found {found}")]
    ArgumentCountMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    /// A value whose type differs from the slot it is stored into.
    #[error("cannot store a `{found}` value in `{name}` of type `{expected}`")]
    IncompatibleAssignment {
        name: String,
        expected: String,
        found: String,
    },

    /// A function name that already exists in the module, including `main`
    /// and the runtime symbols.
    #[error("function `{name}` is already defined")]
    DuplicateFunction { name: String },

    /// A call to a `void` function appears where a value is needed.
    #[error("`{name}` does not produce a value")]
    ValuelessOperand { name: String },

    #[error("operands of `{op}` must both be int or both be double")]
    MismatchedOperands { op: BinOp },

    #[error("function `{function}` can reach its end without returning a value")]
    MissingReturn { function: String },

    #[error("LLVM module verification failed: {message}")]
    InvalidModule { message: String },

    #[error("LLVM builder error: {message}")]
    Backend { message: String },
}

impl LowerError {
    pub(crate) fn backend(err: impl Display) -> Self {
        LowerError::Backend {
            message: err.to_string(),
        }
    }
}

/// A failure in the JIT execution step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JitError {
    #[error("failed to initialize native target: {0}")]
    TargetInit(String),

    #[error("failed to create JIT engine: {0}")]
    Engine(String),

    /// The module was built for a triple other than the host's.
    #[error("cannot run a module built for `{triple}` on host `{host}`")]
    ForeignTarget { triple: String, host: String },

    #[error("failed to find JIT function `{name}`: {message}")]
    MissingEntry { name: String, message: String },
}

/// Any failure of the compile (and optionally run) pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lower(#[from] LowerError),

    #[error(transparent)]
    Jit(#[from] JitError),

    #[error("failed to write `{path}`: {message}")]
    Emit { path: String, message: String },
}
