//! LLVM IR generation from the AST.
//!
//! ## Architecture
//!
//! - [`CodeGen`]: the lowering context. Owns the LLVM module and builder, the
//!   scope stack and the parameter table of the function being lowered.
//! - [`scope`]: scope frames and lookup rules
//! - [`types`]: type-name to LLVM type mapping
//! - [`intrinsics`]: external runtime declarations
//! - [`expr`]: expression lowering
//! - [`stmt`]: statement, control-flow and function lowering
//! - [`print`]: print-call lowering and format-string interning

pub mod expr;
pub mod intrinsics;
pub mod print;
pub mod scope;
pub mod stmt;
pub mod types;

use std::ops::{Deref, DerefMut};
use std::path::Path;

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::targets::TargetTriple;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{FunctionValue, PointerValue};
use lft_common::Block;
use rustc_hash::FxHashMap;

use crate::error::LowerError;

use self::scope::{FrameKind, ScopeLookup, ScopeStack};

/// Name of the generated top-level entry function.
pub const ENTRY_FUNCTION: &str = "main";

/// Knobs for a single lowering pass.
#[derive(Debug, Clone)]
pub struct LowerOptions {
    /// Name given to the LLVM module.
    pub module_name: String,
    /// Identifier lookup discipline.
    pub scope_lookup: ScopeLookup,
    /// Target triple stamped on the module; `None` leaves it unset.
    pub target_triple: Option<String>,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            module_name: "lft_module".to_string(),
            scope_lookup: ScopeLookup::default(),
            target_triple: None,
        }
    }
}

/// A storage slot: the alloca and the type stored in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot<'ctx> {
    pub ptr: PointerValue<'ctx>,
    pub ty: BasicTypeEnum<'ctx>,
}

// ── CodeGen ──────────────────────────────────────────────────────────

/// The lowering context.
///
/// Created once per compilation and consumed by it. Not meant to be shared
/// between compilations.
pub struct CodeGen<'ctx> {
    /// The LLVM context (lifetime anchor for all LLVM values).
    pub(crate) context: &'ctx Context,
    /// The LLVM module being built.
    pub(crate) module: Module<'ctx>,
    /// The LLVM IR builder. Its insertion block is the active basic block.
    pub(crate) builder: Builder<'ctx>,
    pub(crate) options: LowerOptions,

    /// Declared variables, one frame per function body or branch arm.
    pub(crate) scopes: ScopeStack<Slot<'ctx>>,
    /// Parameters of the function being lowered. Consulted before any frame.
    pub(crate) params: FxHashMap<String, Slot<'ctx>>,
    /// The function whose body is being lowered.
    pub(crate) current_fn: Option<FunctionValue<'ctx>>,
    /// The top-level entry function, once created.
    pub(crate) entry_fn: Option<FunctionValue<'ctx>>,

    /// Counter behind interned format-string names.
    pub(crate) format_strings: usize,
}

impl<'ctx> CodeGen<'ctx> {
    pub fn new(context: &'ctx Context, options: LowerOptions) -> Self {
        let module = context.create_module(&options.module_name);
        if let Some(triple) = &options.target_triple {
            module.set_triple(&TargetTriple::create(triple));
        }
        let builder = context.create_builder();

        CodeGen {
            context,
            module,
            builder,
            options,
            scopes: ScopeStack::default(),
            params: FxHashMap::default(),
            current_fn: None,
            entry_fn: None,
            format_strings: 0,
        }
    }

    /// Lower a root statement block into the module.
    ///
    /// 1. Creates the top-level `main` entry and its entry block
    /// 2. Declares runtime intrinsics
    /// 3. Lowers the root block inside the entry scope
    /// 4. Terminates `main` with `ret i32 0` if the block fell through
    /// 5. Verifies the module
    pub fn compile(&mut self, root: &Block) -> Result<(), LowerError> {
        tracing::debug!("generating code");

        let main_ty = self.context.i32_type().fn_type(&[], false);
        let main_fn = self
            .module
            .add_function(ENTRY_FUNCTION, main_ty, Some(Linkage::External));
        let entry = self.context.append_basic_block(main_fn, "entry");
        self.builder.position_at_end(entry);
        self.current_fn = Some(main_fn);
        self.entry_fn = Some(main_fn);

        intrinsics::declare_intrinsics(&self.module);

        {
            let mut scope = self.enter_scope(FrameKind::Function);
            scope.lower_block(root)?;
            scope.finish_entry()?;
        }

        self.module
            .verify()
            .map_err(|e| LowerError::InvalidModule {
                message: e.to_string(),
            })?;

        tracing::debug!("code is generated");
        Ok(())
    }

    /// Emit the module as human-readable LLVM IR (.ll file).
    pub fn emit_llvm_ir(&self, path: &Path) -> Result<(), String> {
        self.module
            .print_to_file(path)
            .map_err(|e| format!("Failed to emit LLVM IR: {}", e))
    }

    /// Get the LLVM IR as a string.
    pub fn get_llvm_ir(&self) -> String {
        self.module.print_to_string().to_string()
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Consume the CodeGen and return the underlying LLVM module.
    pub fn into_module(self) -> Module<'ctx> {
        self.module
    }

    // ── Scopes and storage ───────────────────────────────────────────

    /// Push a frame; it is popped when the returned guard drops, on every
    /// exit path including `?`.
    pub(crate) fn enter_scope(&mut self, kind: FrameKind) -> ScopeGuard<'_, 'ctx> {
        self.scopes.push(kind);
        ScopeGuard { cg: self }
    }

    /// Allocate a storage slot for `name` in the active frame.
    pub(crate) fn declare(
        &mut self,
        name: &str,
        ty: BasicTypeEnum<'ctx>,
    ) -> Result<Slot<'ctx>, LowerError> {
        let ptr = self.build_entry_alloca(ty, name)?;
        let slot = Slot { ptr, ty };
        if self.scopes.declare(name, slot).is_some() {
            tracing::debug!(name, "redeclaration rebinds existing name");
        }
        Ok(slot)
    }

    /// Find the slot bound to `name`: parameters first, then frames.
    pub(crate) fn resolve(&self, name: &str) -> Option<Slot<'ctx>> {
        self.params
            .get(name)
            .copied()
            .or_else(|| self.scopes.lookup(name, self.options.scope_lookup))
    }

    // ── Helpers ──────────────────────────────────────────────────────

    pub(crate) fn current_function(&self) -> Result<FunctionValue<'ctx>, LowerError> {
        self.current_fn
            .ok_or_else(|| LowerError::backend("no current function during lowering"))
    }

    pub(crate) fn current_block(&self) -> Result<BasicBlock<'ctx>, LowerError> {
        self.builder
            .get_insert_block()
            .ok_or_else(|| LowerError::backend("no active basic block"))
    }

    /// True when the active block already ends in a terminator.
    pub(crate) fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|bb| bb.get_terminator().is_some())
    }

    /// Build an alloca in the current function's entry block.
    ///
    /// Keeps all slots together at the top of the function regardless of
    /// which arm declared them.
    pub(crate) fn build_entry_alloca(
        &self,
        ty: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>, LowerError> {
        let fn_val = self.current_function()?;
        let entry_bb = fn_val
            .get_first_basic_block()
            .ok_or_else(|| LowerError::backend("function has no entry block"))?;

        let current_bb = self.builder.get_insert_block();

        if let Some(first_inst) = entry_bb.get_first_instruction() {
            self.builder.position_before(&first_inst);
        } else {
            self.builder.position_at_end(entry_bb);
        }

        let alloca = self
            .builder
            .build_alloca(ty, name)
            .map_err(LowerError::backend)?;

        if let Some(bb) = current_bb {
            self.builder.position_at_end(bb);
        }

        Ok(alloca)
    }

    /// Terminate the top-level entry if its last block fell through.
    fn finish_entry(&mut self) -> Result<(), LowerError> {
        if self.block_terminated() {
            return Ok(());
        }
        if self.block_unreachable()? {
            self.builder
                .build_unreachable()
                .map_err(LowerError::backend)?;
            return Ok(());
        }
        let zero = self.context.i32_type().const_zero();
        self.builder
            .build_return(Some(&zero))
            .map_err(LowerError::backend)?;
        Ok(())
    }

    /// True when the active block is not the entry and nothing branches to it.
    pub(crate) fn block_unreachable(&self) -> Result<bool, LowerError> {
        let bb = self.current_block()?;
        let is_entry = bb
            .get_parent()
            .and_then(|f| f.get_first_basic_block())
            .is_some_and(|entry| entry == bb);
        Ok(!is_entry && bb.get_first_use().is_none())
    }
}

// ── Scope guard ──────────────────────────────────────────────────────

/// Exclusive access to the lowering context while a frame is active.
pub(crate) struct ScopeGuard<'a, 'ctx> {
    cg: &'a mut CodeGen<'ctx>,
}

impl<'ctx> Deref for ScopeGuard<'_, 'ctx> {
    type Target = CodeGen<'ctx>;

    fn deref(&self) -> &Self::Target {
        self.cg
    }
}

impl<'ctx> DerefMut for ScopeGuard<'_, 'ctx> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.cg
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.cg.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lft_common::{BinOp, Expr, Param, Stmt};

    fn compile(stmts: Vec<Stmt>) -> Result<String, LowerError> {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, LowerOptions::default());
        codegen.compile(&Block::new(stmts))?;
        Ok(codegen.get_llvm_ir())
    }

    #[test]
    fn test_empty_program_verifies() {
        let ir = compile(vec![]).unwrap();
        assert!(ir.contains("define i32 @main()"), "Should define main: {}", ir);
        assert!(ir.contains("ret i32 0"), "Should return 0: {}", ir);
    }

    #[test]
    fn test_runtime_symbols_declared() {
        let ir = compile(vec![]).unwrap();
        assert!(ir.contains("declare i32 @printf(ptr, ...)"), "{}", ir);
        assert!(ir.contains("declare void @putchar()"), "{}", ir);
    }

    #[test]
    fn test_target_triple_option() {
        let context = Context::create();
        let options = LowerOptions {
            target_triple: Some("x86_64-unknown-linux-gnu".to_string()),
            ..LowerOptions::default()
        };
        let mut codegen = CodeGen::new(&context, options);
        codegen.compile(&Block::default()).unwrap();
        assert!(codegen
            .get_llvm_ir()
            .contains("target triple = \"x86_64-unknown-linux-gnu\""));
    }

    #[test]
    fn test_scope_stack_balanced_after_success() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, LowerOptions::default());
        let root = Block::new(vec![
            Stmt::func(
                "int",
                "id",
                vec![Param::new("int", "v")],
                vec![Stmt::ret(Expr::ident("v"))],
            ),
            Stmt::decl("int", "x", Some(Expr::int(1))),
            Stmt::branch(
                Expr::binary(BinOp::Lt, Expr::ident("x"), Expr::int(2)),
                vec![Stmt::expr(Expr::assign("x", Expr::int(3)))],
                Some(vec![Stmt::expr(Expr::assign("x", Expr::int(4)))]),
            ),
        ]);
        codegen.compile(&root).unwrap();
        assert_eq!(codegen.scopes.depth(), 0);
    }

    #[test]
    fn test_scope_stack_balanced_after_error() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, LowerOptions::default());
        let root = Block::new(vec![Stmt::branch(
            Expr::int(1),
            vec![Stmt::func(
                "void",
                "f",
                vec![],
                vec![Stmt::expr(Expr::ident("missing"))],
            )],
            None,
        )]);
        let err = codegen.compile(&root).unwrap_err();
        assert_eq!(
            err,
            LowerError::UndeclaredIdentifier {
                name: "missing".into()
            }
        );
        assert_eq!(codegen.scopes.depth(), 0);
    }

    #[test]
    fn test_emit_llvm_ir() {
        let context = Context::create();
        let mut codegen = CodeGen::new(&context, LowerOptions::default());
        codegen.compile(&Block::default()).unwrap();

        let tmp = std::env::temp_dir().join("lft_codegen_test.ll");
        codegen.emit_llvm_ir(&tmp).unwrap();
        assert!(tmp.exists());
        std::fs::remove_file(&tmp).ok();
    }
}
