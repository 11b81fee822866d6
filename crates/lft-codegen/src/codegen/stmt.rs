//! Statement, control-flow and function lowering.

use inkwell::basic_block::BasicBlock;
use inkwell::module::Linkage;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValue, BasicValueEnum, FunctionValue, IntValue};
use inkwell::{FloatPredicate, IntPredicate};
use lft_common::{Block, Expr, Param, Stmt};

use super::scope::FrameKind;
use super::types::{fn_type, return_type, storage_type};
use super::CodeGen;
use crate::error::LowerError;

impl<'ctx> CodeGen<'ctx> {
    /// Lower a statement. Expression statements yield their value; other
    /// statements yield `None`.
    pub(crate) fn lower_stmt(
        &mut self,
        stmt: &Stmt,
    ) -> Result<Option<BasicValueEnum<'ctx>>, LowerError> {
        match stmt {
            Stmt::Expression(expr) => self.lower_expr(expr),

            Stmt::VariableDeclaration {
                type_name,
                name,
                init,
            } => {
                self.lower_var_decl(type_name, name, init.as_ref())?;
                Ok(None)
            }

            Stmt::FunctionDeclaration {
                return_type,
                name,
                params,
                body,
            } => {
                self.lower_function(return_type, name, params, body)?;
                Ok(None)
            }

            Stmt::Return(expr) => {
                self.lower_return(expr)?;
                Ok(None)
            }

            Stmt::Branch {
                test,
                then_block,
                else_block,
            } => {
                self.lower_branch(test, then_block, else_block.as_ref())?;
                Ok(None)
            }

            Stmt::Block(block) => self.lower_block(block),
        }
    }

    // ── Block ────────────────────────────────────────────────────────

    /// Lower statements in order, returning the value of the last one.
    ///
    /// Nested blocks share the enclosing frame.
    pub(crate) fn lower_block(
        &mut self,
        block: &Block,
    ) -> Result<Option<BasicValueEnum<'ctx>>, LowerError> {
        let mut last = None;
        for (i, stmt) in block.statements.iter().enumerate() {
            // A `return` closed the block; the rest can never run.
            if self.block_terminated() {
                tracing::warn!(
                    skipped = block.statements.len() - i,
                    "skipping unreachable statements after return"
                );
                break;
            }
            last = self.lower_stmt(stmt)?;
        }
        Ok(last)
    }

    // ── Variable declaration ─────────────────────────────────────────

    fn lower_var_decl(
        &mut self,
        type_name: &str,
        name: &str,
        init: Option<&Expr>,
    ) -> Result<(), LowerError> {
        tracing::debug!(type_name, name, "creating variable declaration");
        let ty = storage_type(self.context, type_name, name)?;
        self.declare(name, ty)?;
        if let Some(init) = init {
            self.lower_assignment(name, init)?;
        }
        Ok(())
    }

    // ── Function declaration ─────────────────────────────────────────

    /// Create a function, lower its body, and return to the insertion point
    /// that was active before the declaration.
    ///
    /// Every parameter gets a stack slot holding its incoming value and is
    /// entered in the parameter table, so parameter reads and writes go
    /// through the same load/store path as locals.
    pub(crate) fn lower_function(
        &mut self,
        ret_name: &str,
        name: &str,
        params: &[Param],
        body: &Block,
    ) -> Result<FunctionValue<'ctx>, LowerError> {
        if self.module.get_function(name).is_some() {
            return Err(LowerError::DuplicateFunction {
                name: name.to_string(),
            });
        }
        let ret_ty = return_type(self.context, ret_name, name)?;
        let param_tys = params
            .iter()
            .map(|p| storage_type(self.context, &p.type_name, &p.name))
            .collect::<Result<Vec<BasicTypeEnum<'ctx>>, LowerError>>()?;

        let fn_ty = fn_type(self.context, &param_tys, ret_ty);
        let function = self.module.add_function(name, fn_ty, Some(Linkage::External));

        let saved_block = self.builder.get_insert_block();
        let saved_fn = self.current_fn.replace(function);
        let saved_params = std::mem::take(&mut self.params);

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let result = self.lower_function_body(function, params, &param_tys, ret_ty, body);

        self.params = saved_params;
        self.current_fn = saved_fn;
        if let Some(bb) = saved_block {
            self.builder.position_at_end(bb);
        }

        result?;
        tracing::debug!(name, params = params.len(), "creating function");
        Ok(function)
    }

    fn lower_function_body(
        &mut self,
        function: FunctionValue<'ctx>,
        params: &[Param],
        param_tys: &[BasicTypeEnum<'ctx>],
        ret_ty: Option<BasicTypeEnum<'ctx>>,
        body: &Block,
    ) -> Result<(), LowerError> {
        let mut scope = self.enter_scope(FrameKind::Function);
        scope.bind_params(function, params, param_tys)?;
        let last = scope.lower_block(body)?;
        let name = function.get_name().to_string_lossy().into_owned();
        scope.finish_function(&name, ret_ty, last)
    }

    fn bind_params(
        &mut self,
        function: FunctionValue<'ctx>,
        params: &[Param],
        tys: &[BasicTypeEnum<'ctx>],
    ) -> Result<(), LowerError> {
        for (i, (param, ty)) in params.iter().zip(tys).enumerate() {
            let value = function.get_nth_param(i as u32).ok_or_else(|| {
                LowerError::backend(format!(
                    "missing parameter {} for function '{}'",
                    i,
                    function.get_name().to_string_lossy()
                ))
            })?;
            value.set_name(&param.name);

            let slot = self.declare(&param.name, *ty)?;
            self.builder
                .build_store(slot.ptr, value)
                .map_err(LowerError::backend)?;
            self.params.insert(param.name.clone(), slot);
        }
        Ok(())
    }

    /// Close a function body that fell off its end.
    fn finish_function(
        &mut self,
        name: &str,
        ret_ty: Option<BasicTypeEnum<'ctx>>,
        last: Option<BasicValueEnum<'ctx>>,
    ) -> Result<(), LowerError> {
        if self.block_terminated() {
            return Ok(());
        }
        if self.block_unreachable()? {
            self.builder
                .build_unreachable()
                .map_err(LowerError::backend)?;
            return Ok(());
        }
        match (ret_ty, last) {
            (None, _) => {
                self.builder.build_return(None).map_err(LowerError::backend)?;
            }
            (Some(ty), Some(value)) if value.get_type() == ty => {
                self.builder
                    .build_return(Some(&value))
                    .map_err(LowerError::backend)?;
            }
            (Some(_), _) => {
                return Err(LowerError::MissingReturn {
                    function: name.to_string(),
                });
            }
        }
        Ok(())
    }

    // ── Return ───────────────────────────────────────────────────────

    /// A comparison result returned from an `int` function is zero-extended.
    fn lower_return(&mut self, expr: &Expr) -> Result<(), LowerError> {
        let value = self.lower_value(expr)?;
        let ret_ty = self.current_function()?.get_type().get_return_type();
        let value = if ret_ty == Some(self.context.i32_type().into()) {
            self.widen_bool(value)?
        } else {
            value
        };
        self.builder
            .build_return(Some(&value))
            .map_err(LowerError::backend)?;
        Ok(())
    }

    // ── Branch ───────────────────────────────────────────────────────

    /// Lower an if / if-else.
    ///
    /// The test is evaluated in the current block, which ends in a two-way
    /// branch to `then` and either `else` or the merge block. Each arm runs in
    /// its own frame and, unless it already returned, falls into `ifcont`,
    /// where lowering continues.
    fn lower_branch(
        &mut self,
        test: &Expr,
        then_block: &Block,
        else_block: Option<&Block>,
    ) -> Result<(), LowerError> {
        tracing::debug!(has_else = else_block.is_some(), "creating branch");
        let fn_val = self.current_function()?;
        let test_val = self.lower_value(test)?;
        let cond = self.truth_value(test_val)?;

        let then_bb = self.context.append_basic_block(fn_val, "then");
        let else_bb = else_block.map(|_| self.context.append_basic_block(fn_val, "else"));
        let merge_bb = self.context.append_basic_block(fn_val, "ifcont");

        self.builder
            .build_conditional_branch(cond, then_bb, else_bb.unwrap_or(merge_bb))
            .map_err(LowerError::backend)?;

        self.builder.position_at_end(then_bb);
        self.lower_arm(then_block, merge_bb)?;

        if let (Some(block), Some(bb)) = (else_block, else_bb) {
            self.builder.position_at_end(bb);
            self.lower_arm(block, merge_bb)?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    fn lower_arm(
        &mut self,
        block: &Block,
        merge_bb: BasicBlock<'ctx>,
    ) -> Result<(), LowerError> {
        let mut scope = self.enter_scope(FrameKind::Arm);
        scope.lower_block(block)?;
        if !scope.block_terminated() {
            scope
                .builder
                .build_unconditional_branch(merge_bb)
                .map_err(LowerError::backend)?;
        }
        Ok(())
    }

    /// Reduce a test value to an `i1`: non-zero (or non-zero double) is true.
    fn truth_value(&self, value: BasicValueEnum<'ctx>) -> Result<IntValue<'ctx>, LowerError> {
        match value {
            BasicValueEnum::IntValue(v) if v.get_type().get_bit_width() == 1 => Ok(v),
            BasicValueEnum::IntValue(v) => self
                .builder
                .build_int_compare(IntPredicate::NE, v, v.get_type().const_zero(), "tobool")
                .map_err(LowerError::backend),
            BasicValueEnum::FloatValue(v) => self
                .builder
                .build_float_compare(FloatPredicate::ONE, v, v.get_type().const_zero(), "tobool")
                .map_err(LowerError::backend),
            other => Err(LowerError::backend(format!(
                "branch test of unsupported type {:?}",
                other.get_type()
            ))),
        }
    }
}
