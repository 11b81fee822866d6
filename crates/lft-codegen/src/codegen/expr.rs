//! Expression lowering.
//!
//! Translates each expression variant into LLVM IR at the builder's current
//! insertion point. Operands are always lowered left to right.

use inkwell::builder::BuilderError;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};
use inkwell::{FloatPredicate, IntPredicate};
use lft_common::{BinOp, Expr};

use super::types::type_label;
use super::CodeGen;
use crate::error::LowerError;

impl<'ctx> CodeGen<'ctx> {
    /// Lower an expression. Returns `None` only for calls to `void` functions.
    pub(crate) fn lower_expr(
        &mut self,
        expr: &Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>, LowerError> {
        match expr {
            Expr::Integer(value) => {
                tracing::debug!(value, "creating integer");
                Ok(Some(
                    self.context
                        .i32_type()
                        .const_int(*value as u64, true)
                        .into(),
                ))
            }

            Expr::Double(value) => {
                tracing::debug!(value, "creating double");
                Ok(Some(self.context.f64_type().const_float(*value).into()))
            }

            Expr::Identifier(name) => self.lower_identifier(name).map(Some),

            Expr::BinaryOp { op, lhs, rhs } => self.lower_binop(*op, lhs, rhs).map(Some),

            Expr::Assignment { target, value } => self.lower_assignment(target, value).map(Some),

            Expr::Call { callee, args } => self.lower_call(callee, args),

            Expr::PrintCall { format, args } => self.lower_print(format, args).map(Some),
        }
    }

    /// Lower an expression that must produce a value.
    pub(crate) fn lower_value(&mut self, expr: &Expr) -> Result<BasicValueEnum<'ctx>, LowerError> {
        match self.lower_expr(expr)? {
            Some(value) => Ok(value),
            None => {
                let name = match expr {
                    Expr::Call { callee, .. } => callee.clone(),
                    _ => "expression".to_string(),
                };
                Err(LowerError::ValuelessOperand { name })
            }
        }
    }

    // ── Variable reference ───────────────────────────────────────────

    fn lower_identifier(&mut self, name: &str) -> Result<BasicValueEnum<'ctx>, LowerError> {
        tracing::debug!(name, "creating identifier reference");
        let slot = self
            .resolve(name)
            .ok_or_else(|| LowerError::UndeclaredIdentifier {
                name: name.to_string(),
            })?;
        self.builder
            .build_load(slot.ty, slot.ptr, name)
            .map_err(LowerError::backend)
    }

    // ── Assignment ───────────────────────────────────────────────────

    /// Store `value` into the slot bound to `target`. The target is resolved
    /// before the value is lowered, so a failed lookup emits nothing.
    pub(crate) fn lower_assignment(
        &mut self,
        target: &str,
        value: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        tracing::debug!(target, "creating assignment");
        let slot = self
            .resolve(target)
            .ok_or_else(|| LowerError::UndeclaredAssignmentTarget {
                name: target.to_string(),
            })?;
        let val = self.lower_value(value)?;
        let val = self.coerce_to(target, val, slot.ty)?;
        self.builder
            .build_store(slot.ptr, val)
            .map_err(LowerError::backend)?;
        Ok(val)
    }

    /// Fit `value` to the slot type `ty`. A comparison result stored into an
    /// `int` slot is zero-extended; any other type difference is an error.
    pub(crate) fn coerce_to(
        &self,
        target: &str,
        value: BasicValueEnum<'ctx>,
        ty: BasicTypeEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        let value = if ty == self.context.i32_type().into() {
            self.widen_bool(value)?
        } else {
            value
        };
        if value.get_type() == ty {
            Ok(value)
        } else {
            Err(LowerError::IncompatibleAssignment {
                name: target.to_string(),
                expected: type_label(ty),
                found: type_label(value.get_type()),
            })
        }
    }

    /// Zero-extend an `i1` to `i32`. Other values pass through unchanged.
    pub(crate) fn widen_bool(
        &self,
        value: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        match value {
            BasicValueEnum::IntValue(v) if v.get_type().get_bit_width() == 1 => self
                .builder
                .build_int_z_extend(v, self.context.i32_type(), "widen")
                .map(Into::into)
                .map_err(LowerError::backend),
            other => Ok(other),
        }
    }

    // ── Binary operations ────────────────────────────────────────────

    fn lower_binop(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        tracing::debug!(%op, comparison = op.is_comparison(), "creating binary operation");
        let lhs_val = self.lower_value(lhs)?;
        let rhs_val = self.lower_value(rhs)?;

        match (lhs_val, rhs_val) {
            (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r))
                if l.get_type() == r.get_type() =>
            {
                self.lower_int_binop(op, lhs_val, rhs_val)
            }
            (BasicValueEnum::FloatValue(_), BasicValueEnum::FloatValue(_)) => {
                self.lower_float_binop(op, lhs_val, rhs_val)
            }
            _ => Err(LowerError::MismatchedOperands { op }),
        }
    }

    fn lower_int_binop(
        &mut self,
        op: BinOp,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        let l = lhs.into_int_value();
        let r = rhs.into_int_value();
        let b = &self.builder;

        let result = match op {
            BinOp::Add => b.build_int_add(l, r, "add"),
            BinOp::Sub => b.build_int_sub(l, r, "sub"),
            BinOp::Mul => b.build_int_mul(l, r, "mul"),
            // Signed, truncating. A zero divisor is left to the runtime.
            BinOp::Div => b.build_int_signed_div(l, r, "div"),
            BinOp::Eq => b.build_int_compare(IntPredicate::EQ, l, r, "eq"),
            BinOp::Ne => b.build_int_compare(IntPredicate::NE, l, r, "ne"),
            BinOp::Lt => b.build_int_compare(IntPredicate::SLT, l, r, "lt"),
            BinOp::Gt => b.build_int_compare(IntPredicate::SGT, l, r, "gt"),
            BinOp::Le => b.build_int_compare(IntPredicate::SLE, l, r, "le"),
            BinOp::Ge => b.build_int_compare(IntPredicate::SGE, l, r, "ge"),
        };
        result.map(Into::into).map_err(LowerError::backend)
    }

    fn lower_float_binop(
        &mut self,
        op: BinOp,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        let l = lhs.into_float_value();
        let r = rhs.into_float_value();
        let b = &self.builder;

        type Built<'a> = Result<BasicValueEnum<'a>, BuilderError>;
        let compare = |pred: FloatPredicate, name: &str| -> Built<'ctx> {
            b.build_float_compare(pred, l, r, name).map(Into::into)
        };
        let result: Built<'ctx> = match op {
            BinOp::Add => b.build_float_add(l, r, "fadd").map(Into::into),
            BinOp::Sub => b.build_float_sub(l, r, "fsub").map(Into::into),
            BinOp::Mul => b.build_float_mul(l, r, "fmul").map(Into::into),
            BinOp::Div => b.build_float_div(l, r, "fdiv").map(Into::into),
            BinOp::Eq => compare(FloatPredicate::OEQ, "feq"),
            BinOp::Ne => compare(FloatPredicate::ONE, "fne"),
            BinOp::Lt => compare(FloatPredicate::OLT, "flt"),
            BinOp::Gt => compare(FloatPredicate::OGT, "fgt"),
            BinOp::Le => compare(FloatPredicate::OLE, "fle"),
            BinOp::Ge => compare(FloatPredicate::OGE, "fge"),
        };
        result.map_err(LowerError::backend)
    }

    // ── Function calls ───────────────────────────────────────────────

    fn lower_call(
        &mut self,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>, LowerError> {
        let function = self
            .module
            .get_function(callee)
            .ok_or_else(|| LowerError::UnresolvedCallee {
                name: callee.to_string(),
            })?;

        let expected = function.count_params() as usize;
        let variadic = function.get_type().is_var_arg();
        if args.len() < expected || (!variadic && args.len() > expected) {
            return Err(LowerError::ArgumentCountMismatch {
                callee: callee.to_string(),
                expected,
                found: args.len(),
            });
        }

        let mut arg_vals: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.lower_value(arg)?;
            arg_vals.push(self.widen_bool(value)?.into());
        }

        // Void calls must stay unnamed.
        let name = if function.get_type().get_return_type().is_some() {
            "call"
        } else {
            ""
        };
        let call = self
            .builder
            .build_call(function, &arg_vals, name)
            .map_err(LowerError::backend)?;
        tracing::debug!(callee, "creating method call");

        Ok(call.try_as_basic_value().basic())
    }
}
