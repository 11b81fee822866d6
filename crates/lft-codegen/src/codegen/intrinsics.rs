//! External runtime function declarations in the LLVM module.
//!
//! Declares the C library symbols the generated code links against. The
//! JIT resolves them from the host process.

use inkwell::module::{Linkage, Module};
use inkwell::values::FunctionValue;
use inkwell::AddressSpace;

/// Name of the variadic text-output primitive used by print calls.
pub const PRINTF: &str = "printf";

/// Name of the single-character output primitive.
pub const PUTCHAR: &str = "putchar";

/// Declare the runtime functions in the LLVM module.
///
/// Must run before lowering so print calls can find `printf`.
pub fn declare_intrinsics<'ctx>(module: &Module<'ctx>) {
    let context = module.get_context();
    let void_type = context.void_type();
    let i32_type = context.i32_type();
    let ptr_type = context.ptr_type(AddressSpace::default());

    // printf(fmt: ptr, ...) -> i32
    let printf_ty = i32_type.fn_type(&[ptr_type.into()], true);
    module.add_function(PRINTF, printf_ty, Some(Linkage::External));

    // putchar() -> void
    // Declared for parity with the runtime surface; no lowering rule calls it.
    let putchar_ty = void_type.fn_type(&[], false);
    module.add_function(PUTCHAR, putchar_ty, Some(Linkage::External));
}

/// Get a runtime function by name from the module.
pub fn get_intrinsic<'ctx>(module: &Module<'ctx>, name: &str) -> Option<FunctionValue<'ctx>> {
    module.get_function(name)
}
