//! Type-name to LLVM type mapping.
//!
//! The language has two value types, resolved purely by name. `void` is
//! only meaningful as a function return type.
//!
//! | Name     | LLVM Type |
//! |----------|-----------|
//! | `int`    | i32       |
//! | `double` | double    |
//! | `void`   | void      |

use inkwell::context::Context;
use inkwell::types::{AnyType, BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType};

use crate::error::LowerError;

/// A primitive type named in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Int,
    Double,
    Void,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(PrimitiveType::Int),
            "double" => Some(PrimitiveType::Double),
            "void" => Some(PrimitiveType::Void),
            _ => None,
        }
    }

    /// The LLVM type of a value of this type, `None` for `void`.
    pub fn basic_type<'ctx>(self, context: &'ctx Context) -> Option<BasicTypeEnum<'ctx>> {
        match self {
            PrimitiveType::Int => Some(context.i32_type().into()),
            PrimitiveType::Double => Some(context.f64_type().into()),
            PrimitiveType::Void => None,
        }
    }
}

/// Resolve the storage type for a declared variable or parameter.
///
/// `void` and unknown names are rejected: a storage slot needs a sized type.
pub fn storage_type<'ctx>(
    context: &'ctx Context,
    type_name: &str,
    binding: &str,
) -> Result<BasicTypeEnum<'ctx>, LowerError> {
    PrimitiveType::from_name(type_name)
        .and_then(|ty| ty.basic_type(context))
        .ok_or_else(|| LowerError::UnsupportedDeclarationType {
            type_name: type_name.to_string(),
            name: binding.to_string(),
        })
}

/// Resolve a function return type. `Ok(None)` means `void`.
pub fn return_type<'ctx>(
    context: &'ctx Context,
    type_name: &str,
    function: &str,
) -> Result<Option<BasicTypeEnum<'ctx>>, LowerError> {
    PrimitiveType::from_name(type_name)
        .map(|ty| ty.basic_type(context))
        .ok_or_else(|| LowerError::UnsupportedDeclarationType {
            type_name: type_name.to_string(),
            name: function.to_string(),
        })
}

/// The source-level name of a value type, for diagnostics.
///
/// `i1` comparison results are reported as `bool`.
pub fn type_label(ty: BasicTypeEnum<'_>) -> String {
    match ty {
        BasicTypeEnum::IntType(t) if t.get_bit_width() == 32 => "int".to_string(),
        BasicTypeEnum::IntType(t) if t.get_bit_width() == 1 => "bool".to_string(),
        BasicTypeEnum::FloatType(_) => "double".to_string(),
        other => other.print_to_string().to_string(),
    }
}

/// Build a (non-variadic) function type from resolved parameter and return types.
pub fn fn_type<'ctx>(
    context: &'ctx Context,
    params: &[BasicTypeEnum<'ctx>],
    ret: Option<BasicTypeEnum<'ctx>>,
) -> FunctionType<'ctx> {
    let params: Vec<BasicMetadataTypeEnum<'ctx>> = params.iter().map(|ty| (*ty).into()).collect();
    match ret {
        Some(ty) => ty.fn_type(&params, false),
        None => context.void_type().fn_type(&params, false),
    }
}
