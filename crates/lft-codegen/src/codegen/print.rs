//! Print-call lowering.
//!
//! Each print call interns its format text as a private constant global
//! named `.fmt.<n>` and calls `printf` with a pointer to the first byte.
//! Identical texts still get distinct globals.

use inkwell::module::Linkage;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum};
use lft_common::Expr;

use super::intrinsics::{get_intrinsic, PRINTF};
use super::CodeGen;
use crate::error::LowerError;

/// Turn a format literal as it appears in source into the bytes to print.
///
/// Surrounding double quotes are removed when present at both ends. The
/// escapes `\n`, `\t`, `\r`, `\0`, `\\` and `\"` are decoded; any other
/// backslash sequence is kept as written.
pub fn normalize_format(raw: &str) -> String {
    let body = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl<'ctx> CodeGen<'ctx> {
    /// Lower a print call to `printf(fmt, args...)`. Yields printf's `i32`
    /// result.
    pub(crate) fn lower_print(
        &mut self,
        format: &str,
        args: &[Expr],
    ) -> Result<BasicValueEnum<'ctx>, LowerError> {
        let printf = get_intrinsic(&self.module, PRINTF).ok_or_else(|| {
            LowerError::UnresolvedCallee {
                name: PRINTF.to_string(),
            }
        })?;

        let text = normalize_format(format);
        let name = format!(".fmt.{}", self.format_strings);
        self.format_strings += 1;

        // Null-terminated: [len + 1 x i8].
        let init = self.context.const_string(text.as_bytes(), true);
        let array_ty = init.get_type();
        let global = self.module.add_global(array_ty, None, &name);
        global.set_linkage(Linkage::Private);
        global.set_constant(true);
        global.set_initializer(&init);

        let zero = self.context.i32_type().const_zero();
        // SAFETY: both indices are zero on a global of array type.
        let fmt_ptr = unsafe {
            self.builder
                .build_in_bounds_gep(array_ty, global.as_pointer_value(), &[zero, zero], "fmt")
                .map_err(LowerError::backend)?
        };

        let mut call_args: Vec<BasicMetadataValueEnum<'ctx>> = Vec::with_capacity(args.len() + 1);
        call_args.push(fmt_ptr.into());
        for arg in args {
            // C varargs take nothing narrower than `int`.
            let value = self.lower_value(arg)?;
            call_args.push(self.widen_bool(value)?.into());
        }

        let call = self
            .builder
            .build_call(printf, &call_args, "printf")
            .map_err(LowerError::backend)?;
        tracing::debug!(global = %name, len = text.len(), "creating printf call");

        call.try_as_basic_value()
            .basic()
            .ok_or_else(|| LowerError::backend("printf returned no value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_quotes_and_decodes_newline() {
        let text = normalize_format("\"Hello\\n\"");
        assert_eq!(text, "Hello\n");
        assert_eq!(text.len(), 6);
    }

    #[test]
    fn test_unquoted_text_kept() {
        assert_eq!(normalize_format("plain"), "plain");
    }

    #[test]
    fn test_single_quote_not_stripped() {
        assert_eq!(normalize_format("\"open"), "\"open");
    }

    #[test]
    fn test_all_escapes() {
        assert_eq!(
            normalize_format("a\\tb\\rc\\0d\\\\e\\\"f"),
            "a\tb\rc\0d\\e\"f"
        );
    }

    #[test]
    fn test_unknown_escape_kept_verbatim() {
        assert_eq!(normalize_format("%d\\q"), "%d\\q");
        assert_eq!(normalize_format("end\\"), "end\\");
    }

    #[test]
    fn test_empty_literal() {
        assert_eq!(normalize_format("\"\""), "");
    }
}
