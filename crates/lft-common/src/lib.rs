//! Shared types for the lft compiler.
//!
//! The AST defined here is produced by the external parser and consumed,
//! read-only, by the lowering engine in `lft-codegen`. Nodes serialize with
//! serde so a tree can be handed between processes as JSON.

pub mod ast;

pub use ast::{BinOp, Block, Expr, Param, Stmt};
