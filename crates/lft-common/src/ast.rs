//! AST node model.
//!
//! A closed set of node variants. Expressions produce a value when lowered;
//! statements may or may not. There is no behavior attached to the nodes:
//! lowering dispatches over them with a `match` in `lft-codegen`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary operators. Arithmetic and comparison share one node shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    /// True for the six comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }

    /// The source-level spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// 32-bit signed integer literal.
    Integer(i32),
    /// Double-precision float literal.
    Double(f64),
    /// A variable read.
    Identifier(String),
    BinaryOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `target = value`. Evaluates to the stored value.
    Assignment { target: String, value: Box<Expr> },
    /// A call to a function already present in the module.
    Call { callee: String, args: Vec<Expr> },
    /// The variadic print intrinsic. `format` is the raw literal token,
    /// enclosing quotes and escape sequences included.
    PrintCall { format: String, args: Vec<Expr> },
}

impl Expr {
    pub fn int(value: i32) -> Self {
        Expr::Integer(value)
    }

    pub fn double(value: f64) -> Self {
        Expr::Double(value)
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Expr::Assignment {
            target: target.into(),
            value: Box::new(value),
        }
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn print(format: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::PrintCall {
            format: format.into(),
            args,
        }
    }
}

/// A function parameter: a type name and a binding name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub type_name: String,
    pub name: String,
}

impl Param {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// An ordered statement list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// An expression evaluated for its effect (and, at the end of a
    /// function body, for its value).
    Expression(Expr),
    VariableDeclaration {
        type_name: String,
        name: String,
        #[serde(default)]
        init: Option<Expr>,
    },
    FunctionDeclaration {
        return_type: String,
        name: String,
        params: Vec<Param>,
        body: Block,
    },
    Return(Expr),
    Branch {
        test: Expr,
        then_block: Block,
        #[serde(default)]
        else_block: Option<Block>,
    },
    Block(Block),
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expression(expr)
    }

    pub fn decl(type_name: impl Into<String>, name: impl Into<String>, init: Option<Expr>) -> Self {
        Stmt::VariableDeclaration {
            type_name: type_name.into(),
            name: name.into(),
            init,
        }
    }

    pub fn func(
        return_type: impl Into<String>,
        name: impl Into<String>,
        params: Vec<Param>,
        body: Vec<Stmt>,
    ) -> Self {
        Stmt::FunctionDeclaration {
            return_type: return_type.into(),
            name: name.into(),
            params,
            body: Block::new(body),
        }
    }

    pub fn ret(expr: Expr) -> Self {
        Stmt::Return(expr)
    }

    pub fn branch(test: Expr, then_block: Vec<Stmt>, else_block: Option<Vec<Stmt>>) -> Self {
        Stmt::Branch {
            test,
            then_block: Block::new(then_block),
            else_block: else_block.map(Block::new),
        }
    }
}
