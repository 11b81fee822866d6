//! Execution tests: lower a program, run `main` through the JIT, and check
//! the value it returns.

use lft_codegen::{compile_and_run, LowerOptions};
use lft_common::{BinOp, Block, Expr, Param, Stmt};

fn run(stmts: Vec<Stmt>) -> i32 {
    match compile_and_run(&Block::new(stmts), &LowerOptions::default()) {
        Ok(out) => out.exit_value,
        Err(e) => panic!("compile_and_run failed: {}", e),
    }
}

/// `int a = x; int b = y; return <lhs op rhs>;` with the result widened
/// through a branch so both int and i1 results come back as 0 or 1.
fn compare(op: BinOp, x: i32, y: i32) -> bool {
    run(vec![
        Stmt::decl("int", "a", Some(Expr::int(x))),
        Stmt::decl("int", "b", Some(Expr::int(y))),
        Stmt::decl("int", "r", Some(Expr::int(0))),
        Stmt::branch(
            Expr::binary(op, Expr::ident("a"), Expr::ident("b")),
            vec![Stmt::expr(Expr::assign("r", Expr::int(1)))],
            None,
        ),
        Stmt::ret(Expr::ident("r")),
    ]) == 1
}

fn arith(op: BinOp, x: i32, y: i32) -> i32 {
    run(vec![
        Stmt::decl("int", "a", Some(Expr::int(x))),
        Stmt::decl("int", "b", Some(Expr::int(y))),
        Stmt::ret(Expr::binary(op, Expr::ident("a"), Expr::ident("b"))),
    ])
}

#[test]
fn test_last_assignment_wins() {
    let result = run(vec![
        Stmt::decl("int", "x", Some(Expr::int(5))),
        Stmt::expr(Expr::assign("x", Expr::int(9))),
        Stmt::expr(Expr::assign("x", Expr::int(11))),
        Stmt::ret(Expr::ident("x")),
    ]);
    assert_eq!(result, 11);
}

#[test]
fn test_precedence_resolved_expression() {
    let result = run(vec![
        Stmt::decl("int", "x", None),
        Stmt::expr(Expr::assign(
            "x",
            Expr::binary(
                BinOp::Add,
                Expr::int(2),
                Expr::binary(BinOp::Mul, Expr::int(3), Expr::int(4)),
            ),
        )),
        Stmt::ret(Expr::ident("x")),
    ]);
    assert_eq!(result, 14);
}

#[test]
fn test_integer_arithmetic_matches_native() {
    let pairs = [(7, 3), (-7, 3), (7, -3), (0, 5), (1000, 999), (i32::MAX, 1)];
    for (x, y) in pairs {
        assert_eq!(arith(BinOp::Add, x, y), x.wrapping_add(y), "{} + {}", x, y);
        assert_eq!(arith(BinOp::Sub, x, y), x.wrapping_sub(y), "{} - {}", x, y);
        assert_eq!(arith(BinOp::Mul, x, y), x.wrapping_mul(y), "{} * {}", x, y);
        assert_eq!(arith(BinOp::Div, x, y), x / y, "{} / {}", x, y);
    }
}

#[test]
fn test_comparison_pairs_are_complementary() {
    let pairs = [(1, 2), (2, 1), (3, 3), (-4, 4), (0, 0)];
    let negations = [
        (BinOp::Eq, BinOp::Ne),
        (BinOp::Lt, BinOp::Ge),
        (BinOp::Gt, BinOp::Le),
    ];
    for (x, y) in pairs {
        for (op, neg) in negations {
            assert_ne!(
                compare(op, x, y),
                compare(neg, x, y),
                "exactly one of {} / {} must hold for ({}, {})",
                op,
                neg,
                x,
                y
            );
        }
    }
}

#[test]
fn test_comparisons_are_signed() {
    assert!(compare(BinOp::Lt, -1, 1));
    assert!(compare(BinOp::Ge, 0, -1));
}

#[test]
fn test_user_function_call() {
    let result = run(vec![
        Stmt::func(
            "int",
            "add",
            vec![Param::new("int", "a"), Param::new("int", "b")],
            vec![Stmt::ret(Expr::binary(
                BinOp::Add,
                Expr::ident("a"),
                Expr::ident("b"),
            ))],
        ),
        Stmt::ret(Expr::call("add", vec![Expr::int(2), Expr::int(3)])),
    ]);
    assert_eq!(result, 5);
}

#[test]
fn test_recursive_function() {
    // int fact(int n) { if (n < 2) { return 1; } return n * fact(n - 1); }
    let result = run(vec![
        Stmt::func(
            "int",
            "fact",
            vec![Param::new("int", "n")],
            vec![
                Stmt::branch(
                    Expr::binary(BinOp::Lt, Expr::ident("n"), Expr::int(2)),
                    vec![Stmt::ret(Expr::int(1))],
                    None,
                ),
                Stmt::ret(Expr::binary(
                    BinOp::Mul,
                    Expr::ident("n"),
                    Expr::call(
                        "fact",
                        vec![Expr::binary(BinOp::Sub, Expr::ident("n"), Expr::int(1))],
                    ),
                )),
            ],
        ),
        Stmt::ret(Expr::call("fact", vec![Expr::int(5)])),
    ]);
    assert_eq!(result, 120);
}

#[test]
fn test_parameters_are_assignable() {
    let result = run(vec![
        Stmt::func(
            "int",
            "bump",
            vec![Param::new("int", "v")],
            vec![
                Stmt::expr(Expr::assign(
                    "v",
                    Expr::binary(BinOp::Add, Expr::ident("v"), Expr::int(10)),
                )),
                Stmt::ret(Expr::ident("v")),
            ],
        ),
        Stmt::ret(Expr::call("bump", vec![Expr::int(1)])),
    ]);
    assert_eq!(result, 11);
}

#[test]
fn test_if_else_takes_one_arm() {
    let program = |x: i32| {
        vec![
            Stmt::decl("int", "x", Some(Expr::int(x))),
            Stmt::decl("int", "r", None),
            Stmt::branch(
                Expr::binary(BinOp::Gt, Expr::ident("x"), Expr::int(10)),
                vec![Stmt::expr(Expr::assign("r", Expr::int(1)))],
                Some(vec![Stmt::expr(Expr::assign("r", Expr::int(2)))]),
            ),
            Stmt::ret(Expr::ident("r")),
        ]
    };
    assert_eq!(run(program(11)), 1);
    assert_eq!(run(program(10)), 2);
}

#[test]
fn test_implicit_function_result() {
    let result = run(vec![
        Stmt::func(
            "int",
            "answer",
            vec![],
            vec![Stmt::expr(Expr::int(42))],
        ),
        Stmt::ret(Expr::call("answer", vec![])),
    ]);
    assert_eq!(result, 42);
}

#[test]
fn test_fallthrough_main_returns_zero() {
    let out = compile_and_run(
        &Block::new(vec![Stmt::decl("int", "x", Some(Expr::int(3)))]),
        &LowerOptions::default(),
    )
    .unwrap();
    assert_eq!(out.exit_value, 0);
    assert!(out.ir.contains("ret i32 0"), "{}", out.ir);
}

#[test]
fn test_comparison_stored_in_int_reads_back_cleanly() {
    // int b = 1 < 2; return b * 7;
    let result = run(vec![
        Stmt::decl("int", "x", Some(Expr::int(1))),
        Stmt::decl(
            "int",
            "b",
            Some(Expr::binary(BinOp::Lt, Expr::ident("x"), Expr::int(2))),
        ),
        Stmt::ret(Expr::binary(BinOp::Mul, Expr::ident("b"), Expr::int(7))),
    ]);
    assert_eq!(result, 7);
}

#[test]
fn test_comparison_returned_directly() {
    let result = run(vec![
        Stmt::decl("int", "x", Some(Expr::int(3))),
        Stmt::ret(Expr::binary(BinOp::Ge, Expr::ident("x"), Expr::int(3))),
    ]);
    assert_eq!(result, 1);
}
