//! Algebraic identity laws and strength reduction.
//!
//! Rewrites that erase or duplicate an operand only fire when the operand
//! is side-effect-free; identity rewrites that merely peel an operator
//! (`x * 1 -> x`) apply unconditionally.

use crate::analysis::{OptContext, expr_is_pure};
use crate::fold::rewrite_exprs;
use crate::Pass;
use prism_ast::{BaseType, BinaryOp, Expr, ExprKind, Shader, Span, UnaryOp};

fn is_int_zero(e: &Expr) -> bool {
    matches!(e.kind, ExprKind::IntLit(0) | ExprKind::UintLit(0))
}

fn is_zero(e: &Expr) -> bool {
    is_int_zero(e) || matches!(e.kind, ExprKind::FloatLit(v) | ExprKind::DoubleLit(v) if v == 0.0)
}

fn is_one(e: &Expr) -> bool {
    matches!(e.kind, ExprKind::IntLit(1) | ExprKind::UintLit(1))
        || matches!(e.kind, ExprKind::FloatLit(v) | ExprKind::DoubleLit(v) if v == 1.0)
}

fn is_minus_one(e: &Expr) -> bool {
    matches!(e.kind, ExprKind::IntLit(-1))
        || matches!(e.kind, ExprKind::FloatLit(v) | ExprKind::DoubleLit(v) if v == -1.0)
}

fn negated(e: &Expr) -> ExprKind {
    ExprKind::Unary {
        op: UnaryOp::Neg,
        operand: Box::new(e.clone()),
        prefix: true,
    }
}

pub struct AlgebraicSimplification;

impl Pass for AlgebraicSimplification {
    fn name(&self) -> &'static str {
        "algebraic-simplification"
    }
    fn priority(&self) -> i32 {
        80
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        rewrite_exprs(shader, &mut simplify_one)
    }
}

fn simplify_one(expr: &mut Expr) -> bool {
    // !!x -> x and -(-x) -> x.
    if let ExprKind::Unary {
        op,
        operand,
        prefix: true,
    } = &expr.kind
    {
        if let ExprKind::Unary {
            op: inner_op,
            operand: inner,
            prefix: true,
        } = &operand.kind
        {
            if (*op == UnaryOp::Not && *inner_op == UnaryOp::Not)
                || (*op == UnaryOp::Neg && *inner_op == UnaryOp::Neg)
            {
                expr.kind = inner.kind.clone();
                return true;
            }
        }
    }

    let ExprKind::Binary { op, lhs, rhs } = &expr.kind else {
        return false;
    };
    let replacement: Option<ExprKind> = match op {
        BinaryOp::Add => {
            if is_zero(rhs) {
                Some(lhs.kind.clone())
            } else if is_zero(lhs) {
                Some(rhs.kind.clone())
            } else {
                None
            }
        }
        BinaryOp::Sub => {
            if is_zero(rhs) {
                Some(lhs.kind.clone())
            } else if is_zero(lhs) {
                Some(negated(rhs))
            } else if lhs.structurally_equal(rhs) && expr_is_pure(lhs) {
                Some(ExprKind::IntLit(0))
            } else {
                None
            }
        }
        BinaryOp::Mul => {
            if is_one(rhs) {
                Some(lhs.kind.clone())
            } else if is_one(lhs) {
                Some(rhs.kind.clone())
            } else if is_minus_one(lhs) {
                Some(negated(rhs))
            } else if is_minus_one(rhs) {
                Some(negated(lhs))
            } else if (is_zero(rhs) && expr_is_pure(lhs)) || (is_zero(lhs) && expr_is_pure(rhs)) {
                Some(ExprKind::IntLit(0))
            } else {
                None
            }
        }
        BinaryOp::Div => {
            if is_one(rhs) {
                Some(lhs.kind.clone())
            } else if is_zero(lhs) && expr_is_pure(rhs) && !is_zero(rhs) {
                Some(ExprKind::IntLit(0))
            } else if lhs.structurally_equal(rhs) && expr_is_pure(lhs) && !is_zero(lhs) {
                Some(ExprKind::IntLit(1))
            } else {
                None
            }
        }
        BinaryOp::Mod => {
            if is_one(rhs) && expr_is_pure(lhs) {
                Some(ExprKind::IntLit(0))
            } else {
                None
            }
        }
        BinaryOp::LogicalAnd => match (lhs.literal_bool(), rhs.literal_bool()) {
            (_, Some(false)) if expr_is_pure(lhs) => Some(ExprKind::BoolLit(false)),
            (_, Some(true)) => Some(lhs.kind.clone()),
            (Some(true), _) => Some(rhs.kind.clone()),
            // `false && x` never evaluates x.
            (Some(false), _) => Some(ExprKind::BoolLit(false)),
            _ => None,
        },
        BinaryOp::LogicalOr => match (lhs.literal_bool(), rhs.literal_bool()) {
            (_, Some(true)) if expr_is_pure(lhs) => Some(ExprKind::BoolLit(true)),
            (_, Some(false)) => Some(lhs.kind.clone()),
            (Some(false), _) => Some(rhs.kind.clone()),
            (Some(true), _) => Some(ExprKind::BoolLit(true)),
            _ => None,
        },
        BinaryOp::BitAnd => {
            if (is_int_zero(rhs) && expr_is_pure(lhs)) || (is_int_zero(lhs) && expr_is_pure(rhs)) {
                Some(ExprKind::IntLit(0))
            } else {
                None
            }
        }
        BinaryOp::BitOr => {
            if is_int_zero(rhs) {
                Some(lhs.kind.clone())
            } else if is_int_zero(lhs) {
                Some(rhs.kind.clone())
            } else {
                None
            }
        }
        BinaryOp::BitXor => {
            if is_int_zero(rhs) {
                Some(lhs.kind.clone())
            } else if is_int_zero(lhs) {
                Some(rhs.kind.clone())
            } else if lhs.structurally_equal(rhs) && expr_is_pure(lhs) {
                Some(ExprKind::IntLit(0))
            } else {
                None
            }
        }
        BinaryOp::Shl | BinaryOp::Shr => {
            if is_int_zero(rhs) {
                Some(lhs.kind.clone())
            } else {
                None
            }
        }
        _ => None,
    };
    match replacement {
        Some(kind) => {
            expr.kind = kind;
            true
        }
        None => false,
    }
}

// -------------------------------------------------------------------------------------------------
// Strength reduction (level 2)
// -------------------------------------------------------------------------------------------------

pub struct StrengthReduction;

impl Pass for StrengthReduction {
    fn name(&self) -> &'static str {
        "strength-reduction"
    }
    fn priority(&self) -> i32 {
        75
    }
    fn min_level(&self) -> u8 {
        2
    }

    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool {
        let usage = cx.usage.clone();
        let int_typed = |e: &Expr| -> bool {
            match &e.kind {
                ExprKind::IntLit(_) | ExprKind::UintLit(_) => true,
                ExprKind::Ident(name) => matches!(
                    usage.get(name.as_str()).and_then(|u| u.base),
                    Some(BaseType::Int | BaseType::Uint)
                ),
                _ => false,
            }
        };
        rewrite_exprs(shader, &mut |expr| reduce_one(expr, &int_typed))
    }
}

fn power_of_two(e: &Expr) -> Option<u32> {
    let v = match e.kind {
        ExprKind::IntLit(v) if v > 0 => v as u64,
        ExprKind::UintLit(v) if v > 0 => v,
        _ => return None,
    };
    if v.is_power_of_two() {
        Some(v.trailing_zeros())
    } else {
        None
    }
}

fn reduce_one(expr: &mut Expr, int_typed: &impl Fn(&Expr) -> bool) -> bool {
    let span = expr.span;
    // pow(x, 2) -> x * x, pow(x, 0.5) -> sqrt(x).
    if let ExprKind::Call {
        name,
        args,
        is_builtin: true,
        ..
    } = &expr.kind
    {
        if name == "pow" && args.len() == 2 {
            let exponent = args[1].literal_number();
            if exponent == Some(2.0) && expr_is_pure(&args[0]) {
                let x = args[0].clone();
                expr.kind = ExprKind::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(x.clone()),
                    rhs: Box::new(x),
                };
                return true;
            }
            if exponent == Some(0.5) {
                let x = args[0].clone();
                expr.kind = ExprKind::Call {
                    name: "sqrt".to_owned(),
                    args: vec![x],
                    is_constructor: false,
                    is_builtin: true,
                };
                return true;
            }
        }
        return false;
    }

    let ExprKind::Binary { op, lhs, rhs } = &expr.kind else {
        return false;
    };
    match op {
        BinaryOp::Mul => {
            // x * 2 -> x + x for cheap pure operands.
            let doubles = |side: &Expr, other: &Expr| -> Option<ExprKind> {
                if matches!(side.kind, ExprKind::IntLit(2))
                    || matches!(side.kind, ExprKind::FloatLit(v) if v == 2.0)
                {
                    if matches!(other.kind, ExprKind::Ident(_)) && expr_is_pure(other) {
                        return Some(ExprKind::Binary {
                            op: BinaryOp::Add,
                            lhs: Box::new(other.clone()),
                            rhs: Box::new(other.clone()),
                        });
                    }
                }
                None
            };
            if let Some(kind) = doubles(rhs, lhs).or_else(|| doubles(lhs, rhs)) {
                expr.kind = kind;
                return true;
            }
            // x * 2^k -> x << k, integers only.
            if int_typed(lhs) && !lhs.is_literal() {
                if let Some(k) = power_of_two(rhs) {
                    let x = (**lhs).clone();
                    expr.kind = ExprKind::Binary {
                        op: BinaryOp::Shl,
                        lhs: Box::new(x),
                        rhs: Box::new(Expr::int(k as i64, span)),
                    };
                    return true;
                }
            }
            false
        }
        BinaryOp::Div => {
            // x / 2^k -> x >> k, integers only.
            if int_typed(lhs) && !lhs.is_literal() {
                if let Some(k) = power_of_two(rhs) {
                    if k > 0 {
                        let x = (**lhs).clone();
                        expr.kind = ExprKind::Binary {
                            op: BinaryOp::Shr,
                            lhs: Box::new(x),
                            rhs: Box::new(Expr::int(k as i64, span)),
                        };
                        return true;
                    }
                }
            }
            // x / c -> x * (1/c), floats.
            if let ExprKind::FloatLit(c) = rhs.kind {
                if c != 0.0 && !lhs.is_literal() {
                    let recip = 1.0 / c;
                    if recip.is_finite() {
                        let x = (**lhs).clone();
                        expr.kind = ExprKind::Binary {
                            op: BinaryOp::Mul,
                            lhs: Box::new(x),
                            rhs: Box::new(Expr::new(ExprKind::FloatLit(recip), Span::default())),
                        };
                        return true;
                    }
                }
            }
            false
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_ast::Span;

    fn ident(name: &str) -> Expr {
        Expr::ident(name, Span::default())
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Span::default(),
        )
    }

    fn impure_call() -> Expr {
        Expr::new(
            ExprKind::Call {
                name: "f".into(),
                args: vec![ident("x")],
                is_constructor: false,
                is_builtin: false,
            },
            Span::default(),
        )
    }

    #[test]
    fn additive_identities() {
        let mut e = binary(BinaryOp::Add, ident("x"), Expr::int(0, Span::default()));
        assert!(simplify_one(&mut e));
        assert!(matches!(&e.kind, ExprKind::Ident(n) if n == "x"));

        let mut e = binary(BinaryOp::Sub, Expr::int(0, Span::default()), ident("x"));
        assert!(simplify_one(&mut e));
        assert!(matches!(&e.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn x_minus_x_requires_purity() {
        let mut pure = binary(BinaryOp::Sub, ident("x"), ident("x"));
        assert!(simplify_one(&mut pure));
        assert!(matches!(pure.kind, ExprKind::IntLit(0)));

        let mut impure = binary(BinaryOp::Sub, impure_call(), impure_call());
        assert!(!simplify_one(&mut impure));
    }

    #[test]
    fn multiply_by_zero_preserves_side_effects() {
        // f(x) * 0 keeps the call.
        let mut call_times_zero =
            binary(BinaryOp::Mul, impure_call(), Expr::int(0, Span::default()));
        assert!(!simplify_one(&mut call_times_zero));
        // x * 0 with a pure operand folds away.
        let mut pure_times_zero =
            binary(BinaryOp::Mul, ident("x"), Expr::int(0, Span::default()));
        assert!(simplify_one(&mut pure_times_zero));
        assert!(matches!(pure_times_zero.kind, ExprKind::IntLit(0)));
    }

    #[test]
    fn multiply_by_one_keeps_impure_operand() {
        let mut e = binary(BinaryOp::Mul, impure_call(), Expr::int(1, Span::default()));
        assert!(simplify_one(&mut e));
        assert!(matches!(&e.kind, ExprKind::Call { name, .. } if name == "f"));
    }

    #[test]
    fn short_circuit_truth_tables() {
        // false && x -> false even for impure x (never evaluated).
        let mut e = binary(
            BinaryOp::LogicalAnd,
            Expr::bool(false, Span::default()),
            impure_call(),
        );
        assert!(simplify_one(&mut e));
        assert!(matches!(e.kind, ExprKind::BoolLit(false)));

        // x && false must keep an impure x.
        let mut e = binary(
            BinaryOp::LogicalAnd,
            impure_call(),
            Expr::bool(false, Span::default()),
        );
        assert!(!simplify_one(&mut e));

        let mut e = binary(BinaryOp::LogicalOr, ident("x"), Expr::bool(true, Span::default()));
        assert!(simplify_one(&mut e));
        assert!(matches!(e.kind, ExprKind::BoolLit(true)));
    }

    #[test]
    fn double_negation_cancels() {
        let neg = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(ident("x")),
                prefix: true,
            },
            Span::default(),
        );
        let mut e = Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(neg),
                prefix: true,
            },
            Span::default(),
        );
        assert!(simplify_one(&mut e));
        assert!(matches!(&e.kind, ExprKind::Ident(n) if n == "x"));
    }

    #[test]
    fn xor_and_shift_identities() {
        let mut e = binary(BinaryOp::BitXor, ident("x"), ident("x"));
        assert!(simplify_one(&mut e));
        assert!(matches!(e.kind, ExprKind::IntLit(0)));

        let mut e = binary(BinaryOp::Shl, ident("x"), Expr::int(0, Span::default()));
        assert!(simplify_one(&mut e));
        assert!(matches!(&e.kind, ExprKind::Ident(n) if n == "x"));
    }

    #[test]
    fn pow_reductions() {
        let int_typed = |_: &Expr| false;
        let mut pow2 = Expr::new(
            ExprKind::Call {
                name: "pow".into(),
                args: vec![ident("x"), Expr::float(2.0, Span::default())],
                is_constructor: false,
                is_builtin: true,
            },
            Span::default(),
        );
        assert!(reduce_one(&mut pow2, &int_typed));
        assert!(matches!(
            &pow2.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));

        let mut pow_half = Expr::new(
            ExprKind::Call {
                name: "pow".into(),
                args: vec![ident("x"), Expr::float(0.5, Span::default())],
                is_constructor: false,
                is_builtin: true,
            },
            Span::default(),
        );
        assert!(reduce_one(&mut pow_half, &int_typed));
        assert!(matches!(&pow_half.kind, ExprKind::Call { name, .. } if name == "sqrt"));
    }

    #[test]
    fn float_division_becomes_reciprocal_multiply() {
        let int_typed = |_: &Expr| false;
        let mut e = binary(BinaryOp::Div, ident("x"), Expr::float(4.0, Span::default()));
        assert!(reduce_one(&mut e, &int_typed));
        let ExprKind::Binary { op, rhs, .. } = &e.kind else {
            panic!()
        };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(rhs.kind, ExprKind::FloatLit(v) if v == 0.25));
    }

    #[test]
    fn integer_shift_reduction_needs_int_type() {
        let int_typed = |e: &Expr| matches!(&e.kind, ExprKind::Ident(n) if n == "i");
        let mut int_mul = binary(BinaryOp::Mul, ident("i"), Expr::int(8, Span::default()));
        assert!(reduce_one(&mut int_mul, &int_typed));
        let ExprKind::Binary { op, rhs, .. } = &int_mul.kind else {
            panic!()
        };
        assert_eq!(*op, BinaryOp::Shl);
        assert!(matches!(rhs.kind, ExprKind::IntLit(3)));

        // A float identifier is left alone.
        let mut float_mul = binary(BinaryOp::Mul, ident("g"), Expr::int(8, Span::default()));
        assert!(!reduce_one(&mut float_mul, &int_typed));
    }
}
