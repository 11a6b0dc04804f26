//! Constant propagation and constant folding.

use crate::analysis::OptContext;
use crate::Pass;
use prism_ast::builtins::{PURE_MATH_1, PURE_MATH_2, PURE_MATH_3};
use prism_ast::{BinaryOp, Expr, ExprKind, Shader, UnaryOp};

/// Apply `f` to every expression in the shader, post-order. Returns whether
/// any application reported a change.
pub(crate) fn rewrite_exprs(shader: &mut Shader, f: &mut impl FnMut(&mut Expr) -> bool) -> bool {
    use prism_ast::{DeclKind, Stmt, StmtKind};
    fn walk_expr(expr: &mut Expr, f: &mut impl FnMut(&mut Expr) -> bool) -> bool {
        let mut changed = false;
        match &mut expr.kind {
            ExprKind::Binary { lhs, rhs, .. } => {
                changed |= walk_expr(lhs, f);
                changed |= walk_expr(rhs, f);
            }
            ExprKind::Unary { operand, .. } => changed |= walk_expr(operand, f),
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                changed |= walk_expr(cond, f);
                changed |= walk_expr(then_expr, f);
                changed |= walk_expr(else_expr, f);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    changed |= walk_expr(arg, f);
                }
            }
            ExprKind::Member { object, .. } => changed |= walk_expr(object, f),
            ExprKind::Index { base, index } => {
                changed |= walk_expr(base, f);
                changed |= walk_expr(index, f);
            }
            ExprKind::InitList(items) => {
                for item in items {
                    changed |= walk_expr(item, f);
                }
            }
            _ => {}
        }
        changed | f(expr)
    }
    fn walk_stmt(stmt: &mut Stmt, f: &mut impl FnMut(&mut Expr) -> bool) -> bool {
        let mut changed = false;
        match &mut stmt.kind {
            StmtKind::Block(stmts) => {
                for s in stmts {
                    changed |= walk_stmt(s, f);
                }
            }
            StmtKind::Expr(e) => changed |= walk_expr(e, f),
            StmtKind::Decl(vars) => {
                for var in vars {
                    if let Some(init) = &mut var.init {
                        changed |= walk_expr(init, f);
                    }
                }
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                changed |= walk_expr(cond, f);
                changed |= walk_stmt(then_branch, f);
                if let Some(e) = else_branch {
                    changed |= walk_stmt(e, f);
                }
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(i) = init {
                    changed |= walk_stmt(i, f);
                }
                if let Some(c) = cond {
                    changed |= walk_expr(c, f);
                }
                if let Some(s) = step {
                    changed |= walk_expr(s, f);
                }
                changed |= walk_stmt(body, f);
            }
            StmtKind::While { cond, body } => {
                changed |= walk_expr(cond, f);
                changed |= walk_stmt(body, f);
            }
            StmtKind::DoWhile { body, cond } => {
                changed |= walk_stmt(body, f);
                changed |= walk_expr(cond, f);
            }
            StmtKind::Switch { subject, body } => {
                changed |= walk_expr(subject, f);
                for s in body {
                    changed |= walk_stmt(s, f);
                }
            }
            StmtKind::Case { label } => {
                if let Some(l) = label {
                    changed |= walk_expr(l, f);
                }
            }
            StmtKind::Return(value) => {
                if let Some(v) = value {
                    changed |= walk_expr(v, f);
                }
            }
            _ => {}
        }
        changed
    }
    let mut changed = false;
    for decl in &mut shader.decls {
        match &mut decl.kind {
            DeclKind::Variable(var) => {
                if let Some(init) = &mut var.init {
                    changed |= walk_expr(init, f);
                }
            }
            DeclKind::Function(func) => {
                if let Some(body) = &mut func.body {
                    changed |= walk_stmt(body, f);
                }
            }
            _ => {}
        }
    }
    changed
}

// -------------------------------------------------------------------------------------------------
// Constant propagation (level 2)
// -------------------------------------------------------------------------------------------------

pub struct ConstantPropagation;

impl Pass for ConstantPropagation {
    fn name(&self) -> &'static str {
        "constant-propagation"
    }
    fn priority(&self) -> i32 {
        90
    }
    fn min_level(&self) -> u8 {
        2
    }
    fn should_run(&self, cx: &OptContext) -> bool {
        !cx.constants.is_empty()
    }

    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool {
        let constants = cx.constants.clone();
        rewrite_exprs(shader, &mut |expr| {
            let ExprKind::Ident(name) = &expr.kind else {
                return false;
            };
            let Some(value) = constants.get(name.as_str()) else {
                return false;
            };
            expr.kind = value.clone();
            true
        })
    }
}

// -------------------------------------------------------------------------------------------------
// Constant folding (level 1)
// -------------------------------------------------------------------------------------------------

pub struct ConstantFolding;

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }
    fn priority(&self) -> i32 {
        85
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        rewrite_exprs(shader, &mut fold_one)
    }
}

fn fold_one(expr: &mut Expr) -> bool {
    let folded = match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => fold_binary(*op, lhs, rhs),
        ExprKind::Unary {
            op,
            operand,
            prefix: true,
        } => fold_unary(*op, operand),
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => cond.literal_bool().map(|b| {
            if b {
                then_expr.kind.clone()
            } else {
                else_expr.kind.clone()
            }
        }),
        ExprKind::Call {
            name,
            args,
            is_builtin: true,
            ..
        } => fold_builtin_call(name, args),
        _ => None,
    };
    match folded {
        Some(kind) => {
            expr.kind = kind;
            true
        }
        None => false,
    }
}

fn both_ints(lhs: &Expr, rhs: &Expr) -> Option<(i64, i64)> {
    match (&lhs.kind, &rhs.kind) {
        (ExprKind::IntLit(a), ExprKind::IntLit(b)) => Some((*a, *b)),
        _ => None,
    }
}

fn fold_binary(op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<ExprKind> {
    if !lhs.is_literal() || !rhs.is_literal() {
        return None;
    }
    // Boolean algebra on literal bools.
    if let (Some(a), Some(b)) = (lhs.literal_bool(), rhs.literal_bool()) {
        return Some(match op {
            BinaryOp::LogicalAnd => ExprKind::BoolLit(a && b),
            BinaryOp::LogicalOr => ExprKind::BoolLit(a || b),
            BinaryOp::LogicalXor => ExprKind::BoolLit(a != b),
            BinaryOp::Eq => ExprKind::BoolLit(a == b),
            BinaryOp::Ne => ExprKind::BoolLit(a != b),
            _ => return None,
        });
    }
    // Integer semantics when both sides are ints.
    if let Some((a, b)) = both_ints(lhs, rhs) {
        let int = |v: i64| Some(ExprKind::IntLit(v));
        return match op {
            BinaryOp::Add => int(a.wrapping_add(b)),
            BinaryOp::Sub => int(a.wrapping_sub(b)),
            BinaryOp::Mul => int(a.wrapping_mul(b)),
            BinaryOp::Div => a.checked_div(b).and_then(int),
            BinaryOp::Mod => a.checked_rem(b).and_then(int),
            BinaryOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)).and_then(int),
            BinaryOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)).and_then(int),
            BinaryOp::BitAnd => int(a & b),
            BinaryOp::BitOr => int(a | b),
            BinaryOp::BitXor => int(a ^ b),
            BinaryOp::Eq => Some(ExprKind::BoolLit(a == b)),
            BinaryOp::Ne => Some(ExprKind::BoolLit(a != b)),
            BinaryOp::Lt => Some(ExprKind::BoolLit(a < b)),
            BinaryOp::Gt => Some(ExprKind::BoolLit(a > b)),
            BinaryOp::Le => Some(ExprKind::BoolLit(a <= b)),
            BinaryOp::Ge => Some(ExprKind::BoolLit(a >= b)),
            _ => None,
        };
    }
    // Unsigned semantics when both sides are uints.
    if let (ExprKind::UintLit(a), ExprKind::UintLit(b)) = (&lhs.kind, &rhs.kind) {
        let (a, b) = (*a, *b);
        let uint = |v: u64| Some(ExprKind::UintLit(v));
        return match op {
            BinaryOp::Add => uint(a.wrapping_add(b)),
            BinaryOp::Sub => uint(a.wrapping_sub(b)),
            BinaryOp::Mul => uint(a.wrapping_mul(b)),
            BinaryOp::Div => a.checked_div(b).and_then(uint),
            BinaryOp::Mod => a.checked_rem(b).and_then(uint),
            BinaryOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)).and_then(uint),
            BinaryOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)).and_then(uint),
            BinaryOp::BitAnd => uint(a & b),
            BinaryOp::BitOr => uint(a | b),
            BinaryOp::BitXor => uint(a ^ b),
            BinaryOp::Eq => Some(ExprKind::BoolLit(a == b)),
            BinaryOp::Ne => Some(ExprKind::BoolLit(a != b)),
            BinaryOp::Lt => Some(ExprKind::BoolLit(a < b)),
            BinaryOp::Gt => Some(ExprKind::BoolLit(a > b)),
            BinaryOp::Le => Some(ExprKind::BoolLit(a <= b)),
            BinaryOp::Ge => Some(ExprKind::BoolLit(a >= b)),
            _ => None,
        };
    }
    // A lone unsigned literal never folds into a float result.
    if matches!(lhs.kind, ExprKind::UintLit(_)) || matches!(rhs.kind, ExprKind::UintLit(_)) {
        return None;
    }
    // Mixed numeric folds under float semantics.
    let a = lhs.literal_number()?;
    let b = rhs.literal_number()?;
    let float = |v: f64| Some(ExprKind::FloatLit(v));
    match op {
        BinaryOp::Add => float(a + b),
        BinaryOp::Sub => float(a - b),
        BinaryOp::Mul => float(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                None
            } else {
                float(a / b)
            }
        }
        BinaryOp::Eq => Some(ExprKind::BoolLit(a == b)),
        BinaryOp::Ne => Some(ExprKind::BoolLit(a != b)),
        BinaryOp::Lt => Some(ExprKind::BoolLit(a < b)),
        BinaryOp::Gt => Some(ExprKind::BoolLit(a > b)),
        BinaryOp::Le => Some(ExprKind::BoolLit(a <= b)),
        BinaryOp::Ge => Some(ExprKind::BoolLit(a >= b)),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, operand: &Expr) -> Option<ExprKind> {
    match (op, &operand.kind) {
        (UnaryOp::Neg, ExprKind::IntLit(v)) => Some(ExprKind::IntLit(v.wrapping_neg())),
        (UnaryOp::Neg, ExprKind::FloatLit(v)) => Some(ExprKind::FloatLit(-v)),
        (UnaryOp::Neg, ExprKind::DoubleLit(v)) => Some(ExprKind::DoubleLit(-v)),
        (UnaryOp::Plus, kind) if operand.is_literal() => Some(kind.clone()),
        (UnaryOp::Not, ExprKind::BoolLit(b)) => Some(ExprKind::BoolLit(!b)),
        (UnaryOp::BitNot, ExprKind::IntLit(v)) => Some(ExprKind::IntLit(!v)),
        _ => None,
    }
}

fn fold_builtin_call(name: &str, args: &[Expr]) -> Option<ExprKind> {
    if !args.iter().all(|a| a.is_literal()) {
        return None;
    }
    let ints: Option<Vec<i64>> = args.iter().map(|a| a.literal_int()).collect();
    let all_int_args = args
        .iter()
        .all(|a| matches!(a.kind, ExprKind::IntLit(_) | ExprKind::UintLit(_)));
    // Integer-preserving builtins keep integer results.
    if all_int_args && matches!(name, "abs" | "sign" | "min" | "max" | "clamp") {
        let v = ints?;
        return match (name, v.as_slice()) {
            ("abs", [a]) => Some(ExprKind::IntLit(a.wrapping_abs())),
            ("sign", [a]) => Some(ExprKind::IntLit(a.signum())),
            ("min", [a, b]) => Some(ExprKind::IntLit(*a.min(b))),
            ("max", [a, b]) => Some(ExprKind::IntLit(*a.max(b))),
            ("clamp", [x, lo, hi]) => Some(ExprKind::IntLit((*x).clamp(*lo, *hi))),
            _ => None,
        };
    }
    let nums: Option<Vec<f64>> = args.iter().map(|a| a.literal_number()).collect();
    let v = nums?;
    let result = match (name, v.as_slice()) {
        (_, [x]) if PURE_MATH_1.contains(&name) => eval_math_1(name, *x)?,
        (_, [x, y]) if PURE_MATH_2.contains(&name) => eval_math_2(name, *x, *y)?,
        (_, [x, y, z]) if PURE_MATH_3.contains(&name) => eval_math_3(name, *x, *y, *z)?,
        _ => return None,
    };
    if !result.is_finite() {
        return None;
    }
    Some(ExprKind::FloatLit(result))
}

fn eval_math_1(name: &str, x: f64) -> Option<f64> {
    Some(match name {
        "abs" => x.abs(),
        "sign" => {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "round" => x.round(),
        "trunc" => x.trunc(),
        "fract" => x - x.floor(),
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => x.asin(),
        "acos" => x.acos(),
        "atan" => x.atan(),
        "sinh" => x.sinh(),
        "cosh" => x.cosh(),
        "tanh" => x.tanh(),
        "exp" => x.exp(),
        "log" => {
            if x <= 0.0 {
                return None;
            }
            x.ln()
        }
        "exp2" => x.exp2(),
        "log2" => {
            if x <= 0.0 {
                return None;
            }
            x.log2()
        }
        "sqrt" => {
            if x < 0.0 {
                return None;
            }
            x.sqrt()
        }
        "inversesqrt" => {
            if x <= 0.0 {
                return None;
            }
            1.0 / x.sqrt()
        }
        "radians" => x.to_radians(),
        "degrees" => x.to_degrees(),
        _ => return None,
    })
}

fn eval_math_2(name: &str, x: f64, y: f64) -> Option<f64> {
    Some(match name {
        "pow" => x.powf(y),
        "mod" => {
            if y == 0.0 {
                return None;
            }
            x - y * (x / y).floor()
        }
        "min" => x.min(y),
        "max" => x.max(y),
        "atan" => x.atan2(y),
        "step" => {
            if y < x {
                0.0
            } else {
                1.0
            }
        }
        "distance" => (x - y).abs(),
        _ => return None,
    })
}

fn eval_math_3(name: &str, x: f64, y: f64, z: f64) -> Option<f64> {
    Some(match name {
        "clamp" => x.clamp(y, z),
        "mix" => x * (1.0 - z) + y * z,
        "smoothstep" => {
            if x >= y {
                return None;
            }
            let t = ((z - x) / (y - x)).clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t)
        }
        "fma" => x.mul_add(y, z),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_ast::Span;

    fn int(v: i64) -> Expr {
        Expr::int(v, Span::default())
    }

    fn float(v: f64) -> Expr {
        Expr::float(v, Span::default())
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

    #[test]
    fn integer_arithmetic_folds_bottom_up() {
        let mut inner = binary(BinaryOp::Mul, int(3), int(4));
        assert!(fold_one(&mut inner));
        let mut e = binary(BinaryOp::Add, int(2), inner);
        assert!(fold_one(&mut e));
        assert!(matches!(e.kind, ExprKind::IntLit(14)));
    }

    #[test]
    fn division_by_zero_refuses() {
        let mut e = binary(BinaryOp::Div, int(1), int(0));
        assert!(!fold_one(&mut e));
        let mut f = binary(BinaryOp::Div, float(1.0), float(0.0));
        assert!(!fold_one(&mut f));
    }

    #[test]
    fn log_of_non_positive_refuses() {
        let mut call = Expr::new(
            ExprKind::Call {
                name: "log".into(),
                args: vec![float(-1.0)],
                is_constructor: false,
                is_builtin: true,
            },
            Span::default(),
        );
        assert!(!fold_one(&mut call));
    }

    #[test]
    fn builtin_math_folds() {
        let mut call = Expr::new(
            ExprKind::Call {
                name: "sqrt".into(),
                args: vec![float(16.0)],
                is_constructor: false,
                is_builtin: true,
            },
            Span::default(),
        );
        assert!(fold_one(&mut call));
        assert!(matches!(call.kind, ExprKind::FloatLit(v) if v == 4.0));
    }

    #[test]
    fn integer_min_max_stay_integer() {
        let mut call = Expr::new(
            ExprKind::Call {
                name: "max".into(),
                args: vec![int(3), int(7)],
                is_constructor: false,
                is_builtin: true,
            },
            Span::default(),
        );
        assert!(fold_one(&mut call));
        assert!(matches!(call.kind, ExprKind::IntLit(7)));
    }

    #[test]
    fn literal_bool_ternary_folds() {
        let mut e = Expr::new(
            ExprKind::Ternary {
                cond: Box::new(Expr::bool(false, Span::default())),
                then_expr: Box::new(int(1)),
                else_expr: Box::new(int(2)),
            },
            Span::default(),
        );
        assert!(fold_one(&mut e));
        assert!(matches!(e.kind, ExprKind::IntLit(2)));
    }

    #[test]
    fn folding_is_idempotent() {
        let mut e = binary(BinaryOp::Mul, int(6), int(7));
        assert!(fold_one(&mut e));
        assert!(!fold_one(&mut e));
        assert!(matches!(e.kind, ExprKind::IntLit(42)));
    }

    #[test]
    fn comparisons_fold_to_bools() {
        let mut e = binary(BinaryOp::Lt, int(1), int(2));
        assert!(fold_one(&mut e));
        assert!(matches!(e.kind, ExprKind::BoolLit(true)));
        let mut f = binary(BinaryOp::Ge, float(0.5), float(1.5));
        assert!(fold_one(&mut f));
        assert!(matches!(f.kind, ExprKind::BoolLit(false)));
    }
}
