//! Variable inlining: a local used exactly once, never reassigned, with a
//! simple side-effect-free initializer is folded into its single use.

use crate::analysis::{OptContext, expr_is_pure};
use crate::fold::rewrite_exprs;
use crate::Pass;
use ahash::AHashMap;
use prism_ast::{DeclKind, Expr, ExprKind, Shader, Stmt, StmtKind};
use tracing::trace;

/// Literal, identifier, unary/binary over simple operands, or a
/// constructor/builtin call of at most four simple arguments.
fn is_simple(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::IntLit(_)
        | ExprKind::UintLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::DoubleLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::Ident(_) => true,
        ExprKind::Unary { operand, .. } => is_simple(operand),
        ExprKind::Binary { lhs, rhs, .. } => is_simple(lhs) && is_simple(rhs),
        ExprKind::Member { object, .. } => is_simple(object),
        ExprKind::Call {
            args,
            is_constructor,
            is_builtin,
            ..
        } => (*is_constructor || *is_builtin) && args.len() <= 4 && args.iter().all(is_simple),
        _ => false,
    }
}

/// Every identifier inside the initializer must itself be stable (never
/// written), or moving the expression to the use site changes its value.
fn operands_stable(expr: &Expr, cx: &OptContext) -> bool {
    match &expr.kind {
        ExprKind::Ident(name) => cx.is_stable_name(name),
        ExprKind::Unary { operand, .. } => operands_stable(operand, cx),
        ExprKind::Binary { lhs, rhs, .. } => operands_stable(lhs, cx) && operands_stable(rhs, cx),
        ExprKind::Member { object, .. } => operands_stable(object, cx),
        ExprKind::Call { args, .. } => args.iter().all(|a| operands_stable(a, cx)),
        _ => true,
    }
}

pub struct VariableInlining;

impl Pass for VariableInlining {
    fn name(&self) -> &'static str {
        "variable-inlining"
    }
    fn priority(&self) -> i32 {
        60
    }
    fn min_level(&self) -> u8 {
        2
    }

    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool {
        // Collect candidates, then remove their declarations.
        let mut candidates: AHashMap<String, Expr> = AHashMap::new();
        let mut changed = false;
        for decl in &mut shader.decls {
            if let DeclKind::Function(f) = &mut decl.kind {
                if let Some(body) = &mut f.body {
                    changed |= collect_and_remove(body, cx, &mut candidates);
                }
            }
        }
        if candidates.is_empty() {
            return changed;
        }
        // Candidates may reference one another (`b`'s initializer reads
        // `a`, itself a candidate). Resolve transitively so no substituted
        // expression mentions a removed declaration; declaration order
        // makes this acyclic.
        let names: Vec<String> = candidates.keys().cloned().collect();
        for name in &names {
            let mut init = candidates[name.as_str()].clone();
            while substitute(&mut init, &candidates, name) {}
            candidates.insert(name.clone(), init);
        }
        // Replace the single read of each candidate.
        rewrite_exprs(shader, &mut |expr| {
            let ExprKind::Ident(name) = &expr.kind else {
                return false;
            };
            let Some(init) = candidates.get(name.as_str()) else {
                return false;
            };
            trace!(target: "optimizer", name = name.as_str(), "inline_single_use");
            *expr = init.clone();
            true
        }) || changed
    }
}

/// Replace candidate identifiers inside `expr` with their initializers.
/// `skip` guards against a name substituting into itself.
fn substitute(expr: &mut Expr, candidates: &AHashMap<String, Expr>, skip: &str) -> bool {
    match &mut expr.kind {
        ExprKind::Ident(name) => {
            if name != skip {
                if let Some(init) = candidates.get(name.as_str()) {
                    *expr = init.clone();
                    return true;
                }
            }
            false
        }
        ExprKind::Unary { operand, .. } => substitute(operand, candidates, skip),
        ExprKind::Binary { lhs, rhs, .. } => {
            let a = substitute(lhs, candidates, skip);
            let b = substitute(rhs, candidates, skip);
            a || b
        }
        ExprKind::Member { object, .. } => substitute(object, candidates, skip),
        ExprKind::Call { args, .. } => {
            let mut changed = false;
            for arg in args {
                changed |= substitute(arg, candidates, skip);
            }
            changed
        }
        _ => false,
    }
}

fn collect_and_remove(
    stmt: &mut Stmt,
    cx: &OptContext,
    candidates: &mut AHashMap<String, Expr>,
) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts.iter_mut() {
                changed |= collect_and_remove(s, cx, candidates);
            }
        }
        StmtKind::Decl(vars) => {
            let before = vars.len();
            vars.retain(|var| {
                let usage = cx.usage_of(&var.name);
                let Some(init) = &var.init else { return true };
                let inlinable = usage.reads == 1
                    && usage.writes == 0
                    && usage.decls == 1
                    && var.name_array_dims.is_empty()
                    && is_simple(init)
                    && expr_is_pure(init)
                    && operands_stable(init, cx);
                if inlinable {
                    candidates.insert(var.name.clone(), init.clone());
                }
                !inlinable
            });
            if vars.len() != before {
                changed = true;
            }
            if vars.is_empty() {
                stmt.kind = StmtKind::Empty;
            }
        }
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            changed |= collect_and_remove(then_branch, cx, candidates);
            if let Some(e) = else_branch {
                changed |= collect_and_remove(e, cx, candidates);
            }
        }
        // Loop bodies execute more than once; a declaration inside one is
        // re-initialized per iteration and stays put. The `for` initializer
        // runs once but its variable is usually the induction variable, so
        // it stays as well.
        StmtKind::For { .. } | StmtKind::While { .. } | StmtKind::DoWhile { .. } => {}
        StmtKind::Switch { body, .. } => {
            for s in body.iter_mut() {
                changed |= collect_and_remove(s, cx, candidates);
            }
        }
        _ => {}
    }
    changed
}
