//! Control-flow cleanup: dead branches, unreachable code, empty blocks and
//! if-inversion.

use crate::analysis::{OptContext, expr_is_pure};
use crate::Pass;
use prism_ast::{DeclKind, Expr, ExprKind, Shader, Stmt, StmtKind, UnaryOp};

fn for_each_body(shader: &mut Shader, f: &mut impl FnMut(&mut Stmt) -> bool) -> bool {
    let mut changed = false;
    for decl in &mut shader.decls {
        if let DeclKind::Function(func) = &mut decl.kind {
            if let Some(body) = &mut func.body {
                changed |= f(body);
            }
        }
    }
    changed
}

/// A statement list contains no declarations, so splicing it into the
/// enclosing block cannot capture or collide names.
fn splice_safe(stmts: &[Stmt]) -> bool {
    !stmts.iter().any(|s| matches!(s.kind, StmtKind::Decl(_)))
}

// -------------------------------------------------------------------------------------------------
// Dead-branch elimination (level 1)
// -------------------------------------------------------------------------------------------------

pub struct DeadBranchElimination;

impl Pass for DeadBranchElimination {
    fn name(&self) -> &'static str {
        "dead-branch-elimination"
    }
    fn priority(&self) -> i32 {
        70
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        for_each_body(shader, &mut eliminate_in_stmt)
    }
}

fn eliminate_in_stmt(stmt: &mut Stmt) -> bool {
    let mut changed = false;
    // Recurse first so nested literal conditions resolve bottom-up.
    match &mut stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts.iter_mut() {
                changed |= eliminate_in_stmt(s);
            }
            changed |= splice_blocks(stmts);
        }
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            changed |= eliminate_in_stmt(then_branch);
            if let Some(e) = else_branch {
                changed |= eliminate_in_stmt(e);
            }
        }
        StmtKind::For { body, init, .. } => {
            if let Some(i) = init {
                changed |= eliminate_in_stmt(i);
            }
            changed |= eliminate_in_stmt(body);
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= eliminate_in_stmt(body);
        }
        StmtKind::Switch { body, .. } => {
            for s in body.iter_mut() {
                changed |= eliminate_in_stmt(s);
            }
        }
        _ => {}
    }

    let replacement: Option<StmtKind> = match &mut stmt.kind {
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => match cond.literal_bool() {
            Some(true) => Some(std::mem::replace(&mut then_branch.kind, StmtKind::Empty)),
            Some(false) => match else_branch {
                Some(e) => Some(std::mem::replace(&mut e.kind, StmtKind::Empty)),
                None => Some(StmtKind::Empty),
            },
            None => None,
        },
        StmtKind::While { cond, .. } if cond.literal_bool() == Some(false) => {
            Some(StmtKind::Empty)
        }
        _ => None,
    };
    if let Some(kind) = replacement {
        stmt.kind = kind;
        return true;
    }
    changed
}

/// Inline taken branches (now plain block statements) into their parent
/// list, when that cannot move declarations across scopes.
fn splice_blocks(stmts: &mut Vec<Stmt>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < stmts.len() {
        let replace = match &stmts[i].kind {
            StmtKind::Block(inner) if splice_safe(inner) => true,
            _ => false,
        };
        if replace {
            let StmtKind::Block(inner) = std::mem::replace(&mut stmts[i].kind, StmtKind::Empty)
            else {
                unreachable!()
            };
            stmts.splice(i..=i, inner);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

// -------------------------------------------------------------------------------------------------
// Unreachable-code elimination (level 1)
// -------------------------------------------------------------------------------------------------

pub struct UnreachableCodeElimination;

impl Pass for UnreachableCodeElimination {
    fn name(&self) -> &'static str {
        "unreachable-code-elimination"
    }
    fn priority(&self) -> i32 {
        65
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        for_each_body(shader, &mut prune_stmt)
    }
}

fn prune_stmt(stmt: &mut Stmt) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Block(stmts) => changed |= prune_list(stmts, false),
        StmtKind::Switch { body, .. } => changed |= prune_list(body, true),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            changed |= prune_stmt(then_branch);
            if let Some(e) = else_branch {
                changed |= prune_stmt(e);
            }
        }
        StmtKind::For { body, .. }
        | StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. } => changed |= prune_stmt(body),
        _ => {}
    }
    changed
}

/// Remove statements after a terminator. In switch bodies a following case
/// label restores reachability.
fn prune_list(stmts: &mut Vec<Stmt>, switch_body: bool) -> bool {
    let mut changed = false;
    for s in stmts.iter_mut() {
        changed |= prune_stmt(s);
    }
    let mut unreachable = false;
    let before = stmts.len();
    stmts.retain(|s| {
        if switch_body && matches!(s.kind, StmtKind::Case { .. }) {
            unreachable = false;
        }
        let keep = !unreachable;
        if s.is_terminator() {
            unreachable = true;
        }
        keep
    });
    changed | (stmts.len() != before)
}

// -------------------------------------------------------------------------------------------------
// Empty-block removal / if-inversion (level 1)
// -------------------------------------------------------------------------------------------------

pub struct BlockCleanup;

impl Pass for BlockCleanup {
    fn name(&self) -> &'static str {
        "block-cleanup"
    }
    fn priority(&self) -> i32 {
        50
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        for_each_body(shader, &mut cleanup_stmt)
    }
}

fn is_effectively_empty(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Empty => true,
        StmtKind::Block(stmts) => stmts.iter().all(is_effectively_empty),
        _ => false,
    }
}

fn invert(cond: Expr) -> Expr {
    let span = cond.span;
    // Prefer peeling an existing negation over stacking one.
    if let ExprKind::Unary {
        op: UnaryOp::Not,
        operand,
        prefix: true,
    } = cond.kind
    {
        return *operand;
    }
    Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(cond),
            prefix: true,
        },
        span,
    )
}

fn cleanup_stmt(stmt: &mut Stmt) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts.iter_mut() {
                changed |= cleanup_stmt(s);
            }
            let before = stmts.len();
            stmts.retain(|s| !matches!(s.kind, StmtKind::Empty));
            changed |= stmts.len() != before;
        }
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            changed |= cleanup_stmt(then_branch);
            if let Some(e) = else_branch {
                changed |= cleanup_stmt(e);
            }
        }
        StmtKind::For { body, .. }
        | StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. } => changed |= cleanup_stmt(body),
        StmtKind::Switch { body, .. } => {
            for s in body.iter_mut() {
                changed |= cleanup_stmt(s);
            }
        }
        _ => {}
    }

    // Restructure the node itself.
    let rebuilt: Option<StmtKind> = match &mut stmt.kind {
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let then_empty = is_effectively_empty(then_branch);
            let else_empty = else_branch.as_deref().map(is_effectively_empty);
            match (then_empty, else_empty) {
                // Both arms empty: the whole statement goes when the
                // condition cannot have effects.
                (true, None | Some(true)) if expr_is_pure(cond) => Some(StmtKind::Empty),
                // `if (c) {} else s` -> `if (!c) s`.
                (true, Some(false)) => {
                    let cond = invert(std::mem::replace(
                        cond,
                        Expr::bool(false, prism_ast::Span::default()),
                    ));
                    let else_stmt = else_branch.take().map(|b| *b).unwrap_or_else(|| {
                        Stmt::empty(prism_ast::Span::default())
                    });
                    Some(StmtKind::If {
                        cond,
                        then_branch: Box::new(else_stmt),
                        else_branch: None,
                    })
                }
                // An empty else arm is dropped.
                (false, Some(true)) => {
                    *else_branch = None;
                    return true;
                }
                _ => None,
            }
        }
        _ => None,
    };
    if let Some(kind) = rebuilt {
        stmt.kind = kind;
        return true;
    }
    changed
}
