//! Usage and constant analysis, plus the purity queries every transform
//! pass leans on.

use crate::Pass;
use ahash::{AHashMap, AHashSet};
use prism_ast::builtins::is_pure_builtin;
use prism_ast::{
    BaseType, BinaryOp, DeclKind, Expr, ExprKind, ExprKind as EK, Shader, Stmt, StmtKind,
    StorageQualifier, UnaryOp, VarDecl,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub reads: u32,
    pub writes: u32,
    /// Declared base type when the analysis saw the declaration; drives the
    /// integer-only strength reductions.
    pub base: Option<BaseType>,
    /// How many declarations share this name (shadowing); name-keyed
    /// bookkeeping is only trusted when this is 1.
    pub decls: u32,
}

impl Usage {
    pub fn use_count(&self) -> u32 {
        self.reads + self.writes
    }
}

/// Shared pass state, refreshed by the analysis passes each iteration.
#[derive(Debug)]
pub struct OptContext {
    pub level: u8,
    pub usage: AHashMap<String, Usage>,
    pub calls: AHashMap<String, u32>,
    /// `const`-declared names with literal initializers, for propagation.
    pub constants: AHashMap<String, ExprKind>,
    /// Names of user-declared functions (assumed impure).
    pub user_functions: AHashSet<String>,
}

impl OptContext {
    pub fn new(level: u8) -> Self {
        Self {
            level,
            usage: AHashMap::new(),
            calls: AHashMap::new(),
            constants: AHashMap::new(),
            user_functions: AHashSet::new(),
        }
    }

    pub fn usage_of(&self, name: &str) -> Usage {
        self.usage.get(name).copied().unwrap_or_default()
    }

    pub fn call_count(&self, name: &str) -> u32 {
        self.calls.get(name).copied().unwrap_or(0)
    }

    /// A name is never written after its initializer (and unambiguous).
    pub fn is_stable_name(&self, name: &str) -> bool {
        let u = self.usage_of(name);
        u.writes == 0 && u.decls <= 1
    }
}

/// Side-effect-free? Calls to pure builtins with pure arguments qualify;
/// user functions are assumed impure.
pub fn expr_is_pure(expr: &Expr) -> bool {
    match &expr.kind {
        EK::IntLit(_) | EK::UintLit(_) | EK::FloatLit(_) | EK::DoubleLit(_) | EK::BoolLit(_)
        | EK::Ident(_) => true,
        EK::Binary { op, lhs, rhs } => {
            !op.is_assignment() && expr_is_pure(lhs) && expr_is_pure(rhs)
        }
        EK::Unary { op, operand, .. } => {
            !matches!(op, UnaryOp::Inc | UnaryOp::Dec) && expr_is_pure(operand)
        }
        EK::Ternary {
            cond,
            then_expr,
            else_expr,
        } => expr_is_pure(cond) && expr_is_pure(then_expr) && expr_is_pure(else_expr),
        EK::Call {
            name,
            args,
            is_constructor,
            ..
        } => {
            (*is_constructor || is_pure_builtin(name)) && args.iter().all(expr_is_pure)
        }
        EK::Member { object, .. } => expr_is_pure(object),
        EK::Index { base, index } => expr_is_pure(base) && expr_is_pure(index),
        EK::InitList(items) => items.iter().all(expr_is_pure),
    }
}

/// The identifier ultimately written by an assignment target
/// (`v.xyz[i] = ...` writes `v`).
fn lhs_root_name(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        EK::Ident(name) => Some(name),
        EK::Member { object, .. } => lhs_root_name(object),
        EK::Index { base, .. } => lhs_root_name(base),
        _ => None,
    }
}

// -------------------------------------------------------------------------------------------------
// Usage analysis
// -------------------------------------------------------------------------------------------------

pub struct UsageAnalysis;

impl Pass for UsageAnalysis {
    fn name(&self) -> &'static str {
        "usage-analysis"
    }
    fn priority(&self) -> i32 {
        100
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool {
        cx.usage.clear();
        cx.calls.clear();
        cx.user_functions.clear();
        for decl in &shader.decls {
            match &decl.kind {
                DeclKind::Variable(var) => {
                    record_decl(cx, var);
                    if let Some(init) = &var.init {
                        count_expr(cx, init, false);
                    }
                }
                DeclKind::Function(f) => {
                    cx.user_functions.insert(f.name.clone());
                    if let Some(body) = &f.body {
                        count_stmt(cx, body);
                    }
                }
                DeclKind::Struct(s) => {
                    if let Some(instance) = &s.instance {
                        record_decl(cx, instance);
                    }
                }
                _ => {}
            }
        }
        false
    }
}

fn record_decl(cx: &mut OptContext, var: &VarDecl) {
    let entry = cx.usage.entry(var.name.clone()).or_default();
    entry.decls += 1;
    entry.base = Some(var.ty.base);
}

fn count_stmt(cx: &mut OptContext, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(stmts) => stmts.iter().for_each(|s| count_stmt(cx, s)),
        StmtKind::Expr(e) => count_expr(cx, e, false),
        StmtKind::Decl(vars) => {
            for var in vars {
                record_decl(cx, var);
                if let Some(init) = &var.init {
                    count_expr(cx, init, false);
                }
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            count_expr(cx, cond, false);
            count_stmt(cx, then_branch);
            if let Some(e) = else_branch {
                count_stmt(cx, e);
            }
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(i) = init {
                count_stmt(cx, i);
            }
            if let Some(c) = cond {
                count_expr(cx, c, false);
            }
            if let Some(s) = step {
                count_expr(cx, s, false);
            }
            count_stmt(cx, body);
        }
        StmtKind::While { cond, body } => {
            count_expr(cx, cond, false);
            count_stmt(cx, body);
        }
        StmtKind::DoWhile { body, cond } => {
            count_stmt(cx, body);
            count_expr(cx, cond, false);
        }
        StmtKind::Switch { subject, body } => {
            count_expr(cx, subject, false);
            body.iter().for_each(|s| count_stmt(cx, s));
        }
        StmtKind::Case { label } => {
            if let Some(l) = label {
                count_expr(cx, l, false);
            }
        }
        StmtKind::Return(value) => {
            if let Some(v) = value {
                count_expr(cx, v, false);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::Empty => {}
    }
}

/// `as_write`: this expression is an assignment target.
fn count_expr(cx: &mut OptContext, expr: &Expr, as_write: bool) {
    match &expr.kind {
        ExprKind::Ident(name) => {
            let entry = cx.usage.entry(name.clone()).or_default();
            if as_write {
                entry.writes += 1;
            } else {
                entry.reads += 1;
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            if op.is_assignment() {
                if let Some(root) = lhs_root_name(lhs) {
                    let entry = cx.usage.entry(root.to_owned()).or_default();
                    entry.writes += 1;
                    // Compound assignments also read their target.
                    if *op != BinaryOp::Assign {
                        entry.reads += 1;
                    }
                    // Subscripts and swizzles inside the target still read
                    // whatever they index with.
                    count_lhs_subexprs(cx, lhs);
                } else {
                    count_expr(cx, lhs, false);
                }
                count_expr(cx, rhs, false);
            } else {
                count_expr(cx, lhs, as_write);
                count_expr(cx, rhs, false);
            }
        }
        ExprKind::Unary { op, operand, .. } => {
            if matches!(op, UnaryOp::Inc | UnaryOp::Dec) {
                // Increment and decrement count as both.
                if let Some(root) = lhs_root_name(operand) {
                    let entry = cx.usage.entry(root.to_owned()).or_default();
                    entry.reads += 1;
                    entry.writes += 1;
                    count_lhs_subexprs(cx, operand);
                    return;
                }
            }
            count_expr(cx, operand, false);
        }
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            count_expr(cx, cond, false);
            count_expr(cx, then_expr, false);
            count_expr(cx, else_expr, false);
        }
        ExprKind::Call {
            name,
            args,
            is_constructor,
            is_builtin,
        } => {
            if !is_constructor && !is_builtin {
                *cx.calls.entry(name.clone()).or_insert(0) += 1;
            }
            args.iter().for_each(|a| count_expr(cx, a, false));
        }
        ExprKind::Member { object, .. } => count_expr(cx, object, as_write),
        ExprKind::Index { base, index } => {
            count_expr(cx, base, as_write);
            count_expr(cx, index, false);
        }
        ExprKind::InitList(items) => items.iter().for_each(|i| count_expr(cx, i, false)),
        _ => {}
    }
}

/// Index expressions inside an assignment target are ordinary reads.
fn count_lhs_subexprs(cx: &mut OptContext, expr: &Expr) {
    match &expr.kind {
        ExprKind::Member { object, .. } => count_lhs_subexprs(cx, object),
        ExprKind::Index { base, index } => {
            count_expr(cx, index, false);
            count_lhs_subexprs(cx, base);
        }
        _ => {}
    }
}

// -------------------------------------------------------------------------------------------------
// Constant analysis
// -------------------------------------------------------------------------------------------------

pub struct ConstantAnalysis;

impl Pass for ConstantAnalysis {
    fn name(&self) -> &'static str {
        "constant-analysis"
    }
    fn priority(&self) -> i32 {
        95
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool {
        cx.constants.clear();
        for decl in &shader.decls {
            match &decl.kind {
                DeclKind::Variable(var) => note_const(cx, var),
                DeclKind::Function(f) => {
                    if let Some(body) = &f.body {
                        collect_consts(cx, body);
                    }
                }
                _ => {}
            }
        }
        false
    }
}

fn note_const(cx: &mut OptContext, var: &VarDecl) {
    if var.ty.qualifiers.storage != StorageQualifier::Const {
        return;
    }
    // Shadowed names are ambiguous under name keying; leave them alone.
    if cx.usage_of(&var.name).decls > 1 {
        return;
    }
    if let Some(init) = &var.init {
        if init.is_literal() {
            cx.constants.insert(var.name.clone(), init.kind.clone());
        }
    }
}

fn collect_consts(cx: &mut OptContext, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Block(stmts) => stmts.iter().for_each(|s| collect_consts(cx, s)),
        StmtKind::Decl(vars) => vars.iter().for_each(|v| note_const(cx, v)),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_consts(cx, then_branch);
            if let Some(e) = else_branch {
                collect_consts(cx, e);
            }
        }
        StmtKind::For { init, body, .. } => {
            if let Some(i) = init {
                collect_consts(cx, i);
            }
            collect_consts(cx, body);
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => collect_consts(cx, body),
        StmtKind::Switch { body, .. } => body.iter().for_each(|s| collect_consts(cx, s)),
        _ => {}
    }
}
