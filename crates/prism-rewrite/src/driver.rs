//! Rewrite driver: pre-passes, the post-order visitor, and the post-pass
//! that synthesizes declarations the rules requested.

use crate::context::{SyntheticGlobal, TranslationContext};
use crate::rule::{RewriteRule, RuleRegistry};
use prism_ast::{
    Decl, DeclKind, Expr, ExprKind, NodeFlags, Qualifiers, Shader, Span, Stmt, StmtKind,
    StorageQualifier, Type, VarDecl,
};
use prism_catalog::{Feature, feature_available, promoting_extension};
use smallvec::SmallVec;
use tracing::debug;

type ActiveRules<'a> = [&'a (dyn RewriteRule + Send + Sync)];

/// Run the full rewrite: sampler-map pre-pass, target-version assignment,
/// the rule pass, then output/extension synthesis.
pub fn translate(shader: &mut Shader, registry: &RuleRegistry, cx: &mut TranslationContext) {
    // Pre-pass 1: sampler-type map (downgrade rules consult it; none may
    // invalidate it).
    for var in shader.globals() {
        if var.ty.base.is_sampler() {
            cx.sampler_types.insert(var.name.clone(), var.ty.base);
        }
    }

    // Pre-pass 2: the root's version becomes the target.
    shader.version = cx.target_version;
    shader.profile = if cx.target_version.has_profile() {
        match shader.profile.take() {
            Some(p) if p == "compatibility" => Some(p),
            _ => Some("core".to_owned()),
        }
    } else {
        None
    };

    let active: Vec<&(dyn RewriteRule + Send + Sync)> = registry
        .rules()
        .iter()
        .filter(|r| r.applies(cx))
        .map(|r| r.as_ref())
        .collect();
    debug!(
        target: "rewrite",
        source = cx.source_version.code(),
        target_version = cx.target_version.code(),
        stage = cx.stage.name(),
        active_rules = active.len(),
        samplers = cx.sampler_types.len(),
        "translate_begin"
    );

    for decl in &mut shader.decls {
        visit_decl(decl, &active, cx);
    }

    postpass(shader, cx);
    debug!(
        target: "rewrite",
        warnings = cx.warnings.len(),
        errors = cx.errors.len(),
        extensions = cx.required_extensions.len(),
        "translate_end"
    );
}

// -------------------------------------------------------------------------------------------------
// Post-order visitor
// -------------------------------------------------------------------------------------------------

fn visit_decl(decl: &mut Decl, rules: &ActiveRules, cx: &mut TranslationContext) {
    match &mut decl.kind {
        DeclKind::Variable(var) => {
            if let Some(init) = &mut var.init {
                visit_expr(init, rules, cx);
            }
        }
        DeclKind::Function(f) => {
            if let Some(body) = &mut f.body {
                visit_stmt(body, rules, cx);
            }
        }
        _ => {}
    }
    for rule in rules {
        if decl.flags.contains(NodeFlags::DEAD) {
            break;
        }
        if rule.rewrite_decl(decl, cx) {
            decl.flags |= NodeFlags::MODIFIED;
        }
    }
}

fn visit_stmt(stmt: &mut Stmt, rules: &ActiveRules, cx: &mut TranslationContext) {
    match &mut stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts {
                visit_stmt(s, rules, cx);
            }
        }
        StmtKind::Switch { subject, body } => {
            visit_expr(subject, rules, cx);
            for s in body {
                visit_stmt(s, rules, cx);
            }
        }
        StmtKind::Expr(expr) => visit_expr(expr, rules, cx),
        StmtKind::Decl(vars) => {
            for var in vars {
                if let Some(init) = &mut var.init {
                    visit_expr(init, rules, cx);
                }
            }
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visit_expr(cond, rules, cx);
            visit_stmt(then_branch, rules, cx);
            if let Some(else_branch) = else_branch {
                visit_stmt(else_branch, rules, cx);
            }
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(init) = init {
                visit_stmt(init, rules, cx);
            }
            if let Some(cond) = cond {
                visit_expr(cond, rules, cx);
            }
            if let Some(step) = step {
                visit_expr(step, rules, cx);
            }
            visit_stmt(body, rules, cx);
        }
        StmtKind::While { cond, body } => {
            visit_expr(cond, rules, cx);
            visit_stmt(body, rules, cx);
        }
        StmtKind::DoWhile { body, cond } => {
            visit_stmt(body, rules, cx);
            visit_expr(cond, rules, cx);
        }
        StmtKind::Case { label } => {
            if let Some(label) = label {
                visit_expr(label, rules, cx);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visit_expr(value, rules, cx);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::Empty => {}
    }
    for rule in rules {
        if stmt.flags.contains(NodeFlags::DEAD) {
            break;
        }
        if rule.rewrite_stmt(stmt, cx) {
            stmt.flags |= NodeFlags::MODIFIED;
        }
    }
}

fn visit_expr(expr: &mut Expr, rules: &ActiveRules, cx: &mut TranslationContext) {
    match &mut expr.kind {
        ExprKind::Binary { lhs, rhs, .. } => {
            visit_expr(lhs, rules, cx);
            visit_expr(rhs, rules, cx);
        }
        ExprKind::Unary { operand, .. } => visit_expr(operand, rules, cx),
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            visit_expr(cond, rules, cx);
            visit_expr(then_expr, rules, cx);
            visit_expr(else_expr, rules, cx);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                visit_expr(arg, rules, cx);
            }
        }
        ExprKind::Member { object, .. } => visit_expr(object, rules, cx),
        ExprKind::Index { base, index } => {
            // The base of `gl_FragData[i]` is rewritten at the index node,
            // so identifiers under an index are only visited for their own
            // subexpressions.
            visit_expr(base, rules, cx);
            visit_expr(index, rules, cx);
        }
        ExprKind::InitList(items) => {
            for item in items {
                visit_expr(item, rules, cx);
            }
        }
        _ => {}
    }
    for rule in rules {
        if rule.rewrite_expr(expr, cx) {
            expr.flags |= NodeFlags::MODIFIED;
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Post-pass
// -------------------------------------------------------------------------------------------------

fn postpass(shader: &mut Shader, cx: &mut TranslationContext) {
    let mut synthesized: Vec<Decl> = Vec::new();

    // Replacements for removed legacy built-ins.
    for global in cx.generated_globals.clone() {
        if shader.symbols.lookup(&global.name).is_some() {
            continue;
        }
        synthesized.push(make_global(&global, cx));
    }

    // The synthesized primary fragment output.
    if cx.uses_frag_color && shader.symbols.lookup(&cx.frag_color_name).is_none() {
        let frag_color = SyntheticGlobal {
            name: cx.frag_color_name.clone(),
            base: prism_ast::BaseType::Vec4,
            storage: StorageQualifier::Out,
            array_size: None,
        };
        synthesized.push(make_global(&frag_color, cx));
    }

    // One output per referenced gl_FragData index, carrying its location.
    if cx.uses_frag_data {
        let location_ok = feature_available(Feature::LayoutLocationOutput, cx.target_version);
        let promoting = promoting_extension(Feature::LayoutLocationOutput, cx.target_version);
        for index in cx.frag_data_indices.clone() {
            let name = format!("fragData_{index}");
            if shader.symbols.lookup(&name).is_some() {
                continue;
            }
            let mut qualifiers = Qualifiers::storage(StorageQualifier::Out);
            if location_ok {
                qualifiers.layout_mut().location = Some(index);
            } else if let Some(ext) = promoting {
                cx.require_extension(ext.name);
                qualifiers.layout_mut().location = Some(index);
            } else {
                cx.warn(
                    prism_ast::DiagnosticKind::UnsupportedFeature,
                    Span::default(),
                    format!(
                        "bind fragment output `{name}` to color {index} via \
                         glBindFragDataLocation"
                    ),
                );
            }
            let ty = Type::simple(prism_ast::BaseType::Vec4).with_qualifiers(qualifiers);
            synthesized.push(Decl::new(
                DeclKind::Variable(VarDecl {
                    ty,
                    name,
                    name_array_dims: SmallVec::new(),
                    init: None,
                }),
                Span::default(),
            ));
        }
    }

    // Extensions the rules required, emitted ahead of everything else.
    for name in &cx.required_extensions {
        shader.require_extension(name);
    }

    // Drop declarations the rules marked dead, then prepend the synthesized
    // ones.
    shader
        .decls
        .retain(|d| !d.flags.contains(NodeFlags::DEAD));
    for decl in synthesized.into_iter().rev() {
        shader.decls.insert(0, decl);
    }

    shader.warnings.extend(cx.warnings.iter().cloned());
}

fn make_global(global: &SyntheticGlobal, _cx: &TranslationContext) -> Decl {
    let mut dims: SmallVec<[i32; 2]> = SmallVec::new();
    if let Some(n) = global.array_size {
        dims.push(n);
    }
    let ty = Type::simple(global.base).with_qualifiers(Qualifiers::storage(global.storage));
    Decl::new(
        DeclKind::Variable(VarDecl {
            ty,
            name: global.name.clone(),
            name_array_dims: dims,
            init: None,
        }),
        Span::default(),
    )
}
