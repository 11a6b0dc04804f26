//! Type-compatibility rewrites: doubles below 4.00 and non-square matrices
//! below 1.20.

use crate::context::TranslationContext;
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{Decl, DeclKind, DiagnosticKind, Expr, ExprKind, Span, Type};
use prism_catalog::{Feature, feature_available};

pub struct TypeCompatRule;

impl TypeCompatRule {
    fn fix_type(ty: &mut Type, span: Span, cx: &mut TranslationContext) -> bool {
        let target = cx.target_version;
        if ty.base.is_double_based() && !feature_available(Feature::DoubleType, target) {
            if let Some(single) = ty.base.single_precision_analogue() {
                cx.warn(
                    DiagnosticKind::Type,
                    span,
                    format!(
                        "double-precision type `{}` downgraded to `{}` for {} (precision loss)",
                        ty.base.keyword().unwrap_or("?"),
                        single.keyword().unwrap_or("?"),
                        target
                    ),
                );
                ty.base = single;
                return true;
            }
        }
        if ty.base.is_matrix()
            && !ty.base.is_square_matrix()
            && !feature_available(Feature::NonSquareMatrices, target)
        {
            cx.error(
                DiagnosticKind::UnsupportedFeature,
                span,
                format!(
                    "non-square matrix `{}` requires GLSL 1.20",
                    ty.base.keyword().unwrap_or("?")
                ),
            );
        }
        false
    }
}

impl RewriteRule for TypeCompatRule {
    fn name(&self) -> &'static str {
        "type-compat"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Type
    }
    fn priority(&self) -> i32 {
        50
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        !feature_available(Feature::DoubleType, cx.target_version)
            || !feature_available(Feature::NonSquareMatrices, cx.target_version)
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let span = decl.span;
        match &mut decl.kind {
            DeclKind::Variable(var) => Self::fix_type(&mut var.ty, span, cx),
            DeclKind::Function(f) => {
                let mut changed = Self::fix_type(&mut f.return_type, span, cx);
                for param in &mut f.params {
                    changed |= Self::fix_type(&mut param.ty, param.span, cx);
                }
                changed
            }
            DeclKind::Struct(s) => {
                let mut changed = false;
                for member in &mut s.members {
                    changed |= Self::fix_type(&mut member.ty, member.span, cx);
                }
                changed
            }
            DeclKind::Block(b) => {
                let mut changed = false;
                for member in &mut b.members {
                    changed |= Self::fix_type(&mut member.ty, member.span, cx);
                }
                changed
            }
            _ => false,
        }
    }

    fn rewrite_stmt(&self, stmt: &mut prism_ast::Stmt, cx: &mut TranslationContext) -> bool {
        let span = stmt.span;
        let prism_ast::StmtKind::Decl(vars) = &mut stmt.kind else {
            return false;
        };
        let mut changed = false;
        for var in vars {
            changed |= Self::fix_type(&mut var.ty, span, cx);
        }
        changed
    }

    fn rewrite_expr(&self, expr: &mut Expr, cx: &mut TranslationContext) -> bool {
        if feature_available(Feature::DoubleType, cx.target_version) {
            return false;
        }
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::DoubleLit(v) => {
                let value = *v;
                cx.warn(
                    DiagnosticKind::Type,
                    span,
                    "double literal downgraded to float (precision loss)",
                );
                expr.kind = ExprKind::FloatLit(value);
                true
            }
            // Constructor names follow their type.
            ExprKind::Call {
                name,
                is_constructor: true,
                ..
            } => {
                let Some(base) = prism_ast::BaseType::from_keyword(name) else {
                    return false;
                };
                if !base.is_double_based() {
                    return false;
                }
                let Some(kw) = base.single_precision_analogue().and_then(|s| s.keyword()) else {
                    return false;
                };
                *name = kw.to_owned();
                true
            }
            _ => false,
        }
    }
}
