//! Fragment-output rewrites: `gl_FragColor` / `gl_FragData[i]` vs
//! user-declared `out` variables.

use crate::context::TranslationContext;
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{
    BaseType, Decl, DeclKind, DiagnosticKind, Expr, ExprKind, NodeFlags, Span, StorageQualifier,
};
use prism_catalog::{Feature, Stage, Version, feature_available};

/// Upgrade: references to the removed built-in outputs become references to
/// synthesized user outputs; the post-pass declares them.
pub struct FragOutputUpgradeRule;

impl RewriteRule for FragOutputUpgradeRule {
    fn name(&self) -> &'static str {
        "frag-output-upgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Output
    }
    fn priority(&self) -> i32 {
        80
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.stage == Stage::Fragment
            && !feature_available(Feature::FragColorBuiltin, cx.target_version)
    }

    fn rewrite_expr(&self, expr: &mut Expr, cx: &mut TranslationContext) -> bool {
        let span = expr.span;
        match &mut expr.kind {
            ExprKind::Ident(name) if name == "gl_FragColor" => {
                cx.uses_frag_color = true;
                *name = cx.frag_color_name.clone();
                true
            }
            ExprKind::Index { base, index } => {
                let ExprKind::Ident(base_name) = &base.kind else {
                    return false;
                };
                if base_name != "gl_FragData" {
                    return false;
                }
                let Some(i) = index.literal_int() else {
                    cx.error(
                        DiagnosticKind::UnsupportedFeature,
                        span,
                        "gl_FragData with a non-constant index cannot be rewritten",
                    );
                    return false;
                };
                cx.note_frag_data_index(i as i32);
                expr.kind = ExprKind::Ident(format!("fragData_{i}"));
                true
            }
            _ => false,
        }
    }
}

/// Downgrade: a fragment-stage `out` declaration disappears and its uses
/// become `gl_FragColor` (location 0 / unset) or `gl_FragData[i]`.
pub struct FragOutputDowngradeRule;

impl RewriteRule for FragOutputDowngradeRule {
    fn name(&self) -> &'static str {
        "frag-output-downgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Output
    }
    fn priority(&self) -> i32 {
        80
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.stage == Stage::Fragment
            && cx.source_version >= Version::V130
            && cx.target_version < Version::V130
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let span = decl.span;
        let DeclKind::Variable(var) = &mut decl.kind else {
            return false;
        };
        if var.ty.qualifiers.storage != StorageQualifier::Out || var.name.is_empty() {
            return false;
        }
        let location = var
            .ty
            .qualifiers
            .layout()
            .and_then(|l| l.location)
            .unwrap_or(0);
        if var.ty.base != BaseType::Vec4 {
            cx.warn(
                DiagnosticKind::Type,
                span,
                format!(
                    "fragment output `{}` is {} but gl_FragColor is vec4",
                    var.name,
                    var.ty.display_name()
                ),
            );
        }
        if location > 0 {
            cx.warn(
                DiagnosticKind::UnsupportedFeature,
                span,
                format!(
                    "fragment output `{}` at location {location} maps to gl_FragData[{location}]",
                    var.name
                ),
            );
        }
        cx.output_renames.insert(var.name.clone(), location);
        decl.flags |= NodeFlags::DEAD;
        true
    }

    fn rewrite_expr(&self, expr: &mut Expr, cx: &mut TranslationContext) -> bool {
        let ExprKind::Ident(name) = &expr.kind else {
            return false;
        };
        let Some(location) = cx.output_renames.get(name.as_str()).copied() else {
            return false;
        };
        if location == 0 {
            expr.kind = ExprKind::Ident("gl_FragColor".to_owned());
        } else {
            let span = expr.span;
            expr.kind = ExprKind::Index {
                base: Box::new(Expr::ident("gl_FragData", span)),
                index: Box::new(Expr::int(location as i64, Span::default())),
            };
        }
        true
    }
}
