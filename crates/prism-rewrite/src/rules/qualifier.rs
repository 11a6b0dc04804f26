//! Storage-qualifier rewrites at the 1.20/1.30 boundary.

use crate::context::TranslationContext;
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{Decl, DeclKind, DiagnosticKind, InterpolationQualifier, StorageQualifier};
use prism_catalog::Stage;

/// `attribute` -> `in`, `varying` -> `in`/`out` by stage.
pub struct StorageUpgradeRule;

impl RewriteRule for StorageUpgradeRule {
    fn name(&self) -> &'static str {
        "storage-upgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Qualifier
    }
    fn priority(&self) -> i32 {
        100
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.upgrading_past_130()
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let DeclKind::Variable(var) = &mut decl.kind else {
            return false;
        };
        match var.ty.qualifiers.storage {
            StorageQualifier::Attribute => {
                var.ty.qualifiers.storage = StorageQualifier::In;
                true
            }
            StorageQualifier::Varying => {
                var.ty.qualifiers.storage = if cx.stage == Stage::Vertex {
                    StorageQualifier::Out
                } else {
                    StorageQualifier::In
                };
                true
            }
            _ => false,
        }
    }
}

/// `in`/`out` -> `attribute`/`varying` by stage. Fragment-stage `out`
/// variables are left for the fragment-output rule, which maps them onto
/// `gl_FragColor` / `gl_FragData`.
pub struct StorageDowngradeRule;

impl RewriteRule for StorageDowngradeRule {
    fn name(&self) -> &'static str {
        "storage-downgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Qualifier
    }
    fn priority(&self) -> i32 {
        100
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.downgrading_past_130()
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let span = decl.span;
        let DeclKind::Variable(var) = &mut decl.kind else {
            return false;
        };
        let mut changed = false;
        match (var.ty.qualifiers.storage, cx.stage) {
            (StorageQualifier::In, Stage::Vertex) => {
                var.ty.qualifiers.storage = StorageQualifier::Attribute;
                changed = true;
            }
            (StorageQualifier::In, Stage::Fragment) => {
                var.ty.qualifiers.storage = StorageQualifier::Varying;
                changed = true;
            }
            (StorageQualifier::Out, Stage::Vertex) => {
                var.ty.qualifiers.storage = StorageQualifier::Varying;
                changed = true;
            }
            _ => {}
        }
        if var.ty.qualifiers.interpolation != InterpolationQualifier::None {
            let kw = var
                .ty
                .qualifiers
                .interpolation
                .keyword()
                .unwrap_or("smooth");
            cx.warn(
                DiagnosticKind::UnsupportedFeature,
                span,
                format!(
                    "interpolation qualifier `{kw}` requires GLSL 1.30; dropped for {}",
                    cx.target_version
                ),
            );
            var.ty.qualifiers.interpolation = InterpolationQualifier::None;
            changed = true;
        }
        changed
    }
}
