//! Feature rejects: constructs with no mechanical lowering surface an
//! `UNSUPPORTED_FEATURE` diagnostic and stay untouched. Interface blocks
//! get the smallest sufficient extension when one exists.

use crate::context::TranslationContext;
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{
    BaseType, Decl, DeclKind, DiagnosticKind, Expr, ExprKind, Stmt, StmtKind, StorageQualifier,
};
use prism_catalog::{Feature, Version, feature_available, promoting_extension};

pub struct FeatureRejectRule;

impl RewriteRule for FeatureRejectRule {
    fn name(&self) -> &'static str {
        "feature-reject"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Feature
    }
    fn priority(&self) -> i32 {
        40
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.target_version < Version::V130
    }

    fn rewrite_stmt(&self, stmt: &mut Stmt, cx: &mut TranslationContext) -> bool {
        if let StmtKind::Switch { .. } = stmt.kind {
            cx.error(
                DiagnosticKind::UnsupportedFeature,
                stmt.span,
                format!(
                    "switch statements require GLSL 1.30 and cannot be lowered to {}",
                    cx.target_version
                ),
            );
        }
        false
    }

    fn rewrite_expr(&self, expr: &mut Expr, cx: &mut TranslationContext) -> bool {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Binary { op, .. } if op.is_bitwise() => {
                cx.error(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    format!(
                        "bitwise operator `{}` requires GLSL 1.30",
                        op.symbol()
                    ),
                );
            }
            ExprKind::Unary {
                op: prism_ast::UnaryOp::BitNot,
                ..
            } => {
                cx.error(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    "bitwise complement requires GLSL 1.30",
                );
            }
            ExprKind::UintLit(_) => {
                cx.error(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    "unsigned literals require GLSL 1.30",
                );
            }
            _ => {}
        }
        false
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let DeclKind::Variable(var) = &decl.kind else {
            return false;
        };
        let base = var.ty.base;
        let unsigned = matches!(
            base,
            BaseType::Uint | BaseType::UVec2 | BaseType::UVec3 | BaseType::UVec4
        );
        if unsigned && !feature_available(Feature::UnsignedTypes, cx.target_version) {
            cx.error(
                DiagnosticKind::UnsupportedFeature,
                decl.span,
                format!(
                    "unsigned type `{}` requires GLSL 1.30",
                    base.keyword().unwrap_or("?")
                ),
            );
        }
        false
    }
}

/// Interface blocks on targets that predate them.
pub struct BlockCompatRule;

impl RewriteRule for BlockCompatRule {
    fn name(&self) -> &'static str {
        "interface-block-compat"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Feature
    }
    fn priority(&self) -> i32 {
        40
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.target_version < Version::V430
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let DeclKind::Block(block) = &decl.kind else {
            return false;
        };
        let span = decl.span;
        let target = cx.target_version;
        match block.qualifiers.storage {
            StorageQualifier::Uniform if !feature_available(Feature::UniformBlocks, target) => {
                match promoting_extension(Feature::UniformBlocks, target) {
                    Some(ext) => cx.require_extension(ext.name),
                    None => cx.error(
                        DiagnosticKind::UnsupportedFeature,
                        span,
                        format!("uniform blocks are not expressible in {target}"),
                    ),
                }
            }
            StorageQualifier::Buffer
                if !feature_available(Feature::ShaderStorageBlocks, target) =>
            {
                match promoting_extension(Feature::ShaderStorageBlocks, target) {
                    Some(ext) => cx.require_extension(ext.name),
                    None => cx.error(
                        DiagnosticKind::UnsupportedFeature,
                        span,
                        format!("shader storage blocks are not expressible in {target}"),
                    ),
                }
            }
            StorageQualifier::In | StorageQualifier::Out
                if !feature_available(Feature::InOutBlocks, target) =>
            {
                cx.error(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    format!("in/out interface blocks are not expressible in {target}"),
                );
            }
            _ => {}
        }
        false
    }
}
