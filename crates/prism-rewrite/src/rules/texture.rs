//! Texture-function rewrites: dimension-suffixed legacy names below 1.30,
//! generic overloads from 1.30 on.

use crate::context::TranslationContext;
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{DiagnosticKind, Expr, ExprKind, SamplerDim};

fn upgraded_name(legacy: &str) -> Option<&'static str> {
    Some(match legacy {
        "texture1D" | "texture2D" | "texture3D" | "textureCube" | "shadow1D" | "shadow2D" => {
            "texture"
        }
        "texture1DProj" | "texture2DProj" | "texture3DProj" | "shadow1DProj" | "shadow2DProj" => {
            "textureProj"
        }
        "texture1DLod" | "texture2DLod" | "texture3DLod" | "textureCubeLod" | "shadow1DLod"
        | "shadow2DLod" => "textureLod",
        "texture1DProjLod" | "texture2DProjLod" | "texture3DProjLod" | "shadow1DProjLod"
        | "shadow2DProjLod" => "textureProjLod",
        _ => return None,
    })
}

/// Legacy -> generic, a pure rename.
pub struct TextureUpgradeRule;

impl RewriteRule for TextureUpgradeRule {
    fn name(&self) -> &'static str {
        "texture-upgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Function
    }
    fn priority(&self) -> i32 {
        90
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.upgrading_past_130()
    }

    fn rewrite_expr(&self, expr: &mut Expr, _cx: &mut TranslationContext) -> bool {
        let ExprKind::Call {
            name, is_builtin, ..
        } = &mut expr.kind
        else {
            return false;
        };
        let Some(modern) = upgraded_name(name) else {
            return false;
        };
        *name = modern.to_owned();
        *is_builtin = true;
        true
    }
}

/// Generic -> legacy. Needs the sampler-type map to choose the dimension
/// suffix; an unknown sampler leaves the call unchanged with a warning.
pub struct TextureDowngradeRule;

impl RewriteRule for TextureDowngradeRule {
    fn name(&self) -> &'static str {
        "texture-downgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Function
    }
    fn priority(&self) -> i32 {
        90
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        cx.downgrading_past_130()
    }

    fn rewrite_expr(&self, expr: &mut Expr, cx: &mut TranslationContext) -> bool {
        let span = expr.span;
        let ExprKind::Call { name, args, .. } = &mut expr.kind else {
            return false;
        };
        let variant = match name.as_str() {
            "texture" => "",
            "textureProj" => "Proj",
            "textureLod" => "Lod",
            "textureProjLod" => "ProjLod",
            _ => return false,
        };
        let sampler_name = match args.first().map(|a| &a.kind) {
            Some(ExprKind::Ident(n)) => n.clone(),
            _ => {
                cx.warn(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    format!("cannot resolve sampler argument of `{name}`; call left unchanged"),
                );
                return false;
            }
        };
        let Some(base) = cx.sampler_types.get(sampler_name.as_str()).copied() else {
            cx.warn(
                DiagnosticKind::UnsupportedFeature,
                span,
                format!("unknown sampler `{sampler_name}`; `{name}` left unchanged"),
            );
            return false;
        };
        let shadow = base.is_shadow_sampler();
        let legacy = match (base.sampler_dim(), shadow) {
            (Some(SamplerDim::D1), false) => format!("texture1D{variant}"),
            (Some(SamplerDim::D2), false) => format!("texture2D{variant}"),
            (Some(SamplerDim::D3), false) => format!("texture3D{variant}"),
            (Some(SamplerDim::Cube), false) if variant == "" => "textureCube".to_owned(),
            (Some(SamplerDim::Cube), false) if variant == "Lod" => "textureCubeLod".to_owned(),
            (Some(SamplerDim::D1), true) => format!("shadow1D{variant}"),
            (Some(SamplerDim::D2), true) => format!("shadow2D{variant}"),
            _ => {
                cx.warn(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    format!(
                        "no pre-1.30 lookup for sampler type `{}` with `{name}`",
                        base.keyword().unwrap_or("?")
                    ),
                );
                return false;
            }
        };
        *name = legacy;
        true
    }
}
