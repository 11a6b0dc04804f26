//! Removal of legacy fixed-function built-ins on targets that no longer
//! have them. Each built-in becomes a camelCase user global of matching
//! type; the post-pass declares it and the host is warned to supply it.

use crate::context::{SyntheticGlobal, TranslationContext};
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{BaseType, DiagnosticKind, Expr, ExprKind, StorageQualifier};
use prism_catalog::{Feature, feature_available};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementKind {
    VertexInput,
    Varying,
    Uniform,
}

pub struct Translation {
    pub legacy: &'static str,
    pub modern: &'static str,
    pub base: BaseType,
    pub kind: ReplacementKind,
    pub array_size: Option<i32>,
}

const fn input(legacy: &'static str, modern: &'static str, base: BaseType) -> Translation {
    Translation {
        legacy,
        modern,
        base,
        kind: ReplacementKind::VertexInput,
        array_size: None,
    }
}

const fn uniform(legacy: &'static str, modern: &'static str, base: BaseType) -> Translation {
    Translation {
        legacy,
        modern,
        base,
        kind: ReplacementKind::Uniform,
        array_size: None,
    }
}

const fn varying(legacy: &'static str, modern: &'static str, base: BaseType) -> Translation {
    Translation {
        legacy,
        modern,
        base,
        kind: ReplacementKind::Varying,
        array_size: None,
    }
}

pub static TRANSLATIONS: &[Translation] = &[
    // Vertex inputs.
    input("gl_Vertex", "vertexPosition", BaseType::Vec4),
    input("gl_Normal", "vertexNormal", BaseType::Vec3),
    input("gl_Color", "vertexColor", BaseType::Vec4),
    input("gl_SecondaryColor", "vertexSecondaryColor", BaseType::Vec4),
    input("gl_FogCoord", "vertexFogCoord", BaseType::Float),
    input("gl_MultiTexCoord0", "vertexTexCoord0", BaseType::Vec4),
    input("gl_MultiTexCoord1", "vertexTexCoord1", BaseType::Vec4),
    input("gl_MultiTexCoord2", "vertexTexCoord2", BaseType::Vec4),
    input("gl_MultiTexCoord3", "vertexTexCoord3", BaseType::Vec4),
    input("gl_MultiTexCoord4", "vertexTexCoord4", BaseType::Vec4),
    input("gl_MultiTexCoord5", "vertexTexCoord5", BaseType::Vec4),
    input("gl_MultiTexCoord6", "vertexTexCoord6", BaseType::Vec4),
    input("gl_MultiTexCoord7", "vertexTexCoord7", BaseType::Vec4),
    // Matrix stack.
    uniform("gl_ModelViewMatrix", "modelViewMatrix", BaseType::Mat4),
    uniform("gl_ProjectionMatrix", "projectionMatrix", BaseType::Mat4),
    uniform(
        "gl_ModelViewProjectionMatrix",
        "modelViewProjectionMatrix",
        BaseType::Mat4,
    ),
    uniform("gl_NormalMatrix", "normalMatrix", BaseType::Mat3),
    uniform(
        "gl_ModelViewMatrixInverse",
        "modelViewMatrixInverse",
        BaseType::Mat4,
    ),
    uniform(
        "gl_ProjectionMatrixInverse",
        "projectionMatrixInverse",
        BaseType::Mat4,
    ),
    uniform(
        "gl_ModelViewProjectionMatrixInverse",
        "modelViewProjectionMatrixInverse",
        BaseType::Mat4,
    ),
    uniform(
        "gl_ModelViewMatrixTranspose",
        "modelViewMatrixTranspose",
        BaseType::Mat4,
    ),
    uniform(
        "gl_ProjectionMatrixTranspose",
        "projectionMatrixTranspose",
        BaseType::Mat4,
    ),
    uniform(
        "gl_ModelViewProjectionMatrixTranspose",
        "modelViewProjectionMatrixTranspose",
        BaseType::Mat4,
    ),
    Translation {
        legacy: "gl_TextureMatrix",
        modern: "textureMatrix",
        base: BaseType::Mat4,
        kind: ReplacementKind::Uniform,
        array_size: Some(8),
    },
    // Legacy varyings.
    Translation {
        legacy: "gl_TexCoord",
        modern: "texCoord",
        base: BaseType::Vec4,
        kind: ReplacementKind::Varying,
        array_size: Some(8),
    },
    varying("gl_FogFragCoord", "fogFragCoord", BaseType::Float),
    varying("gl_FrontColor", "frontColor", BaseType::Vec4),
    varying("gl_BackColor", "backColor", BaseType::Vec4),
    varying("gl_FrontSecondaryColor", "frontSecondaryColor", BaseType::Vec4),
    varying("gl_BackSecondaryColor", "backSecondaryColor", BaseType::Vec4),
];

fn lookup(name: &str) -> Option<&'static Translation> {
    TRANSLATIONS.iter().find(|t| t.legacy == name)
}

pub struct LegacyBuiltinRule;

impl LegacyBuiltinRule {
    fn storage_for(kind: ReplacementKind, cx: &TranslationContext) -> StorageQualifier {
        use prism_catalog::Stage;
        match kind {
            ReplacementKind::Uniform => StorageQualifier::Uniform,
            ReplacementKind::VertexInput => StorageQualifier::In,
            ReplacementKind::Varying => {
                if cx.stage == Stage::Vertex {
                    StorageQualifier::Out
                } else {
                    StorageQualifier::In
                }
            }
        }
    }
}

impl RewriteRule for LegacyBuiltinRule {
    fn name(&self) -> &'static str {
        "legacy-builtin-removal"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Variable
    }
    fn priority(&self) -> i32 {
        60
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        !feature_available(Feature::LegacyBuiltinUniforms, cx.target_version)
    }

    fn rewrite_expr(&self, expr: &mut Expr, cx: &mut TranslationContext) -> bool {
        let span = expr.span;
        let ExprKind::Ident(name) = &mut expr.kind else {
            return false;
        };
        let Some(translation) = lookup(name) else {
            return false;
        };
        let already_known = cx
            .generated_globals
            .iter()
            .any(|g| g.name == translation.modern);
        if !already_known {
            cx.warn(
                DiagnosticKind::UnsupportedFeature,
                span,
                format!(
                    "`{}` does not exist in {}; the host must supply `{}`",
                    translation.legacy, cx.target_version, translation.modern
                ),
            );
        }
        cx.request_global(SyntheticGlobal {
            name: translation.modern.to_owned(),
            base: translation.base,
            storage: Self::storage_for(translation.kind, cx),
            array_size: translation.array_size,
        });
        *name = translation.modern.to_owned();
        true
    }
}
