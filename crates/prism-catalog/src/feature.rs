use crate::Version;

/// A discrete language capability tied to a version range.
///
/// `introduced_in` is the first version that can express the feature
/// natively. A feature with `deprecated_in` set stops being available at and
/// above that version (the legacy vocabulary removed by the core profile).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// `attribute` / `varying` storage qualifiers.
    AttributeVarying,
    /// `in` / `out` storage qualifiers on globals.
    InOutKeywords,
    /// User-declared fragment outputs (`out vec4 ...` in the fragment stage).
    UserFragmentOutputs,
    /// The `gl_FragColor` / `gl_FragData[]` built-in outputs.
    FragColorBuiltin,
    /// Legacy fixed-function built-ins: `gl_Vertex`, `gl_ModelViewMatrix`, ...
    LegacyBuiltinUniforms,
    /// Legacy varyings: `gl_TexCoord`, `gl_FrontColor`, ...
    LegacyVaryings,
    /// Dimension-suffixed lookup functions (`texture2D`, `shadow2DProj`, ...).
    LegacyTextureFunctions,
    /// Generic `texture` / `textureProj` / `textureLod` overloads.
    GenericTextureLookup,
    SwitchStatement,
    BitwiseOperators,
    /// `uint` / `uvec*` types and unsigned literals.
    UnsignedTypes,
    NonSquareMatrices,
    /// `double`, `dvec*`, `dmat*`.
    DoubleType,
    /// `flat` / `smooth` / `noperspective`.
    InterpolationQualifiers,
    /// `highp` / `mediump` / `lowp` on declarations.
    PrecisionQualifiers,
    /// Any `layout(...)` qualifier at all.
    LayoutQualifier,
    /// `layout(location = N)` on vertex inputs.
    LayoutLocationInput,
    /// `layout(location = N)` on fragment outputs.
    LayoutLocationOutput,
    /// `layout(binding = N)` on samplers / blocks.
    LayoutBinding,
    /// `layout(location = N)` on plain uniforms.
    ExplicitUniformLocation,
    UniformBlocks,
    /// `in` / `out` interface blocks.
    InOutBlocks,
    ShaderStorageBlocks,
    Std430Layout,
    ImageLoadStore,
    AtomicCounters,
    GeometryStage,
    TessellationStages,
    ComputeStage,
    /// `#version NNN core|compatibility` profile names.
    ProfileDirective,
}

impl Feature {
    pub const fn introduced_in(self) -> Version {
        match self {
            Feature::AttributeVarying
            | Feature::FragColorBuiltin
            | Feature::LegacyBuiltinUniforms
            | Feature::LegacyVaryings
            | Feature::LegacyTextureFunctions => Version::V110,
            Feature::NonSquareMatrices => Version::V120,
            Feature::InOutKeywords
            | Feature::UserFragmentOutputs
            | Feature::GenericTextureLookup
            | Feature::SwitchStatement
            | Feature::BitwiseOperators
            | Feature::UnsignedTypes
            | Feature::InterpolationQualifiers
            | Feature::PrecisionQualifiers => Version::V130,
            Feature::UniformBlocks | Feature::LayoutQualifier => Version::V140,
            Feature::InOutBlocks | Feature::GeometryStage | Feature::ProfileDirective => {
                Version::V150
            }
            Feature::LayoutLocationInput | Feature::LayoutLocationOutput => Version::V330,
            Feature::DoubleType | Feature::TessellationStages => Version::V400,
            Feature::LayoutBinding | Feature::ImageLoadStore | Feature::AtomicCounters => {
                Version::V420
            }
            Feature::ExplicitUniformLocation
            | Feature::ShaderStorageBlocks
            | Feature::Std430Layout
            | Feature::ComputeStage => Version::V430,
        }
    }

    pub const fn deprecated_in(self) -> Option<Version> {
        match self {
            Feature::AttributeVarying
            | Feature::FragColorBuiltin
            | Feature::LegacyVaryings
            | Feature::LegacyTextureFunctions => Some(Version::V130),
            Feature::LegacyBuiltinUniforms => Some(Version::V140),
            _ => None,
        }
    }
}

/// Can `version` express `feature` natively, without any extension?
///
/// Monotonic in `version` starting at `introduced_in`, reverting to `false`
/// at and above `deprecated_in` when that is set.
pub fn feature_available(feature: Feature, version: Version) -> bool {
    if version < feature.introduced_in() {
        return false;
    }
    match feature.deprecated_in() {
        Some(dep) => version < dep,
        None => true,
    }
}

/// Smallest catalogued version on which every feature in `features` is
/// natively available. `None` when the set is unsatisfiable (a legacy
/// feature combined with one introduced after its deprecation).
pub fn minimum_version_for(features: &[Feature]) -> Option<Version> {
    Version::ALL
        .iter()
        .copied()
        .find(|v| features.iter().all(|f| feature_available(*f, *v)))
}
