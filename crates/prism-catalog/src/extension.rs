use crate::{Feature, Version, feature_available};

/// A named driver capability that promotes one or more features into a
/// version that does not natively include them.
///
/// `min_version` is the oldest language version the extension text itself is
/// written against; enabling it on anything older is meaningless.
#[derive(Debug, Clone, Copy)]
pub struct Extension {
    pub name: &'static str,
    pub features: &'static [Feature],
    pub min_version: Version,
}

pub static EXTENSIONS: &[Extension] = &[
    Extension {
        name: "GL_ARB_explicit_attrib_location",
        features: &[Feature::LayoutLocationInput, Feature::LayoutLocationOutput],
        min_version: Version::V130,
    },
    Extension {
        name: "GL_ARB_explicit_uniform_location",
        features: &[Feature::ExplicitUniformLocation],
        min_version: Version::V330,
    },
    Extension {
        name: "GL_ARB_shading_language_420pack",
        features: &[Feature::LayoutBinding],
        min_version: Version::V130,
    },
    Extension {
        name: "GL_ARB_gpu_shader_fp64",
        features: &[Feature::DoubleType],
        min_version: Version::V150,
    },
    Extension {
        name: "GL_ARB_uniform_buffer_object",
        features: &[Feature::UniformBlocks],
        min_version: Version::V110,
    },
    Extension {
        name: "GL_EXT_gpu_shader4",
        features: &[Feature::BitwiseOperators, Feature::UnsignedTypes],
        min_version: Version::V110,
    },
    Extension {
        name: "GL_ARB_shader_image_load_store",
        features: &[Feature::ImageLoadStore],
        min_version: Version::V130,
    },
    Extension {
        name: "GL_ARB_shader_storage_buffer_object",
        features: &[Feature::ShaderStorageBlocks, Feature::Std430Layout],
        min_version: Version::V420,
    },
    Extension {
        name: "GL_ARB_compute_shader",
        features: &[Feature::ComputeStage],
        min_version: Version::V420,
    },
    Extension {
        name: "GL_ARB_tessellation_shader",
        features: &[Feature::TessellationStages],
        min_version: Version::V150,
    },
];

/// The extension (if any) that makes `feature` expressible on `target`.
///
/// Returns `None` when the feature is already native (no extension needed)
/// or when no catalogued extension can promote it onto that target.
pub fn promoting_extension(feature: Feature, target: Version) -> Option<&'static Extension> {
    if feature_available(feature, target) {
        return None;
    }
    EXTENSIONS
        .iter()
        .find(|ext| target >= ext.min_version && ext.features.contains(&feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_feature_needs_no_extension() {
        assert!(promoting_extension(Feature::LayoutLocationInput, Version::V330).is_none());
    }

    #[test]
    fn attrib_location_promotes_onto_130() {
        let ext = promoting_extension(Feature::LayoutLocationInput, Version::V150)
            .expect("extension expected");
        assert_eq!(ext.name, "GL_ARB_explicit_attrib_location");
    }

    #[test]
    fn nothing_promotes_onto_too_old_targets() {
        // The attrib-location extension is written against 1.30+.
        assert!(promoting_extension(Feature::LayoutLocationInput, Version::V120).is_none());
    }

    #[test]
    fn binding_promotes_via_420pack() {
        let ext = promoting_extension(Feature::LayoutBinding, Version::V330)
            .expect("extension expected");
        assert_eq!(ext.name, "GL_ARB_shading_language_420pack");
    }
}
