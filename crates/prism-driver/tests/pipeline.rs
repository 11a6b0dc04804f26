//! Full-pipeline scenarios through the `Translator` facade, including the
//! caches, strict mode and the hardware version ceiling.

use prism_catalog::{DriverCapabilities, Stage, Version};
use prism_cache::DiskCache;
use prism_driver::{TranslationOptions, Translator};
use std::sync::Arc;

fn options(target: Version, level: u8) -> TranslationOptions {
    TranslationOptions {
        source_version: None,
        target_version: target,
        optimization_level: level,
        strict: false,
    }
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn upgrade_110_fragment_to_330() {
    let translator = Translator::default();
    let result = translator
        .translate(
            "void main() { gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0); }",
            Stage::Fragment,
            &options(Version::V330, 1),
        )
        .expect("translation should succeed");
    let flat = squash(&result.source);
    assert!(flat.starts_with("#version 330 core"));
    assert!(flat.contains("out vec4 fragColor;"));
    assert!(flat.contains("fragColor = vec4(1.0, 0.0, 0.0, 1.0);"));
    assert_eq!(result.source_version, Version::V110);
    assert_eq!(result.target_version, Version::V330);
    assert_eq!(result.stage, Stage::Fragment);
    assert!(result.elapsed.as_nanos() > 0);
}

#[test]
fn downgrade_330_fragment_to_120() {
    let translator = Translator::default();
    let source = "#version 330\nuniform sampler2D tex;\nin vec2 uv;\nout vec4 outColor;\nvoid main() { outColor = texture(tex, uv); }";
    let result = translator
        .translate(source, Stage::Fragment, &options(Version::V120, 0))
        .expect("translation should succeed");
    let flat = squash(&result.source);
    assert!(flat.starts_with("#version 120"));
    assert!(flat.contains("varying vec2 uv;"));
    assert!(flat.contains("gl_FragColor = texture2D(tex, uv);"));
}

#[test]
fn optimization_folds_constants() {
    let translator = Translator::default();
    let result = translator
        .translate(
            "void main() { gl_FragColor = vec4(0.5 + 0.25, 0.0, 0.0, 1.0) * 1.0; }",
            Stage::Fragment,
            &options(Version::V330, 1),
        )
        .unwrap();
    let flat = squash(&result.source);
    assert!(flat.contains("vec4(0.75, 0.0, 0.0, 1.0)"), "got: {flat}");
}

#[test]
fn memory_cache_returns_same_result() {
    let translator = Translator::default();
    let opts = options(Version::V330, 1);
    let source = "void main() { gl_FragColor = vec4(1.0); }";
    let first = translator
        .translate(source, Stage::Fragment, &opts)
        .unwrap();
    let second = translator
        .translate(source, Stage::Fragment, &opts)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second), "second call must be a cache hit");
}

#[test]
fn different_options_miss_the_cache() {
    let translator = Translator::default();
    let source = "void main() { gl_FragColor = vec4(1.0); }";
    let a = translator
        .translate(source, Stage::Fragment, &options(Version::V330, 1))
        .unwrap();
    let b = translator
        .translate(source, Stage::Fragment, &options(Version::V330, 2))
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn disk_cache_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source = "void main() { gl_FragColor = vec4(1.0); }";
    let opts = options(Version::V330, 1);

    let writer = Translator::default().with_disk_cache(DiskCache::new(dir.path()).unwrap());
    let first = writer.translate(source, Stage::Fragment, &opts).unwrap();

    // A fresh translator with a fresh memory cache hits the disk entry.
    let reader = Translator::default().with_disk_cache(DiskCache::new(dir.path()).unwrap());
    let second = reader.translate(source, Stage::Fragment, &opts).unwrap();
    assert_eq!(first.source, second.source);
    assert_eq!(second.source_version, Version::V110);
}

#[test]
fn target_above_driver_maximum_is_version_mismatch() {
    let caps = DriverCapabilities::from_driver_strings("3.30 test driver", Vec::new());
    let translator = Translator::new(caps);
    let err = translator
        .translate(
            "void main() {}",
            Stage::Vertex,
            &options(Version::V460, 1),
        )
        .unwrap_err();
    assert!(err.errors()[0].message.contains("driver maximum"));
}

#[test]
fn stage_below_its_introduction_is_rejected() {
    let translator = Translator::default();
    let err = translator
        .translate("void main() {}", Stage::Compute, &options(Version::V330, 1))
        .unwrap_err();
    assert!(err.errors()[0].message.contains("compute"));
}

#[test]
fn syntax_errors_fail_with_positions_into_the_original() {
    let translator = Translator::default();
    let err = translator
        .translate(
            "void main() {\n    float x = ;\n}",
            Stage::Vertex,
            &options(Version::V330, 1),
        )
        .unwrap_err();
    let errors = err.errors();
    assert!(!errors.is_empty());
    assert_eq!(errors[0].line, 2);
}

#[test]
fn strict_mode_escalates_warnings() {
    let translator = Translator::default();
    // Precision-loss warning from the double downgrade.
    let source = "#version 400\nvoid main() { double d = 1.0lf; float f = float(d); }";
    let relaxed = translator.translate(source, Stage::Vertex, &options(Version::V330, 0));
    assert!(relaxed.is_ok());
    assert!(!relaxed.unwrap().warnings.is_empty());

    let strict = TranslationOptions {
        strict: true,
        ..options(Version::V330, 0)
    };
    let err = translator
        .translate(source, Stage::Vertex, &strict)
        .unwrap_err();
    assert!(err.errors().iter().any(|e| e.message.contains("precision")));
}

#[test]
fn validate_reports_without_emitting() {
    let translator = Translator::default();
    let ok = translator.validate(
        "void main() { gl_FragColor = vec4(1.0); }",
        Stage::Fragment,
        &options(Version::V330, 1),
    );
    assert!(ok.valid);
    let bad = translator.validate(
        "#version 330\nuniform int m;\nvoid main() { switch (m) { default: break; } }",
        Stage::Vertex,
        &options(Version::V120, 1),
    );
    assert!(!bad.valid);
    assert!(!bad.errors.is_empty());
}

#[test]
fn required_extensions_surface_in_the_result() {
    let translator = Translator::default();
    let source = "#version 330\nlayout(location = 1) in vec4 color;\nvoid main() { gl_Position = color; }";
    let result = translator
        .translate(source, Stage::Vertex, &options(Version::V150, 0))
        .unwrap();
    assert!(
        result
            .required_extensions
            .iter()
            .any(|e| e == "GL_ARB_explicit_attrib_location"),
        "extensions: {:?}",
        result.required_extensions
    );
}

#[test]
fn explicit_source_version_overrides_detection() {
    let translator = Translator::default();
    // Without a directive this text would infer 1.10; force 1.30 so the
    // legacy rewrites stay off.
    let opts = TranslationOptions {
        source_version: Some(Version::V130),
        ..options(Version::V330, 0)
    };
    let result = translator
        .translate(
            "in vec4 c;\nout vec4 o;\nvoid main() { o = c; }",
            Stage::Fragment,
            &opts,
        )
        .unwrap();
    assert_eq!(result.source_version, Version::V130);
    assert!(squash(&result.source).contains("in vec4 c;"));
}
