use prism_catalog::{Stage, Version};
use prism_driver::{TranslationOptions, Translator};

// Integration-adjacent test: the same flow the binary runs for a file —
// read, translate with config-derived options, write the output.
#[test]
fn file_in_file_out() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tint.frag");
    let output = dir.path().join("tint.330.frag");
    std::fs::write(
        &input,
        "uniform sampler2D tex;\nvarying vec2 uv;\nvoid main() { gl_FragColor = texture2D(tex, uv); }\n",
    )
    .unwrap();

    let translator = Translator::default();
    let options = TranslationOptions {
        target_version: Version::V330,
        ..TranslationOptions::default()
    };
    let source = std::fs::read_to_string(&input).unwrap();
    let result = translator
        .translate(&source, Stage::Fragment, &options)
        .expect("translation should succeed");
    std::fs::write(&output, &result.source).unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.starts_with("#version 330 core"));
    assert!(written.contains("texture(tex, uv)"));
    assert!(written.contains("in vec2 uv;"));
}

#[test]
fn validate_flow_surfaces_errors() {
    let translator = Translator::default();
    let options = TranslationOptions {
        target_version: Version::V120,
        ..TranslationOptions::default()
    };
    let validation = translator.validate(
        "#version 330\nuniform int m;\nvoid main() { int x = m << 2; }",
        Stage::Vertex,
        &options,
    );
    assert!(!validation.valid);
    assert!(
        validation
            .errors
            .iter()
            .any(|e| e.message.contains("bitwise")),
        "errors: {:?}",
        validation.errors
    );
}
