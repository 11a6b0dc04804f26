//! Whole-pipeline rewrite tests: parse, translate, emit, assert on text.

use prism_catalog::{Stage, Version};
use prism_emitter::emit;
use prism_parser::parse_with_version;
use prism_rewrite::{RuleRegistry, TranslationContext, translate};

fn run(source: &str, stage: Stage, from: Version, to: Version) -> (String, TranslationContext) {
    let outcome = parse_with_version(source, stage, from);
    assert!(
        !outcome.has_errors(),
        "parse failed: {:?}",
        outcome.diagnostics
    );
    let mut shader = outcome.shader;
    let registry = RuleRegistry::with_defaults();
    let mut cx = TranslationContext::new(from, to, stage);
    translate(&mut shader, &registry, &mut cx);
    (emit(&shader), cx)
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn simplest_upgrade_110_to_330() {
    let (text, cx) = run(
        "void main() { gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0); }",
        Stage::Fragment,
        Version::V110,
        Version::V330,
    );
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.starts_with("#version 330 core"), "got: {text}");
    assert!(flat.contains("out vec4 fragColor;"), "got: {text}");
    assert!(
        flat.contains("fragColor = vec4(1.0, 0.0, 0.0, 1.0);"),
        "got: {text}"
    );
    assert!(!flat.contains("gl_FragColor"), "got: {text}");
}

#[test]
fn legacy_texture_upgrade_120_to_330() {
    let src = "#version 120\nuniform sampler2D tex;\nvarying vec2 uv;\nvoid main() { gl_FragColor = texture2D(tex, uv); }";
    let (text, cx) = run(src, Stage::Fragment, Version::V120, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.starts_with("#version 330"), "got: {text}");
    assert!(flat.contains("in vec2 uv;"), "got: {text}");
    assert!(!flat.contains("varying"), "got: {text}");
    assert!(flat.contains("texture(tex, uv)"), "got: {text}");
    assert!(!flat.contains("texture2D("), "got: {text}");
    assert!(flat.contains("out vec4 fragColor;"), "got: {text}");
    assert!(flat.contains("fragColor = texture(tex, uv);"), "got: {text}");
}

#[test]
fn generic_texture_downgrade_330_to_120() {
    let src = "#version 330\nuniform sampler2D tex;\nin vec2 uv;\nout vec4 outColor;\nvoid main() { outColor = texture(tex, uv); }";
    let (text, cx) = run(src, Stage::Fragment, Version::V330, Version::V120);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.starts_with("#version 120"), "got: {text}");
    assert!(flat.contains("varying vec2 uv;"), "got: {text}");
    assert!(!flat.contains(" in vec2"), "got: {text}");
    assert!(!flat.contains("out vec4 outColor"), "got: {text}");
    assert!(
        flat.contains("gl_FragColor = texture2D(tex, uv);"),
        "got: {text}"
    );
}

#[test]
fn vertex_attribute_upgrade() {
    let src = "#version 120\nattribute vec3 position;\nvarying vec2 uv;\nvoid main() { gl_Position = vec4(position, 1.0); uv = position.xy; }";
    let (text, cx) = run(src, Stage::Vertex, Version::V120, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.contains("in vec3 position;"), "got: {text}");
    assert!(flat.contains("out vec2 uv;"), "got: {text}");
    assert!(!flat.contains("attribute"), "got: {text}");
}

#[test]
fn vertex_downgrade_to_legacy_qualifiers() {
    let src = "#version 330\nlayout(location = 0) in vec3 position;\nout vec2 uv;\nvoid main() { gl_Position = vec4(position, 1.0); uv = position.xy; }";
    let (text, cx) = run(src, Stage::Vertex, Version::V330, Version::V120);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.contains("attribute vec3 position;"), "got: {text}");
    assert!(flat.contains("varying vec2 uv;"), "got: {text}");
    assert!(!flat.contains("layout"), "got: {text}");
    // The host is told how to bind the stripped location.
    assert_eq!(cx.attribute_locations.get("position"), Some(&0));
    assert!(
        cx.warnings
            .iter()
            .any(|w| w.message.contains("glBindAttribLocation")),
        "warnings: {:?}",
        cx.warnings
    );
}

#[test]
fn layout_location_downgrade_uses_extension_when_available() {
    let src = "#version 330\nlayout(location = 1) in vec4 color;\nvoid main() { gl_Position = color; }";
    let (text, cx) = run(src, Stage::Vertex, Version::V330, Version::V150);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(
        flat.contains("#extension GL_ARB_explicit_attrib_location : require"),
        "got: {text}"
    );
    // The qualifier survives because the extension promotes it.
    assert!(flat.contains("layout(location = 1) in vec4 color;"), "got: {text}");
}

#[test]
fn frag_data_upgrade_synthesizes_located_outputs() {
    let src = "void main() { gl_FragData[0] = vec4(0.0); gl_FragData[2] = vec4(1.0); }";
    let (text, cx) = run(src, Stage::Fragment, Version::V110, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(
        flat.contains("layout(location = 0) out vec4 fragData_0;"),
        "got: {text}"
    );
    assert!(
        flat.contains("layout(location = 2) out vec4 fragData_2;"),
        "got: {text}"
    );
    assert!(flat.contains("fragData_2 = vec4(1.0);"), "got: {text}");
    assert!(!flat.contains("gl_FragData"), "got: {text}");
}

#[test]
fn legacy_builtins_become_user_globals() {
    let src = "void main() { gl_Position = gl_ModelViewProjectionMatrix * gl_Vertex; }";
    let (text, cx) = run(src, Stage::Vertex, Version::V110, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(
        flat.contains("uniform mat4 modelViewProjectionMatrix;"),
        "got: {text}"
    );
    assert!(flat.contains("in vec4 vertexPosition;"), "got: {text}");
    assert!(
        flat.contains("gl_Position = modelViewProjectionMatrix * vertexPosition;"),
        "got: {text}"
    );
    assert!(
        cx.warnings.iter().any(|w| w.message.contains("host")),
        "warnings: {:?}",
        cx.warnings
    );
}

#[test]
fn legacy_varying_array_translates_with_dimensions() {
    let src = "void main() { gl_FragColor = gl_TexCoord[0]; }";
    let (text, cx) = run(src, Stage::Fragment, Version::V110, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.contains("in vec4 texCoord[8];"), "got: {text}");
    assert!(flat.contains("fragColor = texCoord[0];"), "got: {text}");
}

#[test]
fn double_downgrade_to_float_warns() {
    let src = "#version 400\nvoid main() { double d = 1.0lf; float f = float(d); }";
    let (text, cx) = run(src, Stage::Vertex, Version::V400, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.contains("float d = 1.0;"), "got: {text}");
    assert!(!flat.contains("double"), "got: {text}");
    assert!(
        cx.warnings.iter().any(|w| w.message.contains("precision")),
        "warnings: {:?}",
        cx.warnings
    );
}

#[test]
fn dvec_constructor_downgrades_with_its_type() {
    let src = "#version 400\nvoid main() { dvec3 v = dvec3(1.0lf, 2.0lf, 3.0lf); }";
    let (text, cx) = run(src, Stage::Vertex, Version::V400, Version::V330);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(flat.contains("vec3 v = vec3(1.0, 2.0, 3.0);"), "got: {text}");
    assert!(!flat.contains("dvec3"), "got: {text}");
}

#[test]
fn switch_below_130_is_rejected() {
    let src = "#version 330\nuniform int mode;\nvoid main() { switch (mode) { default: break; } }";
    let (_, cx) = run(src, Stage::Vertex, Version::V330, Version::V120);
    assert!(
        cx.errors
            .iter()
            .any(|e| e.message.contains("switch")),
        "errors: {:?}",
        cx.errors
    );
}

#[test]
fn bitwise_below_130_is_rejected() {
    let src = "#version 330\nvoid main() { int a = 3; int b = a & 1; }";
    let (_, cx) = run(src, Stage::Vertex, Version::V330, Version::V120);
    assert!(
        cx.errors.iter().any(|e| e.message.contains("bitwise")),
        "errors: {:?}",
        cx.errors
    );
}

#[test]
fn uniform_block_downgrade_requires_extension() {
    let src = "#version 150\nuniform Data { vec4 tint; };\nvoid main() { gl_Position = tint; }";
    let (text, cx) = run(src, Stage::Vertex, Version::V150, Version::V120);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    assert!(
        squash(&text).contains("#extension GL_ARB_uniform_buffer_object : require"),
        "got: {text}"
    );
}

#[test]
fn unknown_sampler_leaves_call_and_warns() {
    // The sampler comes through a function parameter, so the map cannot
    // resolve it.
    let src = "#version 330\nuniform sampler2D tex;\nin vec2 uv;\nout vec4 c;\nvec4 lookup(sampler2D s, vec2 p) { return texture(s, p); }\nvoid main() { c = lookup(tex, uv); }";
    let (text, cx) = run(src, Stage::Fragment, Version::V330, Version::V120);
    let flat = squash(&text);
    assert!(flat.contains("texture(s, p)"), "got: {text}");
    assert!(
        cx.warnings
            .iter()
            .any(|w| w.message.contains("unknown sampler")),
        "warnings: {:?}",
        cx.warnings
    );
}

#[test]
fn no_op_translation_preserves_program() {
    let src = "#version 330\nuniform sampler2D tex;\nin vec2 uv;\nout vec4 color;\nvoid main() { color = texture(tex, uv); }";
    let (text, cx) = run(src, Stage::Fragment, Version::V330, Version::V330);
    assert!(cx.errors.is_empty());
    assert!(cx.warnings.is_empty(), "warnings: {:?}", cx.warnings);
    let flat = squash(&text);
    assert!(flat.contains("in vec2 uv;"), "got: {text}");
    assert!(flat.contains("out vec4 color;"), "got: {text}");
    assert!(flat.contains("color = texture(tex, uv);"), "got: {text}");
}

#[test]
fn fragment_output_at_location_one_maps_to_frag_data() {
    let src = "#version 330\nlayout(location = 1) out vec4 aux;\nvoid main() { aux = vec4(1.0); }";
    let (text, cx) = run(src, Stage::Fragment, Version::V330, Version::V120);
    assert!(cx.errors.is_empty(), "errors: {:?}", cx.errors);
    let flat = squash(&text);
    assert!(
        flat.contains("gl_FragData[1] = vec4(1.0);"),
        "got: {text}"
    );
    assert!(
        cx.warnings
            .iter()
            .any(|w| w.message.contains("gl_FragData[1]")),
        "warnings: {:?}",
        cx.warnings
    );
}
