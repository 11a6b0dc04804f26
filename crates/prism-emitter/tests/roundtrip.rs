//! Parse → emit → parse round-trips. Re-emitting the reparsed tree must
//! reproduce the text exactly (fixpoint), which catches both parser and
//! emitter drift without comparing ASTs node by node.

use pretty_assertions::assert_eq;
use prism_catalog::Stage;
use prism_emitter::emit;
use prism_parser::parse_source;

fn fixpoint(source: &str, stage: Stage) -> String {
    let first = parse_source(source, stage);
    assert!(
        !first.has_errors(),
        "initial parse failed: {:?}",
        first.diagnostics
    );
    let text1 = emit(&first.shader);
    let second = parse_source(&text1, stage);
    assert!(
        !second.has_errors(),
        "reparse failed: {:?}\nemitted:\n{text1}",
        second.diagnostics
    );
    let text2 = emit(&second.shader);
    assert_eq!(text1, text2, "emission must be a fixpoint");
    text1
}

#[test]
fn simple_fragment_shader() {
    let text = fixpoint(
        "#version 330\nout vec4 color;\nvoid main() { color = vec4(1.0, 0.5, 0.25, 1.0); }",
        Stage::Fragment,
    );
    assert!(text.starts_with("#version 330 core\n"));
    assert!(text.contains("out vec4 color;"));
    assert!(text.contains("color = vec4(1.0, 0.5, 0.25, 1.0);"));
}

#[test]
fn legacy_shader_keeps_legacy_vocabulary() {
    let text = fixpoint(
        "#version 120\nattribute vec3 pos;\nvarying vec2 uv;\nvoid main() { gl_Position = vec4(pos, 1.0); }",
        Stage::Vertex,
    );
    assert!(text.starts_with("#version 120\n"));
    assert!(text.contains("attribute vec3 pos;"));
    assert!(text.contains("varying vec2 uv;"));
}

#[test]
fn control_flow_and_precedence() {
    let text = fixpoint(
        r#"#version 330
out vec4 color;
uniform float t;
void main() {
    float acc = 0.0;
    for (int i = 0; i < 8; ++i) {
        if (t > 0.5) {
            acc += (t + 1.0) * 2.0;
        } else if (t > 0.25) {
            acc -= 1.0;
        } else {
            acc = t < 0.0 ? 0.0 : t;
        }
    }
    while (acc > 10.0) {
        acc /= 2.0;
    }
    color = vec4(acc);
}
"#,
        Stage::Fragment,
    );
    assert!(text.contains("(t + 1.0) * 2.0"));
    assert!(text.contains("} else if (t > 0.25) {"));
    assert!(text.contains("t < 0.0 ? 0.0 : t"));
}

#[test]
fn struct_and_interface_block() {
    let text = fixpoint(
        r#"#version 150
struct Light {
    vec3 dir;
    float power;
};
uniform Params {
    mat4 mvp;
} params;
uniform Light key;
void main() {
    gl_Position = params.mvp * vec4(key.dir * key.power, 1.0);
}
"#,
        Stage::Vertex,
    );
    assert!(text.contains("struct Light {"));
    assert!(text.contains("uniform Params {"));
    assert!(text.contains("} params;"));
}

#[test]
fn layout_qualifiers_survive() {
    let text = fixpoint(
        "#version 430\nlayout(std140, binding = 2) uniform Data { vec4 v; };\nlayout(location = 0) in vec3 p;\nvoid main() { gl_Position = vec4(p, 1.0) + v; }",
        Stage::Vertex,
    );
    assert!(text.contains("layout(std140, binding = 2) uniform Data {"));
    assert!(text.contains("layout(location = 0) in vec3 p;"));
}

#[test]
fn switch_statement() {
    let text = fixpoint(
        r#"#version 330
out vec4 color;
uniform int mode;
void main() {
    float v;
    switch (mode) {
        case 0:
            v = 0.0;
            break;
        default:
            v = 1.0;
            break;
    }
    color = vec4(v);
}
"#,
        Stage::Fragment,
    );
    assert!(text.contains("switch (mode) {"));
    assert!(text.contains("case 0:"));
    assert!(text.contains("default:"));
}

#[test]
fn for_init_declarator_list_stays_inline() {
    let text = fixpoint(
        "#version 330\nvoid main() { float s = 0.0; for (int i = 0, n = 4; i < n; ++i) { s += 1.0; } }",
        Stage::Vertex,
    );
    assert!(text.contains("for (int i = 0, n = 4; i < n; ++i)"));
}

#[test]
fn empty_function_body_prints_braces() {
    let text = fixpoint("#version 330\nvoid main() {}", Stage::Vertex);
    assert!(text.contains("void main() {}"));
}

#[test]
fn unsigned_and_hex_literals() {
    let text = fixpoint(
        "#version 330\nvoid main() { uint a = 4u; uint b = 0x10u; int c = 8; a = a + b + uint(c); }",
        Stage::Vertex,
    );
    assert!(text.contains("uint a = 4u;"));
    // Hex re-renders as decimal with the suffix preserved.
    assert!(text.contains("uint b = 16u;"));
}
