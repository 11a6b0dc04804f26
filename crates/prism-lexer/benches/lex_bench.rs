use criterion::{Criterion, criterion_group, criterion_main};
use prism_lexer::tokenize;
use std::hint::black_box;

const SHADER: &str = r#"
#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 texCoord;
uniform mat4 modelViewProjection;
uniform sampler2D albedo;
out vec2 uv;
out vec4 color;

float luminance(vec3 c) {
    return dot(c, vec3(0.2126, 0.7152, 0.0722));
}

void main() {
    uv = texCoord * 2.0 - 1.0;
    vec4 sample0 = texture(albedo, uv);
    float l = luminance(sample0.rgb);
    color = vec4(l, l, l, 1.0);
    gl_Position = modelViewProjection * vec4(position, 1.0);
}
"#;

fn bench_lex(c: &mut Criterion) {
    c.bench_function("lex_small_shader", |b| {
        b.iter(|| tokenize(black_box(SHADER)))
    });
}

criterion_group!(benches, bench_lex);
criterion_main!(benches);
