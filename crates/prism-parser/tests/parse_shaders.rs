//! End-to-end parser tests over realistic shader text.

use prism_ast::{
    BinaryOp, DeclKind, DiagnosticKind, ExprKind, StmtKind, StorageQualifier,
};
use prism_catalog::{Stage, Version};
use prism_parser::parse_source;

#[test]
fn minimal_fragment_shader() {
    let out = parse_source(
        "void main() { gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0); }",
        Stage::Fragment,
    );
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    assert_eq!(out.shader.version, Version::V110);
    let main = out.shader.find_function("main").expect("main expected");
    let Some(body) = &main.body else {
        panic!("main must have a body")
    };
    let StmtKind::Block(stmts) = &body.kind else {
        panic!("body must be a block")
    };
    assert_eq!(stmts.len(), 1);
    let StmtKind::Expr(assign) = &stmts[0].kind else {
        panic!("expected expression statement")
    };
    let ExprKind::Binary { op, lhs, rhs } = &assign.kind else {
        panic!("expected assignment")
    };
    assert_eq!(*op, BinaryOp::Assign);
    assert!(matches!(&lhs.kind, ExprKind::Ident(n) if n == "gl_FragColor"));
    let ExprKind::Call {
        name,
        args,
        is_constructor,
        ..
    } = &rhs.kind
    else {
        panic!("expected constructor call")
    };
    assert_eq!(name, "vec4");
    assert!(is_constructor);
    assert_eq!(args.len(), 4);
}

#[test]
fn version_directive_sets_shader_version() {
    let out = parse_source("#version 330 core\nvoid main() {}", Stage::Vertex);
    assert_eq!(out.shader.version, Version::V330);
    assert_eq!(out.shader.profile.as_deref(), Some("core"));
}

#[test]
fn qualifiers_and_layout() {
    let src = "#version 330\nlayout(location = 2) in vec3 position;\nflat in int id;\nvoid main() {}";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    let pos = out.shader.globals().find(|v| v.name == "position").unwrap();
    assert_eq!(pos.storage(), StorageQualifier::In);
    assert_eq!(
        pos.ty.qualifiers.layout().and_then(|l| l.location),
        Some(2)
    );
}

#[test]
fn layout_value_folds_arithmetic() {
    let src = "#version 330\nlayout(location = 1 + 2 * 3) in vec4 c;\nvoid main() {}";
    let out = parse_source(src, Stage::Vertex);
    let c = out.shader.globals().find(|v| v.name == "c").unwrap();
    assert_eq!(c.ty.qualifiers.layout().and_then(|l| l.location), Some(7));
}

#[test]
fn array_sizes_fold_or_default_to_unsized() {
    let src = "#version 330\nuniform vec4 colors[2 * 4];\nuniform float weights[];\nvoid main() {}";
    let out = parse_source(src, Stage::Fragment);
    let colors = out.shader.globals().find(|v| v.name == "colors").unwrap();
    assert_eq!(colors.name_array_dims.as_slice(), &[8]);
    let weights = out.shader.globals().find(|v| v.name == "weights").unwrap();
    assert_eq!(weights.name_array_dims.as_slice(), &[-1]);
}

#[test]
fn zero_array_size_is_an_error() {
    let src = "#version 330\nuniform float xs[0];\nvoid main() {}";
    let out = parse_source(src, Stage::Fragment);
    assert!(out.has_errors());
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Type));
    let xs = out.shader.globals().find(|v| v.name == "xs").unwrap();
    assert_eq!(xs.name_array_dims.as_slice(), &[-1]);
}

#[test]
fn struct_with_instance() {
    let src = "struct Light { vec3 dir; float power; } sun;\nvoid main() { float p = sun.power; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    let s = out.shader.structs().next().unwrap();
    assert_eq!(s.name, "Light");
    assert_eq!(s.members.len(), 2);
    assert_eq!(s.instance.as_ref().map(|i| i.name.as_str()), Some("sun"));
}

#[test]
fn struct_type_usable_in_declarations() {
    let src = "struct P { float x; };\nvoid main() { P p = P(1.0); float y = p.x; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
}

#[test]
fn interface_block_with_instance() {
    let src = "#version 150\nuniform Matrices { mat4 mvp; mat4 model; } mats;\nvoid main() { gl_Position = mats.mvp * vec4(0.0); }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    let block = out.shader.interface_blocks().next().unwrap();
    assert_eq!(block.block_name, "Matrices");
    assert_eq!(block.instance_name.as_deref(), Some("mats"));
    assert_eq!(block.members.len(), 2);
}

#[test]
fn anonymous_interface_block_members_visible() {
    let src = "#version 150\nuniform Globals { mat4 mvp; };\nvoid main() { gl_Position = mvp * vec4(0.0); }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
}

#[test]
fn function_prototype_then_definition() {
    let src = "float helper(float x);\nvoid main() { float y = helper(1.0); }\nfloat helper(float x) { return x * 2.0; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    let protos: Vec<_> = out.shader.functions().filter(|f| f.is_prototype).collect();
    assert_eq!(protos.len(), 1);
    let defs: Vec<_> = out
        .shader
        .functions()
        .filter(|f| !f.is_prototype && f.name == "helper")
        .collect();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].params.len(), 1);
}

#[test]
fn void_parameter_list_is_empty() {
    let out = parse_source("void main(void) {}", Stage::Vertex);
    assert!(!out.has_errors());
    assert!(out.shader.find_function("main").unwrap().params.is_empty());
}

#[test]
fn control_flow_statements() {
    let src = r#"
#version 330
out vec4 color;
void main() {
    float acc = 0.0;
    for (int i = 0; i < 4; ++i) {
        if (i == 2) { continue; }
        acc += float(i);
    }
    int j = 0;
    while (j < 3) { j++; }
    do { j--; } while (j > 0);
    switch (j) {
        case 0:
            acc = 1.0;
            break;
        default:
            acc = 2.0;
            break;
    }
    color = vec4(acc);
}
"#;
    let out = parse_source(src, Stage::Fragment);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
}

#[test]
fn ternary_is_right_associative() {
    let src = "void main() { float x = true ? 1.0 : false ? 2.0 : 3.0; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
}

#[test]
fn precedence_shapes_the_tree() {
    let out = parse_source("void main() { int x = 1 + 2 * 3; }", Stage::Vertex);
    let main = out.shader.find_function("main").unwrap();
    let StmtKind::Block(stmts) = &main.body.as_ref().unwrap().kind else {
        panic!()
    };
    let StmtKind::Decl(vars) = &stmts[0].kind else { panic!() };
    let ExprKind::Binary { op, rhs, .. } = &vars[0].init.as_ref().unwrap().kind else {
        panic!("expected binary init")
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(
        &rhs.kind,
        ExprKind::Binary {
            op: BinaryOp::Mul,
            ..
        }
    ));
}

#[test]
fn undefined_variable_is_an_error() {
    let out = parse_source("void main() { float x = missing; }", Stage::Vertex);
    assert!(out.has_errors());
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UndefinedSymbol && d.is_error()));
}

#[test]
fn undeclared_function_call_is_a_warning() {
    let out = parse_source("void main() { float x = external(1.0); }", Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::UndefinedSymbol && !d.is_error()));
}

#[test]
fn redefinition_in_same_scope_is_an_error() {
    let out = parse_source("void main() { float a; float a; }", Stage::Vertex);
    assert!(out.has_errors());
    assert!(out
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::Redefinition));
}

#[test]
fn shadowing_in_nested_scope_is_fine() {
    let out = parse_source("void main() { float a; { float a; } }", Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
}

#[test]
fn discard_outside_fragment_warns() {
    let out = parse_source("void main() { discard; }", Stage::Vertex);
    assert!(!out.has_errors());
    assert!(out.diagnostics.iter().any(|d| d.message.contains("discard")));
    let frag = parse_source("void main() { discard; }", Stage::Fragment);
    assert!(frag.diagnostics.is_empty());
}

#[test]
fn break_outside_loop_warns() {
    let out = parse_source("void main() { break; }", Stage::Vertex);
    assert!(!out.has_errors());
    assert!(out.diagnostics.iter().any(|d| d.message.contains("break")));
}

#[test]
fn syntax_error_recovers_at_statement_boundary() {
    let src = "void main() { float x = ; float y = 1.0; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(out.has_errors());
    // The declaration after the bad one still parsed.
    let main = out.shader.find_function("main").unwrap();
    let StmtKind::Block(stmts) = &main.body.as_ref().unwrap().kind else {
        panic!()
    };
    assert!(stmts.iter().any(|s| matches!(
        &s.kind,
        StmtKind::Decl(vars) if vars.iter().any(|v| v.name == "y")
    )));
}

#[test]
fn extension_directive_becomes_a_decl() {
    let src = "#version 150\n#extension GL_ARB_explicit_attrib_location : enable\nvoid main() {}";
    let out = parse_source(src, Stage::Vertex);
    assert!(out.shader.decls.iter().any(|d| matches!(
        &d.kind,
        DeclKind::Extension { name, behavior }
            if name == "GL_ARB_explicit_attrib_location" && behavior == "enable"
    )));
}

#[test]
fn precision_declaration() {
    let src = "precision highp float;\nvoid main() {}";
    let out = parse_source(src, Stage::Fragment);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    assert!(out
        .shader
        .decls
        .iter()
        .any(|d| matches!(&d.kind, DeclKind::Precision { .. })));
}

#[test]
fn compute_layout_declaration() {
    let src = "#version 430\nlayout(local_size_x = 8, local_size_y = 8) in;\nvoid main() {}";
    let out = parse_source(src, Stage::Compute);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    let bare = out
        .shader
        .globals()
        .find(|v| v.name.is_empty())
        .expect("bare layout declaration");
    let layout = bare.ty.qualifiers.layout().unwrap();
    assert_eq!(layout.local_size_x, Some(8));
    assert_eq!(layout.local_size_y, Some(8));
}

#[test]
fn swizzles_and_member_access() {
    let src = "void main() { vec4 v = vec4(1.0); vec2 a = v.xy; float b = v.rgba.x; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
}

#[test]
fn comma_declarator_lists() {
    let src = "void main() { float a = 1.0, b = 2.0, c; c = a + b; }";
    let out = parse_source(src, Stage::Vertex);
    assert!(!out.has_errors(), "diagnostics: {:?}", out.diagnostics);
    let main = out.shader.find_function("main").unwrap();
    let StmtKind::Block(stmts) = &main.body.as_ref().unwrap().kind else {
        panic!()
    };
    let StmtKind::Decl(vars) = &stmts[0].kind else { panic!() };
    assert_eq!(vars.len(), 3);
}
