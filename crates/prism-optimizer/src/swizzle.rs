//! Swizzle composition and constructor splat collapse.

use crate::analysis::OptContext;
use crate::fold::rewrite_exprs;
use crate::Pass;
use prism_ast::{BaseType, Expr, ExprKind, Shader};

const FAMILIES: [&str; 3] = ["xyzw", "rgba", "stpq"];

fn family_of(selector: &str) -> Option<&'static str> {
    FAMILIES
        .iter()
        .find(|f| selector.chars().all(|c| f.contains(c)))
        .copied()
}

fn component_index(c: char) -> Option<usize> {
    FAMILIES.iter().find_map(|f| f.find(c))
}

/// `v.ab.cd` -> a single swizzle selecting through the inner one, provided
/// every outer component addresses a position the inner selector has.
fn compose(inner: &str, outer: &str) -> Option<String> {
    let inner_chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(outer.len());
    for c in outer.chars() {
        let idx = component_index(c)?;
        if idx >= inner_chars.len() {
            return None;
        }
        out.push(inner_chars[idx]);
    }
    Some(out)
}

pub struct SwizzleCollapse;

impl Pass for SwizzleCollapse {
    fn name(&self) -> &'static str {
        "swizzle-collapse"
    }
    fn priority(&self) -> i32 {
        40
    }
    fn min_level(&self) -> u8 {
        2
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        rewrite_exprs(shader, &mut collapse_one)
    }
}

fn collapse_one(expr: &mut Expr) -> bool {
    let ExprKind::Member {
        object,
        member: outer,
        is_swizzle: true,
    } = &expr.kind
    else {
        return false;
    };
    let ExprKind::Member {
        object: base,
        member: inner,
        is_swizzle: true,
    } = &object.kind
    else {
        return false;
    };
    if family_of(outer).is_none() || family_of(inner).is_none() {
        return false;
    }
    let Some(composed) = compose(inner, outer) else {
        return false;
    };
    let new_object = base.clone();
    expr.kind = ExprKind::Member {
        object: new_object,
        member: composed,
        is_swizzle: true,
    };
    true
}

pub struct ConstructorSplat;

impl Pass for ConstructorSplat {
    fn name(&self) -> &'static str {
        "constructor-splat"
    }
    fn priority(&self) -> i32 {
        35
    }
    fn min_level(&self) -> u8 {
        2
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        rewrite_exprs(shader, &mut splat_one)
    }
}

fn splat_one(expr: &mut Expr) -> bool {
    let ExprKind::Call {
        name,
        args,
        is_constructor: true,
        ..
    } = &mut expr.kind
    else {
        return false;
    };
    let Some(base) = BaseType::from_keyword(name) else {
        return false;
    };
    let Some(size) = base.vector_size() else {
        return false;
    };
    if args.len() != size as usize || args.len() < 2 {
        return false;
    }
    let first = &args[0];
    if !first.is_literal() {
        return false;
    }
    if !args[1..].iter().all(|a| a.structurally_equal(first)) {
        return false;
    }
    args.truncate(1);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_catalog::Stage;
    use prism_emitter::emit;
    use prism_parser::parse_source;

    fn run_pass(src: &str, pass: &dyn Pass) -> String {
        let mut shader = parse_source(src, Stage::Fragment).shader;
        let mut cx = OptContext::new(2);
        pass.run(&mut shader, &mut cx);
        emit(&shader)
    }

    #[test]
    fn nested_swizzles_compose() {
        let out = run_pass(
            "void main() { vec4 v = vec4(1.0); vec2 r = v.xyz.zy; gl_FragColor = vec4(r, 0.0, 1.0); }",
            &SwizzleCollapse,
        );
        assert!(out.contains("v.zy"), "got: {out}");
        assert!(!out.contains("v.xyz.zy"), "got: {out}");
    }

    #[test]
    fn in_range_components_compose() {
        let out = run_pass(
            "void main() { vec4 v = vec4(1.0); float r = v.xy.x; float s = v.xy.y; gl_FragColor = vec4(r, s, 0.0, 1.0); }",
            &SwizzleCollapse,
        );
        assert!(out.contains("float r = v.x;"), "got: {out}");
        assert!(out.contains("float s = v.y;"), "got: {out}");
    }

    #[test]
    fn out_of_range_outer_component_is_left() {
        // `.xy` exposes two positions; an outer `.z` asks for a third and
        // the collapse refuses rather than fabricate one.
        let mut expr = prism_ast::Expr::new(
            ExprKind::Member {
                object: Box::new(prism_ast::Expr::new(
                    ExprKind::Member {
                        object: Box::new(prism_ast::Expr::ident("v", prism_ast::Span::default())),
                        member: "xy".into(),
                        is_swizzle: true,
                    },
                    prism_ast::Span::default(),
                )),
                member: "z".into(),
                is_swizzle: true,
            },
            prism_ast::Span::default(),
        );
        assert!(!collapse_one(&mut expr));
    }

    #[test]
    fn mixed_families_compose_into_inner_family() {
        let out = run_pass(
            "void main() { vec4 v = vec4(1.0); vec2 r = v.rgb.xy; gl_FragColor = vec4(r, 0.0, 1.0); }",
            &SwizzleCollapse,
        );
        assert!(out.contains("v.rg"), "got: {out}");
    }

    #[test]
    fn splat_collapses_repeated_literal() {
        let out = run_pass(
            "void main() { gl_FragColor = vec4(1.0, 1.0, 1.0, 1.0); }",
            &ConstructorSplat,
        );
        assert!(out.contains("vec4(1.0)"), "got: {out}");
    }

    #[test]
    fn splat_leaves_mixed_arguments() {
        let out = run_pass(
            "void main() { gl_FragColor = vec4(1.0, 0.0, 1.0, 1.0); }",
            &ConstructorSplat,
        );
        assert!(out.contains("vec4(1.0, 0.0, 1.0, 1.0)"), "got: {out}");
    }

    #[test]
    fn splat_ignores_wrong_arity() {
        let out = run_pass(
            "void main() { gl_FragColor = vec4(vec2(1.0, 1.0), 1.0, 1.0); }",
            &ConstructorSplat,
        );
        // vec2(1.0, 1.0) collapses, but the vec4 has mixed argument shapes.
        assert!(out.contains("vec2(1.0)"), "got: {out}");
    }
}
