//! Dead-code elimination and the cleanup sweep that drops DEAD-flagged
//! declarations from their parents.

use crate::analysis::{OptContext, expr_is_pure};
use crate::Pass;
use prism_ast::{DeclKind, NodeFlags, Shader, Stmt, StmtKind, StorageQualifier};
use tracing::trace;

pub struct DeadCodeElimination;

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dead-code-elimination"
    }
    fn priority(&self) -> i32 {
        55
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool {
        let mut changed = false;

        // Locals first: an unused variable with an effect-free initializer
        // goes away.
        for decl in &mut shader.decls {
            if let DeclKind::Function(f) = &mut decl.kind {
                if let Some(body) = &mut f.body {
                    changed |= sweep_stmt(body, cx);
                }
            }
        }

        // Globals: interface storage always survives; global constants are
        // kept as well since they are part of the shader's readable surface.
        for decl in &mut shader.decls {
            let DeclKind::Variable(var) = &decl.kind else {
                continue;
            };
            if var.name.is_empty()
                || var.storage().is_external_interface()
                || var.storage() == StorageQualifier::Const
            {
                continue;
            }
            let usage = cx.usage_of(&var.name);
            let init_pure = var.init.as_ref().map(expr_is_pure).unwrap_or(true);
            if usage.use_count() == 0 && init_pure && !decl.flags.contains(NodeFlags::DEAD) {
                trace!(target: "optimizer", name = var.name.as_str(), "dead_global");
                decl.flags |= NodeFlags::DEAD;
                changed = true;
            }
        }

        // Unused functions other than main, prototypes included.
        for decl in &mut shader.decls {
            let DeclKind::Function(f) = &decl.kind else {
                continue;
            };
            if f.name == "main" || decl.flags.contains(NodeFlags::DEAD) {
                continue;
            }
            if cx.call_count(&f.name) == 0 {
                trace!(target: "optimizer", name = f.name.as_str(), "dead_function");
                decl.flags |= NodeFlags::DEAD;
                changed = true;
            }
        }

        changed
    }
}

fn sweep_stmt(stmt: &mut Stmt, cx: &mut OptContext) -> bool {
    let mut changed = false;
    match &mut stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts.iter_mut() {
                changed |= sweep_stmt(s, cx);
            }
        }
        StmtKind::Decl(vars) => {
            let before = vars.len();
            vars.retain(|var| {
                let usage = cx.usage_of(&var.name);
                if usage.use_count() > 0 {
                    return true;
                }
                let init_pure = var.init.as_ref().map(expr_is_pure).unwrap_or(true);
                if init_pure {
                    trace!(target: "optimizer", name = var.name.as_str(), "dead_local");
                }
                !init_pure
            });
            if vars.len() != before {
                changed = true;
            }
            if vars.is_empty() {
                stmt.kind = StmtKind::Empty;
            }
        }
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            changed |= sweep_stmt(then_branch, cx);
            if let Some(e) = else_branch {
                changed |= sweep_stmt(e, cx);
            }
        }
        StmtKind::For { init, body, .. } => {
            if let Some(i) = init {
                changed |= sweep_stmt(i, cx);
            }
            changed |= sweep_stmt(body, cx);
        }
        StmtKind::While { body, .. } | StmtKind::DoWhile { body, .. } => {
            changed |= sweep_stmt(body, cx);
        }
        StmtKind::Switch { body, .. } => {
            for s in body.iter_mut() {
                changed |= sweep_stmt(s, cx);
            }
        }
        _ => {}
    }
    changed
}

/// Final sweep: drop DEAD-flagged declarations from the root list.
pub struct DeclarationCleanup;

impl Pass for DeclarationCleanup {
    fn name(&self) -> &'static str {
        "declaration-cleanup"
    }
    fn priority(&self) -> i32 {
        45
    }
    fn min_level(&self) -> u8 {
        1
    }

    fn run(&self, shader: &mut Shader, _cx: &mut OptContext) -> bool {
        let before = shader.decls.len();
        shader
            .decls
            .retain(|d| !d.flags.contains(NodeFlags::DEAD));
        shader.decls.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UsageAnalysis;
    use prism_catalog::Stage;
    use prism_emitter::emit;
    use prism_parser::parse_source;

    fn run_dce(src: &str) -> String {
        let mut shader = parse_source(src, Stage::Fragment).shader;
        let mut cx = OptContext::new(1);
        for _ in 0..4 {
            UsageAnalysis.run(&mut shader, &mut cx);
            let a = DeadCodeElimination.run(&mut shader, &mut cx);
            let b = DeclarationCleanup.run(&mut shader, &mut cx);
            if !(a || b) {
                break;
            }
        }
        emit(&shader)
    }

    #[test]
    fn unused_local_with_pure_init_removed() {
        let out = run_dce("void main() { float unused = sin(1.0); gl_FragColor = vec4(1.0); }");
        assert!(!out.contains("unused"), "got: {out}");
    }

    #[test]
    fn unused_local_with_impure_init_kept() {
        let out = run_dce(
            "float sideEffecty(float x) { return x; }\nvoid main() { float unused = sideEffecty(1.0); gl_FragColor = vec4(1.0); }",
        );
        assert!(out.contains("unused"), "got: {out}");
    }

    #[test]
    fn interface_globals_survive() {
        let out = run_dce(
            "#version 330\nuniform vec4 tint;\nin vec2 uv;\nout vec4 c;\nvoid main() { c = vec4(uv, 0.0, 1.0); }",
        );
        assert!(out.contains("uniform vec4 tint;"), "got: {out}");
    }

    #[test]
    fn plain_unused_global_removed() {
        let out = run_dce("float scratch;\nvoid main() { gl_FragColor = vec4(1.0); }");
        assert!(!out.contains("scratch"), "got: {out}");
    }

    #[test]
    fn unused_global_const_kept() {
        let out = run_dce("const int STEPS = 4;\nvoid main() { gl_FragColor = vec4(1.0); }");
        assert!(out.contains("const int STEPS = 4;"), "got: {out}");
    }

    #[test]
    fn unused_function_and_prototype_removed() {
        let out = run_dce(
            "float helper(float x);\nfloat helper(float x) { return x; }\nvoid main() { gl_FragColor = vec4(1.0); }",
        );
        assert!(!out.contains("helper"), "got: {out}");
        assert!(out.contains("void main()"), "got: {out}");
    }

    #[test]
    fn called_function_kept() {
        let out = run_dce(
            "float helper(float x) { return x; }\nvoid main() { gl_FragColor = vec4(helper(1.0)); }",
        );
        assert!(out.contains("float helper(float x)"), "got: {out}");
    }

    #[test]
    fn transitively_dead_functions_fall_in_later_iterations() {
        // Only `b` is called, and only from dead `a`.
        let out = run_dce(
            "float b(float x) { return x; }\nfloat a(float x) { return b(x); }\nvoid main() { gl_FragColor = vec4(1.0); }",
        );
        assert!(!out.contains("float a"), "got: {out}");
        assert!(!out.contains("float b"), "got: {out}");
    }
}
