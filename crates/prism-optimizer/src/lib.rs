//! Semantics-preserving AST simplification.
//!
//! A fixed-point pass manager runs prioritized passes until an iteration
//! reports no change, capped at [`MAX_ITERATIONS`]. Analysis passes refresh
//! the shared [`OptContext`] each iteration; transform passes consult it and
//! mutate the tree. Every transform preserves side effects: an expression is
//! only erased or duplicated when the purity analysis allows it.

mod algebra;
mod analysis;
mod branches;
mod dce;
mod fold;
mod inline;
mod swizzle;

pub use analysis::{OptContext, Usage, expr_is_pure};

use prism_ast::Shader;
use tracing::{debug, trace};

/// Iteration cap; passes are monotone so this is only a backstop.
pub const MAX_ITERATIONS: u32 = 10;

pub trait Pass {
    fn name(&self) -> &'static str;
    /// Higher runs earlier within an iteration.
    fn priority(&self) -> i32;
    /// Smallest optimization level that enables the pass.
    fn min_level(&self) -> u8;
    fn should_run(&self, _cx: &OptContext) -> bool {
        true
    }
    /// Returns whether anything changed.
    fn run(&self, shader: &mut Shader, cx: &mut OptContext) -> bool;
}

pub struct PassManager {
    passes: Vec<Box<dyn Pass + Send + Sync>>,
    level: u8,
}

impl PassManager {
    pub fn with_defaults(level: u8) -> Self {
        let mut passes: Vec<Box<dyn Pass + Send + Sync>> = vec![
            Box::new(analysis::UsageAnalysis),
            Box::new(analysis::ConstantAnalysis),
            Box::new(fold::ConstantPropagation),
            Box::new(fold::ConstantFolding),
            Box::new(algebra::AlgebraicSimplification),
            Box::new(algebra::StrengthReduction),
            Box::new(branches::DeadBranchElimination),
            Box::new(branches::UnreachableCodeElimination),
            Box::new(inline::VariableInlining),
            Box::new(dce::DeadCodeElimination),
            Box::new(branches::BlockCleanup),
            Box::new(dce::DeclarationCleanup),
            Box::new(swizzle::SwizzleCollapse),
            Box::new(swizzle::ConstructorSplat),
        ];
        // Sorted once; stable sort keeps registration order on ties.
        passes.sort_by_key(|p| std::cmp::Reverse(p.priority()));
        Self { passes, level }
    }

    /// Run to fixpoint. Returns the number of iterations executed.
    pub fn run(&self, shader: &mut Shader) -> u32 {
        if self.level == 0 {
            return 0;
        }
        let mut cx = OptContext::new(self.level);
        let mut iterations = 0;
        while iterations < MAX_ITERATIONS {
            iterations += 1;
            let mut changed = false;
            for pass in &self.passes {
                if pass.min_level() > self.level || !pass.should_run(&cx) {
                    continue;
                }
                let pass_changed = pass.run(shader, &mut cx);
                if pass_changed {
                    trace!(target: "optimizer", pass = pass.name(), iteration = iterations, "pass_changed");
                }
                changed |= pass_changed;
            }
            if !changed {
                break;
            }
        }
        debug!(target: "optimizer", iterations, level = self.level, "optimize_complete");
        iterations
    }
}

/// Convenience entry point.
pub fn optimize(shader: &mut Shader, level: u8) -> u32 {
    PassManager::with_defaults(level).run(shader)
}
