//! Version-aware AST rewriting.
//!
//! A translation runs a registry of prioritized rules over the tree in
//! post-order, against a per-compile [`TranslationContext`]. Rules either
//! mutate a node in place or leave it alone and record a diagnostic; an
//! unresolvable construct never produces invalid output, it produces an
//! `UNSUPPORTED_FEATURE` error and the original node.

mod context;
mod driver;
mod rule;
pub mod rules;

pub use context::TranslationContext;
pub use driver::translate;
pub use rule::{RewriteRule, RuleCategory, RuleRegistry};
