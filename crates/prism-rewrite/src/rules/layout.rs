//! Layout-qualifier downgrades: promote through an extension when one
//! exists for the target, otherwise strip the qualifier and tell the host
//! how to bind by name.

use crate::context::TranslationContext;
use crate::rule::{RewriteRule, RuleCategory};
use prism_ast::{Decl, DeclKind, DiagnosticKind, StorageQualifier};
use prism_catalog::{Feature, Stage, Version, feature_available, promoting_extension};

pub struct LayoutDowngradeRule;

impl RewriteRule for LayoutDowngradeRule {
    fn name(&self) -> &'static str {
        "layout-downgrade"
    }
    fn category(&self) -> RuleCategory {
        RuleCategory::Layout
    }
    fn priority(&self) -> i32 {
        70
    }
    fn applies(&self, cx: &TranslationContext) -> bool {
        // Binding qualifiers become native at 4.20, locations at 3.30;
        // anything older needs inspection.
        cx.target_version < Version::V420
    }

    fn rewrite_decl(&self, decl: &mut Decl, cx: &mut TranslationContext) -> bool {
        let span = decl.span;
        let target = cx.target_version;
        let (storage, name, layout_opt) = match &mut decl.kind {
            DeclKind::Variable(var) => (
                var.ty.qualifiers.storage,
                var.name.clone(),
                &mut var.ty.qualifiers.layout,
            ),
            DeclKind::Block(block) => {
                let storage = block.qualifiers.storage;
                let name = block.block_name.clone();
                (storage, name, &mut block.qualifiers.layout)
            }
            _ => return false,
        };
        let Some(layout) = layout_opt.as_mut() else {
            return false;
        };
        let mut changed = false;

        if let Some(location) = layout.location {
            let feature = match (cx.stage, storage) {
                (Stage::Vertex, StorageQualifier::In | StorageQualifier::Attribute) => {
                    Feature::LayoutLocationInput
                }
                (Stage::Fragment, StorageQualifier::Out) => Feature::LayoutLocationOutput,
                (_, StorageQualifier::Uniform) => Feature::ExplicitUniformLocation,
                _ => Feature::LayoutLocationInput,
            };
            if !feature_available(feature, target) {
                if let Some(ext) = promoting_extension(feature, target) {
                    cx.require_extension(ext.name);
                } else {
                    layout.location = None;
                    changed = true;
                    if feature == Feature::LayoutLocationInput {
                        cx.attribute_locations.insert(name.clone(), location);
                        cx.warn(
                            DiagnosticKind::UnsupportedFeature,
                            span,
                            format!(
                                "{} cannot express layout(location); bind `{name}` to location \
                                 {location} via glBindAttribLocation",
                                target
                            ),
                        );
                    } else {
                        cx.warn(
                            DiagnosticKind::UnsupportedFeature,
                            span,
                            format!(
                                "{target} cannot express layout(location) on `{name}`; the host \
                                 must bind it by name"
                            ),
                        );
                    }
                }
            }
        }

        if layout.binding.is_some() && !feature_available(Feature::LayoutBinding, target) {
            if let Some(ext) = promoting_extension(Feature::LayoutBinding, target) {
                cx.require_extension(ext.name);
            } else {
                layout.binding = None;
                changed = true;
                cx.warn(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    format!(
                        "{target} cannot express layout(binding) on `{name}`; set the unit with \
                         glUniform1i instead"
                    ),
                );
            }
        }

        // Below 1.40 there is no layout syntax at all.
        if !feature_available(Feature::LayoutQualifier, target) {
            if !layout.is_empty() {
                cx.warn(
                    DiagnosticKind::UnsupportedFeature,
                    span,
                    format!("{target} predates layout qualifiers; dropped from `{name}`"),
                );
            }
            *layout_opt = None;
            return true;
        }
        if layout.is_empty() {
            *layout_opt = None;
            changed = true;
        }
        changed
    }
}
