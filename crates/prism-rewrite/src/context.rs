//! Per-compile mutable state carried between rules.

use ahash::AHashMap;
use prism_ast::{BaseType, Diagnostic, DiagnosticKind, Span, StorageQualifier};
use prism_catalog::{Stage, Version};
use std::collections::BTreeSet;

/// A synthetic declaration a rule asked the post-pass to create (the user
/// uniforms/attributes that replace removed legacy built-ins).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticGlobal {
    pub name: String,
    pub base: BaseType,
    pub storage: StorageQualifier,
    /// Array size when the replaced built-in was an array (`gl_TexCoord`).
    pub array_size: Option<i32>,
}

#[derive(Debug)]
pub struct TranslationContext {
    pub source_version: Version,
    pub target_version: Version,
    pub stage: Stage,
    /// Declared sampler name -> base type, filled by the driver's first
    /// pre-pass. Rules read it; none may invalidate it.
    pub sampler_types: AHashMap<String, BaseType>,
    pub required_extensions: Vec<String>,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    // Fragment-output tracking.
    pub uses_frag_color: bool,
    pub uses_frag_data: bool,
    pub frag_data_indices: BTreeSet<i32>,
    /// Canonical name of the synthesized primary output.
    pub frag_color_name: String,
    /// User fragment output name -> color index, for downgrades.
    pub output_renames: AHashMap<String, i32>,
    /// Attribute name -> location the host must bind via
    /// `glBindAttribLocation` after a layout downgrade.
    pub attribute_locations: AHashMap<String, i32>,
    /// Names already synthesized (or pre-existing), so the post-pass never
    /// declares an output or replacement twice.
    pub generated_globals: Vec<SyntheticGlobal>,
}

impl TranslationContext {
    pub fn new(source_version: Version, target_version: Version, stage: Stage) -> Self {
        Self {
            source_version,
            target_version,
            stage,
            sampler_types: AHashMap::new(),
            required_extensions: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            uses_frag_color: false,
            uses_frag_data: false,
            frag_data_indices: BTreeSet::new(),
            frag_color_name: "fragColor".to_owned(),
            output_renames: AHashMap::new(),
            attribute_locations: AHashMap::new(),
            generated_globals: Vec::new(),
        }
    }

    /// Is this compile crossing the 1.20/1.30 boundary upward?
    pub fn upgrading_past_130(&self) -> bool {
        self.source_version < Version::V130 && self.target_version >= Version::V130
    }

    /// Is this compile crossing the 1.20/1.30 boundary downward?
    pub fn downgrading_past_130(&self) -> bool {
        self.source_version >= Version::V130 && self.target_version < Version::V130
    }

    pub fn require_extension(&mut self, name: &str) {
        if !self.required_extensions.iter().any(|e| e == name) {
            tracing::debug!(target: "rewrite", extension = name, "extension_required");
            self.required_extensions.push(name.to_owned());
        }
    }

    pub fn warn(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.warnings.push(Diagnostic::warning(kind, span, message));
    }

    pub fn error(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.errors.push(Diagnostic::error(kind, span, message));
    }

    pub fn request_global(&mut self, global: SyntheticGlobal) {
        if !self.generated_globals.iter().any(|g| g.name == global.name) {
            self.generated_globals.push(global);
        }
    }

    pub fn note_frag_data_index(&mut self, index: i32) {
        self.uses_frag_data = true;
        self.frag_data_indices.insert(index);
    }

    pub fn max_frag_data_index(&self) -> i32 {
        self.frag_data_indices.last().copied().unwrap_or(-1)
    }
}
