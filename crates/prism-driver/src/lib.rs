//! The translator facade: one entry point tying lexer, parser, rewrite
//! engine, optimizer and emitter together, with result caching in front.
//!
//! A `Translator` instance is a single-threaded pipeline; run several in
//! parallel if you need concurrency. The process-wide catalogs are
//! immutable and shared; the memory cache is shared and concurrent.

pub mod config;

pub use prism_ast::{Diagnostic, DiagnosticKind, Severity};

use prism_ast::Span;
use prism_catalog::{DriverCapabilities, Stage, Version, detect_version};
use prism_cache::{DiskCache, DiskEntry, Fingerprint, MemoryCache};
use prism_emitter::emit_with_pool;
use prism_lexer::TokenStream;
use prism_optimizer::optimize;
use prism_parser::{Parser, Token};
use prism_pool::{Pool, VecPool};
use prism_rewrite::{RuleRegistry, TranslationContext, translate as run_rewrites};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Explicit source version; `None` means detect from the text.
    pub source_version: Option<Version>,
    pub target_version: Version,
    /// 0 disables the optimizer entirely.
    pub optimization_level: u8,
    /// Escalate warnings to errors.
    pub strict: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            source_version: None,
            target_version: Version::V330,
            optimization_level: 1,
            strict: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslationResult {
    /// Translated source text.
    pub source: String,
    pub source_version: Version,
    pub target_version: Version,
    pub stage: Stage,
    pub required_extensions: Vec<String>,
    pub warnings: Vec<Diagnostic>,
    pub elapsed: Duration,
}

/// `validate` output: no text is produced.
#[derive(Debug, Clone)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation failed with {} error(s)", errors.len())]
    Failed {
        errors: Vec<Diagnostic>,
        warnings: Vec<Diagnostic>,
    },
}

impl TranslateError {
    pub fn errors(&self) -> &[Diagnostic] {
        match self {
            TranslateError::Failed { errors, .. } => errors,
        }
    }
}

pub struct Translator {
    capabilities: DriverCapabilities,
    registry: RuleRegistry,
    pool: Pool,
    token_pool: VecPool<Token>,
    cache: Arc<MemoryCache<TranslationResult>>,
    disk_cache: Option<DiskCache>,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(DriverCapabilities::default())
    }
}

impl Translator {
    pub fn new(capabilities: DriverCapabilities) -> Self {
        Self {
            capabilities,
            registry: RuleRegistry::with_defaults(),
            pool: Pool::new(),
            token_pool: VecPool::new(),
            cache: Arc::new(MemoryCache::default()),
            disk_cache: None,
        }
    }

    /// Share a result cache across translator instances.
    pub fn with_cache(mut self, cache: Arc<MemoryCache<TranslationResult>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_disk_cache(mut self, disk_cache: DiskCache) -> Self {
        self.disk_cache = Some(disk_cache);
        self
    }

    pub fn capabilities(&self) -> &DriverCapabilities {
        &self.capabilities
    }

    /// Translate `source` for `stage` against the options' target version.
    pub fn translate(
        &self,
        source: &str,
        stage: Stage,
        options: &TranslationOptions,
    ) -> Result<Arc<TranslationResult>, TranslateError> {
        let started = Instant::now();
        self.check_target(stage, options)?;

        let fingerprint = Fingerprint::compute(
            source,
            stage,
            options.source_version,
            options.target_version,
            options.optimization_level,
            options.strict,
        );
        if let Some(hit) = self.cache.get(&fingerprint) {
            debug!(target: "cache", fingerprint = %fingerprint.short_hex(), "memory_hit");
            return Ok(hit);
        }
        if let Some(hit) = self.disk_lookup(&fingerprint, started) {
            let hit = Arc::new(hit);
            self.cache.insert(fingerprint, Arc::clone(&hit));
            return Ok(hit);
        }

        let (result, errors, warnings) = self.compile(source, stage, options, started);
        if !errors.is_empty() {
            return Err(TranslateError::Failed { errors, warnings });
        }
        let result = Arc::new(result);
        self.cache.insert(fingerprint, Arc::clone(&result));
        if let Some(disk) = &self.disk_cache {
            let entry = DiskEntry {
                source_version: result.source_version,
                target_version: result.target_version,
                stage,
                translated: result.source.clone(),
            };
            if let Err(error) = disk.store(&fingerprint, &entry) {
                debug!(target: "cache", %error, "disk_store_failed");
            }
        }
        Ok(result)
    }

    /// Parse and rewrite without emitting; reports whether the input would
    /// translate cleanly.
    pub fn validate(&self, source: &str, stage: Stage, options: &TranslationOptions) -> Validation {
        if let Err(TranslateError::Failed { errors, warnings }) = self.check_target(stage, options)
        {
            return Validation {
                valid: false,
                errors,
                warnings,
            };
        }
        let started = Instant::now();
        let (_, errors, warnings) = self.compile(source, stage, options, started);
        Validation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn check_target(
        &self,
        stage: Stage,
        options: &TranslationOptions,
    ) -> Result<(), TranslateError> {
        let mut errors = Vec::new();
        if options.target_version > self.capabilities.max_version {
            errors.push(Diagnostic::error(
                DiagnosticKind::VersionMismatch,
                Span::default(),
                format!(
                    "target version {} exceeds the driver maximum {}",
                    options.target_version, self.capabilities.max_version
                ),
            ));
        }
        if stage.minimum_version() > options.target_version {
            errors.push(Diagnostic::error(
                DiagnosticKind::VersionMismatch,
                Span::default(),
                format!(
                    "{stage} shaders require at least GLSL {}",
                    stage.minimum_version()
                ),
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TranslateError::Failed {
                errors,
                warnings: Vec::new(),
            })
        }
    }

    /// The four-stage pipeline. Parse errors do not stop the rewrite pass;
    /// the recovered AST still runs through it so every diagnostic the
    /// input deserves is collected in one compile.
    fn compile(
        &self,
        source: &str,
        stage: Stage,
        options: &TranslationOptions,
        started: Instant,
    ) -> (TranslationResult, Vec<Diagnostic>, Vec<Diagnostic>) {
        let source_version = options
            .source_version
            .unwrap_or_else(|| detect_version(source));

        let stream = TokenStream::lex_into(source, self.token_pool.acquire());
        let outcome = Parser::new(stream, stage, source_version).run();
        let mut shader = outcome.shader;
        self.token_pool.release(outcome.tokens);

        let mut cx = TranslationContext::new(source_version, options.target_version, stage);
        run_rewrites(&mut shader, &self.registry, &mut cx);

        let mut errors: Vec<Diagnostic> = Vec::new();
        let mut warnings: Vec<Diagnostic> = Vec::new();
        for diag in outcome.diagnostics {
            if diag.is_error() {
                errors.push(diag);
            } else {
                warnings.push(diag);
            }
        }
        errors.extend(cx.errors.drain(..));
        warnings.extend(cx.warnings.drain(..));
        if options.strict && !warnings.is_empty() {
            errors.extend(warnings.drain(..).map(Diagnostic::escalated));
        }

        let text = if errors.is_empty() {
            optimize(&mut shader, options.optimization_level);
            // Emit into a pooled scratch buffer, keep an exact-sized copy
            // and hand the (possibly oversized) buffer back for reuse.
            let scratch = emit_with_pool(&shader, &self.pool);
            let text = scratch.clone();
            self.pool.release_scratch(scratch);
            text
        } else {
            String::new()
        };

        let result = TranslationResult {
            source: text,
            source_version,
            target_version: options.target_version,
            stage,
            required_extensions: cx.required_extensions.clone(),
            warnings: warnings.clone(),
            elapsed: started.elapsed(),
        };
        let pool_stats = self.pool.stats();
        debug!(
            target: "pool",
            acquired = pool_stats.acquired,
            reused = pool_stats.reused,
            "compile_pool_stats"
        );
        info!(
            target: "runtime.pipeline",
            stage = stage.name(),
            from = source_version.code(),
            to = options.target_version.code(),
            level = options.optimization_level,
            errors = errors.len(),
            warnings = result.warnings.len(),
            elapsed_us = result.elapsed.as_micros() as u64,
            "translate"
        );
        (result, errors, warnings)
    }

    fn disk_lookup(&self, fingerprint: &Fingerprint, started: Instant) -> Option<TranslationResult> {
        let disk = self.disk_cache.as_ref()?;
        match disk.load(fingerprint) {
            Ok(Some(entry)) => {
                debug!(target: "cache", fingerprint = %fingerprint.short_hex(), "disk_hit");
                Some(TranslationResult {
                    source: entry.translated,
                    source_version: entry.source_version,
                    target_version: entry.target_version,
                    stage: entry.stage,
                    required_extensions: Vec::new(),
                    warnings: Vec::new(),
                    elapsed: started.elapsed(),
                })
            }
            Ok(None) => None,
            Err(error) => {
                debug!(target: "cache", %error, "disk_load_failed");
                None
            }
        }
    }
}
