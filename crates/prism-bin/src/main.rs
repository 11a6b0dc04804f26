//! Prism entrypoint: translate a shader file (or stdin) to a target GLSL
//! version, optionally revalidating on change in `--watch` mode.

use anyhow::{Context, Result, bail};
use clap::Parser;
use prism_cache::{DiskCache, ShaderWatcher};
use prism_catalog::{DriverCapabilities, Stage};
use prism_driver::config::{self, Config, parse_target};
use prism_driver::{Diagnostic, TranslateError, TranslationOptions, Translator};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "prism", version, about = "GLSL cross-version translator")]
struct Args {
    /// Input shader path (stage inferred from the extension). Reads stdin
    /// when omitted.
    pub path: Option<PathBuf>,
    /// Shader stage: vertex|fragment|geometry|tess-control|tess-eval|compute.
    #[arg(long)]
    pub stage: Option<String>,
    /// Target GLSL version, e.g. `330` or `3.30`.
    #[arg(long)]
    pub target: Option<String>,
    /// Explicit source version (otherwise detected from the text).
    #[arg(long = "source-version")]
    pub source_version: Option<String>,
    /// Optimization level 0..3.
    #[arg(short = 'O', long = "opt-level")]
    pub opt_level: Option<u8>,
    /// Escalate warnings to errors.
    #[arg(long)]
    pub strict: bool,
    /// Configuration file path (overrides discovery of `prism.toml`).
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write the translated source here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Only validate; print diagnostics, emit nothing.
    #[arg(long)]
    pub validate: bool,
    /// Retranslate whenever the input file changes.
    #[arg(long)]
    pub watch: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", "prism.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}

fn stage_from_extension(path: &Path) -> Option<Stage> {
    match path.extension()?.to_str()? {
        "vert" | "vs" => Some(Stage::Vertex),
        "frag" | "fs" => Some(Stage::Fragment),
        "geom" => Some(Stage::Geometry),
        "tesc" => Some(Stage::TessControl),
        "tese" => Some(Stage::TessEval),
        "comp" => Some(Stage::Compute),
        _ => None,
    }
}

fn resolve_stage(args: &Args) -> Result<Stage> {
    if let Some(raw) = &args.stage {
        return Stage::parse(raw).with_context(|| format!("unknown stage `{raw}`"));
    }
    if let Some(path) = &args.path {
        if let Some(stage) = stage_from_extension(path) {
            return Ok(stage);
        }
    }
    bail!("cannot infer the shader stage; pass --stage");
}

fn resolve_options(args: &Args, config: &Config) -> Result<TranslationOptions> {
    let mut options = config.options();
    if let Some(raw) = &args.target {
        options.target_version =
            parse_target(raw).with_context(|| format!("unknown target version `{raw}`"))?;
    }
    if let Some(raw) = &args.source_version {
        options.source_version =
            Some(parse_target(raw).with_context(|| format!("unknown source version `{raw}`"))?);
    }
    if let Some(level) = args.opt_level {
        if level > 3 {
            bail!("optimization level must be 0..3");
        }
        options.optimization_level = level;
    }
    if args.strict {
        options.strict = true;
    }
    Ok(options)
}

fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            Ok(buffer)
        }
    }
}

fn build_translator(config: &Config) -> Result<Translator> {
    // A host embedding the pipeline would pass the real GL driver strings
    // here; the CLI has no context, so every catalogued version is allowed.
    let mut translator = Translator::new(DriverCapabilities::default());
    if config.file.cache.disk {
        let dir = config
            .file
            .cache
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".prism-cache"));
        translator = translator.with_disk_cache(DiskCache::new(&dir)?);
        info!(target: "runtime", dir = %dir.display(), "disk_cache_enabled");
    }
    Ok(translator)
}

fn report_diagnostics(diags: &[Diagnostic]) {
    for diag in diags {
        eprintln!("{diag}");
    }
}

fn run_once(
    translator: &Translator,
    args: &Args,
    stage: Stage,
    options: &TranslationOptions,
) -> Result<bool> {
    let source = read_source(args.path.as_deref())?;
    if args.validate {
        let validation = translator.validate(&source, stage, options);
        report_diagnostics(&validation.errors);
        report_diagnostics(&validation.warnings);
        if validation.valid {
            eprintln!("valid ({} warning(s))", validation.warnings.len());
        }
        return Ok(validation.valid);
    }
    match translator.translate(&source, stage, options) {
        Ok(result) => {
            report_diagnostics(&result.warnings);
            match &args.output {
                Some(path) => std::fs::write(path, &result.source)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => print!("{}", result.source),
            }
            info!(
                target: "runtime",
                from = result.source_version.code(),
                to = result.target_version.code(),
                elapsed_us = result.elapsed.as_micros() as u64,
                "translated"
            );
            Ok(true)
        }
        Err(TranslateError::Failed { errors, warnings }) => {
            report_diagnostics(&errors);
            report_diagnostics(&warnings);
            Ok(false)
        }
    }
}

fn watch_loop(
    translator: &Translator,
    args: &Args,
    stage: Stage,
    options: &TranslationOptions,
) -> Result<()> {
    let Some(path) = args.path.clone() else {
        bail!("--watch needs a file path");
    };
    let watcher = ShaderWatcher::new(&[path.clone()])?;
    eprintln!("watching {} (ctrl-c to stop)", path.display());
    loop {
        match watcher.events().recv() {
            Ok(changed) => {
                // Editors often fire several events per save; drain the burst.
                while watcher
                    .events()
                    .recv_timeout(Duration::from_millis(50))
                    .is_ok()
                {}
                info!(target: "runtime", path = %changed.display(), "reload");
                if let Err(error) = run_once(translator, args, stage, options) {
                    warn!(target: "runtime", %error, "reload_failed");
                }
            }
            Err(_) => return Ok(()),
        }
    }
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    let args = Args::parse();
    let config = config::load_from(args.config.clone())?;
    let stage = resolve_stage(&args)?;
    let options = resolve_options(&args, &config)?;
    let translator = build_translator(&config)?;

    info!(
        target: "runtime",
        stage = stage.name(),
        target_version = options.target_version.code(),
        level = options.optimization_level,
        strict = options.strict,
        watch = args.watch,
        "startup"
    );

    let ok = run_once(&translator, &args, stage, &options)?;
    if args.watch {
        watch_loop(&translator, &args, stage, &options)?;
        return Ok(());
    }
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
