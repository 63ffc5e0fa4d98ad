//! `jbindgen generate` command
//!
//! Resolves inputs and configuration, runs the generator and reports.

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::GenerateArgs;
use jbindgen::frontend::{CSourceFrontend, CompilationDatabase, Language, TranslationUnit};
use jbindgen::ops::{generate, GenerateOptions};
use jbindgen::util::config::{global_config_path, load_config, project_config_path};
use jbindgen::util::diagnostic::{emit, suggestions, unsupported_types_summary};
use jbindgen::util::fs::collect_sources;
use jbindgen::util::{Config, Diagnostic};

pub fn execute(args: GenerateArgs, color: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;

    let global = global_config_path();
    let mut config = load_config(
        global.as_deref().unwrap_or(Path::new("")),
        &project_config_path(&cwd),
    );
    apply_overrides(&mut config, &args);

    let mut units = resolve_units(&cwd, &args, color)?;

    if !args.extra_args.is_empty() {
        tracing::debug!("extra arguments: {}", args.extra_args.join(" "));
    }
    if let Some(language) = Language::from_args(&args.extra_args) {
        units = units
            .into_iter()
            .map(|unit| unit.with_language(language))
            .collect();
    }

    if units.is_empty() {
        tracing::warn!("no source files found; the binding class will be empty");
    }

    let opts = GenerateOptions::new(config.layout(), units)
        .with_policy(config.policy())
        .with_filter(config.filter());

    tracing::info!(
        "generating {} ({} unit(s), {} policy)",
        opts.layout.class_name,
        opts.units.len(),
        opts.policy
    );

    let report = generate(&opts, &CSourceFrontend::new())?;

    if let Some(diag) = unsupported_types_summary(&report.warnings) {
        emit(&diag, color);
    }

    println!("{}", report.summary());

    if report.is_success() {
        return Ok(());
    }

    let failed = report.failures.len();
    for failure in report.failures {
        eprintln!("{:?}", miette::Report::new(failure.error));
    }
    emit(
        &Diagnostic::note("declarations from the files above were not emitted")
            .with_suggestion(suggestions::PARSE_FAILED),
        color,
    );

    bail!("{} translation unit(s) failed to parse", failed)
}

/// Command-line flags win over both config files.
fn apply_overrides(config: &mut Config, args: &GenerateArgs) {
    let binding = &mut config.binding;

    if args.class_name.is_some() {
        binding.class_name = args.class_name.clone();
    }
    if args.library_name.is_some() {
        binding.library_name = args.library_name.clone();
    }
    if args.host_output.is_some() {
        binding.host_output = args.host_output.clone();
    }
    if args.native_output.is_some() {
        binding.native_output = args.native_output.clone();
    }
    if args.select.is_some() {
        binding.select = args.select;
    }
    if !args.include_functions.is_empty() {
        binding.include_functions = args.include_functions.clone();
    }
    if !args.exclude_functions.is_empty() {
        binding.exclude_functions = args.exclude_functions.clone();
    }
}

/// Sources from the command line, else from a compilation database.
fn resolve_units(cwd: &Path, args: &GenerateArgs, color: bool) -> Result<Vec<TranslationUnit>> {
    if !args.sources.is_empty() {
        if args.compdb.is_some() {
            tracing::debug!("sources given on the command line; ignoring --compdb");
        }
        let files = collect_sources(cwd, &args.sources)?;
        return Ok(files.into_iter().map(TranslationUnit::new).collect());
    }

    let db_path = match &args.compdb {
        Some(path) => Some(cwd.join(path)),
        None => CompilationDatabase::discover(cwd),
    };

    let Some(db_path) = db_path else {
        let diag = Diagnostic::error("no input sources")
            .with_location(cwd)
            .with_context("no compile_commands.json in the working directory or its parents")
            .with_suggestion(suggestions::NO_SOURCES)
            .with_suggestion(suggestions::USE_COMPDB);
        emit(&diag, color);
        bail!("nothing to generate");
    };

    let db = CompilationDatabase::load(&db_path)?;
    tracing::info!("using compilation database {}", db.path.display());
    Ok(db.units())
}
