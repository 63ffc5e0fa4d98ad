//! Binding generation operation.
//!
//! Drives a front-end over every translation unit, forwards eligible
//! declarations to a [`BindingEmitter`] and reports what happened.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::bindings::{
    BindingEmitter, BindingLayout, DeclarationSelector, NameFilter, SelectionPolicy,
    SelectionStats, UnsupportedType,
};
use crate::frontend::{Frontend, ParseError, TranslationUnit, TraversalError};

/// Options for a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Output names and paths
    pub layout: BindingLayout,

    /// Which declarations become native methods
    pub policy: SelectionPolicy,

    /// Name-based include/exclude lists
    pub filter: NameFilter,

    /// Units to traverse, in order
    pub units: Vec<TranslationUnit>,
}

impl GenerateOptions {
    /// Create options with the default policy and no filter.
    pub fn new(layout: BindingLayout, units: Vec<TranslationUnit>) -> Self {
        GenerateOptions {
            layout,
            policy: SelectionPolicy::default(),
            filter: NameFilter::default(),
            units,
        }
    }

    /// Set the selection policy.
    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the name filter.
    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// A unit that could not be parsed.
#[derive(Debug)]
pub struct UnitFailure {
    pub path: PathBuf,
    pub error: ParseError,
}

/// Result of a generation run.
#[derive(Debug)]
pub struct GenerateReport {
    /// Binding class written
    pub host_output: PathBuf,

    /// Native stub file written
    pub native_output: PathBuf,

    /// Units traversed
    pub units: usize,

    /// Units skipped because they failed to parse
    pub failures: Vec<UnitFailure>,

    /// Selection counters across all units
    pub stats: SelectionStats,

    /// Native methods written
    pub emitted: usize,

    /// Repeated declarations dropped
    pub duplicates: usize,

    /// Unsupported types in written methods
    pub warnings: Vec<UnsupportedType>,
}

impl GenerateReport {
    /// Whether every unit parsed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Declarations rejected by the policy or the name filter.
    pub fn skipped(&self) -> usize {
        self.stats.ineligible + self.stats.filtered
    }

    /// One-line summary for the terminal.
    pub fn summary(&self) -> String {
        format!(
            "wrote {} native method(s) to {} from {} unit(s) ({} skipped, {} duplicate, {} failed)",
            self.emitted,
            self.host_output.display(),
            self.units,
            self.skipped(),
            self.duplicates,
            self.failures.len()
        )
    }
}

/// Generate the binding class and native stub file.
///
/// Output sinks are opened before any unit is traversed, so an unwritable
/// destination fails the run without parsing anything. Units that fail to
/// parse are recorded and skipped. A write failure aborts the run and leaves
/// existing outputs untouched.
pub fn generate(opts: &GenerateOptions, frontend: &dyn Frontend) -> Result<GenerateReport> {
    let mut emitter = BindingEmitter::open(opts.layout.clone()).with_context(|| {
        format!("failed to open binding output for `{}`", opts.layout.class_name)
    })?;

    let mut failures = Vec::new();
    let mut selector =
        DeclarationSelector::new(&mut emitter, opts.policy).with_filter(opts.filter.clone());

    for unit in &opts.units {
        tracing::debug!("traversing {} as {}", unit.path.display(), unit.language);

        let result =
            frontend.for_each_function_decl(unit, &mut |decl| selector.on_declaration(decl));

        match result {
            Ok(()) => {}
            Err(TraversalError::Parse(error)) => {
                tracing::error!("{}: {}", unit.path.display(), error);
                failures.push(UnitFailure {
                    path: unit.path.clone(),
                    error,
                });
            }
            Err(TraversalError::Visit(error)) => {
                drop(selector);
                emitter.discard();
                return Err(error)
                    .with_context(|| format!("failed while processing {}", unit.path.display()));
            }
        }
    }

    let stats = selector.stats();
    emitter.close()?;

    Ok(GenerateReport {
        host_output: opts.layout.host_output.clone(),
        native_output: opts.layout.native_output.clone(),
        units: opts.units.len(),
        failures,
        stats,
        emitted: emitter.declaration_count(),
        duplicates: emitter.duplicate_count(),
        warnings: emitter.warnings().to_vec(),
    })
}
