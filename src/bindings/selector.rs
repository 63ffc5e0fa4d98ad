//! Selection of declarations for binding generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::emitter::BindingEmitter;
use super::error::Result;
use super::types::{FunctionSignature, Parameter};
use crate::frontend::FunctionDecl;

/// Which declarations are eligible for a native method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Everything except definitions that carry a full prototype.
    ///
    /// This selects plain prototypes and skips implemented functions,
    /// matching the behavior existing binding files were generated with.
    #[default]
    Prototypes,

    /// Only functions defined (with a body) in the translation unit.
    Definitions,
}

impl SelectionPolicy {
    /// Evaluate the policy for one declaration.
    pub fn is_eligible(&self, decl: &FunctionDecl) -> bool {
        match self {
            SelectionPolicy::Prototypes => !(decl.is_definition && decl.has_prototype),
            SelectionPolicy::Definitions => decl.is_definition,
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::Prototypes => write!(f, "prototypes"),
            SelectionPolicy::Definitions => write!(f, "definitions"),
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prototypes" => Ok(SelectionPolicy::Prototypes),
            "definitions" => Ok(SelectionPolicy::Definitions),
            _ => Err(format!(
                "invalid selection policy '{}'; expected 'prototypes' or 'definitions'",
                s
            )),
        }
    }
}

/// Name-based include/exclude lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilter {
    /// Functions to include (empty = all)
    pub include: Vec<String>,
    /// Functions to exclude
    pub exclude: Vec<String>,
}

impl NameFilter {
    /// Check if a function should be included.
    pub fn allows(&self, name: &str) -> bool {
        // Check exclusions first
        if self.exclude.iter().any(|e| e == name) {
            return false;
        }

        // If include list is empty, include all
        if self.include.is_empty() {
            return true;
        }

        self.include.iter().any(|i| i == name)
    }
}

/// Counters kept while selecting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionStats {
    /// Declarations delivered by the traversal
    pub seen: usize,
    /// Declarations forwarded to the emitter
    pub selected: usize,
    /// Declarations rejected by the policy
    pub ineligible: usize,
    /// Declarations rejected by the name filter
    pub filtered: usize,
}

/// Traversal callback that forwards eligible declarations to an emitter.
pub struct DeclarationSelector<'a> {
    emitter: &'a mut BindingEmitter,
    policy: SelectionPolicy,
    filter: NameFilter,
    stats: SelectionStats,
}

impl<'a> DeclarationSelector<'a> {
    /// Create a selector writing into `emitter`.
    pub fn new(emitter: &'a mut BindingEmitter, policy: SelectionPolicy) -> Self {
        DeclarationSelector {
            emitter,
            policy,
            filter: NameFilter::default(),
            stats: SelectionStats::default(),
        }
    }

    /// Set the name filter.
    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Handle one declaration from the traversal.
    pub fn on_declaration(&mut self, decl: &FunctionDecl) -> Result<()> {
        self.stats.seen += 1;

        if !self.policy.is_eligible(decl) {
            tracing::debug!(
                "skipping `{}` at {}:{} (definition: {}, prototype: {})",
                decl.name,
                decl.file.display(),
                decl.line,
                decl.is_definition,
                decl.has_prototype
            );
            self.stats.ineligible += 1;
            return Ok(());
        }

        if !self.filter.allows(&decl.name) {
            tracing::debug!("`{}` filtered out by name", decl.name);
            self.stats.filtered += 1;
            return Ok(());
        }

        if decl.is_variadic {
            tracing::warn!(
                "`{}` is variadic; the native method omits the variadic arguments",
                decl.name
            );
        }

        let signature = extract_signature(decl);
        tracing::debug!(
            "found `{}`: {} ({})",
            signature.name,
            signature.return_type,
            signature
                .parameters
                .iter()
                .map(|p| p.ty.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.emitter.add_declaration(&signature)?;
        self.stats.selected += 1;
        Ok(())
    }

    /// Counters so far.
    pub fn stats(&self) -> SelectionStats {
        self.stats
    }
}

/// Build the emitter's view of a declaration.
fn extract_signature(decl: &FunctionDecl) -> FunctionSignature {
    FunctionSignature {
        name: decl.name.clone(),
        return_type: decl.return_type.clone(),
        parameters: decl
            .params
            .iter()
            .map(|p| Parameter::new(p.name.clone(), p.ty.clone()))
            .collect(),
    }
}
