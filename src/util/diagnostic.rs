//! User-friendly diagnostic messages.
//!
//! Run summaries and failures are reported with the problem, the lines
//! that caused it, and what to try next.

use std::fmt;
use std::path::PathBuf;

use crate::bindings::UnsupportedType;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no sources and no compilation database are found.
    pub const NO_SOURCES: &str =
        "Pass header or source files: `jbindgen generate include/lapack.h`";

    /// Suggestion for pointing at a compilation database.
    pub const USE_COMPDB: &str =
        "Point at a compilation database: `jbindgen generate -p build/`";

    /// Suggestion when declarations use unsupported types.
    pub const UNSUPPORTED_TYPES: &str =
        "Methods containing `???` will not compile; exclude them with `--exclude-function`";

    /// Suggestion when a unit fails to parse.
    pub const PARSE_FAILED: &str = "Run `jbindgen --verbose generate` for more details";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    fn with_severity(message: impl Into<String>, severity: Severity) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Error)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Warning)
    }

    /// Create a new note.
    pub fn note(message: impl Into<String>) -> Self {
        Self::with_severity(message, Severity::Note)
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m".to_string(),
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m".to_string(),
                Severity::Note => "\x1b[1;36mnote\x1b[0m".to_string(),
            }
        } else {
            self.severity.to_string()
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Summarize unsupported-type warnings from a run.
///
/// Returns `None` when there is nothing to report.
pub fn unsupported_types_summary(warnings: &[UnsupportedType]) -> Option<Diagnostic> {
    if warnings.is_empty() {
        return None;
    }

    let mut functions: Vec<&str> = warnings.iter().map(|w| w.function.as_str()).collect();
    functions.dedup();

    let mut diag = Diagnostic::warning(format!(
        "{} unsupported type(s) in {} native method(s)",
        warnings.len(),
        functions.len()
    ));
    for warning in warnings {
        diag = diag.with_context(warning.to_string());
    }
    Some(diag.with_suggestion(suggestions::UNSUPPORTED_TYPES))
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
