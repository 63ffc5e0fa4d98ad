//! C front-end for binding generation.
//!
//! The generator only sees function declarations through the [`Frontend`]
//! trait. [`CSourceFrontend`] is the bundled implementation: a lexer and a
//! top-level declaration scanner that understands the flat subset of C the
//! generator can map (pointers, enums, builtin scalars).

pub mod compdb;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::bindings::error::BindingError;
use crate::bindings::types::CTypeDescriptor;

pub use compdb::CompilationDatabase;
pub use parser::DeclarationParser;

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    C,
    Cpp,
}

impl Language {
    /// Guess the language from a file extension.
    ///
    /// Uppercase `.C` and `.H` are C++ on case-sensitive filesystems.
    pub fn from_path(path: &Path) -> Language {
        let Some(ext) = path.extension() else {
            return Language::C;
        };

        match ext.to_string_lossy().as_ref() {
            "cpp" | "cc" | "cxx" | "c++" | "CPP" | "CC" | "CXX" | "C" | "hpp" | "hh" | "hxx"
            | "H" => Language::Cpp,
            _ => Language::C,
        }
    }

    /// Language forced by compiler arguments (`-x c++`, `-xc`, `--language=c`).
    pub fn from_args(args: &[String]) -> Option<Language> {
        let mut iter = args.iter();
        let mut forced = None;

        while let Some(arg) = iter.next() {
            let value = if arg == "-x" || arg == "--language" {
                iter.next().map(String::as_str)
            } else if let Some(v) = arg.strip_prefix("--language=") {
                Some(v)
            } else {
                arg.strip_prefix("-x")
            };

            match value {
                Some("c" | "c-header") => forced = Some(Language::C),
                Some("c++" | "c++-header") => forced = Some(Language::Cpp),
                _ => {}
            }
        }

        forced
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::C => write!(f, "C"),
            Language::Cpp => write!(f, "C++"),
        }
    }
}

/// One input file handed to the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Source file path
    pub path: PathBuf,

    /// Language the file is parsed as
    pub language: Language,
}

impl TranslationUnit {
    /// Create a unit, deriving the language from the extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        TranslationUnit {
            language: Language::from_path(&path),
            path,
        }
    }

    /// Override the language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// A function parameter as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    /// Parameter name (empty when the prototype omits it)
    pub name: String,

    /// Classified type
    pub ty: CTypeDescriptor,
}

impl ParamDecl {
    /// Create a new parameter.
    pub fn new(name: impl Into<String>, ty: CTypeDescriptor) -> Self {
        ParamDecl {
            name: name.into(),
            ty,
        }
    }
}

/// A function declaration found in a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDecl {
    /// Function name
    pub name: String,

    /// Classified return type
    pub return_type: CTypeDescriptor,

    /// Parameters in source order (excluding `...`)
    pub params: Vec<ParamDecl>,

    /// Whether this declaration carries a body
    pub is_definition: bool,

    /// Whether the parameter list is a prototype (C `f()` is not)
    pub has_prototype: bool,

    /// Whether the function takes `...`
    pub is_variadic: bool,

    /// File the declaration was found in
    pub file: PathBuf,

    /// 1-based line of the function name
    pub line: usize,
}

/// A translation unit that could not be parsed.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ParseError {
    #[error("failed to read `{}`", .path.display())]
    #[diagnostic(code(jbindgen::frontend::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{message}")]
    #[diagnostic(
        code(jbindgen::frontend::syntax),
        help("no declarations from this file were emitted")
    )]
    Syntax {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// Create a syntax error pointing at `offset..offset + len` in `source`.
    pub fn syntax(
        path: &Path,
        source: &str,
        message: impl Into<String>,
        offset: usize,
        len: usize,
    ) -> Self {
        ParseError::Syntax {
            message: message.into(),
            src: NamedSource::new(path.display().to_string(), source.to_string()),
            span: (offset, len).into(),
        }
    }
}

/// Failure while traversing one translation unit.
#[derive(Debug, Error)]
pub enum TraversalError {
    /// The unit could not be parsed; nothing from it was visited.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The visitor failed; the run cannot continue.
    #[error(transparent)]
    Visit(#[from] BindingError),
}

/// Callback invoked once per function declaration, in document order.
pub type DeclVisitor<'v> = dyn FnMut(&FunctionDecl) -> Result<(), BindingError> + 'v;

/// Source of function declarations.
pub trait Frontend {
    /// Invoke `visit` for every function declaration in `unit`.
    ///
    /// A unit that fails to parse must not reach `visit` at all.
    fn for_each_function_decl(
        &self,
        unit: &TranslationUnit,
        visit: &mut DeclVisitor<'_>,
    ) -> Result<(), TraversalError>;
}

/// Front-end backed by [`DeclarationParser`].
#[derive(Debug, Clone, Default)]
pub struct CSourceFrontend;

impl CSourceFrontend {
    /// Create a new front-end.
    pub fn new() -> Self {
        CSourceFrontend
    }

    /// Parse a unit into its function declarations.
    pub fn parse_unit(&self, unit: &TranslationUnit) -> Result<Vec<FunctionDecl>, ParseError> {
        let content = std::fs::read_to_string(&unit.path).map_err(|source| ParseError::Read {
            path: unit.path.clone(),
            source,
        })?;

        DeclarationParser::new(unit.language).parse(&content, &unit.path)
    }
}

impl Frontend for CSourceFrontend {
    fn for_each_function_decl(
        &self,
        unit: &TranslationUnit,
        visit: &mut DeclVisitor<'_>,
    ) -> Result<(), TraversalError> {
        let decls = self.parse_unit(unit)?;
        tracing::debug!(
            "{}: {} function declaration(s)",
            unit.path.display(),
            decls.len()
        );

        for decl in &decls {
            visit(decl)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("lapack.h")), Language::C);
        assert_eq!(Language::from_path(Path::new("solver.c")), Language::C);
        assert_eq!(Language::from_path(Path::new("solver.cpp")), Language::Cpp);
        assert_eq!(Language::from_path(Path::new("solver.C")), Language::Cpp);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::C);
    }

    #[test]
    fn test_language_from_args() {
        let args = |a: &[&str]| a.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(Language::from_args(&args(&["-x", "c++"])), Some(Language::Cpp));
        assert_eq!(Language::from_args(&args(&["-xc"])), Some(Language::C));
        assert_eq!(Language::from_args(&args(&["--language=c++-header"])), Some(Language::Cpp));
        assert_eq!(Language::from_args(&args(&["-O2", "-Wall"])), None);
    }

    #[test]
    fn test_visits_in_document_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("math.h");
        std::fs::write(&path, "double first(double);\nint second(void);\n").unwrap();

        let mut names = Vec::new();
        CSourceFrontend::new()
            .for_each_function_decl(&TranslationUnit::new(&path), &mut |decl| {
                names.push(decl.name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_parse_failure_visits_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.h");
        std::fs::write(&path, "int ok(void);\nint broken(void { \n").unwrap();

        let mut visited = 0;
        let err = CSourceFrontend::new()
            .for_each_function_decl(&TranslationUnit::new(&path), &mut |_| {
                visited += 1;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, TraversalError::Parse(ParseError::Syntax { .. })));
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let unit = TranslationUnit::new(tmp.path().join("absent.h"));
        let err = CSourceFrontend::new().parse_unit(&unit).unwrap_err();
        assert!(matches!(err, ParseError::Read { .. }));
    }
}
