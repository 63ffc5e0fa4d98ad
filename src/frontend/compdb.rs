//! `compile_commands.json` support.
//!
//! The database is the usual way to hand a whole project to the generator:
//! every entry names one translation unit and the arguments it was compiled
//! with. Only the file list and the language are used.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Language, TranslationUnit};

/// File name looked up in directories.
pub const DATABASE_FILE: &str = "compile_commands.json";

/// One compile_commands.json entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// Working directory of the compilation
    pub directory: PathBuf,

    /// Main translation unit source
    pub file: PathBuf,

    /// Compiler invocation as an argument vector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,

    /// Compiler invocation as a single shell-quoted string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// Source file resolved against the entry's directory.
    pub fn source_path(&self) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            self.directory.join(&self.file)
        }
    }

    /// Argument vector, splitting `command` when `arguments` is absent.
    pub fn args(&self) -> Vec<String> {
        if let Some(args) = &self.arguments {
            return args.clone();
        }

        self.command.as_deref().map(split_command).unwrap_or_default()
    }

    /// Language from the arguments, falling back to the file extension.
    pub fn language(&self) -> Language {
        Language::from_args(&self.args()).unwrap_or_else(|| Language::from_path(&self.file))
    }
}

/// A loaded compilation database.
#[derive(Debug, Clone, Default)]
pub struct CompilationDatabase {
    /// Path the database was read from
    pub path: PathBuf,

    /// Entries in file order
    pub commands: Vec<CompileCommand>,
}

impl CompilationDatabase {
    /// Load from a `compile_commands.json` file or a directory holding one.
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.is_dir() {
            path.join(DATABASE_FILE)
        } else {
            path.to_path_buf()
        };

        if !file.exists() {
            bail!("no compilation database at {}", file.display());
        }

        let content = std::fs::read_to_string(&file)
            .with_context(|| format!("failed to read {}", file.display()))?;

        let commands: Vec<CompileCommand> = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", file.display()))?;

        tracing::debug!("loaded {} entries from {}", commands.len(), file.display());

        Ok(CompilationDatabase {
            path: file,
            commands,
        })
    }

    /// Find a database in `start` or any of its ancestors.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(DATABASE_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Source files, deduplicated in first-seen order.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.commands
            .iter()
            .map(CompileCommand::source_path)
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Translation units, one per distinct source file.
    ///
    /// The first command for a file decides its language.
    pub fn units(&self) -> Vec<TranslationUnit> {
        self.source_files()
            .into_iter()
            .filter_map(|path| {
                let cmd = self.commands.iter().find(|cmd| cmd.source_path() == path)?;
                Some(TranslationUnit::new(path).with_language(cmd.language()))
            })
            .collect()
    }
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""((?:[^"\\]|\\.)*)"|'([^']*)'|([^\s"']+)"#).expect("valid command pattern")
    })
}

/// Split a shell-style command line into words.
///
/// Handles double quotes with backslash escapes and single quotes. Quoted
/// text glued to unquoted text (`-DNAME="x y"`) is kept as separate words.
pub fn split_command(command: &str) -> Vec<String> {
    word_pattern()
        .captures_iter(command)
        .filter_map(|caps| {
            if let Some(m) = caps.get(1) {
                Some(m.as_str().replace("\\\"", "\"").replace("\\\\", "\\"))
            } else {
                caps.get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
            }
        })
        .collect()
}
