//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use jbindgen::bindings::SelectionPolicy;

/// jbindgen - Generate Java native method bindings from C declarations
#[derive(Parser)]
#[command(name = "jbindgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a binding class and native stub file
    Generate(GenerateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Header or source files, directories, or glob patterns
    pub sources: Vec<String>,

    /// Path to compile_commands.json or the directory containing it
    #[arg(short = 'p', long = "compdb", value_name = "PATH")]
    pub compdb: Option<PathBuf>,

    /// Name of the generated class
    #[arg(long, value_name = "NAME")]
    pub class_name: Option<String>,

    /// Library loaded by the generated class (defaults to the class name)
    #[arg(long, value_name = "NAME")]
    pub library_name: Option<String>,

    /// Binding class output path (defaults to <CLASS_NAME>.java)
    #[arg(short = 'o', long, value_name = "PATH")]
    pub host_output: Option<PathBuf>,

    /// Native stub output path (defaults to <CLASS_NAME>.c)
    #[arg(long, value_name = "PATH")]
    pub native_output: Option<PathBuf>,

    /// Which declarations become native methods
    #[arg(long, value_name = "POLICY")]
    pub select: Option<SelectionPolicy>,

    /// Only bind these functions (repeatable)
    #[arg(long = "include-function", value_name = "NAME")]
    pub include_functions: Vec<String>,

    /// Never bind these functions (repeatable)
    #[arg(long = "exclude-function", value_name = "NAME")]
    pub exclude_functions: Vec<String>,

    /// Extra compiler arguments (e.g. `-- -x c++`)
    #[arg(last = true, value_name = "EXTRA_ARGS")]
    pub extra_args: Vec<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
