//! Configuration file support for jbindgen.
//!
//! jbindgen supports two configuration file locations:
//! - Global: `~/.jbindgen/config.toml` - User-wide defaults
//! - Project: `.jbindgen/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bindings::{BindingLayout, NameFilter, SelectionPolicy};

/// Class name used when nothing else is configured.
pub const DEFAULT_CLASS_NAME: &str = "LapackJNI";

/// Directory holding configuration files.
pub const CONFIG_DIR: &str = ".jbindgen";

/// jbindgen configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Binding output settings
    pub binding: BindingConfig,
}

/// Binding-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Name of the generated class
    pub class_name: Option<String>,

    /// Library passed to `System.loadLibrary` (default: class name)
    pub library_name: Option<String>,

    /// Binding class path (default: `<class_name>.java`)
    pub host_output: Option<PathBuf>,

    /// Native stub path (default: `<class_name>.c`)
    pub native_output: Option<PathBuf>,

    /// Visibility keyword for native methods
    pub visibility: Option<String>,

    /// Which declarations become native methods
    pub select: Option<SelectionPolicy>,

    /// Functions to include (empty = all)
    #[serde(default)]
    pub include_functions: Vec<String>,

    /// Functions to exclude
    #[serde(default)]
    pub exclude_functions: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let ours = &mut self.binding;
        let theirs = other.binding;

        if theirs.class_name.is_some() {
            ours.class_name = theirs.class_name;
        }
        if theirs.library_name.is_some() {
            ours.library_name = theirs.library_name;
        }
        if theirs.host_output.is_some() {
            ours.host_output = theirs.host_output;
        }
        if theirs.native_output.is_some() {
            ours.native_output = theirs.native_output;
        }
        if theirs.visibility.is_some() {
            ours.visibility = theirs.visibility;
        }
        if theirs.select.is_some() {
            ours.select = theirs.select;
        }
        // Lists replace rather than extend
        if !theirs.include_functions.is_empty() {
            ours.include_functions = theirs.include_functions;
        }
        if !theirs.exclude_functions.is_empty() {
            ours.exclude_functions = theirs.exclude_functions;
        }
    }

    /// Output layout, deriving unset names from the class name.
    pub fn layout(&self) -> BindingLayout {
        let b = &self.binding;
        let mut layout = BindingLayout::new(b.class_name.as_deref().unwrap_or(DEFAULT_CLASS_NAME));

        if let Some(name) = &b.library_name {
            layout = layout.with_library_name(name);
        }
        if let Some(path) = &b.host_output {
            layout = layout.with_host_output(path);
        }
        if let Some(path) = &b.native_output {
            layout = layout.with_native_output(path);
        }
        if let Some(visibility) = &b.visibility {
            layout = layout.with_visibility(visibility);
        }

        layout
    }

    /// Selection policy, defaulting to prototypes.
    pub fn policy(&self) -> SelectionPolicy {
        self.binding.select.unwrap_or_default()
    }

    /// Name filter from the include/exclude lists.
    pub fn filter(&self) -> NameFilter {
        NameFilter {
            include: self.binding.include_functions.clone(),
            exclude: self.binding.exclude_functions.clone(),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.jbindgen/config.toml)
/// 2. Global config (~/.jbindgen/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global jbindgen config directory (~/.jbindgen).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR))
}

/// Get the global config path (~/.jbindgen/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.jbindgen/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.toml")
}
