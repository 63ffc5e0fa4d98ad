//! Filesystem utilities.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Extensions picked up when walking a directory.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "h", "c", "hpp", "hh", "hxx", "cpp", "cc", "cxx", "c++", "H", "C",
];

/// Check if a path has a C or C++ source/header extension.
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
        .unwrap_or(false)
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        // Make pattern absolute by joining with base
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Recursively list C/C++ sources under `dir`, sorted.
pub fn walk_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", dir.display()))?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            results.push(entry.into_path());
        }
    }

    results.sort();
    Ok(results)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

/// Expand command-line inputs into source files.
///
/// Each input is a file, a directory (walked for sources) or a glob
/// pattern. Order follows the inputs; duplicates keep their first position.
pub fn collect_sources(base: &Path, inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut results: Vec<PathBuf> = Vec::new();

    for input in inputs {
        let path = base.join(input);

        let found = if path.is_dir() {
            walk_sources(&path)?
        } else if path.is_file() {
            vec![path]
        } else if is_glob_pattern(input) {
            let matches = glob_files(base, std::slice::from_ref(input))?;
            if matches.is_empty() {
                tracing::warn!("pattern `{}` matched no files", input);
            }
            matches
        } else {
            bail!("source not found: {}", path.display());
        };

        for file in found {
            if !results.contains(&file) {
                results.push(file);
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("main.c"), "int main() {}").unwrap();
        fs::write(src.join("util.c"), "void util() {}").unwrap();
        fs::write(src.join("readme.txt"), "readme").unwrap();

        let files = glob_files(tmp.path(), &["src/**/*.c".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_walk_sources_sorted() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("include/detail");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("include/z.h"), "").unwrap();
        fs::write(tmp.path().join("include/a.hpp"), "").unwrap();
        fs::write(nested.join("m.c"), "").unwrap();
        fs::write(nested.join("notes.md"), "").unwrap();

        let files = walk_sources(&tmp.path().join("include")).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("include/a.hpp"),
                PathBuf::from("include/detail/m.c"),
                PathBuf::from("include/z.h"),
            ]
        );
    }

    #[test]
    fn test_collect_sources_mixed() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("inc")).unwrap();
        fs::write(tmp.path().join("inc/b.h"), "").unwrap();
        fs::write(tmp.path().join("inc/a.h"), "").unwrap();
        fs::write(tmp.path().join("main.c"), "").unwrap();

        let inputs = vec![
            "main.c".to_string(),
            "inc".to_string(),
            "inc/*.h".to_string(),
        ];
        let files = collect_sources(tmp.path(), &inputs).unwrap();
        assert_eq!(
            files,
            vec![
                tmp.path().join("main.c"),
                tmp.path().join("inc/a.h"),
                tmp.path().join("inc/b.h"),
            ]
        );
    }

    #[test]
    fn test_collect_sources_missing() {
        let tmp = TempDir::new().unwrap();
        let err = collect_sources(tmp.path(), &["absent.h".to_string()]).unwrap_err();
        assert!(err.to_string().contains("source not found"));
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("lapack.h")));
        assert!(is_source_file(Path::new("solver.cpp")));
        assert!(!is_source_file(Path::new("README.md")));
        assert!(!is_source_file(Path::new("Makefile")));
    }
}
