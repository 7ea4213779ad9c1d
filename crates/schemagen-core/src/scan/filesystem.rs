//! Source file discovery.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::errors::{SchemaGenError, SchemaGenResult};

const SOURCE_EXTENSION: &str = "go";

const TEST_SUFFIX: &str = "_test.go";

const IMPLICIT_IGNORED_DIRS: &[&str] = &[".git", "vendor", "testdata"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Descend into subdirectories; only the top level is scanned otherwise.
    pub recursive: bool,
    pub include_tests: bool,
    /// Glob patterns (`*`, `?`) matched against the relative path or file name.
    pub exclude: Vec<String>,
}

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(SOURCE_EXTENSION))
        .unwrap_or(false)
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(TEST_SUFFIX))
        .unwrap_or(false)
}

fn matches_pattern(rel_path: &str, pattern: &str) -> bool {
    let normalized = rel_path.replace('\\', "/");
    glob_match(&normalized, pattern)
        || glob_match(
            Path::new(&normalized)
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default()
                .as_str(),
            pattern,
        )
}

fn glob_match(text: &str, pattern: &str) -> bool {
    let t_chars: Vec<char> = text.chars().collect();
    let p_chars: Vec<char> = pattern.chars().collect();
    let (tl, pl) = (t_chars.len(), p_chars.len());
    let mut dp = vec![vec![false; pl + 1]; tl + 1];
    dp[0][0] = true;
    for j in 1..=pl {
        if p_chars[j - 1] == '*' {
            dp[0][j] = dp[0][j - 1];
        }
    }
    for i in 1..=tl {
        for j in 1..=pl {
            if p_chars[j - 1] == '*' {
                dp[i][j] = dp[i][j - 1] || dp[i - 1][j];
            } else if p_chars[j - 1] == '?' || t_chars[i - 1] == p_chars[j - 1] {
                dp[i][j] = dp[i - 1][j - 1];
            }
        }
    }
    dp[tl][pl]
}

fn is_implicitly_ignored(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    IMPLICIT_IGNORED_DIRS.iter().any(|d| *d == name)
}

/// List candidate source files under `dir`, sorted by path.
pub fn discover_source_files(dir: &Path, options: &DiscoveryOptions) -> SchemaGenResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SchemaGenError::Discovery(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if !options.recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_implicitly_ignored(e)) {
        let entry = entry.map_err(|e| SchemaGenError::Discovery(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_source_file(path) {
            continue;
        }
        if !options.include_tests && is_test_file(path) {
            continue;
        }
        let rel = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        if options.exclude.iter().any(|p| matches_pattern(&rel, p)) {
            debug!("excluded {rel}");
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "package x\n").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn glob_match_wildcards() {
        assert!(glob_match("gen_user.go", "gen_*.go"));
        assert!(glob_match("a.go", "?.go"));
        assert!(!glob_match("ab.go", "?.go"));
    }

    #[test]
    fn top_level_go_files_only_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "user.go");
        touch(tmp.path(), "order.go");
        touch(tmp.path(), "README.md");
        touch(tmp.path(), "user_test.go");
        touch(tmp.path(), "nested/item.go");

        let files = discover_source_files(tmp.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(names(tmp.path(), &files), vec!["order.go", "user.go"]);
    }

    #[test]
    fn recursive_skips_vendor_and_honours_excludes() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "user.go");
        touch(tmp.path(), "nested/item.go");
        touch(tmp.path(), "nested/gen_item.go");
        touch(tmp.path(), "vendor/lib/lib.go");
        touch(tmp.path(), "user_test.go");

        let options = DiscoveryOptions {
            recursive: true,
            include_tests: true,
            exclude: vec!["gen_*.go".to_string()],
        };
        let files = discover_source_files(tmp.path(), &options).unwrap();
        assert_eq!(
            names(tmp.path(), &files),
            vec!["nested/item.go", "user.go", "user_test.go"]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_source_files(&tmp.path().join("absent"), &DiscoveryOptions::default())
            .unwrap_err();
        assert!(matches!(err, SchemaGenError::Discovery(_)));
    }
}
