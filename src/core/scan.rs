//! Source file discovery.
//!
//! Walks the configured include directories and returns the files the
//! active framework can process, minus ignore globs and test files.

use std::path::Path;

use glob::Pattern;
use walkdir::WalkDir;

use crate::config::{Config, TEST_FILE_PATTERNS};
use crate::library::Framework;
use crate::utils::normalize_path;

const REACT_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js"];
const VUE_EXTENSIONS: &[&str] = &["vue"];

pub fn framework_extensions(framework: Framework) -> &'static [&'static str] {
    match framework {
        Framework::React => REACT_EXTENSIONS,
        Framework::Vue => VUE_EXTENSIONS,
    }
}

/// Scan for processable source files under the config's include roots.
///
/// Returned paths are relative to `root_dir`, normalized to forward
/// slashes, and sorted for deterministic processing order.
pub fn scan_files(root_dir: &Path, config: &Config) -> Vec<String> {
    let extensions = framework_extensions(config.framework);
    let ignore_patterns: Vec<Pattern> = config
        .ignores
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();
    let test_patterns: Vec<Pattern> = if config.ignore_test_files {
        TEST_FILE_PATTERNS
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect()
    } else {
        Vec::new()
    };

    let mut files = Vec::new();
    for include in &config.includes {
        let include_root = root_dir.join(&config.source_root).join(include);
        if !include_root.exists() {
            continue;
        }
        for entry in WalkDir::new(&include_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            if !extensions.contains(&ext) {
                continue;
            }
            let relative = path
                .strip_prefix(root_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            let relative = normalize_path(&relative);

            if ignore_patterns.iter().any(|p| p.matches(&relative))
                || test_patterns.iter().any(|p| p.matches(&relative))
            {
                continue;
            }
            files.push(relative);
        }
    }

    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// empty\n").unwrap();
    }

    #[test]
    fn test_scan_react_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/App.tsx");
        touch(dir.path(), "src/forms/Login.tsx");
        touch(dir.path(), "src/util.ts");
        touch(dir.path(), "src/styles.css");
        touch(dir.path(), "src/Page.vue");

        let config = Config::default();
        let files = scan_files(dir.path(), &config);
        assert_eq!(
            files,
            vec!["src/App.tsx", "src/forms/Login.tsx", "src/util.ts"]
        );
    }

    #[test]
    fn test_scan_vue_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/App.vue");
        touch(dir.path(), "src/App.tsx");

        let config = Config {
            framework: Framework::Vue,
            ..Default::default()
        };
        let files = scan_files(dir.path(), &config);
        assert_eq!(files, vec!["src/App.vue"]);
    }

    #[test]
    fn test_ignore_globs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/App.tsx");
        touch(dir.path(), "src/generated/Api.ts");

        let config = Config {
            ignores: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let files = scan_files(dir.path(), &config);
        assert_eq!(files, vec!["src/App.tsx"]);
    }

    #[test]
    fn test_test_files_ignored_by_default() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/App.tsx");
        touch(dir.path(), "src/App.test.tsx");
        touch(dir.path(), "src/__tests__/helpers.ts");

        let config = Config::default();
        let files = scan_files(dir.path(), &config);
        assert_eq!(files, vec!["src/App.tsx"]);

        let keep_tests = Config {
            ignore_test_files: false,
            ..Default::default()
        };
        let files = scan_files(dir.path(), &keep_tests);
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_missing_include_dir_skipped() {
        let dir = tempdir().unwrap();
        let config = Config {
            includes: vec!["nonexistent".to_string()],
            ..Default::default()
        };
        assert!(scan_files(dir.path(), &config).is_empty());
    }
}
