// src/watch/rules.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// How watch targets are interpreted.
///
/// - `Glob`: each target is a shell-glob pattern; the watch root is derived
///   from the pattern's literal prefix.
/// - `Tree`: each target is a directory; everything under it is relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Glob,
    Tree,
}

/// A watch root plus its compiled match predicates.
///
/// Patterns are absolute and deduplicated; a path is relevant to this rule
/// if it lies under `root` and matches any pattern. Rules are built once at
/// startup and never change afterwards.
#[derive(Clone)]
pub struct WatchRule {
    root: PathBuf,
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    /// Directory handed to the filesystem watcher.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute patterns, for announcement and dry-run output.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if a changed path is relevant to this rule.
    ///
    /// Matching is anchored to the full absolute path, not the basename.
    pub fn matches(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && self.set.is_match(path)
    }
}

/// Compile watch targets into rules, grouped by watch root.
///
/// Glob mode derives each pattern's root as its longest literal prefix
/// directory and merges patterns that share a root; tree mode turns each
/// directory into a `<dir>/**` rule. Duplicate patterns and roots collapse.
pub fn build_watch_rules(targets: &[String], mode: AddressingMode) -> Result<Vec<WatchRule>> {
    let mut by_root: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();

    for target in targets {
        match mode {
            AddressingMode::Glob => {
                let pattern = absolutize(target)?;
                let root = watch_root_of(&pattern);
                by_root
                    .entry(root)
                    .or_default()
                    .insert(pattern.to_string_lossy().into_owned());
            }
            AddressingMode::Tree => {
                let root = absolutize(target)?;
                // Best-effort: leave the path alone if it cannot be resolved;
                // the watcher will report a proper error when watching starts.
                let root = root.canonicalize().unwrap_or(root);
                let pattern = format!("{}/**", root.display());
                by_root.entry(root).or_default().insert(pattern);
            }
        }
    }

    let mut rules = Vec::with_capacity(by_root.len());
    for (root, patterns) in by_root {
        let patterns: Vec<String> = patterns.into_iter().collect();
        let set = build_globset(&patterns)
            .with_context(|| format!("building globset for watch root {root:?}"))?;
        rules.push(WatchRule {
            root,
            patterns,
            set,
        });
    }

    Ok(rules)
}

/// Make a target absolute against the current working directory.
fn absolutize(target: &str) -> Result<PathBuf> {
    let path = Path::new(target);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    let cwd = cwd.canonicalize().unwrap_or(cwd);
    Ok(cwd.join(path))
}

/// Longest prefix of `pattern` containing no glob metacharacters.
///
/// A fully literal pattern names a file, so its parent directory is watched.
fn watch_root_of(pattern: &Path) -> PathBuf {
    let mut root = PathBuf::new();
    let mut saw_glob = false;

    for component in pattern.components() {
        let segment = component.as_os_str().to_string_lossy();
        if segment.contains(['*', '?', '[', '{']) {
            saw_glob = true;
            break;
        }
        root.push(component);
    }

    if !saw_glob {
        root.pop();
    }
    root
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob =
            Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_for(targets: &[&str], mode: AddressingMode) -> Vec<WatchRule> {
        let targets: Vec<String> = targets.iter().map(|s| s.to_string()).collect();
        build_watch_rules(&targets, mode).unwrap()
    }

    #[test]
    fn glob_root_is_literal_prefix() {
        let rules = rules_for(&["/proj/src/*.rs"], AddressingMode::Glob);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].root(), Path::new("/proj/src"));
    }

    #[test]
    fn literal_pattern_watches_parent_directory() {
        let rules = rules_for(&["/proj/Makefile"], AddressingMode::Glob);
        assert_eq!(rules[0].root(), Path::new("/proj"));
        assert!(rules[0].matches(Path::new("/proj/Makefile")));
        assert!(!rules[0].matches(Path::new("/proj/other")));
    }

    #[test]
    fn patterns_sharing_a_root_merge_and_dedupe() {
        let rules = rules_for(
            &["/proj/src/*.rs", "/proj/src/*.toml", "/proj/src/*.rs"],
            AddressingMode::Glob,
        );
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].patterns().len(), 2);
    }

    #[test]
    fn glob_match_is_anchored_to_absolute_path() {
        let rules = rules_for(&["/proj/src/*.rs"], AddressingMode::Glob);
        assert!(rules[0].matches(Path::new("/proj/src/main.rs")));
        // Same basename outside the root must not match.
        assert!(!rules[0].matches(Path::new("/elsewhere/src/main.rs")));
        // `*` does not cross directory separators.
        assert!(!rules[0].matches(Path::new("/proj/src/nested/deep.rs")));
    }

    #[test]
    fn recursive_glob_reaches_subdirectories() {
        let rules = rules_for(&["/proj/src/**/*.rs"], AddressingMode::Glob);
        assert_eq!(rules[0].root(), Path::new("/proj/src"));
        assert!(rules[0].matches(Path::new("/proj/src/nested/deep.rs")));
    }

    #[test]
    fn tree_mode_matches_everything_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let rules = rules_for(&[&root.to_string_lossy()], AddressingMode::Tree);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].matches(&root.join("any/file.txt")));
        assert!(!rules[0].matches(Path::new("/outside/file.txt")));
    }

    #[test]
    fn tree_mode_dedupes_roots() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let target = root.to_string_lossy().into_owned();
        let rules = rules_for(&[&target, &target], AddressingMode::Tree);
        assert_eq!(rules.len(), 1);
    }
}
