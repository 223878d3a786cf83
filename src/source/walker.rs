//! Enumeration of candidate document files under the content root.
//!
//! The walk is recursive and honours `.gitignore`-style rules via the `ignore`
//! crate, plus any user-supplied exclude globs from the configuration.
//! Enumeration order is irrelevant: the assembler's ordering key is the only
//! authority on document order.

use crate::config::SourceConfig;
use anyhow::{anyhow, Context, Result};
use globset::{Glob, GlobMatcher};
use ignore::Walk;
use std::path::PathBuf;

/// Collect every Markdown file under the configured root, as paths relative
/// to the root.
///
/// A missing root is fatal to the whole run: nothing has been written yet, so
/// the error propagates up and the process exits non-zero.
pub fn walk(config: &SourceConfig) -> Result<Vec<PathBuf>> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(anyhow!("Missing source folder: {}", root.display()));
    }

    let exclude = config
        .exclude
        .iter()
        .map(|pattern| {
            Glob::new(pattern)
                .with_context(|| format!("Invalid exclude glob: {}", pattern))
                .map(|g| g.compile_matcher())
        })
        .collect::<Result<Vec<GlobMatcher>>>()?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in Walk::new(root) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().map(|e| e != "md").unwrap_or(true) {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .with_context(|| format!("Walked outside of root: {}", path.display()))?
            .to_path_buf();

        if exclude.iter().any(|glob| glob.is_match(&relative)) {
            log::debug!("excluded {}", relative.display());
            continue;
        }

        files.push(relative);
    }

    log::debug!("found {} documents under {}", files.len(), root.display());
    Ok(files)
}
