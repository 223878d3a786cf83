pub mod front_matter;
pub mod walker;

pub use front_matter::FrontMatter;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// One source document: its path relative to the content root, its parsed
/// front matter, and its body with the front matter stripped.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Document {
    /// Read and parse one document file.
    ///
    /// Byte sequences that are not valid UTF-8 are replaced rather than
    /// rejected, so a stray encoding problem costs a few characters and not
    /// the document. The returned warning, if any, carries a front matter
    /// parse failure; the document itself is always kept.
    pub fn load(root: &Path, relative: &Path) -> Result<(Document, Option<String>)> {
        let absolute = root.join(relative);
        let bytes = std::fs::read(&absolute)
            .with_context(|| format!("Failed to read {}", absolute.display()))?;
        let text = String::from_utf8_lossy(&bytes);

        let parsed = front_matter::parse(&text);
        let warning = parsed
            .warning
            .map(|w| format!("{}: {}", relative.display(), w));
        if let Some(warning) = &warning {
            log::warn!("{warning}");
        }

        Ok((
            Document {
                path: relative.to_path_buf(),
                front_matter: parsed.front_matter,
                body: parsed.body.to_string(),
            },
            warning,
        ))
    }

    /// Display label for progress reporting: the front matter title when one
    /// exists, the relative path otherwise.
    pub fn label(&self) -> String {
        match self.front_matter.title() {
            Some(title) => title.to_string(),
            None => self.path.display().to_string(),
        }
    }
}
