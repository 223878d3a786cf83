//! Weight-aware document ordering and assembly into one Markdown file.
//!
//! Documents are concatenated in ascending `(weight, path)` order: the front
//! matter `weight` when present, else a large sentinel so unweighted pages
//! sort after every weighted one, with ties broken by relative path. The
//! ordering key is the only authority on output order; filesystem
//! enumeration order never leaks through.
//!
//! Each document is preceded by a horizontal rule and a `<!-- SOURCE: … -->`
//! comment naming its origin, so downstream consumers can trace or re-split
//! the combined file. The whole document is written atomically: a temp file
//! in the destination directory, then a rename, so a crash mid-write never
//! leaves a truncated artifact at the canonical path.

use crate::config::{BookConfig, Configuration};
use crate::source::Document;
use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::io::Write;
use std::path::Path;

/// Weight assigned to documents without a numeric `weight` key; large enough
/// to sort after any weight a site plausibly uses.
const UNWEIGHTED: i64 = i64::MAX;

/// Ordering key for one document: `(weight, relative path)`.
pub fn ordering_key(document: &Document) -> (i64, String) {
    (
        document.front_matter.weight().unwrap_or(UNWEIGHTED),
        document.path.to_string_lossy().replace('\\', "/"),
    )
}

/// Comparator over ordering keys, ascending.
pub fn compare(a: &Document, b: &Document) -> Ordering {
    ordering_key(a).cmp(&ordering_key(b))
}

/// Counts reported in the end-of-run summary.
pub struct AssembleStats {
    pub document_count: usize,
}

/// Sort the documents, concatenate them beneath the attribution header, and
/// write the result atomically to the configured Markdown path.
pub fn assemble(config: &Configuration, mut documents: Vec<Document>) -> Result<AssembleStats> {
    documents.sort_by(compare);

    let mut out = String::new();
    out.push_str(&attribution_header(&config.book));
    for document in &documents {
        let path = document.path.to_string_lossy().replace('\\', "/");
        out.push_str("\n\n---\n\n");
        out.push_str(&format!("<!-- SOURCE: {} -->\n\n", path));
        out.push_str(document.body.trim());
        out.push('\n');
    }

    write_atomic(&config.output.markdown, out.as_bytes())
        .with_context(|| format!("Failed to write {}", config.output.markdown.display()))?;

    Ok(AssembleStats {
        document_count: documents.len(),
    })
}

/// The synthetic level-1 title plus source/licence attribution. Everything
/// below it has been demoted by one level, so this is the only `#` heading
/// in the file.
fn attribution_header(book: &BookConfig) -> String {
    format!(
        "# {}\n\n> **Source**: {}  \n> **Repository**: {}  \n> **License**: {}\n",
        book.title, book.source_url, book.repository_url, book.license
    )
}

/// Write `contents` to `path` via a named temp file in the same directory
/// followed by a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)
        .with_context(|| "Failed to write temp file")?;
    tmp.flush().with_context(|| "Failed to flush temp file")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to move output into place at {}", path.display()))?;
    Ok(())
}
