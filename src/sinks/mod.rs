//! PDF output: try the external converter, fall back to the built-in
//! renderer.
//!
//! Converter absence is an expected, common condition, so the primary
//! renderer reports failure as a value ([`pandoc::ConvertError`]) instead of
//! an error that unwinds the run. The orchestrator inspects it, falls back,
//! and returns a [`PdfOutcome`] describing which path (if any) produced the
//! PDF; `main` turns that into the end-of-run summary and the exit code.

pub mod pandoc;
pub mod pdf;

use crate::config::Configuration;
use anyhow::{Context, Result};
use pandoc::{ConvertError, Pandoc};
use pdf::RenderError;

/// How (and whether) the PDF got produced.
pub enum PdfOutcome {
    /// The external converter succeeded.
    Primary,
    /// The converter failed and the built-in renderer produced the PDF.
    Fallback { primary: ConvertError },
    /// Both renderers failed; the Markdown artifact is still valid.
    Failed {
        primary: ConvertError,
        fallback: RenderError,
    },
}

impl PdfOutcome {
    /// Engine label for the summary line, when a PDF exists.
    pub fn engine(&self) -> Option<&'static str> {
        match self {
            PdfOutcome::Primary => Some("external converter"),
            PdfOutcome::Fallback { .. } => Some("built-in renderer"),
            PdfOutcome::Failed { .. } => None,
        }
    }
}

/// Render the assembled Markdown document to the configured PDF path,
/// primary first, then the fallback.
///
/// Only reading the assembled Markdown back can fail with a hard error; both
/// renderer failures are folded into the returned outcome.
pub fn render_pdf(config: &Configuration) -> Result<PdfOutcome> {
    let markdown_path = &config.output.markdown;
    let pdf_path = &config.output.pdf;

    match Pandoc::new(&config.pandoc).convert(markdown_path, pdf_path) {
        Ok(()) => Ok(PdfOutcome::Primary),
        Err(primary) => {
            log::warn!("external converter unavailable or failed: {primary}");
            let markdown = std::fs::read_to_string(markdown_path).with_context(|| {
                format!(
                    "Failed to read assembled Markdown {}",
                    markdown_path.display()
                )
            })?;
            match pdf::render(&markdown, &config.book.title, &config.pdf, pdf_path) {
                Ok(()) => Ok(PdfOutcome::Fallback { primary }),
                Err(fallback) => Ok(PdfOutcome::Failed { primary, fallback }),
            }
        }
    }
}
