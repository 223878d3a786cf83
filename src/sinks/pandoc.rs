//! Primary PDF renderer: delegate to an external converter.
//!
//! Pandoc (or whatever binary the config names) produces far better PDFs
//! than the built-in renderer, so it is always tried first. Every way it can
//! fail (not installed, non-zero exit, hung past the timeout, empty output
//! file) is an expected outcome, reported as a [`ConvertError`] value for
//! the orchestrator to inspect rather than an abort.
//!
//! When the default engine fails, one retry with `--pdf-engine=wkhtmltopdf`
//! is attempted: machines without a LaTeX installation frequently have
//! wkhtmltopdf instead.

use crate::config::PandocConfig;
use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("converter '{0}' was not found on PATH")]
    MissingTool(String),
    #[error("converter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("converter timed out after {0} s")]
    TimedOut(u64),
    #[error("converter produced an empty output file")]
    EmptyOutput,
    #[error("failed to run converter: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Pandoc<'a> {
    config: &'a PandocConfig,
}

impl<'a> Pandoc<'a> {
    pub fn new(config: &'a PandocConfig) -> Pandoc<'a> {
        Pandoc { config }
    }

    /// Convert `markdown` to a PDF at `pdf`.
    ///
    /// The converter writes into a temp file next to the destination; only a
    /// successful, non-empty result is renamed into place, so a failed run
    /// never clobbers a PDF from an earlier run.
    pub fn convert(&self, markdown: &Path, pdf: &Path) -> Result<(), ConvertError> {
        let dir = match pdf.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let tmp = tempfile::Builder::new()
            .prefix(".site-book-")
            .suffix(".pdf")
            .tempfile_in(dir)?;

        match self.run_once(markdown, tmp.path(), None) {
            Ok(()) => {}
            // no converter at all: a different engine won't appear either
            Err(e @ ConvertError::MissingTool(_)) => return Err(e),
            Err(primary) => {
                log::warn!(
                    "converter failed with default engine ({primary}), retrying with wkhtmltopdf"
                );
                self.run_once(markdown, tmp.path(), Some("wkhtmltopdf"))?;
            }
        }

        tmp.persist(pdf)
            .map_err(|e| ConvertError::Io(e.error))
            .map(|_| ())
    }

    fn run_once(
        &self,
        markdown: &Path,
        out: &Path,
        engine: Option<&str>,
    ) -> Result<(), ConvertError> {
        let mut command = Command::new(&self.config.binary);
        command
            .arg(markdown)
            .arg("-o")
            .arg(out)
            .args(["--from", "markdown+smart", "--toc"]);
        if let Some(engine) = engine {
            command.arg(format!("--pdf-engine={engine}"));
        }

        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::MissingTool(self.config.binary.clone())
                } else {
                    ConvertError::Io(e)
                }
            })?;

        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ConvertError::TimedOut(self.config.timeout_secs));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(ConvertError::Failed {
                status,
                stderr: summarize(&stderr),
            });
        }

        match std::fs::metadata(out) {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(ConvertError::EmptyOutput),
            Err(_) => Err(ConvertError::EmptyOutput),
        }
    }
}

/// First few stderr lines, enough to say why the converter failed without
/// dumping a LaTeX log at the user.
fn summarize(stderr: &str) -> String {
    let mut lines = stderr.lines().filter(|l| !l.trim().is_empty());
    let summary: Vec<&str> = lines.by_ref().take(3).collect();
    if lines.next().is_some() {
        format!("{} …", summary.join(" / "))
    } else {
        summary.join(" / ")
    }
}
