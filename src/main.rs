use anyhow::{anyhow, Context, Result};
use cli::Cli;
use config::Configuration;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;

mod assemble;
mod cli;
mod config;
mod config_wizard;
mod demote;
mod rewrite;
mod sinks;
mod source;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Config => config_wizard::run(),
        cli::Commands::Build { config } => build(config),
    }
}

fn build(config_path: &Path) -> Result<()> {
    println!("Loading configuration...");
    let contents = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to load {} contents", config_path.display()))?;
    let config: Configuration =
        toml::from_str(&contents).with_context(|| "Failed to parse TOML")?;

    let files = source::walker::walk(&config.source)?;
    if files.is_empty() {
        return Err(anyhow!(
            "No documents found under {}",
            config.source.root.display()
        ));
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("can parse progress style")
            .progress_chars("#>-"),
    );
    progress.set_message("Processing documents...");

    let rewriter = rewrite::Rewriter::new(&config.source);
    let mut documents = Vec::with_capacity(files.len());
    let mut warnings = 0usize;
    for file in &files {
        let (mut document, warning) = source::Document::load(&config.source.root, file)?;
        progress.set_message(document.label());
        if let Some(warning) = warning {
            progress.println(format!(
                "{}: {warning}",
                console::style("Warning").yellow()
            ));
            warnings += 1;
        }

        // per-document transform: portable markup first, then nest the
        // document one level beneath the book title
        document.body = rewriter.rewrite(&document.body, &document.path);
        document.body = demote::demote_headings(&document.body, 1, config.pdf.max_heading_level);

        documents.push(document);
        progress.inc(1);
    }
    progress.finish_with_message("Documents processed");

    let stats = assemble::assemble(&config, documents)?;

    println!();
    println!(
        "  Markdown: {} ({} documents, {} warnings)",
        config.output.markdown.display(),
        stats.document_count,
        warnings
    );

    match sinks::render_pdf(&config)? {
        sinks::PdfOutcome::Failed { primary, fallback } => {
            eprintln!(
                "{}: no PDF produced (converter: {primary}; built-in renderer: {fallback})",
                console::style("Warning").yellow()
            );
            if config.output.require_pdf {
                return Err(anyhow!("PDF output was required but not produced"));
            }
        }
        outcome => {
            if let sinks::PdfOutcome::Fallback { primary } = &outcome {
                log::warn!("external converter unavailable: {primary}");
            }
            println!(
                "  PDF:      {} ({})",
                config.output.pdf.display(),
                outcome.engine().unwrap_or("unknown")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    /// Full pipeline over a small source tree, with the external converter
    /// deliberately absent so the built-in renderer has to carry the PDF.
    #[test]
    fn build_assembles_ordered_markdown_and_fallback_pdf() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("guides")).unwrap();
        fs::write(
            content.join("guides/later.md"),
            "---\nweight: 5\ntitle: \"A\"\n---\n# Later\n\nSee [index](/index) and {{<img src=\"/img/x.png\" alt=\"Pic\">}}.\n",
        )
        .unwrap();
        fs::write(
            content.join("first.md"),
            "---\nweight: 1\ntitle: \"B\"\n---\n# First\n\nRead [next](./other.md).\n",
        )
        .unwrap();

        let config_path = dir.path().join("site-book.toml");
        fs::write(
            &config_path,
            format!(
                r#"
                [source]
                root = "{root}"
                base_url = "https://docs.site.io"

                [output]
                markdown = "{md}"
                pdf = "{pdf}"

                [pandoc]
                binary = "site-book-test-no-such-converter"
                "#,
                root = content.display(),
                md = dir.path().join("data/site.md").display(),
                pdf = dir.path().join("data/site.pdf").display(),
            ),
        )
        .unwrap();

        build(&config_path).expect("build succeeds without a converter");

        let markdown = fs::read_to_string(dir.path().join("data/site.md")).unwrap();
        // weight 1 before weight 5
        assert!(markdown.find("## First").unwrap() < markdown.find("## Later").unwrap());
        // headings were demoted beneath the synthetic title
        assert!(markdown.starts_with("# Documentation\n"));
        assert!(!markdown.contains("\n# First"));
        // no relative links or site shortcodes survive
        assert!(!markdown.contains("](/"));
        assert!(!markdown.contains("](./"));
        assert!(!markdown.contains("{{<"));
        assert!(markdown.contains("![Pic](https://docs.site.io/img/x.png)"));
        assert!(markdown.contains("](https://docs.site.io/other.md)"));
        // front matter stayed out of the output
        assert!(!markdown.contains("weight:"));

        let pdf = fs::read(dir.path().join("data/site.pdf")).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn build_fails_when_root_is_missing() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let config_path = dir.path().join("site-book.toml");
        fs::write(
            &config_path,
            "[source]\nroot = \"/definitely/not/here\"\n",
        )
        .unwrap();

        let err = build(&config_path).unwrap_err();
        assert!(err.to_string().contains("Missing source folder"));
    }

    #[test]
    fn build_fails_when_no_documents_found() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        let config_path = dir.path().join("site-book.toml");
        fs::write(
            &config_path,
            format!("[source]\nroot = \"{}\"\n", content.display()),
        )
        .unwrap();

        let err = build(&config_path).unwrap_err();
        assert!(err.to_string().contains("No documents found"));
    }
}
