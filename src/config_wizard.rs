//! Interactive configuration wizard for creating `site-book.toml`.
//!
//! Collects the source tree location, the URL bases used for link rewriting,
//! the attribution block, and the output settings through a series of
//! prompts, then writes the config file to the current directory.

use crate::config::{Configuration, PageSize};
use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::path::PathBuf;

const CONFIG_FILE: &str = "site-book.toml";

/// Run the interactive configuration wizard.
pub fn run() -> Result<()> {
    let theme = ColorfulTheme::default();

    if PathBuf::from(CONFIG_FILE).exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!("{CONFIG_FILE} already exists, overwrite it?"))
            .default(false)
            .interact()?
    {
        println!("Keeping the existing {CONFIG_FILE}.");
        return Ok(());
    }

    let mut config = Configuration::default();

    let root: String = Input::with_theme(&theme)
        .with_prompt("Content root directory (the site's Markdown tree)")
        .default(config.source.root.display().to_string())
        .interact()
        .with_context(|| "Failed to obtain content root")?;
    let root = PathBuf::from(root);
    if !root.is_dir() {
        // the fetcher that populates the tree may simply not have run yet
        println!(
            "{}: {} doesn't exist yet - fetch the sources before running `site-book build`",
            console::style("Note").yellow(),
            root.display()
        );
    }
    config.source.root = root;

    config.source.base_url = Input::with_theme(&theme)
        .with_prompt("Base URL for rewriting relative links")
        .default(config.source.base_url)
        .interact()?;
    config.source.pull_request_base = Input::with_theme(&theme)
        .with_prompt("Organisation URL for pull-request references")
        .default(config.source.pull_request_base)
        .interact()?;

    config.book.title = Input::with_theme(&theme)
        .with_prompt("Title of the assembled document")
        .default(config.book.title)
        .interact()?;
    config.book.source_url = Input::with_theme(&theme)
        .with_prompt("Site URL for the attribution header")
        .default(config.book.source_url)
        .interact()?;
    config.book.repository_url = Input::with_theme(&theme)
        .with_prompt("Repository URL for the attribution header")
        .default(config.book.repository_url)
        .interact()?;
    config.book.license = Input::with_theme(&theme)
        .with_prompt("Licence of the upstream documentation")
        .default(config.book.license)
        .interact()?;

    config.output.markdown = PathBuf::from(
        Input::<String>::with_theme(&theme)
            .with_prompt("Output Markdown file")
            .default(config.output.markdown.display().to_string())
            .interact()?,
    );
    config.output.pdf = PathBuf::from(
        Input::<String>::with_theme(&theme)
            .with_prompt("Output PDF file")
            .default(config.output.pdf.display().to_string())
            .interact()?,
    );

    config.pandoc.binary = Input::with_theme(&theme)
        .with_prompt("External converter binary")
        .default(config.pandoc.binary)
        .interact()?;

    let page_size_idx = Select::with_theme(&theme)
        .with_prompt("Page size for the built-in PDF renderer")
        .items(PageSize::all())
        .default(0)
        .interact()?;
    config.pdf.page_size = PageSize::all()[page_size_idx];

    config.output.require_pdf = Confirm::with_theme(&theme)
        .with_prompt("Should a run fail when no PDF could be produced?")
        .default(false)
        .interact()?;

    let contents =
        toml::to_string_pretty(&config).with_context(|| "Failed to serialize configuration")?;
    std::fs::write(CONFIG_FILE, contents)
        .with_context(|| format!("Failed to write {CONFIG_FILE}"))?;

    println!("Wrote {CONFIG_FILE}. Run `site-book build` to assemble the document.");
    Ok(())
}
