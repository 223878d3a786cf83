use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates a site-book.toml config file
    Config,
    /// Builds the combined Markdown document and PDF according to the config file
    Build {
        /// Path to the configuration file
        #[clap(long, default_value = "site-book.toml")]
        config: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}
