use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Page size for the built-in PDF renderer.
#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug)]
pub enum PageSize {
    A4,
    Letter,
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl PageSize {
    pub fn name(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
        }
    }

    pub fn all() -> &'static [PageSize] {
        &[PageSize::A4, PageSize::Letter]
    }

    /// Page dimensions in millimetres, (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::Letter => (215.9, 279.4),
        }
    }
}

/// Complete configuration for a site-book project.
///
/// Loaded from `site-book.toml` and threaded explicitly through every pipeline
/// stage; nothing reads configuration from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Configuration {
    pub source: SourceConfig,
    pub book: BookConfig,
    pub output: OutputConfig,
    pub pandoc: PandocConfig,
    pub pdf: PdfConfig,
}

/// Where the documentation sources live and how their links are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Root directory of the site's Markdown content tree
    pub root: PathBuf,
    /// Base URL used to absolutise root-relative links and image sources
    pub base_url: String,
    /// Organisation-level URL that pull-request shortcodes resolve against
    pub pull_request_base: String,
    /// Glob patterns (relative to `root`) for files to skip
    pub exclude: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            root: PathBuf::from("content"),
            base_url: "https://docs.example.org".to_string(),
            pull_request_base: "https://github.com/example".to_string(),
            exclude: Vec::new(),
        }
    }
}

/// Attribution header fields for the assembled document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Top-level title of the assembled document; every source document's
    /// headings are demoted one level beneath it
    pub title: String,
    /// URL of the rendered site the sources belong to
    pub source_url: String,
    /// URL of the repository the sources were fetched from
    pub repository_url: String,
    /// Licence the upstream documentation is published under
    pub license: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        BookConfig {
            title: "Documentation".to_string(),
            source_url: "https://docs.example.org/".to_string(),
            repository_url: "https://github.com/example/docs".to_string(),
            license: "CC BY-NC-SA 4.0".to_string(),
        }
    }
}

/// Output file locations and success requirements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path the assembled Markdown document is written to
    pub markdown: PathBuf,
    /// Path the PDF is written to
    pub pdf: PathBuf,
    /// When true, a run where neither PDF renderer succeeded exits non-zero
    pub require_pdf: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            markdown: PathBuf::from("data/site.md"),
            pdf: PathBuf::from("data/site.pdf"),
            require_pdf: false,
        }
    }
}

/// External converter settings for the primary PDF renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PandocConfig {
    /// Converter binary name or path
    pub binary: String,
    /// Wall-clock bound on one converter invocation, in seconds
    pub timeout_secs: u64,
}

impl Default for PandocConfig {
    fn default() -> Self {
        PandocConfig {
            binary: "pandoc".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

/// Layout settings for the built-in fallback PDF renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub page_size: PageSize,
    /// Margin applied on all four page edges, in millimetres
    pub margin_mm: f32,
    #[serde(default = "default_font_size_title")]
    pub font_size_title_pt: f32,
    #[serde(default = "default_font_size_body")]
    pub font_size_body_pt: f32,
    #[serde(default = "default_font_size_code")]
    pub font_size_code_pt: f32,
    /// Deepest heading level the demoter may produce (and the deepest the
    /// renderer styles distinctly)
    pub max_heading_level: u8,
}

fn default_font_size_title() -> f32 {
    24.0
}
fn default_font_size_body() -> f32 {
    10.0
}
fn default_font_size_code() -> f32 {
    9.0
}

impl Default for PdfConfig {
    fn default() -> Self {
        PdfConfig {
            page_size: PageSize::A4,
            margin_mm: 20.0,
            font_size_title_pt: default_font_size_title(),
            font_size_body_pt: default_font_size_body(),
            font_size_code_pt: default_font_size_code(),
            max_heading_level: 6,
        }
    }
}

impl PdfConfig {
    /// Font size for a heading of the given level.
    ///
    /// Steps down 2pt per level from level 1 so that a level-6 heading still
    /// sits above the body size: with the default 10pt body this yields
    /// 22/20/18/16/14/12.
    pub fn heading_size_pt(&self, level: u8) -> f32 {
        let level = level.clamp(1, 6);
        self.font_size_body_pt + 2.0 * f32::from(7 - level)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_configuration() {
        let config = Configuration::default();
        toml::to_string(&config).expect("can serialize Configuration to TOML");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Configuration = toml::from_str("").expect("can parse empty TOML");
        assert_eq!(config.source.root, PathBuf::from("content"));
        assert_eq!(config.pandoc.timeout_secs, 120);
        assert_eq!(config.pdf.page_size, PageSize::A4);
        assert!(!config.output.require_pdf);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Configuration = toml::from_str(
            r#"
            [source]
            root = "third_party/docs/content"
            base_url = "https://docs.site.io"

            [pdf]
            page_size = "Letter"
            "#,
        )
        .expect("can parse partial TOML");
        assert_eq!(config.source.base_url, "https://docs.site.io");
        assert_eq!(config.pdf.page_size, PageSize::Letter);
        assert_eq!(config.pdf.max_heading_level, 6);
        assert_eq!(config.output.markdown, PathBuf::from("data/site.md"));
    }

    #[test]
    fn heading_sizes_step_down_and_clamp() {
        let pdf = PdfConfig::default();
        assert_eq!(pdf.heading_size_pt(1), 22.0);
        assert_eq!(pdf.heading_size_pt(6), 12.0);
        // out-of-range levels clamp rather than panic
        assert_eq!(pdf.heading_size_pt(9), 12.0);
    }
}
