//! Site-specific markup cleanup.
//!
//! Documentation sites lean on shortcodes and root-relative links that only
//! resolve inside the site's own renderer. This module rewrites the
//! recognised constructs into portable Markdown so the assembled document is
//! self-contained wherever it is opened:
//!
//! - `{{< img src="…" alt="…" >}}` → `![alt](absolute-url)`
//! - `{{< anchor "name" >}}` → `<a id="name"></a>`
//! - `{{< pr number=123 repo=… >}}` → link to the canonical pull request
//! - `](/path)` links and image sources → `](base-url/path)`
//! - `](./path)` and `](../path)` → resolved against the document's directory
//!
//! Every rule is a pure `&str → String` function and the whole pass is
//! idempotent: already-absolute URLs are never prefixed again. Shortcodes
//! outside the recognised set pass through unchanged; the site defines many
//! more than these, and guessing their semantics would corrupt output that a
//! human can still read in raw form.

use crate::config::SourceConfig;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;

static IMG_SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{<\s*img\s+([^>]+?)\s*>\}\}").unwrap());
static ANCHOR_SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{<\s*anchor\s+([^>]+?)\s*>\}\}").unwrap());
static PR_SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{<\s*pr\s+([^>]+?)\s*>\}\}").unwrap());

// `key="value"` and bare `key=value` attribute forms, as the site's shortcodes use both.
static ATTR_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|(\S+))"#).unwrap());
// Positional quoted argument, e.g. `{{< anchor "wiring" >}}`.
static QUOTED_ARG: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).unwrap());

static ROOT_RELATIVE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\((/[^)]+)\)").unwrap());
static DOT_RELATIVE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\]\((\.\.?/[^)]+)\)").unwrap());

/// Rewrites one document body at a time; holds only the read-only URL bases.
pub struct Rewriter {
    base_url: String,
    pull_request_base: String,
}

impl Rewriter {
    pub fn new(config: &SourceConfig) -> Rewriter {
        Rewriter {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            pull_request_base: config.pull_request_base.trim_end_matches('/').to_string(),
        }
    }

    /// Apply every rewrite rule to one document body.
    ///
    /// Shortcodes are replaced before link absolutisation so that the URLs
    /// they emit get the same treatment as hand-written ones.
    pub fn rewrite(&self, body: &str, document_path: &Path) -> String {
        let s = self.replace_img_shortcodes(body);
        let s = replace_anchor_shortcodes(&s);
        let s = self.replace_pr_shortcodes(&s);
        let s = self.absolutize_root_relative(&s);
        self.absolutize_dot_relative(&s, document_path)
    }

    fn replace_img_shortcodes(&self, input: &str) -> String {
        IMG_SHORTCODE
            .replace_all(input, |caps: &Captures<'_>| {
                let attrs = parse_attrs(&caps[1]);
                let Some(src) = attrs.get("src").filter(|s| !s.is_empty()) else {
                    // a sourceless image renders nothing on the site either
                    return String::new();
                };
                let alt = attrs
                    .get("alt")
                    .or_else(|| attrs.get("title"))
                    .map(String::as_str)
                    .unwrap_or("");
                format!("![{}]({})", alt, self.absolute_url(src))
            })
            .into_owned()
    }

    fn replace_pr_shortcodes(&self, input: &str) -> String {
        PR_SHORTCODE
            .replace_all(input, |caps: &Captures<'_>| {
                let attrs = parse_attrs(&caps[1]);
                let Some(number) = attrs.get("number").filter(|n| !n.is_empty()) else {
                    return String::new();
                };
                let repo = attrs
                    .get("repo")
                    .map(String::as_str)
                    .unwrap_or("")
                    .trim()
                    .to_string();
                let repo = if repo.is_empty() {
                    default_repo_name(&self.pull_request_base)
                } else {
                    repo
                };
                format!(
                    "[{repo}#{number}]({}/{repo}/pull/{number})",
                    self.pull_request_base
                )
            })
            .into_owned()
    }

    fn absolutize_root_relative(&self, input: &str) -> String {
        ROOT_RELATIVE_LINK
            .replace_all(input, |caps: &Captures<'_>| {
                let path = &caps[1];
                if path.starts_with("//") {
                    // protocol-relative URL, already resolvable
                    return caps[0].to_string();
                }
                format!("]({}{})", self.base_url, path)
            })
            .into_owned()
    }

    fn absolutize_dot_relative(&self, input: &str, document_path: &Path) -> String {
        let dir = document_path
            .parent()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        DOT_RELATIVE_LINK
            .replace_all(input, |caps: &Captures<'_>| {
                let resolved = resolve_relative(&dir, &caps[1]);
                format!("]({}/{})", self.base_url, resolved)
            })
            .into_owned()
    }

    fn absolute_url(&self, src: &str) -> String {
        if src.starts_with('/') && !src.starts_with("//") {
            format!("{}{}", self.base_url, src)
        } else {
            src.to_string()
        }
    }
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    ATTR_PAIR
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or("");
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}

fn replace_anchor_shortcodes(input: &str) -> String {
    ANCHOR_SHORTCODE
        .replace_all(input, |caps: &Captures<'_>| {
            let raw = &caps[1];
            let attrs = parse_attrs(raw);
            let name = attrs
                .get("name")
                .or_else(|| attrs.get("id"))
                .cloned()
                .or_else(|| QUOTED_ARG.captures(raw).map(|c| c[1].to_string()));
            match name {
                Some(name) if !name.is_empty() => format!("<a id=\"{}\"></a>", name),
                _ => String::new(),
            }
        })
        .into_owned()
}

/// Last path segment of the pull-request base, used when a `pr` shortcode
/// omits `repo=`.
fn default_repo_name(pull_request_base: &str) -> String {
    pull_request_base
        .rsplit('/')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Resolve `./` / `../` prefixes of `relative` against `dir` (both using `/`
/// separators), collapsing what can be collapsed. Segments escaping above the
/// root are dropped.
fn resolve_relative(dir: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
