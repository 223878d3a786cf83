//! Front matter detection and parsing.
//!
//! A document may start with a `---` delimited YAML block carrying its
//! ordering weight and title. The block is stripped from the body whether or
//! not it parses; a malformed block costs the document its metadata (and
//! records a warning) but never aborts the run.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static FRONT_MATTER_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---\r?\n").unwrap());

/// Typed view of the recognised front matter keys.
///
/// Values are held as raw YAML so that one malformed field (say, a non-numeric
/// `weight`) degrades to `None` for that field instead of discarding the rest
/// of the block. Unknown keys are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    weight: Option<serde_yaml::Value>,
    title: Option<serde_yaml::Value>,
}

impl FrontMatter {
    /// Ordering weight, when present and numeric.
    pub fn weight(&self) -> Option<i64> {
        self.weight.as_ref().and_then(serde_yaml::Value::as_i64)
    }

    /// Document title, when present and a string.
    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(serde_yaml::Value::as_str)
    }
}

/// Result of splitting one document into metadata and body.
pub struct Parsed<'a> {
    pub front_matter: FrontMatter,
    pub body: &'a str,
    /// Set when a front matter block was present but did not parse.
    pub warning: Option<String>,
}

/// Split a document into (front matter, body).
///
/// Without a leading `---` block the text is returned unchanged with default
/// metadata. With one, the block is always stripped; if it fails to parse as
/// a YAML mapping, the metadata defaults and a warning describes the failure.
pub fn parse(text: &str) -> Parsed<'_> {
    let Some(caps) = FRONT_MATTER_BLOCK.captures(text) else {
        return Parsed {
            front_matter: FrontMatter::default(),
            body: text,
            warning: None,
        };
    };

    let whole = caps.get(0).expect("capture 0 always present");
    let block = caps.get(1).expect("block capture present").as_str();
    let body = &text[whole.end()..];

    match serde_yaml::from_str::<FrontMatter>(block) {
        Ok(front_matter) => Parsed {
            front_matter,
            body,
            warning: None,
        },
        Err(e) => Parsed {
            front_matter: FrontMatter::default(),
            body,
            warning: Some(format!("invalid front matter: {e}")),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_without_front_matter_passes_through() {
        let text = "# Heading\n\nbody\n";
        let parsed = parse(text);
        assert_eq!(parsed.body, text);
        assert_eq!(parsed.front_matter.weight(), None);
        assert!(parsed.warning.is_none());
    }

    #[test]
    fn front_matter_is_parsed_and_stripped() {
        let text = "---\ntitle: \"Getting Started\"\nweight: 10\n---\n# Heading\n";
        let parsed = parse(text);
        assert_eq!(parsed.body, "# Heading\n");
        assert_eq!(parsed.front_matter.weight(), Some(10));
        assert_eq!(parsed.front_matter.title(), Some("Getting Started"));
        assert!(parsed.warning.is_none());
    }

    #[test]
    fn malformed_block_is_stripped_with_warning() {
        let text = "---\ntitle: [unterminated\n---\nbody\n";
        let parsed = parse(text);
        assert_eq!(parsed.body, "body\n");
        assert_eq!(parsed.front_matter.weight(), None);
        assert!(parsed.warning.is_some());
    }

    #[test]
    fn non_numeric_weight_degrades_without_losing_title() {
        let text = "---\nweight: heavy\ntitle: Docs\n---\nbody\n";
        let parsed = parse(text);
        assert_eq!(parsed.front_matter.weight(), None);
        assert_eq!(parsed.front_matter.title(), Some("Docs"));
        assert!(parsed.warning.is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let text = "---\nweight: 3\nseo_description: stuff\n---\nbody\n";
        let parsed = parse(text);
        assert_eq!(parsed.front_matter.weight(), Some(3));
    }

    #[test]
    fn crlf_delimiters_are_recognised() {
        let text = "---\r\nweight: 2\r\n---\r\nbody\r\n";
        let parsed = parse(text);
        assert_eq!(parsed.front_matter.weight(), Some(2));
        assert_eq!(parsed.body, "body\r\n");
    }

    #[test]
    fn horizontal_rule_later_in_document_is_not_front_matter() {
        let text = "intro\n\n---\n\nmore\n";
        let parsed = parse(text);
        assert_eq!(parsed.body, text);
    }
}
