//! Body markup formats and the few conversions the archive performs itself.
//!
//! Full HTML/Markdown rendering is left to downstream tools. The archive only
//! guarantees that a body's text survives, and that line-break formats are
//! turned into paragraphs so the HTML is readable as-is.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A blank line, possibly holding stray whitespace
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").expect("Invalid paragraph break regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Html,
    Markdown,
    Textile,
    Text,
}

impl BodyFormat {
    /// Map a Movable Type `entry_convert_breaks` value
    pub fn from_movable_type(convert_breaks: Option<&str>) -> Self {
        match convert_breaks.map(str::trim) {
            None | Some("") | Some("0") => BodyFormat::Html,
            Some("1") | Some("__default__") | Some("richtext") => BodyFormat::Text,
            Some("markdown") | Some("markdown_with_smartypants") => BodyFormat::Markdown,
            Some(f) if f.starts_with("textile") => BodyFormat::Textile,
            Some(_) => BodyFormat::Html,
        }
    }

    /// Whether the archive can turn this format into HTML on its own
    pub fn is_convertible(&self) -> bool {
        !matches!(self, BodyFormat::Textile)
    }
}

/// What to do with a body whose format has no converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconvertibleBodyPolicy {
    /// Drop the record and log it
    Skip,
    /// Keep the original text and record its format
    #[default]
    Raw,
}

impl std::str::FromStr for UnconvertibleBodyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(UnconvertibleBodyPolicy::Skip),
            "raw" => Ok(UnconvertibleBodyPolicy::Raw),
            _ => Err(format!("Invalid unconvertible body policy: {}", s)),
        }
    }
}

/// Wrap blank-line separated blocks in `<p>` and single newlines in `<br />`
pub fn autop(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    PARAGRAPH_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| format!("<p>{}</p>", block.replace('\n', "<br />\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autop_paragraphs_and_breaks() {
        let html = autop("one\ntwo\n\nthree\r\n\r\n\r\n");
        assert_eq!(html, "<p>one<br />\ntwo</p>\n\n<p>three</p>");
    }

    #[test]
    fn test_autop_whitespace_only_line_breaks_paragraphs() {
        assert_eq!(autop("one\n  \ntwo"), "<p>one</p>\n\n<p>two</p>");
    }

    #[test]
    fn test_autop_empty() {
        assert_eq!(autop("  \n\n "), "");
    }

    #[test]
    fn test_movable_type_formats() {
        assert_eq!(BodyFormat::from_movable_type(None), BodyFormat::Html);
        assert_eq!(BodyFormat::from_movable_type(Some("__default__")), BodyFormat::Text);
        assert_eq!(BodyFormat::from_movable_type(Some("textile_2")), BodyFormat::Textile);
        assert_eq!(BodyFormat::from_movable_type(Some("markdown")), BodyFormat::Markdown);
        assert!(!BodyFormat::Textile.is_convertible());
        assert!(BodyFormat::Text.is_convertible());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("SKIP".parse::<UnconvertibleBodyPolicy>().unwrap(), UnconvertibleBodyPolicy::Skip);
        assert!("maybe".parse::<UnconvertibleBodyPolicy>().is_err());
    }
}
