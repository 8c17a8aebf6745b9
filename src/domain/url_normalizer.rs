//! URL canonicalisation and identifier derivation shared by every bookmark source.
//!
//! Rules, applied in order:
//!
//! 1. Parse with the WHATWG algorithm (`url` crate). This lower-cases scheme and
//!    host, drops default ports and resolves `.`/`..` path segments.
//! 2. Reject anything without a host (`javascript:`, `mailto:`, `file:///`).
//! 3. Drop known tracking query parameters, then sort the remaining pairs by key.
//! 4. Drop the fragment, except hash-bang fragments (`#!/path`) which older
//!    single-page sites used as the real address.
//! 5. Strip trailing slashes from any path other than `/`.
//!
//! The identifier is derived from the resulting string only, so two raw URLs that
//! canonicalise identically always collide.

use url::Url;

use crate::domain::value_objects::{BookmarkId, CanonicalUrl};

/// Query parameters that only carry campaign or click tracking
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "mc_cid", "mc_eid", "igshid", "yclid", "_hsenc",
    "_hsmi",
];

const TRACKING_PREFIX: &str = "utm_";

/// Why a raw string could not be turned into a canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    Empty,
    Unparsable(String),
    MissingHost,
}

impl std::fmt::Display for UrlRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlRejection::Empty => write!(f, "empty URL"),
            UrlRejection::Unparsable(reason) => write!(f, "unparsable URL: {}", reason),
            UrlRejection::MissingHost => write!(f, "URL has no host"),
        }
    }
}

/// Canonical URL plus its derived identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    pub url: CanonicalUrl,
    pub identifier: BookmarkId,
}

/// Canonicalise `raw` and derive its identifier.
///
/// A rejection is an expected outcome, not an error: the caller drops the record
/// and counts it as skipped.
pub fn normalize_url(raw: &str) -> Result<NormalizedUrl, UrlRejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlRejection::Empty);
    }

    let mut url = Url::parse(trimmed).map_err(|e| UrlRejection::Unparsable(e.to_string()))?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlRejection::MissingHost);
    }

    strip_tracking_params(&mut url);

    let keep_fragment = url.fragment().is_some_and(|f| f.starts_with('!'));
    if !keep_fragment {
        url.set_fragment(None);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed_path = path.trim_end_matches('/');
        let trimmed_path = if trimmed_path.is_empty() {
            "/".to_string()
        } else {
            trimmed_path.to_string()
        };
        url.set_path(&trimmed_path);
    }

    let canonical = url.to_string();
    let identifier = BookmarkId::derive(&canonical);

    Ok(NormalizedUrl {
        url: CanonicalUrl::new(canonical),
        identifier,
    })
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with(TRACKING_PREFIX) || TRACKING_PARAMS.contains(&key.as_str())
}

fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
        return;
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(raw: &str) -> String {
        normalize_url(raw).unwrap().url.to_string()
    }

    #[test]
    fn test_tracking_params_and_case_collapse_to_same_hash() {
        let a = normalize_url("http://Example.com/a/?utm_source=x").unwrap();
        let b = normalize_url("http://example.com/a").unwrap();
        assert_eq!(a.url, b.url);
        assert_eq!(a.identifier, b.identifier);
    }

    #[test]
    fn test_default_port_removed() {
        assert_eq!(canonical("https://example.com:443/x"), "https://example.com/x");
        assert_eq!(canonical("http://example.com:80/x"), "http://example.com/x");
        assert_eq!(
            canonical("http://example.com:8080/x"),
            "http://example.com:8080/x"
        );
    }

    #[test]
    fn test_dot_segments_resolved() {
        assert_eq!(
            canonical("http://example.com/a/./b/../c"),
            "http://example.com/a/c"
        );
    }

    #[test]
    fn test_fragment_dropped_unless_hash_bang() {
        assert_eq!(
            canonical("http://example.com/page#section"),
            "http://example.com/page"
        );
        assert_eq!(
            canonical("http://twitter.com/#!/someone"),
            "http://twitter.com/#!/someone"
        );
    }

    #[test]
    fn test_query_sorted_and_non_tracking_kept() {
        assert_eq!(
            canonical("http://example.com/s?b=2&utm_medium=rss&a=1&fbclid=zzz"),
            "http://example.com/s?a=1&b=2"
        );
    }

    #[test]
    fn test_root_path_keeps_slash() {
        assert_eq!(canonical("HTTP://EXAMPLE.COM"), "http://example.com/");
        assert_eq!(canonical("http://example.com/"), "http://example.com/");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(normalize_url("").unwrap_err(), UrlRejection::Empty);
        assert_eq!(normalize_url("   ").unwrap_err(), UrlRejection::Empty);
        assert!(matches!(
            normalize_url("not a url").unwrap_err(),
            UrlRejection::Unparsable(_)
        ));
        assert_eq!(
            normalize_url("javascript:void(0)").unwrap_err(),
            UrlRejection::MissingHost
        );
        assert_eq!(
            normalize_url("mailto:someone@example.com").unwrap_err(),
            UrlRejection::MissingHost
        );
    }

    #[test]
    fn test_identifier_matches_canonical_string() {
        let normalized = normalize_url("https://example.com/path/").unwrap();
        assert_eq!(
            normalized.identifier,
            BookmarkId::derive(normalized.url.as_str())
        );
    }
}
