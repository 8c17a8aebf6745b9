use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::errors::DomainError;
use crate::domain::url_normalizer::NormalizedUrl;
use crate::domain::value_objects::{BookmarkId, CanonicalUrl, SourceTag};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkDates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// Unified bookmark record shared by every bookmark source.
///
/// `identifier` is derived from `shared_content` and is the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBookmark {
    identifier: BookmarkId,
    #[validate(custom(function = "validate_shared_content"))]
    shared_content: CanonicalUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<BookmarkDates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<Vec<String>>,
    part_of: SourceTag,
}

impl CanonicalBookmark {
    pub fn new(normalized: NormalizedUrl, part_of: SourceTag) -> Self {
        Self {
            identifier: normalized.identifier,
            shared_content: normalized.url,
            name: None,
            description: None,
            date: None,
            keywords: None,
            part_of,
        }
    }

    /// Blank names are treated as absent
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = non_blank(name);
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = non_blank(description);
        self
    }

    pub fn with_created(mut self, created: Option<DateTime<Utc>>) -> Self {
        self.date = created.map(|created| BookmarkDates {
            created: Some(created),
        });
        self
    }

    /// Keywords form a set: blanks and repeats are dropped, first-seen order kept
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();

        self.keywords = if unique.is_empty() { None } else { Some(unique) };
        self
    }

    /// Check the record against the bookmark schema before it reaches the aggregator
    pub fn validated(self) -> Result<Self, DomainError> {
        self.validate()?;
        if self.identifier != BookmarkId::derive(self.shared_content.as_str()) {
            return Err(DomainError::validation(
                "identifier",
                "Identifier does not match canonical URL",
            ));
        }
        Ok(self)
    }

    // Getters
    pub fn identifier(&self) -> &BookmarkId {
        &self.identifier
    }

    pub fn shared_content(&self) -> &CanonicalUrl {
        &self.shared_content
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.date.as_ref().and_then(|d| d.created)
    }

    pub fn keywords(&self) -> &[String] {
        self.keywords.as_deref().unwrap_or_default()
    }

    pub fn part_of(&self) -> SourceTag {
        self.part_of
    }
}

/// Shared content must stay an absolute URL with a host
fn validate_shared_content(url: &CanonicalUrl) -> Result<(), ValidationError> {
    match url::Url::parse(url.as_str()) {
        Ok(parsed) if parsed.host_str().is_some() => Ok(()),
        _ => {
            let mut error = ValidationError::new("url");
            error.message = Some("Shared content must be an absolute URL with a host".into());
            Err(error)
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
