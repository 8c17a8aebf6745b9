use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Source system a record was imported from.
///
/// The string form is what lands in a bookmark's `partOf` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    #[serde(rename = "favorites.html")]
    Favorites,
    #[serde(rename = "predicatenet")]
    PredicateNet,
    #[serde(rename = "havanamod")]
    Havana,
    #[serde(rename = "delicious")]
    Delicious,
    #[serde(rename = "pinboard")]
    Pinboard,
    #[serde(rename = "instapaper")]
    Instapaper,
    #[serde(rename = "pocket")]
    Pocket,
    #[serde(rename = "movabletype")]
    MovableType,
    #[serde(rename = "livejournal")]
    Livejournal,
}

impl SourceTag {
    /// Bookmark sources in the order the original import ran them
    pub const DEFAULT_BOOKMARK_PRIORITY: [SourceTag; 8] = [
        SourceTag::Favorites,
        SourceTag::PredicateNet,
        SourceTag::Havana,
        SourceTag::Delicious,
        SourceTag::Pinboard,
        SourceTag::Instapaper,
        SourceTag::Pocket,
        SourceTag::MovableType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Favorites => "favorites.html",
            SourceTag::PredicateNet => "predicatenet",
            SourceTag::Havana => "havanamod",
            SourceTag::Delicious => "delicious",
            SourceTag::Pinboard => "pinboard",
            SourceTag::Instapaper => "instapaper",
            SourceTag::Pocket => "pocket",
            SourceTag::MovableType => "movabletype",
            SourceTag::Livejournal => "livejournal",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "favorites" | "favorites.html" => Ok(SourceTag::Favorites),
            "predicate" | "predicatenet" => Ok(SourceTag::PredicateNet),
            "havana" | "havanamod" => Ok(SourceTag::Havana),
            "delicious" => Ok(SourceTag::Delicious),
            "pinboard" => Ok(SourceTag::Pinboard),
            "instapaper" => Ok(SourceTag::Instapaper),
            "pocket" | "getpocket" => Ok(SourceTag::Pocket),
            "movabletype" | "mt" => Ok(SourceTag::MovableType),
            "livejournal" | "lj" => Ok(SourceTag::Livejournal),
            other => Err(DomainError::UnknownSource(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_trip_through_display() {
        for tag in SourceTag::DEFAULT_BOOKMARK_PRIORITY {
            assert_eq!(SourceTag::from_str(&tag.to_string()).unwrap(), tag);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(SourceTag::from_str("Favorites").unwrap(), SourceTag::Favorites);
        assert_eq!(SourceTag::from_str(" getpocket ").unwrap(), SourceTag::Pocket);
    }

    #[test]
    fn test_unknown_source() {
        assert!(matches!(
            SourceTag::from_str("myspace"),
            Err(DomainError::UnknownSource(_))
        ));
    }

    #[test]
    fn test_serde_matches_part_of_strings() {
        let json = serde_json::to_string(&SourceTag::Favorites).unwrap();
        assert_eq!(json, "\"favorites.html\"");
    }
}
