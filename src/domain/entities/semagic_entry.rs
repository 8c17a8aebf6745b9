use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// One blog post decoded from a desktop client save file.
///
/// Cached verbatim before any text reformatting happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSemagicEntry {
    pub id: u32,
    pub subject: Option<String>,
    pub date: DateTime<Utc>,
    pub body: Option<String>,
    pub music: Option<String>,
    pub mood: Option<String>,
    pub avatar: Option<String>,
    /// Visibility and option bits; layout unknown, kept as-is
    #[serde(with = "hex_bytes")]
    pub flags: Vec<u8>,
}

impl RawSemagicEntry {
    /// Cache partition year
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_flags_serialize_as_hex() {
        let entry = RawSemagicEntry {
            id: 7,
            subject: None,
            date: Utc.with_ymd_and_hms(2002, 6, 1, 12, 0, 0).unwrap(),
            body: Some("hello".to_string()),
            music: None,
            mood: None,
            avatar: None,
            flags: vec![0x01, 0xAB],
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["flags"], "01ab");

        let back: RawSemagicEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
        assert_eq!(back.year(), 2002);
    }
}
