use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use regex::RegexSet;
use serde::Deserialize;
use thiserror::Error;

use crate::application::ports::MediaCollection;
use crate::domain::markup::UnconvertibleBodyPolicy;
use crate::domain::value_objects::SourceTag;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LivejournalConfig {
    /// Directory holding `.slj` files and XML exports, relative to `input_root`
    pub input_dir: PathBuf,
    /// Entries dated before this day are dropped
    pub ignore_before: Option<NaiveDate>,
}

impl Default for LivejournalConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("livejournal"),
            ignore_before: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MovableTypeConfig {
    /// Directory holding the table dumps, relative to `input_root`
    pub input_dir: PathBuf,
    /// Only entries by these authors; empty means everyone
    pub user_list: Vec<i64>,
    /// Only entries from these blogs; empty means every blog
    pub blog_list: Vec<i64>,
    pub unconvertible_body: UnconvertibleBodyPolicy,
    pub blogroll_plugin: String,
    pub record_delimiter: String,
    pub field_delimiter: String,
}

impl Default for MovableTypeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("movabletype"),
            user_list: Vec::new(),
            blog_list: Vec::new(),
            unconvertible_body: UnconvertibleBodyPolicy::default(),
            blogroll_plugin: "Blogroll".to_string(),
            record_delimiter: "\n".to_string(),
            field_delimiter: "|".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookmarksConfig {
    /// Export files (`pinboard.json`, `favorites.html`, ...), relative to `input_root`
    pub input_dir: PathBuf,
    /// Desktop database table dumps (`<db>/<table>.ndjson`), relative to `input_root`
    pub desktop_db_dir: PathBuf,
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("bookmarks"),
            desktop_db_dir: PathBuf::from("desktop-db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisqusConfig {
    /// Directory holding Disqus XML exports, relative to `input_root`
    pub input_dir: PathBuf,
}

impl Default for DisqusConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("disqus"),
        }
    }
}

/// A directory of media files copied verbatim into `<output>/media/<to>`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaConfig {
    /// Source directory, relative to `input_root`
    pub from: PathBuf,
    pub to: String,
    /// Regular expressions matched against the path below `from`
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl MediaConfig {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: PathBuf::from(from),
            to: to.to_string(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_root: PathBuf,
    pub cache_root: PathBuf,
    pub output_root: PathBuf,
    /// Bookmark sources in merge order; earlier sources win shared URLs
    pub bookmark_sources: Vec<SourceTag>,
    pub decode_concurrency: usize,
    pub durable_writes: bool,
    pub livejournal: LivejournalConfig,
    pub movabletype: MovableTypeConfig,
    pub bookmarks: BookmarksConfig,
    pub disqus: DisqusConfig,
    pub media: Vec<MediaConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("input"),
            cache_root: PathBuf::from("cache"),
            output_root: PathBuf::from("output"),
            bookmark_sources: SourceTag::DEFAULT_BOOKMARK_PRIORITY.to_vec(),
            decode_concurrency: 16,
            durable_writes: false,
            livejournal: LivejournalConfig::default(),
            movabletype: MovableTypeConfig::default(),
            bookmarks: BookmarksConfig::default(),
            disqus: DisqusConfig::default(),
            media: vec![
                MediaConfig::new("movabletype/files", "mt"),
                MediaConfig::new("livejournal/media/lj-photos", "lj"),
            ],
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables.
    ///
    /// A variable that is set but cannot be parsed is an error rather than a
    /// silent fallback to the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_vars(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Values from a TOML file, then environment overrides
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_vars(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("INPUT_DIR") {
            self.input_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("CACHE_DIR") {
            self.cache_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("OUTPUT_DIR") {
            self.output_root = PathBuf::from(dir);
        }
        if let Some(order) = lookup("BOOKMARK_SOURCE_ORDER") {
            self.bookmark_sources = parse_var("BOOKMARK_SOURCE_ORDER", &order, parse_list)?;
        }
        if let Some(n) = lookup("DECODE_CONCURRENCY") {
            self.decode_concurrency = parse_var("DECODE_CONCURRENCY", &n, |s| s.trim().parse().ok())?;
        }
        if let Some(durable) = lookup("DURABLE_WRITES") {
            self.durable_writes = parse_var("DURABLE_WRITES", &durable, parse_flag)?;
        }
        if let Some(users) = lookup("MT_USER_LIST") {
            self.movabletype.user_list = parse_var("MT_USER_LIST", &users, parse_list)?;
        }
        if let Some(blogs) = lookup("MT_BLOG_LIST") {
            self.movabletype.blog_list = parse_var("MT_BLOG_LIST", &blogs, parse_list)?;
        }
        if let Some(policy) = lookup("MT_UNCONVERTIBLE_BODY") {
            self.movabletype.unconvertible_body =
                parse_var("MT_UNCONVERTIBLE_BODY", &policy, |s| s.parse().ok())?;
        }
        if let Some(date) = lookup("LJ_IGNORE_BEFORE") {
            self.livejournal.ignore_before = Some(parse_var("LJ_IGNORE_BEFORE", &date, |s| {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
            })?);
        }
        Ok(())
    }

    pub fn livejournal_dir(&self) -> PathBuf {
        self.input_root.join(&self.livejournal.input_dir)
    }

    pub fn movabletype_dir(&self) -> PathBuf {
        self.input_root.join(&self.movabletype.input_dir)
    }

    pub fn bookmarks_dir(&self) -> PathBuf {
        self.input_root.join(&self.bookmarks.input_dir)
    }

    pub fn desktop_db_dir(&self) -> PathBuf {
        self.input_root.join(&self.bookmarks.desktop_db_dir)
    }

    pub fn disqus_dir(&self) -> PathBuf {
        self.input_root.join(&self.disqus.input_dir)
    }

    /// Media collections with their source resolved and exclusions compiled
    pub fn media_collections(&self) -> Result<Vec<MediaCollection>, ConfigError> {
        self.media
            .iter()
            .map(|media| {
                let exclude = if media.exclude.is_empty() {
                    None
                } else {
                    let set = RegexSet::new(&media.exclude).map_err(|e| {
                        ConfigError::Invalid(format!("Bad exclude pattern for media {}: {}", media.to, e))
                    })?;
                    Some(set)
                };
                Ok(MediaCollection {
                    source: self.input_root.join(&media.from),
                    target: media.to.clone(),
                    exclude,
                })
            })
            .collect()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("INPUT_DIR cannot be empty".to_string()));
        }
        if self.cache_root.as_os_str().is_empty() || self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "CACHE_DIR and OUTPUT_DIR cannot be empty".to_string(),
            ));
        }

        if self.decode_concurrency < 1 || self.decode_concurrency > 256 {
            return Err(ConfigError::Invalid(
                "DECODE_CONCURRENCY must be between 1 and 256".to_string(),
            ));
        }

        for (i, tag) in self.bookmark_sources.iter().enumerate() {
            if !SourceTag::DEFAULT_BOOKMARK_PRIORITY.contains(tag) {
                return Err(ConfigError::Invalid(format!(
                    "{} is not a bookmark source",
                    tag
                )));
            }
            if self.bookmark_sources[..i].contains(tag) {
                return Err(ConfigError::Invalid(format!(
                    "{} appears twice in the bookmark source order",
                    tag
                )));
            }
        }

        if self.movabletype.record_delimiter.is_empty() || self.movabletype.field_delimiter.is_empty() {
            return Err(ConfigError::Invalid(
                "Blogroll delimiters cannot be empty".to_string(),
            ));
        }
        if self.movabletype.record_delimiter == self.movabletype.field_delimiter {
            return Err(ConfigError::Invalid(
                "Blogroll record and field delimiters must differ".to_string(),
            ));
        }

        for (i, media) in self.media.iter().enumerate() {
            let target = Path::new(&media.to);
            let plain = !media.to.is_empty()
                && target
                    .components()
                    .all(|c| matches!(c, std::path::Component::Normal(_)));
            if !plain {
                return Err(ConfigError::Invalid(format!(
                    "Media target {:?} must be a relative directory name",
                    media.to
                )));
            }
            if self.media[..i].iter().any(|other| other.to == media.to) {
                return Err(ConfigError::Invalid(format!(
                    "Media target {} appears twice",
                    media.to
                )));
            }
        }
        self.media_collections()?;

        Ok(())
    }
}

fn parse_var<T>(name: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, ConfigError> {
    parse(value).ok_or_else(|| ConfigError::Invalid(format!("{} has an unusable value: {:?}", name, value)))
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Comma-separated list; `None` if empty or any item fails to parse
fn parse_list<T: std::str::FromStr>(s: &str) -> Option<Vec<T>> {
    let items: Option<Vec<T>> = s
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse().ok())
        .collect();
    items.filter(|items| !items.is_empty())
}
