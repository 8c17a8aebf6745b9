//! # Legacy Archive - Personal Data Migration Core
//!
//! Decodes content from defunct blogging clients, blog databases and bookmark
//! services, and writes it out as a normalized file-based archive, built on
//! Clean Architecture principles.
//!
//! ## Architecture Layers
//!
//! - **Decoding**: Byte-level parsing of the semagic save format
//! - **Domain**: Core records (entries, posts, bookmarks), URL canonicalisation, deduplication
//! - **Application**: Use cases, source traits and ports (interfaces)
//! - **Infrastructure**: Source adapters and file-backed cache/archive storage
//!
//! ## Key Features
//!
//! - Bit-compatible decoding of semagic `.slj` files
//! - Content-addressed bookmark identifiers with first-write-wins deduplication
//! - Explicit, configurable source priority for bookmark merging
//! - Cached decode results so repeated runs skip the expensive step
//! - Disqus comment threads and media directories carried into the archive
//! - Atomic archive writes
//!
//! ## Example Usage
//!
//! ```no_run
//! use legacy_archive::{ArchivePipeline, Config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! config.validate()?;
//!
//! let pipeline = ArchivePipeline::from_config(&config)?;
//! let report = pipeline.run_all(false).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod decoding;
pub mod domain;
pub mod infrastructure;
pub mod pipeline;

// Re-export key types explicitly to avoid ambiguity
pub use application::{ports, report::ImportReport, sources, use_cases};
pub use config::Config;
pub use decoding::SemagicDecoder;
pub use domain::errors as domain_errors;
pub use domain::{entities, value_objects};
pub use pipeline::ArchivePipeline;
