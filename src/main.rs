use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use legacy_archive::{ArchivePipeline, Config, ImportReport};

#[derive(Parser)]
#[command(name = "legacy-archive", version, about = "Migrate legacy blogs and bookmarks into a file archive")]
struct Cli {
    /// TOML configuration file; environment variables still override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode LiveJournal sources into the record cache
    Populate {
        /// Decode again even if the cache is already filled
        #[arg(long)]
        force: bool,
    },
    /// Archive blog posts from the cache and the Movable Type dump, plus Disqus threads
    Blogs,
    /// Merge and deduplicate every bookmark source
    Bookmarks,
    /// Copy media directories into the archive
    Media,
    /// Populate, then blogs, then bookmarks, then media
    All {
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config.as_deref())?;
    info!(
        input = %config.input_root.display(),
        cache = %config.cache_root.display(),
        output = %config.output_root.display(),
        "Configuration loaded and validated"
    );

    let pipeline = ArchivePipeline::from_config(&config)?;
    let report: ImportReport = match cli.command {
        Command::Populate { force } => pipeline.populate(force).await?,
        Command::Blogs => pipeline.import_blogs().await?,
        Command::Bookmarks => pipeline.import_bookmarks().await?,
        Command::Media => pipeline.copy_media().await,
        Command::All { force } => pipeline.run_all(force).await?,
    };

    // Missing exports are routine; a failed source is reported, not fatal
    for line in &report.errors {
        error!("{}", line);
    }
    info!("{}", report.summary());
    debug!("{}", report.details());

    Ok(())
}
