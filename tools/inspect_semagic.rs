use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use legacy_archive::decoding::semagic::decode_utf16le;
use legacy_archive::decoding::{DelimitedChunks, SemagicDecoder, SEMAGIC_DELIMITER};

/// Dump the delimited chunks of a semagic save file and try to decode it
#[derive(Parser)]
struct Cli {
    file: PathBuf,

    /// Bytes of each chunk shown as hex
    #[arg(long, default_value_t = 24)]
    hex_bytes: usize,

    /// Characters of each chunk shown as UTF-16LE text
    #[arg(long, default_value_t = 48)]
    preview_chars: usize,
}

fn hex_prefix(chunk: &[u8], limit: usize) -> String {
    let shown = &chunk[..chunk.len().min(limit)];
    let mut hex = hex::encode(shown);
    if chunk.len() > limit {
        hex.push_str("...");
    }
    hex
}

fn text_preview(chunk: &[u8], limit: usize) -> String {
    match decode_utf16le(chunk) {
        Some(text) => {
            let preview: String = text
                .chars()
                .take(limit)
                .map(|c| if c.is_control() { '.' } else { c })
                .collect();
            format!("{:?}", preview)
        }
        None => "<not UTF-16LE>".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let buffer = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let chunks = DelimitedChunks::split(&buffer, &SEMAGIC_DELIMITER);

    println!("{}: {} bytes, {} chunks", cli.file.display(), buffer.len(), chunks.len());
    for (index, (chunk, range)) in chunks.iter().zip(chunks.ranges()).enumerate() {
        println!(
            "[{:>2}] {:>6}..{:<6} len {:>5}  {}  {}",
            index,
            range.start,
            range.end,
            chunk.len(),
            hex_prefix(chunk, cli.hex_bytes),
            text_preview(chunk, cli.preview_chars)
        );
    }

    let decoder = SemagicDecoder::new();
    for spec in decoder.layout() {
        println!("field {:<8} chunk {:>2}", spec.field.name(), spec.chunk);
    }

    match decoder.decode(&buffer) {
        Ok(entry) => println!("\n{}", serde_json::to_string_pretty(&entry)?),
        Err(e) => println!("\nDecode failed: {}", e),
    }

    Ok(())
}
