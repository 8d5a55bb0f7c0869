//! Builds a `Conversation` column for a CSV or workbook given on the command line.
//!
//! ```text
//! cargo run --example concatenate_messages -- chats.xlsx [output-dir]
//! ```

use anyhow::Context;
use chat_log_restructurer::{ChatLogProcessor, TransformConfig};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().context("usage: concatenate_messages <file> [output-dir]")?);
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let processor = ChatLogProcessor::new(TransformConfig::default());
    println!("Processing {}...", input.display());

    let processed = processor
        .process_file(&input)
        .with_context(|| format!("failed to process {}", input.display()))?;
    println!("{}", processed.status_message());

    let (original, transformed) = processed.preview();
    if let (Some(original), Some(transformed)) = (original, transformed) {
        println!("\nOriginal data sample:");
        println!("{}", serde_json::to_string_pretty(&original)?);
        println!("\nProcessed data sample:");
        println!("{}", serde_json::to_string_pretty(&transformed)?);
    }

    if let Some(summary) = processed.summary(processor.config()) {
        println!("\nProcessing details:\n{}", summary);
    }

    let path = processed.write_output(&output_dir)?;
    println!("Wrote {}", path.display());

    Ok(())
}
