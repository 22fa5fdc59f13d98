//! Inspection of the segments and chunk plan of one document

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::translate::chunk::build_chunks;
use crate::translate::segment::extract_segments;
use crate::utils::truncate_display;

const PREVIEW_CHARS: usize = 60;

pub fn run(args: ExtractArgs) -> Result<()> {
    let html = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let budget = args.budget.unwrap_or_else(|| {
        Config::load()
            .unwrap_or_default()
            .translation
            .chunk_budget
    });

    println!("{}", format!("[Extract] {}", args.input.display()).green());

    let segments = extract_segments(&html);
    if segments.is_empty() {
        println!("{}", "[WARN] No translatable text found".yellow());
        return Ok(());
    }

    let total_chars: usize = segments.iter().map(|s| s.char_len()).sum();
    println!(
        "  {} segments, {} characters of text",
        segments.len(),
        total_chars
    );

    let chunks = build_chunks(segments, budget.max(1));
    for (i, chunk) in chunks.iter().enumerate() {
        println!(
            "{}",
            format!(
                "  Chunk {}/{}: {} segments, {} chars",
                i + 1,
                chunks.len(),
                chunk.len(),
                chunk.char_len()
            )
            .cyan()
        );
        for segment in &chunk.segments {
            println!(
                "    {:>7}..{:<7} {}",
                segment.start,
                segment.end,
                truncate_display(segment.core(), PREVIEW_CHARS)
            );
        }
    }

    Ok(())
}
