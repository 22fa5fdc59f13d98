//! Translation of one chunk of segments through a numbered-list exchange

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::chunk::Chunk;
use super::error::{Result, TranslateError};
use super::language::Language;
use super::llm::{GenerationOptions, TextGenerator, generate_with_timeout};
use super::prompts::{PromptContext, chunk_prompt, parse_numbered};
use super::retry::RetryPolicy;
use super::segment::TextSegment;

/// Share of a chunk's segments a response must cover to be accepted.
pub const MIN_COVERAGE_PERCENT: usize = 80;

const CHUNK_MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedChunk {
    pub segments: Vec<TextSegment>,
    /// Segments the accepted response skipped; they keep their source text.
    pub fallbacks: usize,
}

pub struct ChunkTranslator<'a> {
    generator: &'a dyn TextGenerator,
    retry: &'a RetryPolicy,
    request_timeout: Duration,
}

impl<'a> ChunkTranslator<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        retry: &'a RetryPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            retry,
            request_timeout,
        }
    }

    /// Translate `chunk`, retrying rejected or failed responses. `label`
    /// identifies the chunk in logs and in the exhaustion error.
    pub async fn translate(
        &self,
        chunk: Chunk,
        ctx: &PromptContext,
        label: &str,
    ) -> Result<TranslatedChunk> {
        let mut segments = chunk.segments;
        if segments.is_empty() {
            return Ok(TranslatedChunk {
                segments,
                fallbacks: 0,
            });
        }

        let prompt = chunk_prompt(ctx, &segments);
        let options = GenerationOptions {
            max_output_tokens: Some(CHUNK_MAX_OUTPUT_TOKENS),
            ..GenerationOptions::default()
        };
        let expected = segments.len();

        let prompt = &prompt;
        let options = &options;
        let mut parsed = self
            .retry
            .run(label, |attempt| async move {
                debug!(chunk = label, attempt, segments = expected, "requesting chunk translation");
                let response =
                    generate_with_timeout(self.generator, prompt, options, self.request_timeout)
                        .await?;
                let parsed = parse_numbered(&response);
                check_acceptance(&parsed, expected, &ctx.language)?;
                Ok(parsed)
            })
            .await?;

        let mut fallbacks = 0;
        for (i, segment) in segments.iter_mut().enumerate() {
            match parsed.remove(&(i + 1)) {
                Some(text) => segment.translated = Some(text),
                None => fallbacks += 1,
            }
        }
        if fallbacks > 0 {
            warn!(chunk = label, fallbacks, "segments left untranslated");
        }

        Ok(TranslatedChunk {
            segments,
            fallbacks,
        })
    }
}

/// Accept a parsed response only when it covers enough segments and, for
/// languages with a recognizable script, shows that script somewhere.
fn check_acceptance(
    parsed: &HashMap<usize, String>,
    expected: usize,
    language: &Language,
) -> Result<()> {
    let covered: Vec<&String> = (1..=expected).filter_map(|i| parsed.get(&i)).collect();

    if covered.len() * 100 < expected * MIN_COVERAGE_PERCENT {
        return Err(TranslateError::Validation(format!(
            "response covered {} of {} segments",
            covered.len(),
            expected
        )));
    }

    if language.is_strict() && !covered.iter().any(|text| language.matches_script(text)) {
        return Err(TranslateError::Validation(format!(
            "response contains no {} characters",
            language.name()
        )));
    }

    Ok(())
}
