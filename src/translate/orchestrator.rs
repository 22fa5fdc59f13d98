//! Per-document strategy selection and multi-document fan-out

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::chunk::{DEFAULT_CHUNK_BUDGET, build_chunks};
use super::chunk_translator::ChunkTranslator;
use super::direct::{DEFAULT_CHUNK_THRESHOLD, DirectTranslator};
use super::error::{BatchFailure, DocumentFailure, Result, TranslateError};
use super::glossary::Glossary;
use super::language::Language;
use super::llm::{DEFAULT_REQUEST_TIMEOUT, TextGenerator};
use super::prompts::PromptContext;
use super::reassemble::reassemble_validated;
use super::retry::RetryPolicy;
use super::segment::extract_segments;

pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(500);

/// How a batch of documents is spread over the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanoutPolicy {
    /// One document at a time; failures are collected and the rest still run.
    #[default]
    Sequential,
    /// All documents at once; any failure fails the batch.
    Parallel,
}

impl FanoutPolicy {
    /// Parse a policy name; unknown names are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Returned as-is: source language target, or nothing to translate.
    Unchanged,
    Direct,
    Chunked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationJob {
    pub filename: String,
    pub original_path: String,
    pub html: String,
}

impl TranslationJob {
    pub fn new(filename: &str, original_path: &str, html: String) -> Self {
        Self {
            filename: filename.to_string(),
            original_path: original_path.to_string(),
            html,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedFile {
    pub filename: String,
    pub original_path: String,
    pub html: String,
    pub strategy: Strategy,
    /// Segments kept in the source language because the model skipped them.
    pub fallback_segments: usize,
}

#[derive(Debug, Clone)]
pub struct TranslationSettings {
    /// Documents longer than this many characters go through the chunked path.
    pub chunk_threshold: usize,
    pub chunk_budget: usize,
    /// Pause between consecutive chunks of one document.
    pub chunk_delay: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub fanout: FanoutPolicy,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            chunk_budget: DEFAULT_CHUNK_BUDGET,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            fanout: FanoutPolicy::default(),
        }
    }
}

pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    settings: TranslationSettings,
    glossary: Glossary,
}

impl Orchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: TranslationSettings) -> Self {
        Self {
            generator,
            settings,
            glossary: Glossary::new(),
        }
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    /// Provider behind this orchestrator, part of every cache key.
    pub fn provider_name(&self) -> &str {
        self.generator.provider_name()
    }

    pub fn choose_strategy(&self, html: &str, language: &Language) -> Strategy {
        if language.is_source() {
            Strategy::Unchanged
        } else if html.chars().count() > self.settings.chunk_threshold {
            Strategy::Chunked
        } else {
            Strategy::Direct
        }
    }

    pub async fn translate_all(
        &self,
        jobs: &[TranslationJob],
        target_language: &str,
        domain_hint: &str,
    ) -> std::result::Result<Vec<TranslatedFile>, BatchFailure> {
        self.translate_all_with_progress(jobs, target_language, domain_hint, None::<fn(usize)>)
            .await
    }

    /// Translate every job under the configured fan-out policy. `progress`
    /// receives the number of documents finished so far.
    pub async fn translate_all_with_progress<F>(
        &self,
        jobs: &[TranslationJob],
        target_language: &str,
        domain_hint: &str,
        progress: Option<F>,
    ) -> std::result::Result<Vec<TranslatedFile>, BatchFailure>
    where
        F: Fn(usize) + Send + Sync,
    {
        let ctx = PromptContext::new(Language::from_code(target_language), domain_hint)
            .with_glossary(self.glossary.clone());
        let finished = AtomicUsize::new(0);

        let run_one = |job: &TranslationJob| {
            let ctx = &ctx;
            let finished = &finished;
            let progress = &progress;
            let job = job.clone();
            async move {
                let result = self.translate_document(&job, ctx).await;
                let count = finished.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(cb) = progress {
                    cb(count);
                }
                (job, result)
            }
        };

        let outcomes = match self.settings.fanout {
            FanoutPolicy::Sequential => {
                let mut outcomes = Vec::with_capacity(jobs.len());
                for job in jobs {
                    outcomes.push(run_one(job).await);
                }
                outcomes
            }
            FanoutPolicy::Parallel => join_all(jobs.iter().map(run_one)).await,
        };

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (job, result) in outcomes {
            match result {
                Ok(file) => succeeded.push(file),
                Err(err) => {
                    warn!(file = %job.filename, error = %err, "document failed");
                    failed.push(DocumentFailure {
                        filename: job.filename,
                        original_path: job.original_path,
                        error: err.to_string(),
                    });
                }
            }
        }

        if failed.is_empty() {
            return Ok(succeeded);
        }
        if self.settings.fanout == FanoutPolicy::Parallel {
            succeeded.clear();
        }
        Err(BatchFailure { succeeded, failed })
    }

    /// Translate one document along the path its size calls for.
    pub async fn translate_document(
        &self,
        job: &TranslationJob,
        ctx: &PromptContext,
    ) -> Result<TranslatedFile> {
        let strategy = self.choose_strategy(&job.html, &ctx.language);
        info!(
            file = %job.filename,
            language = ctx.language.code(),
            ?strategy,
            bytes = job.html.len(),
            "translating document"
        );

        let (html, strategy, fallback_segments) = match strategy {
            Strategy::Unchanged => (job.html.clone(), Strategy::Unchanged, 0),
            Strategy::Direct => {
                let translator = DirectTranslator::new(
                    self.generator.as_ref(),
                    &self.settings.retry,
                    self.settings.request_timeout,
                );
                let html = translator.translate(&job.html, ctx, &job.filename).await?;
                (html, Strategy::Direct, 0)
            }
            Strategy::Chunked => self.translate_chunked(job, ctx).await?,
        };

        info!(file = %job.filename, ?strategy, fallback_segments, "document translated");
        Ok(TranslatedFile {
            filename: job.filename.clone(),
            original_path: job.original_path.clone(),
            html,
            strategy,
            fallback_segments,
        })
    }

    async fn translate_chunked(
        &self,
        job: &TranslationJob,
        ctx: &PromptContext,
    ) -> Result<(String, Strategy, usize)> {
        let segments = extract_segments(&job.html);
        if segments.is_empty() {
            debug!(file = %job.filename, "no text segments");
            return Ok((job.html.clone(), Strategy::Unchanged, 0));
        }

        let chunks = build_chunks(segments, self.settings.chunk_budget);
        let total = chunks.len();
        debug!(file = %job.filename, chunks = total, "chunk plan built");

        let translator = ChunkTranslator::new(
            self.generator.as_ref(),
            &self.settings.retry,
            self.settings.request_timeout,
        );

        let mut translated = Vec::new();
        let mut fallbacks = 0;
        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 && !self.settings.chunk_delay.is_zero() {
                tokio::time::sleep(self.settings.chunk_delay).await;
            }
            let label = format!("chunk {}/{} of {}", i + 1, total, job.filename);
            let done = translator.translate(chunk, ctx, &label).await?;
            fallbacks += done.fallbacks;
            translated.extend(done.segments);
        }

        let html = reassemble_validated(&job.html, &translated, &ctx.language).map_err(|err| {
            TranslateError::Exhausted {
                unit: format!("reassembly of {}", job.filename),
                attempts: 1,
                last_error: err.to_string(),
            }
        })?;

        Ok((html, Strategy::Chunked, fallbacks))
    }
}
