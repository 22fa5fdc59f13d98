pub mod cache;
pub mod chunk;
pub mod chunk_translator;
pub mod direct;
pub mod error;
pub mod glossary;
pub mod language;
pub mod llm;
pub mod mock;
pub mod orchestrator;
pub mod prompts;
pub mod reassemble;
pub mod retry;
pub mod segment;
pub mod validate;

pub use error::{BatchFailure, DocumentFailure, TranslateError};
pub use language::Language;
pub use llm::{LlmClient, LlmConfig, LlmProvider, TextGenerator};
pub use orchestrator::{
    FanoutPolicy, Orchestrator, Strategy, TranslatedFile, TranslationJob, TranslationSettings,
};

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cli::{CacheAction, CacheArgs, TranslateArgs};
use crate::config::Config;
use cache::{CacheKey, TranslationCache};
use glossary::Glossary;

const HTML_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];
const JOB_RETRY_BASE: Duration = Duration::from_secs(5);
const JOB_RETRY_CAP: Duration = Duration::from_secs(60);

/// Source file behind one job, kept for writing the result.
struct Source {
    path: PathBuf,
    relative: PathBuf,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    original_path: String,
    output: PathBuf,
    strategy: Option<Strategy>,
    fallback_segments: usize,
    cached: bool,
}

/// Summary of one `translate` run, written with `--report`.
#[derive(Debug, Default, Serialize)]
struct RunReport {
    target_language: String,
    provider: String,
    translated: Vec<ReportEntry>,
    failed: Vec<DocumentFailure>,
}

impl RunReport {
    fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }
}

pub async fn run(args: TranslateArgs) -> Result<()> {
    // Load config
    let cfg = Config::load().unwrap_or_default();

    // CLI arg > config > default
    let provider_str = args.api.clone().unwrap_or_else(|| cfg.api.provider.clone());
    let provider = LlmProvider::from_str(&provider_str);
    let lang = args
        .lang
        .clone()
        .unwrap_or_else(|| cfg.translation.default_language.clone());
    let domain = args
        .domain
        .clone()
        .or_else(|| cfg.translation.domain_hint.clone())
        .unwrap_or_default();

    let mut settings = cfg.translation.settings();
    if args.parallel {
        settings.fanout = FanoutPolicy::Parallel;
    }

    let client = create_llm_client(provider, &provider_str, &cfg, &args, settings.request_timeout)?;
    let language = Language::from_code(&lang);
    println!(
        "{}",
        format!(
            "[Translate] Using {} -> {} ({})",
            provider.name(),
            language.name(),
            language.code()
        )
        .cyan()
    );

    let glossary = match &args.glossary {
        Some(path) => {
            let glossary = Glossary::load(path)?;
            println!("  Loaded {} glossary terms", glossary.len());
            glossary
        }
        None => Glossary::new(),
    };

    let input = &args.input;
    if !input.exists() {
        anyhow::bail!("Input path does not exist: {}", input.display());
    }
    let output = args
        .output
        .clone()
        .or_else(|| cfg.general.output_dir.as_ref().map(PathBuf::from));

    let sources = collect_html_files(input, args.recursive, language.code(), output.as_deref())?;
    if sources.is_empty() {
        println!("{}", "[WARN] No HTML files found".yellow());
        return Ok(());
    }

    let cache = if args.no_cache || !cfg.translation.cache {
        None
    } else {
        match TranslationCache::open() {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "translation cache unavailable");
                None
            }
        }
    };

    let orchestrator = Orchestrator::new(Arc::new(client), settings).with_glossary(glossary);

    let mut report = RunReport {
        target_language: language.code().to_string(),
        provider: orchestrator.provider_name().to_string(),
        ..RunReport::default()
    };

    let mut by_path: HashMap<String, Source> = HashMap::new();
    let mut pending = Vec::new();
    let mut cached = 0;
    for source in sources {
        let html = fs::read_to_string(&source.path)
            .with_context(|| format!("Failed to read {}", source.path.display()))?;
        let original_path = source.relative.to_string_lossy().to_string();
        let filename = source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| original_path.clone());

        if let Some(cache) = &cache {
            let key =
                CacheKey::new(&html, language.code(), &domain, orchestrator.provider_name());
            if let Some(hit) = cache.get(&key) {
                let out = write_output(input, &source, output.as_deref(), language.code(), &hit)?;
                println!("{}", format!("[OK] {} (cached) -> {}", filename, out.display()).green());
                report.translated.push(ReportEntry {
                    original_path,
                    output: out,
                    strategy: None,
                    fallback_segments: 0,
                    cached: true,
                });
                cached += 1;
                continue;
            }
        }

        pending.push(TranslationJob::new(&filename, &original_path, html));
        by_path.insert(original_path, source);
    }

    let total_pending = pending.len();
    let job_attempts = args
        .job_attempts
        .unwrap_or(cfg.translation.job_attempts)
        .max(1);

    let mut translated = 0;
    let mut round = 1;
    while !pending.is_empty() {
        println!(
            "{}",
            format!("[Translate] {} document(s), round {}/{}", pending.len(), round, job_attempts)
                .cyan()
        );

        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));

        let result = orchestrator
            .translate_all_with_progress(
                &pending,
                language.code(),
                &domain,
                Some(|count: usize| pb.set_position(count as u64)),
            )
            .await;
        pb.finish_and_clear();

        let (done, failed) = match result {
            Ok(files) => (files, Vec::new()),
            Err(batch) => (batch.succeeded, batch.failed),
        };

        for file in done {
            let Some(source) = by_path.get(&file.original_path) else {
                continue;
            };
            let out = write_output(input, source, output.as_deref(), language.code(), &file.html)?;
            if let Some(cache) = &cache {
                let original = pending
                    .iter()
                    .find(|job| job.original_path == file.original_path);
                if let Some(job) = original {
                    let key = CacheKey::new(
                        &job.html,
                        language.code(),
                        &domain,
                        orchestrator.provider_name(),
                    );
                    if let Err(e) = cache.set(&key, &file.html) {
                        warn!(error = %e, "failed to store cached translation");
                    }
                }
            }
            println!(
                "{}",
                format!("[OK] {} ({:?}) -> {}", file.filename, file.strategy, out.display()).green()
            );
            if file.fallback_segments > 0 {
                println!(
                    "{}",
                    format!(
                        "[WARN] {}: {} segment(s) kept in the source language",
                        file.filename, file.fallback_segments
                    )
                    .yellow()
                );
            }
            report.translated.push(ReportEntry {
                original_path: file.original_path.clone(),
                output: out,
                strategy: Some(file.strategy),
                fallback_segments: file.fallback_segments,
                cached: false,
            });
            translated += 1;
            pending.retain(|job| job.original_path != file.original_path);
        }

        if failed.is_empty() {
            break;
        }

        for failure in &failed {
            eprintln!(
                "{}",
                format!("[ERROR] {}: {}", failure.filename, failure.error).red()
            );
        }

        if round >= job_attempts {
            eprintln!("{}", "[ERROR] Giving up on:".red());
            for failure in &failed {
                eprintln!("  {}", failure.original_path);
            }
            if let Some(path) = &args.report {
                report.failed = failed.clone();
                report.write(path)?;
            }
            anyhow::bail!(
                "{} of {} document(s) failed after {} round(s)",
                failed.len(),
                total_pending,
                round
            );
        }

        let delay = job_backoff(round);
        println!(
            "{}",
            format!(
                "[WARN] Retrying {} document(s) in {}s",
                failed.len(),
                delay.as_secs()
            )
            .yellow()
        );
        tokio::time::sleep(delay).await;
        pending.retain(|job| failed.iter().any(|f| f.original_path == job.original_path));
        round += 1;
    }

    if let Some(path) = &args.report {
        report.write(path)?;
    }

    println!(
        "{}",
        format!("[OK] Translated {} document(s), {} from cache", translated, cached).green()
    );

    Ok(())
}

/// Delay before the next round of failed documents: 5s doubling, capped at 60s.
fn job_backoff(round: u32) -> Duration {
    let factor = 1u32.checked_shl(round.saturating_sub(1)).unwrap_or(u32::MAX);
    JOB_RETRY_BASE.saturating_mul(factor).min(JOB_RETRY_CAP)
}

fn create_llm_client(
    provider: LlmProvider,
    provider_str: &str,
    cfg: &Config,
    args: &TranslateArgs,
    timeout: Duration,
) -> Result<LlmClient> {
    // CLI arg > config > env
    let api_key = args
        .api_key
        .clone()
        .or_else(|| cfg.get_api_key(provider_str));
    let api_base = args
        .api_base
        .clone()
        .or_else(|| cfg.get_api_base(provider_str));
    let model = args.model.clone().or_else(|| cfg.get_model(provider_str));

    let config = LlmConfig::new(provider)
        .with_api_key(api_key)
        .with_base_url(api_base)
        .with_model(model)
        .with_timeout(timeout)
        .with_safety(cfg.api.safety);

    Ok(LlmClient::new(config)?)
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy().to_lowercase();
            HTML_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Whether `path` looks like an earlier `<stem>.<lang>.<ext>` output for `lang`.
fn is_translated_output(path: &Path, lang: &str) -> bool {
    path.file_stem()
        .map(|stem| {
            let stem = stem.to_string_lossy().to_lowercase();
            stem.ends_with(&format!(".{}", lang.to_lowercase()))
        })
        .unwrap_or(false)
}

/// Collect the documents to translate. In a directory, earlier outputs for
/// `lang` and anything under the `output` directory are skipped.
fn collect_html_files(
    input: &Path,
    recursive: bool,
    lang: &str,
    output: Option<&Path>,
) -> Result<Vec<Source>> {
    if input.is_file() {
        let name = input.file_name().context("Input has no file name")?;
        return Ok(vec![Source {
            path: input.to_path_buf(),
            relative: PathBuf::from(name),
        }]);
    }

    let walker = if recursive {
        WalkDir::new(input)
    } else {
        WalkDir::new(input).max_depth(1)
    };

    let excluded = output.and_then(|p| fs::canonicalize(p).ok());

    let mut sources = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !is_html_file(path) {
            continue;
        }
        if is_translated_output(path, lang) {
            debug!(path = %path.display(), "skipping earlier translation");
            continue;
        }
        if let Some(excluded) = &excluded {
            let inside = fs::canonicalize(path)
                .map(|p| p.starts_with(excluded))
                .unwrap_or(false);
            if inside {
                debug!(path = %path.display(), "skipping file under output directory");
                continue;
            }
        }
        let relative = path.strip_prefix(input).unwrap_or(path).to_path_buf();
        sources.push(Source {
            path: path.to_path_buf(),
            relative,
        });
    }
    sources.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(count = sources.len(), "collected HTML files");

    Ok(sources)
}

/// Where the translation of `source` goes. Without an output location the
/// file lands beside its source as `<stem>.<lang>.<ext>`.
fn output_path(input: &Path, source: &Path, relative: &Path, output: Option<&Path>, lang: &str) -> PathBuf {
    match output {
        Some(p) if input.is_file() => {
            if p.is_dir() {
                p.join(relative)
            } else {
                p.to_path_buf()
            }
        }
        Some(p) => p.join(relative),
        None => {
            let stem = source.file_stem().unwrap_or_default().to_string_lossy();
            let ext = source.extension().unwrap_or_default().to_string_lossy();
            source.with_file_name(format!("{}.{}.{}", stem, lang, ext))
        }
    }
}

fn write_output(
    input: &Path,
    source: &Source,
    output: Option<&Path>,
    lang: &str,
    html: &str,
) -> Result<PathBuf> {
    let path = output_path(input, &source.path, &source.relative, output, lang);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

pub fn run_cache(args: CacheArgs) -> Result<()> {
    match args.action {
        CacheAction::Stats => {
            let cache = TranslationCache::open()?;
            let stats = cache.stats()?;
            println!("{}", "[Cache]".cyan().bold());
            println!("  Documents: {}", stats.total_entries);
            for (lang, count) in stats.languages {
                println!("  {}: {}", lang, count);
            }
        }
        CacheAction::Clear => {
            let cache = TranslationCache::open()?;
            let removed = cache.clear()?;
            println!(
                "{}",
                format!("[OK] Removed {} cached document(s)", removed).green()
            );
        }
        CacheAction::Path => {
            println!("{}", TranslationCache::cache_path()?.display());
        }
    }
    Ok(())
}
