//! Whole-document translation for documents under the chunking threshold

use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::error::Result;
use super::llm::{GenerationOptions, TextGenerator, generate_with_timeout};
use super::prompts::{PromptContext, document_prompt};
use super::retry::RetryPolicy;
use super::validate::validate_document;

/// Documents longer than this many characters are translated in chunks.
pub const DEFAULT_CHUNK_THRESHOLD: usize = 15_000;

const DIRECT_MAX_OUTPUT_TOKENS: u32 = 65_536;

static FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n").expect("static regex"));
static FENCE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?```\s*$").expect("static regex"));
static DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype\s+html").expect("static regex"));
static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[\s>]").expect("static regex"));
static DOCUMENT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</html\s*>").expect("static regex"));

/// Strip markdown fences and any prose around the returned document: keep
/// from the first `<!DOCTYPE html` (or the first `<html` when there is no
/// doctype) through the last `</html>`.
pub fn clean_document_response(response: &str) -> String {
    let mut text = response.trim();

    if let Some(m) = FENCE_OPEN.find(text) {
        text = &text[m.end()..];
    }
    if let Some(m) = FENCE_CLOSE.find(text) {
        text = &text[..m.start()];
    }
    if let Some(m) = DOCTYPE.find(text).or_else(|| HTML_OPEN.find(text)) {
        text = &text[m.start()..];
    }
    if let Some(m) = DOCUMENT_END.find_iter(text).last() {
        text = &text[..m.end()];
    }

    text.to_string()
}

pub struct DirectTranslator<'a> {
    generator: &'a dyn TextGenerator,
    retry: &'a RetryPolicy,
    request_timeout: Duration,
}

impl<'a> DirectTranslator<'a> {
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

    /// Translate `html` in a single request per attempt. The cleaned
    /// response must pass document validation to be accepted.
    pub async fn translate(&self, html: &str, ctx: &PromptContext, label: &str) -> Result<String> {
        if ctx.language.is_source() {
            return Ok(html.to_string());
        }

        let prompt = document_prompt(ctx, html);
        let options = GenerationOptions {
            max_output_tokens: Some(DIRECT_MAX_OUTPUT_TOKENS),
            ..GenerationOptions::default()
        };

        let prompt = &prompt;
        let options = &options;
        self.retry
            .run(label, |attempt| async move {
                debug!(document = label, attempt, "requesting direct translation");
                let response =
                    generate_with_timeout(self.generator, prompt, options, self.request_timeout)
                        .await?;
                let cleaned = clean_document_response(&response);
                validate_document(&cleaned, &ctx.language).into_result(&ctx.language)?;
                Ok(cleaned)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::error::TranslateError;
    use crate::translate::language::Language;
    use crate::translate::mock::MockGenerator;

    fn page(text: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html><head><title>{text}</title></head><body><p>{text}</p>{}</body></html>",
            "<br>".repeat(50)
        )
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_clean_strips_fences_and_prose() {
        let doc = "<!DOCTYPE html><html><body>Hola</body></html>";
        let response = format!("```html\n{doc}\n```");
        assert_eq!(clean_document_response(&response), doc);

        let chatty = format!("Sure! Here is the translation:\n\n{doc}\n\nLet me know if...");
        assert_eq!(clean_document_response(&chatty), doc);

        let both = format!("Here you go:\n```html\n{doc}\n```\nEnjoy.");
        assert_eq!(clean_document_response(&both), doc);
    }

    #[test]
    fn test_clean_case_insensitive_and_last_close() {
        let response = "note <HTML lang=\"fr\"><body></body></HTML> and </html> trailing";
        assert_eq!(
            clean_document_response(response),
            "<HTML lang=\"fr\"><body></body></HTML> and </html>"
        );
    }

    #[test]
    fn test_clean_prefers_doctype_over_html_in_prose() {
        let doc = "<!DOCTYPE html>\n<html><body>Hola</body></html>";
        let response = format!("Here is the <html> you sent, translated:\n{doc}");
        assert_eq!(clean_document_response(&response), doc);
    }

    #[test]
    fn test_clean_without_doctype_starts_at_html() {
        let response = "Translation:\n<html><body>x</body></html>";
        assert_eq!(clean_document_response(response), "<html><body>x</body></html>");
    }

    #[tokio::test]
    async fn test_source_language_is_noop() {
        let mock = MockGenerator::new(|_| panic!("must not be called"));
        let retry = policy();
        let translator = DirectTranslator::new(&mock, &retry, Duration::from_secs(5));
        let ctx = PromptContext::new(Language::from_code("en"), "");
        let html = "<p>not even a full document</p>";
        assert_eq!(translator.translate(html, &ctx, "a.html").await.unwrap(), html);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_translates_and_cleans() {
        let translated = page("Привет");
        let reply = format!("Here it is:\n```html\n{translated}\n```");
        let mock = MockGenerator::scripted(vec![Ok(reply)]);
        let retry = policy();
        let translator = DirectTranslator::new(&mock, &retry, Duration::from_secs(5));
        let ctx = PromptContext::new(Language::from_code("ru"), "");

        let out = translator.translate(&page("Hello"), &ctx, "a.html").await.unwrap();
        assert_eq!(out, translated);
    }

    #[tokio::test]
    async fn test_invalid_responses_retried_then_exhausted() {
        let mock = MockGenerator::scripted(vec![
            Ok("I cannot translate this.".into()),
            Ok(page("Hello")), // no Cyrillic
            Ok("<html><body>Привет</body></html>".into()), // too short
        ]);
        let retry = policy();
        let translator = DirectTranslator::new(&mock, &retry, Duration::from_secs(5));
        let ctx = PromptContext::new(Language::from_code("ru"), "");

        let err = translator.translate(&page("Hello"), &ctx, "a.html").await.unwrap_err();
        assert_eq!(mock.calls(), 3);
        match err {
            TranslateError::Exhausted {
                unit, last_error, ..
            } => {
                assert_eq!(unit, "a.html");
                assert!(last_error.contains("shorter than"));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recovers_on_second_attempt() {
        let mock = MockGenerator::scripted(vec![
            Err(TranslateError::Transport("500".into())),
            Ok(page("Hola")),
        ]);
        let retry = policy();
        let translator = DirectTranslator::new(&mock, &retry, Duration::from_secs(5));
        let ctx = PromptContext::new(Language::from_code("es"), "retail");

        let out = translator.translate(&page("Hello"), &ctx, "a.html").await.unwrap();
        assert!(out.contains("<p>Hola</p>"));
        assert!(mock.prompts()[0].contains("retail websites"));
    }
}
