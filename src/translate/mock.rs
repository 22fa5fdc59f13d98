//! Scripted text generator for exercising the pipeline without a model
//!
//! ```ignore
//! let mock = MockGenerator::new(|prompt| Ok(prompt.to_string()));
//! let reply = mock.generate("hello", &GenerationOptions::default()).await?;
//! assert_eq!(mock.calls(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::error::{Result, TranslateError};
use super::llm::{GenerationOptions, TextGenerator};
use super::prompts::{prompt_document, prompt_segments};

type Responder = Arc<dyn Fn(&str) -> Result<String> + Send + Sync>;

pub struct MockGenerator {
    responder: Responder,
    script: Mutex<VecDeque<Result<String>>>,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Answer every prompt with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            script: Mutex::new(VecDeque::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer with `replies` in order, then fail with a transport error.
    pub fn scripted(replies: Vec<Result<String>>) -> Self {
        let mock = Self::new(|_| Err(TranslateError::Transport("script exhausted".into())));
        *mock.script.lock().unwrap_or_else(|e| e.into_inner()) = replies.into();
        mock
    }

    /// Translate chunk prompts segment by segment and document prompts as a
    /// whole, each through `translate`.
    pub fn translating<F>(translate: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::new(move |prompt| {
            if let Some(document) = prompt_document(prompt) {
                return Ok(translate_document_text(document, &translate));
            }
            Ok(prompt_segments(prompt)
                .into_iter()
                .map(|(i, text)| format!("[{}] {}", i, translate(&text)))
                .collect::<Vec<_>>()
                .join("\n"))
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Apply `translate` to every text run of `html`, leaving markup alone.
fn translate_document_text<F>(html: &str, translate: &F) -> String
where
    F: Fn(&str) -> String,
{
    let mut segments = super::segment::extract_segments(html);
    for segment in &mut segments {
        segment.translated = Some(translate(segment.core()));
    }
    super::reassemble::reassemble(html, &segments)
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match scripted {
            Some(reply) => reply,
            None => (self.responder)(prompt),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::language::Language;
    use crate::translate::prompts::{PromptContext, chunk_prompt, document_prompt};
    use crate::translate::segment::extract_segments;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockGenerator::scripted(vec![
            Ok("first".into()),
            Err(TranslateError::Transport("down".into())),
        ]);
        let opts = GenerationOptions::default();
        assert_eq!(mock.generate("a", &opts).await, Ok("first".to_string()));
        assert!(mock.generate("b", &opts).await.is_err());
        assert!(mock.generate("c", &opts).await.is_err());
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_translating_chunk_prompt() {
        let mock = MockGenerator::translating(|t| t.to_uppercase());
        let ctx = PromptContext::new(Language::from_code("es"), "");
        let prompt = chunk_prompt(&ctx, &extract_segments("<p>one</p><i>two</i>"));
        let reply = mock
            .generate(&prompt, &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "[1] ONE\n[2] TWO");
    }

    #[tokio::test]
    async fn test_translating_document_prompt() {
        let mock = MockGenerator::translating(|t| format!("<{t}>"));
        let ctx = PromptContext::new(Language::from_code("es"), "");
        let prompt = document_prompt(&ctx, "<html><body><p>x</p><script>y</script></body></html>");
        let reply = mock
            .generate(&prompt, &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "<html><body><p><x></p><script>y</script></body></html>");
    }
}
