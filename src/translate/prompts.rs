//! Prompt construction and numbered-list parsing

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::glossary::Glossary;
use super::language::Language;
use super::segment::TextSegment;

/// Line introducing the numbered segment list in a chunk prompt.
pub const SEGMENTS_MARKER: &str = "SEGMENTS:";
/// Line introducing the document in a direct prompt.
pub const DOCUMENT_MARKER: &str = "HTML DOCUMENT:";

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[(\d+)\]\s?(.*)$").expect("static regex"));

/// What a prompt translates into, and how.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub language: Language,
    pub domain_hint: String,
    pub glossary: Glossary,
}

impl PromptContext {
    pub fn new(language: Language, domain_hint: &str) -> Self {
        Self {
            language,
            domain_hint: domain_hint.trim().to_string(),
            glossary: Glossary::new(),
        }
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    fn domain(&self) -> &str {
        if self.domain_hint.is_empty() {
            "general"
        } else {
            &self.domain_hint
        }
    }
}

/// Segments as `[n] text` lines, numbered from 1. Line breaks inside a
/// segment are folded to spaces so every segment stays on one line.
pub fn numbered_list(segments: &[TextSegment]) -> String {
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| format!("[{}] {}", i + 1, single_line(seg.core())))
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line(text: &str) -> String {
    if text.contains(['\n', '\r']) {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        text.to_string()
    }
}

pub fn chunk_prompt(ctx: &PromptContext, segments: &[TextSegment]) -> String {
    format!(
        "You are a professional translator of {domain} website content. \
         Translate each numbered text segment below from English into {lang}.\n\
         Follow these rules:\n\
         1. Translate only the text. Do not add explanations, notes or commentary.\n\
         2. Answer with one line per segment, prefixed with the same [number] it was given.\n\
         3. Keep the numbering and order unchanged. Do not merge or split segments.\n\
         4. Preserve numbers, URLs, email addresses, HTML entities and special characters exactly.\n\
         {glossary}\n\
         {marker}\n\
         {list}",
        domain = ctx.domain(),
        lang = ctx.language.name(),
        glossary = ctx.glossary.build_prompt_context(),
        marker = SEGMENTS_MARKER,
        list = numbered_list(segments),
    )
}

pub fn document_prompt(ctx: &PromptContext, html: &str) -> String {
    format!(
        "You are a professional translator of {domain} websites. \
         Translate the visible text of the HTML document below from English into {lang}.\n\
         Follow these rules:\n\
         1. Translate only human-visible text between tags.\n\
         2. Do not add, remove, reorder or modify any tag or attribute.\n\
         3. Leave the content of <script>, <style>, <code> and <pre> elements untouched.\n\
         4. Preserve numbers, URLs, email addresses, HTML entities and special characters exactly.\n\
         5. Return the complete document from its first tag through </html>, \
         without markdown fences and without commentary.\n\
         {glossary}\n\
         {marker}\n\
         {html}",
        domain = ctx.domain(),
        lang = ctx.language.name(),
        glossary = ctx.glossary.build_prompt_context(),
        marker = DOCUMENT_MARKER,
        html = html,
    )
}

/// Parse `[n] text` lines into a map keyed by `n`. Other lines are ignored,
/// as are entries with no text. The first occurrence of a number wins.
pub fn parse_numbered(response: &str) -> HashMap<usize, String> {
    let mut parsed = HashMap::new();
    for line in response.lines() {
        let Some(caps) = NUMBERED_LINE.captures(line) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        let text = caps[2].trim();
        if text.is_empty() {
            continue;
        }
        parsed.entry(index).or_insert_with(|| text.to_string());
    }
    parsed
}

/// The numbered segments carried by a chunk prompt, in order.
pub fn prompt_segments(prompt: &str) -> Vec<(usize, String)> {
    let list = prompt
        .split_once(SEGMENTS_MARKER)
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    let mut segments: Vec<(usize, String)> = parse_numbered(list).into_iter().collect();
    segments.sort_by_key(|(i, _)| *i);
    segments
}

/// The document carried by a direct prompt.
pub fn prompt_document(prompt: &str) -> Option<&str> {
    prompt
        .split_once(DOCUMENT_MARKER)
        .map(|(_, rest)| rest.strip_prefix('\n').unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::segment::extract_segments;

    #[test]
    fn test_numbered_list_folds_line_breaks() {
        let segments = extract_segments("<p>One</p><p>Two\n   lines</p>");
        assert_eq!(numbered_list(&segments), "[1] One\n[2] Two lines");
    }

    #[test]
    fn test_parse_numbered_ignores_commentary() {
        let response = "Here is the translation:\n\
                        ```\n\
                        [1] Uno\n\
                        [2]   Dos  \n\
                        [3]\n\
                        [2] duplicate\n\
                        ```\n\
                        Let me know if you need anything else.";
        let parsed = parse_numbered(response);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&1], "Uno");
        assert_eq!(parsed[&2], "Dos");
        assert!(!parsed.contains_key(&3));
    }

    #[test]
    fn test_chunk_prompt_round_trip() {
        let ctx = PromptContext::new(Language::from_code("ru"), "travel");
        let segments = extract_segments("<p>Hello</p><p>World</p>");
        let prompt = chunk_prompt(&ctx, &segments);
        assert!(prompt.contains("into Russian"));
        assert!(prompt.contains("travel website content"));
        assert_eq!(
            prompt_segments(&prompt),
            vec![(1, "Hello".to_string()), (2, "World".to_string())]
        );
    }

    #[test]
    fn test_document_prompt_round_trip() {
        let ctx = PromptContext::new(Language::from_code("es"), "");
        let html = "<html><body><p>Hi</p></body></html>";
        let prompt = document_prompt(&ctx, html);
        assert!(prompt.contains("general websites"));
        assert_eq!(prompt_document(&prompt), Some(html));
    }

    #[test]
    fn test_glossary_terms_in_prompt() {
        let mut glossary = Glossary::new();
        glossary.add("Checkout".to_string(), "Оформление заказа".to_string());
        let ctx = PromptContext::new(Language::from_code("ru"), "shop").with_glossary(glossary);
        let prompt = chunk_prompt(&ctx, &[]);
        assert!(prompt.contains("\"Checkout\" → \"Оформление заказа\""));
    }
}
