//! Text segment extraction from HTML documents
//!
//! The scanner is lexical: it never builds a tree and never validates tag
//! structure. It walks the document once through four states and records every
//! run of visible text together with its byte range in the source.
//!
//! Content of `script`, `style`, `code` and `pre` elements is skipped up to the
//! matching close tag. An element of that kind that is never closed swallows the
//! rest of the document.

/// Elements whose content is never sent for translation.
pub const NON_TRANSLATABLE: &[&str] = &["script", "style", "code", "pre"];

/// A run of visible text. `start..end` is the byte range of `text` in the
/// original document, leading and trailing whitespace included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// `None` until translated, or when the model skipped this segment.
    pub translated: Option<String>,
}

impl TextSegment {
    /// The text without its surrounding whitespace, as sent to the model.
    pub fn core(&self) -> &str {
        self.text.trim()
    }

    /// Length of the core text in characters.
    pub fn char_len(&self) -> usize {
        self.core().chars().count()
    }

    /// Text to write back at `start..end`: the translation wrapped in the
    /// original surrounding whitespace, or the untouched source text.
    pub fn replacement(&self) -> String {
        match &self.translated {
            Some(translated) => {
                let lead = self.text.len() - self.text.trim_start().len();
                let trail = self.text.trim_end().len();
                format!(
                    "{}{}{}",
                    &self.text[..lead],
                    translated.trim(),
                    &self.text[trail..]
                )
            }
            None => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InText,
    InTag {
        quote: Option<u8>,
        opens_block: Option<&'static str>,
    },
    InComment,
    InNonTranslatableBlock(&'static str),
}

/// Scan `html` and return its text segments in document order.
pub fn extract_segments(html: &str) -> Vec<TextSegment> {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let mut segments = Vec::new();
    let mut state = State::InText;
    let mut run_start = 0;
    let mut i = 0;

    while i < len {
        match state {
            State::InText => {
                if bytes[i] == b'<' && is_markup_start(bytes, i) {
                    push_candidate(html, run_start, i, &mut segments);
                    if bytes[i..].starts_with(b"<!--") {
                        state = State::InComment;
                        i += 4;
                        continue;
                    }
                    state = State::InTag {
                        quote: None,
                        opens_block: block_opened_at(bytes, i),
                    };
                }
                i += 1;
            }
            State::InTag { quote, opens_block } => {
                let b = bytes[i];
                match quote {
                    Some(q) if b == q => {
                        state = State::InTag {
                            quote: None,
                            opens_block,
                        }
                    }
                    Some(_) => {}
                    None if (b == b'"' || b == b'\'') && follows_equals(bytes, i) => {
                        state = State::InTag {
                            quote: Some(b),
                            opens_block,
                        }
                    }
                    None if b == b'>' => {
                        state = match opens_block {
                            Some(name) if bytes[i - 1] != b'/' => {
                                State::InNonTranslatableBlock(name)
                            }
                            _ => State::InText,
                        };
                        run_start = i + 1;
                    }
                    None => {}
                }
                i += 1;
            }
            State::InComment => {
                if bytes[i..].starts_with(b"-->") {
                    i += 3;
                    state = State::InText;
                    run_start = i;
                } else {
                    i += 1;
                }
            }
            State::InNonTranslatableBlock(name) => match find_closing_tag(bytes, i, name) {
                // the closing tag itself is scanned as an ordinary tag
                Some(close) => {
                    i = close;
                    state = State::InTag {
                        quote: None,
                        opens_block: None,
                    };
                }
                None => {
                    i = len;
                    run_start = len;
                }
            },
        }
    }

    if state == State::InText {
        push_candidate(html, run_start, len, &mut segments);
    }

    segments
}

fn push_candidate(html: &str, start: usize, end: usize, segments: &mut Vec<TextSegment>) {
    if start >= end {
        return;
    }
    let text = &html[start..end];
    if text.trim().is_empty() {
        return;
    }
    segments.push(TextSegment {
        start,
        end,
        text: text.to_string(),
        translated: None,
    });
}

/// `<` only opens markup when followed by a name, `/`, `!` or `?`;
/// otherwise it is literal text such as `a < b`.
fn is_markup_start(bytes: &[u8], i: usize) -> bool {
    bytes
        .get(i + 1)
        .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

fn block_opened_at(bytes: &[u8], i: usize) -> Option<&'static str> {
    let name_start = i + 1;
    let name_end = bytes[name_start..]
        .iter()
        .position(|b| !b.is_ascii_alphanumeric())
        .map(|p| name_start + p)
        .unwrap_or(bytes.len());
    let name = &bytes[name_start..name_end];
    NON_TRANSLATABLE
        .iter()
        .copied()
        .find(|block| name.eq_ignore_ascii_case(block.as_bytes()))
}

fn follows_equals(bytes: &[u8], i: usize) -> bool {
    bytes[..i]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'=')
}

fn find_closing_tag(bytes: &[u8], from: usize, name: &str) -> Option<usize> {
    let name = name.as_bytes();
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'<' && bytes[i + 1] == b'/' {
            let name_end = i + 2 + name.len();
            if name_end <= bytes.len()
                && bytes[i + 2..name_end].eq_ignore_ascii_case(name)
                && bytes
                    .get(name_end)
                    .is_none_or(|b| b.is_ascii_whitespace() || *b == b'>')
            {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(html: &str) -> Vec<String> {
        extract_segments(html)
            .into_iter()
            .map(|s| s.core().to_string())
            .collect()
    }

    fn assert_offsets_exact(html: &str) {
        let segments = extract_segments(html);
        let mut last_end = 0;
        for seg in &segments {
            assert!(seg.start >= last_end, "segments overlap or are unordered");
            assert_eq!(&html[seg.start..seg.end], seg.text);
            last_end = seg.end;
        }
    }

    #[test]
    fn test_script_never_extracted() {
        let html = r#"<html><body><p>Hello world</p><script>var x="Hola";</script></body></html>"#;
        let segments = extract_segments(html);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Hello world");
        assert_eq!(&html[segments[0].start..segments[0].end], "Hello world");
    }

    #[test]
    fn test_non_translatable_blocks_skipped() {
        let html = "<style>p { content: 'Some prose here'; }</style>\
                    <p>Visible</p>\
                    <pre>  keep   this </pre>\
                    <code>let x = 1;</code>\
                    <SCRIPT type=\"text/javascript\">document.write('<p>Fake</p>')</SCRIPT>\
                    <p>After</p>";
        assert_eq!(texts(html), vec!["Visible", "After"]);
        assert_offsets_exact(html);
    }

    #[test]
    fn test_nested_tags_inside_block_do_not_end_it() {
        let html = "<pre><b>bold</b> text</pre><p>Out</p>";
        assert_eq!(texts(html), vec!["Out"]);
    }

    #[test]
    fn test_whitespace_runs_dropped_offsets_untrimmed() {
        let html = "<div>\n   </div><p>  Padded text \n</p>";
        let segments = extract_segments(html);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "  Padded text \n");
        assert_eq!(segments[0].core(), "Padded text");
    }

    #[test]
    fn test_attributes_never_extracted() {
        let html = r#"<img alt="A picture > of text" title='x'><a href="/a?b=1>2">Link</a>"#;
        assert_eq!(texts(html), vec!["Link"]);
        assert_offsets_exact(html);
    }

    #[test]
    fn test_comments_and_doctype_skipped() {
        let html = "<!DOCTYPE html><!-- a comment with <p>markup</p> --><p>Body</p>";
        assert_eq!(texts(html), vec!["Body"]);
    }

    #[test]
    fn test_literal_less_than_is_text() {
        let html = "<p>1 < 2 and 3 > 2</p>";
        assert_eq!(texts(html), vec!["1 < 2 and 3 > 2"]);
    }

    #[test]
    fn test_unclosed_block_consumes_rest() {
        let html = "<p>Before</p><script>var a = 1;<p>Lost</p>";
        assert_eq!(texts(html), vec!["Before"]);
    }

    #[test]
    fn test_self_closing_script_does_not_open_block() {
        let html = r#"<script src="a.js"/><p>Still here</p>"#;
        assert_eq!(texts(html), vec!["Still here"]);
    }

    #[test]
    fn test_prefix_names_are_not_blocks() {
        // <precis> and <codex> are not <pre> / <code>
        let html = "<precis>One</precis><codex>Two</codex>";
        assert_eq!(texts(html), vec!["One", "Two"]);
    }

    #[test]
    fn test_multibyte_offsets() {
        let html = "<p>Größe – ½</p><p>日本語</p>";
        assert_eq!(texts(html), vec!["Größe – ½", "日本語"]);
        assert_offsets_exact(html);
    }

    #[test]
    fn test_text_outside_any_tag() {
        let html = "Leading <b>bold</b> trailing";
        assert_eq!(texts(html), vec!["Leading", "bold", "trailing"]);
        assert_offsets_exact(html);
    }

    #[test]
    fn test_replacement_restores_whitespace() {
        let mut seg = TextSegment {
            start: 0,
            end: 9,
            text: "\n  Hi  \n".to_string(),
            translated: None,
        };
        assert_eq!(seg.replacement(), "\n  Hi  \n");
        seg.translated = Some(" Hola ".to_string());
        assert_eq!(seg.replacement(), "\n  Hola  \n");
    }
}
