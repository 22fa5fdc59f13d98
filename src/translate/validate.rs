//! Structural checks applied to every translated document before it is emitted

use regex::Regex;
use std::sync::LazyLock;

use super::error::TranslateError;
use super::language::Language;

/// Shortest document accepted as a complete translation.
pub const MIN_DOCUMENT_CHARS: usize = 200;

static HTML_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html[\s>]").expect("static regex"));
static HTML_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</html\s*>").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    pub has_document_tags: bool,
    pub meets_min_length: bool,
    pub has_target_script: bool,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.has_document_tags && self.meets_min_length && self.has_target_script
    }

    /// Why the document was rejected, `None` when it passed.
    pub fn failure_reason(&self, language: &Language) -> Option<String> {
        let mut reasons = Vec::new();
        if !self.has_document_tags {
            reasons.push("missing <html> or </html>".to_string());
        }
        if !self.meets_min_length {
            reasons.push(format!("shorter than {MIN_DOCUMENT_CHARS} characters"));
        }
        if !self.has_target_script {
            reasons.push(format!("no {} characters", language.name()));
        }
        (!reasons.is_empty()).then(|| reasons.join(", "))
    }

    pub fn into_result(self, language: &Language) -> Result<(), TranslateError> {
        match self.failure_reason(language) {
            Some(reason) => Err(TranslateError::Validation(reason)),
            None => Ok(()),
        }
    }
}

pub fn validate_document(html: &str, language: &Language) -> ValidationResult {
    ValidationResult {
        has_document_tags: HTML_OPEN.is_match(html) && HTML_CLOSE.is_match(html),
        meets_min_length: html.chars().count() >= MIN_DOCUMENT_CHARS,
        has_target_script: language.matches_script(html),
    }
}
