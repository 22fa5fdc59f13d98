//! Writing translated segments back into the source document

use super::error::Result;
use super::language::Language;
use super::segment::TextSegment;
use super::validate::validate_document;

/// Replace every segment's byte range with its replacement text.
///
/// Ranges are rewritten from the highest `start` down, so a replacement of a
/// different length never shifts a range that is still waiting to be written.
pub fn reassemble(original: &str, segments: &[TextSegment]) -> String {
    let mut ordered: Vec<&TextSegment> = segments.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut document = original.to_string();
    for segment in ordered {
        document.replace_range(segment.start..segment.end, &segment.replacement());
    }
    document
}

/// Reassemble and reject the result unless it passes document validation.
pub fn reassemble_validated(
    original: &str,
    segments: &[TextSegment],
    language: &Language,
) -> Result<String> {
    let document = reassemble(original, segments);
    validate_document(&document, language).into_result(language)?;
    Ok(document)
}
