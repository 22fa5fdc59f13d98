//! Size-bounded grouping of segments into translation requests

use super::segment::TextSegment;

/// Default cumulative character budget of one chunk.
pub const DEFAULT_CHUNK_BUDGET: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    pub segments: Vec<TextSegment>,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.segments.iter().map(TextSegment::char_len).sum()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Greedily pack `segments` into chunks of at most `budget` characters.
///
/// Segments keep their order and are never split; one longer than the budget
/// gets a chunk of its own.
pub fn build_chunks(segments: Vec<TextSegment>, budget: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = Chunk::default();
    let mut current_len = 0;

    for segment in segments {
        let len = segment.char_len();
        if !current.is_empty() && current_len + len > budget {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current_len += len;
        current.segments.push(segment);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
