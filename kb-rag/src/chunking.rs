//! Sentence-based text chunking.
//!
//! This module provides the [`Chunker`] trait and [`SentenceChunker`], which
//! greedily packs whole sentences into passages of bounded length so that the
//! engine can surface the most relevant excerpt of a matching document.

/// The default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 500;

/// A strategy for splitting document text into passages.
pub trait Chunker: Send + Sync {
    /// Split text into ordered, non-overlapping passages.
    ///
    /// Returns an empty `Vec` if the text is empty or only whitespace.
    fn chunk(&self, text: &str) -> Vec<String>;

    /// The maximum passage length this chunker aims for, in characters.
    fn max_len(&self) -> usize;
}

/// Packs sentences into chunks of at most `max_len` characters.
///
/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace or the
/// end of the text, so numbers like `1.500.000` are not split. Sentences are
/// joined with a single space. A sentence that alone exceeds `max_len` is
/// emitted as its own chunk, unsplit.
///
/// # Example
///
/// ```rust,ignore
/// use kb_rag::{Chunker, SentenceChunker};
///
/// let chunker = SentenceChunker::new(120);
/// let chunks = chunker.chunk(&document.content);
/// ```
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    max_len: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker` with the given maximum chunk length.
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_LEN)
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into trimmed sentences, keeping each terminator run attached.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminator(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }

        if chars.peek().is_none_or(|&(_, next)| next.is_whitespace()) {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for sentence in split_sentences(text) {
            let len = sentence.chars().count();
            if current.is_empty() {
                current.push_str(sentence);
                current_len = len;
            } else if current_len + 1 + len <= self.max_len {
                current.push(' ');
                current.push_str(sentence);
                current_len += 1 + len;
            } else {
                chunks.push(std::mem::take(&mut current));
                current.push_str(sentence);
                current_len = len;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Cut `text` down to at most `max_chars` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
