//! Keyword-overlap scoring used in keyword mode and for excerpt selection.

use crate::document::Document;

const TITLE_WEIGHT: f32 = 3.0;
const TAG_WEIGHT: f32 = 2.0;
const CONTENT_WEIGHT: f32 = 1.0;

/// Combining marks, so decomposed (NFD) Vietnamese stays in one word.
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

/// Split a query into lowercase words of at least `min_len` characters.
///
/// Words are separated by any character that is neither alphanumeric nor a
/// combining mark. Length counts base characters only. Duplicates are
/// dropped, keeping first-occurrence order.
///
/// Matching is a plain substring test, so queries and documents are expected
/// to share a Unicode normalization form (the seeded corpus is NFC).
pub fn tokenize(query: &str, min_len: usize) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in query.split(|c: char| !is_word_char(c)) {
        if word.chars().filter(|c| !is_combining_mark(*c)).count() < min_len {
            continue;
        }
        let word = word.to_lowercase();
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Number of keywords that occur in `text`, case-insensitively.
pub fn count_matches(text: &str, keywords: &[String]) -> usize {
    let haystack = text.to_lowercase();
    keywords.iter().filter(|k| haystack.contains(k.as_str())).count()
}

/// Weighted keyword score for a document, normalized to `[0, 2]`.
///
/// Each keyword adds 3 if found in the title, 2 if found in any tag and 1 if
/// found in the content. The sum is divided by `keywords.len() * 3`. Returns
/// 0.0 when `keywords` is empty or nothing matched.
pub fn keyword_score(document: &Document, keywords: &[String]) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }

    let title = document.title.to_lowercase();
    let content = document.content.to_lowercase();
    let tags: Vec<String> = document.keywords.iter().map(|t| t.to_lowercase()).collect();

    let raw: f32 = keywords
        .iter()
        .map(|k| {
            let mut score = 0.0;
            if title.contains(k.as_str()) {
                score += TITLE_WEIGHT;
            }
            if tags.iter().any(|t| t.contains(k.as_str())) {
                score += TAG_WEIGHT;
            }
            if content.contains(k.as_str()) {
                score += CONTENT_WEIGHT;
            }
            score
        })
        .sum();

    raw / (keywords.len() as f32 * TITLE_WEIGHT)
}

/// Pick the chunk with the most keyword matches; the first chunk wins ties.
pub fn best_chunk<'a>(chunks: &'a [String], keywords: &[String]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for chunk in chunks {
        let matches = count_matches(chunk, keywords);
        if best.is_none_or(|(_, top)| matches > top) {
            best = Some((chunk.as_str(), matches));
        }
    }
    best.map(|(chunk, _)| chunk)
}
